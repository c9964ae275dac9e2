//! Prometheus metrics for the portal's core flows.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

static REGISTRY: OnceLock<Registry> = OnceLock::new();
static SIGN_INS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
static VERIFICATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
static BILLING_SYNC_STEPS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
static BRIDGE_MESSAGES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

fn counter(
    cell: &'static OnceLock<IntCounterVec>,
    name: &str,
    help: &str,
    labels: &[&str],
) -> &'static IntCounterVec {
    cell.get_or_init(|| {
        let counter = IntCounterVec::new(Opts::new(name, help), labels)
            .expect("failed to create counter");
        registry()
            .register(Box::new(counter.clone()))
            .expect("failed to register counter");
        counter
    })
}

pub fn record_sign_in(status: &str) {
    counter(
        &SIGN_INS_TOTAL,
        "portal_sign_ins_total",
        "Sign-in attempts by outcome",
        &["status"],
    )
    .with_label_values(&[status])
    .inc();
}

pub fn record_verification(kind: &str, status: &str) {
    counter(
        &VERIFICATIONS_TOTAL,
        "portal_verifications_total",
        "One-time token consumptions by kind and outcome",
        &["kind", "status"],
    )
    .with_label_values(&[kind, status])
    .inc();
}

pub fn record_billing_step(step: &str, status: &str) {
    counter(
        &BILLING_SYNC_STEPS_TOTAL,
        "portal_billing_sync_steps_total",
        "Billing update steps by outcome",
        &["step", "status"],
    )
    .with_label_values(&[step, status])
    .inc();
}

pub fn record_bridge_message(direction: &str, outcome: &str) {
    counter(
        &BRIDGE_MESSAGES_TOTAL,
        "portal_bridge_messages_total",
        "Bridge messages by direction and outcome",
        &["direction", "outcome"],
    )
    .with_label_values(&[direction, outcome])
    .inc();
}

/// Render the registry in the Prometheus text format.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).ok();
    String::from_utf8(buffer).unwrap_or_default()
}
