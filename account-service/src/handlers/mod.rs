pub mod account;
pub mod auth;
pub mod billing;
pub mod bridge;
pub mod confirm;
pub mod locale;
pub mod metrics;

use tower_sessions::Session;

use crate::models::session::keys;
use crate::models::{BannerFlash, BannerKind, VerifiedBanner};

/// Record a one-shot verified banner for the next clean render of the view.
pub(crate) async fn stash_banner(session: &Session, kind: BannerKind) {
    if let Err(e) = session.insert(keys::VERIFIED_BANNER, BannerFlash::new(kind)).await {
        tracing::warn!(error = %e, "failed to record verified banner");
    }
}

/// Pop the pending banner, if any. Removal is the at-most-once guard; a
/// flash that outlived its display window is discarded unshown.
pub(crate) async fn take_banner(session: &Session) -> Option<VerifiedBanner> {
    session
        .remove::<BannerFlash>(keys::VERIFIED_BANNER)
        .await
        .ok()
        .flatten()
        .and_then(BannerFlash::into_banner)
}
