//! Billing address synchronization.
//!
//! The billing view edits one working copy of the customer's address. Saving
//! it fans out over three sequential writes - local profile name, processor
//! customer name, processor address - each gated on the previous one.
//! Applied steps are not rolled back when a later step fails; the stores are
//! reconciled on the next successful save.

use std::sync::Arc;
use uuid::Uuid;

use service_core::error::AppError;

use super::metrics;
use super::paddle::{AddressUpdate, BillingProcessor, CustomerUpdate};
use super::profiles::ProfileStore;
use crate::dtos::billing::{BillingAddressForm, BillingPageResponse, UpdateBillingRequest};
use crate::models::UserProfile;

pub const NO_BILLING_INFORMATION: &str = "No billing information found";
pub const BILLING_UPDATE_FAILED: &str =
    "Failed to update billing information. Please try again.";
pub const BILLING_UPDATE_OK: &str = "Billing information updated successfully";

pub struct BillingService {
    profiles: Arc<dyn ProfileStore>,
    processor: Arc<dyn BillingProcessor>,
}

impl BillingService {
    pub fn new(profiles: Arc<dyn ProfileStore>, processor: Arc<dyn BillingProcessor>) -> Self {
        Self {
            profiles,
            processor,
        }
    }

    async fn profile_with_customer(
        &self,
        user_id: Uuid,
    ) -> Result<(UserProfile, String), AppError> {
        let profile = self
            .profiles
            .find(user_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!(NO_BILLING_INFORMATION)))?;

        // Provisioning sets the customer id once; without it the page is a
        // terminal error, not a retry.
        let customer_id = profile
            .paddle_customer_id
            .clone()
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!(NO_BILLING_INFORMATION)))?;

        Ok((profile, customer_id))
    }

    /// Load the billing form: the first address in the processor's list is
    /// the working copy; an empty list leaves the form blank.
    pub async fn load(&self, user_id: Uuid) -> Result<BillingPageResponse, AppError> {
        let (profile, customer_id) = self.profile_with_customer(user_id).await?;

        let addresses = self.processor.list_addresses(&customer_id).await.map_err(|e| {
            tracing::error!(error = %e, customer_id = %customer_id, "failed to load addresses");
            AppError::BadGateway("Failed to load billing information. Please try again.".into())
        })?;

        let address = addresses.into_iter().next();
        let address_id = address.as_ref().map(|a| a.id.clone());

        let form = match address {
            Some(a) => BillingAddressForm {
                name: profile.name.clone(),
                first_line: a.first_line.unwrap_or_default(),
                second_line: a.second_line,
                city: a.city.unwrap_or_default(),
                region: a.region.unwrap_or_default(),
                postal_code: a.postal_code.unwrap_or_default(),
                country_code: a.country_code.unwrap_or_default(),
            },
            None => BillingAddressForm {
                name: profile.name.clone(),
                ..BillingAddressForm::default()
            },
        };

        Ok(BillingPageResponse {
            customer_id,
            address_id,
            form,
        })
    }

    /// Save the billing form. Three sequential remote writes; any failure
    /// aborts the remaining steps and surfaces the generic update error
    /// (which step failed is logged and counted, not shown).
    pub async fn submit(
        &self,
        user_id: Uuid,
        request: UpdateBillingRequest,
    ) -> Result<(), AppError> {
        let (_, customer_id) = self.profile_with_customer(user_id).await?;

        // Step 1: local profile name.
        if let Err(e) = self.profiles.update_name(user_id, &request.name).await {
            tracing::error!(error = %e, user_id = %user_id, step = "profile_name", "billing update failed");
            metrics::record_billing_step("profile_name", "error");
            return Err(AppError::PartialFailure(BILLING_UPDATE_FAILED.into()));
        }
        metrics::record_billing_step("profile_name", "ok");

        // Step 2: processor customer display name.
        let update = CustomerUpdate {
            name: Some(request.name.clone()),
            email: None,
        };
        if let Err(e) = self.processor.update_customer(&customer_id, update).await {
            tracing::error!(error = %e, customer_id = %customer_id, step = "customer_name", "billing update failed");
            metrics::record_billing_step("customer_name", "error");
            return Err(AppError::PartialFailure(BILLING_UPDATE_FAILED.into()));
        }
        metrics::record_billing_step("customer_name", "ok");

        // Step 3: processor address, created fresh when none was loaded.
        let address = AddressUpdate {
            first_line: request.first_line,
            second_line: request.second_line,
            city: request.city,
            postal_code: request.postal_code,
            region: request.region,
            country_code: request.country_code,
            status: "active".to_string(),
        };
        let result = match &request.address_id {
            Some(address_id) => {
                self.processor
                    .update_address(&customer_id, address_id, address)
                    .await
            }
            None => self.processor.create_address(&customer_id, address).await,
        };
        if let Err(e) = result {
            tracing::error!(error = %e, customer_id = %customer_id, step = "address", "billing update failed");
            metrics::record_billing_step("address", "error");
            return Err(AppError::PartialFailure(BILLING_UPDATE_FAILED.into()));
        }
        metrics::record_billing_step("address", "ok");

        Ok(())
    }

    /// Reject any attempt to touch a customer record other than the caller's
    /// own before it reaches the processor.
    pub async fn authorize_customer(
        &self,
        user_id: Uuid,
        customer_id: &str,
    ) -> Result<(), AppError> {
        let profile = self
            .profiles
            .find(user_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No Paddle customer ID found")))?;

        match profile.paddle_customer_id.as_deref() {
            Some(own) if own == customer_id => Ok(()),
            Some(_) => {
                tracing::warn!(
                    user_id = %user_id,
                    customer_id = %customer_id,
                    "cross-customer billing access rejected"
                );
                Err(AppError::Forbidden(anyhow::anyhow!(
                    "Billing customer does not belong to the authenticated user"
                )))
            }
            None => Err(AppError::BadRequest(anyhow::anyhow!(
                "No Paddle customer ID found"
            ))),
        }
    }
}
