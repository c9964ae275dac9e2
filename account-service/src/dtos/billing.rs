use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Editable working copy of the billing address.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BillingAddressForm {
    pub name: String,
    pub first_line: String,
    pub second_line: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country_code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BillingPageResponse {
    pub customer_id: String,
    /// Present when an existing processor address was loaded; absent means a
    /// save will create one.
    pub address_id: Option<String>,
    pub form: BillingAddressForm,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBillingRequest {
    /// Address id captured at load time, if any.
    pub address_id: Option<String>,

    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Address line 1 is required"))]
    pub first_line: String,

    pub second_line: Option<String>,

    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,

    #[validate(length(min = 1, message = "State/Region is required"))]
    pub region: String,

    #[validate(length(min = 1, message = "ZIP/Postal code is required"))]
    pub postal_code: String,

    #[validate(length(equal = 2, message = "Country code must be two letters"))]
    pub country_code: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAddressRequest {
    #[validate(length(min = 1, message = "Address line 1 is required"))]
    pub first_line: String,

    pub second_line: Option<String>,

    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,

    #[validate(length(min = 1, message = "State/Region is required"))]
    pub region: String,

    #[validate(length(min = 1, message = "ZIP/Postal code is required"))]
    pub postal_code: String,

    #[validate(length(equal = 2, message = "Country code must be two letters"))]
    pub country_code: String,

    /// Writes default to keeping the record active.
    pub status: Option<String>,
}
