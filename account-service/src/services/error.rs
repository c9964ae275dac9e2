use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The authentication provider rejected a request. The message is the
    /// provider's own and is shown to the visitor verbatim.
    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error("Authentication provider unreachable: {0}")]
    ProviderUnreachable(String),

    /// The billing processor rejected a request.
    #[error("{message}")]
    Billing { status: u16, message: String },

    #[error("Billing processor unreachable: {0}")]
    BillingUnreachable(String),

    #[error("Profile not found")]
    ProfileNotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => AppError::DatabaseError(e.into()),
            ServiceError::Provider { status: 401, message } => {
                AppError::Unauthorized(anyhow::anyhow!(message))
            }
            ServiceError::Provider { message, .. } => AppError::AuthError(anyhow::anyhow!(message)),
            ServiceError::ProviderUnreachable(e) => AppError::BadGateway(e),
            ServiceError::Billing { message, .. } => AppError::BadGateway(message),
            ServiceError::BillingUnreachable(e) => AppError::BadGateway(e),
            ServiceError::ProfileNotFound => AppError::NotFound(anyhow::anyhow!("Profile not found")),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
