pub mod auth_provider;
pub mod billing;
pub mod bridge;
pub mod error;
pub mod locale;
pub mod metrics;
pub mod mock;
pub mod paddle;
pub mod profiles;

pub use auth_provider::{AuthProvider, GoTrueClient, ProviderSession, ProviderUser, UserUpdate};
pub use billing::BillingService;
pub use bridge::{BridgeMessage, HttpSessionSink, SessionSink};
pub use error::ServiceError;
pub use locale::LocaleResolver;
pub use paddle::{BillingProcessor, PaddleClient};
pub use profiles::{PgProfileStore, ProfileStore};
