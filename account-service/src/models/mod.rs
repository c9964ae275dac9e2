pub mod banner;
pub mod profile;
pub mod session;
pub mod verification;

pub use banner::{BannerFlash, BannerKind, VerifiedBanner};
pub use profile::{Language, NewProfile, ProfileResponse, UserProfile, DEFAULT_LANGUAGE};
pub use session::{CachedSession, SessionUser};
pub use verification::VerifyKind;
