pub mod api;
pub mod auth;
pub mod listing;
pub mod rate_limiter;


pub use api::RedditApiClient;
pub use auth::AppOnlyAuth;
pub use rate_limiter::{RateLimitConfig, RateLimiter};
