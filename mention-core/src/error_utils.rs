use crate::error::*;
use std::time::Duration;
use tracing::{error, warn};

/// Seconds to wait before retrying a transient failure that carries no hint.
const TRANSIENT_BACKOFF_SECS: u64 = 5;
const SERVER_BACKOFF_SECS: u64 = 30;

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    /// Whether rerunning the same request later could succeed.
    fn is_retryable(&self) -> bool;
    fn retry_after(&self) -> Option<Duration>;
    /// Stable machine-readable code, used in collection reports.
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!(code = %self.error_code(), "{}", self);
        if let CoreError::RedditApi(inner) = self {
            error!("Reddit API error details: {:?}", inner);
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!(code = %self.error_code(), "{}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::RedditApi(inner) => inner.is_retryable(),
            CoreError::Source(inner) => inner.is_retryable(),
            CoreError::Network(_) | CoreError::Io(_) => true,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::RedditApi(inner) => inner.retry_after(),
            _ if self.is_retryable() => Some(Duration::from_secs(TRANSIENT_BACKOFF_SECS)),
            _ => None,
        }
    }

    fn error_code(&self) -> String {
        let code = match self {
            CoreError::RedditApi(inner) => return inner.error_code(),
            CoreError::Source(inner) => return inner.error_code(),
            CoreError::Config(_) => "CONFIG",
            CoreError::Io(_) => "IO",
            CoreError::Serialization(_) => "SERIALIZATION",
            CoreError::Network(_) => "NETWORK",
            CoreError::InvalidInput { .. } => "INVALID_INPUT",
            CoreError::Internal { .. } => "INTERNAL",
        };
        code.to_string()
    }
}

impl ErrorExt for RedditApiError {
    fn log_error(&self) -> &Self {
        error!(code = %self.error_code(), "Reddit API: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!(code = %self.error_code(), "Reddit API: {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            RedditApiError::RateLimitExceeded { .. }
                | RedditApiError::RequestTimeout
                | RedditApiError::InvalidToken
                | RedditApiError::ServerError { .. }
        )
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            RedditApiError::RateLimitExceeded { retry_after } => {
                Some(Duration::from_secs(*retry_after))
            }
            RedditApiError::ServerError { .. } => Some(Duration::from_secs(SERVER_BACKOFF_SECS)),
            _ if self.is_retryable() => Some(Duration::from_secs(TRANSIENT_BACKOFF_SECS)),
            _ => None,
        }
    }

    fn error_code(&self) -> String {
        let suffix = match self {
            RedditApiError::AuthenticationFailed { .. } => "AUTH_FAILED",
            RedditApiError::RateLimitExceeded { .. } => "RATE_LIMIT",
            RedditApiError::Forbidden { .. } => "FORBIDDEN",
            RedditApiError::SubredditNotFound { .. } => "SUBREDDIT_NOT_FOUND",
            RedditApiError::PostNotFound { .. } => "POST_NOT_FOUND",
            RedditApiError::NotFound { .. } => "NOT_FOUND",
            RedditApiError::InvalidToken => "INVALID_TOKEN",
            RedditApiError::RequestTimeout => "TIMEOUT",
            RedditApiError::InvalidResponse { .. } => "INVALID_RESPONSE",
            RedditApiError::ServerError { .. } => "SERVER_ERROR",
        };
        format!("REDDIT_{}", suffix)
    }
}

impl ErrorExt for SourceError {
    fn log_error(&self) -> &Self {
        error!(code = %self.error_code(), "{}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!(code = %self.error_code(), "{}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        // Initialization failures come from local configuration.
        matches!(self, SourceError::Collection { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn error_code(&self) -> String {
        match self {
            SourceError::Initialization { .. } => "SOURCE_INITIALIZATION",
            SourceError::Collection { .. } => "SOURCE_COLLECTION",
        }
        .to_string()
    }
}
