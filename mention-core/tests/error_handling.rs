use mention_core::{ConfigError, CoreError, ErrorExt, RedditApiError, SourceError};
use std::time::Duration;

#[test]
fn test_error_codes() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    assert_eq!(reddit_error.error_code(), "REDDIT_INVALID_TOKEN");

    let missing = CoreError::RedditApi(RedditApiError::SubredditNotFound {
        subreddit: "nope".to_string(),
    });
    assert_eq!(missing.error_code(), "REDDIT_SUBREDDIT_NOT_FOUND");

    let config_error = CoreError::Config(ConfigError::InvalidValue {
        field: "lookback_hours".to_string(),
        value: "0".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");

    let init_error = CoreError::Source(SourceError::Initialization {
        source_name: "Reddit".to_string(),
        reason: "bad url".to_string(),
    });
    assert_eq!(init_error.error_code(), "SOURCE_INITIALIZATION");
}

#[test]
fn test_retryable_errors() {
    let retryable_error =
        CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
    assert!(retryable_error.is_retryable());

    let forbidden = CoreError::RedditApi(RedditApiError::Forbidden {
        resource: "/r/private/search".to_string(),
    });
    assert!(!forbidden.is_retryable());

    let init_error = SourceError::Initialization {
        source_name: "Reddit".to_string(),
        reason: "bad url".to_string(),
    };
    assert!(!init_error.is_retryable());
}

#[test]
fn test_retry_after() {
    let rate_limit_error =
        CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
    assert_eq!(
        rate_limit_error.retry_after(),
        Some(Duration::from_secs(60))
    );

    let invalid_input = CoreError::InvalidInput {
        message: "nope".to_string(),
    };
    assert_eq!(invalid_input.retry_after(), None);

    let outage = RedditApiError::ServerError { status_code: 503 };
    assert_eq!(outage.retry_after(), Some(Duration::from_secs(30)));
}

#[test]
fn test_source_error_messages() {
    let init_error = SourceError::Initialization {
        source_name: "Reddit".to_string(),
        reason: "invalid header value".to_string(),
    };
    assert_eq!(
        init_error.to_string(),
        "Failed to initialize Reddit client: invalid header value"
    );

    let collection_error = SourceError::Collection {
        source_name: "Reddit".to_string(),
        reason: "token request failed".to_string(),
    };
    assert_eq!(
        collection_error.to_string(),
        "Reddit collection failed: token request failed"
    );
}

#[test]
fn test_logging_helpers_return_self() {
    let error = CoreError::RedditApi(RedditApiError::InvalidToken);
    assert_eq!(error.log_warn().error_code(), "REDDIT_INVALID_TOKEN");
    assert_eq!(error.log_error().error_code(), "REDDIT_INVALID_TOKEN");
}
