use crate::auth::AppOnlyAuth;
use crate::listing::{
    flatten_comment_forest, listing_posts, CommentNode, MoreChildrenResponse, RedditListing,
    RedditListingChild, RedditMoreData, RedditPostData,
};
use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use async_trait::async_trait;
use mention_core::{
    CollectorConfig, ConfigError, CoreError, PlatformClient, PlatformComment, PlatformPost,
    RedditApiError, SearchWindow, SortOrder,
};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// `/api/morechildren` accepts at most this many ids per call.
const MORE_CHILDREN_BATCH: usize = 100;

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    auth: AppOnlyAuth,
    rate_limiter: Arc<RateLimiter>,
    api_base: Url,
    user_agent: String,
}

impl RedditApiClient {
    pub fn new(config: &CollectorConfig) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout())
            .build()?;

        let api_base = parse_api_base(&config.api_base)?;
        let auth = AppOnlyAuth::new(
            &config.client_id,
            &config.client_secret,
            &config.token_url,
            http_client.clone(),
        )?;

        Ok(Self {
            http_client,
            auth,
            rate_limiter: Arc::new(RateLimiter::new(RateLimitConfig::reddit_oauth())),
            api_base,
            user_agent: config.user_agent.clone(),
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn endpoint_url(&self, segments: &[&str]) -> Result<Url, CoreError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| CoreError::Internal {
                message: format!("API base {} cannot carry a path", self.api_base),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn make_request(
        &self,
        method: Method,
        segments: &[&str],
        query_params: &[(&str, String)],
    ) -> Result<Response, CoreError> {
        let url = self.endpoint_url(segments)?;
        let endpoint = url.path().to_string();

        let permit = self.rate_limiter.acquire_permit().await;
        if permit.queue_wait_time > Duration::from_secs(1) {
            debug!("Waited {:?} for rate limit permit", permit.queue_wait_time);
        }

        let access_token = self.auth.access_token().await?;

        info!("Making Reddit API request: {} {}", method, endpoint);
        let response = self
            .http_client
            .request(method.clone(), url)
            .bearer_auth(access_token)
            .query(query_params)
            .send()
            .await
            .map_err(|e| {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    CoreError::RedditApi(RedditApiError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        let api_error = match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("Rate limited, retry after {} seconds", retry_after);
                RedditApiError::RateLimitExceeded { retry_after }
            }
            StatusCode::UNAUTHORIZED => {
                self.auth.invalidate().await;
                RedditApiError::InvalidToken
            }
            StatusCode::FORBIDDEN => RedditApiError::Forbidden { resource: endpoint },
            StatusCode::NOT_FOUND => RedditApiError::NotFound { resource: endpoint },
            status if status.is_server_error() => RedditApiError::ServerError {
                status_code: status.as_u16(),
            },
            status => RedditApiError::InvalidResponse {
                details: format!("Unexpected status {} for {}", status, endpoint),
            },
        };
        Err(api_error.into())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query_params: &[(&str, String)],
    ) -> Result<T, CoreError> {
        let response = self.make_request(Method::GET, segments, query_params).await?;
        response.json::<T>().await.map_err(|e| {
            error!("Failed to parse response for /{}: {}", segments.join("/"), e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse /{}", segments.join("/")),
            })
        })
    }

    pub async fn search_subreddit(
        &self,
        subreddit: &str,
        query: &str,
        window: SearchWindow,
        limit: u32,
        sort: SortOrder,
    ) -> Result<Vec<PlatformPost>, CoreError> {
        let params = [
            ("q", query.to_string()),
            ("restrict_sr", "true".to_string()),
            ("t", window.as_str().to_string()),
            ("sort", sort.as_str().to_string()),
            ("limit", limit.to_string()),
            ("raw_json", "1".to_string()),
        ];

        let listing: RedditListing<RedditListingChild<RedditPostData>> = self
            .get_json(&["r", subreddit, "search"], &params)
            .await
            .map_err(|e| match e {
                CoreError::RedditApi(RedditApiError::NotFound { .. }) => {
                    CoreError::RedditApi(RedditApiError::SubredditNotFound {
                        subreddit: subreddit.to_string(),
                    })
                }
                other => other,
            })?;

        let posts = listing_posts(listing);
        info!(
            "Retrieved {} posts from r/{} for {:?}",
            posts.len(),
            subreddit,
            query
        );
        Ok(posts)
    }

    /// Loads the post's comment tree. Up to `expansion_budget` placeholders
    /// are resolved; their comments follow the loaded tree.
    pub async fn get_comments(
        &self,
        post_id: &str,
        expansion_budget: u32,
    ) -> Result<Vec<PlatformComment>, CoreError> {
        let params = [("raw_json", "1".to_string())];
        let (_post, forest): (serde_json::Value, RedditListing<CommentNode>) = self
            .get_json(&["comments", post_id], &params)
            .await
            .map_err(|e| match e {
                CoreError::RedditApi(RedditApiError::NotFound { .. }) => {
                    CoreError::RedditApi(RedditApiError::PostNotFound {
                        post_id: post_id.to_string(),
                    })
                }
                other => other,
            })?;

        let (mut comments, placeholders) = flatten_comment_forest(forest);
        let dropped = placeholders.len().saturating_sub(expansion_budget as usize);
        if dropped > 0 {
            debug!("Dropping {} 'load more' placeholders on {}", dropped, post_id);
        }

        for more in placeholders.into_iter().take(expansion_budget as usize) {
            comments.extend(self.expand_placeholder(post_id, &more).await?);
        }

        debug!("Retrieved {} comments for {}", comments.len(), post_id);
        Ok(comments)
    }

    async fn expand_placeholder(
        &self,
        post_id: &str,
        more: &RedditMoreData,
    ) -> Result<Vec<PlatformComment>, CoreError> {
        if more.children.is_empty() {
            return Ok(Vec::new());
        }

        let children: Vec<&str> = more
            .children
            .iter()
            .take(MORE_CHILDREN_BATCH)
            .map(String::as_str)
            .collect();
        let params = [
            ("link_id", format!("t3_{}", post_id)),
            ("children", children.join(",")),
            ("api_type", "json".to_string()),
            ("raw_json", "1".to_string()),
        ];

        let response: MoreChildrenResponse =
            self.get_json(&["api", "morechildren"], &params).await?;
        if !response.json.errors.is_empty() {
            return Err(RedditApiError::InvalidResponse {
                details: format!("morechildren errors: {:?}", response.json.errors),
            }
            .into());
        }

        Ok(response
            .json
            .data
            .map(|data| data.things)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|node| match node {
                CommentNode::Comment(comment) => Some(PlatformComment::from(*comment)),
                CommentNode::More(_) => None,
            })
            .collect())
    }
}

#[async_trait]
impl PlatformClient for RedditApiClient {
    async fn prepare(&self) -> Result<(), CoreError> {
        self.auth.access_token().await.map(|_| ())
    }

    async fn search_community(
        &self,
        community: &str,
        query: &str,
        window: SearchWindow,
        limit: u32,
        sort: SortOrder,
    ) -> Result<Vec<PlatformPost>, CoreError> {
        self.search_subreddit(community, query, window, limit, sort)
            .await
    }

    async fn expand_comments(
        &self,
        post: &PlatformPost,
        expansion_budget: u32,
    ) -> Result<Vec<PlatformComment>, CoreError> {
        self.get_comments(&post.id, expansion_budget).await
    }
}

/// Parses the API base, which must be an http(s) URL. The path is kept with
/// a trailing slash so endpoint segments append to it.
fn parse_api_base(raw: &str) -> Result<Url, CoreError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        field: "api_base".to_string(),
        value: format!("{} ({})", raw, reason),
    };

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https".to_string()).into());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_client_creation() {
        let mut config = CollectorConfig::default();
        config.user_agent = "test-user-agent/1.0".to_string();
        let client = RedditApiClient::new(&config).unwrap();
        assert_eq!(client.user_agent(), "test-user-agent/1.0");
    }

    #[test]
    fn test_endpoint_urls_escape_segments() {
        let client = RedditApiClient::new(&CollectorConfig::default()).unwrap();

        let url = client.endpoint_url(&["r", "wallstreetbets", "search"]).unwrap();
        assert_eq!(url.as_str(), "https://oauth.reddit.com/r/wallstreetbets/search");

        let url = client.endpoint_url(&["r", "odd?name", "search"]).unwrap();
        assert_eq!(url.as_str(), "https://oauth.reddit.com/r/odd%3Fname/search");
    }

    #[test]
    fn test_api_base_with_path_prefix() {
        let mut config = CollectorConfig::default();
        config.api_base = "http://localhost:8080/reddit".to_string();
        let client = RedditApiClient::new(&config).unwrap();

        let url = client.endpoint_url(&["comments", "abc"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/reddit/comments/abc");
    }

    #[test]
    fn test_rejects_non_http_api_base() {
        let mut config = CollectorConfig::default();
        config.api_base = "ftp://oauth.reddit.com".to_string();
        assert!(matches!(
            RedditApiClient::new(&config),
            Err(CoreError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_rejects_invalid_user_agent() {
        let mut config = CollectorConfig::default();
        config.user_agent = "bad\nagent".to_string();
        assert!(matches!(
            RedditApiClient::new(&config),
            Err(CoreError::Network(_))
        ));
    }
}
