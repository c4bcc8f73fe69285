use mention_core::{ConfigError, CoreError, RedditApiError};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthType, AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, Scope, TokenResponse,
    TokenUrl,
};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";

/// Tokens are refreshed this long before Reddit would reject them.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }
}

/// Application-only OAuth2 (client credentials grant). Grants read-only
/// access without a user context.
#[derive(Debug)]
pub struct AppOnlyAuth {
    oauth_client: BasicClient,
    http_client: Client,
    token: Mutex<Option<CachedToken>>,
}

impl AppOnlyAuth {
    pub fn new(
        client_id: &str,
        client_secret: &str,
        token_url: &str,
        http_client: Client,
    ) -> Result<Self, CoreError> {
        let auth_url = AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(|e| {
            ConfigError::InvalidValue {
                field: "auth_url".to_string(),
                value: e.to_string(),
            }
        })?;
        let token_url =
            TokenUrl::new(token_url.to_string()).map_err(|e| ConfigError::InvalidValue {
                field: "token_url".to_string(),
                value: format!("{} ({})", token_url, e),
            })?;

        let oauth_client = BasicClient::new(
            ClientId::new(client_id.to_string()),
            Some(ClientSecret::new(client_secret.to_string())),
            auth_url,
            Some(token_url),
        )
        .set_auth_type(AuthType::BasicAuth);

        Ok(Self {
            oauth_client,
            http_client,
            token: Mutex::new(None),
        })
    }

    /// Returns a valid bearer token, requesting a new one when needed.
    pub async fn access_token(&self) -> Result<String, CoreError> {
        let mut token = self.token.lock().await;
        if let Some(cached) = token.as_ref().filter(|cached| cached.is_fresh()) {
            return Ok(cached.access_token.clone());
        }

        debug!("Requesting application-only Reddit access token");
        let response = self
            .oauth_client
            .exchange_client_credentials()
            .add_scope(Scope::new("read".to_string()))
            .request_async(|request| send_token_request(&self.http_client, request))
            .await
            .map_err(|e| {
                warn!("Reddit token request failed: {}", e);
                RedditApiError::AuthenticationFailed {
                    reason: e.to_string(),
                }
            })?;

        let lifetime = response
            .expires_in()
            .unwrap_or_else(|| Duration::from_secs(3600));
        let cached = CachedToken {
            access_token: response.access_token().secret().clone(),
            expires_at: Instant::now() + lifetime,
        };
        info!("Obtained Reddit access token valid for {:?}", lifetime);

        let access_token = cached.access_token.clone();
        *token = Some(cached);
        Ok(access_token)
    }

    /// Drops the cached token so the next request authenticates again.
    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }

    #[cfg(test)]
    async fn has_token(&self) -> bool {
        self.token
            .lock()
            .await
            .as_ref()
            .map(CachedToken::is_fresh)
            .unwrap_or(false)
    }
}

/// Sends the token exchange through the shared client so it carries the
/// configured User-Agent, which Reddit requires on every call.
async fn send_token_request(
    client: &Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = client
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}
