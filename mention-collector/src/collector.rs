use crate::mention::{comment_mention, post_mention};
use crate::source::SourceCollector;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mention_core::{
    CollectorConfig, CoreError, ErrorExt, NormalizedMention, PlatformClient, PlatformPost,
    RawMention, SearchWindow, SortOrder, SourceError, Topic, TopicType,
};
use reddit_client::RedditApiClient;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

const PLATFORM_NAME: &str = "Reddit";

/// "load more comments" placeholders are never resolved.
const COMMENT_EXPANSION_BUDGET: u32 = 0;

/// A community that could not be searched for a keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct CommunityFailure {
    pub keyword: String,
    pub community: String,
    pub error_code: String,
    pub message: String,
    /// A later run may succeed where this one did not.
    pub retryable: bool,
    /// Suggested wait before a rerun, when the platform gave one.
    pub retry_after: Option<std::time::Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct CollectionReport {
    pub mentions: Vec<NormalizedMention>,
    pub failures: Vec<CommunityFailure>,
}

/// Per-run bookkeeping owned by a single `collect` call.
#[derive(Default)]
struct RunState {
    mentions: Vec<NormalizedMention>,
    emitted: HashSet<String>,
    expanded_posts: HashSet<String>,
}

/// Collects Reddit posts and comments mentioning a topic's keywords.
pub struct MentionCollector {
    source_id: i64,
    source_name: String,
    config: CollectorConfig,
    client: Arc<dyn PlatformClient>,
}

impl MentionCollector {
    /// Builds a collector backed by a read-only Reddit API handle.
    pub fn new(
        source_id: i64,
        source_name: impl Into<String>,
        config: CollectorConfig,
    ) -> Result<Self, SourceError> {
        let client = RedditApiClient::new(&config).map_err(|e| {
            e.log_error();
            SourceError::Initialization {
                source_name: PLATFORM_NAME.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self::with_client(
            source_id,
            source_name,
            config,
            Arc::new(client),
        ))
    }

    pub fn with_client(
        source_id: i64,
        source_name: impl Into<String>,
        config: CollectorConfig,
        client: Arc<dyn PlatformClient>,
    ) -> Self {
        Self {
            source_id,
            source_name: source_name.into(),
            config,
            client,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Configured communities win over the topic type's defaults.
    pub fn resolve_communities(&self, topic_type: &TopicType) -> Vec<String> {
        if !self.config.subreddits.is_empty() {
            return self.config.subreddits.clone();
        }

        topic_type
            .default_communities()
            .iter()
            .map(|community| community.to_string())
            .collect()
    }

    /// Like [`SourceCollector::collect`], also returning the communities
    /// that failed along the way.
    pub async fn collect_with_report(
        &self,
        topic: &Topic,
        since: Option<DateTime<Utc>>,
    ) -> Result<CollectionReport, SourceError> {
        let span = info_span!(
            "collect",
            run_id = %Uuid::new_v4(),
            source = %self.source_name,
            topic_type = %topic.topic_type
        );
        self.run_collection(topic, since).instrument(span).await
    }

    /// `now - lookback_hours`, or a collection error when that instant is
    /// not representable.
    fn default_window_start(&self) -> Result<DateTime<Utc>, SourceError> {
        Duration::try_hours(self.config.lookback_hours)
            .and_then(|lookback| Utc::now().checked_sub_signed(lookback))
            .ok_or_else(|| SourceError::Collection {
                source_name: PLATFORM_NAME.to_string(),
                reason: format!(
                    "lookback of {} hours is out of range",
                    self.config.lookback_hours
                ),
            })
    }

    async fn run_collection(
        &self,
        topic: &Topic,
        since: Option<DateTime<Utc>>,
    ) -> Result<CollectionReport, SourceError> {
        let since = match since {
            Some(since) => since,
            None => self.default_window_start()?,
        };

        let keywords = topic.keyword_list();
        if keywords.is_empty() {
            debug!("Topic has no keywords, nothing to collect");
            return Ok(CollectionReport::default());
        }

        let communities = self.resolve_communities(&topic.topic_type);

        info!(
            "Collecting {} keywords across {} communities since {}",
            keywords.len(),
            communities.len(),
            since
        );

        let mut state = RunState::default();
        let mut failures = Vec::new();

        for keyword in &keywords {
            for community in &communities {
                if let Err(e) = self
                    .collect_community(keyword, community, since, &mut state)
                    .await
                {
                    warn!("Error collecting from r/{}: {}", community, e);
                    e.log_warn();
                    failures.push(CommunityFailure {
                        keyword: keyword.clone(),
                        community: community.clone(),
                        error_code: e.error_code(),
                        message: e.to_string(),
                        retryable: e.is_retryable(),
                        retry_after: e.retry_after(),
                    });
                }
            }
        }

        info!(
            "Collected {} mentions ({} community failures)",
            state.mentions.len(),
            failures.len()
        );

        Ok(CollectionReport {
            mentions: state.mentions,
            failures,
        })
    }

    async fn collect_community(
        &self,
        keyword: &str,
        community: &str,
        since: DateTime<Utc>,
        state: &mut RunState,
    ) -> Result<(), CoreError> {
        // Token acquisition is lazy, so auth failures stay scoped to one community.
        self.client.prepare().await?;

        let posts = self
            .client
            .search_community(
                community,
                keyword,
                SearchWindow::Day,
                self.config.search_limit,
                SortOrder::New,
            )
            .await?;

        debug!("r/{} returned {} posts for {:?}", community, posts.len(), keyword);

        // Results arrive newest first, but every post is checked rather than
        // stopping at the first stale one.
        for post in &posts {
            match post.created_at() {
                Some(posted_at) if posted_at >= since => {
                    self.accept(post_mention(post, posted_at), state);
                }
                Some(_) => {}
                None => warn!("Skipping post {} with invalid timestamp", post.id),
            }

            self.collect_comments(post, since, state).await?;
        }

        Ok(())
    }

    /// Comments are time-filtered on their own, so fresh replies under an
    /// older post still count.
    async fn collect_comments(
        &self,
        post: &PlatformPost,
        since: DateTime<Utc>,
        state: &mut RunState,
    ) -> Result<(), CoreError> {
        if state.expanded_posts.contains(&post.id) {
            return Ok(());
        }

        let comments = self
            .client
            .expand_comments(post, COMMENT_EXPANSION_BUDGET)
            .await?;
        state.expanded_posts.insert(post.id.clone());

        for comment in comments.iter().take(self.config.comment_limit) {
            match comment.created_at() {
                Some(posted_at) if posted_at >= since => {
                    self.accept(comment_mention(comment, posted_at), state);
                }
                Some(_) => {}
                None => warn!("Skipping comment {} with invalid timestamp", comment.id),
            }
        }

        Ok(())
    }

    fn accept(&self, mention: RawMention, state: &mut RunState) {
        if state.emitted.contains(&mention.post_id) {
            debug!("Already collected {}", mention.post_id);
            return;
        }
        if !self.validate_mention(&mention) {
            debug!("Dropping invalid mention {}", mention.post_id);
            return;
        }

        state.emitted.insert(mention.post_id.clone());
        state.mentions.push(self.normalize_mention(mention));
    }
}

#[async_trait]
impl SourceCollector for MentionCollector {
    fn source_id(&self) -> i64 {
        self.source_id
    }

    fn source_name(&self) -> &str {
        &self.source_name
    }

    async fn collect(
        &self,
        topic: &Topic,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<NormalizedMention>, SourceError> {
        self.collect_with_report(topic, since)
            .await
            .map(|report| report.mentions)
    }
}
