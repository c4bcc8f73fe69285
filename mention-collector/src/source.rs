//! Contract shared by every mention source.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mention_core::{NormalizedMention, RawMention, SourceError, Topic};
use url::Url;

#[async_trait]
pub trait SourceCollector: Send + Sync {
    fn source_id(&self) -> i64;

    fn source_name(&self) -> &str;

    /// Collects mentions of `topic` posted at or after `since`
    /// (default: the source's lookback window).
    async fn collect(
        &self,
        topic: &Topic,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<NormalizedMention>, SourceError>;

    fn validate_mention(&self, mention: &RawMention) -> bool {
        validate_mention(mention)
    }

    fn normalize_mention(&self, mention: RawMention) -> NormalizedMention {
        normalize_mention(self.source_id(), self.source_name(), mention)
    }
}

/// A mention is usable when it has text, an author, an id and an http(s) link.
pub fn validate_mention(mention: &RawMention) -> bool {
    if mention.text.trim().is_empty()
        || mention.author.trim().is_empty()
        || mention.post_id.trim().is_empty()
    {
        return false;
    }

    Url::parse(&mention.url)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

pub fn normalize_mention(
    source_id: i64,
    source_name: &str,
    mention: RawMention,
) -> NormalizedMention {
    NormalizedMention {
        source_id,
        source_name: source_name.to_string(),
        text: mention.text.split_whitespace().collect::<Vec<_>>().join(" "),
        url: mention.url,
        author: mention.author.trim().to_string(),
        post_id: mention.post_id,
        posted_at: mention.posted_at,
        engagement_score: mention.engagement_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawMention {
        RawMention {
            text: "  GME   to the\n moon ".to_string(),
            url: "https://reddit.com/r/wallstreetbets/comments/abc/gme/".to_string(),
            author: " alice ".to_string(),
            post_id: "reddit_abc".to_string(),
            posted_at: Utc::now(),
            engagement_score: 105,
        }
    }

    #[test]
    fn test_valid_mention_passes() {
        assert!(validate_mention(&raw()));
    }

    #[test]
    fn test_blank_fields_fail_validation() {
        let mut mention = raw();
        mention.text = " \n ".to_string();
        assert!(!validate_mention(&mention));

        let mut mention = raw();
        mention.author = String::new();
        assert!(!validate_mention(&mention));

        let mut mention = raw();
        mention.post_id = String::new();
        assert!(!validate_mention(&mention));
    }

    #[test]
    fn test_url_must_be_http() {
        let mut mention = raw();
        mention.url = "/r/wallstreetbets/comments/abc".to_string();
        assert!(!validate_mention(&mention));

        mention.url = "ftp://reddit.com/r/x".to_string();
        assert!(!validate_mention(&mention));
    }

    #[test]
    fn test_normalization() {
        let mention = raw();
        let posted_at = mention.posted_at;
        let normalized = normalize_mention(7, "Reddit", mention);

        assert_eq!(normalized.source_id, 7);
        assert_eq!(normalized.source_name, "Reddit");
        assert_eq!(normalized.text, "GME to the moon");
        assert_eq!(normalized.author, "alice");
        assert_eq!(normalized.post_id, "reddit_abc");
        assert_eq!(normalized.posted_at, posted_at);
        assert_eq!(normalized.engagement_score, 105);
    }
}
