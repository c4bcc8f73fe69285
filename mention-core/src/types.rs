use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Author recorded when the platform no longer knows who wrote an item.
pub const DELETED_AUTHOR: &str = "[deleted]";

/// Category of a tracked topic. Selects the default community set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TopicType {
    Stock,
    #[default]
    Topic,
    Keyword,
    Other(String),
}

impl TopicType {
    pub fn as_str(&self) -> &str {
        match self {
            TopicType::Stock => "stock",
            TopicType::Topic => "topic",
            TopicType::Keyword => "keyword",
            TopicType::Other(other) => other,
        }
    }

    /// Communities searched when the configuration names none.
    pub fn default_communities(&self) -> &'static [&'static str] {
        match self {
            TopicType::Stock => &["wallstreetbets", "stocks", "investing", "stockmarket", "options"],
            TopicType::Topic => &["technology", "Futurology", "science", "news"],
            TopicType::Keyword | TopicType::Other(_) => &["all"],
        }
    }
}

impl From<&str> for TopicType {
    fn from(value: &str) -> Self {
        match value {
            "stock" => TopicType::Stock,
            "topic" => TopicType::Topic,
            "keyword" => TopicType::Keyword,
            other => TopicType::Other(other.to_string()),
        }
    }
}

impl From<String> for TopicType {
    fn from(value: String) -> Self {
        TopicType::from(value.as_str())
    }
}

impl From<TopicType> for String {
    fn from(value: TopicType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TopicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked topic as handed over by the orchestrator.
///
/// `keywords` stays in its stored form, a JSON-encoded array of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(rename = "type", default)]
    pub topic_type: TopicType,
    #[serde(default = "default_keywords")]
    pub keywords: String,
}

fn default_keywords() -> String {
    "[]".to_string()
}

impl Topic {
    pub fn new(topic_type: impl Into<TopicType>, keywords: impl Into<String>) -> Self {
        Self {
            topic_type: topic_type.into(),
            keywords: keywords.into(),
        }
    }

    /// Decodes the keyword array. Anything that is not a JSON array of
    /// strings yields an empty list.
    pub fn keyword_list(&self) -> Vec<String> {
        match serde_json::from_str::<Vec<String>>(&self.keywords) {
            Ok(keywords) => keywords,
            Err(e) => {
                debug!("Ignoring unparseable topic keywords {:?}: {}", self.keywords, e);
                Vec::new()
            }
        }
    }
}

/// A mention shaped from a single post or comment, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMention {
    pub text: String,
    pub url: String,
    pub author: String,
    pub post_id: String,
    pub posted_at: DateTime<Utc>,
    pub engagement_score: i64,
}

/// Output record of a collection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMention {
    pub source_id: i64,
    pub source_name: String,
    pub text: String,
    pub url: String,
    pub author: String,
    pub post_id: String,
    pub posted_at: DateTime<Utc>,
    pub engagement_score: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_type_parsing() {
        assert_eq!(TopicType::from("stock"), TopicType::Stock);
        assert_eq!(TopicType::from("keyword"), TopicType::Keyword);
        assert_eq!(
            TopicType::from("unknown_type"),
            TopicType::Other("unknown_type".to_string())
        );
        assert_eq!(TopicType::from("unknown_type").as_str(), "unknown_type");
    }

    #[test]
    fn test_default_communities() {
        assert_eq!(
            TopicType::Stock.default_communities(),
            &["wallstreetbets", "stocks", "investing", "stockmarket", "options"]
        );
        assert_eq!(
            TopicType::Topic.default_communities(),
            &["technology", "Futurology", "science", "news"]
        );
        assert_eq!(TopicType::Keyword.default_communities(), &["all"]);
        assert_eq!(
            TopicType::Other("crypto".to_string()).default_communities(),
            &["all"]
        );
    }

    #[test]
    fn test_keyword_list() {
        let topic = Topic::new("stock", r#"["GME", "AMC"]"#);
        assert_eq!(topic.keyword_list(), vec!["GME", "AMC"]);

        assert!(Topic::new("stock", "[]").keyword_list().is_empty());
        assert!(Topic::new("stock", "").keyword_list().is_empty());
        assert!(Topic::new("stock", "not json").keyword_list().is_empty());
        assert!(Topic::new("stock", r#"{"a": 1}"#).keyword_list().is_empty());
        assert!(Topic::new("stock", "[1, 2]").keyword_list().is_empty());
    }

    #[test]
    fn test_topic_deserialization_defaults() {
        let topic: Topic = serde_json::from_str("{}").unwrap();
        assert_eq!(topic.topic_type, TopicType::Topic);
        assert_eq!(topic.keywords, "[]");

        let topic: Topic =
            serde_json::from_str(r#"{"type": "stock", "keywords": "[\"GME\"]"}"#).unwrap();
        assert_eq!(topic.topic_type, TopicType::Stock);
        assert_eq!(topic.keyword_list(), vec!["GME"]);
    }
}
