//! Capabilities a social platform must offer to be searched for mentions.

use crate::error::CoreError;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Relative time window accepted by platform search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchWindow {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl SearchWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchWindow::Hour => "hour",
            SearchWindow::Day => "day",
            SearchWindow::Week => "week",
            SearchWindow::Month => "month",
            SearchWindow::Year => "year",
            SearchWindow::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Relevance,
    Hot,
    Top,
    New,
    Comments,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Relevance => "relevance",
            SortOrder::Hot => "hot",
            SortOrder::Top => "top",
            SortOrder::New => "new",
            SortOrder::Comments => "comments",
        }
    }
}

/// A post returned by community search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformPost {
    pub id: String,
    pub title: String,
    pub body: String,
    pub permalink: String,
    pub author: Option<String>,
    pub created_utc: f64,
    pub score: i64,
    pub comment_count: i64,
}

/// A comment attached to a [`PlatformPost`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformComment {
    pub id: String,
    pub body: String,
    pub permalink: String,
    pub author: Option<String>,
    pub created_utc: f64,
    pub score: i64,
}

impl PlatformPost {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        epoch_seconds_to_utc(self.created_utc)
    }
}

impl PlatformComment {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        epoch_seconds_to_utc(self.created_utc)
    }
}

/// Converts fractional epoch seconds to a UTC instant, `None` when out of range.
pub fn epoch_seconds_to_utc(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let millis = (seconds * 1000.0).round() as i64;
    Utc.timestamp_millis_opt(millis).single()
}

/// Read-only access to a platform's search and comment APIs.
///
/// Implementations own authentication, rate limiting and transport. A handle
/// is shared across collection runs and must not keep per-call cursors.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Readies the handle for requests, e.g. by acquiring an access token.
    async fn prepare(&self) -> Result<(), CoreError> {
        Ok(())
    }

    async fn search_community(
        &self,
        community: &str,
        query: &str,
        window: SearchWindow,
        limit: u32,
        sort: SortOrder,
    ) -> Result<Vec<PlatformPost>, CoreError>;

    /// Returns the post's comments flattened breadth-first. `expansion_budget`
    /// is the number of "load more" placeholders that may be resolved; zero
    /// drops them all.
    async fn expand_comments(
        &self,
        post: &PlatformPost,
        expansion_budget: u32,
    ) -> Result<Vec<PlatformComment>, CoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_conversion() {
        let instant = epoch_seconds_to_utc(1640995200.0).unwrap();
        assert_eq!(instant.to_rfc3339(), "2022-01-01T00:00:00+00:00");

        let fractional = epoch_seconds_to_utc(1640995200.5).unwrap();
        assert_eq!(fractional.timestamp_millis(), 1640995200500);
    }

    #[test]
    fn test_epoch_conversion_rejects_non_finite() {
        assert!(epoch_seconds_to_utc(f64::NAN).is_none());
        assert!(epoch_seconds_to_utc(f64::INFINITY).is_none());
    }

    #[test]
    fn test_query_parameter_names() {
        assert_eq!(SearchWindow::Day.as_str(), "day");
        assert_eq!(SortOrder::New.as_str(), "new");
    }
}
