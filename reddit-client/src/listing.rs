//! Wire shapes of Reddit listings and their conversion into platform records.

use mention_core::{PlatformComment, PlatformPost, DELETED_AUTHOR};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<T>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub author: Option<String>,
    pub subreddit: String,
    pub permalink: String,
    pub url: Option<String>,
    pub created_utc: f64,
    pub score: i64,
    pub num_comments: i64,
    #[serde(default)]
    pub over_18: bool,
    #[serde(default)]
    pub stickied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditCommentData {
    pub id: String,
    #[serde(default)]
    pub body: String,
    pub author: Option<String>,
    #[serde(default)]
    pub permalink: String,
    pub created_utc: f64,
    pub score: i64,
    pub link_id: Option<String>,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub replies: RedditReplies,
}

/// A "load more comments" placeholder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditMoreData {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum CommentNode {
    #[serde(rename = "t1")]
    Comment(Box<RedditCommentData>),
    #[serde(rename = "more")]
    More(RedditMoreData),
}

/// Reddit sends `""` instead of a listing when a comment has no replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RedditReplies {
    Listing(Box<RedditListing<CommentNode>>),
    Empty(String),
}

impl Default for RedditReplies {
    fn default() -> Self {
        RedditReplies::Empty(String::new())
    }
}

/// Body of `/api/morechildren?api_type=json`.
#[derive(Debug, Clone, Deserialize)]
pub struct MoreChildrenResponse {
    pub json: MoreChildrenJson,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoreChildrenJson {
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
    pub data: Option<MoreChildrenData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoreChildrenData {
    #[serde(default)]
    pub things: Vec<CommentNode>,
}

/// Treats missing, empty and `[deleted]` authors alike.
fn known_author(author: Option<String>) -> Option<String> {
    author.filter(|name| !name.is_empty() && name != DELETED_AUTHOR)
}

impl From<RedditPostData> for PlatformPost {
    fn from(post_data: RedditPostData) -> Self {
        Self {
            id: post_data.id,
            title: post_data.title,
            body: post_data.selftext,
            permalink: post_data.permalink,
            author: known_author(post_data.author),
            created_utc: post_data.created_utc,
            score: post_data.score,
            comment_count: post_data.num_comments,
        }
    }
}

impl From<RedditCommentData> for PlatformComment {
    fn from(comment_data: RedditCommentData) -> Self {
        Self {
            id: comment_data.id,
            body: comment_data.body,
            permalink: comment_data.permalink,
            author: known_author(comment_data.author),
            created_utc: comment_data.created_utc,
            score: comment_data.score,
        }
    }
}

/// Posts of a search listing, in listing order.
pub fn listing_posts(listing: RedditListing<RedditListingChild<RedditPostData>>) -> Vec<PlatformPost> {
    listing
        .data
        .children
        .into_iter()
        .filter(|child| child.kind == "t3")
        .map(|child| PlatformPost::from(child.data))
        .collect()
}

/// Flattens a comment forest breadth-first: all top-level comments first,
/// then their replies level by level. Placeholders are returned separately
/// in the order they were met.
pub fn flatten_comment_forest(
    listing: RedditListing<CommentNode>,
) -> (Vec<PlatformComment>, Vec<RedditMoreData>) {
    let mut comments = Vec::new();
    let mut placeholders = Vec::new();
    let mut queue: VecDeque<CommentNode> = listing.data.children.into();

    while let Some(node) = queue.pop_front() {
        match node {
            CommentNode::Comment(mut comment) => {
                if let RedditReplies::Listing(replies) =
                    std::mem::take(&mut comment.replies)
                {
                    queue.extend(replies.data.children);
                }
                comments.push(PlatformComment::from(*comment));
            }
            CommentNode::More(more) => placeholders.push(more),
        }
    }

    (comments, placeholders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn comment(id: &str, replies: serde_json::Value) -> serde_json::Value {
        json!({
            "kind": "t1",
            "data": {
                "id": id,
                "body": format!("body {}", id),
                "author": "someone",
                "permalink": format!("/r/test/comments/abc/post/{}/", id),
                "created_utc": 1640995200.0,
                "score": 1,
                "link_id": "t3_abc",
                "parent_id": "t3_abc",
                "replies": replies
            }
        })
    }

    fn listing(children: Vec<serde_json::Value>) -> serde_json::Value {
        json!({
            "kind": "Listing",
            "data": { "children": children, "after": null, "before": null }
        })
    }

    #[test]
    fn test_flatten_is_breadth_first() {
        let raw = listing(vec![
            comment("a", listing(vec![comment("a1", json!(""))])),
            comment("b", listing(vec![comment("b1", listing(vec![comment("b1x", json!(""))]))])),
            comment("c", json!("")),
        ]);

        let parsed: RedditListing<CommentNode> = serde_json::from_value(raw).unwrap();
        let (comments, placeholders) = flatten_comment_forest(parsed);

        let ids: Vec<&str> = comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "a1", "b1", "b1x"]);
        assert!(placeholders.is_empty());
    }

    #[test]
    fn test_more_placeholders_are_separated() {
        let raw = listing(vec![
            comment("a", json!("")),
            json!({
                "kind": "more",
                "data": {
                    "id": "m1",
                    "count": 12,
                    "parent_id": "t3_abc",
                    "children": ["x1", "x2"]
                }
            }),
        ]);

        let parsed: RedditListing<CommentNode> = serde_json::from_value(raw).unwrap();
        let (comments, placeholders) = flatten_comment_forest(parsed);

        assert_eq!(comments.len(), 1);
        assert_eq!(placeholders.len(), 1);
        assert_eq!(placeholders[0].children, vec!["x1", "x2"]);
    }

    #[test]
    fn test_deleted_authors_become_unknown() {
        let raw = json!({
            "id": "d1",
            "body": "[removed]",
            "author": "[deleted]",
            "permalink": "/r/test/comments/abc/post/d1/",
            "created_utc": 1640995200.0,
            "score": 0
        });
        let data: RedditCommentData = serde_json::from_value(raw).unwrap();
        let comment = PlatformComment::from(data);
        assert_eq!(comment.author, None);
    }

    #[test]
    fn test_search_listing_conversion() {
        let raw = json!({
            "kind": "Listing",
            "data": {
                "after": "t3_next",
                "before": null,
                "dist": 1,
                "children": [{
                    "kind": "t3",
                    "data": {
                        "id": "test123",
                        "title": "Test Post",
                        "selftext": "This is test content",
                        "author": null,
                        "subreddit": "test",
                        "permalink": "/r/test/comments/test123/test_post/",
                        "url": "https://reddit.com/r/test/comments/test123",
                        "created_utc": 1640995200.0,
                        "score": 42,
                        "num_comments": 5,
                        "over_18": false
                    }
                }]
            }
        });

        let parsed: RedditListing<RedditListingChild<RedditPostData>> =
            serde_json::from_value(raw).unwrap();
        let posts = listing_posts(parsed);

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "test123");
        assert_eq!(posts[0].body, "This is test content");
        assert_eq!(posts[0].author, None);
        assert_eq!(posts[0].score, 42);
        assert_eq!(posts[0].comment_count, 5);
    }
}
