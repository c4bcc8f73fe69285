use chrono::{DateTime, Utc};
use mention_core::{PlatformComment, PlatformPost, RawMention, DELETED_AUTHOR};

const REDDIT_HOST: &str = "https://reddit.com";

pub fn mention_id(native_id: &str) -> String {
    format!("reddit_{}", native_id)
}

fn permalink_url(permalink: &str) -> String {
    format!("{}{}", REDDIT_HOST, permalink)
}

fn author_or_deleted(author: Option<&str>) -> String {
    author.unwrap_or(DELETED_AUTHOR).to_string()
}

/// Posts score their upvotes plus the size of their discussion.
pub fn post_mention(post: &PlatformPost, posted_at: DateTime<Utc>) -> RawMention {
    RawMention {
        text: format!("{} {}", post.title, post.body),
        url: permalink_url(&post.permalink),
        author: author_or_deleted(post.author.as_deref()),
        post_id: mention_id(&post.id),
        posted_at,
        engagement_score: post.score + post.comment_count,
    }
}

pub fn comment_mention(comment: &PlatformComment, posted_at: DateTime<Utc>) -> RawMention {
    RawMention {
        text: comment.body.clone(),
        url: permalink_url(&comment.permalink),
        author: author_or_deleted(comment.author.as_deref()),
        post_id: mention_id(&comment.id),
        posted_at,
        engagement_score: comment.score,
    }
}
