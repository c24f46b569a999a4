//! Source material fetched from Reddit

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether an item is a submission or a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Post,
    Comment,
}

impl SourceKind {
    pub fn all() -> &'static [SourceKind] {
        &[SourceKind::Post, SourceKind::Comment]
    }

    /// Path segment of the user listing holding this kind
    pub fn listing_path(&self) -> &'static str {
        match self {
            SourceKind::Post => "submitted",
            SourceKind::Comment => "comments",
        }
    }

    /// Reddit "thing" kind prefix (t3 = link, t1 = comment)
    pub fn thing_kind(&self) -> &'static str {
        match self {
            SourceKind::Post => "t3",
            SourceKind::Comment => "t1",
        }
    }

    pub fn from_thing_kind(kind: &str) -> Option<Self> {
        Self::all().iter().find(|k| k.thing_kind() == kind).copied()
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Post => write!(f, "post"),
            SourceKind::Comment => write!(f, "comment"),
        }
    }
}

/// One post or comment, normalized and immutable once fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceItem {
    pub kind: SourceKind,

    /// Plain text with markup removed. For posts this is the title
    /// followed by the self text.
    pub text: String,

    /// Submission title (posts only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Absolute URL of the item
    pub permalink: String,

    pub created_at: DateTime<Utc>,

    pub subreddit: String,

    pub score: i64,
}

impl SourceItem {
    /// Lowercased text used for citation matching
    pub fn search_text(&self) -> String {
        self.text.to_lowercase()
    }
}

/// Most recent first; permalink breaks ties so ordering is total
pub fn sort_newest_first(items: &mut [SourceItem]) {
    items.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.permalink.cmp(&b.permalink))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(permalink: &str, secs: i64) -> SourceItem {
        SourceItem {
            kind: SourceKind::Comment,
            text: "text".to_string(),
            title: None,
            permalink: permalink.to_string(),
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            subreddit: "rust".to_string(),
            score: 1,
        }
    }

    #[test]
    fn test_thing_kind_round_trip() {
        for kind in SourceKind::all() {
            assert_eq!(SourceKind::from_thing_kind(kind.thing_kind()), Some(*kind));
        }
        assert_eq!(SourceKind::from_thing_kind("t5"), None);
    }

    #[test]
    fn test_listing_paths() {
        assert_eq!(SourceKind::Post.listing_path(), "submitted");
        assert_eq!(SourceKind::Comment.listing_path(), "comments");
    }

    #[test]
    fn test_sort_newest_first_with_tiebreak() {
        let mut items = vec![item("/b", 100), item("/c", 300), item("/a", 100)];
        sort_newest_first(&mut items);
        let order: Vec<_> = items.iter().map(|i| i.permalink.as_str()).collect();
        assert_eq!(order, vec!["/c", "/a", "/b"]);
    }
}
