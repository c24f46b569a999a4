//! Wire types for Reddit's JSON listing endpoints

use serde::Deserialize;

/// One page of a `/user/<name>/{submitted,comments}.json` listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub data: ListingData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingData {
    /// Cursor for the next page; absent on the last page
    #[serde(default)]
    pub after: Option<String>,

    /// Raw `{kind, data}` children, left untyped for the normalizer
    #[serde(default)]
    pub children: Vec<serde_json::Value>,
}

impl Listing {
    /// Listing of an unavailable profile
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.data.children.is_empty()
    }

    /// Cursor to follow, if this page is not the last
    pub fn next_cursor(&self) -> Option<&str> {
        if self.is_empty() {
            return None;
        }
        self.data.after.as_deref().filter(|a| !a.is_empty())
    }
}
