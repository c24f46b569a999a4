//! Mapping persona traits back to the items that support them
//!
//! Only permalinks of supplied items can ever come out of here.

use std::collections::HashSet;

use crate::normalizer::REDDIT_SITE;
use crate::types::{sort_newest_first, SourceItem};

pub const MAX_CITATIONS_PER_TRAIT: usize = 3;

/// Shortest word considered significant for keyword matching
const MIN_KEYWORD_LEN: usize = 4;

/// Words too generic to tie a trait to an item
const STOPWORDS: &[&str] = &[
    "about", "active", "also", "based", "been", "being", "from", "general", "have", "into",
    "level", "likely", "more", "online", "other", "posts", "reddit", "some", "such", "that",
    "their", "them", "they", "things", "this", "user", "very", "what", "when", "with",
];

struct IndexedItem {
    permalink: String,
    /// Lowercased words in reading order
    tokens: Vec<String>,
    words: HashSet<String>,
}

/// Supplied items, newest first, prepared for matching
pub struct CitationIndex {
    items: Vec<IndexedItem>,
}

impl CitationIndex {
    pub fn new(items: &[SourceItem]) -> Self {
        let mut sorted = items.to_vec();
        sort_newest_first(&mut sorted);

        let items = sorted
            .into_iter()
            .map(|item| {
                let text = item.search_text();
                let tokens: Vec<String> = tokenize(&text).map(String::from).collect();
                let words = tokens.iter().cloned().collect();
                IndexedItem {
                    permalink: item.permalink,
                    tokens,
                    words,
                }
            })
            .collect();

        Self { items }
    }

    /// Keep service-provided sources that name a supplied item.
    ///
    /// Relative permalinks and a missing trailing slash are tolerated; the
    /// supplied item's own permalink is what gets returned.
    pub fn known_sources(&self, sources: &[String]) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for source in sources {
            let wanted = canonical(source);
            if wanted.is_empty() {
                continue;
            }
            if let Some(item) = self.items.iter().find(|i| canonical(&i.permalink) == wanted) {
                if !found.contains(&item.permalink) {
                    found.push(item.permalink.clone());
                }
            }
            if found.len() == MAX_CITATIONS_PER_TRAIT {
                break;
            }
        }
        found
    }

    /// Items mentioning `value`: whole phrase first, then significant keywords.
    /// Both tiers match on word boundaries.
    pub fn keyword_matches(&self, value: &str) -> Vec<String> {
        let phrase = value.trim().to_lowercase();
        let phrase_words: Vec<&str> = tokenize(&phrase).collect();
        if phrase.chars().count() < MIN_KEYWORD_LEN || phrase_words.is_empty() {
            return Vec::new();
        }

        let by_phrase = self.take_matching(|item| contains_phrase(&item.tokens, &phrase_words));
        if !by_phrase.is_empty() {
            return by_phrase;
        }

        let keywords: Vec<&str> = tokenize(&phrase)
            .filter(|w| w.chars().count() >= MIN_KEYWORD_LEN && !STOPWORDS.contains(w))
            .collect();
        if keywords.is_empty() {
            return Vec::new();
        }

        self.take_matching(|item| keywords.iter().any(|k| item.words.contains(*k)))
    }

    fn take_matching(&self, predicate: impl Fn(&IndexedItem) -> bool) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| predicate(item))
            .take(MAX_CITATIONS_PER_TRAIT)
            .map(|item| item.permalink.clone())
            .collect()
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

fn contains_phrase(tokens: &[String], phrase: &[&str]) -> bool {
    tokens
        .windows(phrase.len())
        .any(|window| window.iter().zip(phrase).all(|(token, word)| token == word))
}

fn canonical(permalink: &str) -> String {
    let permalink = permalink.trim();
    let absolute = if permalink.starts_with('/') {
        format!("{}{}", REDDIT_SITE, permalink)
    } else {
        permalink.to_string()
    };
    absolute.trim_end_matches('/').to_lowercase()
}
