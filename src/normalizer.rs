//! Listing normalization
//!
//! Pure conversion of raw Reddit listing children into [`SourceItem`]s.
//! Malformed or empty children are skipped, never failing the batch.

use std::sync::OnceLock;

use chrono::{TimeZone, Utc};
use regex::Regex;
use scraper::{Html, Node};
use serde::Deserialize;
use tracing::debug;

use crate::types::{SourceItem, SourceKind};

/// Site prefix for relative permalinks
pub const REDDIT_SITE: &str = "https://www.reddit.com";

/// Bodies Reddit substitutes for removed content
const TOMBSTONES: &[&str] = &["[deleted]", "[removed]"];

#[derive(Debug, Deserialize)]
struct RawChild {
    kind: String,
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: Option<String>,
    #[serde(default)]
    selftext_html: Option<String>,
    #[serde(default)]
    subreddit: String,
    permalink: String,
    created_utc: f64,
    #[serde(default)]
    score: i64,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    body_html: Option<String>,
    #[serde(default)]
    subreddit: String,
    permalink: String,
    created_utc: f64,
    #[serde(default)]
    score: i64,
}

/// Normalize every child of a listing page, dropping unusable ones
pub fn normalize_listing(children: &[serde_json::Value]) -> Vec<SourceItem> {
    children.iter().filter_map(normalize_child).collect()
}

/// Normalize one `{kind, data}` listing child
pub fn normalize_child(child: &serde_json::Value) -> Option<SourceItem> {
    let raw: RawChild = match serde_json::from_value(child.clone()) {
        Ok(raw) => raw,
        Err(e) => {
            debug!(error = %e, "Skipping listing child without kind/data");
            return None;
        }
    };

    let Some(kind) = SourceKind::from_thing_kind(&raw.kind) else {
        debug!(kind = %raw.kind, "Skipping unsupported listing kind");
        return None;
    };

    let item = match kind {
        SourceKind::Post => normalize_post(raw.data),
        SourceKind::Comment => normalize_comment(raw.data),
    };

    if item.is_none() {
        debug!(kind = %kind, "Skipping malformed or empty item");
    }
    item
}

fn normalize_post(data: serde_json::Value) -> Option<SourceItem> {
    let raw: RawPost = serde_json::from_value(data).ok()?;

    let title = clean_markdown(&raw.title);
    let body = body_text(raw.selftext_html.as_deref(), raw.selftext.as_deref());
    let text = match (title.is_empty(), body.is_empty()) {
        (true, true) => return None,
        (false, true) => title.clone(),
        (true, false) => body,
        (false, false) => format!("{}\n{}", title, body),
    };

    Some(SourceItem {
        kind: SourceKind::Post,
        text,
        title: (!title.is_empty()).then_some(title),
        permalink: absolute_permalink(&raw.permalink)?,
        created_at: Utc.timestamp_opt(raw.created_utc as i64, 0).single()?,
        subreddit: raw.subreddit,
        score: raw.score,
    })
}

fn normalize_comment(data: serde_json::Value) -> Option<SourceItem> {
    let raw: RawComment = serde_json::from_value(data).ok()?;

    let text = body_text(raw.body_html.as_deref(), raw.body.as_deref());
    if text.is_empty() {
        return None;
    }

    Some(SourceItem {
        kind: SourceKind::Comment,
        text,
        title: None,
        permalink: absolute_permalink(&raw.permalink)?,
        created_at: Utc.timestamp_opt(raw.created_utc as i64, 0).single()?,
        subreddit: raw.subreddit,
        score: raw.score,
    })
}

/// Prefer the rendered HTML, fall back to the markdown source
fn body_text(html: Option<&str>, markdown: Option<&str>) -> String {
    if let Some(markdown) = markdown {
        if TOMBSTONES.contains(&markdown.trim()) {
            return String::new();
        }
    }

    let text = match html.filter(|h| !h.trim().is_empty()) {
        Some(html) => html_to_text(html),
        None => markdown.map(clean_markdown).unwrap_or_default(),
    };

    if TOMBSTONES.contains(&text.as_str()) {
        String::new()
    } else {
        text
    }
}

fn absolute_permalink(permalink: &str) -> Option<String> {
    let permalink = permalink.trim();
    if permalink.is_empty() {
        None
    } else if permalink.starts_with("http://") || permalink.starts_with("https://") {
        Some(permalink.to_string())
    } else if permalink.starts_with('/') {
        Some(format!("{}{}", REDDIT_SITE, permalink))
    } else {
        None
    }
}

// ─────────────────────────────────────────────────────────────────
// Markup stripping
// ─────────────────────────────────────────────────────────────────

const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "blockquote", "pre", "h1", "h2", "h3", "h4", "h5", "h6",
    "tr", "td", "th", "hr", "table",
];

/// Extract readable text from a Reddit HTML body.
///
/// Without `raw_json=1` Reddit escapes the HTML once more, so an
/// entity-escaped fragment is decoded before extraction.
pub fn html_to_text(html: &str) -> String {
    let html = if html.trim_start().starts_with("&lt;") {
        fragment_text(html)
    } else {
        html.to_string()
    };
    collapse_whitespace(&fragment_text(&html))
}

fn fragment_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());

    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) if BLOCK_ELEMENTS.contains(&element.name()) => out.push(' '),
            _ => {}
        }
    }

    out
}

fn markdown_rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            // [label](target) and ![alt](src)
            (r"!?\[([^\]]*)\]\([^)]*\)", "$1"),
            // superscript ^(text) and bare carets
            (r"\^\(([^)]*)\)", "$1"),
            (r"\^", ""),
            // >!spoilers!<
            (r">!|!<", ""),
            // headings, quotes, list bullets at line start
            (r"(?m)^[ \t]{0,3}(?:#{1,6}|>+|[-*+]|\d+\.)[ \t]+", ""),
            // horizontal rules
            (r"(?m)^[ \t]*(?:\*{3,}|-{3,}|_{3,})[ \t]*$", ""),
            // emphasis, strikethrough, code markers
            (r"\*\*|__|~~|```|`|\*", ""),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
        .collect()
    })
}

/// Strip Reddit markdown down to plain text
pub fn clean_markdown(markdown: &str) -> String {
    let mut text = decode_entities(markdown);
    for (re, replacement) in markdown_rules() {
        text = re.replace_all(&text, *replacement).into_owned();
    }
    collapse_whitespace(&text)
}

fn decode_entities(text: &str) -> String {
    text.replace("&#x200B;", "")
        .replace('\u{200B}', "")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
