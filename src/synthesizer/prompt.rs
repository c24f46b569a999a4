//! Prompt construction
//!
//! Items are admitted newest first while they fit the character budget;
//! the first block that overflows and everything older is dropped.

use crate::types::{SourceItem, SourceKind};

pub const SYSTEM_PROMPT: &str = "You are an expert user researcher who analyzes social media \
content to create accurate user personas. Only state what the content supports. \
Always respond with a single valid JSON object and nothing else.";

const BLOCK_RULE: &str = "--------------------------------------------------";

/// Prompt text plus how much of the input made it in
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltPrompt {
    pub text: String,
    /// Items whose block is at least partly present
    pub included: usize,
    /// Characters of item content (the budgeted part)
    pub content_chars: usize,
}

/// Render one item as a prompt block
pub fn format_item(item: &SourceItem) -> String {
    let mut block = match item.kind {
        SourceKind::Post => format!("[POST] in r/{}\n", item.subreddit),
        SourceKind::Comment => format!("[COMMENT] in r/{}\n", item.subreddit),
    };

    let content = match &item.title {
        Some(title) => {
            block.push_str(&format!("Title: {}\n", title));
            item.text
                .strip_prefix(title.as_str())
                .map(str::trim_start)
                .unwrap_or(&item.text)
        }
        None => item.text.as_str(),
    };
    if !content.is_empty() {
        block.push_str(&format!("Content: {}\n", content));
    }

    block.push_str(&format!("Score: {}\n", item.score));
    block.push_str(&format!(
        "Timestamp: {}\n",
        item.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    block.push_str(&format!("Permalink: {}\n", item.permalink));
    block.push_str(BLOCK_RULE);
    block.push('\n');
    block
}

/// Join item blocks newest first within `max_chars` characters
pub fn bounded_content(items: &[SourceItem], max_chars: usize) -> (String, usize) {
    let mut ordered: Vec<&SourceItem> = items.iter().collect();
    ordered.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.permalink.cmp(&b.permalink))
    });

    let mut content = String::new();
    let mut used = 0usize;
    let mut included = 0usize;

    for item in ordered {
        let block = format_item(item);
        let separator = usize::from(included > 0);
        let block_chars = block.chars().count();

        if used + separator + block_chars <= max_chars {
            if separator == 1 {
                content.push('\n');
            }
            content.push_str(&block);
            used += separator + block_chars;
            included += 1;
            continue;
        }

        if included == 0 {
            content.extend(block.chars().take(max_chars));
            included = usize::from(max_chars > 0);
        }
        break;
    }

    (content, included)
}

/// Full user prompt for `username`
pub fn build_prompt(username: &str, items: &[SourceItem], max_chars: usize) -> BuiltPrompt {
    let (content, included) = bounded_content(items, max_chars);
    let content_chars = content.chars().count();

    let text = format!(
        r#"Analyze the following Reddit posts and comments from user '{username}' and create a user persona.

Based on the content, extract:
1. Age range (e.g. "18-25", "26-35", "36-45")
2. Likely occupation or field of work
3. Interests and hobbies
4. Personality traits
5. Values and beliefs
6. Goals and aspirations
7. Pain points and challenges
8. Communication style (formal, casual, technical, ...)
9. Activity level on Reddit (active, moderate, occasional)
10. Technical proficiency level

Each item below ends with its Permalink. For every characteristic, list the
permalinks of the items that support it in "sources". Use only permalinks
that appear below.

Reddit content:
{content}
Respond in JSON with exactly this structure:
{{
  "age_range": {{"value": "estimated age range", "sources": ["permalink", ...]}},
  "occupation": {{"value": "likely occupation or field", "sources": []}},
  "interests": [{{"value": "interest", "sources": []}}, ...],
  "personality_traits": [{{"value": "trait", "sources": []}}, ...],
  "values": [{{"value": "value", "sources": []}}, ...],
  "goals": [{{"value": "goal", "sources": []}}, ...],
  "pain_points": [{{"value": "pain point", "sources": []}}, ...],
  "communication_style": {{"value": "description", "sources": []}},
  "activity_level": {{"value": "description", "sources": []}},
  "technical_proficiency": {{"value": "skill level", "sources": []}}
}}"#
    );

    BuiltPrompt {
        text,
        included,
        content_chars,
    }
}
