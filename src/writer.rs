//! Persona text rendering and output

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{TraitCategory, UserPersona};

const BANNER_WIDTH: usize = 60;

/// Body sections in output order
const SECTIONS: &[(&str, &[TraitCategory])] = &[
    ("DEMOGRAPHICS", &[TraitCategory::Demographics]),
    ("INTERESTS", &[TraitCategory::Interests]),
    ("PERSONALITY TRAITS", &[TraitCategory::Personality]),
    ("VALUES", &[TraitCategory::Values]),
    ("GOALS", &[TraitCategory::Goals]),
    ("PAIN POINTS", &[TraitCategory::PainPoints]),
    (
        "COMMUNICATION & ACTIVITY",
        &[TraitCategory::Communication, TraitCategory::Activity],
    ),
];

/// Output file name for a username
pub fn output_file_name(username: &str) -> String {
    format!("{}_persona.txt", username)
}

/// Render the persona in the fixed text layout
pub fn render(persona: &UserPersona) -> String {
    let banner = "=".repeat(BANNER_WIDTH);
    let mut lines = vec![
        banner.clone(),
        format!("USER PERSONA: {}", persona.username),
        banner.clone(),
        format!("Sources analyzed: {}", persona.source_count),
    ];
    lines.extend(persona.data_quality.caveat());
    lines.push(String::new());

    for (heading, categories) in SECTIONS {
        lines.push(format!("{}:", heading));
        for category in *categories {
            lines.extend(persona.traits_in(*category).map(|t| match &t.label {
                Some(label) => format!("• {}: {}", label, t.value),
                None => format!("• {}", t.value),
            }));
        }
        lines.push(String::new());
    }

    lines.extend(citation_lines(persona));

    lines.push(banner.clone());
    lines.push(format!(
        "Generated on: {}",
        persona.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.push(banner);

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn citation_lines(persona: &UserPersona) -> Vec<String> {
    let mut lines = vec![
        "CITATIONS:".to_string(),
        "(Sources used to derive persona characteristics)".to_string(),
        String::new(),
    ];

    let before = lines.len();
    for category in TraitCategory::all() {
        let citations = persona.citations_for(*category);
        if citations.is_empty() {
            continue;
        }
        lines.push(format!("{}:", category.heading()));
        lines.extend(citations.iter().map(|permalink| format!("  - {}", permalink)));
        lines.push(String::new());
    }

    if lines.len() == before {
        lines.push("(no citations available)".to_string());
        lines.push(String::new());
    }
    lines
}

/// Write the rendered persona to `<dir>/<username>_persona.txt`.
///
/// The directory is created if needed; an existing file is replaced.
pub fn write(persona: &UserPersona, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| Error::Write {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let path = dir.join(output_file_name(&persona.username));
    let content = render(persona);
    debug!(path = %path.display(), bytes = content.len(), "Writing persona");

    fs::write(&path, content).map_err(|e| Error::Write {
        path: path.clone(),
        source: e,
    })?;

    info!(path = %path.display(), "Persona written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataQuality, PersonaTrait};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn sample() -> UserPersona {
        let mut age = PersonaTrait::labelled(TraitCategory::Demographics, "Age Range", "26-35");
        age.add_citations(["https://www.reddit.com/r/a/1/"]);
        let mut rust = PersonaTrait::new(TraitCategory::Interests, "Rust");
        rust.add_citations(["https://www.reddit.com/r/a/2/", "https://www.reddit.com/r/a/1/"]);
        let mut games = PersonaTrait::new(TraitCategory::Interests, "Board games");
        games.add_citations(["https://www.reddit.com/r/a/2/"]);

        let mut traits = vec![
            age,
            PersonaTrait::labelled(TraitCategory::Demographics, "Occupation", "Engineer"),
            rust,
            games,
            PersonaTrait::new(TraitCategory::Personality, "Curious"),
            PersonaTrait::new(TraitCategory::Values, "Openness"),
            PersonaTrait::new(TraitCategory::Goals, "Write a compiler"),
            PersonaTrait::new(TraitCategory::PainPoints, "Meetings"),
            PersonaTrait::labelled(TraitCategory::Communication, "Communication Style", "Direct"),
            PersonaTrait::labelled(TraitCategory::Activity, "Activity Level", "Active"),
        ];
        traits.sort_by_key(|t| t.category);

        UserPersona {
            username: "kojied".to_string(),
            generated_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap(),
            source_count: 42,
            data_quality: DataQuality::Sufficient,
            traits,
        }
    }

    #[test]
    fn test_render_layout() {
        let text = render(&sample());
        let banner = "=".repeat(60);

        assert!(text.starts_with(&format!("{b}\nUSER PERSONA: kojied\n{b}\nSources analyzed: 42\n\n", b = banner)));
        assert!(text.contains("DEMOGRAPHICS:\n• Age Range: 26-35\n• Occupation: Engineer\n\n"));
        assert!(text.contains("INTERESTS:\n• Rust\n• Board games\n\n"));
        assert!(text.contains(
            "COMMUNICATION & ACTIVITY:\n• Communication Style: Direct\n• Activity Level: Active\n\n"
        ));
        assert!(text.ends_with(&format!(
            "{b}\nGenerated on: 2024-03-01 12:30:05 UTC\n{b}\n",
            b = banner
        )));
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let text = render(&sample());
        let positions: Vec<usize> = [
            "DEMOGRAPHICS:",
            "INTERESTS:",
            "PERSONALITY TRAITS:",
            "VALUES:",
            "GOALS:",
            "PAIN POINTS:",
            "COMMUNICATION & ACTIVITY:",
            "CITATIONS:",
            "Generated on:",
        ]
        .iter()
        .map(|heading| text.find(heading).unwrap())
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_citations_grouped_and_deduplicated() {
        let text = render(&sample());
        let citations = &text[text.find("CITATIONS:").unwrap()..];

        assert!(citations.contains("DEMOGRAPHICS:\n  - https://www.reddit.com/r/a/1/\n\n"));
        assert!(citations.contains(
            "INTERESTS:\n  - https://www.reddit.com/r/a/2/\n  - https://www.reddit.com/r/a/1/\n\n"
        ));
        assert!(!citations.contains("VALUES:"));
        assert!(!citations.contains("(no citations available)"));
    }

    #[test]
    fn test_placeholder_persona_renders_caveat() {
        let persona = UserPersona::placeholder("ghost", 0, DataQuality::Insufficient);
        let text = render(&persona);

        assert!(text.contains("Sources analyzed: 0\nNOTE: Insufficient data"));
        assert!(text.contains("GOALS:\n• Insufficient data\n"));
        assert!(text.contains("(no citations available)"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let persona = sample();
        assert_eq!(render(&persona), render(&persona));
    }

    #[test]
    fn test_write_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("output");

        let path = write(&sample(), &dir).unwrap();
        assert_eq!(path, dir.join("kojied_persona.txt"));
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, render(&sample()));
    }

    #[test]
    fn test_write_overwrites_existing_file() {
        let temp = TempDir::new().unwrap();
        let first = write(&sample(), temp.path()).unwrap();

        let mut updated = sample();
        updated.source_count = 7;
        let second = write(&updated, temp.path()).unwrap();

        assert_eq!(first, second);
        let written = fs::read_to_string(&second).unwrap();
        assert!(written.contains("Sources analyzed: 7"));
        assert!(!written.contains("Sources analyzed: 42"));
    }

    #[test]
    fn test_write_failure_is_write_error() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let err = write(&sample(), &blocker.join("sub")).unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
        assert_eq!(err.exit_code(), 50);
    }
}
