//! Transcript report: line counts recovered from rendered transcript text.

use std::sync::LazyLock;

use regex::Regex;
use writers_room_types::production::SceneStatistics;

/// A speaker tag: leading word characters followed by a colon.
static SPEAKER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^(\w+):").ok());

/// Count lines per speaker. Lines without a speaker tag are skipped.
pub fn parse_statistics(text: &str) -> SceneStatistics {
    let Some(speaker) = SPEAKER.as_ref() else {
        return SceneStatistics::default();
    };
    text.lines()
        .filter_map(|line| speaker.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}
