//! Prompt assembly and reply cleanup for character agents.
//!
//! The system prompt uses XML tags for section boundaries, so the model can
//! tell the character sheet apart from the scene and the recent dialogue.
//!
//! Layout:
//! ```text
//! <character>Name, age, personality, voice, arc</character>
//! <relationships>- Bob: estranged brother</relationships>
//! <scene>Name, location, week, context</scene>
//! <objective>{this character's objective}</objective>
//! <recent_dialogue>Alice: ...</recent_dialogue>
//! <instructions>You are {name}. Reply with one line of dialogue...</instructions>
//! ```

use writers_room_types::character::CharacterProfile;
use writers_room_types::dialog::DialogEvent;
use writers_room_types::scene::SceneDefinition;

/// Build the system prompt for one generation.
pub fn build_system_prompt(
    profile: &CharacterProfile,
    scene: &SceneDefinition,
    recent: &[DialogEvent],
) -> String {
    let mut sections = Vec::with_capacity(6);

    let mut character = format!("Name: {}", profile.name);
    if let Some(age) = profile.age {
        character.push_str(&format!("\nAge: {age}"));
    }
    for (label, text) in [
        ("Personality", &profile.personality),
        ("Voice", &profile.voice_pattern),
        ("Current arc", &profile.current_arc),
    ] {
        if !text.trim().is_empty() {
            character.push_str(&format!("\n{label}: {}", text.trim()));
        }
    }
    sections.push(format!("<character>\n{character}\n</character>"));

    if !profile.relationships.is_empty() {
        let lines: Vec<String> = profile
            .relationships
            .iter()
            .map(|(name, status)| format!("- {name}: {status}"))
            .collect();
        sections.push(format!(
            "<relationships>\n{}\n</relationships>",
            lines.join("\n")
        ));
    }

    let mut setting = format!("Scene: {}\nLocation: {}", scene.scene_name, scene.location);
    if let Some(week) = scene.week {
        setting.push_str(&format!("\nWeek: {week}"));
    }
    if !scene.characters.is_empty() {
        setting.push_str(&format!("\nPresent: {}", scene.characters.join(", ")));
    }
    if !scene.context.trim().is_empty() {
        setting.push_str(&format!("\n{}", scene.context.trim()));
    }
    sections.push(format!("<scene>\n{setting}\n</scene>"));

    if let Some(objective) = scene.objective_for(&profile.name) {
        sections.push(format!("<objective>\n{}\n</objective>", objective.trim()));
    }

    if !recent.is_empty() {
        let lines: Vec<String> = recent
            .iter()
            .map(|e| format!("{}: {}", e.from, e.content))
            .collect();
        sections.push(format!(
            "<recent_dialogue>\n{}\n</recent_dialogue>",
            lines.join("\n")
        ));
    }

    sections.push(format!(
        "<instructions>\n\
        You are {}. Stay in character and speak in your own voice.\n\
        Reply with a single line of dialogue, one to three sentences.\n\
        Do not prefix the line with your name and do not narrate other characters.\n\
        You may open with a short stage direction in parentheses, like (quietly).\n\
        </instructions>",
        profile.name
    ));

    sections.join("\n\n")
}

/// User turn that asks for the next line.
pub fn user_prompt(name: &str, context: Option<&str>) -> String {
    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(extra) => format!("{extra}\n\nWhat does {name} say next?"),
        None => format!("What does {name} say next?"),
    }
}

/// A reply reduced to speakable dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedLine {
    pub text: String,
    pub emotion: Option<String>,
}

/// Strip speaker prefixes, wrapping quotes and a leading stage direction.
///
/// Returns `None` when nothing speakable is left.
pub fn clean_dialog(raw: &str, name: &str) -> Option<CleanedLine> {
    let mut text = fold_whitespace(raw);
    let mut emotion = None;

    loop {
        let before = text.clone();
        text = strip_name_prefix(&text, name).trim().to_string();
        text = strip_wrapping_quotes(&text).trim().to_string();
        if emotion.is_none() {
            if let Some((direction, rest)) = split_stage_direction(&text) {
                emotion = Some(direction);
                text = rest;
            }
        }
        if text == before {
            break;
        }
    }

    if text.is_empty() {
        None
    } else {
        Some(CleanedLine { text, emotion })
    }
}

fn fold_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_name_prefix<'a>(text: &'a str, name: &str) -> &'a str {
    if name.is_empty() {
        return text;
    }
    match text.strip_prefix(name) {
        Some(rest) => rest.strip_prefix(':').unwrap_or(text),
        None => text,
    }
}

fn strip_wrapping_quotes(text: &str) -> &str {
    const PAIRS: [(char, char); 3] = [('"', '"'), ('\'', '\''), ('\u{201c}', '\u{201d}')];
    for (open, close) in PAIRS {
        if let Some(inner) = text
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner;
        }
    }
    text
}

fn split_stage_direction(text: &str) -> Option<(String, String)> {
    let rest = text.strip_prefix('(')?;
    let end = rest.find(')')?;
    let direction = rest[..end].trim();
    if direction.is_empty() {
        return None;
    }
    Some((direction.to_string(), rest[end + 1..].trim().to_string()))
}
