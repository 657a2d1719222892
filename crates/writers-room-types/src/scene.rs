//! Scene definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One scene of a production: who is in it, where, and what it is about.
///
/// Immutable once loaded. The `scene_id` is what dialog events carry to
/// scope themselves to a scene on a shared channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDefinition {
    pub scene_id: String,
    pub scene_name: String,
    #[serde(default)]
    pub location: String,
    /// Ordering hint within the production (e.g. story week).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week: Option<u32>,
    /// Character name -> what that character wants out of the scene.
    #[serde(default)]
    pub objectives: BTreeMap<String, String>,
    /// Participants, in the order they are brought on. The first one opens.
    pub characters: Vec<String>,
    #[serde(default)]
    pub context: String,
}

impl SceneDefinition {
    /// Filesystem-safe form of the scene name used for default transcript
    /// filenames: lowercase ASCII alphanumerics, every other run of
    /// characters collapsed to a single `_`.
    pub fn slug(&self) -> String {
        let source = if self.scene_name.trim().is_empty() {
            &self.scene_id
        } else {
            &self.scene_name
        };

        let mut slug = String::with_capacity(source.len());
        let mut pending_sep = false;
        for ch in source.chars() {
            if ch.is_ascii_alphanumeric() {
                if pending_sep && !slug.is_empty() {
                    slug.push('_');
                }
                pending_sep = false;
                slug.push(ch.to_ascii_lowercase());
            } else {
                pending_sep = true;
            }
        }

        if slug.is_empty() {
            "scene".to_string()
        } else {
            slug
        }
    }

    /// Objective for a given participant, if one was written.
    pub fn objective_for(&self, character: &str) -> Option<&str> {
        self.objectives.get(character).map(String::as_str)
    }

    pub fn has_participant(&self, character: &str) -> bool {
        self.characters.iter().any(|c| c == character)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(name: &str) -> SceneDefinition {
        SceneDefinition {
            scene_id: "s01".to_string(),
            scene_name: name.to_string(),
            location: String::new(),
            week: None,
            objectives: BTreeMap::new(),
            characters: vec!["Alice".to_string()],
            context: String::new(),
        }
    }

    #[test]
    fn test_slug_collapses_punctuation() {
        assert_eq!(scene("The Kitchen -- Late Night!").slug(), "the_kitchen_late_night");
    }

    #[test]
    fn test_slug_falls_back_to_id_then_default() {
        assert_eq!(scene("   ").slug(), "s01");
        let mut s = scene("");
        s.scene_id = "!!!".to_string();
        assert_eq!(s.slug(), "scene");
    }

    #[test]
    fn test_scene_yaml_roundtrip_fields() {
        let yaml = r#"
scene_id: w1_s3
scene_name: Coffee Shop Confrontation
location: Downtown cafe
week: 1
objectives:
  Alice: Get Bob to admit the truth
characters: [Alice, Bob]
context: It is raining.
"#;
        let scene: SceneDefinition = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(scene.week, Some(1));
        assert_eq!(scene.characters, vec!["Alice", "Bob"]);
        assert_eq!(scene.objective_for("Alice"), Some("Get Bob to admit the truth"));
        assert_eq!(scene.objective_for("Bob"), None);
        assert!(scene.has_participant("Bob"));
        assert!(!scene.has_participant("Carol"));
    }

    #[test]
    fn test_scene_requires_characters() {
        let yaml = "scene_id: a\nscene_name: b\n";
        let result: Result<SceneDefinition, _> = serde_yaml_ng::from_str(yaml);
        assert!(result.is_err());
    }
}
