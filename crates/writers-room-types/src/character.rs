//! Character profiles.
//!
//! A `CharacterProfile` is everything an agent knows about the character it
//! plays. Profiles are read once per scene and never mutated while the scene
//! runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A character that can take part in scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterProfile {
    /// Unique display name; also the speaker tag in transcripts.
    pub name: String,
    #[serde(default)]
    pub personality: String,
    /// How the character talks (cadence, vocabulary, tics).
    #[serde(default)]
    pub voice_pattern: String,
    /// Other character name -> relationship status.
    #[serde(default)]
    pub relationships: BTreeMap<String, String>,
    #[serde(default)]
    pub current_arc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
}

impl CharacterProfile {
    /// Minimal profile with only a name. Mostly useful in tests.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            personality: String::new(),
            voice_pattern: String::new(),
            relationships: BTreeMap::new(),
            current_arc: String::new(),
            age: None,
        }
    }

    /// Whether `name` can serve as a speaker tag: one word of letters,
    /// digits, or underscores, so `Name: line` reads back unambiguously.
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
    }

    /// How this character relates to `other`, if recorded.
    pub fn relationship_with(&self, other: &str) -> Option<&str> {
        self.relationships.get(other).map(String::as_str)
    }
}

/// Name-keyed lookup of every known character.
#[derive(Debug, Clone, Default)]
pub struct CharacterCatalog {
    profiles: BTreeMap<String, CharacterProfile>,
}

impl CharacterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a profile, replacing any previous profile with the same name.
    ///
    /// Returns the replaced profile, if any.
    pub fn insert(&mut self, profile: CharacterProfile) -> Option<CharacterProfile> {
        self.profiles.insert(profile.name.clone(), profile)
    }

    pub fn get(&self, name: &str) -> Option<&CharacterProfile> {
        self.profiles.get(name)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

impl FromIterator<CharacterProfile> for CharacterCatalog {
    fn from_iter<I: IntoIterator<Item = CharacterProfile>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for profile in iter {
            catalog.insert(profile);
        }
        catalog
    }
}
