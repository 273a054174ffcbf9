//! Profile records and the services that maintain them.
//!
//! Every installed model gets one profile record: a display name, a
//! randomly assigned avatar and the list of characters the model has
//! told us it plays. [`ProfileService`] keeps the table in step with
//! the runtime's model list and runs character extraction.

mod extract;
mod service;

pub use extract::{CharacterParser, HeuristicParser, ParsedCharacter, EXTRACTION_PROMPT};
pub use service::ProfileService;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Avatar image service; a numeric suffix selects one of its stock
/// images.
pub const AVATAR_BASE_URL: &str = "https://avatar.iran.liara.run/public";

/// Pick a random stock avatar URL.
pub fn random_avatar_url() -> String {
    let id = rand::rng().random_range(50..=70);
    format!("{AVATAR_BASE_URL}/{id}")
}

/// One character a model plays, as surfaced to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterEntry {
    pub name: String,
    pub description: String,
    pub profile_image: String,
}

/// Profile record for one installed model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub name: String,
    pub profile_image: String,
    pub characters: Vec<CharacterEntry>,
    #[serde(rename = "IsMultiCharacter")]
    pub is_multi_character: bool,
}

impl ProfileRecord {
    /// Fresh record for a newly seen model: random avatar, no
    /// characters known yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile_image: random_avatar_url(),
            characters: Vec::new(),
            is_multi_character: false,
        }
    }

    /// Replace the character list, keeping the multi-character flag in
    /// step with it.
    pub fn set_characters(&mut self, characters: Vec<CharacterEntry>) {
        self.is_multi_character = characters.len() > 1;
        self.characters = characters;
    }
}
