//! NPC drafts, field extraction and template filling.

mod extractor;
mod fields;
mod placeholder;

pub use extractor::{NpcFieldSource, RegexNpcExtractor};
pub use fields::{FieldMap, NpcField};
pub use placeholder::{FillPlan, Replacement};

use serde::{Deserialize, Serialize};

pub const UNNAMED_NPC: &str = "Unnamed NPC";

/// The most recent generation result, owned by whoever requested it and
/// handed by value to save and export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NpcDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub race: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub alignment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl NpcDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn fields(&self, source: &dyn NpcFieldSource) -> FieldMap {
        source.fields(&self.text)
    }

    pub fn display_name(&self) -> String {
        display_name(&self.text)
    }
}

/// Name used for lore titles and document titles: the extracted name, else
/// the first markdown heading, else [`UNNAMED_NPC`].
pub fn display_name(text: &str) -> String {
    if let Some(name) = RegexNpcExtractor::shared().fields(text).get(NpcField::Name) {
        return name.to_string();
    }

    text.lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim().replace("**", ""))
        .find(|heading| !heading.is_empty())
        .unwrap_or_else(|| UNNAMED_NPC.to_string())
}

/// Whether the generator should write a character (level) or a creature (CR).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NpcType {
    #[default]
    Character,
    Creature,
}

impl NpcType {
    pub fn as_str(self) -> &'static str {
        match self {
            NpcType::Character => "character",
            NpcType::Creature => "creature",
        }
    }

    /// Label of the power field the form shows for this type.
    pub fn power_label(self) -> &'static str {
        match self {
            NpcType::Character => "Level",
            NpcType::Creature => "CR",
        }
    }
}

pub const NPC_ROLES: [&str; 5] = ["neutral", "ally", "enemy", "quest_giver", "merchant"];
