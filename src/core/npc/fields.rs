//! The closed set of NPC fields and the map of values extracted for them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A named field of an NPC write-up.
///
/// Declaration order is the order of the document template, and is the
/// iteration order of [`FieldMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcField {
    Name,
    Race,
    Class,
    Alignment,
    Level,
    WorldPlacement,
    PhysicalDescription,
    VoiceSuggestions,
    PersonalityTraits,
    Background,
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
    SavingThrows,
    Skills,
    Senses,
    Languages,
    Abilities,
    Actions,
}

impl NpcField {
    pub const ALL: [NpcField; 22] = [
        NpcField::Name,
        NpcField::Race,
        NpcField::Class,
        NpcField::Alignment,
        NpcField::Level,
        NpcField::WorldPlacement,
        NpcField::PhysicalDescription,
        NpcField::VoiceSuggestions,
        NpcField::PersonalityTraits,
        NpcField::Background,
        NpcField::Str,
        NpcField::Dex,
        NpcField::Con,
        NpcField::Int,
        NpcField::Wis,
        NpcField::Cha,
        NpcField::SavingThrows,
        NpcField::Skills,
        NpcField::Senses,
        NpcField::Languages,
        NpcField::Abilities,
        NpcField::Actions,
    ];

    /// Snake-case key, as used in JSON output.
    pub fn key(self) -> &'static str {
        match self {
            NpcField::Name => "name",
            NpcField::Race => "race",
            NpcField::Class => "class",
            NpcField::Alignment => "alignment",
            NpcField::Level => "level",
            NpcField::WorldPlacement => "world_placement",
            NpcField::PhysicalDescription => "physical_description",
            NpcField::VoiceSuggestions => "voice_suggestions",
            NpcField::PersonalityTraits => "personality_traits",
            NpcField::Background => "background",
            NpcField::Str => "str",
            NpcField::Dex => "dex",
            NpcField::Con => "con",
            NpcField::Int => "int",
            NpcField::Wis => "wis",
            NpcField::Cha => "cha",
            NpcField::SavingThrows => "saving_throws",
            NpcField::Skills => "skills",
            NpcField::Senses => "senses",
            NpcField::Languages => "languages",
            NpcField::Abilities => "abilities",
            NpcField::Actions => "actions",
        }
    }

    /// Template token for this field, without the `{{ }}` delimiters.
    pub fn placeholder(self) -> &'static str {
        match self {
            NpcField::Name => "NPC_NAME",
            NpcField::Race => "RACE",
            NpcField::Class => "CLASS",
            NpcField::Alignment => "ALIGNMENT",
            NpcField::Level => "LEVEL",
            NpcField::WorldPlacement => "WORLD_PLACEMENT",
            NpcField::PhysicalDescription => "PHYSICAL_DESCRIPTION",
            NpcField::VoiceSuggestions => "VOICE_SUGGESTIONS",
            NpcField::PersonalityTraits => "PERSONALITY_TRAITS",
            NpcField::Background => "BACKGROUND",
            NpcField::Str => "STR",
            NpcField::Dex => "DEX",
            NpcField::Con => "CON",
            NpcField::Int => "INT",
            NpcField::Wis => "WIS",
            NpcField::Cha => "CHA",
            NpcField::SavingThrows => "SAVING_THROWS",
            NpcField::Skills => "SKILLS",
            NpcField::Senses => "SENSES",
            NpcField::Languages => "LANGUAGES",
            NpcField::Abilities => "ABILITIES",
            NpcField::Actions => "ACTIONS",
        }
    }

    pub fn from_key(key: &str) -> Option<NpcField> {
        NpcField::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl fmt::Display for NpcField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Values extracted from one NPC text.
///
/// Fields that were not found are absent; an entry is never the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<NpcField, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. Blank values are dropped so the map keeps its
    /// absent-not-empty invariant.
    pub fn insert(&mut self, field: NpcField, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            return;
        }
        self.0.insert(field, value);
    }

    pub fn get(&self, field: NpcField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: NpcField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate present fields in template order.
    pub fn iter(&self) -> impl Iterator<Item = (NpcField, &str)> {
        self.0.iter().map(|(f, v)| (*f, v.as_str()))
    }
}

impl FromIterator<(NpcField, String)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (NpcField, String)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (field, value) in iter {
            map.insert(field, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_fields_have_unique_keys_and_tokens() {
        let mut keys: Vec<_> = NpcField::ALL.iter().map(|f| f.key()).collect();
        let mut tokens: Vec<_> = NpcField::ALL.iter().map(|f| f.placeholder()).collect();
        keys.sort_unstable();
        keys.dedup();
        tokens.sort_unstable();
        tokens.dedup();
        assert_eq!(keys.len(), 22);
        assert_eq!(tokens.len(), 22);
    }

    #[test]
    fn test_from_key_roundtrip() {
        for field in NpcField::ALL {
            assert_eq!(NpcField::from_key(field.key()), Some(field));
        }
        assert_eq!(NpcField::from_key("hp"), None);
    }

    #[test]
    fn test_insert_drops_blank_values() {
        let mut map = FieldMap::new();
        map.insert(NpcField::Name, "   ");
        map.insert(NpcField::Race, "");
        assert!(map.is_empty());
        assert!(!map.contains(NpcField::Name));
    }

    #[test]
    fn test_iteration_follows_template_order() {
        let map: FieldMap = [
            (NpcField::Actions, "Bite".to_string()),
            (NpcField::Name, "Bob".to_string()),
            (NpcField::Str, "14".to_string()),
        ]
        .into_iter()
        .collect();
        let order: Vec<_> = map.iter().map(|(f, _)| f).collect();
        assert_eq!(order, vec![NpcField::Name, NpcField::Str, NpcField::Actions]);
    }

    #[test]
    fn test_serializes_with_snake_case_keys() {
        let mut map = FieldMap::new();
        map.insert(NpcField::SavingThrows, "Dex +4");
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json, serde_json::json!({ "saving_throws": "Dex +4" }));
    }
}
