//! Pattern-based field extraction from AI-written NPC prose.
//!
//! The generator returns loosely formatted markdown rather than structured
//! data, so every field is recovered by its own labelled pattern. Rules are
//! independent of each other: a rule that finds nothing leaves its field
//! absent and never affects the others.

use once_cell::sync::Lazy;
use regex::Regex;

use super::fields::{FieldMap, NpcField};

/// Anything that can turn NPC text into a [`FieldMap`].
///
/// Callers depend on this rather than on [`RegexNpcExtractor`] so the regex
/// scraping can be swapped for structured backend output.
pub trait NpcFieldSource: Send + Sync {
    fn fields(&self, text: &str) -> FieldMap;
}

/// One labelled pattern. `group` is the capture group holding the value.
#[derive(Debug)]
struct ExtractionRule {
    field: NpcField,
    pattern: Regex,
    group: usize,
}

impl ExtractionRule {
    fn new(field: NpcField, pattern: &str) -> Self {
        Self {
            field,
            // Patterns are built from the fixed tables below.
            pattern: Regex::new(pattern).unwrap_or_else(|e| panic!("bad rule for {field}: {e}")),
            group: 1,
        }
    }

    /// `Label: value` on a single line.
    fn line(field: NpcField, label: &str) -> Self {
        Self::new(field, &format!(r"(?i)\b{label}\**:\**[ \t]*([^\n]+)"))
    }

    /// `STR: 14` style ability score, digits only.
    fn score(field: NpcField, label: &str) -> Self {
        Self::new(field, &format!(r"(?i)\b{label}\**:\**[ \t]*(\d+)"))
    }

    /// A section running until a blank line, one of the `next` headers at
    /// the start of a line, or the end of the text.
    fn block(field: NpcField, label: &str, next: &[&str]) -> Self {
        let next = next.join("|");
        Self::new(
            field,
            &format!(r"(?is)\b{label}\**:\**\s*(.+?)(?:\r?\n[ \t]*\r?\n|\r?\n[#*_ \t-]*(?:{next})|\z)"),
        )
    }

    /// A section running to the end of the text.
    fn tail(field: NpcField, label: &str) -> Self {
        Self::new(field, &format!(r"(?is)\b{label}\**:\**\s*(.+)"))
    }

    fn apply(&self, text: &str) -> Option<String> {
        let caps = self.pattern.captures(text)?;
        let value = clean_value(caps.get(self.group)?.as_str());
        (!value.is_empty()).then_some(value)
    }
}

static BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\s+\*\*").unwrap_or_else(|e| panic!("bad bullet pattern: {e}")));

/// Trim, turn `* **` list markers into bullets and drop bold markers.
fn clean_value(raw: &str) -> String {
    let bulleted = BULLET.replace_all(raw.trim(), "• ");
    bulleted.replace("**", "").trim().to_string()
}

/// The default [`NpcFieldSource`]: a fixed, ordered table of regex rules.
#[derive(Debug)]
pub struct RegexNpcExtractor {
    rules: Vec<ExtractionRule>,
}

static SHARED: Lazy<RegexNpcExtractor> = Lazy::new(RegexNpcExtractor::new);

impl RegexNpcExtractor {
    pub fn new() -> Self {
        use NpcField::*;

        let rules = vec![
            ExtractionRule::line(Name, r"(?:NPC\s+)?Name"),
            ExtractionRule::line(Race, "Race"),
            ExtractionRule::line(Class, "Class"),
            ExtractionRule::line(Alignment, "Alignment"),
            ExtractionRule::line(Level, "Level"),
            ExtractionRule::block(WorldPlacement, r"World\s+Placement", &["Physical"]),
            ExtractionRule::block(PhysicalDescription, r"Physical\s+Description", &["Voice"]),
            ExtractionRule::block(VoiceSuggestions, r"Voice\s+Suggestions", &["Personality"]),
            ExtractionRule::block(PersonalityTraits, r"Personality\s+Traits", &["Background"]),
            ExtractionRule::block(Background, "Background", &[r"STR\**:", r"Stat\s+Block"]),
            ExtractionRule::score(Str, "STR"),
            ExtractionRule::score(Dex, "DEX"),
            ExtractionRule::score(Con, "CON"),
            ExtractionRule::score(Int, "INT"),
            ExtractionRule::score(Wis, "WIS"),
            ExtractionRule::score(Cha, "CHA"),
            ExtractionRule::line(SavingThrows, r"Saving\s+Throws"),
            ExtractionRule::line(Skills, "Skills"),
            ExtractionRule::line(Senses, "Senses"),
            ExtractionRule::line(Languages, "Languages"),
            ExtractionRule::block(Abilities, "Abilities", &[r"Actions\**:"]),
            ExtractionRule::tail(Actions, "Actions"),
        ];

        debug_assert_eq!(rules.len(), NpcField::ALL.len());
        Self { rules }
    }

    /// Process-wide instance; the rule table is compiled once.
    pub fn shared() -> &'static RegexNpcExtractor {
        &SHARED
    }
}

impl Default for RegexNpcExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NpcFieldSource + ?Sized> NpcFieldSource for &T {
    fn fields(&self, text: &str) -> FieldMap {
        (**self).fields(text)
    }
}

impl NpcFieldSource for RegexNpcExtractor {
    fn fields(&self, text: &str) -> FieldMap {
        let mut map = FieldMap::new();
        for rule in &self.rules {
            if let Some(value) = rule.apply(text) {
                map.insert(rule.field, value);
            }
        }
        tracing::trace!(found = map.len(), "extracted npc fields");
        map
    }
}
