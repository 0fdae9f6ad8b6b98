//! Property-based tests for NPC field extraction
//!
//! Tests invariants:
//! - Present values are never blank
//! - Extraction is deterministic
//! - A labelled line yields its trimmed value
//! - One rule finding nothing leaves the others untouched

use proptest::prelude::*;

use crate::core::npc::{NpcField, NpcFieldSource, RegexNpcExtractor};
use crate::tests::common::SAMPLE_NPC_TEXT;

// ============================================================================
// Strategies for generating test inputs
// ============================================================================

/// A value with no label syntax in it: no colons, stars or newlines.
fn arb_plain_value() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 ',()-]{0,40}"
}

/// Single-line fields and their labels.
fn arb_line_field() -> impl Strategy<Value = (NpcField, &'static str)> {
    prop_oneof![
        Just((NpcField::Name, "Name")),
        Just((NpcField::Race, "Race")),
        Just((NpcField::Class, "Class")),
        Just((NpcField::Alignment, "Alignment")),
        Just((NpcField::Skills, "Skills")),
        Just((NpcField::Languages, "Languages")),
    ]
}

fn arb_score_field() -> impl Strategy<Value = (NpcField, &'static str)> {
    prop_oneof![
        Just((NpcField::Str, "STR")),
        Just((NpcField::Dex, "DEX")),
        Just((NpcField::Con, "CON")),
        Just((NpcField::Int, "INT")),
        Just((NpcField::Wis, "WIS")),
        Just((NpcField::Cha, "CHA")),
    ]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: whatever the input, no field maps to a blank string
    #[test]
    fn prop_values_never_blank(text in "\\PC{0,400}") {
        let map = RegexNpcExtractor::shared().fields(&text);
        for (field, value) in map.iter() {
            prop_assert!(!value.trim().is_empty(), "{} was blank", field);
            prop_assert_eq!(value, value.trim());
        }
    }

    /// Property: extraction is a pure function of the text
    #[test]
    fn prop_deterministic(text in "(?s).{0,300}") {
        let extractor = RegexNpcExtractor::new();
        prop_assert_eq!(extractor.fields(&text), RegexNpcExtractor::shared().fields(&text));
    }

    /// Property: `Label: value` yields exactly the trimmed value
    #[test]
    fn prop_line_value_roundtrips(
        (field, label) in arb_line_field(),
        value in arb_plain_value(),
        bold in any::<bool>(),
    ) {
        let text = if bold {
            format!("**{label}:** {value}   \n")
        } else {
            format!("{label}: {value}\n")
        };
        let map = RegexNpcExtractor::shared().fields(&text);
        prop_assert_eq!(map.get(field), Some(value.trim()));
        prop_assert_eq!(map.len(), 1);
    }

    /// Property: ability scores keep their digits only
    #[test]
    fn prop_score_digits((field, label) in arb_score_field(), score in 0u32..1000) {
        let text = format!("{label}: {score} (+2)");
        let map = RegexNpcExtractor::shared().fields(&text);
        let expected = score.to_string();
        prop_assert_eq!(map.get(field), Some(expected.as_str()));
    }

    /// Property: without a `STR:` label the score is absent, not empty
    #[test]
    fn prop_missing_score_is_absent(text in "[A-Za-z0-9 \n.,]{0,300}") {
        let map = RegexNpcExtractor::shared().fields(&format!("STR 14\n{text}"));
        prop_assert!(!map.contains(NpcField::Str));
        prop_assert_eq!(map.get(NpcField::Str), None);
    }

    /// Property: appending unlabelled prose never removes a field
    #[test]
    fn prop_prose_does_not_disturb_fields(prose in "[a-z .,]{0,200}") {
        let base = RegexNpcExtractor::shared().fields(SAMPLE_NPC_TEXT);
        let text = format!("{prose}\n\n{SAMPLE_NPC_TEXT}");
        let map = RegexNpcExtractor::shared().fields(&text);
        for field in NpcField::ALL {
            prop_assert_eq!(map.contains(field), base.contains(field), "{}", field);
        }
        prop_assert_eq!(map.get(NpcField::Name), base.get(NpcField::Name));
    }
}
