//! Property-based tests for fill plans
//!
//! Tests invariants:
//! - A plan always covers all 22 tokens in template order
//! - `filled()` counts exactly the present fields
//! - Applying the plan to a template removes every marker

use proptest::prelude::*;

use crate::core::npc::{FieldMap, FillPlan, NpcField, RegexNpcExtractor};
use crate::tests::common::sample_draft;

// ============================================================================
// Strategies for generating test inputs
// ============================================================================

fn arb_field() -> impl Strategy<Value = NpcField> {
    (0..NpcField::ALL.len()).prop_map(|i| NpcField::ALL[i])
}

/// Arbitrary maps, including blank values that the map must drop.
fn arb_field_map() -> impl Strategy<Value = FieldMap> {
    prop::collection::vec((arb_field(), "[ a-zA-Z0-9.+-]{0,24}"), 0..30)
        .prop_map(|entries| entries.into_iter().collect())
}

fn template() -> String {
    NpcField::ALL
        .iter()
        .map(|f| format!("{}: {{{{{}}}}}\n", f.key(), f.placeholder()))
        .collect()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: one replacement per token, in template order
    #[test]
    fn prop_plan_is_total(fields in arb_field_map()) {
        let plan = FillPlan::from_fields(&fields);
        prop_assert_eq!(plan.len(), NpcField::ALL.len());
        for (replacement, field) in plan.replacements().iter().zip(NpcField::ALL) {
            prop_assert_eq!(replacement.token, field.placeholder());
            prop_assert_eq!(replacement.value.as_str(), fields.get(field).unwrap_or_default());
        }
    }

    /// Property: filled count equals the number of present fields
    #[test]
    fn prop_filled_matches_map(fields in arb_field_map()) {
        prop_assert_eq!(FillPlan::from_fields(&fields).filled(), fields.len());
    }

    /// Property: no `{{TOKEN}}` marker survives the substitution
    #[test]
    fn prop_no_marker_survives(fields in arb_field_map()) {
        let plan = FillPlan::from_fields(&fields);
        let mut doc = template();
        for replacement in &plan {
            doc = doc.replace(&replacement.marker(), &replacement.value);
        }
        prop_assert!(!doc.contains("{{"), "unreplaced marker in {}", doc);
    }
}

#[test]
fn test_sample_draft_fills_every_token() {
    let draft = sample_draft();
    let plan = FillPlan::from_fields(&draft.fields(RegexNpcExtractor::shared()));
    assert_eq!(plan.filled(), NpcField::ALL.len());
    assert_eq!(plan.get("NPC_NAME"), Some("Elara Meadowbrook"));
    assert_eq!(plan.get("STR"), Some("8"));
}
