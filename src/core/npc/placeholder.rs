//! Turning a [`FieldMap`] into template find-and-replace operations.

use serde::Serialize;

use super::fields::{FieldMap, NpcField};

/// One literal substitution against the document template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    /// Token without delimiters, e.g. `NPC_NAME`.
    pub token: &'static str,
    pub value: String,
}

impl Replacement {
    /// The literal text searched for in the template, e.g. `{{NPC_NAME}}`.
    pub fn marker(&self) -> String {
        format!("{{{{{}}}}}", self.token)
    }
}

/// Exactly one [`Replacement`] per template token, in template order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FillPlan(Vec<Replacement>);

impl FillPlan {
    /// Absent fields are replaced with the empty string so the template's
    /// markers never survive into the exported document.
    pub fn from_fields(fields: &FieldMap) -> Self {
        let replacements = NpcField::ALL
            .into_iter()
            .map(|field| Replacement {
                token: field.placeholder(),
                value: fields.get(field).unwrap_or_default().to_string(),
            })
            .collect();
        Self(replacements)
    }

    pub fn replacements(&self) -> &[Replacement] {
        &self.0
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|r| r.token == token)
            .map(|r| r.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of tokens that receive a non-empty value.
    pub fn filled(&self) -> usize {
        self.0.iter().filter(|r| !r.value.is_empty()).count()
    }
}

impl<'a> IntoIterator for &'a FillPlan {
    type Item = &'a Replacement;
    type IntoIter = std::slice::Iter<'a, Replacement>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::npc::{NpcFieldSource, RegexNpcExtractor};

    #[test]
    fn test_marker_format() {
        let r = Replacement {
            token: "NPC_NAME",
            value: String::new(),
        };
        assert_eq!(r.marker(), "{{NPC_NAME}}");
    }

    #[test]
    fn test_scenario_plan() {
        let fields = RegexNpcExtractor::shared().fields("Name: Bob\nRace: Elf\nSTR: 14");
        let plan = FillPlan::from_fields(&fields);

        assert_eq!(plan.len(), 22);
        assert_eq!(plan.get("NPC_NAME"), Some("Bob"));
        assert_eq!(plan.get("RACE"), Some("Elf"));
        assert_eq!(plan.get("STR"), Some("14"));
        assert_eq!(plan.get("CLASS"), Some(""));
        assert_eq!(plan.get("ACTIONS"), Some(""));
        assert_eq!(plan.filled(), 3);
    }

    #[test]
    fn test_empty_map_gives_all_empty_values() {
        let plan = FillPlan::from_fields(&FieldMap::new());
        assert_eq!(plan.len(), 22);
        assert_eq!(plan.filled(), 0);
        assert!(plan.replacements().iter().all(|r| r.value.is_empty()));
    }

    #[test]
    fn test_plan_follows_template_order() {
        let plan = FillPlan::from_fields(&FieldMap::new());
        let tokens: Vec<_> = plan.into_iter().map(|r| r.token).collect();
        assert_eq!(tokens.first(), Some(&"NPC_NAME"));
        assert_eq!(tokens.last(), Some(&"ACTIONS"));
        assert_eq!(tokens[10], "STR");
    }

    #[test]
    fn test_serializes_as_list() {
        let mut fields = FieldMap::new();
        fields.insert(NpcField::Level, "3");
        let json = serde_json::to_value(FillPlan::from_fields(&fields)).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 22);
        assert_eq!(entries[4], serde_json::json!({ "token": "LEVEL", "value": "3" }));
    }
}
