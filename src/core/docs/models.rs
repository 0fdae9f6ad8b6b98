//! Wire types for Drive `files.copy` and Docs `documents.batchUpdate`.

use serde::{Deserialize, Serialize};

use crate::core::npc::FillPlan;

#[derive(Debug, Clone, Serialize)]
pub struct CopyFileRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateRequest {
    pub requests: Vec<DocsRequest>,
}

impl BatchUpdateRequest {
    /// One case-sensitive `replaceAllText` per replacement, in plan order.
    pub fn from_plan(plan: &FillPlan) -> Self {
        let requests = plan
            .into_iter()
            .map(|r| DocsRequest::ReplaceAllText(ReplaceAllText {
                contains_text: SubstringMatchCriteria {
                    text: r.marker(),
                    match_case: true,
                },
                replace_text: r.value.clone(),
            }))
            .collect();
        Self { requests }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DocsRequest {
    ReplaceAllText(ReplaceAllText),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceAllText {
    pub contains_text: SubstringMatchCriteria,
    pub replace_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstringMatchCriteria {
    pub text: String,
    pub match_case: bool,
}

/// Google's error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct GoogleErrorEnvelope {
    pub error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleErrorBody {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::npc::{FieldMap, NpcField};
    use serde_json::json;

    #[test]
    fn test_batch_update_wire_format() {
        let mut fields = FieldMap::new();
        fields.insert(NpcField::Name, "Bob");
        let body = BatchUpdateRequest::from_plan(&FillPlan::from_fields(&fields));
        let json = serde_json::to_value(&body).unwrap();

        let requests = json["requests"].as_array().unwrap();
        assert_eq!(requests.len(), 22);
        assert_eq!(
            requests[0],
            json!({
                "replaceAllText": {
                    "containsText": { "text": "{{NPC_NAME}}", "matchCase": true },
                    "replaceText": "Bob"
                }
            })
        );
        assert_eq!(requests[1]["replaceAllText"]["replaceText"], "");
    }

    #[test]
    fn test_copy_request_omits_empty_parents() {
        let body = CopyFileRequest {
            name: "Bob - NPC".into(),
            parents: vec![],
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({ "name": "Bob - NPC" }));
    }
}
