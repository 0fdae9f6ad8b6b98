//! Copy the NPC template and fill it from a draft.

use std::sync::Arc;

use serde::Serialize;

use super::client::GoogleDocsClient;
use super::error::{DocsError, Result};
use super::models::BatchUpdateRequest;
use crate::config::GoogleConfig;
use crate::core::npc::{FillPlan, NpcDraft, NpcFieldSource, RegexNpcExtractor};

/// A filled copy of the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedDocument {
    pub document_id: String,
    pub title: String,
    pub url: String,
    /// Placeholders that received a non-empty value.
    pub filled: usize,
}

pub fn document_url(document_id: &str) -> String {
    format!("https://docs.google.com/document/d/{}/edit", document_id)
}

pub struct NpcDocumentExporter {
    client: GoogleDocsClient,
    template_id: String,
    folder_id: Option<String>,
    fields: Arc<dyn NpcFieldSource>,
}

impl NpcDocumentExporter {
    pub fn new(client: GoogleDocsClient, template_id: impl Into<String>, folder_id: Option<String>) -> Self {
        Self {
            client,
            template_id: template_id.into(),
            folder_id,
            fields: Arc::new(RegexNpcExtractor::shared()),
        }
    }

    /// Build from configuration. Fails when the template or token is missing,
    /// so callers can report "not configured" before the user asks to export.
    pub fn from_config(config: &GoogleConfig) -> Result<Self> {
        let template_id = config
            .template_id
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| DocsError::not_configured("google.template_id is not set"))?;
        if config.access_token.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Err(DocsError::MissingToken);
        }

        let folder_id = config.folder_id.clone().filter(|f| !f.trim().is_empty());
        Ok(Self::new(GoogleDocsClient::from_config(config), template_id, folder_id))
    }

    /// Replace the extractor, e.g. with one reading structured backend output.
    pub fn with_field_source(mut self, fields: Arc<dyn NpcFieldSource>) -> Self {
        self.fields = fields;
        self
    }

    /// Copy the template, then replace every placeholder in one batch.
    /// Nothing is retried; the first failure is returned.
    pub async fn export(&self, draft: NpcDraft) -> Result<ExportedDocument> {
        let title = format!("{} - NPC", draft.display_name());
        let document_id = self
            .client
            .copy_file(&self.template_id, &title, self.folder_id.as_deref())
            .await?;

        let plan = FillPlan::from_fields(&draft.fields(self.fields.as_ref()));
        self.client
            .batch_update(&document_id, &BatchUpdateRequest::from_plan(&plan))
            .await?;

        Ok(ExportedDocument {
            url: document_url(&document_id),
            document_id,
            title,
            filled: plan.filled(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_url() {
        assert_eq!(document_url("abc123"), "https://docs.google.com/document/d/abc123/edit");
    }

    #[test]
    fn test_from_config_requires_template() {
        let config = GoogleConfig {
            access_token: Some("t".into()),
            ..GoogleConfig::default()
        };
        assert!(matches!(
            NpcDocumentExporter::from_config(&config),
            Err(DocsError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_from_config_requires_token() {
        let config = GoogleConfig {
            template_id: Some("tmpl".into()),
            ..GoogleConfig::default()
        };
        assert!(matches!(
            NpcDocumentExporter::from_config(&config),
            Err(DocsError::MissingToken)
        ));
    }

    #[test]
    fn test_from_config_ok() {
        let config = GoogleConfig {
            template_id: Some("tmpl".into()),
            access_token: Some("t".into()),
            folder_id: Some(" ".into()),
            ..GoogleConfig::default()
        };
        let exporter = NpcDocumentExporter::from_config(&config).unwrap();
        assert_eq!(exporter.template_id, "tmpl");
        assert!(exporter.folder_id.is_none());
    }
}
