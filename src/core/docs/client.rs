//! Minimal Google Drive / Docs REST client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::error::{DocsError, Result};
use super::models::{BatchUpdateRequest, CopyFileRequest, DriveFile, GoogleErrorEnvelope};
use crate::config::GoogleConfig;

/// Supplies the bearer token for each request.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// A token taken from configuration.
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    token: Option<String>,
}

impl StaticTokenSource {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }
}

#[async_trait]
impl AccessTokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String> {
        self.token.clone().ok_or(DocsError::MissingToken)
    }
}

pub struct GoogleDocsClient {
    http: Client,
    drive_url: String,
    docs_url: String,
    tokens: Arc<dyn AccessTokenSource>,
}

impl GoogleDocsClient {
    pub fn new(
        drive_url: impl Into<String>,
        docs_url: impl Into<String>,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Self {
        Self {
            http: Client::new(),
            drive_url: drive_url.into().trim_end_matches('/').to_string(),
            docs_url: docs_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn from_config(config: &GoogleConfig) -> Self {
        Self::new(
            &config.drive_api_url,
            &config.docs_api_url,
            Arc::new(StaticTokenSource::new(config.access_token.clone())),
        )
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.tokens.access_token().await?;
        Ok(request.bearer_auth(token))
    }

    /// Copy `template_id` to a new file called `name`, optionally inside
    /// `folder_id`. Returns the new file's id.
    pub async fn copy_file(
        &self,
        template_id: &str,
        name: &str,
        folder_id: Option<&str>,
    ) -> Result<String> {
        let url = format!("{}/files/{}/copy", self.drive_url, template_id);
        let body = CopyFileRequest {
            name: name.to_string(),
            parents: folder_id.map(|f| vec![f.to_string()]).unwrap_or_default(),
        };

        let request = self
            .http
            .post(&url)
            .query(&[("supportsAllDrives", "true")])
            .json(&body);
        let file: DriveFile = decode(self.authorized(request).await?.send().await?).await?;

        tracing::info!(template_id, document_id = %file.id, "copied document template");
        Ok(file.id)
    }

    /// Apply a batch of Docs requests to `document_id`.
    pub async fn batch_update(&self, document_id: &str, body: &BatchUpdateRequest) -> Result<()> {
        let url = format!("{}/documents/{}:batchUpdate", self.docs_url, document_id);
        let request = self.http.post(&url).json(body);
        let _: serde_json::Value = decode(self.authorized(request).await?.send().await?).await?;

        tracing::info!(document_id, requests = body.requests.len(), "applied batch update");
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<GoogleErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or(body);
        tracing::warn!(status = status.as_u16(), %message, "google api error");
        return Err(DocsError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token_source() {
        let source = StaticTokenSource::new(Some("abc".into()));
        assert_eq!(source.access_token().await.unwrap(), "abc");

        let blank = StaticTokenSource::new(Some("  ".into()));
        assert!(matches!(blank.access_token().await, Err(DocsError::MissingToken)));
    }

    #[test]
    fn test_trailing_slashes_are_trimmed() {
        let client = GoogleDocsClient::new(
            "http://drive/",
            "http://docs//",
            Arc::new(StaticTokenSource::new(None)),
        );
        assert_eq!(client.drive_url, "http://drive");
        assert_eq!(client.docs_url, "http://docs");
    }
}
