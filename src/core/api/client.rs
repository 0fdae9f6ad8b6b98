//! HTTP client for the DM Assistant backend.
//!
//! The backend is a FastAPI service; most mutations take their arguments as
//! query parameters and failures come back either as a non-2xx status with a
//! `detail` field or as a 2xx body carrying an `error` field.

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use super::error::{ApiError, Result};
use super::models::*;
use crate::core::npc::NpcDraft;

#[derive(Debug, Clone)]
pub struct DmApiClient {
    base_url: Url,
    http: Client,
}

impl DmApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            http: Client::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%method, %url, "backend request");
        Ok(self.http.request(method, url))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        decode(response).await
    }

    // ------------------------------------------------------------------
    // Chat
    // ------------------------------------------------------------------

    pub async fn chat(&self, message: &str, context_type: &str) -> Result<ChatResponse> {
        let body = ChatRequest {
            message: message.to_string(),
            context_type: context_type.to_string(),
        };
        self.send(self.request(Method::POST, &["chat"])?.json(&body)).await
    }

    // ------------------------------------------------------------------
    // NPCs
    // ------------------------------------------------------------------

    /// Basic generation. Empty arguments are sent as `random`.
    pub async fn generate_npc(
        &self,
        race: &str,
        character_class: &str,
        alignment: &str,
    ) -> Result<GeneratedNpc> {
        let params = NpcGenerationParams {
            race: race.to_string(),
            character_class: character_class.to_string(),
            alignment: alignment.to_string(),
            ..Default::default()
        };
        let query: Vec<_> = params.query().into_iter().take(3).collect();
        self.send(self.request(Method::POST, &["generate-npc"])?.query(&query))
            .await
    }

    pub async fn generate_npc_enhanced(&self, params: &NpcGenerationParams) -> Result<NpcDraft> {
        let response: EnhancedNpc = self
            .send(
                self.request(Method::POST, &["generate-npc-enhanced"])?
                    .query(&params.query()),
            )
            .await?;

        if let Some(error) = response.error.filter(|e| !e.is_empty()) {
            return Err(ApiError::server(error));
        }

        Ok(NpcDraft {
            id: response.id,
            text: response.npc,
            race: params.race.clone(),
            class: params.character_class.clone(),
            alignment: params.alignment.clone(),
            metadata: response.metadata,
        })
    }

    pub async fn list_npcs(&self) -> Result<Vec<SavedNpc>> {
        let list: NpcList = self.send(self.request(Method::GET, &["npcs"])?).await?;
        Ok(list.npcs)
    }

    pub async fn get_npc(&self, id: &str) -> Result<SavedNpc> {
        self.send(self.request(Method::GET, &["npcs", id])?).await
    }

    pub async fn delete_npc(&self, id: &str) -> Result<Acknowledgement> {
        self.send(self.request(Method::DELETE, &["npcs", id])?).await
    }

    // ------------------------------------------------------------------
    // Campaign lore
    // ------------------------------------------------------------------

    pub async fn list_lore(&self) -> Result<Vec<LoreEntry>> {
        let list: LoreList = self
            .send(self.request(Method::GET, &["campaign", "lore"])?)
            .await?;
        Ok(list.lore)
    }

    pub async fn get_lore(&self, id: &str) -> Result<LoreEntry> {
        self.send(self.request(Method::GET, &["campaign", "lore", id])?)
            .await
    }

    pub async fn create_lore(&self, input: &LoreInput) -> Result<Acknowledgement> {
        self.send(
            self.request(Method::POST, &["campaign", "lore"])?
                .query(&input.query()),
        )
        .await
    }

    pub async fn update_lore(&self, id: &str, input: &LoreInput) -> Result<Acknowledgement> {
        self.send(
            self.request(Method::PUT, &["campaign", "lore", id])?
                .query(&input.query()),
        )
        .await
    }

    pub async fn delete_lore(&self, id: &str) -> Result<Acknowledgement> {
        self.send(self.request(Method::DELETE, &["campaign", "lore", id])?)
            .await
    }

    /// Search by free text and optional category. An empty category is not
    /// sent.
    pub async fn search_lore(&self, query: &str, category: Option<&str>) -> Result<LoreSearchResults> {
        let mut params = vec![("query", query)];
        if let Some(category) = category.filter(|c| !c.is_empty()) {
            params.push(("category", category));
        }
        self.send(
            self.request(Method::GET, &["campaign", "lore", "search"])?
                .query(&params),
        )
        .await
    }

    /// Lore entries of one category, used to populate the location and
    /// faction pickers of the NPC form.
    pub async fn lore_by_category(&self, category: &str) -> Result<Vec<LoreEntry>> {
        let entries = self.list_lore().await?;
        Ok(entries.into_iter().filter(|e| e.category == category).collect())
    }

    /// Store a generated NPC as a lore entry titled with its display name.
    pub async fn save_npc_to_lore(&self, draft: &NpcDraft) -> Result<Acknowledgement> {
        let input = LoreInput::new(draft.display_name(), draft.text.clone(), "npc");
        self.create_lore(&input).await
    }

    // ------------------------------------------------------------------
    // Rulebooks
    // ------------------------------------------------------------------

    pub async fn search_rulebooks(&self, query: &str, n_results: usize) -> Result<RulebookSearch> {
        let n_results = n_results.to_string();
        self.send(
            self.request(Method::POST, &["search-rulebooks"])?
                .query(&[("query", query), ("n_results", n_results.as_str())]),
        )
        .await
    }

    pub async fn chat_with_rulebooks(&self, message: &str) -> Result<RulebookAnswer> {
        self.send(
            self.request(Method::POST, &["chat-with-rulebooks"])?
                .query(&[("message", message)]),
        )
        .await
    }

    // ------------------------------------------------------------------
    // Maps
    // ------------------------------------------------------------------

    pub async fn generate_map(&self, request: &MapRequest) -> Result<MapResult> {
        let result: MapResult = self
            .send(
                self.request(Method::POST, &["generate-map"])?
                    .query(&request.query()),
            )
            .await?;

        if !result.success {
            let message = result
                .error
                .clone()
                .unwrap_or_else(|| "Failed to generate map".to_string());
            return Err(ApiError::server(message));
        }
        Ok(result)
    }
}

/// Classify a response: non-2xx becomes [`ApiError::Status`], a 2xx body with
/// an `error` string becomes [`ApiError::Server`], anything else is decoded.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = error_detail(&body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body.clone()
            }
        });
        tracing::warn!(status = status.as_u16(), %message, "backend returned error status");
        return Err(ApiError::status(status.as_u16(), message));
    }

    let value: serde_json::Value = serde_json::from_str(&body)?;
    if let Some(error) = value.get("error").and_then(|e| e.as_str()).filter(|e| !e.is_empty()) {
        // Map results report their own failures through `success`.
        if value.get("success").is_none() {
            return Err(ApiError::server(error));
        }
    }
    Ok(serde_json::from_value(value)?)
}

/// Message from a FastAPI error body: `detail` as a string, or the first
/// validation error's `msg`.
fn error_detail(body: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct Detail {
        detail: serde_json::Value,
    }

    let detail = serde_json::from_str::<Detail>(body).ok()?.detail;
    match detail {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Array(items) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(|msg| msg.as_str())
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_segments() {
        let client = DmApiClient::new("http://localhost:8080/").unwrap();
        let url = client.endpoint(&["campaign", "lore", "abc"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/campaign/lore/abc");
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_encodes() {
        let client = DmApiClient::new("https://example.com/api").unwrap();
        let url = client.endpoint(&["npcs", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/npcs/a%2Fb%20c");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(DmApiClient::new("not a url"), Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(error_detail(r#"{"detail":"Lore entry not found"}"#).as_deref(), Some("Lore entry not found"));
        assert_eq!(
            error_detail(r#"{"detail":[{"loc":["query","title"],"msg":"field required"}]}"#).as_deref(),
            Some("field required")
        );
        assert_eq!(error_detail("Internal Server Error"), None);
    }
}
