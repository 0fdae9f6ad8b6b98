//! Error types for the Google Drive / Docs export.

pub type Result<T> = std::result::Result<T, DocsError>;

#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    /// No access token was supplied.
    #[error("Google access token is not configured")]
    MissingToken,

    /// A required setting (template id, ...) is missing.
    #[error("Google export is not configured: {0}")]
    NotConfigured(String),

    /// Drive or Docs answered with a non-2xx status.
    #[error("Google API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected Google API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DocsError {
    pub fn not_configured(what: impl Into<String>) -> Self {
        DocsError::NotConfigured(what.into())
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            DocsError::MissingToken | DocsError::Api { status: 401 | 403, .. }
        )
    }
}
