//! Export of NPC drafts to Google Docs.
//!
//! A configured template document is copied through the Drive API and its
//! `{{TOKEN}}` placeholders are replaced through a single Docs
//! `batchUpdate`.

mod client;
mod error;
mod export;
mod models;

pub use client::{AccessTokenSource, GoogleDocsClient, StaticTokenSource};
pub use error::{DocsError, Result};
pub use export::{document_url, ExportedDocument, NpcDocumentExporter};
pub use models::{BatchUpdateRequest, CopyFileRequest, DocsRequest, ReplaceAllText, SubstringMatchCriteria};
