//! Typed client for the DM Assistant backend service.

mod client;
mod error;
mod models;

pub use client::DmApiClient;
pub use error::{ApiError, Result};
pub use models::{
    value_text, Acknowledgement, ChatRequest, ChatResponse, EnhancedNpc, GeneratedNpc, LoreEntry,
    LoreInput, LoreSearchResults, MapRequest, MapResult, NpcGenerationParams, RulebookAnswer,
    RulebookPassage, RulebookSearch, SavedNpc, CONTEXT_TYPES, LORE_CATEGORIES, MAP_STYLES,
};
