//! Request and response shapes for the DM Assistant backend.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::npc::{display_name, NpcType};

// ============================================================================
// Chat
// ============================================================================

pub const CONTEXT_TYPES: [&str; 5] = ["general", "combat", "roleplay", "worldbuilding", "rules"];

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub context_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

// ============================================================================
// NPC generation
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedNpc {
    pub npc: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// Parameters for `/generate-npc-enhanced`. Empty strings mean "random".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NpcGenerationParams {
    pub race: String,
    pub character_class: String,
    pub alignment: String,
    pub npc_type: NpcType,
    pub role: String,
    pub level: Option<u32>,
    pub cr: Option<String>,
    pub location_id: Option<String>,
    pub faction_id: Option<String>,
}

impl NpcGenerationParams {
    /// Query pairs in the order the backend documents them. Only the power
    /// field that matches `npc_type` is sent.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let or_random = |s: &str| {
            if s.trim().is_empty() {
                "random".to_string()
            } else {
                s.trim().to_string()
            }
        };

        let mut query = vec![
            ("race", or_random(&self.race)),
            ("character_class", or_random(&self.character_class)),
            ("alignment", or_random(&self.alignment)),
            ("npc_type", self.npc_type.as_str().to_string()),
            ("role", if self.role.is_empty() { "neutral".into() } else { self.role.clone() }),
        ];
        match self.npc_type {
            NpcType::Character => {
                if let Some(level) = self.level {
                    query.push(("level", level.to_string()));
                }
            }
            NpcType::Creature => {
                if let Some(cr) = self.cr.as_deref().filter(|cr| !cr.trim().is_empty()) {
                    query.push(("cr", cr.trim().to_string()));
                }
            }
        }
        if let Some(id) = &self.location_id {
            query.push(("location_id", id.clone()));
        }
        if let Some(id) = &self.faction_id {
            query.push(("faction_id", id.clone()));
        }
        query
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnhancedNpc {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub npc: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavedNpc {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub alignment: Option<String>,
    #[serde(default, deserialize_with = "server_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl SavedNpc {
    pub fn name(&self) -> String {
        display_name(&self.content)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct NpcList {
    #[serde(default)]
    pub npcs: Vec<SavedNpc>,
}

// ============================================================================
// Campaign lore
// ============================================================================

pub const LORE_CATEGORIES: [&str; 6] = ["general", "location", "faction", "npc", "history", "item"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoreEntry {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "server_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "server_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_category() -> String {
    "general".to_string()
}

/// Title, content and category of a lore entry being created or updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoreInput {
    pub title: String,
    pub content: String,
    pub category: String,
}

impl LoreInput {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            category: category.into(),
        }
    }

    pub fn query(&self) -> [(&'static str, &str); 3] {
        [
            ("title", self.title.as_str()),
            ("content", self.content.as_str()),
            ("category", self.category.as_str()),
        ]
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoreList {
    #[serde(default)]
    pub lore: Vec<LoreEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoreSearchResults {
    #[serde(default)]
    pub results: Vec<LoreEntry>,
    #[serde(default)]
    pub count: usize,
}

/// `{message, id}` acknowledgement for lore and NPC mutations.
#[derive(Debug, Clone, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

// ============================================================================
// Rulebooks
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RulebookPassage {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub page_number: Option<serde_json::Value>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub similarity: Option<f64>,
}

impl RulebookPassage {
    pub fn page(&self) -> String {
        self.page_number.as_ref().map(value_text).unwrap_or_else(|| "?".to_string())
    }

    /// Similarity as a percentage with one decimal, e.g. `87.3%`.
    pub fn similarity_percent(&self) -> Option<String> {
        self.similarity.map(|s| format!("{:.1}%", s * 100.0))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RulebookSearch {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub results: Vec<RulebookPassage>,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RulebookAnswer {
    pub response: String,
    #[serde(default)]
    pub sources: Vec<RulebookPassage>,
}

// ============================================================================
// Maps
// ============================================================================

pub const MAP_STYLES: [&str; 4] = ["fantasy", "dungeon", "wilderness", "urban"];

#[derive(Debug, Clone, PartialEq)]
pub struct MapRequest {
    pub description: String,
    pub rows: u32,
    pub columns: u32,
    pub style: String,
    pub show_grid: bool,
}

impl MapRequest {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("description", self.description.clone()),
            ("rows", self.rows.to_string()),
            ("columns", self.columns.to_string()),
            ("style", self.style.clone()),
            ("show_grid", self.show_grid.to_string()),
        ]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub grid_size: Option<serde_json::Value>,
    #[serde(default)]
    pub dimensions: Option<serde_json::Value>,
    #[serde(default)]
    pub pixels_per_square: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl MapResult {
    /// One-line summary: grid, pixel size and scale.
    pub fn summary(&self) -> String {
        let show = |v: &Option<serde_json::Value>| v.as_ref().map(value_text).unwrap_or_else(|| "?".into());
        format!(
            "Grid: {} squares | Size: {} pixels | {}px per square",
            show(&self.grid_size),
            show(&self.dimensions),
            show(&self.pixels_per_square)
        )
    }
}

/// Render a loosely typed JSON scalar without quotes.
pub fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// Timestamps
// ============================================================================

/// Firestore serializes datetimes as `{seconds, nanos}`; other paths send ISO
/// strings. Anything unrecognised decodes to `None`.
fn server_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Firestore {
            #[serde(alias = "_seconds")]
            seconds: i64,
            #[serde(default, alias = "nanoseconds", alias = "_nanoseconds")]
            nanos: u32,
        },
        Text(String),
        Other(serde_json::Value),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Firestore { seconds, nanos }) => Utc.timestamp_opt(seconds, nanos).single(),
        Some(Raw::Text(text)) => parse_iso(&text),
        Some(Raw::Other(_)) | None => None,
    })
}

fn parse_iso(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            // Python's isoformat() omits the offset for naive UTC datetimes.
            chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lore_entry_firestore_timestamp() {
        let entry: LoreEntry = serde_json::from_value(json!({
            "id": "abc",
            "title": "Silverhaven",
            "category": "location",
            "content": "A city of libraries.",
            "created_at": { "seconds": 1_700_000_000, "nanos": 0 },
            "updated_at": "2024-01-02T03:04:05.123456"
        }))
        .unwrap();

        assert_eq!(entry.created_at.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(entry.updated_at.unwrap().to_rfc3339(), "2024-01-02T03:04:05.123456+00:00");
    }

    #[test]
    fn test_lore_entry_defaults() {
        let entry: LoreEntry = serde_json::from_value(json!({ "id": "x", "created_at": 12 })).unwrap();
        assert_eq!(entry.category, "general");
        assert!(entry.created_at.is_none());
        assert!(entry.updated_at.is_none());
    }

    #[test]
    fn test_character_params_send_level_not_cr() {
        let params = NpcGenerationParams {
            race: "Elf".into(),
            level: Some(5),
            cr: Some("3".into()),
            ..Default::default()
        };
        let query = params.query();
        assert!(query.contains(&("race", "Elf".to_string())));
        assert!(query.contains(&("character_class", "random".to_string())));
        assert!(query.contains(&("role", "neutral".to_string())));
        assert!(query.contains(&("level", "5".to_string())));
        assert!(!query.iter().any(|(k, _)| *k == "cr"));
    }

    #[test]
    fn test_creature_params_send_cr() {
        let params = NpcGenerationParams {
            npc_type: NpcType::Creature,
            level: Some(5),
            cr: Some("1/2".into()),
            faction_id: Some("f1".into()),
            ..Default::default()
        };
        let query = params.query();
        assert!(query.contains(&("npc_type", "creature".to_string())));
        assert!(query.contains(&("cr", "1/2".to_string())));
        assert!(query.contains(&("faction_id", "f1".to_string())));
        assert!(!query.iter().any(|(k, _)| *k == "level" || *k == "location_id"));
    }

    #[test]
    fn test_similarity_percent() {
        let passage = RulebookPassage {
            source: "PHB".into(),
            page_number: Some(json!(12)),
            text: String::new(),
            similarity: Some(0.8734),
        };
        assert_eq!(passage.similarity_percent().as_deref(), Some("87.3%"));
        assert_eq!(passage.page(), "12");
    }

    #[test]
    fn test_map_summary() {
        let result: MapResult = serde_json::from_value(json!({
            "success": true,
            "grid_size": "20x20",
            "dimensions": "1400x1400",
            "pixels_per_square": 70
        }))
        .unwrap();
        assert_eq!(
            result.summary(),
            "Grid: 20x20 squares | Size: 1400x1400 pixels | 70px per square"
        );
    }

    #[test]
    fn test_saved_npc_name() {
        let npc: SavedNpc = serde_json::from_value(json!({
            "id": "n1",
            "content": "**Name:** Grimble\nRace: Gnome"
        }))
        .unwrap();
        assert_eq!(npc.name(), "Grimble");
    }
}
