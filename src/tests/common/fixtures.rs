//! Test Fixtures
//!
//! A complete NPC write-up in the shape the generator produces, with every
//! template field present.

use crate::core::npc::NpcDraft;

// =============================================================================
// NPC Text Fixtures
// =============================================================================

pub const SAMPLE_NPC_TEXT: &str = "\
# Elara Meadowbrook

**NPC Name:** Elara Meadowbrook
**Race:** High Elf
**Class:** Wizard (School of Abjuration)
**Alignment:** Lawful Good
**Level:** 5

**World Placement:** Keeper of the Silverwood archive in the river town of Brindle.

**Physical Description:** Tall and willowy, with silver hair braided down her back.

**Voice Suggestions:** Soft and precise, with a faint lilt.

**Personality Traits:**
*   **Intellectually Curious:** Driven by an insatiable thirst for knowledge.
*   **Methodical and Prudent:** Approaches problems with careful consideration.

**Background:** Raised among the archivists of Silverwood, Elara left to study warding magic.

**Stat Block**
**STR:** 8 **DEX:** 14 **CON:** 12 **INT:** 16 **WIS:** 13 **CHA:** 10

**Saving Throws:** Int +6, Wis +4
**Skills:** Arcana +6, History +6
**Senses:** Passive Perception 11
**Languages:** Common, Elvish, Draconic, Sylvan

**Abilities:**
*   **Fey Ancestry:** Elara has advantage on saving throws.

**Actions:**
*   **Dagger:** Melee Weapon Attack: +5 to hit.
*   **Fire Bolt:** Ranged Spell Attack: +6 to hit.
";

/// A draft holding [`SAMPLE_NPC_TEXT`], as returned by the generator.
pub fn sample_draft() -> NpcDraft {
    NpcDraft {
        race: "elf".to_string(),
        class: "wizard".to_string(),
        alignment: "lawful good".to_string(),
        ..NpcDraft::new(SAMPLE_NPC_TEXT)
    }
}
