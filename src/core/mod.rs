pub mod api;
pub mod docs;
pub mod logging;
pub mod npc;
