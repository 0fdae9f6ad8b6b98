/// DM Assistant - terminal client for an AI-assisted Dungeon Master backend.
///
/// Core library providing NPC text extraction, Google Docs export,
/// the backend HTTP client, and the tabbed terminal UI.

pub mod config;
pub mod core;
pub mod tui;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
