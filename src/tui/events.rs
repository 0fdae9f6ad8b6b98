use std::fmt;
use std::str::FromStr;

/// Events flowing through the Elm-architecture event loop.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Periodic tick for notification TTLs and async polling.
    Tick,
    /// Raw terminal input (keyboard/mouse).
    Input(crossterm::event::Event),
    /// A resolved action to execute.
    Action(Action),
    /// Notification to display to the user.
    Notification(Notification),
    /// Request to quit the application.
    Quit,
}

/// High-level actions dispatched by the input mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Focus(Focus),
    TabNext,
    TabPrev,
    ShowHelp,
    CloseHelp,
    Quit,
}

/// Which tab is visible. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Focus {
    #[default]
    Chat,
    Npcs,
    Lore,
    Rulebooks,
    Maps,
}

impl Focus {
    pub const ALL: [Focus; 5] = [
        Focus::Chat,
        Focus::Npcs,
        Focus::Lore,
        Focus::Rulebooks,
        Focus::Maps,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Focus::Chat => "Chat",
            Focus::Npcs => "NPCs",
            Focus::Lore => "Lore",
            Focus::Rulebooks => "Rulebooks",
            Focus::Maps => "Maps",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Focus::Chat => "💬",
            Focus::Npcs => "🎭",
            Focus::Lore => "📜",
            Focus::Rulebooks => "📚",
            Focus::Maps => "🗺",
        }
    }

    /// 1-based position, shown in the tab bar and used by number keys.
    pub fn number(self) -> usize {
        self.index() + 1
    }

    pub fn index(self) -> usize {
        Focus::ALL.iter().position(|&f| f == self).unwrap_or(0)
    }

    pub fn from_number(n: usize) -> Option<Focus> {
        n.checked_sub(1).and_then(|i| Focus::ALL.get(i).copied())
    }

    pub fn next(self) -> Focus {
        Focus::ALL[(self.index() + 1) % Focus::ALL.len()]
    }

    pub fn prev(self) -> Focus {
        Focus::ALL[(self.index() + Focus::ALL.len() - 1) % Focus::ALL.len()]
    }
}

impl fmt::Display for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Focus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat" => Ok(Focus::Chat),
            "npc" | "npcs" => Ok(Focus::Npcs),
            "lore" => Ok(Focus::Lore),
            "rules" | "rulebook" | "rulebooks" => Ok(Focus::Rulebooks),
            "map" | "maps" => Ok(Focus::Maps),
            other => Err(format!(
                "unknown tab '{other}' (expected chat, npcs, lore, rulebooks or maps)"
            )),
        }
    }
}

/// Notification level for the overlay system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A timed notification shown in the overlay.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub level: NotificationLevel,
    /// Ticks remaining before auto-dismiss.
    pub ttl_ticks: u32,
}

impl Notification {
    /// A notification whose id is assigned by `AppState` on arrival.
    pub fn new(message: impl Into<String>, level: NotificationLevel) -> Self {
        Self {
            id: 0,
            message: message.into(),
            level,
            ttl_ticks: 100,
        }
    }
}
