//! Root layout computation for tab bar + main content + status bar.

use ratatui::layout::{Constraint, Layout, Rect};

/// Height of the tab bar, borders included.
pub const TAB_BAR_HEIGHT: u16 = 3;
/// Below this height the tab bar is dropped and the status bar shows the tab.
pub const HIDE_TABS_THRESHOLD: u16 = 10;

/// Computed layout regions for a single frame.
pub struct AppLayout {
    /// Tab bar area (None if the terminal is too short).
    pub tabs: Option<Rect>,
    /// Main content area.
    pub main: Rect,
    /// Status bar (bottom row).
    pub status: Rect,
}

impl AppLayout {
    pub fn compute(area: Rect) -> Self {
        if area.height < HIDE_TABS_THRESHOLD {
            let rows = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);
            return AppLayout {
                tabs: None,
                main: rows[0],
                status: rows[1],
            };
        }

        let rows = Layout::vertical([
            Constraint::Length(TAB_BAR_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

        AppLayout {
            tabs: Some(rows[0]),
            main: rows[1],
            status: rows[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_layout() {
        let area = Rect::new(0, 0, 120, 40);
        let layout = AppLayout::compute(area);
        assert_eq!(layout.tabs.unwrap().height, TAB_BAR_HEIGHT);
        assert_eq!(layout.status.height, 1);
        assert_eq!(layout.main.height, 40 - TAB_BAR_HEIGHT - 1);
    }

    #[test]
    fn test_short_terminal_drops_tabs() {
        let area = Rect::new(0, 0, 80, 8);
        let layout = AppLayout::compute(area);
        assert!(layout.tabs.is_none());
        assert_eq!(layout.main.height, 7);
    }

    #[test]
    fn test_regions_fill_height() {
        let area = Rect::new(0, 0, 100, 30);
        let layout = AppLayout::compute(area);
        let tabs_h = layout.tabs.map(|t| t.height).unwrap_or(0);
        assert_eq!(tabs_h + layout.main.height + layout.status.height, area.height);
    }
}
