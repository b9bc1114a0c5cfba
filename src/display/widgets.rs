//! Widgets for the terminal surface
//!
//! The layout mirrors a tray menu: the compact indicator on top, the three
//! window lines below with a checkmark on the selected one, and a key hint
//! line at the bottom.

use super::{MenuItem, MenuView, ERROR_TITLE, NOT_LOGGED_IN_TITLE};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

const CHECKMARK: &str = "✓ ";
const UNCHECKED: &str = "  ";

/// Style constants for consistent theming
pub struct AppTheme {
    pub primary: Style,
    pub secondary: Style,
    pub selected: Style,
    pub error: Style,
    pub muted: Style,
}

impl Default for AppTheme {
    fn default() -> Self {
        Self {
            primary: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            secondary: Style::default().fg(Color::Cyan),
            selected: Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            error: Style::default().fg(Color::Red),
            muted: Style::default().fg(Color::DarkGray),
        }
    }
}

/// The compact indicator, as a tray would show it
pub struct IndicatorWidget<'a> {
    title: &'a str,
    theme: &'a AppTheme,
}

impl<'a> IndicatorWidget<'a> {
    pub fn new(title: &'a str, theme: &'a AppTheme) -> Self {
        Self { title, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Claude Monitor Lite")
            .title_style(self.theme.primary)
            .borders(Borders::ALL)
            .border_style(self.theme.secondary);

        let style = if self.title == ERROR_TITLE || self.title == NOT_LOGGED_IN_TITLE {
            self.theme.error
        } else {
            self.theme.primary
        };

        let paragraph = Paragraph::new(self.title)
            .style(style)
            .alignment(Alignment::Center)
            .block(block);

        frame.render_widget(paragraph, area);
    }
}

/// The per-window lines with the selection checkmark
pub struct MenuWidget<'a> {
    items: &'a [MenuItem],
    disabled: bool,
    theme: &'a AppTheme,
}

impl<'a> MenuWidget<'a> {
    pub fn new(items: &'a [MenuItem], disabled: bool, theme: &'a AppTheme) -> Self {
        Self {
            items,
            disabled,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Usage")
            .title_style(self.theme.primary)
            .borders(Borders::ALL)
            .border_style(self.theme.secondary);

        let items: Vec<ListItem> = self
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let (marker, style) = if item.checked {
                    (CHECKMARK, self.theme.selected)
                } else if self.disabled {
                    (UNCHECKED, self.theme.muted)
                } else {
                    (UNCHECKED, Style::default())
                };

                let key = if self.disabled {
                    "   ".to_string()
                } else {
                    format!("{}. ", index + 1)
                };

                ListItem::new(Line::from(vec![
                    Span::styled(key, self.theme.muted),
                    Span::styled(marker, style),
                    Span::styled(item.label.as_str(), style),
                ]))
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }
}

/// Key hints at the bottom of the screen
pub struct KeyHintWidget<'a> {
    disabled: bool,
    theme: &'a AppTheme,
}

impl<'a> KeyHintWidget<'a> {
    pub fn new(disabled: bool, theme: &'a AppTheme) -> Self {
        Self { disabled, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let hint = if self.disabled {
            "q quit"
        } else {
            "1-3 select indicator | r refresh | q quit"
        };
        let paragraph = Paragraph::new(hint)
            .style(self.theme.muted)
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }
}

/// Create a layout for the main display
pub fn create_main_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Indicator
            Constraint::Length(5), // Window lines
            Constraint::Min(0),
            Constraint::Length(1), // Key hints
        ])
        .split(area)
        .to_vec()
}

/// Render a complete menu view
pub fn render_menu_view(frame: &mut Frame, view: &MenuView, area: Rect, theme: &AppTheme) {
    let chunks = create_main_layout(area);

    IndicatorWidget::new(&view.title, theme).render(frame, chunks[0]);
    MenuWidget::new(&view.items, view.disabled, theme).render(frame, chunks[1]);
    KeyHintWidget::new(view.disabled, theme).render(frame, chunks[3]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DisplayMode;
    use ratatui::{backend::TestBackend, Terminal};

    fn rendered_text(view: &MenuView) -> String {
        let mut terminal = Terminal::new(TestBackend::new(70, 12)).unwrap();
        let theme = AppTheme::default();
        terminal
            .draw(|frame| render_menu_view(frame, view, frame.area(), &theme))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_main_layout_constraints() {
        let area = Rect::new(0, 0, 80, 24);
        let layout = create_main_layout(area);

        assert_eq!(layout.len(), 4);
        assert_eq!(layout[0].height, 3);
        assert_eq!(layout[1].height, 5);
        assert_eq!(layout[3].height, 1);
    }

    #[test]
    fn test_renders_items_and_checkmark() {
        let view = MenuView::loading(DisplayMode::WeeklyAll);
        let text = rendered_text(&view);

        assert!(text.contains("Loading..."));
        assert!(text.contains("1.   5-Hour Session: --"));
        assert!(text.contains("2. ✓ Weekly (All): --"));
        assert!(text.contains("3.   Weekly (Opus): --"));
        assert!(text.contains("r refresh"));
    }

    #[test]
    fn test_disabled_view_hides_selection_keys() {
        let text = rendered_text(&MenuView::not_logged_in());

        assert!(text.contains("Not logged in"));
        assert!(text.contains("Please login first"));
        assert!(!text.contains("1. "));
        assert!(text.contains("q quit"));
    }
}
