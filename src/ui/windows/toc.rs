use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use crate::models::{HeadingLevel, NavLink};

/// Sidebar listing the generated links. The active link follows the reader;
/// the selection follows the keyboard while the sidebar has focus.
pub struct TocWindow {
    pub visible: bool,
    pub focused: bool,
    pub selected_index: usize,
}

impl TocWindow {
    pub fn new(visible: bool) -> Self {
        Self {
            visible,
            focused: false,
            selected_index: 0,
        }
    }

    pub fn toggle_focus(&mut self, active_index: Option<usize>) {
        self.focused = !self.focused;
        if self.focused {
            self.visible = true;
            self.selected_index = active_index.unwrap_or(self.selected_index);
        }
    }

    pub fn next_entry(&mut self, len: usize) {
        if len > 0 {
            self.selected_index = (self.selected_index + 1).min(len - 1);
        }
    }

    pub fn previous_entry(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, links: &[NavLink]) {
        if !self.visible {
            return;
        }

        let border_style = if self.focused {
            Style::default().fg(Color::Blue)
        } else {
            Style::default()
        };
        let block = Block::default()
            .title("Contents")
            .borders(Borders::ALL)
            .border_style(border_style);

        if links.is_empty() {
            let paragraph = Paragraph::new(vec![Line::from("No sections")])
                .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
                .block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = links
            .iter()
            .enumerate()
            .map(|(i, link)| {
                let style = if self.focused && i == self.selected_index {
                    Style::default().bg(Color::Blue).fg(Color::White)
                } else if link.active {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                let indent = match link.level {
                    HeadingLevel::H2 => "",
                    HeadingLevel::H3 => "  ",
                };
                let badge = Span::styled(
                    format!("{}{} ", indent, link.level.badge()),
                    Style::default().fg(Color::DarkGray),
                );
                ListItem::new(Line::from(vec![badge, Span::raw(link.label.clone())])).style(style)
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_jumps_to_active() {
        let mut toc = TocWindow::new(false);
        toc.toggle_focus(Some(3));
        assert!(toc.visible);
        assert!(toc.focused);
        assert_eq!(toc.selected_index, 3);

        toc.toggle_focus(None);
        assert!(!toc.focused);
    }

    #[test]
    fn test_selection_is_bounded() {
        let mut toc = TocWindow::new(true);
        toc.next_entry(2);
        toc.next_entry(2);
        assert_eq!(toc.selected_index, 1);
        toc.previous_entry();
        toc.previous_entry();
        assert_eq!(toc.selected_index, 0);
    }
}
