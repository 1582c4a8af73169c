use ratatui::{
    Frame,
    layout::Rect,
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::settings::CfgDefaultKeymaps;

pub struct HelpWindow;

impl HelpWindow {
    pub fn lines(keys: &CfgDefaultKeymaps) -> Vec<String> {
        let row = |key: &str, extra: &str, what: &str| {
            let label = if extra.is_empty() {
                key.to_string()
            } else {
                format!("{} / {}", key, extra)
            };
            format!("   {:<18}{}", label, what)
        };
        vec![
            " Reading:".to_string(),
            row(&keys.scroll_up, "Up", "Line Up"),
            row(&keys.scroll_down, "Down", "Line Down"),
            row(&keys.page_up, "", "Page Up"),
            row(&keys.page_down, "Space", "Page Down"),
            row(&keys.back_to_top, "Home", "Back To Top"),
            row(&keys.end, "End", "End Of Document"),
            String::new(),
            " Sections:".to_string(),
            row(&keys.table_of_contents, "Tab", "Focus Contents"),
            row(&keys.follow, "", "Go To Section"),
            row(&keys.copy_section_link, "", "Copy Section Link"),
            row(&keys.copy_page_link, "", "Copy Page Link"),
            row(&keys.back, "", "Back"),
            String::new(),
            row(&keys.help, "", "Help"),
            row(&keys.quit, "Esc", "Quit / Close Window"),
        ]
    }

    pub fn render(frame: &mut Frame, area: Rect, keys: &CfgDefaultKeymaps, scroll_offset: u16) {
        let help_content: Vec<Line> = Self::lines(keys).into_iter().map(Line::from).collect();

        let max_width = help_content.iter().map(|l| l.width()).max().unwrap_or(0) as u16;
        let width = (max_width + 4).min(area.width);
        let height = (help_content.len() as u16 + 2).min(area.height);
        let popup_area = super::centered_area(area, width, height);

        frame.render_widget(Clear, popup_area);
        let help_paragraph = Paragraph::new(help_content)
            .block(Block::default().title("Help").borders(Borders::ALL))
            .scroll((scroll_offset, 0));
        frame.render_widget(help_paragraph, popup_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_follows_keymap() {
        let mut keys = CfgDefaultKeymaps::default();
        keys.copy_section_link = "c".to_string();
        let lines = HelpWindow::lines(&keys);
        assert!(lines.iter().any(|l| l.contains("c") && l.ends_with("Copy Section Link")));
        assert!(lines.iter().any(|l| l.contains("j / Down")));
    }
}
