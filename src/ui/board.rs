use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::parser::TextStructure;

/// Document text viewport.
pub struct Board {
    text_structure: Option<TextStructure>,
    row: usize,
    active_section: Option<String>,
}

impl Board {
    pub fn new() -> Self {
        Self {
            text_structure: None,
            row: 0,
            active_section: None,
        }
    }

    pub fn with_text_structure(mut self, text_structure: TextStructure) -> Self {
        self.text_structure = Some(text_structure);
        self
    }

    pub fn update_text_structure(&mut self, text_structure: TextStructure) {
        self.text_structure = Some(text_structure);
        self.row = 0;
    }

    pub fn text_structure(&self) -> Option<&TextStructure> {
        self.text_structure.as_ref()
    }

    pub fn set_row(&mut self, row: usize) {
        self.row = row;
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn set_active_section(&mut self, id: Option<&str>) {
        self.active_section = id.map(str::to_string);
    }

    pub fn total_lines(&self) -> usize {
        self.text_structure
            .as_ref()
            .map(|ts| ts.text_lines.len())
            .unwrap_or(0)
    }

    pub fn get_line(&self, line: usize) -> Option<&str> {
        self.text_structure
            .as_ref()
            .and_then(|ts| ts.text_lines.get(line).map(String::as_str))
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, title: &str) {
        let block = Block::default().borders(Borders::ALL).title(title.to_string());
        let inner_area = block.inner(area);
        frame.render_widget(block, area);

        match self.text_structure {
            Some(ref text_structure) => self.render_content(frame, inner_area, text_structure),
            None => self.render_empty(frame, inner_area),
        }
    }

    fn render_content(&self, frame: &mut Frame, area: Rect, text_structure: &TextStructure) {
        let height = area.height as usize;
        let start_line = self.row.min(text_structure.text_lines.len());
        let end_line = (start_line + height).min(text_structure.text_lines.len());

        let active_rows = self
            .active_section
            .as_deref()
            .and_then(|id| text_structure.section(id))
            .map(|s| s.row..s.row + s.height);

        let visible_lines: Vec<Line> = text_structure.text_lines[start_line..end_line]
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let row = start_line + i;
                let style = if active_rows.as_ref().is_some_and(|rows| rows.contains(&row)) {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else if text_structure.is_heading_row(row) {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(line.clone(), style))
            })
            .collect();

        frame.render_widget(Paragraph::new(visible_lines), area);
    }

    fn render_empty(&self, frame: &mut Frame, area: Rect) {
        let paragraph = Paragraph::new(vec![Line::from("No content")])
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC));
        frame.render_widget(paragraph, area);
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
