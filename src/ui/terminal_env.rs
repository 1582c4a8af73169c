use std::time::{Duration, Instant};

use crate::clipboard::{ClipboardAccess, ClipboardError, SystemClipboard};
use crate::env::Environment;
use crate::models::{Rect, Viewport};
use crate::parser::SectionSpan;
use crate::scheduler::{Scheduler, TimerId, TimerQueue};

/// Document units per text row, so pixel-style thresholds keep their scale.
pub const ROW_HEIGHT: f64 = 20.0;

/// Page-leaving requests the viewer carries out after an event is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Back,
    Open(String),
}

/// The environment of a document shown in the terminal: rows stand in for
/// pixels and the viewer's page stack for browser history.
pub struct TerminalEnv<C: ClipboardAccess = SystemClipboard<std::io::Stdout>> {
    href: String,
    history_depth: usize,
    scroll_row: usize,
    viewport_rows: usize,
    total_rows: usize,
    sections: Vec<SectionSpan>,
    timers: TimerQueue,
    due: Vec<TimerId>,
    started: Instant,
    clipboard: C,
    navigation: Option<Navigation>,
}

impl TerminalEnv {
    pub fn new(href: impl Into<String>) -> Self {
        Self::with_clipboard(href, SystemClipboard::new())
    }
}

impl<C: ClipboardAccess> TerminalEnv<C> {
    pub fn with_clipboard(href: impl Into<String>, clipboard: C) -> Self {
        Self {
            href: href.into(),
            history_depth: 0,
            scroll_row: 0,
            viewport_rows: 1,
            total_rows: 0,
            sections: Vec::new(),
            timers: TimerQueue::new(),
            due: Vec::new(),
            started: Instant::now(),
            clipboard,
            navigation: None,
        }
    }

    /// Swap in a new document layout and start at its top.
    pub fn load(&mut self, href: impl Into<String>, total_rows: usize, sections: Vec<SectionSpan>, history_depth: usize) {
        self.href = href.into();
        self.total_rows = total_rows;
        self.sections = sections;
        self.history_depth = history_depth;
        self.scroll_row = 0;
    }

    pub fn set_viewport_rows(&mut self, rows: usize) {
        self.viewport_rows = rows.max(1);
        self.scroll_row = self.scroll_row.min(self.max_scroll());
    }

    pub fn viewport_rows(&self) -> usize {
        self.viewport_rows
    }

    pub fn scroll_row(&self) -> usize {
        self.scroll_row
    }

    pub fn max_scroll(&self) -> usize {
        self.total_rows.saturating_sub(self.viewport_rows)
    }

    /// Move by `delta` rows; returns whether the position changed.
    pub fn scroll_by(&mut self, delta: isize) -> bool {
        let target = self.scroll_row.saturating_add_signed(delta).min(self.max_scroll());
        self.scroll_to_row(target)
    }

    pub fn scroll_to_row(&mut self, row: usize) -> bool {
        let row = row.min(self.max_scroll());
        let moved = row != self.scroll_row;
        self.scroll_row = row;
        moved
    }

    pub fn take_navigation(&mut self) -> Option<Navigation> {
        self.navigation.take()
    }

    fn sync_clock(&mut self) {
        let fired = self.timers.advance_to(self.started.elapsed());
        self.due.extend(fired);
    }

    /// Timers whose deadline has passed since the last call.
    pub fn take_due_timers(&mut self) -> Vec<TimerId> {
        self.sync_clock();
        std::mem::take(&mut self.due)
    }

    /// How long the event loop may sleep before a timer comes due.
    pub fn time_to_next_timer(&self) -> Option<Duration> {
        if !self.due.is_empty() {
            return Some(Duration::ZERO);
        }
        let next = self.timers.time_to_next()?;
        let drift = self.started.elapsed().saturating_sub(self.timers.now());
        Some(next.saturating_sub(drift))
    }
}

impl<C: ClipboardAccess> ClipboardAccess for TerminalEnv<C> {
    fn is_secure_context(&self) -> bool {
        self.clipboard.is_secure_context()
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.clipboard.write_text(text)
    }

    fn copy_via_selection(&mut self, text: &str) -> Result<bool, ClipboardError> {
        self.clipboard.copy_via_selection(text)
    }
}

impl<C: ClipboardAccess> Scheduler for TerminalEnv<C> {
    fn set_timeout(&mut self, delay: Duration) -> TimerId {
        self.sync_clock();
        self.timers.set_timeout(delay)
    }

    fn clear_timeout(&mut self, id: TimerId) {
        self.timers.clear_timeout(id);
        self.due.retain(|due| *due != id);
    }
}

impl<C: ClipboardAccess> Environment for TerminalEnv<C> {
    fn location(&self) -> String {
        self.href.clone()
    }

    fn replace_url(&mut self, url: &str) {
        self.href = url.to_string();
    }

    fn history_len(&self) -> usize {
        self.history_depth + 1
    }

    fn history_back(&mut self) {
        self.navigation = Some(Navigation::Back);
    }

    fn navigate(&mut self, url: &str) {
        self.navigation = Some(Navigation::Open(url.to_string()));
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_row as f64 * ROW_HEIGHT
    }

    fn scroll_to_top(&mut self) {
        self.scroll_row = 0;
    }

    fn scroll_into_view(&mut self, id: &str) -> bool {
        let Some(row) = self.sections.iter().find(|s| s.id == id).map(|s| s.row) else {
            return false;
        };
        self.scroll_to_row(row);
        true
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            scroll_y: self.scroll_y(),
            height: self.viewport_rows as f64 * ROW_HEIGHT,
        }
    }

    fn element_rect(&self, id: &str) -> Option<Rect> {
        self.sections
            .iter()
            .find(|s| s.id == id)
            .map(|s| Rect::new(s.row as f64 * ROW_HEIGHT, s.height as f64 * ROW_HEIGHT))
    }
}
