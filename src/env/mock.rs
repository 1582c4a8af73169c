use std::collections::HashMap;
use std::time::Duration;

use crate::clipboard::{ClipboardAccess, ClipboardError};
use crate::env::Environment;
use crate::models::{Rect, Viewport};
use crate::scheduler::{Scheduler, TimerId, TimerQueue};

/// How a scripted clipboard path behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    Succeed,
    /// The path ran but reported failure.
    Fail,
    /// The path raised an error.
    Error,
}

/// In-memory environment that records every side effect.
#[derive(Debug, Clone)]
pub struct MockEnvironment {
    pub href: String,
    pub replaced_urls: Vec<String>,
    pub history_len: usize,
    pub back_calls: usize,
    pub navigations: Vec<String>,
    pub scroll_y: f64,
    pub viewport_height: f64,
    pub top_scrolls: usize,
    pub scrolled_to: Vec<String>,
    pub elements: HashMap<String, Rect>,
    pub secure_context: bool,
    pub primary: Outcome,
    pub fallback: Outcome,
    pub primary_writes: Vec<String>,
    pub selection_copies: Vec<String>,
    pub clipboard: Option<String>,
    pub timers: TimerQueue,
}

impl MockEnvironment {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            replaced_urls: Vec::new(),
            history_len: 1,
            back_calls: 0,
            navigations: Vec::new(),
            scroll_y: 0.0,
            viewport_height: 1000.0,
            top_scrolls: 0,
            scrolled_to: Vec::new(),
            elements: HashMap::new(),
            secure_context: true,
            primary: Outcome::Succeed,
            fallback: Outcome::Succeed,
            primary_writes: Vec::new(),
            selection_copies: Vec::new(),
            clipboard: None,
            timers: TimerQueue::new(),
        }
    }

    pub fn with_element(mut self, id: impl Into<String>, rect: Rect) -> Self {
        self.elements.insert(id.into(), rect);
        self
    }

    pub fn with_clipboard(mut self, secure_context: bool, primary: Outcome, fallback: Outcome) -> Self {
        self.secure_context = secure_context;
        self.primary = primary;
        self.fallback = fallback;
        self
    }

    /// Move the clock forward and return the timers that came due.
    pub fn advance(&mut self, ms: u64) -> Vec<TimerId> {
        self.timers.advance_by(Duration::from_millis(ms))
    }
}

impl ClipboardAccess for MockEnvironment {
    fn is_secure_context(&self) -> bool {
        self.secure_context
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.primary_writes.push(text.to_string());
        match self.primary {
            Outcome::Succeed => {
                self.clipboard = Some(text.to_string());
                Ok(())
            }
            Outcome::Fail | Outcome::Error => Err(ClipboardError::Rejected("NotAllowedError".to_string())),
        }
    }

    fn copy_via_selection(&mut self, text: &str) -> Result<bool, ClipboardError> {
        self.selection_copies.push(text.to_string());
        match self.fallback {
            Outcome::Succeed => {
                self.clipboard = Some(text.to_string());
                Ok(true)
            }
            Outcome::Fail => Ok(false),
            Outcome::Error => Err(ClipboardError::Unavailable),
        }
    }
}

impl Scheduler for MockEnvironment {
    fn set_timeout(&mut self, delay: Duration) -> TimerId {
        self.timers.set_timeout(delay)
    }

    fn clear_timeout(&mut self, id: TimerId) {
        self.timers.clear_timeout(id);
    }
}

impl Environment for MockEnvironment {
    fn location(&self) -> String {
        self.href.clone()
    }

    fn replace_url(&mut self, url: &str) {
        self.href = url.to_string();
        self.replaced_urls.push(url.to_string());
    }

    fn history_len(&self) -> usize {
        self.history_len
    }

    fn history_back(&mut self) {
        self.back_calls += 1;
    }

    fn navigate(&mut self, url: &str) {
        self.navigations.push(url.to_string());
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn scroll_to_top(&mut self) {
        self.top_scrolls += 1;
        self.scroll_y = 0.0;
    }

    fn scroll_into_view(&mut self, id: &str) -> bool {
        let Some(rect) = self.elements.get(id) else {
            return false;
        };
        self.scroll_y = rect.top;
        self.scrolled_to.push(id.to_string());
        true
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            scroll_y: self.scroll_y,
            height: self.viewport_height,
        }
    }

    fn element_rect(&self, id: &str) -> Option<Rect> {
        self.elements.get(id).copied()
    }
}
