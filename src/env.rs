//! The page's surroundings as an injected capability: address bar, history,
//! viewport geometry, clipboard and timers.

pub mod mock;

use crate::clipboard::ClipboardAccess;
use crate::models::{Rect, Viewport};
use crate::scheduler::Scheduler;

pub trait Environment: ClipboardAccess + Scheduler {
    /// Full current URL, fragment included.
    fn location(&self) -> String;

    /// Swap the current URL without adding a history entry.
    fn replace_url(&mut self, url: &str);

    fn history_len(&self) -> usize;

    fn history_back(&mut self);

    /// Leave the page for `url`.
    fn navigate(&mut self, url: &str);

    /// Vertical scroll offset, in the same units as [`Viewport`].
    fn scroll_y(&self) -> f64;

    /// Smooth scroll to the top of the page.
    fn scroll_to_top(&mut self);

    /// Smooth scroll so the element with `id` starts at the top. Returns
    /// false when no such element exists.
    fn scroll_into_view(&mut self, id: &str) -> bool;

    fn viewport(&self) -> Viewport;

    /// Document-space box of the element with `id`.
    fn element_rect(&self, id: &str) -> Option<Rect>;
}
