use std::time::Duration;

use crate::scheduler::{Scheduler, TimerId};

pub const DEFAULT_TOAST_MS: u64 = 1400;
pub const MIN_TOAST_MS: u64 = 600;
pub const MAX_TOAST_MS: u64 = 4000;

/// `lo` when `n < lo`, `hi` when `n > hi`, otherwise `n`.
///
/// Unlike `Ord::clamp` this does not panic when `lo > hi`; `lo` wins.
pub fn clamp<T: PartialOrd>(n: T, lo: T, hi: T) -> T {
    let upper = if n > hi { hi } else { n };
    if upper < lo { lo } else { upper }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastKind {
    #[default]
    Info,
    Error,
}

/// Transient status message with a single auto-hide timer.
#[derive(Debug, Clone, Default)]
pub struct Toast {
    message: String,
    kind: ToastKind,
    visible: bool,
    timer: Option<TimerId>,
    default_ms: Option<u64>,
}

impl Toast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `ms` instead of [`DEFAULT_TOAST_MS`] when a caller passes no duration.
    pub fn with_default_duration(mut self, ms: u64) -> Self {
        self.default_ms = Some(ms);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> ToastKind {
        self.kind
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn pending_timer(&self) -> Option<TimerId> {
        self.timer
    }

    /// Show `message`, replacing whatever is displayed, and restart the
    /// auto-hide timer. A missing or zero duration uses the default.
    pub fn show<S>(&mut self, scheduler: &mut S, message: impl Into<String>, kind: ToastKind, duration_ms: Option<u64>)
    where
        S: Scheduler + ?Sized,
    {
        self.message = message.into();
        self.kind = kind;
        self.visible = true;

        if let Some(previous) = self.timer.take() {
            scheduler.clear_timeout(previous);
        }
        let requested = duration_ms
            .filter(|ms| *ms > 0)
            .unwrap_or(self.default_ms.unwrap_or(DEFAULT_TOAST_MS));
        let ms = clamp(requested, MIN_TOAST_MS, MAX_TOAST_MS);
        self.timer = Some(scheduler.set_timeout(Duration::from_millis(ms)));
    }

    /// Handle a fired timer. Returns true if it was this toast's live timer;
    /// superseded timers are ignored.
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        if self.timer != Some(id) {
            return false;
        }
        self.timer = None;
        self.visible = false;
        true
    }

    pub fn dismiss<S>(&mut self, scheduler: &mut S)
    where
        S: Scheduler + ?Sized,
    {
        if let Some(timer) = self.timer.take() {
            scheduler.clear_timeout(timer);
        }
        self.visible = false;
    }
}
