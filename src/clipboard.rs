use std::io::{self, Write};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use thiserror::Error;

use crate::logging;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard is not available")]
    Unavailable,
    #[error("clipboard write rejected: {0}")]
    Rejected(String),
    #[error("copy failed: {0}")]
    Io(#[from] io::Error),
}

/// The two ways of reaching the clipboard.
pub trait ClipboardAccess {
    /// Whether the asynchronous, permission-gated clipboard API may be used.
    fn is_secure_context(&self) -> bool;

    /// Primary path: the platform clipboard API.
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;

    /// Fallback path: copy through a transient, hidden selection. Returns
    /// whether the platform reported the copy as done.
    fn copy_via_selection(&mut self, text: &str) -> Result<bool, ClipboardError>;
}

/// Copy `text`, falling back to the selection path when the primary path is
/// unavailable or fails. False only when both paths fail.
pub fn copy_text<C>(clipboard: &mut C, text: &str) -> bool
where
    C: ClipboardAccess + ?Sized,
{
    if clipboard.is_secure_context() {
        match clipboard.write_text(text) {
            Ok(()) => return true,
            Err(err) => logging::debug(format!("clipboard write failed, trying selection copy: {}", err)),
        }
    }

    match clipboard.copy_via_selection(text) {
        Ok(copied) => copied,
        Err(err) => {
            logging::warn(format!("selection copy failed: {}", err));
            false
        }
    }
}

/// OSC 52 escape sequence asking the terminal to put `text` on the clipboard.
pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", BASE64.encode(text.as_bytes()))
}

/// Native clipboard through `arboard`, with the terminal's OSC 52 support as
/// the selection fallback.
pub struct SystemClipboard<W: Write> {
    native: Option<arboard::Clipboard>,
    terminal: W,
}

impl SystemClipboard<io::Stdout> {
    pub fn new() -> Self {
        let native = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(err) => {
                logging::warn(format!("native clipboard unavailable: {}", err));
                None
            }
        };
        Self::with_writer(native, io::stdout())
    }
}

impl<W: Write> SystemClipboard<W> {
    pub fn with_writer(native: Option<arboard::Clipboard>, terminal: W) -> Self {
        Self { native, terminal }
    }
}

impl<W: Write> ClipboardAccess for SystemClipboard<W> {
    fn is_secure_context(&self) -> bool {
        self.native.is_some()
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let clipboard = self.native.as_mut().ok_or(ClipboardError::Unavailable)?;
        clipboard
            .set_text(text.to_string())
            .map_err(|err| ClipboardError::Rejected(err.to_string()))
    }

    fn copy_via_selection(&mut self, text: &str) -> Result<bool, ClipboardError> {
        self.terminal.write_all(osc52_sequence(text).as_bytes())?;
        self.terminal.flush()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted {
        secure: bool,
        primary: Result<(), ()>,
        fallback: Result<bool, ()>,
        primary_calls: usize,
        fallback_calls: usize,
    }

    impl Scripted {
        fn new(secure: bool, primary: Result<(), ()>, fallback: Result<bool, ()>) -> Self {
            Self {
                secure,
                primary,
                fallback,
                primary_calls: 0,
                fallback_calls: 0,
            }
        }
    }

    impl ClipboardAccess for Scripted {
        fn is_secure_context(&self) -> bool {
            self.secure
        }

        fn write_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
            self.primary_calls += 1;
            self.primary
                .map_err(|_| ClipboardError::Rejected("permission denied".to_string()))
        }

        fn copy_via_selection(&mut self, _text: &str) -> Result<bool, ClipboardError> {
            self.fallback_calls += 1;
            self.fallback.map_err(|_| ClipboardError::Unavailable)
        }
    }

    #[test]
    fn test_primary_success_skips_fallback() {
        let mut clipboard = Scripted::new(true, Ok(()), Ok(false));
        assert!(copy_text(&mut clipboard, "x"));
        assert_eq!(clipboard.fallback_calls, 0);
    }

    #[test]
    fn test_rejected_primary_falls_back() {
        let mut clipboard = Scripted::new(true, Err(()), Ok(true));
        assert!(copy_text(&mut clipboard, "x"));
        assert_eq!(clipboard.primary_calls, 1);
        assert_eq!(clipboard.fallback_calls, 1);
    }

    #[test]
    fn test_insecure_context_goes_straight_to_fallback() {
        let mut clipboard = Scripted::new(false, Ok(()), Ok(true));
        assert!(copy_text(&mut clipboard, "x"));
        assert_eq!(clipboard.primary_calls, 0);
    }

    #[test]
    fn test_both_paths_failing_returns_false() {
        let mut clipboard = Scripted::new(true, Err(()), Err(()));
        assert!(!copy_text(&mut clipboard, "x"));

        let mut clipboard = Scripted::new(true, Err(()), Ok(false));
        assert!(!copy_text(&mut clipboard, "x"));
    }

    #[test]
    fn test_osc52_sequence() {
        assert_eq!(osc52_sequence("hi"), "\x1b]52;c;aGk=\x07");
    }

    #[test]
    fn test_terminal_fallback_writes_sequence() {
        let mut clipboard = SystemClipboard::with_writer(None, Vec::new());
        assert!(!clipboard.is_secure_context());
        assert!(copy_text(&mut clipboard, "https://example.com/#intro"));
        let written = String::from_utf8(clipboard.terminal.clone()).unwrap();
        assert!(written.starts_with("\x1b]52;c;"));
        assert!(written.ends_with('\x07'));
    }
}
