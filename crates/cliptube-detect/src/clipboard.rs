use thiserror::Error;

/// Errors from clipboard access.
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(#[from] arboard::Error),
}

/// A clipboard that exposes a change counter.
///
/// The counter increases every time the clipboard contents change; watchers
/// compare counters instead of diffing contents.
pub trait ClipboardSource: Send + 'static {
    fn change_count(&mut self) -> u64;

    /// Current text contents, or `None` if the clipboard holds no text.
    fn text(&mut self) -> Option<String>;

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// System clipboard backed by `arboard`.
///
/// arboard has no native change counter, so one is derived: it is bumped
/// whenever the text read during a poll differs from the previous poll.
/// A fresh `arboard::Clipboard` is opened per access, which keeps this type
/// `Send` on every platform.
#[derive(Debug, Default)]
pub struct SystemClipboard {
    last_text: Option<String>,
    count: u64,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the clipboard text once, without touching the change counter.
    pub fn read_text() -> Result<Option<String>, ClipboardError> {
        let mut clipboard = arboard::Clipboard::new()?;
        match clipboard.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn poll(&mut self) {
        let text = match Self::read_text() {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read clipboard");
                return;
            }
        };
        if text != self.last_text {
            self.last_text = text;
            self.count += 1;
        }
    }
}

impl ClipboardSource for SystemClipboard {
    fn change_count(&mut self) -> u64 {
        self.poll();
        self.count
    }

    fn text(&mut self) -> Option<String> {
        match Self::read_text() {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read clipboard");
                None
            }
        }
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard = arboard::Clipboard::new()?;
        clipboard.set_text(text.to_string())?;
        Ok(())
    }
}

impl<S: ClipboardSource + ?Sized> ClipboardSource for Box<S> {
    fn change_count(&mut self) -> u64 {
        (**self).change_count()
    }

    fn text(&mut self) -> Option<String> {
        (**self).text()
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        (**self).set_text(text)
    }
}
