use crate::error::{Error, Result};

/// Destination for copied text.
pub trait Clipboard {
    /// Replaces the clipboard contents with `text`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Clipboard`] if the write fails.
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The operating system clipboard.
///
/// On Linux the copied text lives only as long as its owner. A process that
/// exits right after copying should use [`SystemClipboard::handoff`], which
/// blocks until a clipboard manager or another application takes the
/// contents over.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard {
    wait_for_handoff: bool,
}

impl SystemClipboard {
    /// Clipboard that returns as soon as the text is set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            wait_for_handoff: false,
        }
    }

    /// Clipboard that keeps ownership until the contents are taken over.
    ///
    /// Has no effect outside Linux.
    #[must_use]
    pub const fn handoff() -> Self {
        Self {
            wait_for_handoff: true,
        }
    }

    /// Returns true if setting text blocks until ownership moves on.
    #[must_use]
    pub const fn waits_for_handoff(&self) -> bool {
        self.wait_for_handoff
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| Error::clipboard(e.to_string()))?;

        #[cfg(target_os = "linux")]
        if self.wait_for_handoff {
            use arboard::SetExtLinux;

            tracing::info!("Holding the clipboard until another application takes it over");
            return clipboard
                .set()
                .wait()
                .text(text.to_string())
                .map_err(|e| Error::clipboard(e.to_string()));
        }

        clipboard
            .set_text(text.to_string())
            .map_err(|e| Error::clipboard(e.to_string()))
    }
}
