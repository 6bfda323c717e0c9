use anyhow::{anyhow, Result};

/// Write-only access to a clipboard.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The system clipboard.
///
/// The handle is created on first use and kept alive afterwards: on X11 and
/// Wayland the copied text is only served while the owning handle exists.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        if self.inner.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|e| anyhow!("clipboard unavailable: {}", e))?;
            self.inner = Some(clipboard);
        }
        let clipboard = self
            .inner
            .as_mut()
            .ok_or_else(|| anyhow!("clipboard unavailable"))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| anyhow!("{}", e))
    }
}
