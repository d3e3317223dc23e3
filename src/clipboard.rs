//! Clipboard capability
//!
//! A system clipboard tool is used when one is installed; otherwise the
//! text is printed framed on its own line so it can be selected and copied
//! by hand. Failures of the system tool fall through to the same printout.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ClipboardError;

/// Something that can take text for the user to paste elsewhere
#[async_trait]
pub trait Clipboard: Send + Sync {
    fn name(&self) -> &'static str;

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Known clipboard tools, tried in order
const TOOLS: [(&str, &[&str]); 5] = [
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("pbcopy", &[]),
    ("clip", &[]),
];

/// Pipes text into a system clipboard tool
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    pub fn new<S: Into<String>>(program: S, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }

    /// First known tool found on `PATH`
    #[must_use]
    pub fn discover() -> Option<Self> {
        TOOLS
            .iter()
            .find(|(program, _)| which::which(program).is_ok())
            .map(|(program, args)| Self::new(*program, args))
    }
}

#[async_trait]
impl Clipboard for CommandClipboard {
    fn name(&self) -> &'static str {
        "system"
    }

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        debug!("Copying with {}", self.program);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ClipboardError::unavailable(format!("{}: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| ClipboardError::unavailable(format!("{}: {e}", self.program)))?;
        }

        let status = child
            .wait()
            .await
            .map_err(|e| ClipboardError::unavailable(format!("{}: {e}", self.program)))?;
        if !status.success() {
            return Err(ClipboardError::unavailable(format!(
                "{} exited with {status}",
                self.program
            )));
        }
        Ok(())
    }
}

/// Legacy path: put the text on screen for manual selection
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionClipboard;

impl SelectionClipboard {
    #[must_use]
    pub fn frame(text: &str) -> String {
        let rule = "-".repeat(text.chars().count().min(72));
        format!("{rule}\n{text}\n{rule}")
    }
}

#[async_trait]
impl Clipboard for SelectionClipboard {
    fn name(&self) -> &'static str {
        "selection"
    }

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        println!("{}", Self::frame(text));
        Ok(())
    }
}

/// Primary clipboard with a silent fallback
pub struct FallbackClipboard {
    primary: Option<Box<dyn Clipboard>>,
    fallback: Box<dyn Clipboard>,
}

impl FallbackClipboard {
    pub fn new(primary: Option<Box<dyn Clipboard>>, fallback: Box<dyn Clipboard>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl Clipboard for FallbackClipboard {
    fn name(&self) -> &'static str {
        self.primary
            .as_ref()
            .map_or(self.fallback.name(), |primary| primary.name())
    }

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        if let Some(primary) = &self.primary {
            match primary.write_text(text).await {
                Ok(()) => return Ok(()),
                Err(e) => warn!("{}, falling back to {}", e, self.fallback.name()),
            }
        }
        self.fallback.write_text(text).await
    }
}

/// Pick the clipboard for this machine
#[must_use]
pub fn detect() -> FallbackClipboard {
    let primary = CommandClipboard::discover().map(|c| Box::new(c) as Box<dyn Clipboard>);
    match &primary {
        Some(_) => debug!("System clipboard tool found"),
        None => debug!("No system clipboard tool, using selection fallback"),
    }
    FallbackClipboard::new(primary, Box::new(SelectionClipboard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recording {
        texts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Clipboard for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
            self.texts.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct Broken;

    #[async_trait]
    impl Clipboard for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
            Err(ClipboardError::unavailable("no display"))
        }
    }

    #[tokio::test]
    async fn test_primary_is_used_when_it_works() {
        let primary = Recording::default();
        let fallback = Recording::default();
        let clipboard = FallbackClipboard::new(Some(Box::new(primary.clone())), Box::new(fallback.clone()));

        clipboard.write_text("https://example.org/?lat=1&lon=2").await.unwrap();

        assert_eq!(primary.texts.lock().unwrap().len(), 1);
        assert!(fallback.texts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_falls_back_silently() {
        let fallback = Recording::default();
        let clipboard = FallbackClipboard::new(Some(Box::new(Broken)), Box::new(fallback.clone()));

        assert!(clipboard.write_text("link").await.is_ok());
        assert_eq!(*fallback.texts.lock().unwrap(), vec!["link".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let clipboard = CommandClipboard::new("vaderprat-no-such-clipboard-tool", &[]);
        let err = clipboard.write_text("x").await.unwrap_err();
        assert!(matches!(err, ClipboardError::Unavailable { .. }));
    }

    #[test]
    fn test_selection_frame() {
        assert_eq!(SelectionClipboard::frame("abc"), "---\nabc\n---");
    }
}
