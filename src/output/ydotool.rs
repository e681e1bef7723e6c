//! ydotool-based keystroke output
//!
//! Uses ydotool to simulate keyboard input. This works on all Wayland
//! compositors because ydotool uses the uinput kernel interface.
//! ydotool has no script mode, so a batch becomes several invocations run
//! strictly one after another.
//!
//! `ydotool type` only knows ASCII and silently skips everything else, so
//! batches with Vietnamese letters are refused before anything is deleted.
//!
//! Requires:
//! - ydotool installed
//! - ydotoold daemon running (systemctl --user start ydotool)
//! - User in 'input' group

use super::SyntheticSink;
use crate::error::OutputError;
use crate::keys::KeyCode;
use crate::synthesis::{SyntheticBatch, SyntheticKey};
use std::process::Stdio;
use tokio::process::Command;

/// ydotool-based keystroke output
pub struct YdotoolSink {
    /// Delay between keypresses in milliseconds
    delay_ms: u32,
}

impl YdotoolSink {
    pub fn new(delay_ms: u32) -> Self {
        Self { delay_ms }
    }

    /// Refuse batches ydotool would half-apply
    fn check_typeable(batch: &SyntheticBatch) -> Result<(), OutputError> {
        let text = batch.text();
        if text.is_ascii() {
            Ok(())
        } else {
            Err(OutputError::InjectionFailed(format!(
                "ydotool cannot type non-ASCII text {:?}",
                text
            )))
        }
    }

    /// One argument list per ydotool invocation, in delivery order
    fn build_invocations(&self, batch: &SyntheticBatch) -> Vec<Vec<String>> {
        let mut invocations: Vec<Vec<String>> = Vec::new();
        let mut text = String::new();

        let backspace = KeyCode::BACKSPACE.code();
        for event in batch.events() {
            match event.key {
                SyntheticKey::Backspace => {
                    if !text.is_empty() {
                        invocations.push(self.type_args(std::mem::take(&mut text)));
                    }
                    invocations.push(vec![
                        "key".to_string(),
                        format!("{}:1", backspace),
                        format!("{}:0", backspace),
                    ]);
                }
                SyntheticKey::Char(ch) => text.push(ch),
            }
        }
        if !text.is_empty() {
            invocations.push(self.type_args(text));
        }

        invocations
    }

    fn type_args(&self, text: String) -> Vec<String> {
        let mut args = vec!["type".to_string()];
        if self.delay_ms > 0 {
            args.push("--key-delay".to_string());
            args.push(self.delay_ms.to_string());
            args.push("--key-hold".to_string());
            args.push(self.delay_ms.to_string());
        }
        // The -- ensures text starting with - isn't treated as an option
        args.push("--".to_string());
        args.push(text);
        args
    }
}

#[async_trait::async_trait]
impl SyntheticSink for YdotoolSink {
    async fn deliver(&self, batch: &SyntheticBatch) -> Result<(), OutputError> {
        Self::check_typeable(batch)?;

        for args in self.build_invocations(batch) {
            let output = Command::new("ydotool")
                .args(&args)
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .output()
                .await
                .map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        OutputError::YdotoolNotFound
                    } else {
                        OutputError::InjectionFailed(e.to_string())
                    }
                })?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);

                if stderr.contains("socket") || stderr.contains("connect") || stderr.contains("daemon")
                {
                    return Err(OutputError::YdotoolNotRunning);
                }

                return Err(OutputError::InjectionFailed(stderr.trim().to_string()));
            }
        }

        Ok(())
    }

    fn is_available(&self) -> bool {
        which::which("ydotool").is_ok()
    }

    fn name(&self) -> &'static str {
        "ydotool"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_invocations() {
        let sink = YdotoolSink::new(0);
        let batch = SyntheticBatch::replace_previous('s', 'â', Some('s'), false);
        assert_eq!(
            sink.build_invocations(&batch),
            vec![
                vec!["key", "14:1", "14:0"],
                vec!["type", "--", "âs"],
            ]
        );
    }

    #[tokio::test]
    async fn test_non_ascii_batch_rejected_before_delete() {
        let sink = YdotoolSink::new(0);
        let batch = SyntheticBatch::replace_previous('a', 'â', None, false);
        assert!(matches!(
            sink.deliver(&batch).await,
            Err(OutputError::InjectionFailed(_))
        ));
    }

    #[test]
    fn test_ascii_batch_is_typeable() {
        // Reverting a plain letter back to ASCII stays deliverable
        let batch = SyntheticBatch::replace_previous('z', 'a', Some('z'), false);
        assert!(YdotoolSink::check_typeable(&batch).is_ok());
    }

    #[test]
    fn test_type_args_with_delay() {
        let sink = YdotoolSink::new(10);
        assert_eq!(
            sink.type_args("ơ".to_string()),
            vec!["type", "--key-delay", "10", "--key-hold", "10", "--", "ơ"]
        );
    }
}
