//! wtype-based keystroke output
//!
//! Uses wtype to simulate keyboard input on Wayland. This is the preferred
//! method on Wayland because:
//! - No daemon required (unlike ydotool)
//! - Any Unicode letter can be typed regardless of the active layout
//!
//! Requires:
//! - wtype installed
//! - Running on Wayland (WAYLAND_DISPLAY set)

use super::SyntheticSink;
use crate::error::OutputError;
use crate::synthesis::{SyntheticBatch, SyntheticKey};
use std::process::Stdio;
use tokio::process::Command;

/// wtype-based keystroke output
pub struct WtypeSink {
    /// Delay between keystrokes in milliseconds
    delay_ms: u32,
}

impl WtypeSink {
    pub fn new(delay_ms: u32) -> Self {
        Self { delay_ms }
    }

    /// Arguments for a single wtype invocation covering the whole batch
    ///
    /// Consecutive characters are grouped into one text argument; deletes
    /// become `-k BackSpace`. wtype processes its arguments left to right.
    fn build_args(&self, batch: &SyntheticBatch) -> Vec<String> {
        let mut args = Vec::new();
        if self.delay_ms > 0 {
            args.push("-d".to_string());
            args.push(self.delay_ms.to_string());
        }

        let mut text = String::new();
        for event in batch.events() {
            match event.key {
                SyntheticKey::Backspace => {
                    if !text.is_empty() {
                        args.push(std::mem::take(&mut text));
                    }
                    args.push("-k".to_string());
                    args.push("BackSpace".to_string());
                }
                SyntheticKey::Char(ch) => text.push(ch),
            }
        }
        if !text.is_empty() {
            args.push(text);
        }

        args
    }
}

#[async_trait::async_trait]
impl SyntheticSink for WtypeSink {
    async fn deliver(&self, batch: &SyntheticBatch) -> Result<(), OutputError> {
        if batch.is_empty() {
            return Ok(());
        }

        let output = Command::new("wtype")
            .args(self.build_args(batch))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    OutputError::WtypeNotFound
                } else {
                    OutputError::InjectionFailed(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OutputError::InjectionFailed(format!(
                "wtype failed: {}",
                stderr.trim()
            )));
        }

        Ok(())
    }

    fn is_available(&self) -> bool {
        // Don't check WAYLAND_DISPLAY - systemd services may not have it
        // wtype will fail naturally if Wayland isn't available
        which::which("wtype").is_ok()
    }

    fn name(&self) -> &'static str {
        "wtype"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_replace() {
        let sink = WtypeSink::new(0);
        let batch = SyntheticBatch::replace_previous('s', 'ấ', None, false);
        assert_eq!(sink.build_args(&batch), vec!["-k", "BackSpace", "ấ"]);
    }

    #[test]
    fn test_build_args_revert_groups_text() {
        let sink = WtypeSink::new(0);
        let batch = SyntheticBatch::replace_previous('s', 'â', Some('s'), true);
        assert_eq!(
            sink.build_args(&batch),
            vec!["-k", "BackSpace", "-k", "BackSpace", "âs"]
        );
    }

    #[test]
    fn test_build_args_with_delay() {
        let sink = WtypeSink::new(5);
        let batch = SyntheticBatch::replace_previous('d', 'đ', None, false);
        assert_eq!(sink.build_args(&batch)[..2], ["-d", "5"]);
    }
}
