//! dotool-based keystroke output
//!
//! Uses dotool to simulate keyboard input through uinput. The whole batch is
//! written as one script on stdin so the keystrokes cannot interleave with
//! another invocation.
//!
//! Requires:
//! - dotool installed (https://sr.ht/~geb/dotool/)
//! - User in 'input' group for uinput access

use super::SyntheticSink;
use crate::error::OutputError;
use crate::synthesis::{SyntheticBatch, SyntheticKey};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// dotool-based keystroke output
pub struct DotoolSink {
    /// Delay between keypresses in milliseconds
    type_delay_ms: u32,
}

impl DotoolSink {
    pub fn new(type_delay_ms: u32) -> Self {
        Self { type_delay_ms }
    }

    /// Build the dotool command script to send via stdin
    fn build_commands(&self, batch: &SyntheticBatch) -> String {
        let mut commands = String::new();

        if self.type_delay_ms > 0 {
            commands.push_str(&format!("typedelay {}\n", self.type_delay_ms));
            commands.push_str(&format!("typehold {}\n", self.type_delay_ms));
        }

        for event in batch.events() {
            match event.key {
                SyntheticKey::Backspace => commands.push_str("key backspace\n"),
                SyntheticKey::Char(ch) => commands.push_str(&format!("type {}\n", ch)),
            }
        }

        commands
    }
}

#[async_trait::async_trait]
impl SyntheticSink for DotoolSink {
    async fn deliver(&self, batch: &SyntheticBatch) -> Result<(), OutputError> {
        if batch.is_empty() {
            return Ok(());
        }

        let commands = self.build_commands(batch);

        let mut child = Command::new("dotool")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    OutputError::DotoolNotFound
                } else {
                    OutputError::InjectionFailed(format!("Failed to spawn dotool: {}", e))
                }
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(commands.as_bytes()).await.map_err(|e| {
                OutputError::InjectionFailed(format!("Failed to write to dotool stdin: {}", e))
            })?;
            // Close stdin to signal end of input
            drop(stdin);
        }

        let output = child.wait_with_output().await.map_err(|e| {
            OutputError::InjectionFailed(format!("Failed to wait for dotool: {}", e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);

            if stderr.contains("uinput") || stderr.contains("permission") {
                return Err(OutputError::InjectionFailed(
                    "dotool: uinput permission denied. Is user in 'input' group?".to_string(),
                ));
            }

            return Err(OutputError::InjectionFailed(format!(
                "dotool exited with error: {}",
                stderr.trim()
            )));
        }

        Ok(())
    }

    fn is_available(&self) -> bool {
        which::which("dotool").is_ok()
    }

    fn name(&self) -> &'static str {
        "dotool"
    }
}
