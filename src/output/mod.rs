//! Synthetic keystroke output
//!
//! Delivers composition batches (delete + insert) to the focused
//! application through an external typing tool.
//!
//! Fallback chain for `driver = "auto"`:
//! 1. wtype - Wayland-native, full Unicode support, no daemon needed
//! 2. dotool - uinput based, works everywhere, layout aware
//! 3. ydotool - uinput based, requires the ydotoold daemon, ASCII only
//!
//! Each tool receives a whole batch at once so the application sees the
//! keystrokes in the order they were built.

pub mod dotool;
pub mod wtype;
pub mod ydotool;

use crate::config::{OutputConfig, OutputDriver};
use crate::error::OutputError;
use crate::synthesis::SyntheticBatch;

/// Trait for synthetic keystroke delivery
#[async_trait::async_trait]
pub trait SyntheticSink: Send + Sync {
    /// Deliver every keystroke of the batch, in order
    async fn deliver(&self, batch: &SyntheticBatch) -> Result<(), OutputError>;

    /// Check if the tool behind this sink is installed
    fn is_available(&self) -> bool;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// All sinks the configured driver allows, in preference order
pub fn configured_sinks(config: &OutputConfig) -> Vec<Box<dyn SyntheticSink>> {
    let wtype = || Box::new(wtype::WtypeSink::new(config.type_delay_ms)) as Box<dyn SyntheticSink>;
    let dotool = || Box::new(dotool::DotoolSink::new(config.type_delay_ms)) as Box<dyn SyntheticSink>;
    let ydotool =
        || Box::new(ydotool::YdotoolSink::new(config.type_delay_ms)) as Box<dyn SyntheticSink>;

    match config.driver {
        OutputDriver::Auto => vec![wtype(), dotool(), ydotool()],
        OutputDriver::Wtype => vec![wtype()],
        OutputDriver::Dotool => vec![dotool()],
        OutputDriver::Ydotool => vec![ydotool()],
    }
}

/// Factory function that returns the fallback chain of installed sinks
///
/// Availability is checked once here, not per keystroke.
pub fn create_sink_chain(config: &OutputConfig) -> Vec<Box<dyn SyntheticSink>> {
    let chain: Vec<_> = configured_sinks(config)
        .into_iter()
        .filter(|sink| {
            let available = sink.is_available();
            if !available {
                tracing::debug!("{} not found in PATH, skipping", sink.name());
            }
            available
        })
        .collect();

    if chain.is_empty() {
        tracing::warn!("No output tool available; composed letters cannot be typed");
    } else {
        tracing::debug!(
            "Output chain: {}",
            chain.iter().map(|s| s.name()).collect::<Vec<_>>().join(" -> ")
        );
    }

    chain
}

/// Try each sink in the chain until one succeeds
pub async fn deliver_with_fallback(
    chain: &[Box<dyn SyntheticSink>],
    batch: &SyntheticBatch,
) -> Result<(), OutputError> {
    for sink in chain {
        match sink.deliver(batch).await {
            Ok(()) => {
                tracing::trace!("Batch delivered via {}", sink.name());
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("{} failed: {}, trying next", sink.name(), e);
            }
        }
    }

    Err(OutputError::AllMethodsFailed)
}
