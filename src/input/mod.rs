//! Input event source
//!
//! Every key and pointer event on the machine is serialised through one
//! backend. The composition gate is written against [`InputBackend`] only,
//! so the same pipeline runs against the evdev backend on Linux and the
//! scripted [`fake::FakeBackend`] in tests and `viethook simulate`.
//!
//! Linux: the evdev backend requires the user to be in the 'input' group
//! and write access to /dev/uinput when grabbing keyboards.

#[cfg(target_os = "linux")]
pub mod evdev_backend;
pub mod fake;

use crate::config::Config;
use crate::error::{InputError, OutputError};
use crate::keys::{KeyCode, KeyTransition};
use crate::modifiers::LockState;
use crate::synthesis::{SyntheticBatch, SyntheticEvent};

/// Pointer button as seen by the composition gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Secondary,
    Other,
}

/// Pointer coordinates in the backend's own units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Events delivered by the input source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key {
        code: KeyCode,
        transition: KeyTransition,
        /// The platform marked this event as synthetically injected
        injected: bool,
    },
    PointerButton {
        button: Button,
        pressed: bool,
        position: Position,
    },
}

impl InputEvent {
    pub fn key(code: KeyCode, transition: KeyTransition) -> Self {
        InputEvent::Key {
            code,
            transition,
            injected: false,
        }
    }

    pub fn key_down(code: KeyCode) -> Self {
        Self::key(code, KeyTransition::Down)
    }

    pub fn key_up(code: KeyCode) -> Self {
        Self::key(code, KeyTransition::Up)
    }

    pub fn click(button: Button, pressed: bool, x: i32, y: i32) -> Self {
        InputEvent::PointerButton {
            button,
            pressed,
            position: Position::new(x, y),
        }
    }
}

/// Capability interface every platform backend implements once
#[async_trait::async_trait]
pub trait InputBackend: Send {
    /// Open devices and begin delivering events
    async fn start(&mut self) -> Result<(), InputError>;

    /// Next event in arrival order, or `None` once the source has closed
    async fn poll_next_event(&mut self) -> Result<Option<InputEvent>, InputError>;

    /// Let an intercepted event continue to the rest of the system
    ///
    /// Events the gate suppresses are simply never forwarded.
    async fn forward(&mut self, event: &InputEvent) -> Result<(), InputError>;

    /// Tag an outgoing synthetic event so its echo can be recognised
    fn mark_self_originated(&self, event: &mut SyntheticEvent);

    /// Deliver a batch in order
    async fn inject(&mut self, batch: &SyntheticBatch) -> Result<(), OutputError>;

    /// Whether withholding `forward` actually stops the event
    fn can_suppress(&self) -> bool;

    /// Whether injected events come back through `poll_next_event`
    fn echoes_injected(&self) -> bool;

    /// Lock key state at startup
    fn lock_state(&self) -> LockState {
        LockState::default()
    }

    /// Stop delivering events and release devices
    async fn stop(&mut self) -> Result<(), InputError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Factory function to create the platform backend
///
/// On Linux, reads raw devices through evdev and injects through the
/// configured output tool chain.
#[cfg(target_os = "linux")]
pub fn create_backend(config: &Config) -> Result<Box<dyn InputBackend>, InputError> {
    let sinks = crate::output::create_sink_chain(&config.output);
    Ok(Box::new(evdev_backend::EvdevBackend::new(
        &config.input,
        sinks,
    )?))
}

/// Factory function to create the platform backend
///
/// Only the Linux backend exists; elsewhere use `viethook simulate`.
#[cfg(not(target_os = "linux"))]
pub fn create_backend(_config: &Config) -> Result<Box<dyn InputBackend>, InputError> {
    Err(InputError::NotSupported(
        "System-wide input interception is only implemented for Linux (evdev). \
         Use 'viethook simulate' to try the composition engine."
            .to_string(),
    ))
}
