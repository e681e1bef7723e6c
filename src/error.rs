//! Error types for viethook
//!
//! Uses thiserror for ergonomic error definitions with clear messages
//! that guide users toward fixing common issues.

use crate::codec::{Modification, Tone};
use thiserror::Error;

/// Top-level error type for the viethook application
#[derive(Error, Debug)]
pub enum ViethookError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown input method: '{0}'. Available methods: telex, vni")]
    UnknownMethod(String),

    #[error("Another viethook daemon is already running (lock: {0})")]
    AlreadyRunning(String),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the character codec
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeError {
    #[error("No precomposed letter for '{base}' with tone {tone:?} and modification {modification:?}")]
    NoComposition {
        base: char,
        tone: Tone,
        modification: Modification,
    },
}

/// Errors related to the input event source
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Cannot open input device '{0}'. Is the user in the 'input' group?\n  Run: sudo usermod -aG input $USER\n  Then log out and back in.")]
    DeviceAccess(String),

    #[error("No keyboard device found in /dev/input/")]
    NoKeyboard,

    #[error("Cannot grab keyboard '{0}'. Is another input method already running?")]
    Grab(String),

    #[error("Cannot create virtual keyboard: {0}\n  Check that /dev/uinput is writable by the 'input' group.")]
    VirtualDevice(String),

    #[error("Event source closed")]
    SourceClosed,

    #[error("evdev error: {0}")]
    Evdev(String),

    #[error("{0}")]
    NotSupported(String),
}

/// Errors related to synthetic input delivery
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("ydotool daemon not running.\n  Start with: systemctl --user start ydotool\n  Enable at boot: systemctl --user enable ydotool")]
    YdotoolNotRunning,

    #[error("ydotool not found in PATH. Install via your package manager.")]
    YdotoolNotFound,

    #[error("wtype not found in PATH. Install via your package manager.")]
    WtypeNotFound,

    #[error("dotool not found in PATH. Install from https://sr.ht/~geb/dotool/")]
    DotoolNotFound,

    #[error("Injection failed: {0}")]
    InjectionFailed(String),

    #[error("All output drivers failed. Ensure wtype, dotool, or ydotool is available.")]
    AllMethodsFailed,
}

/// Result type alias using ViethookError
pub type Result<T> = std::result::Result<T, ViethookError>;
