//! viethook: system-wide Vietnamese input for Linux
//!
//! This library provides the core functionality for:
//! - Reading key and pointer events via evdev (kernel-level, works on all compositors)
//! - Composing Vietnamese letters with the Telex or VNI method
//! - Replacing the letter before the cursor via wtype/dotool/ydotool
//!
//! # Architecture
//!
//! ```text
//!          ┌──────────────┐   raw key / pointer events
//!          │    Input     │ ─────────────────────────────┐
//!          │   (evdev)    │                              │
//!          └──────────────┘                              ▼
//!                 ▲                              ┌──────────────┐
//!                 │ forward / inject             │   Modifier   │ (always updated)
//!                 │                              │   Tracker    │
//!          ┌──────────────┐                      └──────────────┘
//!          │    Daemon    │                              │
//!          └──────────────┘                              ▼
//!                 ▲                              ┌──────────────┐
//!                 │ Decision                     │ Composition  │ pass-through / reset
//!                 └───────────────────────────── │     Gate     │
//!                                                └──────────────┘
//!                                                        │ trigger char
//!                                                        ▼
//!                                                ┌──────────────┐
//!                                                │    Engine    │ ◀── Method (Telex / VNI)
//!                                                └──────────────┘
//!                                                        │ letter code
//!                                                        ▼
//!                                                ┌──────────────┐
//!                                                │    Codec     │ render to precomposed char
//!                                                └──────────────┘
//!                                                        │
//!                                                        ▼
//!                                                ┌──────────────┐
//!                                                │  Synthesis   │ delete + insert batch,
//!                                                │              │ echo suppression
//!                                                └──────────────┘
//! ```

pub mod cli;
pub mod codec;
pub mod config;
pub mod daemon;
pub mod engine;
pub mod error;
pub mod gate;
pub mod input;
pub mod keys;
pub mod method;
pub mod modifiers;
pub mod output;
pub mod simulate;
pub mod synthesis;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use daemon::Daemon;
pub use error::{Result, ViethookError};
