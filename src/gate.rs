//! Composition gate
//!
//! The single owned context for one keyboard/pointer session. Every raw
//! event goes through [`CompositionGate::handle`], which updates modifier
//! state unconditionally and then decides whether the event passes through,
//! resets composition, or is replaced by a synthetic batch.
//!
//! ```text
//!              letter key                      trigger applies
//!   ┌──────┐ ─────────────▶ ┌──────────┐ ──────────────────────┐
//!   │ Idle │                │ (plain)  │                       ▼
//!   └──────┘ ◀───────────── └──────────┘              ┌───────────────┐
//!      ▲   navigation, chord,                         │   Composing   │
//!      │   click elsewhere                            └───────────────┘
//!      └──────────────────────────────────────────────────────┘
//! ```
//!
//! All work per event is table lookups on fixed-size data; nothing here
//! blocks or allocates beyond the small synthetic batch.

use crate::codec::{render, LetterCode};
use crate::engine::{Composer, Outcome};
use crate::input::{Button, InputEvent, Position};
use crate::keys::{self, KeyCode, KeyTransition};
use crate::method::Method;
use crate::modifiers::{LockState, ModifierKey, ModifierTracker};
use crate::synthesis::{SyntheticBatch, Suppressor};
use serde::{Deserialize, Serialize};

/// When a pointer press counts as "clicked elsewhere"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerResetPolicy {
    /// Reset only when both coordinates differ from the last release
    #[default]
    AllAxes,
    /// Reset when either coordinate differs
    AnyAxis,
}

impl PointerResetPolicy {
    pub fn moved(self, from: Position, to: Position) -> bool {
        match self {
            PointerResetPolicy::AllAxes => from.x != to.x && from.y != to.y,
            PointerResetPolicy::AnyAxis => from.x != to.x || from.y != to.y,
        }
    }
}

/// Gate behaviour that depends on configuration and the backend
#[derive(Debug, Clone, Copy)]
pub struct GateOptions {
    pub reset_on_click: bool,
    pub pointer_policy: PointerResetPolicy,
    /// Backend cannot withhold the real trigger key, delete it as well
    pub extra_delete: bool,
    /// Backend sees its own injected keystrokes, arm echo credits
    pub arm_echo_credits: bool,
    pub locks: LockState,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            reset_on_click: true,
            pointer_policy: PointerResetPolicy::default(),
            extra_delete: false,
            arm_echo_credits: false,
            locks: LockState::default(),
        }
    }
}

/// Observable composition state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Current letter is empty or carries no marks
    Idle,
    /// Current letter carries a tone or modification
    Composing,
}

/// What the caller must do with the event just handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Deliver the event unchanged
    PassThrough,
    /// Withhold the event and inject the batch instead
    Suppress(SyntheticBatch),
    /// Withhold the event; it is an echo of our own injection
    Swallow,
}

/// Composition context: method, current letter, modifiers, pointer and echo credits
#[derive(Debug)]
pub struct CompositionGate {
    method: &'static Method,
    composer: Composer,
    modifiers: ModifierTracker,
    last_release: Option<Position>,
    suppressor: Suppressor,
    options: GateOptions,
}

impl CompositionGate {
    pub fn new(method: &'static Method, options: GateOptions) -> Self {
        Self {
            method,
            composer: Composer::new(),
            modifiers: ModifierTracker::with_locks(options.locks),
            last_release: None,
            suppressor: Suppressor::new(),
            options,
        }
    }

    pub fn method(&self) -> &'static Method {
        self.method
    }

    pub fn current(&self) -> LetterCode {
        self.composer.current()
    }

    pub fn state(&self) -> GateState {
        if self.composer.current().is_plain() {
            GateState::Idle
        } else {
            GateState::Composing
        }
    }

    pub fn pending_echoes(&self) -> usize {
        self.suppressor.pending()
    }

    /// Route one raw event
    pub fn handle(&mut self, event: &InputEvent) -> Decision {
        match *event {
            InputEvent::Key {
                code,
                transition,
                injected,
            } => self.handle_key(code, transition, injected),
            InputEvent::PointerButton {
                button,
                pressed,
                position,
            } => {
                self.handle_pointer(button, pressed, position);
                Decision::PassThrough
            }
        }
    }

    /// The batch from the last decision could not be delivered
    ///
    /// Falls back to plain-text behaviour: the trigger becomes the new
    /// plain letter and no echo credits stay armed. The caller forwards
    /// the original key so the typed character is not lost.
    pub fn recover_failed_injection(&mut self, batch: &SyntheticBatch) {
        self.suppressor.disarm();
        self.composer.reset_to(batch.trigger());
    }

    fn handle_key(&mut self, code: KeyCode, transition: KeyTransition, injected: bool) -> Decision {
        self.modifiers.on_key(code, transition);

        if !transition.is_press() {
            return if injected {
                Decision::Swallow
            } else {
                Decision::PassThrough
            };
        }

        if self.suppressor.should_drop(injected) {
            tracing::trace!("Dropping echo of key {}", code.code());
            return Decision::Swallow;
        }

        // Covers the press of ctrl/alt/meta itself: the tracker already holds it
        let modifiers = self.modifiers.state();
        if modifiers.has_command_modifier() {
            if !self.composer.current().is_empty() {
                tracing::trace!("Chord on key {} resets composition", code.code());
            }
            self.composer.reset();
            return Decision::PassThrough;
        }

        if ModifierKey::from_code(code).is_some() {
            return Decision::PassThrough;
        }

        if keys::is_navigation(code, &modifiers) {
            if !self.composer.current().is_empty() {
                tracing::trace!("Key {} resets composition", code.code());
            }
            self.composer.reset();
            return Decision::PassThrough;
        }

        let Some(ch) = keys::resolve(code, &modifiers) else {
            return Decision::PassThrough;
        };

        self.compose(ch)
    }

    fn compose(&mut self, ch: char) -> Decision {
        let (code, literal) = match self.composer.apply(self.method, ch) {
            Outcome::Unchanged => {
                self.composer.reset_to(ch);
                return Decision::PassThrough;
            }
            Outcome::Applied(code) => (code, None),
            Outcome::Reverted(code) => (code, Some(ch)),
        };

        let rendered = match render(code) {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::debug!("{}, typing '{}' as plain text", e, ch);
                self.composer.reset_to(ch);
                return Decision::PassThrough;
            }
        };

        if literal.is_some() {
            self.composer.reset_to(ch);
        }

        let batch =
            SyntheticBatch::replace_previous(ch, rendered, literal, self.options.extra_delete);
        if self.options.arm_echo_credits {
            self.suppressor.arm(batch.len());
        }
        tracing::debug!("'{}' -> {}", ch, batch);
        Decision::Suppress(batch)
    }

    fn handle_pointer(&mut self, button: Button, pressed: bool, position: Position) {
        if button == Button::Other {
            return;
        }

        if !pressed {
            self.last_release = Some(position);
            return;
        }

        if !self.options.reset_on_click {
            return;
        }

        let moved = match self.last_release {
            Some(last) => self.options.pointer_policy.moved(last, position),
            None => true,
        };
        if moved {
            tracing::trace!("Click at ({}, {}) resets composition", position.x, position.y);
            self.composer.reset();
        }
    }
}
