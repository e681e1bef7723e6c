//! Modifier and lock key tracking
//!
//! Left and right modifiers are tracked separately so releasing one shift
//! while the other is still held does not drop the shift state. Lock keys
//! toggle on the initial press only; auto-repeat must not flip them back.

use crate::keys::{KeyCode, KeyTransition};

/// Snapshot of the modifier state consulted when resolving a key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
    pub caps_lock: bool,
    pub num_lock: bool,
    pub scroll_lock: bool,
}

impl ModifierState {
    /// Ctrl, Alt or Meta held: the key is a shortcut, not text
    pub fn has_command_modifier(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

/// Lock toggles as reported by the keyboard LEDs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockState {
    pub caps_lock: bool,
    pub num_lock: bool,
    pub scroll_lock: bool,
}

/// Which modifier a key code is, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierKey {
    LeftShift,
    RightShift,
    LeftCtrl,
    RightCtrl,
    LeftAlt,
    RightAlt,
    LeftMeta,
    RightMeta,
    CapsLock,
    NumLock,
    ScrollLock,
}

impl ModifierKey {
    pub fn from_code(code: KeyCode) -> Option<Self> {
        Some(match code {
            KeyCode::LEFTSHIFT => ModifierKey::LeftShift,
            KeyCode::RIGHTSHIFT => ModifierKey::RightShift,
            KeyCode::LEFTCTRL => ModifierKey::LeftCtrl,
            KeyCode::RIGHTCTRL => ModifierKey::RightCtrl,
            KeyCode::LEFTALT => ModifierKey::LeftAlt,
            KeyCode::RIGHTALT => ModifierKey::RightAlt,
            KeyCode::LEFTMETA => ModifierKey::LeftMeta,
            KeyCode::RIGHTMETA => ModifierKey::RightMeta,
            KeyCode::CAPSLOCK => ModifierKey::CapsLock,
            KeyCode::NUMLOCK => ModifierKey::NumLock,
            KeyCode::SCROLLLOCK => ModifierKey::ScrollLock,
            _ => return None,
        })
    }
}

/// Per-side held flags plus lock toggles
#[derive(Debug, Clone, Default)]
pub struct ModifierTracker {
    left_shift: bool,
    right_shift: bool,
    left_ctrl: bool,
    right_ctrl: bool,
    left_alt: bool,
    right_alt: bool,
    left_meta: bool,
    right_meta: bool,
    caps_lock: bool,
    num_lock: bool,
    scroll_lock: bool,
}

impl ModifierTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed lock states, e.g. from the keyboard LEDs at startup
    pub fn with_locks(locks: LockState) -> Self {
        Self {
            caps_lock: locks.caps_lock,
            num_lock: locks.num_lock,
            scroll_lock: locks.scroll_lock,
            ..Self::default()
        }
    }

    /// Update from a key transition. Returns true if the key was a modifier.
    pub fn on_key(&mut self, code: KeyCode, transition: KeyTransition) -> bool {
        let Some(key) = ModifierKey::from_code(code) else {
            return false;
        };

        let held = transition.is_press();
        match key {
            ModifierKey::LeftShift => self.left_shift = held,
            ModifierKey::RightShift => self.right_shift = held,
            ModifierKey::LeftCtrl => self.left_ctrl = held,
            ModifierKey::RightCtrl => self.right_ctrl = held,
            ModifierKey::LeftAlt => self.left_alt = held,
            ModifierKey::RightAlt => self.right_alt = held,
            ModifierKey::LeftMeta => self.left_meta = held,
            ModifierKey::RightMeta => self.right_meta = held,
            ModifierKey::CapsLock if transition == KeyTransition::Down => {
                self.caps_lock = !self.caps_lock
            }
            ModifierKey::NumLock if transition == KeyTransition::Down => {
                self.num_lock = !self.num_lock
            }
            ModifierKey::ScrollLock if transition == KeyTransition::Down => {
                self.scroll_lock = !self.scroll_lock
            }
            ModifierKey::CapsLock | ModifierKey::NumLock | ModifierKey::ScrollLock => {}
        }
        true
    }

    pub fn state(&self) -> ModifierState {
        ModifierState {
            shift: self.left_shift || self.right_shift,
            ctrl: self.left_ctrl || self.right_ctrl,
            alt: self.left_alt || self.right_alt,
            meta: self.left_meta || self.right_meta,
            caps_lock: self.caps_lock,
            num_lock: self.num_lock,
            scroll_lock: self.scroll_lock,
        }
    }

    /// Release every held modifier, keeping lock toggles
    pub fn release_all(&mut self) {
        *self = Self::with_locks(LockState {
            caps_lock: self.caps_lock,
            num_lock: self.num_lock,
            scroll_lock: self.scroll_lock,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_sides_tracked_separately() {
        let mut tracker = ModifierTracker::new();
        tracker.on_key(KeyCode::LEFTSHIFT, KeyTransition::Down);
        tracker.on_key(KeyCode::RIGHTSHIFT, KeyTransition::Down);
        tracker.on_key(KeyCode::LEFTSHIFT, KeyTransition::Up);
        assert!(tracker.state().shift);

        tracker.on_key(KeyCode::RIGHTSHIFT, KeyTransition::Up);
        assert!(!tracker.state().shift);
    }

    #[test]
    fn test_lock_toggles_on_press_only() {
        let mut tracker = ModifierTracker::new();
        tracker.on_key(KeyCode::CAPSLOCK, KeyTransition::Down);
        tracker.on_key(KeyCode::CAPSLOCK, KeyTransition::Repeat);
        tracker.on_key(KeyCode::CAPSLOCK, KeyTransition::Up);
        assert!(tracker.state().caps_lock);

        tracker.on_key(KeyCode::CAPSLOCK, KeyTransition::Down);
        assert!(!tracker.state().caps_lock);
    }

    #[test]
    fn test_command_modifiers() {
        let mut tracker = ModifierTracker::new();
        assert!(!tracker.state().has_command_modifier());
        tracker.on_key(KeyCode::RIGHTALT, KeyTransition::Down);
        assert!(tracker.state().has_command_modifier());
        tracker.on_key(KeyCode::RIGHTALT, KeyTransition::Up);
        tracker.on_key(KeyCode::LEFTCTRL, KeyTransition::Down);
        assert!(tracker.state().ctrl);
    }

    #[test]
    fn test_non_modifier_ignored() {
        let mut tracker = ModifierTracker::new();
        assert!(!tracker.on_key(KeyCode::A, KeyTransition::Down));
        assert_eq!(tracker.state(), ModifierState::default());
    }

    #[test]
    fn test_release_all_keeps_locks() {
        let mut tracker = ModifierTracker::with_locks(LockState {
            num_lock: true,
            ..Default::default()
        });
        tracker.on_key(KeyCode::LEFTSHIFT, KeyTransition::Down);
        tracker.release_all();
        let state = tracker.state();
        assert!(!state.shift);
        assert!(state.num_lock);
    }
}
