//! Key codes and key-to-character resolution
//!
//! Key codes use the Linux input event numbering (`KEY_*` in
//! `linux/input-event-codes.h`). The numbering is stable, documented and
//! what the evdev backend receives natively; other backends translate into it.
//!
//! Resolution is the direct US-layout mapping. Other layouts are out of scope:
//! the engine only needs the Latin letters and digits a method reacts to.

use crate::modifiers::ModifierState;

/// Physical key, numbered as in the Linux input subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const ESC: KeyCode = KeyCode(1);
    pub const NUM_1: KeyCode = KeyCode(2);
    pub const NUM_2: KeyCode = KeyCode(3);
    pub const NUM_3: KeyCode = KeyCode(4);
    pub const NUM_4: KeyCode = KeyCode(5);
    pub const NUM_5: KeyCode = KeyCode(6);
    pub const NUM_6: KeyCode = KeyCode(7);
    pub const NUM_7: KeyCode = KeyCode(8);
    pub const NUM_8: KeyCode = KeyCode(9);
    pub const NUM_9: KeyCode = KeyCode(10);
    pub const NUM_0: KeyCode = KeyCode(11);
    pub const MINUS: KeyCode = KeyCode(12);
    pub const EQUAL: KeyCode = KeyCode(13);
    pub const BACKSPACE: KeyCode = KeyCode(14);
    pub const TAB: KeyCode = KeyCode(15);
    pub const Q: KeyCode = KeyCode(16);
    pub const W: KeyCode = KeyCode(17);
    pub const E: KeyCode = KeyCode(18);
    pub const R: KeyCode = KeyCode(19);
    pub const T: KeyCode = KeyCode(20);
    pub const Y: KeyCode = KeyCode(21);
    pub const U: KeyCode = KeyCode(22);
    pub const I: KeyCode = KeyCode(23);
    pub const O: KeyCode = KeyCode(24);
    pub const P: KeyCode = KeyCode(25);
    pub const LEFTBRACE: KeyCode = KeyCode(26);
    pub const RIGHTBRACE: KeyCode = KeyCode(27);
    pub const ENTER: KeyCode = KeyCode(28);
    pub const LEFTCTRL: KeyCode = KeyCode(29);
    pub const A: KeyCode = KeyCode(30);
    pub const S: KeyCode = KeyCode(31);
    pub const D: KeyCode = KeyCode(32);
    pub const F: KeyCode = KeyCode(33);
    pub const G: KeyCode = KeyCode(34);
    pub const H: KeyCode = KeyCode(35);
    pub const J: KeyCode = KeyCode(36);
    pub const K: KeyCode = KeyCode(37);
    pub const L: KeyCode = KeyCode(38);
    pub const SEMICOLON: KeyCode = KeyCode(39);
    pub const APOSTROPHE: KeyCode = KeyCode(40);
    pub const GRAVE: KeyCode = KeyCode(41);
    pub const LEFTSHIFT: KeyCode = KeyCode(42);
    pub const BACKSLASH: KeyCode = KeyCode(43);
    pub const Z: KeyCode = KeyCode(44);
    pub const X: KeyCode = KeyCode(45);
    pub const C: KeyCode = KeyCode(46);
    pub const V: KeyCode = KeyCode(47);
    pub const B: KeyCode = KeyCode(48);
    pub const N: KeyCode = KeyCode(49);
    pub const M: KeyCode = KeyCode(50);
    pub const COMMA: KeyCode = KeyCode(51);
    pub const DOT: KeyCode = KeyCode(52);
    pub const SLASH: KeyCode = KeyCode(53);
    pub const RIGHTSHIFT: KeyCode = KeyCode(54);
    pub const KPASTERISK: KeyCode = KeyCode(55);
    pub const LEFTALT: KeyCode = KeyCode(56);
    pub const SPACE: KeyCode = KeyCode(57);
    pub const CAPSLOCK: KeyCode = KeyCode(58);
    pub const NUMLOCK: KeyCode = KeyCode(69);
    pub const SCROLLLOCK: KeyCode = KeyCode(70);
    pub const KP7: KeyCode = KeyCode(71);
    pub const KP8: KeyCode = KeyCode(72);
    pub const KP9: KeyCode = KeyCode(73);
    pub const KPMINUS: KeyCode = KeyCode(74);
    pub const KP4: KeyCode = KeyCode(75);
    pub const KP5: KeyCode = KeyCode(76);
    pub const KP6: KeyCode = KeyCode(77);
    pub const KPPLUS: KeyCode = KeyCode(78);
    pub const KP1: KeyCode = KeyCode(79);
    pub const KP2: KeyCode = KeyCode(80);
    pub const KP3: KeyCode = KeyCode(81);
    pub const KP0: KeyCode = KeyCode(82);
    pub const KPDOT: KeyCode = KeyCode(83);
    pub const KPENTER: KeyCode = KeyCode(96);
    pub const RIGHTCTRL: KeyCode = KeyCode(97);
    pub const KPSLASH: KeyCode = KeyCode(98);
    pub const RIGHTALT: KeyCode = KeyCode(100);
    pub const HOME: KeyCode = KeyCode(102);
    pub const UP: KeyCode = KeyCode(103);
    pub const PAGEUP: KeyCode = KeyCode(104);
    pub const LEFT: KeyCode = KeyCode(105);
    pub const RIGHT: KeyCode = KeyCode(106);
    pub const END: KeyCode = KeyCode(107);
    pub const DOWN: KeyCode = KeyCode(108);
    pub const PAGEDOWN: KeyCode = KeyCode(109);
    pub const INSERT: KeyCode = KeyCode(110);
    pub const DELETE: KeyCode = KeyCode(111);
    pub const LEFTMETA: KeyCode = KeyCode(125);
    pub const RIGHTMETA: KeyCode = KeyCode(126);

    pub fn code(self) -> u16 {
        self.0
    }
}

/// Physical key state change, matching evdev event values 0/1/2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTransition {
    Up,
    Down,
    Repeat,
}

impl KeyTransition {
    /// Map a raw evdev key value; anything else is not a key transition
    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyTransition::Up),
            1 => Some(KeyTransition::Down),
            2 => Some(KeyTransition::Repeat),
            _ => None,
        }
    }

    pub fn value(self) -> i32 {
        match self {
            KeyTransition::Up => 0,
            KeyTransition::Down => 1,
            KeyTransition::Repeat => 2,
        }
    }

    /// Down and auto-repeat both type a character
    pub fn is_press(self) -> bool {
        !matches!(self, KeyTransition::Up)
    }
}

/// Main-block keys with their unshifted and shifted characters
const LAYOUT: [(KeyCode, char, char); 48] = [
    (KeyCode::GRAVE, '`', '~'),
    (KeyCode::NUM_1, '1', '!'),
    (KeyCode::NUM_2, '2', '@'),
    (KeyCode::NUM_3, '3', '#'),
    (KeyCode::NUM_4, '4', '$'),
    (KeyCode::NUM_5, '5', '%'),
    (KeyCode::NUM_6, '6', '^'),
    (KeyCode::NUM_7, '7', '&'),
    (KeyCode::NUM_8, '8', '*'),
    (KeyCode::NUM_9, '9', '('),
    (KeyCode::NUM_0, '0', ')'),
    (KeyCode::MINUS, '-', '_'),
    (KeyCode::EQUAL, '=', '+'),
    (KeyCode::Q, 'q', 'Q'),
    (KeyCode::W, 'w', 'W'),
    (KeyCode::E, 'e', 'E'),
    (KeyCode::R, 'r', 'R'),
    (KeyCode::T, 't', 'T'),
    (KeyCode::Y, 'y', 'Y'),
    (KeyCode::U, 'u', 'U'),
    (KeyCode::I, 'i', 'I'),
    (KeyCode::O, 'o', 'O'),
    (KeyCode::P, 'p', 'P'),
    (KeyCode::LEFTBRACE, '[', '{'),
    (KeyCode::RIGHTBRACE, ']', '}'),
    (KeyCode::BACKSLASH, '\\', '|'),
    (KeyCode::A, 'a', 'A'),
    (KeyCode::S, 's', 'S'),
    (KeyCode::D, 'd', 'D'),
    (KeyCode::F, 'f', 'F'),
    (KeyCode::G, 'g', 'G'),
    (KeyCode::H, 'h', 'H'),
    (KeyCode::J, 'j', 'J'),
    (KeyCode::K, 'k', 'K'),
    (KeyCode::L, 'l', 'L'),
    (KeyCode::SEMICOLON, ';', ':'),
    (KeyCode::APOSTROPHE, '\'', '"'),
    (KeyCode::Z, 'z', 'Z'),
    (KeyCode::X, 'x', 'X'),
    (KeyCode::C, 'c', 'C'),
    (KeyCode::V, 'v', 'V'),
    (KeyCode::B, 'b', 'B'),
    (KeyCode::N, 'n', 'N'),
    (KeyCode::M, 'm', 'M'),
    (KeyCode::COMMA, ',', '<'),
    (KeyCode::DOT, '.', '>'),
    (KeyCode::SLASH, '/', '?'),
    (KeyCode::SPACE, ' ', ' '),
];

/// Keypad keys that produce a character only while num lock is on
const KEYPAD_NUMERIC: [(KeyCode, char); 11] = [
    (KeyCode::KP0, '0'),
    (KeyCode::KP1, '1'),
    (KeyCode::KP2, '2'),
    (KeyCode::KP3, '3'),
    (KeyCode::KP4, '4'),
    (KeyCode::KP5, '5'),
    (KeyCode::KP6, '6'),
    (KeyCode::KP7, '7'),
    (KeyCode::KP8, '8'),
    (KeyCode::KP9, '9'),
    (KeyCode::KPDOT, '.'),
];

/// Resolve a key press to the character it types
///
/// Returns `None` for keys that type nothing (modifiers, function keys,
/// navigation) so the caller can pass them through untouched.
pub fn resolve(code: KeyCode, modifiers: &ModifierState) -> Option<char> {
    if let Some(&(_, plain, shifted)) = LAYOUT.iter().find(|(key, _, _)| *key == code) {
        let upper = if plain.is_ascii_lowercase() {
            modifiers.shift != modifiers.caps_lock
        } else {
            modifiers.shift
        };
        return Some(if upper { shifted } else { plain });
    }

    if let Some(&(_, ch)) = KEYPAD_NUMERIC.iter().find(|(key, _)| *key == code) {
        return modifiers.num_lock.then_some(ch);
    }

    match code {
        KeyCode::KPSLASH => Some('/'),
        KeyCode::KPASTERISK => Some('*'),
        KeyCode::KPMINUS => Some('-'),
        KeyCode::KPPLUS => Some('+'),
        _ => None,
    }
}

/// Keys that move the cursor or edit text without typing a character
///
/// Keypad digits count as navigation while num lock is off, since they
/// act as arrows, Home/End and Page Up/Down in that state.
pub fn is_navigation(code: KeyCode, modifiers: &ModifierState) -> bool {
    match code {
        KeyCode::BACKSPACE
        | KeyCode::DELETE
        | KeyCode::ENTER
        | KeyCode::KPENTER
        | KeyCode::TAB
        | KeyCode::ESC
        | KeyCode::HOME
        | KeyCode::END
        | KeyCode::PAGEUP
        | KeyCode::PAGEDOWN
        | KeyCode::LEFT
        | KeyCode::RIGHT
        | KeyCode::UP
        | KeyCode::DOWN => true,
        KeyCode::KP1
        | KeyCode::KP2
        | KeyCode::KP3
        | KeyCode::KP4
        | KeyCode::KP6
        | KeyCode::KP7
        | KeyCode::KP8
        | KeyCode::KP9
        | KeyCode::KPDOT => !modifiers.num_lock,
        _ => false,
    }
}

/// Key (and whether shift is needed) that types `ch` on the US layout
pub fn key_for_char(ch: char) -> Option<(KeyCode, bool)> {
    LAYOUT.iter().find_map(|&(key, plain, shifted)| {
        if ch == plain {
            Some((key, false))
        } else if ch == shifted {
            Some((key, true))
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mods(shift: bool, caps_lock: bool, num_lock: bool) -> ModifierState {
        ModifierState {
            shift,
            caps_lock,
            num_lock,
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_letters() {
        assert_eq!(resolve(KeyCode::A, &mods(false, false, false)), Some('a'));
        assert_eq!(resolve(KeyCode::A, &mods(true, false, false)), Some('A'));
        assert_eq!(resolve(KeyCode::A, &mods(false, true, false)), Some('A'));
        assert_eq!(resolve(KeyCode::A, &mods(true, true, false)), Some('a'));
    }

    #[test]
    fn test_caps_lock_does_not_shift_digits() {
        assert_eq!(resolve(KeyCode::NUM_6, &mods(false, true, false)), Some('6'));
        assert_eq!(resolve(KeyCode::NUM_6, &mods(true, false, false)), Some('^'));
    }

    #[test]
    fn test_keypad_follows_num_lock() {
        assert_eq!(resolve(KeyCode::KP7, &mods(false, false, true)), Some('7'));
        assert_eq!(resolve(KeyCode::KP7, &mods(false, false, false)), None);
        assert!(is_navigation(KeyCode::KP7, &mods(false, false, false)));
        assert!(!is_navigation(KeyCode::KP7, &mods(false, false, true)));
        assert_eq!(resolve(KeyCode::KPPLUS, &mods(false, false, false)), Some('+'));
    }

    #[test]
    fn test_non_printing_keys() {
        let m = ModifierState::default();
        assert_eq!(resolve(KeyCode::LEFTSHIFT, &m), None);
        assert_eq!(resolve(KeyCode::HOME, &m), None);
        assert_eq!(resolve(KeyCode(59), &m), None); // F1
    }

    #[test]
    fn test_navigation_keys() {
        let m = ModifierState::default();
        for key in [
            KeyCode::DELETE,
            KeyCode::ENTER,
            KeyCode::HOME,
            KeyCode::END,
            KeyCode::PAGEUP,
            KeyCode::PAGEDOWN,
            KeyCode::LEFT,
            KeyCode::RIGHT,
            KeyCode::UP,
            KeyCode::DOWN,
            KeyCode::BACKSPACE,
        ] {
            assert!(is_navigation(key, &m), "{:?}", key);
        }
        assert!(!is_navigation(KeyCode::A, &m));
        assert!(!is_navigation(KeyCode::LEFTCTRL, &m));
    }

    #[test]
    fn test_key_for_char() {
        assert_eq!(key_for_char('s'), Some((KeyCode::S, false)));
        assert_eq!(key_for_char('S'), Some((KeyCode::S, true)));
        assert_eq!(key_for_char('!'), Some((KeyCode::NUM_1, true)));
        assert_eq!(key_for_char(' '), Some((KeyCode::SPACE, false)));
        assert_eq!(key_for_char('ấ'), None);
    }
}
