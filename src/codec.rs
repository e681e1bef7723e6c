//! Letter codes and precomposed rendering
//!
//! A letter code packs an ASCII base letter, a tone mark and a letter
//! modification into a single `u16`:
//!
//! ```text
//!  15        12 11         8 7                   0
//! ┌────────────┬────────────┬─────────────────────┐
//! │modification│    tone    │  base (ASCII byte)  │
//! └────────────┴────────────┴─────────────────────┘
//! ```
//!
//! Rendering is table-driven. Unicode scatters the precomposed Vietnamese
//! letters across Latin-1, Latin Extended-A/B and Latin Extended Additional,
//! so there is no arithmetic path from a triple to a code point.

use crate::error::ComposeError;
use std::fmt;

const BASE_MASK: u16 = 0x00FF;
const TONE_SHIFT: u16 = 8;
const TONE_MASK: u16 = 0x0F00;
const MOD_SHIFT: u16 = 12;
const MOD_MASK: u16 = 0xF000;

/// Pitch-contour diacritic carried by a vowel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tone {
    #[default]
    None,
    Grave,
    Acute,
    HookAbove,
    Tilde,
    Underdot,
}

impl Tone {
    pub const ALL: [Tone; 6] = [
        Tone::None,
        Tone::Grave,
        Tone::Acute,
        Tone::HookAbove,
        Tone::Tilde,
        Tone::Underdot,
    ];

    const fn bits(self) -> u16 {
        match self {
            Tone::None => 0,
            Tone::Grave => 1,
            Tone::Acute => 2,
            Tone::HookAbove => 3,
            Tone::Tilde => 4,
            Tone::Underdot => 5,
        }
    }

    fn from_bits(bits: u16) -> Self {
        match bits {
            1 => Tone::Grave,
            2 => Tone::Acute,
            3 => Tone::HookAbove,
            4 => Tone::Tilde,
            5 => Tone::Underdot,
            _ => Tone::None,
        }
    }
}

/// Shape modifier applied to a base letter, orthogonal to the tone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Modification {
    #[default]
    None,
    Breve,
    Circumflex,
    Horn,
    Stroke,
}

impl Modification {
    pub const ALL: [Modification; 5] = [
        Modification::None,
        Modification::Breve,
        Modification::Circumflex,
        Modification::Horn,
        Modification::Stroke,
    ];

    const fn bits(self) -> u16 {
        match self {
            Modification::None => 0,
            Modification::Breve => 1,
            Modification::Circumflex => 2,
            Modification::Horn => 3,
            Modification::Stroke => 4,
        }
    }

    fn from_bits(bits: u16) -> Self {
        match bits {
            1 => Modification::Breve,
            2 => Modification::Circumflex,
            3 => Modification::Horn,
            4 => Modification::Stroke,
            _ => Modification::None,
        }
    }
}

/// Vowels that can carry a tone mark
pub fn is_vowel(base: u8) -> bool {
    matches!(
        base.to_ascii_lowercase(),
        b'a' | b'e' | b'i' | b'o' | b'u' | b'y'
    )
}

/// Letters that can carry a letter modification
pub fn is_modifiable(base: u8) -> bool {
    is_vowel(base) || base.eq_ignore_ascii_case(&b'd')
}

/// Packed (base, tone, modification) triple
///
/// A zero base means "no letter". Codes are only built through [`LetterCode::pack`]
/// and its helpers, so the tone and modification fields always hold valid values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LetterCode(u16);

impl LetterCode {
    /// No letter at all
    pub const EMPTY: LetterCode = LetterCode(0);

    pub const fn pack(base: u8, tone: Tone, modification: Modification) -> Self {
        LetterCode(
            base as u16 | (tone.bits() << TONE_SHIFT) | (modification.bits() << MOD_SHIFT),
        )
    }

    pub fn unpack(self) -> (u8, Tone, Modification) {
        (self.base_byte(), self.tone(), self.modification())
    }

    /// Plain letter for a typed character; anything outside ASCII yields an empty code
    pub fn plain(ch: char) -> Self {
        if ch.is_ascii() {
            LetterCode::pack(ch as u8, Tone::None, Modification::None)
        } else {
            LetterCode::EMPTY
        }
    }

    fn base_byte(self) -> u8 {
        (self.0 & BASE_MASK) as u8
    }

    /// Base letter, or `None` for an empty code
    pub fn base(self) -> Option<u8> {
        match self.base_byte() {
            0 => None,
            b => Some(b),
        }
    }

    pub fn tone(self) -> Tone {
        Tone::from_bits((self.0 & TONE_MASK) >> TONE_SHIFT)
    }

    pub fn modification(self) -> Modification {
        Modification::from_bits((self.0 & MOD_MASK) >> MOD_SHIFT)
    }

    pub fn with_tone(self, tone: Tone) -> Self {
        LetterCode::pack(self.base_byte(), tone, self.modification())
    }

    pub fn with_modification(self, modification: Modification) -> Self {
        LetterCode::pack(self.base_byte(), self.tone(), modification)
    }

    pub fn is_empty(self) -> bool {
        self.base().is_none()
    }

    /// True when neither a tone nor a modification is set
    pub fn is_plain(self) -> bool {
        self.tone() == Tone::None && self.modification() == Modification::None
    }
}

impl fmt::Display for LetterCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match render(*self) {
            Ok(ch) => write!(f, "{}", ch),
            Err(_) => {
                let (base, tone, modification) = self.unpack();
                write!(f, "{:?}+{:?}+{:?}", base as char, tone, modification)
            }
        }
    }
}

/// Render a letter code to its precomposed character
///
/// Plain ASCII letters render to themselves. Marked letters must appear in
/// the Vietnamese table; anything else (a tone on a consonant, a horn on
/// `a`, ...) is a [`ComposeError::NoComposition`].
pub fn render(code: LetterCode) -> Result<char, ComposeError> {
    let (base, tone, modification) = code.unpack();
    let miss = ComposeError::NoComposition {
        base: base as char,
        tone,
        modification,
    };

    if base == 0 || !base.is_ascii() {
        return Err(miss);
    }

    if code.is_plain() {
        return Ok(base as char);
    }

    VIETNAMESE_LETTERS
        .iter()
        .find(|(b, t, m, _)| *b == base && *t == tone && *m == modification)
        .map(|(_, _, _, ch)| *ch)
        .ok_or(miss)
}

/// Render a letter code as UTF-8 bytes into a caller-provided buffer
pub fn render_utf8(code: LetterCode, buf: &mut [u8; 4]) -> Result<&str, ComposeError> {
    Ok(render(code)?.encode_utf8(buf))
}

/// Every marked Vietnamese letter, ordered by base, modification, tone
pub const VIETNAMESE_LETTERS: [(u8, Tone, Modification, char); 134] = [
    (b'A', Tone::Grave, Modification::None, 'À'),
    (b'A', Tone::Acute, Modification::None, 'Á'),
    (b'A', Tone::HookAbove, Modification::None, 'Ả'),
    (b'A', Tone::Tilde, Modification::None, 'Ã'),
    (b'A', Tone::Underdot, Modification::None, 'Ạ'),
    (b'A', Tone::None, Modification::Breve, 'Ă'),
    (b'A', Tone::Grave, Modification::Breve, 'Ằ'),
    (b'A', Tone::Acute, Modification::Breve, 'Ắ'),
    (b'A', Tone::HookAbove, Modification::Breve, 'Ẳ'),
    (b'A', Tone::Tilde, Modification::Breve, 'Ẵ'),
    (b'A', Tone::Underdot, Modification::Breve, 'Ặ'),
    (b'A', Tone::None, Modification::Circumflex, 'Â'),
    (b'A', Tone::Grave, Modification::Circumflex, 'Ầ'),
    (b'A', Tone::Acute, Modification::Circumflex, 'Ấ'),
    (b'A', Tone::HookAbove, Modification::Circumflex, 'Ẩ'),
    (b'A', Tone::Tilde, Modification::Circumflex, 'Ẫ'),
    (b'A', Tone::Underdot, Modification::Circumflex, 'Ậ'),
    (b'D', Tone::None, Modification::Stroke, 'Đ'),
    (b'E', Tone::Grave, Modification::None, 'È'),
    (b'E', Tone::Acute, Modification::None, 'É'),
    (b'E', Tone::HookAbove, Modification::None, 'Ẻ'),
    (b'E', Tone::Tilde, Modification::None, 'Ẽ'),
    (b'E', Tone::Underdot, Modification::None, 'Ẹ'),
    (b'E', Tone::None, Modification::Circumflex, 'Ê'),
    (b'E', Tone::Grave, Modification::Circumflex, 'Ề'),
    (b'E', Tone::Acute, Modification::Circumflex, 'Ế'),
    (b'E', Tone::HookAbove, Modification::Circumflex, 'Ể'),
    (b'E', Tone::Tilde, Modification::Circumflex, 'Ễ'),
    (b'E', Tone::Underdot, Modification::Circumflex, 'Ệ'),
    (b'I', Tone::Grave, Modification::None, 'Ì'),
    (b'I', Tone::Acute, Modification::None, 'Í'),
    (b'I', Tone::HookAbove, Modification::None, 'Ỉ'),
    (b'I', Tone::Tilde, Modification::None, 'Ĩ'),
    (b'I', Tone::Underdot, Modification::None, 'Ị'),
    (b'O', Tone::Grave, Modification::None, 'Ò'),
    (b'O', Tone::Acute, Modification::None, 'Ó'),
    (b'O', Tone::HookAbove, Modification::None, 'Ỏ'),
    (b'O', Tone::Tilde, Modification::None, 'Õ'),
    (b'O', Tone::Underdot, Modification::None, 'Ọ'),
    (b'O', Tone::None, Modification::Circumflex, 'Ô'),
    (b'O', Tone::Grave, Modification::Circumflex, 'Ồ'),
    (b'O', Tone::Acute, Modification::Circumflex, 'Ố'),
    (b'O', Tone::HookAbove, Modification::Circumflex, 'Ổ'),
    (b'O', Tone::Tilde, Modification::Circumflex, 'Ỗ'),
    (b'O', Tone::Underdot, Modification::Circumflex, 'Ộ'),
    (b'O', Tone::None, Modification::Horn, 'Ơ'),
    (b'O', Tone::Grave, Modification::Horn, 'Ờ'),
    (b'O', Tone::Acute, Modification::Horn, 'Ớ'),
    (b'O', Tone::HookAbove, Modification::Horn, 'Ở'),
    (b'O', Tone::Tilde, Modification::Horn, 'Ỡ'),
    (b'O', Tone::Underdot, Modification::Horn, 'Ợ'),
    (b'U', Tone::Grave, Modification::None, 'Ù'),
    (b'U', Tone::Acute, Modification::None, 'Ú'),
    (b'U', Tone::HookAbove, Modification::None, 'Ủ'),
    (b'U', Tone::Tilde, Modification::None, 'Ũ'),
    (b'U', Tone::Underdot, Modification::None, 'Ụ'),
    (b'U', Tone::None, Modification::Horn, 'Ư'),
    (b'U', Tone::Grave, Modification::Horn, 'Ừ'),
    (b'U', Tone::Acute, Modification::Horn, 'Ứ'),
    (b'U', Tone::HookAbove, Modification::Horn, 'Ử'),
    (b'U', Tone::Tilde, Modification::Horn, 'Ữ'),
    (b'U', Tone::Underdot, Modification::Horn, 'Ự'),
    (b'Y', Tone::Grave, Modification::None, 'Ỳ'),
    (b'Y', Tone::Acute, Modification::None, 'Ý'),
    (b'Y', Tone::HookAbove, Modification::None, 'Ỷ'),
    (b'Y', Tone::Tilde, Modification::None, 'Ỹ'),
    (b'Y', Tone::Underdot, Modification::None, 'Ỵ'),
    (b'a', Tone::Grave, Modification::None, 'à'),
    (b'a', Tone::Acute, Modification::None, 'á'),
    (b'a', Tone::HookAbove, Modification::None, 'ả'),
    (b'a', Tone::Tilde, Modification::None, 'ã'),
    (b'a', Tone::Underdot, Modification::None, 'ạ'),
    (b'a', Tone::None, Modification::Breve, 'ă'),
    (b'a', Tone::Grave, Modification::Breve, 'ằ'),
    (b'a', Tone::Acute, Modification::Breve, 'ắ'),
    (b'a', Tone::HookAbove, Modification::Breve, 'ẳ'),
    (b'a', Tone::Tilde, Modification::Breve, 'ẵ'),
    (b'a', Tone::Underdot, Modification::Breve, 'ặ'),
    (b'a', Tone::None, Modification::Circumflex, 'â'),
    (b'a', Tone::Grave, Modification::Circumflex, 'ầ'),
    (b'a', Tone::Acute, Modification::Circumflex, 'ấ'),
    (b'a', Tone::HookAbove, Modification::Circumflex, 'ẩ'),
    (b'a', Tone::Tilde, Modification::Circumflex, 'ẫ'),
    (b'a', Tone::Underdot, Modification::Circumflex, 'ậ'),
    (b'd', Tone::None, Modification::Stroke, 'đ'),
    (b'e', Tone::Grave, Modification::None, 'è'),
    (b'e', Tone::Acute, Modification::None, 'é'),
    (b'e', Tone::HookAbove, Modification::None, 'ẻ'),
    (b'e', Tone::Tilde, Modification::None, 'ẽ'),
    (b'e', Tone::Underdot, Modification::None, 'ẹ'),
    (b'e', Tone::None, Modification::Circumflex, 'ê'),
    (b'e', Tone::Grave, Modification::Circumflex, 'ề'),
    (b'e', Tone::Acute, Modification::Circumflex, 'ế'),
    (b'e', Tone::HookAbove, Modification::Circumflex, 'ể'),
    (b'e', Tone::Tilde, Modification::Circumflex, 'ễ'),
    (b'e', Tone::Underdot, Modification::Circumflex, 'ệ'),
    (b'i', Tone::Grave, Modification::None, 'ì'),
    (b'i', Tone::Acute, Modification::None, 'í'),
    (b'i', Tone::HookAbove, Modification::None, 'ỉ'),
    (b'i', Tone::Tilde, Modification::None, 'ĩ'),
    (b'i', Tone::Underdot, Modification::None, 'ị'),
    (b'o', Tone::Grave, Modification::None, 'ò'),
    (b'o', Tone::Acute, Modification::None, 'ó'),
    (b'o', Tone::HookAbove, Modification::None, 'ỏ'),
    (b'o', Tone::Tilde, Modification::None, 'õ'),
    (b'o', Tone::Underdot, Modification::None, 'ọ'),
    (b'o', Tone::None, Modification::Circumflex, 'ô'),
    (b'o', Tone::Grave, Modification::Circumflex, 'ồ'),
    (b'o', Tone::Acute, Modification::Circumflex, 'ố'),
    (b'o', Tone::HookAbove, Modification::Circumflex, 'ổ'),
    (b'o', Tone::Tilde, Modification::Circumflex, 'ỗ'),
    (b'o', Tone::Underdot, Modification::Circumflex, 'ộ'),
    (b'o', Tone::None, Modification::Horn, 'ơ'),
    (b'o', Tone::Grave, Modification::Horn, 'ờ'),
    (b'o', Tone::Acute, Modification::Horn, 'ớ'),
    (b'o', Tone::HookAbove, Modification::Horn, 'ở'),
    (b'o', Tone::Tilde, Modification::Horn, 'ỡ'),
    (b'o', Tone::Underdot, Modification::Horn, 'ợ'),
    (b'u', Tone::Grave, Modification::None, 'ù'),
    (b'u', Tone::Acute, Modification::None, 'ú'),
    (b'u', Tone::HookAbove, Modification::None, 'ủ'),
    (b'u', Tone::Tilde, Modification::None, 'ũ'),
    (b'u', Tone::Underdot, Modification::None, 'ụ'),
    (b'u', Tone::None, Modification::Horn, 'ư'),
    (b'u', Tone::Grave, Modification::Horn, 'ừ'),
    (b'u', Tone::Acute, Modification::Horn, 'ứ'),
    (b'u', Tone::HookAbove, Modification::Horn, 'ử'),
    (b'u', Tone::Tilde, Modification::Horn, 'ữ'),
    (b'u', Tone::Underdot, Modification::Horn, 'ự'),
    (b'y', Tone::Grave, Modification::None, 'ỳ'),
    (b'y', Tone::Acute, Modification::None, 'ý'),
    (b'y', Tone::HookAbove, Modification::None, 'ỷ'),
    (b'y', Tone::Tilde, Modification::None, 'ỹ'),
    (b'y', Tone::Underdot, Modification::None, 'ỵ'),
];
