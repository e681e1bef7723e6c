//! Input method tables
//!
//! A method maps trigger keys to ordered lists of conversions. The two
//! built-in schemes are plain data: Telex (mnemonic letters) and VNI
//! (number keys). Order matters in both directions: the first rule whose
//! trigger matches is used, and within it the first applicable conversion wins.

use crate::codec::{Modification, Tone};
use std::fmt;

/// What a conversion does to the current letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Set (or revert) a tone mark
    Tone(Tone),
    /// Set (or revert) a letter modification
    Modify(Modification),
    /// Remove every mark from the current letter
    ClearMarks,
}

/// One candidate transformation in a keystroke rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    /// Lower-case base letter this conversion is restricted to, or `None` for any base
    pub base: Option<u8>,
    pub effect: Effect,
}

impl Conversion {
    pub const fn tone(tone: Tone) -> Self {
        Self {
            base: None,
            effect: Effect::Tone(tone),
        }
    }

    pub const fn modify(modification: Modification) -> Self {
        Self {
            base: None,
            effect: Effect::Modify(modification),
        }
    }

    pub const fn modify_base(base: u8, modification: Modification) -> Self {
        Self {
            base: Some(base),
            effect: Effect::Modify(modification),
        }
    }

    pub const fn clear() -> Self {
        Self {
            base: None,
            effect: Effect::ClearMarks,
        }
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let effect = match self.effect {
            Effect::Tone(Tone::None) => "no tone",
            Effect::Tone(Tone::Grave) => "grave",
            Effect::Tone(Tone::Acute) => "acute",
            Effect::Tone(Tone::HookAbove) => "hook above",
            Effect::Tone(Tone::Tilde) => "tilde",
            Effect::Tone(Tone::Underdot) => "dot below",
            Effect::Modify(Modification::None) => "no modification",
            Effect::Modify(Modification::Breve) => "breve",
            Effect::Modify(Modification::Circumflex) => "circumflex",
            Effect::Modify(Modification::Horn) => "horn",
            Effect::Modify(Modification::Stroke) => "stroke",
            Effect::ClearMarks => "clear marks",
        };
        match self.base {
            Some(base) => write!(f, "{} on {}", effect, base as char),
            None => f.write_str(effect),
        }
    }
}

/// A trigger key and its ordered candidates
#[derive(Debug, Clone, Copy)]
pub struct KeystrokeRule {
    pub trigger: u8,
    pub conversions: &'static [Conversion],
}

/// A named input scheme
#[derive(Debug)]
pub struct Method {
    pub name: &'static str,
    pub rules: &'static [KeystrokeRule],
}

impl Method {
    /// All built-in methods
    pub fn all() -> [&'static Method; 2] {
        [&TELEX, &VNI]
    }

    /// Look up a built-in method by name (case-insensitive)
    pub fn by_name(name: &str) -> Option<&'static Method> {
        Self::all()
            .into_iter()
            .find(|m| m.name.eq_ignore_ascii_case(name.trim()))
    }

    /// First rule whose trigger equals the lower-cased key
    pub fn rule_for(&self, key: char) -> Option<&KeystrokeRule> {
        if !key.is_ascii() {
            return None;
        }
        let key = (key as u8).to_ascii_lowercase();
        self.rules.iter().find(|rule| rule.trigger == key)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Telex: letters double as diacritic commands
pub static TELEX: Method = Method {
    name: "telex",
    rules: &[
        KeystrokeRule {
            trigger: b'f',
            conversions: &[Conversion::tone(Tone::Grave)],
        },
        KeystrokeRule {
            trigger: b's',
            conversions: &[Conversion::tone(Tone::Acute)],
        },
        KeystrokeRule {
            trigger: b'r',
            conversions: &[Conversion::tone(Tone::HookAbove)],
        },
        KeystrokeRule {
            trigger: b'x',
            conversions: &[Conversion::tone(Tone::Tilde)],
        },
        KeystrokeRule {
            trigger: b'j',
            conversions: &[Conversion::tone(Tone::Underdot)],
        },
        KeystrokeRule {
            trigger: b'a',
            conversions: &[Conversion::modify_base(b'a', Modification::Circumflex)],
        },
        KeystrokeRule {
            trigger: b'd',
            conversions: &[Conversion::modify_base(b'd', Modification::Stroke)],
        },
        KeystrokeRule {
            trigger: b'e',
            conversions: &[Conversion::modify_base(b'e', Modification::Circumflex)],
        },
        KeystrokeRule {
            trigger: b'o',
            conversions: &[Conversion::modify_base(b'o', Modification::Circumflex)],
        },
        KeystrokeRule {
            trigger: b'w',
            conversions: &[
                Conversion::modify_base(b'a', Modification::Breve),
                Conversion::modify_base(b'o', Modification::Horn),
                Conversion::modify_base(b'u', Modification::Horn),
            ],
        },
        KeystrokeRule {
            trigger: b'z',
            conversions: &[Conversion::clear()],
        },
    ],
};

/// VNI: number keys carry the diacritics
pub static VNI: Method = Method {
    name: "vni",
    rules: &[
        KeystrokeRule {
            trigger: b'1',
            conversions: &[Conversion::tone(Tone::Acute)],
        },
        KeystrokeRule {
            trigger: b'2',
            conversions: &[Conversion::tone(Tone::Grave)],
        },
        KeystrokeRule {
            trigger: b'3',
            conversions: &[Conversion::tone(Tone::HookAbove)],
        },
        KeystrokeRule {
            trigger: b'4',
            conversions: &[Conversion::tone(Tone::Tilde)],
        },
        KeystrokeRule {
            trigger: b'5',
            conversions: &[Conversion::tone(Tone::Underdot)],
        },
        KeystrokeRule {
            trigger: b'6',
            conversions: &[Conversion::modify(Modification::Circumflex)],
        },
        KeystrokeRule {
            trigger: b'7',
            conversions: &[Conversion::modify(Modification::Horn)],
        },
        KeystrokeRule {
            trigger: b'8',
            conversions: &[Conversion::modify(Modification::Breve)],
        },
        KeystrokeRule {
            trigger: b'9',
            conversions: &[Conversion::modify(Modification::Stroke)],
        },
        KeystrokeRule {
            trigger: b'0',
            conversions: &[Conversion::clear()],
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name() {
        assert_eq!(Method::by_name("telex").unwrap().name, "telex");
        assert_eq!(Method::by_name("VNI").unwrap().name, "vni");
        assert_eq!(Method::by_name(" Telex ").unwrap().name, "telex");
        assert!(Method::by_name("viqr").is_none());
    }

    #[test]
    fn test_rule_lookup_is_case_insensitive() {
        let rule = TELEX.rule_for('S').unwrap();
        assert_eq!(rule.trigger, b's');
        assert!(TELEX.rule_for('b').is_none());
        assert!(TELEX.rule_for('ư').is_none());
    }

    #[test]
    fn test_w_candidates_ordered() {
        let rule = TELEX.rule_for('w').unwrap();
        let bases: Vec<_> = rule.conversions.iter().map(|c| c.base).collect();
        assert_eq!(bases, vec![Some(b'a'), Some(b'o'), Some(b'u')]);
    }

    #[test]
    fn test_triggers_unique_per_method() {
        for method in Method::all() {
            let mut seen = std::collections::HashSet::new();
            for rule in method.rules {
                assert!(seen.insert(rule.trigger), "{} repeats {}", method, rule.trigger as char);
                assert!(!rule.conversions.is_empty());
            }
        }
    }

    #[test]
    fn test_conversion_display() {
        assert_eq!(Conversion::tone(Tone::HookAbove).to_string(), "hook above");
        assert_eq!(
            Conversion::modify_base(b'o', Modification::Horn).to_string(),
            "horn on o"
        );
        assert_eq!(Conversion::clear().to_string(), "clear marks");
    }

    #[test]
    fn test_help_text_names_every_trigger() {
        let help = crate::cli::METHOD_KEYS_HELP;
        for method in Method::all() {
            assert!(help.contains(method.name), "help omits {}", method);
            for rule in method.rules {
                let key = format!("{} ", rule.trigger as char);
                assert!(help.contains(&key), "help omits {} key {}", method, key);
            }
        }
    }

    #[test]
    fn test_vni_clear_rule() {
        let rule = VNI.rule_for('0').unwrap();
        assert_eq!(rule.conversions, &[Conversion::clear()]);
    }
}
