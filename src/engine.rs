//! Composition engine
//!
//! Owns the single "current letter" and applies method rules to it. The
//! engine never looks further back than that one letter: the text surface
//! owns everything else, and the daemon only ever rewrites the character
//! immediately before the cursor.

use crate::codec::{is_modifiable, is_vowel, LetterCode, Modification, Tone};
use crate::method::{Conversion, Effect, Method};

/// Result of feeding one trigger key to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A mark was set; replace the previous letter with the new one
    Applied(LetterCode),
    /// A mark that was already present was removed; replace the previous
    /// letter and then type the trigger key literally
    Reverted(LetterCode),
    /// The key does not take part in composition here
    Unchanged,
}

/// Composition state: the most recently produced letter and its marks
#[derive(Debug, Clone, Default)]
pub struct Composer {
    current: LetterCode,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> LetterCode {
        self.current
    }

    /// Forget the current letter entirely
    pub fn reset(&mut self) {
        self.current = LetterCode::EMPTY;
    }

    /// Start over from a freshly typed plain key
    pub fn reset_to(&mut self, key: char) {
        self.current = LetterCode::plain(key);
    }

    /// Apply `trigger` under `method` to the current letter
    ///
    /// Touches at most one axis (tone or modification) per call, except for
    /// the clear rule, which removes both in a single step.
    pub fn apply(&mut self, method: &Method, trigger: char) -> Outcome {
        let Some(rule) = method.rule_for(trigger) else {
            return Outcome::Unchanged;
        };

        let current = self.current;
        let Some(conversion) = rule
            .conversions
            .iter()
            .find(|conversion| is_applicable(conversion, current))
        else {
            return Outcome::Unchanged;
        };

        match conversion.effect {
            Effect::Tone(tone) => {
                if current.tone() == tone {
                    self.current = current.with_tone(Tone::None);
                    Outcome::Reverted(self.current)
                } else {
                    self.current = current.with_tone(tone);
                    Outcome::Applied(self.current)
                }
            }
            Effect::Modify(modification) => {
                if current.modification() == modification {
                    self.current = current.with_modification(Modification::None);
                    Outcome::Reverted(self.current)
                } else {
                    self.current = current.with_modification(modification);
                    Outcome::Applied(self.current)
                }
            }
            Effect::ClearMarks => {
                self.current = LetterCode::pack(
                    current.base().unwrap_or(0),
                    Tone::None,
                    Modification::None,
                );
                Outcome::Reverted(self.current)
            }
        }
    }
}

/// Whether a conversion can act on the current letter
///
/// Restricted conversions need an exact (case-insensitive) base match.
/// Generic ones need a base that can carry the effect at all, so a tone key
/// after a consonant stays plain text instead of producing an unrenderable code.
fn is_applicable(conversion: &Conversion, current: LetterCode) -> bool {
    let Some(base) = current.base() else {
        return false;
    };

    match conversion.base {
        Some(required) => required == base.to_ascii_lowercase(),
        None => match conversion.effect {
            Effect::Tone(Tone::None) => false,
            Effect::Tone(_) => is_vowel(base),
            Effect::Modify(_) => is_modifiable(base),
            Effect::ClearMarks => !current.is_plain(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::render;
    use crate::method::{TELEX, VNI};

    fn composer_with(ch: char) -> Composer {
        let mut composer = Composer::new();
        composer.reset_to(ch);
        composer
    }

    #[test]
    fn test_no_rule_is_unchanged() {
        let mut composer = composer_with('a');
        assert_eq!(composer.apply(&TELEX, 'b'), Outcome::Unchanged);
        assert_eq!(composer.current(), LetterCode::plain('a'));
    }

    #[test]
    fn test_empty_state_is_unchanged() {
        let mut composer = Composer::new();
        assert_eq!(composer.apply(&TELEX, 's'), Outcome::Unchanged);
        assert_eq!(composer.apply(&TELEX, 'a'), Outcome::Unchanged);
        assert!(composer.current().is_empty());
    }

    #[test]
    fn test_circumflex_then_tone() {
        let mut composer = composer_with('a');

        let Outcome::Applied(code) = composer.apply(&TELEX, 'a') else {
            panic!("expected circumflex");
        };
        assert_eq!(render(code), Ok('â'));

        let Outcome::Applied(code) = composer.apply(&TELEX, 's') else {
            panic!("expected acute");
        };
        assert_eq!(render(code), Ok('ấ'));
        assert_eq!(composer.current(), code);
    }

    #[test]
    fn test_same_tone_twice_reverts() {
        let mut composer = composer_with('a');
        composer.apply(&TELEX, 'a');
        composer.apply(&TELEX, 's');

        let outcome = composer.apply(&TELEX, 's');
        let Outcome::Reverted(code) = outcome else {
            panic!("expected revert, got {:?}", outcome);
        };
        assert_eq!(render(code), Ok('â'));
    }

    #[test]
    fn test_revert_restores_original_letter() {
        for (start, trigger) in [('o', 'f'), ('E', 'x'), ('u', 'w'), ('d', 'd'), ('y', 'j')] {
            let mut composer = composer_with(start);
            assert!(matches!(
                composer.apply(&TELEX, trigger),
                Outcome::Applied(_)
            ));
            assert_eq!(
                composer.apply(&TELEX, trigger),
                Outcome::Reverted(LetterCode::plain(start))
            );
        }
    }

    #[test]
    fn test_tone_replaces_tone() {
        let mut composer = composer_with('e');
        composer.apply(&TELEX, 's');
        let Outcome::Applied(code) = composer.apply(&TELEX, 'f') else {
            panic!("expected grave");
        };
        assert_eq!(render(code), Ok('è'));
    }

    #[test]
    fn test_tone_on_consonant_is_unchanged() {
        let mut composer = composer_with('b');
        assert_eq!(composer.apply(&TELEX, 's'), Outcome::Unchanged);
        assert_eq!(composer.current(), LetterCode::plain('b'));
    }

    #[test]
    fn test_first_applicable_candidate_wins() {
        let mut composer = composer_with('o');
        let Outcome::Applied(code) = composer.apply(&TELEX, 'w') else {
            panic!("expected horn");
        };
        assert_eq!(render(code), Ok('ơ'));

        let mut composer = composer_with('a');
        let Outcome::Applied(code) = composer.apply(&TELEX, 'W') else {
            panic!("expected breve");
        };
        assert_eq!(render(code), Ok('ă'));

        let mut composer = composer_with('i');
        assert_eq!(composer.apply(&TELEX, 'w'), Outcome::Unchanged);
    }

    #[test]
    fn test_modification_replaces_modification() {
        let mut composer = composer_with('a');
        composer.apply(&TELEX, 'a');
        let Outcome::Applied(code) = composer.apply(&TELEX, 'w') else {
            panic!("expected breve");
        };
        assert_eq!(render(code), Ok('ă'));
    }

    #[test]
    fn test_uppercase_base_keeps_case() {
        let mut composer = composer_with('D');
        let Outcome::Applied(code) = composer.apply(&TELEX, 'd') else {
            panic!("expected stroke");
        };
        assert_eq!(render(code), Ok('Đ'));
    }

    #[test]
    fn test_clear_marks_clears_both_axes() {
        let mut composer = composer_with('u');
        composer.apply(&VNI, '7');
        composer.apply(&VNI, '1');
        assert_eq!(render(composer.current()), Ok('ứ'));

        assert_eq!(
            composer.apply(&VNI, '0'),
            Outcome::Reverted(LetterCode::plain('u'))
        );
        assert!(composer.current().is_plain());
    }

    #[test]
    fn test_clear_marks_on_plain_letter_is_unchanged() {
        let mut composer = composer_with('a');
        assert_eq!(composer.apply(&TELEX, 'z'), Outcome::Unchanged);
    }

    #[test]
    fn test_vni_generic_modification_may_not_render() {
        let mut composer = composer_with('i');
        let Outcome::Applied(code) = composer.apply(&VNI, '6') else {
            panic!("generic circumflex applies to any vowel");
        };
        assert!(render(code).is_err());
    }

    #[test]
    fn test_vni_stroke() {
        let mut composer = composer_with('d');
        let Outcome::Applied(code) = composer.apply(&VNI, '9') else {
            panic!("expected stroke");
        };
        assert_eq!(render(code), Ok('đ'));
    }
}
