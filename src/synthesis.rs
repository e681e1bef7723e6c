//! Synthetic keystroke batches and echo suppression
//!
//! A composition step replaces the letter before the cursor: one delete,
//! one insert of the rendered letter and, on a revert, one more insert of
//! the literal trigger key. Backends that see their own injected input come
//! back through the event source use the [`Suppressor`] to drop those echoes.

use std::fmt;

/// A single press-and-release the sink should perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticKey {
    /// Delete the character before the cursor
    Backspace,
    /// Type a Unicode scalar
    Char(char),
}

/// One synthetic keystroke with its origin tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticEvent {
    pub key: SyntheticKey,
    /// Set by the backend before dispatch so echoes can be recognised
    pub self_originated: bool,
}

impl SyntheticEvent {
    fn new(key: SyntheticKey) -> Self {
        Self {
            key,
            self_originated: false,
        }
    }
}

/// Ordered keystrokes that rewrite the letter before the cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticBatch {
    events: Vec<SyntheticEvent>,
    trigger: char,
}

impl SyntheticBatch {
    /// Replace the previous letter with `rendered`
    ///
    /// `literal` is typed after the replacement (the revert case).
    /// `extra_delete` adds a leading delete for backends whose real trigger
    /// keystroke already reached the application.
    pub fn replace_previous(
        trigger: char,
        rendered: char,
        literal: Option<char>,
        extra_delete: bool,
    ) -> Self {
        let mut events = Vec::with_capacity(4);
        if extra_delete {
            events.push(SyntheticEvent::new(SyntheticKey::Backspace));
        }
        events.push(SyntheticEvent::new(SyntheticKey::Backspace));
        events.push(SyntheticEvent::new(SyntheticKey::Char(rendered)));
        if let Some(ch) = literal {
            events.push(SyntheticEvent::new(SyntheticKey::Char(ch)));
        }
        Self { events, trigger }
    }

    /// The organic key that produced this batch
    pub fn trigger(&self) -> char {
        self.trigger
    }

    pub fn events(&self) -> &[SyntheticEvent] {
        &self.events
    }

    pub fn events_mut(&mut self) -> impl Iterator<Item = &mut SyntheticEvent> {
        self.events.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of leading deletes
    pub fn deletes(&self) -> usize {
        self.events
            .iter()
            .take_while(|e| e.key == SyntheticKey::Backspace)
            .count()
    }

    /// Characters inserted after the deletes
    pub fn text(&self) -> String {
        self.events
            .iter()
            .filter_map(|e| match e.key {
                SyntheticKey::Char(ch) => Some(ch),
                SyntheticKey::Backspace => None,
            })
            .collect()
    }

    pub fn all_self_originated(&self) -> bool {
        self.events.iter().all(|e| e.self_originated)
    }
}

impl fmt::Display for SyntheticBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x delete, insert {:?}", self.deletes(), self.text())
    }
}

/// Echo suppression credits
///
/// Credits are armed once per dispatched batch and never accumulate: arming
/// replaces whatever is left over, and a failed dispatch disarms entirely.
#[derive(Debug, Clone, Default)]
pub struct Suppressor {
    credits: usize,
}

impl Suppressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, credits: usize) {
        if self.credits > 0 {
            tracing::debug!("Discarding {} stale suppression credit(s)", self.credits);
        }
        self.credits = credits;
    }

    pub fn disarm(&mut self) {
        self.credits = 0;
    }

    pub fn pending(&self) -> usize {
        self.credits
    }

    /// Decide whether a key press is one of our own echoes
    ///
    /// Presses flagged as injected by the platform are always dropped.
    /// Unflagged presses are dropped only while credits remain.
    pub fn should_drop(&mut self, injected: bool) -> bool {
        if self.credits > 0 {
            self.credits -= 1;
            return true;
        }
        injected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_previous() {
        let batch = SyntheticBatch::replace_previous('s', 'ấ', None, false);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.deletes(), 1);
        assert_eq!(batch.text(), "ấ");
        assert_eq!(batch.trigger(), 's');
        assert!(!batch.all_self_originated());
    }

    #[test]
    fn test_revert_appends_literal() {
        let batch = SyntheticBatch::replace_previous('s', 'â', Some('s'), false);
        assert_eq!(
            batch.events().iter().map(|e| e.key).collect::<Vec<_>>(),
            vec![
                SyntheticKey::Backspace,
                SyntheticKey::Char('â'),
                SyntheticKey::Char('s'),
            ]
        );
    }

    #[test]
    fn test_extra_delete() {
        let batch = SyntheticBatch::replace_previous('w', 'ư', None, true);
        assert_eq!(batch.deletes(), 2);
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_suppressor_consumes_one_credit_per_press() {
        let mut suppressor = Suppressor::new();
        suppressor.arm(2);
        assert!(suppressor.should_drop(false));
        assert!(suppressor.should_drop(false));
        assert!(!suppressor.should_drop(false));
        assert_eq!(suppressor.pending(), 0);
    }

    #[test]
    fn test_suppressor_arm_replaces() {
        let mut suppressor = Suppressor::new();
        suppressor.arm(3);
        suppressor.should_drop(false);
        suppressor.arm(2);
        assert_eq!(suppressor.pending(), 2);
    }

    #[test]
    fn test_suppressor_disarm() {
        let mut suppressor = Suppressor::new();
        suppressor.arm(3);
        suppressor.disarm();
        assert!(!suppressor.should_drop(false));
    }

    #[test]
    fn test_injected_always_dropped() {
        let mut suppressor = Suppressor::new();
        assert!(suppressor.should_drop(true));
        suppressor.arm(1);
        assert!(suppressor.should_drop(true));
        assert_eq!(suppressor.pending(), 0);
    }
}
