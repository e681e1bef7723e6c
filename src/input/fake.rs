//! Scripted input backend
//!
//! Plays back a queue of events and applies everything that reaches "the
//! application" to an in-memory [`TextSurface`]. No devices, no display.
//! Used by the integration tests and by `viethook simulate`.

use super::{InputBackend, InputEvent};
use crate::error::{InputError, OutputError};
use crate::keys::{self, KeyCode, KeyTransition};
use crate::modifiers::{LockState, ModifierTracker};
use crate::synthesis::{SyntheticBatch, SyntheticEvent, SyntheticKey};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Text as the focused application would show it, cursor at the end
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextSurface {
    text: String,
}

impl TextSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn insert(&mut self, ch: char) {
        self.text.push(ch);
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    pub fn apply(&mut self, key: SyntheticKey) {
        match key {
            SyntheticKey::Backspace => self.backspace(),
            SyntheticKey::Char(ch) => self.insert(ch),
        }
    }
}

/// Cloneable handle to a surface shared with a backend
#[derive(Debug, Clone, Default)]
pub struct SharedSurface(Arc<Mutex<TextSurface>>);

impl SharedSurface {
    fn lock(&self) -> MutexGuard<'_, TextSurface> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn text(&self) -> String {
        self.lock().text().to_string()
    }
}

/// How injected keystrokes come back through the event source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EchoMode {
    /// Injected input is never observed (evdev with virtual devices skipped)
    #[default]
    None,
    /// Echoes arrive carrying the platform's injected flag
    Flagged,
    /// Echoes look like organic keystrokes
    Unflagged,
}

/// Scripted event source with an in-memory application
#[derive(Debug, Default)]
pub struct FakeBackend {
    queue: VecDeque<InputEvent>,
    surface: SharedSurface,
    /// Tracks modifiers on the application side to resolve forwarded keys
    app_modifiers: ModifierTracker,
    locks: LockState,
    echo: EchoMode,
    suppress: bool,
    failing_injections: usize,
    injected: Vec<SyntheticBatch>,
    started: bool,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            suppress: true,
            ..Self::default()
        }
    }

    /// Backend that cannot withhold events, like evdev without a grab
    pub fn without_suppression(mut self) -> Self {
        self.suppress = false;
        self
    }

    pub fn with_echo(mut self, echo: EchoMode) -> Self {
        self.echo = echo;
        self
    }

    pub fn with_locks(mut self, locks: LockState) -> Self {
        self.locks = locks;
        self.app_modifiers = ModifierTracker::with_locks(locks);
        self
    }

    /// Make the next `count` injections fail
    pub fn fail_injections(mut self, count: usize) -> Self {
        self.failing_injections = count;
        self
    }

    pub fn push(&mut self, event: InputEvent) {
        self.queue.push_back(event);
    }

    pub fn push_all(&mut self, events: impl IntoIterator<Item = InputEvent>) {
        self.queue.extend(events);
    }

    /// Queue the key presses that type `text` on a US layout
    ///
    /// Characters with no key on the layout are skipped.
    pub fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            let Some((code, shift)) = keys::key_for_char(ch) else {
                tracing::warn!("No key types {:?}, skipping", ch);
                continue;
            };
            if shift {
                self.push(InputEvent::key_down(KeyCode::LEFTSHIFT));
            }
            self.push(InputEvent::key_down(code));
            self.push(InputEvent::key_up(code));
            if shift {
                self.push(InputEvent::key_up(KeyCode::LEFTSHIFT));
            }
        }
    }

    pub fn surface(&self) -> SharedSurface {
        self.surface.clone()
    }

    /// Batches delivered so far
    pub fn injected(&self) -> &[SyntheticBatch] {
        &self.injected
    }

    /// Deliver a key event to the application
    fn deliver(&mut self, event: &InputEvent) {
        let InputEvent::Key {
            code, transition, ..
        } = *event
        else {
            return;
        };

        self.app_modifiers.on_key(code, transition);
        if transition == KeyTransition::Up {
            return;
        }

        let modifiers = self.app_modifiers.state();
        if modifiers.has_command_modifier() {
            return;
        }

        let mut surface = self.surface.lock();
        match code {
            KeyCode::BACKSPACE => surface.backspace(),
            KeyCode::ENTER | KeyCode::KPENTER => surface.insert('\n'),
            KeyCode::TAB => surface.insert('\t'),
            _ => {
                if let Some(ch) = keys::resolve(code, &modifiers) {
                    surface.insert(ch);
                }
            }
        }
    }

    fn queue_echoes(&mut self, batch: &SyntheticBatch) {
        let injected = match self.echo {
            EchoMode::None => return,
            EchoMode::Flagged => true,
            EchoMode::Unflagged => false,
        };

        // Echoes are observed before any further organic input
        let mut echoes = Vec::with_capacity(batch.len() * 2);
        for event in batch.events() {
            let code = match event.key {
                SyntheticKey::Backspace => KeyCode::BACKSPACE,
                SyntheticKey::Char(ch) => keys::key_for_char(ch)
                    .map(|(code, _)| code)
                    .unwrap_or(KeyCode(0)),
            };
            for transition in [KeyTransition::Down, KeyTransition::Up] {
                echoes.push(InputEvent::Key {
                    code,
                    transition,
                    injected,
                });
            }
        }
        for echo in echoes.into_iter().rev() {
            self.queue.push_front(echo);
        }
    }
}

#[async_trait::async_trait]
impl InputBackend for FakeBackend {
    async fn start(&mut self) -> Result<(), InputError> {
        self.started = true;
        Ok(())
    }

    async fn poll_next_event(&mut self) -> Result<Option<InputEvent>, InputError> {
        if !self.started {
            return Err(InputError::SourceClosed);
        }
        let Some(event) = self.queue.pop_front() else {
            return Ok(None);
        };

        // Without suppression the application sees organic keys immediately
        let organic = !matches!(event, InputEvent::Key { injected: true, .. });
        if !self.suppress && organic {
            self.deliver(&event);
        }
        Ok(Some(event))
    }

    async fn forward(&mut self, event: &InputEvent) -> Result<(), InputError> {
        if self.suppress {
            self.deliver(event);
        }
        Ok(())
    }

    fn mark_self_originated(&self, event: &mut SyntheticEvent) {
        event.self_originated = true;
    }

    async fn inject(&mut self, batch: &SyntheticBatch) -> Result<(), OutputError> {
        if self.failing_injections > 0 {
            self.failing_injections -= 1;
            return Err(OutputError::InjectionFailed(
                "scripted injection failure".to_string(),
            ));
        }

        {
            let mut surface = self.surface.lock();
            for event in batch.events() {
                surface.apply(event.key);
            }
        }
        self.injected.push(batch.clone());
        self.queue_echoes(batch);
        Ok(())
    }

    fn can_suppress(&self) -> bool {
        self.suppress
    }

    fn echoes_injected(&self) -> bool {
        self.echo != EchoMode::None
    }

    fn lock_state(&self) -> LockState {
        self.locks
    }

    async fn stop(&mut self) -> Result<(), InputError> {
        self.started = false;
        // Like the evdev backend, nothing stays held for the application
        self.app_modifiers.release_all();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_apply() {
        let mut surface = TextSurface::new();
        surface.insert('a');
        surface.apply(SyntheticKey::Backspace);
        surface.apply(SyntheticKey::Char('â'));
        assert_eq!(surface.text(), "â");
    }

    #[test]
    fn test_type_text_uses_shift() {
        let mut backend = FakeBackend::new();
        backend.type_text("A");
        assert_eq!(
            backend.queue.iter().copied().collect::<Vec<_>>(),
            vec![
                InputEvent::key_down(KeyCode::LEFTSHIFT),
                InputEvent::key_down(KeyCode::A),
                InputEvent::key_up(KeyCode::A),
                InputEvent::key_up(KeyCode::LEFTSHIFT),
            ]
        );
    }

    #[tokio::test]
    async fn test_forward_types_into_surface() {
        let mut backend = FakeBackend::new();
        backend.start().await.unwrap();
        backend.type_text("Hi!");
        while let Some(event) = backend.poll_next_event().await.unwrap() {
            backend.forward(&event).await.unwrap();
        }
        assert_eq!(backend.surface().text(), "Hi!");
    }

    #[tokio::test]
    async fn test_unflagged_echoes_jump_the_queue() {
        let mut backend = FakeBackend::new().with_echo(EchoMode::Unflagged);
        backend.start().await.unwrap();
        backend.type_text("b");

        let batch = SyntheticBatch::replace_previous('a', 'â', None, false);
        backend.inject(&batch).await.unwrap();

        let first = backend.poll_next_event().await.unwrap();
        assert_eq!(first, Some(InputEvent::key_down(KeyCode::BACKSPACE)));
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let mut backend = FakeBackend::new().fail_injections(1);
        let batch = SyntheticBatch::replace_previous('a', 'â', None, false);
        assert!(backend.inject(&batch).await.is_err());
        assert!(backend.inject(&batch).await.is_ok());
        assert_eq!(backend.surface().text(), "â");
    }

    #[tokio::test]
    async fn test_stop_releases_held_modifiers() {
        let mut backend = FakeBackend::new();
        backend.start().await.unwrap();
        backend
            .forward(&InputEvent::key_down(KeyCode::LEFTSHIFT))
            .await
            .unwrap();
        backend.stop().await.unwrap();

        backend.start().await.unwrap();
        backend.forward(&InputEvent::key_down(KeyCode::A)).await.unwrap();
        assert_eq!(backend.surface().text(), "a");
    }

    #[tokio::test]
    async fn test_poll_before_start_fails() {
        let mut backend = FakeBackend::new();
        assert!(backend.poll_next_event().await.is_err());
    }
}
