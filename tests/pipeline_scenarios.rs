//! End-to-end composition scenarios against the scripted backend
//!
//! Each test types keys into a FakeBackend, runs the same pipeline the
//! daemon runs, and checks what the application ends up showing.

use viethook::config::Config;
use viethook::daemon::{gate_options, run_pipeline};
use viethook::gate::{CompositionGate, GateState, PointerResetPolicy};
use viethook::input::fake::{EchoMode, FakeBackend};
use viethook::input::{Button, InputBackend, InputEvent};
use viethook::keys::KeyCode;
use viethook::method::{Method, TELEX, VNI};
use viethook::modifiers::LockState;
use viethook::synthesis::SyntheticKey;

/// Run the backend to completion and return the final gate
async fn run(
    method: &'static Method,
    config: &Config,
    backend: &mut FakeBackend,
) -> CompositionGate {
    backend.start().await.unwrap();
    let mut gate = CompositionGate::new(method, gate_options(config, backend));
    run_pipeline(&mut gate, backend).await.unwrap();
    gate
}

async fn type_with(method: &'static Method, text: &str) -> String {
    let mut backend = FakeBackend::new();
    backend.type_text(text);
    run(method, &Config::default(), &mut backend).await;
    backend.surface().text()
}

#[tokio::test]
async fn test_circumflex_then_tone() {
    let mut backend = FakeBackend::new();
    backend.type_text("aas");
    let gate = run(&TELEX, &Config::default(), &mut backend).await;

    assert_eq!(backend.surface().text(), "ấ");
    assert_eq!(gate.state(), GateState::Composing);

    let batches = backend.injected();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].deletes(), 1);
    assert_eq!(batches[0].text(), "â");
    assert_eq!(batches[1].text(), "ấ");
}

#[tokio::test]
async fn test_repeated_trigger_reverts_and_types_it() {
    assert_eq!(type_with(&TELEX, "aass").await, "âs");
    assert_eq!(type_with(&TELEX, "ooo").await, "oo");
}

#[tokio::test]
async fn test_tone_key_after_consonant_is_plain() {
    assert_eq!(type_with(&TELEX, "bs").await, "bs");
    assert_eq!(type_with(&TELEX, "dd").await, "đ");
}

#[tokio::test]
async fn test_sentence() {
    assert_eq!(
        type_with(&TELEX, "Tooi yeeu tieesng Vieejt").await,
        "Tôi yêu tiếng Việt"
    );
}

#[tokio::test]
async fn test_vni_clear_marks_types_the_digit() {
    assert_eq!(type_with(&VNI, "u71").await, "ứ");
    assert_eq!(type_with(&VNI, "u710").await, "u0");
}

#[tokio::test]
async fn test_caps_lock_composes_uppercase() {
    let mut backend = FakeBackend::new().with_locks(LockState {
        caps_lock: true,
        ..Default::default()
    });
    backend.type_text("aaf");
    run(&TELEX, &Config::default(), &mut backend).await;

    assert_eq!(backend.surface().text(), "Ầ");
}

#[tokio::test]
async fn test_navigation_key_resets_composition() {
    let mut backend = FakeBackend::new();
    backend.type_text("a");
    backend.push_all([
        InputEvent::key_down(KeyCode::HOME),
        InputEvent::key_up(KeyCode::HOME),
    ]);
    backend.type_text("a");
    let gate = run(&TELEX, &Config::default(), &mut backend).await;

    assert_eq!(backend.surface().text(), "aa");
    assert!(backend.injected().is_empty());
    assert_eq!(gate.state(), GateState::Idle);
}

#[tokio::test]
async fn test_ctrl_chord_resets_composition() {
    let mut backend = FakeBackend::new();
    backend.type_text("a");
    backend.push_all([
        InputEvent::key_down(KeyCode::LEFTCTRL),
        InputEvent::key_down(KeyCode::C),
        InputEvent::key_up(KeyCode::C),
        InputEvent::key_up(KeyCode::LEFTCTRL),
    ]);
    backend.type_text("a");
    run(&TELEX, &Config::default(), &mut backend).await;

    assert_eq!(backend.surface().text(), "aa");
}

#[tokio::test]
async fn test_click_elsewhere_resets_composition() {
    let mut backend = FakeBackend::new();
    backend.type_text("a");
    backend.push_all([
        InputEvent::click(Button::Primary, true, 100, 200),
        InputEvent::click(Button::Primary, false, 100, 200),
    ]);
    backend.type_text("a");
    run(&TELEX, &Config::default(), &mut backend).await;

    assert_eq!(backend.surface().text(), "aa");
}

#[tokio::test]
async fn test_click_in_place_keeps_composition() {
    let clicks = |backend: &mut FakeBackend| {
        backend.push_all([
            InputEvent::click(Button::Primary, true, 10, 10),
            InputEvent::click(Button::Primary, false, 10, 10),
        ]);
        backend.type_text("a");
        // Same column, different row
        backend.push_all([
            InputEvent::click(Button::Primary, true, 10, 40),
            InputEvent::click(Button::Primary, false, 10, 40),
        ]);
        backend.type_text("a");
    };

    let mut backend = FakeBackend::new();
    clicks(&mut backend);
    run(&TELEX, &Config::default(), &mut backend).await;
    assert_eq!(backend.surface().text(), "â");

    let mut config = Config::default();
    config.pointer.reset_policy = PointerResetPolicy::AnyAxis;
    let mut backend = FakeBackend::new();
    clicks(&mut backend);
    run(&TELEX, &config, &mut backend).await;
    assert_eq!(backend.surface().text(), "aa");
}

#[tokio::test]
async fn test_click_reset_can_be_disabled() {
    let mut config = Config::default();
    config.pointer.reset_on_click = false;

    let mut backend = FakeBackend::new();
    backend.type_text("a");
    backend.push(InputEvent::click(Button::Secondary, true, 500, 500));
    backend.type_text("a");
    run(&TELEX, &config, &mut backend).await;

    assert_eq!(backend.surface().text(), "â");
}

#[tokio::test]
async fn test_unflagged_echoes_are_swallowed() {
    let mut backend = FakeBackend::new().with_echo(EchoMode::Unflagged);
    backend.type_text("aas");
    let gate = run(&TELEX, &Config::default(), &mut backend).await;

    assert_eq!(backend.surface().text(), "ấ");
    assert_eq!(gate.pending_echoes(), 0);
}

#[tokio::test]
async fn test_flagged_echoes_are_swallowed() {
    let mut backend = FakeBackend::new().with_echo(EchoMode::Flagged);
    backend.type_text("ddaa");
    let gate = run(&TELEX, &Config::default(), &mut backend).await;

    assert_eq!(backend.surface().text(), "đâ");
    assert_eq!(gate.pending_echoes(), 0);
}

#[tokio::test]
async fn test_without_suppression_deletes_the_trigger_too() {
    let mut backend = FakeBackend::new().without_suppression();
    backend.type_text("aas");
    run(&TELEX, &Config::default(), &mut backend).await;

    assert_eq!(backend.surface().text(), "ấ");
    let batch = &backend.injected()[0];
    assert_eq!(batch.deletes(), 2);
    assert_eq!(
        batch.events().last().map(|e| e.key),
        Some(SyntheticKey::Char('â'))
    );
}

#[tokio::test]
async fn test_failed_injection_keeps_typed_text() {
    let mut backend = FakeBackend::new().fail_injections(1);
    backend.type_text("aas");
    run(&TELEX, &Config::default(), &mut backend).await;

    assert_eq!(backend.surface().text(), "aá");
    assert_eq!(backend.injected().len(), 1);
}
