//! Offline composition
//!
//! Types a string through the same gate and event loop the daemon uses,
//! against the scripted backend, and returns what the application would
//! show. Handy for trying a method without touching any device.

use crate::config::Config;
use crate::daemon;
use crate::error::Result;
use crate::gate::CompositionGate;
use crate::input::fake::FakeBackend;
use crate::input::InputBackend;
use crate::method::Method;

/// Compose `text` as if its keys were typed one after another
pub async fn simulate(config: &Config, method: &'static Method, text: &str) -> Result<String> {
    let mut backend = FakeBackend::new();
    backend.type_text(text);
    backend.start().await?;

    let options = daemon::gate_options(config, &backend);
    let mut gate = CompositionGate::new(method, options);
    daemon::run_pipeline(&mut gate, &mut backend).await?;
    backend.stop().await?;

    tracing::debug!(
        "Simulated {} key(s), {} composition(s)",
        text.chars().count(),
        backend.injected().len()
    );

    Ok(backend.surface().text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::{TELEX, VNI};

    async fn run(method: &'static Method, text: &str) -> String {
        simulate(&Config::default(), method, text).await.unwrap()
    }

    #[tokio::test]
    async fn test_telex_word() {
        assert_eq!(run(&TELEX, "tieesng").await, "tiếng");
        assert_eq!(run(&TELEX, "Vieejt Nam").await, "Việt Nam");
    }

    #[tokio::test]
    async fn test_marks_only_reach_the_last_letter() {
        assert_eq!(run(&TELEX, "tieengs").await, "tiêngs");
    }

    #[tokio::test]
    async fn test_double_trigger_types_literally() {
        assert_eq!(run(&TELEX, "ass").await, "as");
        assert_eq!(run(&TELEX, "ddd").await, "dd");
    }

    #[tokio::test]
    async fn test_vni_word() {
        assert_eq!(run(&VNI, "d9u7o72ng").await, "đường");
    }

    #[tokio::test]
    async fn test_plain_text_untouched() {
        assert_eq!(run(&TELEX, "ping pong, 42!").await, "ping pong, 42!");
    }
}
