//! Daemon module - main event loop orchestration
//!
//! Drives one input backend through the composition gate: every event is
//! handled to completion before the next one is read, so the gate never
//! sees concurrent mutation.

use crate::config::Config;
use crate::error::{InputError, Result, ViethookError};
use crate::gate::{CompositionGate, Decision, GateOptions};
use crate::input::{self, InputBackend, InputEvent};
use crate::method::Method;
use pidlock::Pidlock;
use tokio::signal::unix::{signal, SignalKind};

/// Gate options for this configuration and backend
pub fn gate_options(config: &Config, backend: &dyn InputBackend) -> GateOptions {
    GateOptions {
        reset_on_click: config.pointer.reset_on_click,
        pointer_policy: config.pointer.reset_policy,
        extra_delete: !backend.can_suppress(),
        arm_echo_credits: backend.echoes_injected(),
        locks: backend.lock_state(),
    }
}

/// Handle one event end to end
///
/// If the synthetic batch cannot be delivered, composition falls back to
/// plain text and the original key is forwarded so nothing typed is lost.
pub async fn process_event(
    gate: &mut CompositionGate,
    backend: &mut dyn InputBackend,
    event: InputEvent,
) -> std::result::Result<(), InputError> {
    match gate.handle(&event) {
        Decision::PassThrough => backend.forward(&event).await,
        Decision::Swallow => Ok(()),
        Decision::Suppress(mut batch) => {
            for synthetic in batch.events_mut() {
                backend.mark_self_originated(synthetic);
            }

            if let Err(e) = backend.inject(&batch).await {
                tracing::warn!("Could not type composed letter: {}", e);
                gate.recover_failed_injection(&batch);
                backend.forward(&event).await?;
            }
            Ok(())
        }
    }
}

/// Process events until the backend's source closes
pub async fn run_pipeline(
    gate: &mut CompositionGate,
    backend: &mut dyn InputBackend,
) -> std::result::Result<(), InputError> {
    while let Some(event) = backend.poll_next_event().await? {
        process_event(gate, backend, event).await?;
    }
    Ok(())
}

/// Main daemon that owns the configuration and the selected method
pub struct Daemon {
    config: Config,
    method: &'static Method,
}

impl Daemon {
    /// Create a new daemon; an unknown method name is fatal here
    pub fn new(config: Config) -> Result<Self> {
        let method = config.resolve_method()?;
        Ok(Self { config, method })
    }

    /// Run the daemon main loop
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!("Starting viethook daemon");

        let mut pidlock = acquire_instance_lock()?;

        let mut sigterm = signal(SignalKind::terminate()).map_err(|e| {
            ViethookError::Config(format!("Failed to set up SIGTERM handler: {}", e))
        })?;

        let mut backend = input::create_backend(&self.config)?;
        backend.start().await?;

        let options = gate_options(&self.config, backend.as_ref());
        let mut gate = CompositionGate::new(self.method, options);

        tracing::info!(
            "Ready: {} input via {} ({})",
            gate.method(),
            backend.name(),
            if options.extra_delete {
                "keyboards not grabbed"
            } else {
                "keyboards grabbed"
            }
        );

        let result = loop {
            tokio::select! {
                event = backend.poll_next_event() => {
                    match event {
                        Ok(Some(event)) => {
                            if let Err(e) = process_event(&mut gate, backend.as_mut(), event).await {
                                break Err(e);
                            }
                        }
                        Ok(None) => {
                            tracing::warn!("Input source closed, shutting down...");
                            break Ok(());
                        }
                        Err(e) => break Err(e),
                    }
                }

                // Handle graceful shutdown (SIGINT from Ctrl+C)
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT, shutting down...");
                    break Ok(());
                }

                // Handle graceful shutdown (SIGTERM from systemctl stop)
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, shutting down...");
                    break Ok(());
                }
            }
        };

        // Cleanup
        if let Err(e) = backend.stop().await {
            tracing::warn!("Failed to stop input backend: {}", e);
        }
        if let Err(e) = pidlock.release() {
            tracing::warn!("Failed to release daemon lock: {:?}", e);
        }

        tracing::info!("Daemon stopped");

        result.map_err(ViethookError::from)
    }
}

/// Single instance check
fn acquire_instance_lock() -> Result<Pidlock> {
    let runtime_dir = Config::runtime_dir();
    std::fs::create_dir_all(&runtime_dir)?;

    let lock_path = runtime_dir.join("daemon.lock");
    let lock_path_str = lock_path.to_string_lossy().to_string();
    let mut pidlock = Pidlock::new(&lock_path_str);

    pidlock
        .acquire()
        .map_err(|_| ViethookError::AlreadyRunning(lock_path_str.clone()))?;
    tracing::debug!("Acquired daemon lock: {}", lock_path_str);

    Ok(pidlock)
}
