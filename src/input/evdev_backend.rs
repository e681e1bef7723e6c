//! evdev-based input backend
//!
//! Reads key and pointer events from the Linux evdev interface. This works
//! on every Wayland compositor and on X11 because it sits below the display
//! server.
//!
//! Suppression works by grabbing each keyboard exclusively and re-emitting
//! every event the gate lets through on a uinput virtual keyboard. Without
//! a grab the real keystroke always reaches the application, so the gate
//! compensates with an extra delete.
//!
//! The user must be in the 'input' group to access /dev/input/* devices
//! and /dev/uinput.

use super::{Button, InputBackend, InputEvent, Position};
use crate::config::InputConfig;
use crate::error::{InputError, OutputError};
use crate::keys::{KeyCode, KeyTransition};
use crate::modifiers::LockState;
use crate::output::{self, SyntheticSink};
use crate::synthesis::{SyntheticBatch, SyntheticEvent};
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{
    AbsoluteAxisType, AttributeSet, Device, EventType, InputEventKind, Key, LedType,
    RelativeAxisType,
};
use std::collections::HashSet;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};

/// Name of the uinput device that carries re-emitted keystrokes
pub const VIRTUAL_KEYBOARD_NAME: &str = "viethook virtual keyboard";

/// Device names whose events are our own or another injector's output
const INJECTOR_NAMES: [&str; 3] = ["viethook", "ydotoold", "dotool"];

/// What a device is read for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRole {
    Keyboard,
    Pointer,
}

/// A device found under /dev/input
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    pub path: PathBuf,
    pub name: String,
    pub role: DeviceRole,
}

/// evdev-based input backend
pub struct EvdevBackend {
    /// Devices to read
    devices: Vec<DiscoveredDevice>,
    /// Grab keyboards so events can be withheld
    grab: bool,
    /// Output tools used for injection, in fallback order
    sinks: Vec<Box<dyn SyntheticSink>>,
    /// Re-emits forwarded keys while keyboards are grabbed
    virtual_device: Option<VirtualDevice>,
    /// Keys currently held down on the virtual device
    forwarded_down: HashSet<u16>,
    locks: LockState,
    rx: Option<mpsc::Receiver<InputEvent>>,
    /// Signal to stop the reader task
    stop_signal: Option<oneshot::Sender<()>>,
}

impl EvdevBackend {
    /// Discover devices for the configured input settings
    pub fn new(
        config: &InputConfig,
        sinks: Vec<Box<dyn SyntheticSink>>,
    ) -> Result<Self, InputError> {
        let devices = discover_devices(config)?;

        if !devices.iter().any(|d| d.role == DeviceRole::Keyboard) {
            return Err(InputError::NoKeyboard);
        }

        tracing::debug!(
            "Found {} input device(s): {:?}",
            devices.len(),
            devices.iter().map(|d| &d.path).collect::<Vec<_>>()
        );

        Ok(Self {
            devices,
            grab: config.grab,
            sinks,
            virtual_device: None,
            forwarded_down: HashSet::new(),
            locks: LockState::default(),
            rx: None,
            stop_signal: None,
        })
    }

    fn open_devices(&mut self) -> Result<Vec<(Device, DeviceRole)>, InputError> {
        let mut opened = Vec::with_capacity(self.devices.len());
        let mut forwarded_keys = AttributeSet::<Key>::new();

        for discovered in &self.devices {
            let mut device = match Device::open(&discovered.path) {
                Ok(device) => device,
                Err(e) => {
                    tracing::warn!("Failed to open {:?}: {}", discovered.path, e);
                    continue;
                }
            };

            if discovered.role == DeviceRole::Keyboard {
                if let Ok(leds) = device.get_led_state() {
                    self.locks.caps_lock |= leds.contains(LedType::LED_CAPSL);
                    self.locks.num_lock |= leds.contains(LedType::LED_NUML);
                    self.locks.scroll_lock |= leds.contains(LedType::LED_SCROLLL);
                }

                if self.grab {
                    device.grab().map_err(|e| {
                        InputError::Grab(format!("{} ({})", discovered.name, e))
                    })?;
                    if let Some(keys) = device.supported_keys() {
                        for key in keys.iter() {
                            forwarded_keys.insert(key);
                        }
                    }
                    tracing::debug!("Grabbed keyboard: {}", discovered.name);
                }
            }

            set_nonblocking(&device);
            tracing::debug!("Opened device (non-blocking): {:?}", discovered.path);
            opened.push((device, discovered.role));
        }

        if self.grab {
            let virtual_device = VirtualDeviceBuilder::new()
                .and_then(|builder| builder.name(VIRTUAL_KEYBOARD_NAME).with_keys(&forwarded_keys))
                .and_then(|builder| builder.build())
                .map_err(|e| InputError::VirtualDevice(e.to_string()))?;
            self.virtual_device = Some(virtual_device);
        }

        Ok(opened)
    }
}

#[async_trait::async_trait]
impl InputBackend for EvdevBackend {
    async fn start(&mut self) -> Result<(), InputError> {
        let devices = self.open_devices()?;
        if devices.is_empty() {
            return Err(InputError::NoKeyboard);
        }

        let (tx, rx) = mpsc::channel(256);
        let (stop_tx, stop_rx) = oneshot::channel();
        self.rx = Some(rx);
        self.stop_signal = Some(stop_tx);

        tracing::info!(
            "Reading {} device(s){}",
            devices.len(),
            if self.grab { ", keyboards grabbed" } else { "" }
        );

        tokio::task::spawn_blocking(move || {
            evdev_reader_loop(devices, tx, stop_rx);
        });

        Ok(())
    }

    async fn poll_next_event(&mut self) -> Result<Option<InputEvent>, InputError> {
        let rx = self.rx.as_mut().ok_or(InputError::SourceClosed)?;
        Ok(rx.recv().await)
    }

    async fn forward(&mut self, event: &InputEvent) -> Result<(), InputError> {
        // Pointers are never grabbed, and ungrabbed keyboards deliver natively
        let InputEvent::Key {
            code, transition, ..
        } = *event
        else {
            return Ok(());
        };
        let Some(virtual_device) = self.virtual_device.as_mut() else {
            return Ok(());
        };

        // A release only goes out if its press did
        match transition {
            KeyTransition::Up => {
                if !self.forwarded_down.remove(&code.code()) {
                    return Ok(());
                }
            }
            KeyTransition::Down | KeyTransition::Repeat => {
                self.forwarded_down.insert(code.code());
            }
        }

        virtual_device
            .emit(&[evdev::InputEvent::new(
                EventType::KEY,
                code.code(),
                transition.value(),
            )])
            .map_err(|e| InputError::Evdev(format!("Failed to re-emit key: {}", e)))
    }

    fn mark_self_originated(&self, event: &mut SyntheticEvent) {
        event.self_originated = true;
    }

    async fn inject(&mut self, batch: &SyntheticBatch) -> Result<(), OutputError> {
        output::deliver_with_fallback(&self.sinks, batch).await
    }

    fn can_suppress(&self) -> bool {
        self.grab
    }

    fn echoes_injected(&self) -> bool {
        // Injector devices are skipped at discovery
        false
    }

    fn lock_state(&self) -> LockState {
        self.locks
    }

    async fn stop(&mut self) -> Result<(), InputError> {
        if let Some(stop) = self.stop_signal.take() {
            let _ = stop.send(());
        }
        // Release anything still held so no key sticks after exit
        if let Some(virtual_device) = self.virtual_device.as_mut() {
            for code in self.forwarded_down.drain() {
                let _ = virtual_device.emit(&[evdev::InputEvent::new(EventType::KEY, code, 0)]);
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "evdev"
    }
}

/// Set a device to non-blocking mode so fetch_events doesn't block
fn set_nonblocking(device: &Device) {
    let fd = device.as_raw_fd();
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags != -1 {
            libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
        }
    }
}

/// Main reader loop running in a blocking task
///
/// Serialises events from every device into one channel. The pointer
/// position is estimated from relative motion, or taken from absolute axes
/// when a device reports them.
fn evdev_reader_loop(
    mut devices: Vec<(Device, DeviceRole)>,
    tx: mpsc::Sender<InputEvent>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut position = Position::default();

    loop {
        match stop_rx.try_recv() {
            Ok(_) | Err(oneshot::error::TryRecvError::Closed) => {
                tracing::debug!("evdev reader stopping");
                return;
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
        }

        for (device, role) in &mut devices {
            let role = *role;
            let Ok(events) = device.fetch_events() else {
                continue;
            };

            for event in events {
                let translated = match event.kind() {
                    InputEventKind::Key(key) => translate_key(role, key, event.value(), position),
                    InputEventKind::RelAxis(axis) => {
                        if axis == RelativeAxisType::REL_X {
                            position.x = position.x.saturating_add(event.value());
                        } else if axis == RelativeAxisType::REL_Y {
                            position.y = position.y.saturating_add(event.value());
                        }
                        None
                    }
                    InputEventKind::AbsAxis(axis) => {
                        if axis == AbsoluteAxisType::ABS_X {
                            position.x = event.value();
                        } else if axis == AbsoluteAxisType::ABS_Y {
                            position.y = event.value();
                        }
                        None
                    }
                    _ => None,
                };

                if let Some(translated) = translated {
                    if tx.blocking_send(translated).is_err() {
                        return; // Channel closed
                    }
                }
            }
        }

        // Small sleep to avoid busy-waiting
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
}

/// Convert an evdev key event into the gate's model
fn translate_key(role: DeviceRole, key: Key, value: i32, position: Position) -> Option<InputEvent> {
    if let Some(button) = pointer_button(key) {
        let pressed = match value {
            1 => true,
            0 => false,
            _ => return None,
        };
        return Some(InputEvent::PointerButton {
            button,
            pressed,
            position,
        });
    }

    if role != DeviceRole::Keyboard {
        return None;
    }

    Some(InputEvent::Key {
        code: KeyCode(key.code()),
        transition: KeyTransition::from_value(value)?,
        injected: false,
    })
}

fn pointer_button(key: Key) -> Option<Button> {
    match key {
        Key::BTN_LEFT => Some(Button::Primary),
        Key::BTN_RIGHT => Some(Button::Secondary),
        Key::BTN_MIDDLE | Key::BTN_SIDE | Key::BTN_EXTRA => Some(Button::Other),
        _ => None,
    }
}

fn is_injector(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    INJECTOR_NAMES.iter().any(|injector| name.contains(injector))
}

/// Classify a device, or `None` if it is neither keyboard nor pointer
fn classify(device: &Device, grab: bool) -> Option<DeviceRole> {
    let keys = device.supported_keys()?;

    // A keyboard should have at least some letter keys
    let keyboard =
        keys.contains(Key::KEY_A) && keys.contains(Key::KEY_Z) && keys.contains(Key::KEY_ENTER);

    let has_axes = device
        .supported_relative_axes()
        .map(|axes| axes.contains(RelativeAxisType::REL_X))
        .unwrap_or(false)
        || device
            .supported_absolute_axes()
            .map(|axes| axes.contains(AbsoluteAxisType::ABS_X))
            .unwrap_or(false);
    let pointer = keys.contains(Key::BTN_LEFT) && has_axes;

    match (keyboard, pointer) {
        // Grabbing a combined receiver would freeze its pointer
        (true, true) if grab => Some(DeviceRole::Pointer),
        (true, _) => Some(DeviceRole::Keyboard),
        (false, true) => Some(DeviceRole::Pointer),
        (false, false) => None,
    }
}

/// Find keyboard and pointer devices
///
/// Uses the configured paths when given, otherwise scans /dev/input.
pub fn discover_devices(config: &InputConfig) -> Result<Vec<DiscoveredDevice>, InputError> {
    let candidates = if config.devices.is_empty() {
        scan_event_devices(Path::new("/dev/input"))?
    } else {
        config.devices.clone()
    };

    let mut found = Vec::new();
    for path in candidates {
        let device = match Device::open(&path) {
            Ok(device) => device,
            Err(e) => {
                // Permission denied is common for non-input-group users
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    return Err(InputError::DeviceAccess(path.display().to_string()));
                }
                // Other errors (device busy, etc.) - just skip
                tracing::trace!("Skipping {:?}: {}", path, e);
                continue;
            }
        };

        let name = device.name().unwrap_or("unknown").to_string();
        if is_injector(&name) {
            tracing::trace!("Skipping injector device {:?} ({})", path, name);
            continue;
        }

        let Some(role) = classify(&device, config.grab) else {
            continue;
        };
        if role == DeviceRole::Pointer && device_is_keyboard(&device) {
            tracing::warn!(
                "{} is a combined keyboard/pointer and is read as a pointer only; \
                 typing on it is not composed",
                name
            );
        }

        tracing::debug!("Found {:?}: {:?} ({})", role, path, name);
        found.push(DiscoveredDevice { path, name, role });
    }

    Ok(found)
}

fn device_is_keyboard(device: &Device) -> bool {
    device
        .supported_keys()
        .map(|keys| keys.contains(Key::KEY_A) && keys.contains(Key::KEY_ENTER))
        .unwrap_or(false)
}

fn scan_event_devices(dir: &Path) -> Result<Vec<PathBuf>, InputError> {
    let input_dir =
        std::fs::read_dir(dir).map_err(|e| InputError::DeviceAccess(format!("{}: {}", dir.display(), e)))?;

    let mut paths = Vec::new();
    for entry in input_dir {
        let entry = entry.map_err(|e| InputError::DeviceAccess(e.to_string()))?;
        let path = entry.path();

        // Only look at event* devices
        let is_event_device = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("event"))
            .unwrap_or(false);

        if is_event_device {
            paths.push(path);
        }
    }
    paths.sort();

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injectors_skipped() {
        assert!(is_injector(VIRTUAL_KEYBOARD_NAME));
        assert!(is_injector("ydotoold virtual device"));
        assert!(is_injector("Dotool Keyboard"));
        assert!(!is_injector("AT Translated Set 2 keyboard"));
    }

    #[test]
    fn test_translate_keyboard_key() {
        let event = translate_key(DeviceRole::Keyboard, Key::KEY_A, 1, Position::default());
        assert_eq!(event, Some(InputEvent::key_down(KeyCode::A)));

        let repeat = translate_key(DeviceRole::Keyboard, Key::KEY_A, 2, Position::default());
        assert_eq!(repeat, Some(InputEvent::key(KeyCode::A, KeyTransition::Repeat)));
    }

    #[test]
    fn test_translate_pointer_button() {
        let position = Position::new(12, -4);
        let event = translate_key(DeviceRole::Pointer, Key::BTN_LEFT, 1, position);
        assert_eq!(
            event,
            Some(InputEvent::PointerButton {
                button: Button::Primary,
                pressed: true,
                position,
            })
        );
    }

    #[test]
    fn test_pointer_device_keys_ignored() {
        assert_eq!(
            translate_key(DeviceRole::Pointer, Key::KEY_A, 1, Position::default()),
            None
        );
    }

    #[test]
    fn test_key_codes_match_evdev() {
        assert_eq!(KeyCode::A.code(), Key::KEY_A.code());
        assert_eq!(KeyCode::BACKSPACE.code(), Key::KEY_BACKSPACE.code());
        assert_eq!(KeyCode::KPENTER.code(), Key::KEY_KPENTER.code());
        assert_eq!(KeyCode::RIGHTALT.code(), Key::KEY_RIGHTALT.code());
        assert_eq!(KeyCode::DELETE.code(), Key::KEY_DELETE.code());
        assert_eq!(KeyCode::RIGHTMETA.code(), Key::KEY_RIGHTMETA.code());
    }

    #[test]
    fn test_scan_missing_dir() {
        let result = scan_event_devices(Path::new("/nonexistent/input"));
        assert!(matches!(result, Err(InputError::DeviceAccess(_))));
    }
}
