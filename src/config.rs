//! Configuration loading and types for viethook
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/viethook/config.toml)
//! 3. Environment variables (VIETHOOK_*)
//! 4. CLI arguments (highest priority)

use crate::error::ViethookError;
use crate::gate::PointerResetPolicy;
use crate::method::Method;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = r#"# viethook Configuration
#
# Location: ~/.config/viethook/config.toml
# All settings can be overridden via CLI flags

# Input method: "telex" or "vni"
# - telex: letters carry the marks (aa = â, dd = đ, s = acute, z = clear)
# - vni: number keys carry the marks (6 = circumflex, 1 = acute, 0 = clear)
method = "telex"

[input]
# Input devices to read. Empty means auto-detect every keyboard and
# pointer under /dev/input.
# Example: devices = ["/dev/input/event3", "/dev/input/event7"]
devices = []

# Grab keyboards exclusively so composed keystrokes never reach the
# application. Requires write access to /dev/uinput. When disabled the
# trigger key is typed and then deleted again.
grab = true

[pointer]
# Forget the letter being composed when a click lands somewhere else
reset_on_click = true

# When a click counts as "somewhere else":
# - all_axes: both x and y differ from the last release (default)
# - any_axis: either coordinate differs
reset_policy = "all_axes"

[output]
# Tool used to type composed letters: "auto", "wtype", "dotool", "ydotool"
# auto tries wtype, then dotool, then ydotool
driver = "auto"

# Delay between typed keystrokes (ms), 0 for fastest
type_delay_ms = 0
"#;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Input method name, resolved at startup
    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub pointer: PointerConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Input device configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// Explicit device paths; empty means auto-detect
    #[serde(default)]
    pub devices: Vec<PathBuf>,

    /// Grab keyboards so composed keystrokes can be withheld
    #[serde(default = "default_true")]
    pub grab: bool,
}

/// Pointer handling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PointerConfig {
    #[serde(default = "default_true")]
    pub reset_on_click: bool,

    #[serde(default)]
    pub reset_policy: PointerResetPolicy,
}

/// Synthetic keystroke output configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub driver: OutputDriver,

    /// Delay between typed keystrokes (ms), 0 for fastest
    #[serde(default)]
    pub type_delay_ms: u32,
}

/// Output tool selection
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputDriver {
    /// wtype, then dotool, then ydotool
    #[default]
    Auto,
    Wtype,
    Dotool,
    Ydotool,
}

impl FromStr for OutputDriver {
    type Err = ViethookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(OutputDriver::Auto),
            "wtype" => Ok(OutputDriver::Wtype),
            "dotool" => Ok(OutputDriver::Dotool),
            "ydotool" => Ok(OutputDriver::Ydotool),
            other => Err(ViethookError::Config(format!(
                "Unknown output driver '{}'. Expected auto, wtype, dotool or ydotool",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputDriver::Auto => "auto",
            OutputDriver::Wtype => "wtype",
            OutputDriver::Dotool => "dotool",
            OutputDriver::Ydotool => "ydotool",
        };
        f.write_str(name)
    }
}

fn default_method() -> String {
    "telex".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            grab: true,
        }
    }
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            reset_on_click: true,
            reset_policy: PointerResetPolicy::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            method: default_method(),
            input: InputConfig::default(),
            pointer: PointerConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "viethook")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the runtime directory for ephemeral files (lock)
    pub fn runtime_dir() -> PathBuf {
        // Use XDG_RUNTIME_DIR if available, otherwise fall back to /tmp
        std::env::var("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
            .join("viethook")
    }

    /// Resolve the configured method name to a built-in scheme
    pub fn resolve_method(&self) -> Result<&'static Method, ViethookError> {
        Method::by_name(&self.method)
            .ok_or_else(|| ViethookError::UnknownMethod(self.method.clone()))
    }

    /// Apply VIETHOOK_* overrides using the given variable lookup
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ViethookError> {
        if let Some(method) = lookup("VIETHOOK_METHOD") {
            self.method = method;
        }
        if let Some(driver) = lookup("VIETHOOK_OUTPUT") {
            self.output.driver = driver.parse()?;
        }
        Ok(())
    }
}

/// Load configuration from file, with defaults for missing values
pub fn load_config(path: Option<&Path>) -> Result<Config, ViethookError> {
    // Start with defaults
    let mut config = Config::default();

    // Determine config file path
    let config_path = path.map(PathBuf::from).or_else(Config::default_path);

    // Load from file if it exists
    if let Some(ref path) = config_path {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path)
                .map_err(|e| ViethookError::Config(format!("Failed to read config: {}", e)))?;

            config = toml::from_str(&contents)
                .map_err(|e| ViethookError::Config(format!("Invalid config: {}", e)))?;
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
        }
    }

    // Override from environment variables
    config.apply_env(|name| std::env::var(name).ok())?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.method, "telex");
        assert!(config.input.devices.is_empty());
        assert!(config.input.grab);
        assert!(config.pointer.reset_on_click);
        assert_eq!(config.pointer.reset_policy, PointerResetPolicy::AllAxes);
        assert_eq!(config.output.driver, OutputDriver::Auto);
        assert_eq!(config.output.type_delay_ms, 0);
    }

    #[test]
    fn test_default_config_text_matches_defaults() {
        let parsed: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        let defaults = Config::default();
        assert_eq!(parsed.method, defaults.method);
        assert_eq!(parsed.input.grab, defaults.input.grab);
        assert_eq!(parsed.pointer.reset_policy, defaults.pointer.reset_policy);
        assert_eq!(parsed.output.driver, defaults.output.driver);
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
            method = "vni"

            [input]
            devices = ["/dev/input/event3"]
            grab = false

            [pointer]
            reset_policy = "any_axis"

            [output]
            driver = "dotool"
            type_delay_ms = 4
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.method, "vni");
        assert_eq!(config.input.devices, vec![PathBuf::from("/dev/input/event3")]);
        assert!(!config.input.grab);
        assert!(config.pointer.reset_on_click); // default
        assert_eq!(config.pointer.reset_policy, PointerResetPolicy::AnyAxis);
        assert_eq!(config.output.driver, OutputDriver::Dotool);
        assert_eq!(config.output.type_delay_ms, 4);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("method = \"vni\"").unwrap();
        assert!(config.input.grab);
        assert_eq!(config.output.driver, OutputDriver::Auto);
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let result: Result<Config, _> = toml::from_str("[pointer]\nreset_policy = \"sometimes\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\ndriver = \"wtype\"").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.output.driver, OutputDriver::Wtype);
    }

    #[test]
    fn test_load_config_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "method = [").unwrap();

        let result = load_config(Some(file.path()));
        assert!(matches!(result, Err(ViethookError::Config(_))));
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.method, "telex");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([("VIETHOOK_METHOD", "VNI"), ("VIETHOOK_OUTPUT", "ydotool")]);
        let mut config = Config::default();
        config
            .apply_env(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.resolve_method().unwrap().name, "vni");
        assert_eq!(config.output.driver, OutputDriver::Ydotool);
    }

    #[test]
    fn test_env_bad_driver() {
        let mut config = Config::default();
        let result = config.apply_env(|name| (name == "VIETHOOK_OUTPUT").then(|| "xdotool".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_method() {
        let config = Config {
            method: "viqr".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.resolve_method(),
            Err(ViethookError::UnknownMethod(name)) if name == "viqr"
        ));
    }

    #[test]
    fn test_driver_round_trip_display() {
        for driver in [
            OutputDriver::Auto,
            OutputDriver::Wtype,
            OutputDriver::Dotool,
            OutputDriver::Ydotool,
        ] {
            assert_eq!(driver.to_string().parse::<OutputDriver>().unwrap(), driver);
        }
    }
}
