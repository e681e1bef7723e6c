//! viethook - System-wide Vietnamese input for Linux
//!
//! Run with `viethook` or `viethook daemon` to start the daemon.
//! Use `viethook check` to verify devices, permissions and output tools.
//! Use `viethook simulate <text>` to try a method without any device.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use viethook::cli::{Cli, Commands, OutputDriverOverride};
use viethook::config::{self, Config, OutputDriver};
use viethook::daemon::Daemon;
use viethook::method::Method;
use viethook::{output, simulate};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("viethook={},warn", log_level))),
        )
        .with_target(false)
        .init();

    // Load configuration
    let mut config = config::load_config(cli.config.as_deref())?;

    // Apply CLI overrides
    if let Some(method) = cli.method {
        config.method = method;
    }
    if let Some(driver) = cli.output {
        config.output.driver = match driver {
            OutputDriverOverride::Auto => OutputDriver::Auto,
            OutputDriverOverride::Wtype => OutputDriver::Wtype,
            OutputDriverOverride::Dotool => OutputDriver::Dotool,
            OutputDriverOverride::Ydotool => OutputDriver::Ydotool,
        };
    }
    if cli.no_grab {
        config.input.grab = false;
    }

    // Run the appropriate command
    match cli.command.unwrap_or(Commands::Daemon) {
        Commands::Daemon => {
            let mut daemon = Daemon::new(config)?;
            daemon.run().await?;
        }

        Commands::Config => {
            show_config(&config);
        }

        Commands::Methods => {
            show_methods(&config);
        }

        Commands::Simulate { text } => {
            let method = config.resolve_method()?;
            let composed = simulate::simulate(&config, method, &text).await?;
            println!("{}", composed);
        }

        Commands::Check => {
            run_check(&config);
        }
    }

    Ok(())
}

/// Show current configuration
fn show_config(config: &Config) {
    println!("Current Configuration\n");
    println!("=====================\n");

    println!("method = {:?}", config.method);

    println!("\n[input]");
    println!("  devices = {:?}", config.input.devices);
    println!("  grab = {}", config.input.grab);

    println!("\n[pointer]");
    println!("  reset_on_click = {}", config.pointer.reset_on_click);
    println!("  reset_policy = {:?}", config.pointer.reset_policy);

    println!("\n[output]");
    println!("  driver = {}", config.output.driver);
    println!("  type_delay_ms = {}", config.output.type_delay_ms);

    println!("\n---");
    println!(
        "Config file: {:?}",
        Config::default_path().unwrap_or_else(|| PathBuf::from("(not found)"))
    );
    println!("Lock directory: {:?}", Config::runtime_dir());
}

/// List built-in methods and their mark keys
fn show_methods(config: &Config) {
    for method in Method::all() {
        let active = if method.name.eq_ignore_ascii_case(config.method.trim()) {
            " (active)"
        } else {
            ""
        };
        println!("{}{}", method, active);

        for rule in method.rules {
            let conversions: Vec<String> =
                rule.conversions.iter().map(|c| c.to_string()).collect();
            println!("  {}  {}", rule.trigger as char, conversions.join(", "));
        }
        println!();
    }
}

/// Check devices, permissions and output tools
fn run_check(config: &Config) {
    println!("viethook Check\n");
    println!("==============\n");

    let mut all_ok = true;

    println!("Checking input method...");
    match config.resolve_method() {
        Ok(method) => println!("  ✓ {}", method),
        Err(e) => {
            println!("  ✗ {}", e);
            all_ok = false;
        }
    }

    println!("\nChecking input group membership...");
    let in_group = std::process::Command::new("groups")
        .output()
        .map(|out| String::from_utf8_lossy(&out.stdout).split_whitespace().any(|g| g == "input"))
        .unwrap_or(false);
    if in_group {
        println!("  ✓ User is in 'input' group");
    } else {
        println!("  ✗ User is NOT in 'input' group");
        println!("    Run: sudo usermod -aG input $USER");
        println!("    Then log out and back in");
        all_ok = false;
    }

    all_ok &= check_devices(config);

    println!("\nChecking output tools...");
    let mut any_tool = false;
    for sink in output::configured_sinks(&config.output) {
        if sink.is_available() {
            println!("  ✓ {} found", sink.name());
            any_tool = true;
        } else {
            println!("  ✗ {} not found", sink.name());
        }
    }
    if !any_tool {
        println!("    Install wtype (Wayland), dotool or ydotool via your package manager");
        all_ok = false;
    }

    println!("\n---");
    if all_ok {
        println!("✓ All checks passed! Run 'viethook' to start.");
    } else {
        println!("✗ Some checks failed. Please fix the issues above.");
    }
}

#[cfg(target_os = "linux")]
fn check_devices(config: &Config) -> bool {
    use viethook::input::evdev_backend::{self, DeviceRole};

    let mut ok = true;

    println!("\nChecking input devices...");
    match evdev_backend::discover_devices(&config.input) {
        Ok(devices) => {
            for device in &devices {
                let role = match device.role {
                    DeviceRole::Keyboard => "keyboard",
                    DeviceRole::Pointer => "pointer",
                };
                println!("  ✓ {}: {} ({})", role, device.name, device.path.display());
            }
            if !devices.iter().any(|d| d.role == DeviceRole::Keyboard) {
                println!("  ✗ No keyboard found");
                ok = false;
            }
        }
        Err(e) => {
            println!("  ✗ {}", e);
            ok = false;
        }
    }

    if config.input.grab {
        println!("\nChecking /dev/uinput...");
        match std::fs::OpenOptions::new().write(true).open("/dev/uinput") {
            Ok(_) => println!("  ✓ /dev/uinput is writable"),
            Err(e) => {
                println!("  ✗ Cannot open /dev/uinput: {}", e);
                println!("    Grabbing keyboards needs it; or run with --no-grab");
                ok = false;
            }
        }
    }

    ok
}

#[cfg(not(target_os = "linux"))]
fn check_devices(_config: &Config) -> bool {
    println!("\nChecking input devices...");
    println!("  ✗ System-wide input is only supported on Linux");
    false
}
