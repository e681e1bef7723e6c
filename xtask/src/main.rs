//! Development tasks for viethook
//!
//! Usage:
//!   cargo xtask install    Install release binary to /usr/local/bin (requires sudo)
//!   cargo xtask uninstall  Remove binary and udev rule (requires sudo)
//!   cargo xtask udev       Let the input group open /dev/uinput (requires sudo)
//!   cargo xtask man        Build man pages into target/man

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

const BINARY_DEST: &str = "/usr/local/bin/viethook";
const UDEV_RULE_DEST: &str = "/etc/udev/rules.d/99-viethook-uinput.rules";
const UDEV_RULE: &str = "KERNEL==\"uinput\", GROUP=\"input\", MODE=\"0660\", OPTIONS+=\"static_node=uinput\"\n";

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    let Some(command) = args.first() else {
        print_help();
        return ExitCode::SUCCESS;
    };

    let result = match command.as_str() {
        "install" => install(),
        "uninstall" => uninstall(),
        "udev" => udev(),
        "man" => man(),
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_help();
            Err(anyhow::anyhow!("Unknown command"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    eprintln!(
        r#"
viethook development tasks

Usage: cargo xtask <COMMAND>

Commands:
  install    Build release binary and install to /usr/local/bin (requires sudo)
  uninstall  Remove viethook and its udev rule (requires sudo)
  udev       Install a udev rule so the input group can open /dev/uinput
  man        Generate man pages into target/man
"#
    );
}

/// Get the project root directory
fn project_root() -> anyhow::Result<PathBuf> {
    let dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => env::current_dir()?,
    };

    // xtask is in a subdirectory, go up one level
    Ok(dir.parent().unwrap_or(&dir).to_path_buf())
}

fn cargo_release(root: &Path, envs: &[(&str, &str)]) -> anyhow::Result<PathBuf> {
    let status = Command::new("cargo")
        .args(["build", "--release", "--bin", "viethook"])
        .envs(envs.iter().copied())
        .current_dir(root)
        .status()?;

    if !status.success() {
        anyhow::bail!("Build failed");
    }

    let binary = root.join("target/release/viethook");
    if !binary.exists() {
        anyhow::bail!("Binary not found at {:?}", binary);
    }
    Ok(binary)
}

fn sudo(args: &[&str], failure: &str) -> anyhow::Result<()> {
    let status = Command::new("sudo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{} (sudo required)", failure);
    }
    Ok(())
}

/// Build release binary and install to /usr/local/bin
fn install() -> anyhow::Result<()> {
    let root = project_root()?;

    println!("==> Building release binary...");
    let binary = cargo_release(&root, &[])?;
    let binary = binary.to_string_lossy();

    println!("==> Installing to {}...", BINARY_DEST);
    sudo(&["install", "-Dm755", &binary, BINARY_DEST], "Install failed")?;

    println!("==> Installed successfully!");
    println!();
    println!("Run 'viethook check' to verify devices and output tools.");

    let _ = Command::new(BINARY_DEST).arg("--version").status();

    Ok(())
}

/// Remove viethook and its udev rule
fn uninstall() -> anyhow::Result<()> {
    println!("==> Removing {}...", BINARY_DEST);
    sudo(&["rm", "-f", BINARY_DEST, UDEV_RULE_DEST], "Uninstall failed")?;

    println!("==> Uninstalled successfully!");
    Ok(())
}

/// Install the uinput udev rule and reload rules
fn udev() -> anyhow::Result<()> {
    let staged = env::temp_dir().join("99-viethook-uinput.rules");
    std::fs::write(&staged, UDEV_RULE)?;
    let staged = staged.to_string_lossy();

    println!("==> Installing {}...", UDEV_RULE_DEST);
    sudo(&["install", "-Dm644", &staged, UDEV_RULE_DEST], "Install failed")?;
    sudo(&["udevadm", "control", "--reload-rules"], "Reload failed")?;
    sudo(&["udevadm", "trigger", "--name-match=uinput"], "Trigger failed")?;

    println!("==> /dev/uinput is now writable by the input group");
    Ok(())
}

/// Build with man page generation enabled and copy pages to target/man
fn man() -> anyhow::Result<()> {
    let root = project_root()?;

    println!("==> Generating man pages...");
    cargo_release(&root, &[("VIETHOOK_GEN_MANPAGES", "1")])?;

    let dest = root.join("target/man");
    std::fs::create_dir_all(&dest)?;

    let build_dir = root.join("target/release/build");
    let mut copied = 0;
    for entry in std::fs::read_dir(&build_dir)? {
        let man_dir = entry?.path().join("out/man");
        if !man_dir.is_dir() {
            continue;
        }
        for page in std::fs::read_dir(&man_dir)? {
            let page = page?.path();
            if let Some(name) = page.file_name() {
                std::fs::copy(&page, dest.join(name))?;
                copied += 1;
            }
        }
    }

    if copied == 0 {
        anyhow::bail!("No man pages found under {:?}", build_dir);
    }

    println!("==> {} page(s) in {:?}", copied, dest);
    Ok(())
}
