//! Build script for viethook
//!
//! Renders man pages from the CLI definitions with clap_mangen, then adds
//! the sections clap has no notion of: files and devices the daemon
//! touches, and the environment variables it reads.

use clap::CommandFactory;
use clap_mangen::Man;
use std::env;
use std::fs::{self, File};
use std::io::{Error, Write};
use std::path::{Path, PathBuf};

// Include the CLI module
include!("src/cli.rs");

const FILES_SECTION: &str = r#".SH FILES
.TP
\fI$XDG_CONFIG_HOME/viethook/config.toml\fR
Configuration: input method, devices, keyboard grab, pointer reset policy and output driver.
.TP
\fI$XDG_RUNTIME_DIR/viethook/daemon.lock\fR
Held while a daemon runs; a second daemon refuses to start.
.TP
\fI/dev/input/event*\fR
Keyboards and pointers read by the daemon. Requires membership of the input group.
.TP
\fI/dev/uinput\fR
Virtual keyboard that passes keys through while keyboards are grabbed.
"#;

const ENVIRONMENT_SECTION: &str = r#".SH ENVIRONMENT
.TP
\fBVIETHOOK_METHOD\fR
Input method (telex, vni). Overrides the config file.
.TP
\fBVIETHOOK_OUTPUT\fR
Output driver (auto, wtype, dotool, ydotool). Overrides the config file.
.TP
\fBRUST_LOG\fR
Log filter. Overrides \-v and \-q.
"#;

fn write_page(path: &Path, cmd: clap::Command, sections: &[&str]) -> Result<(), Error> {
    let mut file = File::create(path)?;
    Man::new(cmd).render(&mut file)?;
    for section in sections {
        file.write_all(section.as_bytes())?;
    }
    Ok(())
}

fn main() -> Result<(), Error> {
    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-env-changed=VIETHOOK_GEN_MANPAGES");

    // Only generate man pages for release builds or when explicitly requested
    let profile = env::var("PROFILE").unwrap_or_default();
    if env::var("VIETHOOK_GEN_MANPAGES").is_err() && profile != "release" {
        return Ok(());
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap_or_else(|_| "target".to_string()));
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir)?;

    // viethook.1 carries the method keys (after_long_help) plus files and environment
    let cmd = Cli::command();
    write_page(
        &man_dir.join("viethook.1"),
        cmd.clone(),
        &[FILES_SECTION, ENVIRONMENT_SECTION],
    )?;

    for subcommand in cmd.get_subcommands() {
        let name = subcommand.get_name();
        if name == "help" {
            continue;
        }

        // Daemon and check touch the listed files; config reads the environment
        let sections: &[&str] = match name {
            "check" | "daemon" => &[FILES_SECTION],
            "config" => &[ENVIRONMENT_SECTION],
            _ => &[],
        };
        write_page(
            &man_dir.join(format!("viethook-{}.1", name)),
            subcommand.clone(),
            sections,
        )?;
    }

    Ok(())
}
