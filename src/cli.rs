// Command-line interface definitions for viethook
//
// This module is separate so it can be used by both the binary (main.rs)
// and build.rs for generating man pages.

use clap::{Parser, Subcommand, ValueEnum};

/// Mark keys of the built-in methods, shown by --help and in the man page
pub const METHOD_KEYS_HELP: &str = "\
INPUT METHODS:
  telex  s acute, f grave, r hook above, x tilde, j dot below, z clear marks
         aa â, ee ê, oo ô, dd đ, aw ă, ow ơ, uw ư
  vni    1 acute, 2 grave, 3 hook above, 4 tilde, 5 dot below, 0 clear marks
         6 circumflex, 7 horn, 8 breve, 9 stroke (d9 đ)

  Marks apply to the letter typed just before the mark key.
  Run 'viethook methods' for the tables the daemon actually uses.
";

#[derive(Parser)]
#[command(name = "viethook")]
#[command(author, version, about = "System-wide Vietnamese input for Linux")]
#[command(long_about = "
viethook is a system-wide Vietnamese input method for Linux.
It reads the keyboard at the kernel level, so it works the same on every
Wayland compositor, on X11 and on the console.

Type a letter, then its mark keys: with Telex, 'aa' gives 'â' and 'as'
gives 'á'. Pressing a mark key twice removes the mark and types the key.

SETUP:
  1. Add yourself to the input group: sudo usermod -aG input $USER
  2. Log out and back in
  3. Install wtype (Wayland), dotool or ydotool for typing support
  4. Run: viethook check (to verify devices and tools)
  5. Run: viethook (to start the daemon)
")]
#[command(after_long_help = METHOD_KEYS_HELP)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Override input method (telex, vni)
    #[arg(short, long, value_name = "NAME")]
    pub method: Option<String>,

    /// Override the tool used to type composed letters
    #[arg(long, value_name = "DRIVER")]
    pub output: Option<OutputDriverOverride>,

    /// Don't grab keyboards (the trigger key is typed, then deleted)
    #[arg(long)]
    pub no_grab: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as daemon (default if no command specified)
    Daemon,

    /// Show current configuration
    Config,

    /// List input methods and their mark keys
    Methods,

    /// Compose text offline, as if it were typed with the active method
    Simulate {
        /// Keys to type, e.g. "tieesng vieetj"
        text: String,
    },

    /// Check input devices, permissions and output tools
    Check,
}

/// Output driver selectable from the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputDriverOverride {
    Auto,
    Wtype,
    Dotool,
    Ydotool,
}
