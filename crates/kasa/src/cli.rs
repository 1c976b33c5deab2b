//! Clap derive structures for the `kasa` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// kasa -- control TP-Link Kasa smart bulbs through the cloud
#[derive(Debug, Parser)]
#[command(
    name = "kasa",
    version,
    about = "Control Kasa smart bulbs from the command line",
    long_about = "Logs in to the TP-Link cloud, discovers the bulbs registered to the\n\
        account, and relays commands to them through the cloud gateway.\n\n\
        The account credential is kept in an encrypted settings file; the\n\
        passphrase protecting it is asked for on every run (or read from\n\
        KASA_PASSPHRASE).",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, env = "KASA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Cloud gateway base URL
    #[arg(
        long,
        env = "KASA_CLOUD_URL",
        default_value = kasa_api::DEFAULT_CLOUD_URL,
        global = true,
        hide = true
    )]
    pub cloud_url: String,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "KASA_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (0 disables the timeout)
    #[arg(long, env = "KASA_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        self == Self::On
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Discover and control bulbs
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Manage the settings file and stored credential
    Config(ConfigArgs),
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List the account's bulbs with their current state
    #[command(alias = "ls")]
    List,

    /// Show one bulb in detail, including its presets
    #[command(alias = "get")]
    Info {
        /// Bulb alias (exact match)
        alias: String,
    },

    /// Turn a bulb on at full brightness
    On {
        /// Bulb alias (exact match)
        alias: String,
    },

    /// Turn a bulb off
    Off {
        /// Bulb alias (exact match)
        alias: String,
    },

    /// Turn a bulb on at the brightness of one of its presets
    Preset {
        /// Bulb alias (exact match)
        alias: String,

        /// Zero-based position in the bulb's preset list
        index: usize,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Turn automatic login on startup on or off
    AutoConnect {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Prompt for the cloud username and password and store them encrypted
    SetCredentials,

    /// Show the settings file (credential redacted)
    Show,

    /// Delete the settings file and the stored credential
    Reset,
}
