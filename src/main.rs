//! versecrypt - encrypted messages that read like verse
//!
//! A CLI for end-to-end encrypted messaging over any text channel: messages
//! are sealed for a peer and printed as lines of ordinary words.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use commands::{
    CommandExecutor, DecodeCommand, DecryptCommand, EncodeCommand, EncryptCommand,
    FingerprintCommand, KeygenCommand, PeersCommand, ValidateCommand,
};
use versecrypt::Config;

/// versecrypt - encrypted messages that read like verse
///
/// Seal a message for a peer with their public key, then send the
/// resulting lines of words over any chat app.
#[derive(Parser)]
#[command(name = "versecrypt")]
#[command(version)]
#[command(about = "Disguise end-to-end encrypted messages as plain verse")]
#[command(long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.versecrypt/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging on stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new identity key pair
    Keygen(KeygenCommand),

    /// Show a key's fingerprint for out-of-band verification
    Fingerprint(FingerprintCommand),

    /// Encode bytes as corpus words (no encryption)
    Encode(EncodeCommand),

    /// Decode corpus words back into bytes
    Decode(DecodeCommand),

    /// Check that text only uses corpus words
    Validate(ValidateCommand),

    /// Encrypt a message for a peer and print it as verse
    Encrypt(EncryptCommand),

    /// Decrypt verse exchanged with a peer
    Decrypt(DecryptCommand),

    /// Manage peer public keys
    Peers(PeersCommand),
}

impl Commands {
    fn executor(&self) -> &dyn CommandExecutor {
        match self {
            Commands::Keygen(cmd) => cmd,
            Commands::Fingerprint(cmd) => cmd,
            Commands::Encode(cmd) => cmd,
            Commands::Decode(cmd) => cmd,
            Commands::Validate(cmd) => cmd,
            Commands::Encrypt(cmd) => cmd,
            Commands::Decrypt(cmd) => cmd,
            Commands::Peers(cmd) => cmd,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    cli.command.executor().execute(&config)
}
