//! Encode command - turn raw bytes into corpus words.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use versecrypt::{Config, PoeticEncoder};

use super::{load_codec, read_input, write_output, CommandExecutor};

/// Encode bytes as words from the corpus (no encryption).
///
/// Input comes from --message, --input, or stdin.
#[derive(Args, Debug)]
pub struct EncodeCommand {
    /// Text to encode
    #[arg(short, long, conflicts_with = "input")]
    pub message: Option<String>,

    /// File to encode ("-" for stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Write the words to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CommandExecutor for EncodeCommand {
    fn execute(&self, config: &Config) -> Result<()> {
        let data = match &self.message {
            Some(message) => message.as_bytes().to_vec(),
            None => read_input(self.input.as_deref())?,
        };

        let codec = load_codec(config)?;
        let mut text = codec.encode(&data).context("Failed to encode input")?;
        text.push('\n');

        write_output(self.output.as_deref(), text.as_bytes())
    }
}
