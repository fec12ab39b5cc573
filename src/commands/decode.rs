//! Decode command - turn corpus words back into bytes.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use versecrypt::{Config, PoeticDecoder};

use super::{load_codec, read_text, write_output, CommandExecutor};

/// Decode words back into the original bytes (no decryption).
///
/// Fails on the first word that is not in the corpus.
#[derive(Args, Debug)]
pub struct DecodeCommand {
    /// File holding the words ("-" or omitted for stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file for decoded bytes (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CommandExecutor for DecodeCommand {
    fn execute(&self, config: &Config) -> Result<()> {
        let text = read_text(self.input.as_deref())?;
        let codec = load_codec(config)?;
        let data = codec.decode(&text).context("Failed to decode words")?;

        write_output(self.output.as_deref(), &data)
    }
}
