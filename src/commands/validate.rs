//! Validate command - check that text only uses corpus words.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use versecrypt::{Config, PoeticDecoder};

use super::{load_codec, read_text, CommandExecutor};

/// Check whether text could have come from the encoder.
///
/// Exits with an error if the text is empty or contains a word outside
/// the corpus.
#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// File holding the words ("-" or omitted for stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

impl CommandExecutor for ValidateCommand {
    fn execute(&self, config: &Config) -> Result<()> {
        let text = read_text(self.input.as_deref())?;
        let codec = load_codec(config)?;

        if !codec.try_validate(&text).context("Failed to validate text")? {
            bail!("Text contains words outside the corpus");
        }

        println!("valid ({} words)", text.split_whitespace().count());
        Ok(())
    }
}
