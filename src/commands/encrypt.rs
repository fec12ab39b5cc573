//! Encrypt command - seal a message for a peer and disguise it as words.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use versecrypt::crypto::{fingerprint, AeadMessageCipher};
use versecrypt::{seal_verse, Config};

use super::{load_codec, load_identity, read_input, write_output, CommandExecutor, PeerArgs};

/// Encrypt a message for a peer and print it as verse.
///
/// The output is ready to paste into any chat app.
#[derive(Args, Debug)]
pub struct EncryptCommand {
    /// Your key pair (base path of .pub/.key, or an .id container)
    #[arg(short, long)]
    pub key: PathBuf,

    #[command(flatten)]
    pub peer: PeerArgs,

    /// Text message to encrypt (mutually exclusive with --input)
    #[arg(short, long, conflicts_with = "input")]
    pub message: Option<String>,

    /// File to encrypt ("-" for stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Write the verse to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CommandExecutor for EncryptCommand {
    fn execute(&self, config: &Config) -> Result<()> {
        let identity = load_identity(&self.key)?;
        let their_public = self.peer.resolve(config)?;

        let plaintext = match &self.message {
            Some(message) => message.as_bytes().to_vec(),
            None => read_input(self.input.as_deref())?,
        };

        let codec = load_codec(config)?;
        let mut verse = seal_verse(
            &codec,
            &AeadMessageCipher::new(),
            &plaintext,
            &identity,
            &their_public,
        )
        .context("Failed to encrypt message")?;
        verse.push('\n');

        info!(peer_fingerprint = %fingerprint(&their_public), bytes = plaintext.len(), "message sealed");
        write_output(self.output.as_deref(), verse.as_bytes())
    }
}
