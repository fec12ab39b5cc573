//! Decrypt command - turn received verse back into the original message.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use versecrypt::crypto::{AeadMessageCipher, Role};
use versecrypt::{open_verse, Config};

use super::{load_codec, load_identity, read_text, write_output, CommandExecutor, PeerArgs};

/// Decrypt verse exchanged with a peer.
///
/// By default the peer is taken as the author. Pass --sent to re-read a
/// message you wrote to them.
#[derive(Args, Debug)]
pub struct DecryptCommand {
    /// Your key pair (base path of .pub/.key, or an .id container)
    #[arg(short, long)]
    pub key: PathBuf,

    #[command(flatten)]
    pub peer: PeerArgs,

    /// The message was written by you, not by the peer
    #[arg(long)]
    pub sent: bool,

    /// File holding the verse ("-" or omitted for stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file for the decrypted bytes (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CommandExecutor for DecryptCommand {
    fn execute(&self, config: &Config) -> Result<()> {
        let identity = load_identity(&self.key)?;
        let their_public = self.peer.resolve(config)?;

        let verse = read_text(self.input.as_deref())?;
        let codec = load_codec(config)?;
        let role = if self.sent { Role::Initiator } else { Role::Responder };
        let plaintext = open_verse(
            &codec,
            &AeadMessageCipher::new(),
            &verse,
            &identity,
            &their_public,
            role,
        )
        .context("Failed to decrypt message")?;

        write_output(self.output.as_deref(), &plaintext)
    }
}
