//! Key generation command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use versecrypt::crypto::{fingerprint, write_private_file, Curve, EcKeyManager, KeyManager};
use versecrypt::Config;

use super::CommandExecutor;

/// Generate a new identity key pair.
#[derive(Args, Debug)]
pub struct KeygenCommand {
    /// Output path for keys (creates .pub and .key files)
    #[arg(short, long, default_value = "versecrypt")]
    pub output: PathBuf,

    /// Also write the key pair as a binary identity container (.id)
    #[arg(long)]
    pub container: bool,

    /// Curve to generate on (default: the configured curve, secp256r1)
    #[arg(long)]
    pub curve: Option<Curve>,
}

impl CommandExecutor for KeygenCommand {
    fn execute(&self, config: &Config) -> Result<()> {
        let manager = match self.curve {
            Some(curve) => EcKeyManager::new(curve).with_keygen_attempts(config.keygen_attempts()),
            None => config.key_manager(),
        };
        let keypair = manager
            .generate_identity_key_pair()
            .context("Failed to generate key pair")?;

        keypair
            .save_to_files(&self.output)
            .context("Failed to save key pair")?;

        let pub_path = self.output.with_extension("pub");
        let key_path = self.output.with_extension("key");

        println!("Key pair generated successfully ({}):", manager.curve());
        println!("  Public key:  {}", pub_path.display());
        println!("  Private key: {}", key_path.display());

        if self.container {
            let id_path = self.output.with_extension("id");
            write_private_file(&id_path, keypair.to_container_bytes().as_slice())
                .with_context(|| format!("Failed to write {}", id_path.display()))?;

            println!("  Container:   {}", id_path.display());
        }

        println!();
        println!("Fingerprint: {}", fingerprint(keypair.public_key()));
        println!();
        println!("Share your public key (.pub) with the people you talk to,");
        println!("and compare fingerprints with them over another channel.");
        println!("Keep your private key (.key) secret.");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct KeygenCli {
        #[command(flatten)]
        keygen: KeygenCommand,
    }

    #[test]
    fn test_curve_flag_accepts_aliases() {
        for name in ["secp256r1", "prime256v1", "P-256"] {
            let cli = KeygenCli::try_parse_from(["keygen", "--curve", name]).unwrap();
            assert_eq!(cli.keygen.curve, Some(Curve::P256));
        }

        let cli = KeygenCli::try_parse_from(["keygen"]).unwrap();
        assert_eq!(cli.keygen.curve, None);
    }

    #[test]
    fn test_curve_flag_rejects_unknown_curve() {
        assert!(KeygenCli::try_parse_from(["keygen", "--curve", "secp384r1"]).is_err());
    }
}
