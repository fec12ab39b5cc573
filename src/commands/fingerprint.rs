//! Fingerprint command - display key fingerprints for verification.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use sha2::{Digest, Sha256};

use versecrypt::crypto::{
    fingerprint, load_private_key, load_public_key, IdentityKeyPair, PublicKey,
};
use versecrypt::Config;

use super::CommandExecutor;

/// Grid size of the visual fingerprint (same as SSH randomart).
const ART_HEIGHT: usize = 9;
const ART_WIDTH: usize = 17;

/// Cell characters by visit count.
const ART_CHARS: [char; 15] = [
    ' ', '.', 'o', '+', '=', '*', 'B', 'O', 'X', '@', '%', '&', '#', '/', '^',
];

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FingerprintFormat {
    Hex,
    Art,
    All,
}

/// Display a key's fingerprint for out-of-band verification.
///
/// Compare fingerprints with your peer over a separate channel
/// (phone call, in person) before trusting their key.
///
/// Accepts public (.pub), private (.key) and container (.id) files.
#[derive(Args, Debug)]
pub struct FingerprintCommand {
    /// Path to the key file (.pub, .key or .id)
    #[arg(required = true)]
    pub key_path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = FingerprintFormat::All)]
    pub format: FingerprintFormat,
}

impl CommandExecutor for FingerprintCommand {
    fn execute(&self, _config: &Config) -> Result<()> {
        let public = load_any_public_key(&self.key_path)
            .with_context(|| format!("Failed to load key from {}", self.key_path.display()))?;

        println!("Key: {}", self.key_path.display());
        println!();

        match self.format {
            FingerprintFormat::Hex => print_hex(&public),
            FingerprintFormat::Art => print_art(&public),
            FingerprintFormat::All => {
                print_hex(&public);
                println!();
                print_art(&public);
            }
        }

        Ok(())
    }
}

/// Loads a public key from any of the key file kinds.
fn load_any_public_key(path: &Path) -> Result<PublicKey> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match ext {
        "pub" => Ok(load_public_key(path)?),
        "id" => {
            let bytes = zeroize::Zeroizing::new(std::fs::read(path)?);
            Ok(IdentityKeyPair::from_container_bytes(&bytes)?.public_key().clone())
        }
        _ => Ok(load_private_key(path)?.public_key()?),
    }
}

fn print_hex(key: &PublicKey) {
    println!("Fingerprint:");
    println!("  {}", fingerprint(key));
}

fn print_art(key: &PublicKey) {
    let hash: [u8; 32] = Sha256::digest(key.encoded()).into();
    println!("Visual Fingerprint:");
    for line in render_art(&hash) {
        println!("  {}", line);
    }
}

/// Drunken-bishop walk over the full SHA-256 of the key.
fn render_art(hash: &[u8; 32]) -> Vec<String> {
    let mut grid = [[0u8; ART_WIDTH]; ART_HEIGHT];
    let (start_x, start_y) = (ART_WIDTH / 2, ART_HEIGHT / 2);
    let (mut x, mut y) = (start_x, start_y);

    for byte in hash {
        for i in 0..4 {
            let step = (byte >> (i * 2)) & 0b11;

            if step & 0b10 == 0 {
                y = y.saturating_sub(1);
            } else if y < ART_HEIGHT - 1 {
                y += 1;
            }
            if step & 0b01 == 0 {
                x = x.saturating_sub(1);
            } else if x < ART_WIDTH - 1 {
                x += 1;
            }

            let cell = &mut grid[y][x];
            if (*cell as usize) < ART_CHARS.len() - 1 {
                *cell += 1;
            }
        }
    }

    let border = format!("+{}+", "-".repeat(ART_WIDTH));
    let mut lines = Vec::with_capacity(ART_HEIGHT + 2);
    lines.push(border.clone());

    for (row_idx, row) in grid.iter().enumerate() {
        let mut line = String::with_capacity(ART_WIDTH + 2);
        line.push('|');
        for (col_idx, &cell) in row.iter().enumerate() {
            let ch = if (col_idx, row_idx) == (start_x, start_y) {
                'S'
            } else if (col_idx, row_idx) == (x, y) {
                'E'
            } else {
                ART_CHARS[cell as usize]
            };
            line.push(ch);
        }
        line.push('|');
        lines.push(line);
    }

    lines.push(border);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use versecrypt::crypto::{EcKeyManager, KeyManager};

    #[test]
    fn test_art_shape() {
        let lines = render_art(&[0x5A; 32]);
        assert_eq!(lines.len(), ART_HEIGHT + 2);
        for line in &lines {
            assert_eq!(line.chars().count(), ART_WIDTH + 2);
        }
        assert_eq!(lines.iter().filter(|l| l.contains('S')).count(), 1);
    }

    #[test]
    fn test_art_deterministic_and_distinct() {
        let a = render_art(&[0x11; 32]);
        assert_eq!(a, render_art(&[0x11; 32]));
        assert_ne!(a, render_art(&[0xEE; 32]));
    }

    #[test]
    fn test_load_any_public_key() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("alice");
        let kp = EcKeyManager::default().generate_identity_key_pair().unwrap();
        kp.save_to_files(&base).unwrap();
        std::fs::write(base.with_extension("id"), kp.to_container_bytes().as_slice()).unwrap();

        for ext in ["pub", "key", "id"] {
            let loaded = load_any_public_key(&base.with_extension(ext)).unwrap();
            assert_eq!(&loaded, kp.public_key());
        }
    }
}
