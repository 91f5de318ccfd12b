//! House signer key.
//!
//! The key comes from an environment variable named in `config.toml`
//! (never from the file itself) and is kept in a `SecretString` so it cannot end up in logs or debug output.

use ethers::signers::{LocalWallet, Signer};
use secrecy::{ExposeSecret, SecretString};

use crate::types::HouseError;

/// Default env var holding the house private key.
pub const DEFAULT_KEY_ENV: &str = "HOUSE_PRIVATE_KEY";

/// Validated 32-byte hex private key.
#[derive(Debug)]
pub struct HouseKey(SecretString);

impl HouseKey {
    /// Accepts exactly 64 hex characters, with or without a `0x` prefix.
    pub fn parse(raw: &str) -> Result<Self, HouseError> {
        let trimmed = raw.trim();
        let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HouseError::InvalidKey(
                "expected 64 hex characters".to_string(),
            ));
        }
        Ok(Self(SecretString::new(hex.to_string())))
    }

    /// Signing wallet bound to `chain_id`.
    pub fn wallet(&self, chain_id: u64) -> Result<LocalWallet, HouseError> {
        let wallet: LocalWallet = self
            .0
            .expose_secret()
            .parse()
            .map_err(|_| HouseError::InvalidKey("not a valid secp256k1 key".to_string()))?;
        Ok(wallet.with_chain_id(chain_id))
    }
}
