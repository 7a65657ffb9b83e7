//! Signing wallet for guestbook writes.
//!
//! The key comes from the environment only. It is never written to logs,
//! config files, or API responses.

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;

use crate::chain::types::{ChainError, ChainResult};

/// Environment variable holding the hex-encoded signing key.
pub const PRIVATE_KEY_ENV_VAR: &str = "GUESTBOOK_PRIVATE_KEY";

/// Signing identity used for guestbook mutations.
#[derive(Debug, Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
    /// EIP-155 chain id the key signs for.
    chain_id: u64,
}

impl Wallet {
    /// Parse a hex private key, with or without a `0x` prefix.
    ///
    /// Logs the derived address on success; the key itself never reaches
    /// the log stream.
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> ChainResult<Self> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| ChainError::Wallet(format!("Invalid private key format: {}", e)))?;

        tracing::info!(address = %signer.address(), chain_id, "Signing wallet loaded");

        Ok(Self { signer, chain_id })
    }

    /// Read the key from `GUESTBOOK_PRIVATE_KEY`.
    ///
    /// An unset variable is not an error: the service starts read-only and
    /// the session never reports as connected.
    pub fn from_env(chain_id: u64) -> ChainResult<Option<Self>> {
        match std::env::var(PRIVATE_KEY_ENV_VAR) {
            Ok(private_key) => Self::from_private_key(&private_key, chain_id).map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Address derived from the signing key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Clone of the signer for provider construction.
    pub fn signer(&self) -> PrivateKeySigner {
        self.signer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Anvil's first dev account.
    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn test_parses_bare_hex_key() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, 1).unwrap();
        assert_eq!(wallet.address().to_string().to_lowercase(), TEST_ADDRESS);
    }

    #[test]
    fn test_accepts_0x_prefix() {
        let wallet = Wallet::from_private_key(&format!("0x{}", TEST_PRIVATE_KEY), 1).unwrap();
        assert_eq!(wallet.address().to_string().to_lowercase(), TEST_ADDRESS);
    }

    #[test]
    fn test_rejects_malformed_key() {
        let result = Wallet::from_private_key("invalid_key", 1);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Invalid private key"));
    }

    #[test]
    fn test_chain_id_accessor() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, 31337).unwrap();
        assert_eq!(wallet.chain_id(), 31337);
    }
}
