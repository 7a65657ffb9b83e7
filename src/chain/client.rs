//! JSON-RPC access to the guestbook chain.
//!
//! Wraps a primary endpoint plus optional failovers behind one client.
//! Every call carries a timeout, and read queries rotate through the
//! endpoint list until one answers.

use alloy::primitives::TxHash;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::chain::types::{ChainConfig, ChainError, ChainId, ChainResult, ConfirmationStatus};
use crate::observability::metrics;

/// Receipt poll interval while waiting for confirmations.
const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// RPC client with endpoint failover.
#[derive(Clone)]
pub struct ChainClient {
    /// Primary endpoint first, failovers after it.
    providers: Vec<DynProvider>,
    config: ChainConfig,
    timeout_duration: Duration,
}

impl ChainClient {
    /// Build a client from the chain section of the config.
    ///
    /// Only a malformed primary URL is fatal. Unparseable failover URLs
    /// are dropped with a warning, and an unreachable chain leaves the
    /// client constructed so the session monitor can keep probing.
    pub async fn new(config: ChainConfig) -> ChainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            ChainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(ProviderBuilder::new().connect_http(primary_url).erased());

        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(ProviderBuilder::new().connect_http(url).erased());
            } else {
                tracing::warn!(url = %url_str, "Skipping unparseable failover URL");
            }
        }

        let client = Self {
            providers,
            config: config.clone(),
            timeout_duration,
        };

        // Probe the chain id up front so a misconfigured endpoint shows
        // in the startup log rather than on the first request.
        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %config.rpc_url,
                    chain_id = config.chain_id,
                    "Chain client ready"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chain unreachable at startup, continuing");
            }
        }

        Ok(client)
    }

    /// Compare the chain id reported by the RPC against the configured one.
    pub async fn verify_chain_id(&self) -> ChainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(ChainError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Chain id reported by the first responding endpoint.
    pub async fn get_chain_id(&self) -> ChainResult<ChainId> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_chain_id()).await {
                Ok(Ok(result)) => return Ok(ChainId(result)),
                Ok(Err(e)) => {
                    tracing::warn!(endpoint = i, error = %e, "RPC call failed, rotating")
                }
                Err(_) => tracing::warn!(endpoint = i, "RPC call timed out, rotating"),
            }
        }
        Err(ChainError::Rpc("All RPC endpoints failed".to_string()))
    }

    /// Latest block number.
    pub async fn get_block_number(&self) -> ChainResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.get_block_number()).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(endpoint = i, error = %e, "Endpoint error"),
                Err(_) => tracing::warn!(endpoint = i, "Endpoint timeout"),
            }
        }
        Err(ChainError::Rpc(
            "Block number unavailable on every endpoint".to_string(),
        ))
    }

    /// Receipt lookup by transaction hash. `None` means still pending.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> ChainResult<Option<TransactionReceipt>> {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(
                self.timeout_duration,
                provider.get_transaction_receipt(tx_hash),
            )
            .await
            {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(endpoint = i, error = %e, "Endpoint error"),
                Err(_) => tracing::warn!(endpoint = i, "Endpoint timeout"),
            }
        }
        Err(ChainError::Rpc(
            "Receipt unavailable on every endpoint".to_string(),
        ))
    }

    /// Wait for a transaction to reach the configured confirmation depth.
    ///
    /// Polls for the receipt, then counts blocks past the inclusion block
    /// until the depth is met or `confirmation_timeout_secs` elapses.
    pub async fn wait_for_confirmation(&self, tx_hash: TxHash) -> ChainResult<ConfirmationStatus> {
        let required_confirmations = self.config.confirmation_blocks;
        let timeout_duration = Duration::from_secs(self.config.confirmation_timeout_secs);

        let result = timeout(timeout_duration, async {
            let mut ticker = interval(CONFIRMATION_POLL_INTERVAL);

            loop {
                ticker.tick().await;

                let receipt = match self.get_transaction_receipt(tx_hash).await? {
                    Some(r) => r,
                    None => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                };

                if !receipt.status() {
                    return Ok(ConfirmationStatus::Failed(
                        "Transaction reverted".to_string(),
                    ));
                }

                let current_block = self.get_block_number().await?;
                let tx_block = receipt.block_number.unwrap_or(current_block);
                let confirmations = current_block.saturating_sub(tx_block) as u32 + 1;

                if confirmations >= required_confirmations {
                    return Ok(ConfirmationStatus::Confirmed {
                        block_number: tx_block,
                    });
                }

                tracing::debug!(
                    tx_hash = %tx_hash,
                    confirmations,
                    required = required_confirmations,
                    "Waiting for confirmations"
                );
            }
        })
        .await;

        match result {
            Ok(status) => status,
            Err(_) => Err(ChainError::ConfirmationTimeout(
                self.config.confirmation_timeout_secs,
            )),
        }
    }

    /// True when the block number query succeeds on some endpoint.
    /// Also feeds the chain health gauge.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.get_block_number().await.is_ok();
        metrics::record_chain_health(healthy);
        healthy
    }

    /// Handle to the primary provider, for contract bindings.
    pub fn provider(&self) -> DynProvider {
        self.providers[0].clone()
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Confirmation depth mutations wait for.
    pub fn confirmation_blocks(&self) -> u32 {
        self.config.confirmation_blocks
    }
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("endpoints", &self.providers.len())
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ChainConfig {
        ChainConfig {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 31337,
            rpc_timeout_secs: 5,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 60,
        }
    }

    #[tokio::test]
    async fn test_client_creation() {
        // Construction does not require a live endpoint.
        let config = test_config();
        let result = ChainClient::new(config).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_rpc_url_rejected() {
        let mut config = test_config();
        config.rpc_url = "not a url".to_string();
        let result = ChainClient::new(config).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_rpc_failover() {
        let mut config = test_config();
        config.failover_urls.push("http://invalid:8545".to_string());

        let client = ChainClient::new(config).await.unwrap();

        // Neither endpoint resolves, so the rotation must exhaust the
        // list and surface the aggregate error.
        let result = client.get_chain_id().await;
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("All RPC endpoints failed"));
    }
}
