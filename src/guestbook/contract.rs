//! Contract gateway: typed read/write access to the deployed guestbook.
//!
//! # Responsibilities
//! - Generate contract bindings and expose them behind the `MessageGateway`
//!   trait so the state coordinator can be driven by a scripted gateway in
//!   tests
//! - Split the read surface (public provider) from the write surface
//!   (wallet-attached provider, absent when no key is configured)
//! - Map transport/contract failures into the guestbook error taxonomy

use std::future::IntoFuture;
use std::time::Duration;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol;
use async_trait::async_trait;
use tokio::time::timeout;

use crate::chain::{ChainClient, ChainError, ConfirmationStatus, Wallet};
use crate::config::schema::ContractConfig;
use crate::guestbook::types::{GuestbookError, GuestbookResult, RawSlot};

sol! {
    #[sol(rpc)]
    contract Guestbook {
        function messageCount() external view returns (uint256);
        function messages(uint256 index) external view returns (address author, string memory title, string memory text);
        function readLatestMessage() external view returns (string memory title, string memory text);
        function writeMessage(string calldata title, string calldata text) external;
        function editMessage(uint256 id, string calldata title, string calldata text) external;
        function deleteMessage(uint256 id) external;
    }
}

/// Read/write surface of the on-chain guestbook storage.
///
/// `submit_*` broadcast a transaction and return its hash; the hash is then
/// awaited via [`MessageGateway::confirm`]. Reads are point-in-time with no
/// snapshot guarantee across calls.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Whether the write surface is available (a signing wallet exists).
    fn is_writable(&self) -> bool;

    /// Total number of slots ever allocated, including tombstones.
    async fn count(&self) -> GuestbookResult<u64>;

    /// Read one storage slot.
    async fn read_slot(&self, index: u64) -> GuestbookResult<RawSlot>;

    /// Read the contract-reported latest (title, text) pair.
    async fn read_latest(&self) -> GuestbookResult<(String, String)>;

    /// Broadcast a message creation.
    async fn submit_create(&self, title: &str, text: &str) -> GuestbookResult<TxHash>;

    /// Broadcast an in-place edit of slot `id`.
    async fn submit_edit(&self, id: u64, title: &str, text: &str) -> GuestbookResult<TxHash>;

    /// Broadcast a deletion of slot `id` (the contract tombstones it).
    async fn submit_delete(&self, id: u64) -> GuestbookResult<TxHash>;

    /// Wait until `tx_hash` is confirmed at the configured depth.
    async fn confirm(&self, tx_hash: TxHash) -> GuestbookResult<()>;
}

/// Alloy-backed gateway for the deployed guestbook contract.
pub struct GuestbookContract {
    client: ChainClient,
    reader: Guestbook::GuestbookInstance<DynProvider>,
    writer: Option<Guestbook::GuestbookInstance<DynProvider>>,
    call_timeout: Duration,
}

impl GuestbookContract {
    /// Bind the contract at the configured address.
    ///
    /// The read instance always exists; the write instance is built only
    /// when a wallet is present, over a provider that signs with it.
    pub fn new(
        client: ChainClient,
        wallet: Option<Wallet>,
        config: &ContractConfig,
    ) -> GuestbookResult<Self> {
        let address: Address = config
            .address
            .parse()
            .map_err(|e| GuestbookError::Contract(format!("Invalid contract address: {}", e)))?;

        let reader = Guestbook::new(address, client.provider());

        let writer = match wallet {
            Some(wallet) => {
                let rpc_url: url::Url = client.config().rpc_url.parse().map_err(|e| {
                    GuestbookError::Contract(format!("Invalid RPC URL for write provider: {}", e))
                })?;
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(wallet.signer()))
                    .connect_http(rpc_url)
                    .erased();
                tracing::info!(
                    contract = %address,
                    signer = %wallet.address(),
                    "Write surface enabled"
                );
                Some(Guestbook::new(address, provider))
            }
            None => {
                tracing::warn!(contract = %address, "No wallet configured, gateway is read-only");
                None
            }
        };

        let call_timeout = Duration::from_secs(client.config().rpc_timeout_secs);

        Ok(Self {
            client,
            reader,
            writer,
            call_timeout,
        })
    }

    fn writer(&self) -> GuestbookResult<&Guestbook::GuestbookInstance<DynProvider>> {
        self.writer.as_ref().ok_or(GuestbookError::ReadOnly)
    }

    /// Race a contract call against the configured RPC timeout.
    async fn bounded<T, F>(&self, what: &str, fut: F) -> GuestbookResult<T>
    where
        F: IntoFuture<Output = Result<T, alloy::contract::Error>> + Send,
        F::IntoFuture: Send,
    {
        match timeout(self.call_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(GuestbookError::Contract(format!("{}: {}", what, e))),
            Err(_) => Err(ChainError::Timeout(self.call_timeout.as_secs()).into()),
        }
    }
}

#[async_trait]
impl MessageGateway for GuestbookContract {
    fn is_writable(&self) -> bool {
        self.writer.is_some()
    }

    async fn count(&self) -> GuestbookResult<u64> {
        let raw: U256 = self
            .bounded("messageCount", self.reader.messageCount().call())
            .await?;
        u64::try_from(raw)
            .map_err(|_| GuestbookError::Contract("message count exceeds u64".to_string()))
    }

    async fn read_slot(&self, index: u64) -> GuestbookResult<RawSlot> {
        let slot = self
            .bounded("messages", self.reader.messages(U256::from(index)).call())
            .await?;
        Ok(RawSlot {
            author: slot.author,
            title: slot.title,
            text: slot.text,
        })
    }

    async fn read_latest(&self) -> GuestbookResult<(String, String)> {
        let latest = self
            .bounded("readLatestMessage", self.reader.readLatestMessage().call())
            .await?;
        Ok((latest.title, latest.text))
    }

    async fn submit_create(&self, title: &str, text: &str) -> GuestbookResult<TxHash> {
        let writer = self.writer()?;
        let pending = self
            .bounded(
                "writeMessage",
                writer.writeMessage(title.to_owned(), text.to_owned()).send(),
            )
            .await?;
        Ok(*pending.tx_hash())
    }

    async fn submit_edit(&self, id: u64, title: &str, text: &str) -> GuestbookResult<TxHash> {
        let writer = self.writer()?;
        let pending = self
            .bounded(
                "editMessage",
                writer
                    .editMessage(U256::from(id), title.to_owned(), text.to_owned())
                    .send(),
            )
            .await?;
        Ok(*pending.tx_hash())
    }

    async fn submit_delete(&self, id: u64) -> GuestbookResult<TxHash> {
        let writer = self.writer()?;
        let pending = self
            .bounded(
                "deleteMessage",
                writer.deleteMessage(U256::from(id)).send(),
            )
            .await?;
        Ok(*pending.tx_hash())
    }

    async fn confirm(&self, tx_hash: TxHash) -> GuestbookResult<()> {
        match self.client.wait_for_confirmation(tx_hash).await? {
            ConfirmationStatus::Confirmed { block_number } => {
                tracing::debug!(tx_hash = %tx_hash, block_number, "Transaction confirmed");
                Ok(())
            }
            ConfirmationStatus::Failed(reason) => Err(ChainError::Reverted(reason).into()),
            ConfirmationStatus::Pending | ConfirmationStatus::Confirming { .. } => Err(
                GuestbookError::Contract("confirmation ended in a transient state".to_string()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainConfig;

    fn chain_config() -> ChainConfig {
        ChainConfig {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 31337,
            rpc_timeout_secs: 5,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 60,
        }
    }

    fn contract_config() -> ContractConfig {
        ContractConfig::default()
    }

    #[tokio::test]
    async fn test_gateway_without_wallet_is_read_only() {
        let client = ChainClient::new(chain_config()).await.unwrap();
        let gateway = GuestbookContract::new(client, None, &contract_config()).unwrap();

        assert!(!gateway.is_writable());
        let err = gateway.submit_create("t", "x").await.unwrap_err();
        assert!(matches!(err, GuestbookError::ReadOnly));
    }

    #[tokio::test]
    async fn test_invalid_contract_address_rejected() {
        let client = ChainClient::new(chain_config()).await.unwrap();
        let config = ContractConfig {
            address: "0xnothex".to_string(),
        };
        let result = GuestbookContract::new(client, None, &config);
        assert!(matches!(result, Err(GuestbookError::Contract(_))));
    }

    #[tokio::test]
    async fn test_gateway_with_wallet_is_writable() {
        // Anvil's first account key; signing setup is local, no RPC needed
        let wallet = Wallet::from_private_key(
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            31337,
        )
        .unwrap();
        let client = ChainClient::new(chain_config()).await.unwrap();
        let gateway =
            GuestbookContract::new(client, Some(wallet), &contract_config()).unwrap();
        assert!(gateway.is_writable());
    }
}
