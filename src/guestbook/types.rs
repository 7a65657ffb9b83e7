//! Guestbook domain types.

use std::sync::atomic::{AtomicBool, Ordering};

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chain::ChainError;
use crate::observability::metrics;

/// A guestbook entry as stored on-chain.
///
/// Identity is the slot index assigned by the contract's storage position;
/// a slot is reused only when the contract overwrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Slot index in the contract's message array.
    pub id: u64,
    /// Author account. The zero address marks a deleted slot.
    pub author: Address,
    /// Message title.
    pub title: String,
    /// Message body.
    pub text: String,
}

impl Message {
    /// Whether `account` wrote this message.
    ///
    /// Address equality is canonical (parsing normalizes hex case), which is
    /// the typed form of the original case-insensitive string comparison.
    /// Display convenience only, never an authorization check.
    pub fn is_authored_by(&self, account: Address) -> bool {
        self.author == account
    }

    /// Case-insensitive substring match against title or text.
    pub fn matches_query(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.title.to_lowercase().contains(&q) || self.text.to_lowercase().contains(&q)
    }

    /// Short `0x1234...abcd` form of the author address for list output.
    pub fn short_author(&self) -> String {
        let hex = self.author.to_string();
        format!("{}...{}", &hex[..6], &hex[hex.len() - 4..])
    }
}

/// Raw (author, title, text) tuple read from a contract slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSlot {
    pub author: Address,
    pub title: String,
    pub text: String,
}

impl RawSlot {
    /// A zero-address author marks a deleted/empty slot.
    pub fn is_tombstone(&self) -> bool {
        self.author == Address::ZERO
    }
}

/// Coarse in-flight mutation indicator.
///
/// Lifecycle: set immediately before submitting a mutating transaction,
/// cleared in a final step regardless of outcome. Concurrent mutations may
/// overwrite each other's flag; that race is inherited behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PendingAction {
    None = 0,
    Saving = 1,
    Updating = 2,
    Deleting = 3,
}

impl PendingAction {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Saving,
            2 => Self::Updating,
            3 => Self::Deleting,
            _ => Self::None,
        }
    }

    /// Human-readable progress label, `None` when idle.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Saving => Some("Saving message..."),
            Self::Updating => Some("Updating message..."),
            Self::Deleting => Some("Deleting message..."),
        }
    }
}

impl std::fmt::Display for PendingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Saving => "saving",
            Self::Updating => "updating",
            Self::Deleting => "deleting",
        };
        f.write_str(name)
    }
}

/// Wallet/session status consumed read-only by the rest of the service.
///
/// The session is connected once a signing wallet is configured and the
/// chain has answered a health probe. Loads and mutations are no-ops while
/// disconnected.
#[derive(Debug)]
pub struct Session {
    address: Option<Address>,
    chain_id: u64,
    connected: AtomicBool,
}

impl Session {
    pub fn new(address: Option<Address>, chain_id: u64) -> Self {
        Self {
            address,
            chain_id,
            connected: AtomicBool::new(false),
        }
    }

    /// The connected account address, if a wallet is configured.
    pub fn address(&self) -> Option<Address> {
        self.address
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
        metrics::record_session_connected(connected);
    }
}

/// Errors that can occur during guestbook operations.
#[derive(Debug, Error)]
pub enum GuestbookError {
    /// Underlying chain/RPC failure.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Session has no active wallet connection.
    #[error("wallet not connected")]
    NotConnected,

    /// No signing wallet configured; write surface unavailable.
    #[error("no signing wallet configured")]
    ReadOnly,

    /// Contract call or decode failure.
    #[error("contract error: {0}")]
    Contract(String),

    /// Message payload rejected before submission.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

/// Result type for guestbook operations.
pub type GuestbookResult<T> = Result<T, GuestbookError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_pending_action_roundtrip() {
        for action in [
            PendingAction::None,
            PendingAction::Saving,
            PendingAction::Updating,
            PendingAction::Deleting,
        ] {
            assert_eq!(PendingAction::from_u8(action.as_u8()), action);
        }
        // Unknown encodings collapse to idle
        assert_eq!(PendingAction::from_u8(42), PendingAction::None);
    }

    #[test]
    fn test_pending_action_labels() {
        assert_eq!(PendingAction::None.label(), None);
        assert_eq!(PendingAction::Saving.label(), Some("Saving message..."));
        assert_eq!(PendingAction::Updating.label(), Some("Updating message..."));
        assert_eq!(PendingAction::Deleting.label(), Some("Deleting message..."));
    }

    #[test]
    fn test_authorship_is_case_insensitive() {
        let msg = Message {
            id: 0,
            author: "0xF39fd6E51Aad88F6F4ce6AB8827279CffFb92266"
                .parse()
                .unwrap(),
            title: "t".into(),
            text: "x".into(),
        };
        // Lowercase rendition of the same account parses to the same address
        let lower: Address = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
            .parse()
            .unwrap();
        assert!(msg.is_authored_by(lower));
        assert!(!msg.is_authored_by(addr(0x11)));
    }

    #[test]
    fn test_query_match() {
        let msg = Message {
            id: 3,
            author: addr(0x22),
            title: "Hello Chain".into(),
            text: "first post".into(),
        };
        assert!(msg.matches_query("hello"));
        assert!(msg.matches_query("POST"));
        assert!(!msg.matches_query("absent"));
    }

    #[test]
    fn test_short_author() {
        let msg = Message {
            id: 0,
            author: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
                .parse()
                .unwrap(),
            title: String::new(),
            text: String::new(),
        };
        let short = msg.short_author();
        assert!(short.to_lowercase().starts_with("0xf39f"));
        assert!(short.to_lowercase().ends_with("2266"));
        assert!(short.contains("..."));
    }

    #[test]
    fn test_tombstone_detection() {
        let live = RawSlot {
            author: addr(0x01),
            title: "t".into(),
            text: "x".into(),
        };
        let dead = RawSlot {
            author: Address::ZERO,
            title: String::new(),
            text: String::new(),
        };
        assert!(!live.is_tombstone());
        assert!(dead.is_tombstone());
    }

    #[test]
    fn test_session_toggles() {
        let session = Session::new(Some(addr(0x05)), 31337);
        assert!(!session.is_connected());
        session.set_connected(true);
        assert!(session.is_connected());
        assert_eq!(session.address(), Some(addr(0x05)));
        assert_eq!(session.chain_id(), 31337);
    }
}
