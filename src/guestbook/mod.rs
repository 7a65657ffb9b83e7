//! Guestbook domain: contract gateway, state coordination, drafts.
//!
//! # Data Flow
//! ```text
//! Guestbook contract (on-chain slots)
//!     → contract.rs (alloy bindings behind the MessageGateway trait)
//!     → state.rs (load/mutate coordinator, swap-published collection)
//!     → form.rs (editable draft with failure-safe snapshots)
//! ```

pub mod contract;
pub mod form;
pub mod state;
pub mod types;

pub use contract::{GuestbookContract, MessageGateway};
pub use form::MessageForm;
pub use state::GuestbookState;
pub use types::{GuestbookError, GuestbookResult, Message, PendingAction, Session};
