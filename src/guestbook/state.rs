//! Guestbook state coordination.
//!
//! # Responsibilities
//! - Mirror the contract's message slots into an in-memory collection
//! - Sequence mutations: submit, confirm, settle, reload
//! - Track the coarse in-flight action and loading flags
//!
//! The collection is always replaced wholesale via an atomic swap; readers
//! take consistent snapshots and never observe a partially built vector.
//! Mutations are NOT coordinated against each other: two concurrent callers
//! can overwrite the action flag and trigger overlapping reloads. That race
//! is inherited behavior; the swap keeps the collection itself coherent.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::TxHash;
use arc_swap::ArcSwap;
use futures_util::future::join_all;

use crate::guestbook::contract::MessageGateway;
use crate::guestbook::types::{
    GuestbookError, GuestbookResult, Message, PendingAction, Session,
};
use crate::observability::metrics;

/// Fixed pause between a confirmed mutation and the reload that follows.
/// Some RPC nodes serve `eth_call` state that lags the receipt they just
/// returned.
pub const POST_CONFIRM_DELAY: Duration = Duration::from_millis(300);

/// Pause between the session connecting and the first load.
pub const CONNECT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Client-side coordinator between the contract and everything that renders
/// messages.
pub struct GuestbookState {
    gateway: Arc<dyn MessageGateway>,
    session: Arc<Session>,
    messages: ArcSwap<Vec<Message>>,
    latest: ArcSwap<Option<Message>>,
    loading: AtomicBool,
    action: AtomicU8,
}

impl GuestbookState {
    pub fn new(gateway: Arc<dyn MessageGateway>, session: Arc<Session>) -> Self {
        Self {
            gateway,
            session,
            messages: ArcSwap::from_pointee(Vec::new()),
            latest: ArcSwap::from_pointee(None),
            loading: AtomicBool::new(false),
            action: AtomicU8::new(PendingAction::None.as_u8()),
        }
    }

    /// Consistent snapshot of the message collection, newest slot first.
    pub fn snapshot(&self) -> Arc<Vec<Message>> {
        self.messages.load_full()
    }

    /// The message the contract last reported as latest, if it resolved.
    pub fn latest(&self) -> Option<Message> {
        self.latest.load().as_ref().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn pending_action(&self) -> PendingAction {
        PendingAction::from_u8(self.action.load(Ordering::SeqCst))
    }

    /// Whether mutations can be submitted at all.
    pub fn is_writable(&self) -> bool {
        self.gateway.is_writable()
    }

    fn set_action(&self, action: PendingAction) {
        self.action.store(action.as_u8(), Ordering::SeqCst);
    }

    /// Rebuild the collection from the contract.
    ///
    /// No-op while the session is disconnected. A failed count read aborts
    /// the load and leaves the previous collection in place; a failed slot
    /// read only skips that slot. The loading flag is cleared on every path.
    pub async fn load(&self) {
        if !self.session.is_connected() {
            return;
        }

        self.loading.store(true, Ordering::SeqCst);
        match self.load_inner().await {
            Ok(count) => {
                tracing::debug!(count, "Messages loaded");
                metrics::record_load(count);
            }
            Err(e) => {
                tracing::error!(error = %e, "Error loading messages");
                metrics::record_load_failure();
            }
        }
        self.loading.store(false, Ordering::SeqCst);
    }

    async fn load_inner(&self) -> GuestbookResult<usize> {
        let count = self.gateway.count().await?;

        // Slots are read one at a time, in ascending order. The ledger can
        // move under the scan; there is no snapshot isolation.
        let mut loaded = Vec::new();
        for index in 0..count {
            match self.gateway.read_slot(index).await {
                Ok(slot) => {
                    if slot.is_tombstone() {
                        continue;
                    }
                    loaded.push(Message {
                        id: index,
                        author: slot.author,
                        title: slot.title,
                        text: slot.text,
                    });
                }
                Err(e) => {
                    // Skipped slot; the collection undercounts until the
                    // next load.
                    tracing::error!(index, error = %e, "Error loading message slot");
                }
            }
        }

        loaded.reverse();
        let published = Arc::new(loaded);
        self.messages.store(published.clone());

        if count > 0 {
            self.resolve_latest(&published).await;
        }

        Ok(published.len())
    }

    /// Resolve the contract-reported latest (title, text) pair against the
    /// freshly published collection.
    ///
    /// The match is exact string equality, first hit in display order; two
    /// messages sharing title and text are ambiguous and the first wins.
    /// On read failure or no match the previous pointer stays in place.
    async fn resolve_latest(&self, published: &[Message]) {
        match self.gateway.read_latest().await {
            Ok((title, text)) => {
                if let Some(found) = published
                    .iter()
                    .find(|m| m.title == title && m.text == text)
                {
                    self.latest.store(Arc::new(Some(found.clone())));
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Error loading latest message");
            }
        }
    }

    /// Append a new message.
    pub async fn create(&self, title: &str, text: &str) -> bool {
        self.mutate(
            PendingAction::Saving,
            self.gateway.submit_create(title, text),
        )
        .await
    }

    /// Rewrite the message in slot `id`.
    pub async fn edit(&self, id: u64, title: &str, text: &str) -> bool {
        self.mutate(
            PendingAction::Updating,
            self.gateway.submit_edit(id, title, text),
        )
        .await
    }

    /// Tombstone the message in slot `id`.
    pub async fn remove(&self, id: u64) -> bool {
        self.mutate(PendingAction::Deleting, self.gateway.submit_delete(id))
            .await
    }

    /// Submit one mutation: broadcast, confirm, settle, reload.
    ///
    /// Returns `false` without touching state when preconditions fail, and
    /// on any submission or confirmation error (logged, no retry, no
    /// rollback). Flags are cleared in a final step on every path.
    async fn mutate(
        &self,
        action: PendingAction,
        submit: impl Future<Output = GuestbookResult<TxHash>> + Send,
    ) -> bool {
        if !self.session.is_connected() || !self.gateway.is_writable() {
            return false;
        }

        self.loading.store(true, Ordering::SeqCst);
        self.set_action(action);

        let outcome: GuestbookResult<TxHash> = async {
            let tx_hash = submit.await?;
            self.gateway.confirm(tx_hash).await?;
            Ok(tx_hash)
        }
        .await;

        let ok = match outcome {
            Ok(tx_hash) => {
                tracing::info!(action = %action, tx_hash = %tx_hash, "Guestbook mutation confirmed");
                tokio::time::sleep(POST_CONFIRM_DELAY).await;
                self.load().await;
                true
            }
            Err(e) => {
                tracing::error!(action = %action, error = %e, "Guestbook mutation failed");
                false
            }
        };
        metrics::record_mutation(action, ok);

        self.set_action(PendingAction::None);
        self.loading.store(false, Ordering::SeqCst);
        ok
    }

    /// Delete several messages at once.
    ///
    /// All deletions are fired concurrently and joined; there is no ordering
    /// guarantee among them and no atomicity. The returned map carries one
    /// independent result per id, so partial failure stays visible to the
    /// caller. The collection is reloaded once after the join.
    pub async fn remove_many(&self, ids: &[u64]) -> BTreeMap<u64, GuestbookResult<()>> {
        if ids.is_empty() {
            return BTreeMap::new();
        }
        if !self.session.is_connected() {
            return ids
                .iter()
                .map(|id| (*id, Err(GuestbookError::NotConnected)))
                .collect();
        }
        if !self.gateway.is_writable() {
            return ids
                .iter()
                .map(|id| (*id, Err(GuestbookError::ReadOnly)))
                .collect();
        }

        self.loading.store(true, Ordering::SeqCst);
        self.set_action(PendingAction::Deleting);

        let deletions = ids.iter().map(|&id| async move {
            let result = async {
                let tx_hash = self.gateway.submit_delete(id).await?;
                self.gateway.confirm(tx_hash).await?;
                Ok(())
            }
            .await;
            (id, result)
        });
        let results: BTreeMap<u64, GuestbookResult<()>> =
            join_all(deletions).await.into_iter().collect();

        let failed = results.values().filter(|r| r.is_err()).count();
        if failed > 0 {
            // Successful deletions are not rolled back.
            tracing::error!(requested = ids.len(), failed, "Error deleting messages");
        }
        metrics::record_batch_delete(results.len(), failed);

        tokio::time::sleep(POST_CONFIRM_DELAY).await;
        self.load().await;

        self.set_action(PendingAction::None);
        self.loading.store(false, Ordering::SeqCst);
        results
    }
}

impl std::fmt::Debug for GuestbookState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestbookState")
            .field("messages", &self.messages.load().len())
            .field("loading", &self.is_loading())
            .field("action", &self.pending_action())
            .finish()
    }
}
