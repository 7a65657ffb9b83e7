//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;

use guestbook_service::guestbook::contract::MessageGateway;
use guestbook_service::guestbook::types::{GuestbookError, GuestbookResult, RawSlot};

pub fn addr(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

pub fn slot(author_byte: u8, title: &str, text: &str) -> RawSlot {
    RawSlot {
        author: addr(author_byte),
        title: title.to_string(),
        text: text.to_string(),
    }
}

pub fn tombstone() -> RawSlot {
    RawSlot {
        author: Address::ZERO,
        title: String::new(),
        text: String::new(),
    }
}

/// In-memory gateway with scriptable failures.
///
/// Slots live in a vector indexed by slot id. Mutations apply on submit and
/// update the tracked latest pair, mirroring what the contract would report
/// after the write.
pub struct MockGateway {
    slots: Mutex<Vec<RawSlot>>,
    latest: Mutex<Option<(String, String)>>,
    author: Address,
    writable: bool,
    fail_count_reads: AtomicBool,
    failing_slot_reads: Mutex<HashSet<u64>>,
    fail_submissions: AtomicBool,
    failing_deletes: Mutex<HashSet<u64>>,
    count_reads: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::with_slots(Vec::new())
    }

    pub fn with_slots(slots: Vec<RawSlot>) -> Self {
        Self {
            slots: Mutex::new(slots),
            latest: Mutex::new(None),
            author: addr(0xee),
            writable: true,
            fail_count_reads: AtomicBool::new(false),
            failing_slot_reads: Mutex::new(HashSet::new()),
            fail_submissions: AtomicBool::new(false),
            failing_deletes: Mutex::new(HashSet::new()),
            count_reads: AtomicUsize::new(0),
        }
    }

    pub fn read_only(slots: Vec<RawSlot>) -> Self {
        Self {
            writable: false,
            ..Self::with_slots(slots)
        }
    }

    /// Address mutations are attributed to.
    pub fn author(&self) -> Address {
        self.author
    }

    pub fn set_latest(&self, title: &str, text: &str) {
        *self.latest.lock().unwrap() = Some((title.to_string(), text.to_string()));
    }

    pub fn clear_latest(&self) {
        *self.latest.lock().unwrap() = None;
    }

    pub fn clear_slots(&self) {
        self.slots.lock().unwrap().clear();
    }

    pub fn fail_count_reads(&self, fail: bool) {
        self.fail_count_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_slot_read(&self, index: u64) {
        self.failing_slot_reads.lock().unwrap().insert(index);
    }

    pub fn fail_submissions(&self, fail: bool) {
        self.fail_submissions.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, id: u64) {
        self.failing_deletes.lock().unwrap().insert(id);
    }

    /// How many times the slot count was read (one per attempted load).
    pub fn count_reads(&self) -> usize {
        self.count_reads.load(Ordering::SeqCst)
    }

    pub fn slot_at(&self, index: u64) -> Option<RawSlot> {
        self.slots.lock().unwrap().get(index as usize).cloned()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageGateway for MockGateway {
    fn is_writable(&self) -> bool {
        self.writable
    }

    async fn count(&self) -> GuestbookResult<u64> {
        self.count_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_count_reads.load(Ordering::SeqCst) {
            return Err(GuestbookError::Contract("count read failed".into()));
        }
        Ok(self.slots.lock().unwrap().len() as u64)
    }

    async fn read_slot(&self, index: u64) -> GuestbookResult<RawSlot> {
        if self.failing_slot_reads.lock().unwrap().contains(&index) {
            return Err(GuestbookError::Contract(format!("slot {index} read failed")));
        }
        self.slots
            .lock()
            .unwrap()
            .get(index as usize)
            .cloned()
            .ok_or_else(|| GuestbookError::Contract(format!("slot {index} out of range")))
    }

    async fn read_latest(&self) -> GuestbookResult<(String, String)> {
        self.latest
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| GuestbookError::Contract("no latest message".into()))
    }

    async fn submit_create(&self, title: &str, text: &str) -> GuestbookResult<TxHash> {
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(GuestbookError::Contract("submission rejected".into()));
        }
        self.slots.lock().unwrap().push(RawSlot {
            author: self.author,
            title: title.to_string(),
            text: text.to_string(),
        });
        self.set_latest(title, text);
        Ok(TxHash::repeat_byte(0x1a))
    }

    async fn submit_edit(&self, id: u64, title: &str, text: &str) -> GuestbookResult<TxHash> {
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(GuestbookError::Contract("submission rejected".into()));
        }
        let mut slots = self.slots.lock().unwrap();
        let slot = slots
            .get_mut(id as usize)
            .ok_or_else(|| GuestbookError::Contract(format!("slot {id} out of range")))?;
        slot.title = title.to_string();
        slot.text = text.to_string();
        drop(slots);
        self.set_latest(title, text);
        Ok(TxHash::repeat_byte(0x2b))
    }

    async fn submit_delete(&self, id: u64) -> GuestbookResult<TxHash> {
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(GuestbookError::Contract("submission rejected".into()));
        }
        if self.failing_deletes.lock().unwrap().contains(&id) {
            return Err(GuestbookError::Contract(format!("delete of {id} rejected")));
        }
        let mut slots = self.slots.lock().unwrap();
        let slot = slots
            .get_mut(id as usize)
            .ok_or_else(|| GuestbookError::Contract(format!("slot {id} out of range")))?;
        slot.author = Address::ZERO;
        Ok(TxHash::repeat_byte(0x3c))
    }

    async fn confirm(&self, _tx_hash: TxHash) -> GuestbookResult<()> {
        Ok(())
    }
}
