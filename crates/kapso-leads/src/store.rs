//! Lead persistence seam.
//!
//! The webhook reads a lead, computes the next state, then writes it back
//! with no version check: two near-simultaneous messages from one phone
//! number can overwrite each other's update.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::state::{ConversationState, LeadRecord, LeadUpdate};

/// Errors returned by a [`LeadStore`]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The datastore could not be reached
    #[error("http error: {0}")]
    Http(String),
    /// The datastore answered with a non-success status
    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },
    /// A row could not be decoded
    #[error("decode error: {0}")]
    Decode(String),
    /// The datastore answered successfully but without the expected row
    #[error("unexpected: {0}")]
    Unexpected(String),
}

#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Look up the lead for `phone`, `None` if it was never seen.
    async fn find_by_phone(&self, phone: &str) -> Result<Option<LeadRecord>, StoreError>;

    /// Insert a new lead and return the stored row.
    async fn create(
        &self,
        phone: &str,
        state: &ConversationState,
    ) -> Result<LeadRecord, StoreError>;

    /// Write `update` for `phone`, inserting the row if it is missing.
    async fn upsert(&self, phone: &str, update: &LeadUpdate) -> Result<(), StoreError>;
}

/// In-process store, for tests and local runs without a database.
#[derive(Debug, Clone, Default)]
pub struct MemoryLeadStore {
    inner: Arc<RwLock<HashMap<String, LeadRecord>>>,
}

impl MemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Snapshot of one record.
    pub async fn get(&self, phone: &str) -> Option<LeadRecord> {
        self.inner.read().await.get(phone).cloned()
    }
}

#[async_trait]
impl LeadStore for MemoryLeadStore {
    async fn find_by_phone(&self, phone: &str) -> Result<Option<LeadRecord>, StoreError> {
        Ok(self.get(phone).await)
    }

    async fn create(
        &self,
        phone: &str,
        state: &ConversationState,
    ) -> Result<LeadRecord, StoreError> {
        let mut map = self.inner.write().await;
        if map.contains_key(phone) {
            return Err(StoreError::Backend {
                status: 409,
                message: format!("lead {phone} already exists"),
            });
        }
        let mut record = LeadRecord::new(phone);
        record.conversation_state = state.clone();
        map.insert(phone.to_string(), record.clone());
        Ok(record)
    }

    async fn upsert(&self, phone: &str, update: &LeadUpdate) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .entry(phone.to_string())
            .or_insert_with(|| LeadRecord::new(phone))
            .apply(update);
        Ok(())
    }
}
