//! In-memory record store, used offline and in tests.

use crate::db::RecordStore;
use crate::error::StoreError;
use crate::models::{PositionFix, UserRecord};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<DashMap<String, UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing the create path.
    pub fn insert(&self, record: UserRecord) {
        self.records.insert(record.uid.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create_record(&self, email: &str, uid: &str) -> Result<(), StoreError> {
        self.records
            .insert(uid.to_string(), UserRecord::new(uid, email));
        Ok(())
    }

    async fn update_location(&self, uid: &str, fix: PositionFix) -> Result<(), StoreError> {
        let mut record = self
            .records
            .get_mut(uid)
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))?;
        record.set_location(fix);
        Ok(())
    }

    async fn get_record(&self, uid: &str) -> Result<UserRecord, StoreError> {
        self.records
            .get(uid)
            .map(|r| r.value().clone())
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))
    }

    async fn has_record(&self, uid: &str) -> Result<bool, StoreError> {
        Ok(self.records.contains_key(uid))
    }
}
