//! Record stores: the remote document store, the on-device store and an
//! in-memory store, all behind [`RecordStore`].

pub mod firestore;
pub mod local;
pub mod memory;

pub use firestore::FirestoreDb;
pub use local::LocalStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::models::{PositionFix, UserRecord};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
}

/// Uniform interface over a persistence backend keyed by uid.
///
/// Stores never see each other; keeping them in step is the job of
/// [`crate::services::SyncCoordinator`]. Creation is not idempotent, so
/// callers must not create the same uid twice. Location updates never
/// upsert: a missing record yields [`StoreError::NotFound`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    async fn create_record(&self, email: &str, uid: &str) -> Result<(), StoreError>;

    async fn update_location(&self, uid: &str, fix: PositionFix) -> Result<(), StoreError>;

    async fn get_record(&self, uid: &str) -> Result<UserRecord, StoreError>;

    /// Existence check. Backends with a cheap lookup should override this.
    async fn has_record(&self, uid: &str) -> Result<bool, StoreError> {
        match self.get_record(uid).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
