//! Access to the canonical record store.
//!
//! The document store that owns service records lives outside this crate;
//! the engine only needs the narrow surface below.

mod local;

use async_trait::async_trait;

use crate::error::ShiftcalResult;
use crate::record::{Link, ServiceRecord};

pub use local::LocalStore;

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_records(&self, user_id: &str) -> ShiftcalResult<Vec<ServiceRecord>>;

    async fn get_record(&self, record_id: &str) -> ShiftcalResult<Option<ServiceRecord>>;

    /// Replace the link metadata of a record.
    async fn write_link(&self, record_id: &str, link: &Link) -> ShiftcalResult<()>;

    async fn clear_links(&self, record_id: &str) -> ShiftcalResult<()>;

    /// Deleting a missing record is not an error.
    async fn delete_record(&self, record_id: &str) -> ShiftcalResult<()>;
}
