//! Link metadata kept on each canonical record.

use chrono::Utc;

use crate::error::ShiftcalResult;
use crate::record::{Link, ServiceRecord, SubPeriodIndex};
use crate::store::RecordStore;

pub struct LinkStore<'a, S: RecordStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RecordStore + ?Sized> LinkStore<'a, S> {
    pub fn new(store: &'a S) -> Self {
        LinkStore { store }
    }

    /// The link id a record currently holds for a sub-period.
    pub fn read<'r>(&self, record: &'r ServiceRecord, index: SubPeriodIndex) -> Option<&'r str> {
        record.link.get(index)
    }

    /// Persist both sub-period ids at once, stamping the sync time.
    pub async fn write(
        &self,
        record_id: &str,
        part1: Option<String>,
        part2: Option<String>,
    ) -> ShiftcalResult<Link> {
        let link = Link {
            part1,
            part2,
            last_synced: Some(Utc::now()),
        };
        self.store.write_link(record_id, &link).await?;
        Ok(link)
    }

    pub async fn clear(&self, record_id: &str) -> ShiftcalResult<()> {
        self.store.clear_links(record_id).await
    }
}
