//! Garbage collection of app-generated events nothing links to anymore.

use std::collections::HashSet;

use crate::error::ShiftcalResult;
use crate::event_factory::EventFactory;
use crate::gateway::CalendarGateway;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectReport {
    /// App-generated events seen in the calendar
    pub scanned: usize,
    pub deleted: usize,
    pub failed: usize,
}

pub struct OrphanCollector<'a, G: CalendarGateway + ?Sized> {
    gateway: &'a G,
    factory: &'a EventFactory,
}

impl<'a, G: CalendarGateway + ?Sized> OrphanCollector<'a, G> {
    pub fn new(gateway: &'a G, factory: &'a EventFactory) -> Self {
        OrphanCollector { gateway, factory }
    }

    /// Delete every app-generated event in `calendar_id` whose id is not in
    /// `valid_link_ids`.
    ///
    /// `valid_link_ids` must be computed after every link write of the pass
    /// has landed, otherwise a freshly created event looks orphaned.
    pub async fn collect(
        &self,
        calendar_id: &str,
        valid_link_ids: &HashSet<String>,
    ) -> ShiftcalResult<CollectReport> {
        let tagged = self
            .gateway
            .list_tagged(calendar_id, self.factory.prefix())
            .await?;

        let mut report = CollectReport::default();

        for event in tagged {
            if self.factory.decode_title(&event.title).is_none() {
                continue;
            }
            report.scanned += 1;

            if valid_link_ids.contains(&event.id) {
                continue;
            }

            match self.gateway.delete(&event.id).await {
                Ok(_) => {
                    log::info!("Deleted orphaned event '{}' ({})", event.title, event.id);
                    report.deleted += 1;
                }
                Err(e) => {
                    log::warn!("Could not delete orphan '{}' ({}): {}", event.title, event.id, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}
