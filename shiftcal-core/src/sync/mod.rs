//! Reconciliation of canonical records into a target calendar.

mod report;

use std::collections::HashSet;

pub use report::{PeriodCounts, PeriodOutcome, RecordFailure, SyncReport};

use crate::duplicate::DuplicateDetector;
use crate::error::{ShiftcalError, ShiftcalResult};
use crate::event::EventDraft;
use crate::event_factory::EventFactory;
use crate::gateway::CalendarGateway;
use crate::link_store::LinkStore;
use crate::orphan::OrphanCollector;
use crate::record::{Link, ServiceRecord};
use crate::store::RecordStore;

pub struct SyncEngine<'a, G: CalendarGateway + ?Sized, S: RecordStore + ?Sized> {
    gateway: &'a G,
    store: &'a S,
    factory: EventFactory,
}

impl<'a, G: CalendarGateway + ?Sized, S: RecordStore + ?Sized> SyncEngine<'a, G, S> {
    pub fn new(gateway: &'a G, store: &'a S, factory: EventFactory) -> Self {
        SyncEngine {
            gateway,
            store,
            factory,
        }
    }

    pub fn gateway(&self) -> &'a G {
        self.gateway
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    pub fn factory(&self) -> &EventFactory {
        &self.factory
    }

    /// Reconcile every record owned by `user_id` into `calendar_id`.
    pub async fn sync_user(&self, user_id: &str, calendar_id: &str) -> ShiftcalResult<SyncReport> {
        let records = self.store.list_records(user_id).await?;
        Ok(self.reconcile(&records, calendar_id).await)
    }

    /// Run one reconciliation pass.
    ///
    /// Failures are isolated per record and reported; they never abort the
    /// pass. Orphans are only collected after a pass that created nothing and
    /// failed nowhere.
    pub async fn reconcile(&self, records: &[ServiceRecord], calendar_id: &str) -> SyncReport {
        let mut report = SyncReport::default();

        // Every id some record points at, grown as the pass adopts and creates
        let mut claimed: HashSet<String> = records
            .iter()
            .flat_map(|r| r.link.ids())
            .map(String::from)
            .collect();
        let mut valid_link_ids: HashSet<String> = HashSet::new();

        for record in records {
            let link = self
                .reconcile_record(record, calendar_id, &mut claimed, &mut report)
                .await;
            valid_link_ids.extend(link.ids().map(String::from));
        }

        if report.created() == 0 && report.is_clean() {
            let collector = OrphanCollector::new(self.gateway, &self.factory);
            match collector.collect(calendar_id, &valid_link_ids).await {
                Ok(collected) => report.orphans = Some(collected),
                Err(e) => log::warn!("Orphan collection in '{}' failed: {}", calendar_id, e),
            }
        } else {
            log::debug!(
                "Skipping orphan collection ({} created, {} failed)",
                report.created(),
                report.failures.len()
            );
        }

        log::info!(
            "Reconciled {} records into '{}': {}",
            records.len(),
            calendar_id,
            report
        );

        report
    }

    /// Returns the link the record holds once the pass is done with it.
    async fn reconcile_record(
        &self,
        record: &ServiceRecord,
        calendar_id: &str,
        claimed: &mut HashSet<String>,
        report: &mut SyncReport,
    ) -> Link {
        let detector = DuplicateDetector::new(self.gateway, &self.factory);
        let mut link = record.link.clone();

        for (index, _) in record.sub_periods() {
            let Some(draft) = self.factory.build_event(record, index) else {
                continue;
            };

            let linked = LinkStore::new(self.store).read(record, index);
            match self
                .reconcile_period(&detector, &draft, linked, calendar_id, claimed)
                .await
            {
                Ok(outcome) => {
                    log::debug!("{} {}: {:?}", record, index, outcome);
                    if let Some(id) = outcome.new_link() {
                        claimed.insert(id.to_string());
                        link.set(index, Some(id.to_string()));
                    }
                    report.record(index, &outcome);
                }
                Err(e) => {
                    log::warn!("Failed to reconcile {} {}: {}", record, index, e);
                    report.fail(&record.id, format!("{}: {}", index, e));
                }
            }
        }

        if !record.is_two_period() && link.part2.is_some() {
            log::info!("Dropping second-period link of single-period {}", record);
            link.part2 = None;
        }

        if link.same_ids(&record.link) {
            return link;
        }

        match LinkStore::new(self.store)
            .write(&record.id, link.part1.clone(), link.part2.clone())
            .await
        {
            Ok(written) => {
                report.links_written += 1;
                written
            }
            Err(e) => {
                log::warn!("Failed to write link for {}: {}", record, e);
                report.fail(&record.id, format!("link write: {}", e));
                record.link.clone()
            }
        }
    }

    async fn reconcile_period(
        &self,
        detector: &DuplicateDetector<'_, G>,
        draft: &EventDraft,
        linked: Option<&str>,
        calendar_id: &str,
        claimed: &HashSet<String>,
    ) -> ShiftcalResult<PeriodOutcome> {
        if let Some(id) = linked {
            if self.gateway.exists(id).await? {
                return Ok(PeriodOutcome::Skipped);
            }
            log::info!("Linked event {} for '{}' is gone", id, draft.title);
        }

        if let Some(id) = detector.find_draft(draft, calendar_id, claimed).await? {
            return Ok(PeriodOutcome::Repaired(id));
        }

        let id = self.gateway.insert(calendar_id, draft).await?;
        Ok(PeriodOutcome::Created(id))
    }

    /// Delete the external events linked to a stored record, then clear its
    /// links. Returns how many events were actually removed.
    pub async fn delete_linked_events(&self, record_id: &str) -> ShiftcalResult<usize> {
        let record = self
            .store
            .get_record(record_id)
            .await?
            .ok_or_else(|| ShiftcalError::RecordNotFound(record_id.to_string()))?;

        let deleted = self.delete_events_of(&record).await?;
        if !record.link.is_empty() {
            LinkStore::new(self.store).clear(record_id).await?;
        }
        Ok(deleted)
    }

    /// Delete the external events linked to `record`, which may already be
    /// gone from the store. Events that no longer exist are not an error.
    pub async fn delete_events_of(&self, record: &ServiceRecord) -> ShiftcalResult<usize> {
        let mut deleted = 0;
        for id in record.link.ids() {
            if self.gateway.delete(id).await? {
                deleted += 1;
            } else {
                log::debug!("Event {} of {} was already gone", id, record);
            }
        }
        Ok(deleted)
    }

    /// Delete a record together with its linked events.
    pub async fn delete_record(&self, record_id: &str) -> ShiftcalResult<usize> {
        let deleted = self.delete_linked_events(record_id).await?;
        self.store.delete_record(record_id).await?;
        log::info!("Deleted record {} and {} events", record_id, deleted);
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{GatewayOp, MemoryGateway, MemoryStore};
    use crate::record::SubPeriod;

    fn period(start: &str, end: &str, line: &str) -> SubPeriod {
        SubPeriod {
            start: start.to_string(),
            end: end.to_string(),
            lines: vec![line.to_string()],
            vehicles: vec![],
        }
    }

    fn make_record(id: &str, service: &str, second: Option<SubPeriod>) -> ServiceRecord {
        ServiceRecord {
            id: id.to_string(),
            user_id: "agent".to_string(),
            date: "2026-01-26".to_string(),
            service_number: service.to_string(),
            sub_period1: period("05:30", "09:00", "056"),
            sub_period2: second,
            link: Link::default(),
        }
    }

    #[tokio::test]
    async fn test_creates_then_skips() {
        let gateway = MemoryGateway::new();
        let store = MemoryStore::with_records(vec![make_record("rec-1", "41343", None)]);
        let engine = SyncEngine::new(&gateway, &store, EventFactory::default());

        let first = engine.sync_user("agent", "work").await.unwrap();
        assert_eq!(first.part1.created, 1);
        assert_eq!(first.links_written, 1);
        assert!(first.orphans.is_none());

        let second = engine.sync_user("agent", "work").await.unwrap();
        assert_eq!(second.part1.skipped, 1);
        assert_eq!(second.links_written, 0);
        assert_eq!(second.orphans_deleted(), 0);
        assert_eq!(gateway.insert_count().await, 1);
    }

    #[tokio::test]
    async fn test_exists_error_is_a_failure_not_a_recreate() {
        let gateway = MemoryGateway::new();
        let store = MemoryStore::with_records(vec![make_record("rec-1", "41343", None)]);
        let engine = SyncEngine::new(&gateway, &store, EventFactory::default());
        engine.sync_user("agent", "work").await.unwrap();

        gateway.fail_op(GatewayOp::Exists).await;
        let report = engine.sync_user("agent", "work").await.unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].record_id, "rec-1");
        assert_eq!(gateway.insert_count().await, 1);
        assert!(report.orphans.is_none());
    }

    #[tokio::test]
    async fn test_drops_stale_second_link() {
        let gateway = MemoryGateway::new();
        let two = make_record("rec-1", "51200", Some(period("14:00", "18:00", "092")));
        let store = MemoryStore::with_records(vec![two.clone()]);
        let engine = SyncEngine::new(&gateway, &store, EventFactory::default());
        engine.sync_user("agent", "work").await.unwrap();
        assert_eq!(gateway.events("work").await.len(), 2);

        // Edited down to a single period
        let mut edited = store.record("rec-1").await.unwrap();
        edited.sub_period2 = None;
        store.put_record(edited).await;

        // The first-period link still resolves, so nothing is created and
        // the now unlinked second event is collected in the same pass
        let report = engine.sync_user("agent", "work").await.unwrap();
        assert_eq!(report.part1.skipped, 1);
        assert_eq!(report.links_written, 1);
        assert_eq!(report.orphans_deleted(), 1);

        let link = store.record("rec-1").await.unwrap().link;
        assert!(link.part2.is_none());
        assert_eq!(gateway.events("work").await.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_record_removes_events() {
        let gateway = MemoryGateway::new();
        let two = make_record("rec-1", "51200", Some(period("14:00", "18:00", "092")));
        let store = MemoryStore::with_records(vec![two]);
        let engine = SyncEngine::new(&gateway, &store, EventFactory::default());
        engine.sync_user("agent", "work").await.unwrap();

        let deleted = engine.delete_record("rec-1").await.unwrap();

        assert_eq!(deleted, 2);
        assert!(gateway.events("work").await.is_empty());
        assert!(store.record("rec-1").await.is_none());
    }

    #[tokio::test]
    async fn test_delete_linked_events_tolerates_missing_events() {
        let gateway = MemoryGateway::new();
        let store = MemoryStore::with_records(vec![make_record("rec-1", "41343", None)]);
        let engine = SyncEngine::new(&gateway, &store, EventFactory::default());
        engine.sync_user("agent", "work").await.unwrap();

        let id = store.record("rec-1").await.unwrap().link.part1.unwrap();
        gateway.delete(&id).await.unwrap();

        let deleted = engine.delete_linked_events("rec-1").await.unwrap();
        assert_eq!(deleted, 0);
        assert!(store.record("rec-1").await.unwrap().link.is_empty());

        let missing = engine.delete_linked_events("nope").await;
        assert!(matches!(missing, Err(ShiftcalError::RecordNotFound(_))));
    }
}
