//! Moving the mirror from one target calendar to another.
//!
//! Three stages run strictly in order: purge the old calendar, reset every
//! link, resync into the new calendar. Nothing is rolled back on failure;
//! running the migration (or a plain reconcile) again converges.

use crate::error::{MigrationStage, ShiftcalError, ShiftcalResult};
use crate::gateway::CalendarGateway;
use crate::record::Link;
use crate::store::RecordStore;
use crate::sync::{SyncEngine, SyncReport};

#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    /// App-generated events removed from the old calendar
    pub purged: usize,
    pub purge_failures: usize,
    /// Records whose links were cleared
    pub links_reset: usize,
    pub sync: SyncReport,
}

pub struct MigrationCoordinator<'e, 'a, G: CalendarGateway + ?Sized, S: RecordStore + ?Sized> {
    engine: &'e SyncEngine<'a, G, S>,
}

impl<'e, 'a, G: CalendarGateway + ?Sized, S: RecordStore + ?Sized> MigrationCoordinator<'e, 'a, G, S> {
    pub fn new(engine: &'e SyncEngine<'a, G, S>) -> Self {
        MigrationCoordinator { engine }
    }

    pub async fn migrate(
        &self,
        user_id: &str,
        old_calendar_id: &str,
        new_calendar_id: &str,
    ) -> ShiftcalResult<MigrationReport> {
        log::info!(
            "Migrating {} from '{}' to '{}'",
            user_id,
            old_calendar_id,
            new_calendar_id
        );

        let mut report = MigrationReport::default();

        let (purged, purge_failures) = self.purge(old_calendar_id).await?;
        report.purged = purged;
        report.purge_failures = purge_failures;

        let records = self
            .engine
            .store()
            .list_records(user_id)
            .await
            .map_err(|e| stage_error(MigrationStage::Reset, e))?;

        let mut reset = Vec::with_capacity(records.len());
        for mut record in records {
            if !record.link.is_empty() {
                self.engine
                    .store()
                    .clear_links(&record.id)
                    .await
                    .map_err(|e| stage_error(MigrationStage::Reset, e))?;
                record.link = Link::default();
                report.links_reset += 1;
            }
            reset.push(record);
        }
        log::debug!("Cleared links of {} records", report.links_reset);

        report.sync = self.engine.reconcile(&reset, new_calendar_id).await;

        if let Some(first) = report.sync.failures.first() {
            return Err(ShiftcalError::Migration {
                stage: MigrationStage::Resync,
                message: format!(
                    "{} records failed, first {}: {}",
                    report.sync.failures.len(),
                    first.record_id,
                    first.message
                ),
            });
        }

        log::info!(
            "Migration done: {} purged, {} links reset, {}",
            report.purged,
            report.links_reset,
            report.sync
        );
        Ok(report)
    }

    /// Returns (deleted, failed).
    async fn purge(&self, calendar_id: &str) -> ShiftcalResult<(usize, usize)> {
        let gateway = self.engine.gateway();
        let factory = self.engine.factory();

        let tagged = gateway
            .list_tagged(calendar_id, factory.prefix())
            .await
            .map_err(|e| stage_error(MigrationStage::Purge, e))?;

        let mut deleted = 0;
        let mut failed = 0;
        for event in tagged {
            if factory.decode_title(&event.title).is_none() {
                continue;
            }
            match gateway.delete(&event.id).await {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(e) => {
                    log::warn!("Could not purge '{}' ({}): {}", event.title, event.id, e);
                    failed += 1;
                }
            }
        }

        Ok((deleted, failed))
    }
}

fn stage_error(stage: MigrationStage, error: ShiftcalError) -> ShiftcalError {
    ShiftcalError::Migration {
        stage,
        message: error.to_string(),
    }
}
