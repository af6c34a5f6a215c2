use anyhow::Result;
use shiftcal_core::SyncEngine;
use shiftcal_core::config::SettingsCache;

use crate::utils::tui;

pub async fn run(settings: &mut SettingsCache, record_id: &str) -> Result<()> {
    let config = settings.get()?;
    let gateway = config.gateway();
    let store = config.store();
    let engine = SyncEngine::new(&gateway, &store, config.event_factory()?);

    let deleted = tui::with_spinner(
        format!("Deleting {}", record_id),
        engine.delete_record(record_id),
    )
    .await?;

    println!("Deleted record {} and {} calendar events", record_id, deleted);
    Ok(())
}
