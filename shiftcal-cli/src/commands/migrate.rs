use anyhow::Result;
use owo_colors::OwoColorize;
use shiftcal_core::config::{SettingsCache, ShiftcalConfig};
use shiftcal_core::{MigrationCoordinator, SyncEngine};

use crate::render::Render;
use crate::utils::tui;

pub async fn run(settings: &mut SettingsCache, to: &str, from: Option<&str>) -> Result<()> {
    let config = settings.get()?.clone();
    let user_id = config.user_id()?.to_string();
    let from = match from {
        Some(id) => id.to_string(),
        None => config.calendar_id()?.to_string(),
    };

    let gateway = config.gateway();
    let store = config.store();
    let engine = SyncEngine::new(&gateway, &store, config.event_factory()?);
    let coordinator = MigrationCoordinator::new(&engine);

    let report = tui::with_spinner(
        format!("Moving services from {} to {}", from, to),
        coordinator.migrate(&user_id, &from, to),
    )
    .await?;

    println!("📅 {} → {}", from.dimmed(), to.bold());
    println!("{}", report.render());

    ShiftcalConfig::write_calendar_id(settings.path(), to)?;
    settings.invalidate();

    println!("\nTarget calendar is now {}", to.green());
    Ok(())
}
