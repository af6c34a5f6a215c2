use anyhow::Result;
use owo_colors::OwoColorize;
use shiftcal_core::SyncEngine;
use shiftcal_core::config::SettingsCache;

use crate::render::Render;
use crate::utils::tui;

pub async fn run(settings: &mut SettingsCache, calendar: Option<&str>) -> Result<()> {
    let config = settings.get()?;
    let user_id = config.user_id()?;
    let calendar_id = match calendar {
        Some(id) => id,
        None => config.calendar_id()?,
    };

    if let Some(warning) = retarget_warning(config.calendar_id.as_deref(), calendar_id) {
        log::warn!("{}", warning);
    }

    let gateway = config.gateway();
    let store = config.store();
    let engine = SyncEngine::new(&gateway, &store, config.event_factory()?);

    let report = tui::with_spinner(
        format!("Syncing services into {}", calendar_id),
        engine.sync_user(user_id, calendar_id),
    )
    .await?;

    println!("📅 {}", calendar_id.bold());
    println!("{}", report.render());

    if !report.is_clean() {
        anyhow::bail!(
            "{} records could not be synced, run `shiftcal sync` again to retry",
            report.failures.len()
        );
    }

    Ok(())
}

/// Linked events are not moved by syncing elsewhere, only by `migrate`.
fn retarget_warning(configured: Option<&str>, calendar_id: &str) -> Option<String> {
    let configured = configured.filter(|c| *c != calendar_id)?;
    Some(format!(
        "Services already mirrored into {} stay there; run `shiftcal migrate --to {}` to move them",
        configured, calendar_id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warns_only_when_leaving_configured_calendar() {
        assert!(retarget_warning(Some("work"), "work").is_none());
        assert!(retarget_warning(None, "work").is_none());

        let warning = retarget_warning(Some("work"), "night").unwrap();
        assert!(warning.contains("shiftcal migrate --to night"));
    }
}
