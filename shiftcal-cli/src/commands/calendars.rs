use anyhow::Result;
use owo_colors::OwoColorize;
use shiftcal_core::config::SettingsCache;
use shiftcal_core::gateway::CalendarGateway;

use crate::render::Render;
use crate::utils::tui;

pub async fn run(settings: &mut SettingsCache) -> Result<()> {
    let config = settings.get()?;
    let gateway = config.gateway();

    let calendars = tui::with_spinner(
        format!("Asking {} for calendars", gateway.provider().name()),
        gateway.list_calendars(),
    )
    .await?;

    if calendars.is_empty() {
        println!("{}", "No calendars found".dimmed());
        return Ok(());
    }

    for calendar in &calendars {
        let marker = if config.calendar_id.as_deref() == Some(calendar.id.as_str()) {
            "*".green().to_string()
        } else {
            " ".to_string()
        };
        println!("{} {}", marker, calendar.render());
    }

    Ok(())
}
