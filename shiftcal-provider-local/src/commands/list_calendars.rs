use anyhow::Result;
use shiftcal_core::gateway::protocol::ListCalendars;

use crate::calendar_dir::CalendarDir;

pub fn handle(params: &serde_json::Value) -> Result<serde_json::Value> {
    let params: ListCalendars = serde_json::from_value(params.clone())?;

    let calendars = CalendarDir::from_params(&params.provider_config)?.calendars()?;

    Ok(serde_json::to_value(calendars)?)
}
