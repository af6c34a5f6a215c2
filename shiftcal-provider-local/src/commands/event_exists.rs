use anyhow::Result;
use shiftcal_core::gateway::protocol::EventExists;

use crate::calendar_dir::CalendarDir;

pub fn handle(params: &serde_json::Value) -> Result<serde_json::Value> {
    let params: EventExists = serde_json::from_value(params.clone())?;

    let exists = CalendarDir::from_params(&params.provider_config)?.exists(&params.event_id)?;

    Ok(serde_json::Value::Bool(exists))
}
