use anyhow::{Context, Result};
use shiftcal_core::gateway::protocol::InsertEvent;

use crate::calendar_dir::CalendarDir;

pub fn handle(params: &serde_json::Value) -> Result<serde_json::Value> {
    let params: InsertEvent = serde_json::from_value(params.clone())?;

    let id = CalendarDir::from_params(&params.provider_config)?
        .insert(&params.calendar_id, &params.event)
        .with_context(|| format!("Failed to insert '{}'", params.event))?;

    Ok(serde_json::Value::String(id))
}
