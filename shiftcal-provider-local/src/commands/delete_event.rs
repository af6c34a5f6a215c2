use anyhow::{Context, Result};
use shiftcal_core::gateway::protocol::DeleteEvent;

use crate::calendar_dir::CalendarDir;

/// Deleting an event that is already gone answers `false`, not an error.
pub fn handle(params: &serde_json::Value) -> Result<serde_json::Value> {
    let params: DeleteEvent = serde_json::from_value(params.clone())?;

    let deleted = CalendarDir::from_params(&params.provider_config)?
        .delete(&params.event_id)
        .with_context(|| format!("Failed to delete event: {}", params.event_id))?;

    Ok(serde_json::Value::Bool(deleted))
}
