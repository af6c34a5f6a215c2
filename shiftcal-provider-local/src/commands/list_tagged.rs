use anyhow::Result;
use shiftcal_core::gateway::protocol::ListTagged;

use crate::calendar_dir::CalendarDir;

pub fn handle(params: &serde_json::Value) -> Result<serde_json::Value> {
    let params: ListTagged = serde_json::from_value(params.clone())?;

    let tagged = CalendarDir::from_params(&params.provider_config)?
        .list_tagged(&params.calendar_id, &params.title_prefix)?;

    Ok(serde_json::to_value(tagged)?)
}
