use anyhow::Result;
use shiftcal_core::gateway::protocol::QueryByTitle;

use crate::calendar_dir::CalendarDir;

pub fn handle(params: &serde_json::Value) -> Result<serde_json::Value> {
    let params: QueryByTitle = serde_json::from_value(params.clone())?;

    let matches = CalendarDir::from_params(&params.provider_config)?
        .query_by_title(&params.calendar_id, &params.title)?;

    Ok(serde_json::to_value(matches)?)
}
