//! Access to the external (mirror) calendar store.
//!
//! The engine only ever talks to a [`CalendarGateway`]. Events in the target
//! calendar can be edited or deleted by the user at any time, so nothing
//! returned here is cached across calls.

pub mod protocol;
pub mod provider;

use async_trait::async_trait;

use crate::error::ShiftcalResult;
use crate::event::{CalendarInfo, EventDraft, EventMatch, TaggedEvent};

pub use provider::{Provider, ProviderGateway};

#[async_trait]
pub trait CalendarGateway: Send + Sync {
    /// Insert an event, returning the id assigned by the provider.
    async fn insert(&self, calendar_id: &str, draft: &EventDraft) -> ShiftcalResult<String>;

    async fn exists(&self, event_id: &str) -> ShiftcalResult<bool>;

    /// Delete an event. Returns `false` if it was already gone.
    async fn delete(&self, event_id: &str) -> ShiftcalResult<bool>;

    /// Events in `calendar_id` whose title is exactly `title`.
    async fn query_by_title(&self, calendar_id: &str, title: &str)
    -> ShiftcalResult<Vec<EventMatch>>;

    /// Events in `calendar_id` whose title starts with `title_prefix`.
    async fn list_tagged(
        &self,
        calendar_id: &str,
        title_prefix: &str,
    ) -> ShiftcalResult<Vec<TaggedEvent>>;

    async fn list_calendars(&self) -> ShiftcalResult<Vec<CalendarInfo>>;
}
