pub mod delete_event;
pub mod event_exists;
pub mod insert_event;
pub mod list_calendars;
pub mod list_tagged;
pub mod query_by_title;
