pub mod calendars;
pub mod config;
pub mod delete;
pub mod migrate;
pub mod sync;
