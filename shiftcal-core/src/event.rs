//! Provider-neutral external event types.
//!
//! The engine never chooses event ids: they are assigned by the calendar
//! provider on insert and treated as opaque strings afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload for inserting an event into a target calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl fmt::Display for EventDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// An event as stored by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalEvent {
    pub id: String,
    pub calendar_id: String,
    pub title: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ExternalEvent {
    pub fn from_draft(id: String, calendar_id: &str, draft: &EventDraft) -> Self {
        ExternalEvent {
            id,
            calendar_id: calendar_id.to_string(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            start: draft.start,
            end: draft.end,
        }
    }
}

/// Result row of a title query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMatch {
    pub id: String,
    pub start: DateTime<Utc>,
}

/// Result row of a title-prefix listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedEvent {
    pub id: String,
    pub title: String,
}

/// A calendar offered by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarInfo {
    pub id: String,
    pub display_name: String,
    pub account_name: String,
}

impl fmt::Display for CalendarInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.account_name)
    }
}
