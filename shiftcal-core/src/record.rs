//! Canonical service (shift) records and their calendar links.
//!
//! These mirror the documents kept by the upstream document store, so field
//! names follow its camelCase schema when serialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One worked service on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    /// Calendar day as stored upstream (`YYYY-MM-DD`)
    pub date: String,
    pub service_number: String,
    pub sub_period1: SubPeriod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_period2: Option<SubPeriod>,
    #[serde(flatten)]
    pub link: Link,
}

/// A continuous stretch of work inside a service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubPeriod {
    /// Start time of day, `HH:MM` or `HHMM`
    pub start: String,
    /// End time of day, `HH:MM` or `HHMM`
    pub end: String,
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(default)]
    pub vehicles: Vec<String>,
}

impl SubPeriod {
    fn is_filled(&self) -> bool {
        !self.start.trim().is_empty() && !self.end.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubPeriodIndex {
    First,
    Second,
}

impl SubPeriodIndex {
    pub const ALL: [SubPeriodIndex; 2] = [SubPeriodIndex::First, SubPeriodIndex::Second];

    pub fn number(self) -> u8 {
        match self {
            SubPeriodIndex::First => 1,
            SubPeriodIndex::Second => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(SubPeriodIndex::First),
            2 => Some(SubPeriodIndex::Second),
            _ => None,
        }
    }
}

impl fmt::Display for SubPeriodIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.number())
    }
}

impl ServiceRecord {
    /// A second sub-period only counts when both of its bounds are filled in.
    pub fn is_two_period(&self) -> bool {
        self.sub_period2.as_ref().is_some_and(SubPeriod::is_filled)
    }

    pub fn sub_period(&self, index: SubPeriodIndex) -> Option<&SubPeriod> {
        match index {
            SubPeriodIndex::First => Some(&self.sub_period1),
            SubPeriodIndex::Second if self.is_two_period() => self.sub_period2.as_ref(),
            SubPeriodIndex::Second => None,
        }
    }

    /// Sub-periods that must be mirrored, in order.
    pub fn sub_periods(&self) -> impl Iterator<Item = (SubPeriodIndex, &SubPeriod)> {
        SubPeriodIndex::ALL
            .into_iter()
            .filter_map(|index| self.sub_period(index).map(|p| (index, p)))
    }
}

impl fmt::Display for ServiceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "service {} on {} ({})", self.service_number, self.date, self.id)
    }
}

/// External event ids bound to a record's sub-periods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(rename = "linkIdPartie1", default, skip_serializing_if = "Option::is_none")]
    pub part1: Option<String>,
    #[serde(rename = "linkIdPartie2", default, skip_serializing_if = "Option::is_none")]
    pub part2: Option<String>,
    #[serde(rename = "lastSynced", default, skip_serializing_if = "Option::is_none")]
    pub last_synced: Option<DateTime<Utc>>,
}

impl Link {
    pub fn get(&self, index: SubPeriodIndex) -> Option<&str> {
        match index {
            SubPeriodIndex::First => self.part1.as_deref(),
            SubPeriodIndex::Second => self.part2.as_deref(),
        }
    }

    pub fn set(&mut self, index: SubPeriodIndex, event_id: Option<String>) {
        match index {
            SubPeriodIndex::First => self.part1 = event_id,
            SubPeriodIndex::Second => self.part2 = event_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.part1.is_none() && self.part2.is_none()
    }

    /// Both sub-period ids, ignoring the timestamp.
    pub fn same_ids(&self, other: &Link) -> bool {
        self.part1 == other.part1 && self.part2 == other.part2
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.part1.iter().chain(self.part2.iter()).map(String::as_str)
    }
}
