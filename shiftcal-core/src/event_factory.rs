//! Mapping from service records to external event payloads.
//!
//! Titles are the only identity an event carries inside the target calendar,
//! so the title rule here is shared by duplicate detection and orphan
//! collection:
//!
//! - single period: `<prefix> <service>[ L<line>...]`
//! - two periods:   `<prefix> <service> P<n>[ L<line>...]`
//!
//! Whitespace inside a service number or line id is written as `-` and a
//! blank service number as `-`, so every generated title decodes again.

use chrono::{DateTime, Days, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::event::EventDraft;
use crate::record::{ServiceRecord, SubPeriod, SubPeriodIndex};

pub const DEFAULT_TITLE_PREFIX: &str = "STIB";
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Brussels;

const BLANK_TOKEN: &str = "-";

#[derive(Debug, Clone)]
pub struct EventFactory {
    prefix: String,
    timezone: Tz,
}

/// The parts of an app-generated title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTitle {
    pub service_number: String,
    pub sub_period: Option<SubPeriodIndex>,
    pub lines: Vec<String>,
}

impl Default for EventFactory {
    fn default() -> Self {
        EventFactory::new(DEFAULT_TITLE_PREFIX, DEFAULT_TIMEZONE)
    }
}

impl EventFactory {
    pub fn new(prefix: impl Into<String>, timezone: Tz) -> Self {
        EventFactory {
            prefix: prefix.into(),
            timezone,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Build the insert payload for one sub-period of a record.
    /// Returns `None` if the record has no such sub-period.
    pub fn build_event(&self, record: &ServiceRecord, index: SubPeriodIndex) -> Option<EventDraft> {
        let period = record.sub_period(index)?;
        let (start, end) = self.period_range(record, period);

        Some(EventDraft {
            title: self.period_title(record, index, period),
            description: self.description(record, period),
            start,
            end,
        })
    }

    pub fn title(&self, record: &ServiceRecord, index: SubPeriodIndex) -> Option<String> {
        let period = record.sub_period(index)?;
        Some(self.period_title(record, index, period))
    }

    /// Absolute start and end of a sub-period.
    pub fn time_range(
        &self,
        record: &ServiceRecord,
        index: SubPeriodIndex,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let period = record.sub_period(index)?;
        Some(self.period_range(record, period))
    }

    /// Calendar day of an instant in the anchor timezone.
    pub fn local_day(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    /// Parse a title produced by this factory. Anything else yields `None`,
    /// including user events that merely start with the prefix.
    pub fn decode_title(&self, title: &str) -> Option<DecodedTitle> {
        let rest = title.strip_prefix(self.prefix.as_str())?.strip_prefix(' ')?;
        let mut tokens = rest.split(' ');

        let service_number = tokens.next().filter(|s| !s.is_empty())?.to_string();
        let mut sub_period = None;
        let mut lines = Vec::new();

        for (pos, token) in tokens.enumerate() {
            if pos == 0 {
                let index = token
                    .strip_prefix('P')
                    .and_then(|n| n.parse::<u8>().ok())
                    .and_then(SubPeriodIndex::from_number);
                if index.is_some() {
                    sub_period = index;
                    continue;
                }
            }
            let line = token.strip_prefix('L').filter(|l| !l.is_empty())?;
            lines.push(line.to_string());
        }

        Some(DecodedTitle {
            service_number,
            sub_period,
            lines,
        })
    }

    fn period_title(&self, record: &ServiceRecord, index: SubPeriodIndex, period: &SubPeriod) -> String {
        let service = match title_token(&record.service_number) {
            token if token.is_empty() => BLANK_TOKEN.to_string(),
            token => token,
        };
        let mut title = format!("{} {}", self.prefix, service);

        if record.is_two_period() {
            title.push_str(&format!(" {}", index));
        }

        for line in period.lines.iter().map(|l| title_token(l)).filter(|l| !l.is_empty()) {
            title.push_str(&format!(" L{}", line));
        }

        title
    }

    fn description(&self, record: &ServiceRecord, period: &SubPeriod) -> String {
        let lines = join_or_dash(&period.lines);
        let vehicles = join_or_dash(&period.vehicles);

        format!(
            "Service {}\nDate: {}\nTime: {} - {}\nLines: {}\nVehicles: {}",
            record.service_number.trim(),
            record.date.trim(),
            display_time(&period.start),
            display_time(&period.end),
            lines,
            vehicles
        )
    }

    /// Malformed inputs fall back to the current instant; the record is still
    /// mirrored so the problem stays visible to the user.
    fn period_range(&self, record: &ServiceRecord, period: &SubPeriod) -> (DateTime<Utc>, DateTime<Utc>) {
        let Some(date) = parse_date(&record.date) else {
            log::warn!("Malformed date '{}' in {}, using current time", record.date, record);
            let now = Utc::now();
            return (now, now);
        };

        let start_time = parse_roster_time(&period.start);
        let end_time = parse_roster_time(&period.end);

        let start = match start_time {
            Some(time) => self.anchor_roster(date, time),
            None => {
                log::warn!("Malformed start time '{}' in {}, using current time", period.start, record);
                Utc::now()
            }
        };

        let end = match (start_time, end_time) {
            // Shift running past midnight
            (Some(s), Some(e)) if e < s => self.anchor_roster(date, e.next_day()),
            (_, Some(e)) => self.anchor_roster(date, e),
            (_, None) => {
                log::warn!("Malformed end time '{}' in {}, using current time", period.end, record);
                Utc::now()
            }
        };

        (start, end)
    }

    fn anchor_roster(&self, date: NaiveDate, time: RosterTime) -> DateTime<Utc> {
        match date.checked_add_days(Days::new(u64::from(time.days))) {
            Some(day) => self.anchor(day, time.time),
            None => self.anchor(date, time.time),
        }
    }

    fn anchor(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let local = date.and_time(time);

        match self.timezone.from_local_datetime(&local) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
            // Inside a DST gap: the wall clock jumps forward one hour
            LocalResult::None => self
                .timezone
                .from_local_datetime(&(local + Duration::hours(1)))
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&local)),
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// A roster clock reading. Rosters write times after midnight as `24:00`
/// to `47:59`, which land on a later day than the service date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RosterTime {
    pub days: u32,
    pub time: NaiveTime,
}

impl RosterTime {
    fn next_day(self) -> Self {
        RosterTime {
            days: self.days + 1,
            ..self
        }
    }
}

impl std::fmt::Display for RosterTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use chrono::Timelike;
        write!(f, "{:02}:{:02}", self.days * 24 + self.time.hour(), self.time.minute())
    }
}

/// Accepts `HH:MM`, `H:MM` and `HHMM`, with hours up to 47.
pub fn parse_roster_time(raw: &str) -> Option<RosterTime> {
    let raw = raw.trim();

    let (hours, minutes) = match raw.split_once(':') {
        Some(parts) => parts,
        None if raw.len() == 4 && raw.chars().all(|c| c.is_ascii_digit()) => raw.split_at(2),
        None => return None,
    };

    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if !digits(hours) || hours.len() > 2 || !digits(minutes) || minutes.len() != 2 {
        return None;
    }

    let hours: u32 = hours.parse().ok()?;
    if hours >= 48 {
        return None;
    }

    Some(RosterTime {
        days: hours / 24,
        time: NaiveTime::from_hms_opt(hours % 24, minutes.parse().ok()?, 0)?,
    })
}

fn display_time(raw: &str) -> String {
    parse_roster_time(raw)
        .map(|t| t.to_string())
        .unwrap_or_else(|| raw.trim().to_string())
}

fn title_token(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join("-")
}

fn join_or_dash(items: &[String]) -> String {
    let items: Vec<&str> = items.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
