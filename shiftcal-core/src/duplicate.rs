//! Finding an already-present event for a sub-period.
//!
//! Title plus local day is a heuristic, not a uniqueness constraint: the
//! provider lets anyone create identically titled events. Matching on the
//! day instead of the exact instant tolerates small clock or timezone skew
//! introduced by the provider.

use std::collections::HashSet;

use crate::error::ShiftcalResult;
use crate::event::EventDraft;
use crate::event_factory::EventFactory;
use crate::gateway::CalendarGateway;
use crate::record::{ServiceRecord, SubPeriodIndex};

pub struct DuplicateDetector<'a, G: CalendarGateway + ?Sized> {
    gateway: &'a G,
    factory: &'a EventFactory,
}

impl<'a, G: CalendarGateway + ?Sized> DuplicateDetector<'a, G> {
    pub fn new(gateway: &'a G, factory: &'a EventFactory) -> Self {
        DuplicateDetector { gateway, factory }
    }

    /// Id of the first event in `calendar_id` carrying the expected title on
    /// the expected day, skipping ids already bound to a record (`claimed`).
    pub async fn find(
        &self,
        record: &ServiceRecord,
        index: SubPeriodIndex,
        calendar_id: &str,
        claimed: &HashSet<String>,
    ) -> ShiftcalResult<Option<String>> {
        match self.factory.build_event(record, index) {
            Some(draft) => self.find_draft(&draft, calendar_id, claimed).await,
            None => Ok(None),
        }
    }

    /// Same as [`DuplicateDetector::find`] for an already built payload.
    pub async fn find_draft(
        &self,
        draft: &EventDraft,
        calendar_id: &str,
        claimed: &HashSet<String>,
    ) -> ShiftcalResult<Option<String>> {
        let expected_day = self.factory.local_day(draft.start);
        let matches = self.gateway.query_by_title(calendar_id, &draft.title).await?;

        let found = matches
            .into_iter()
            .filter(|m| !claimed.contains(&m.id))
            .find(|m| self.factory.local_day(m.start) == expected_day)
            .map(|m| m.id);

        if let Some(id) = &found {
            log::debug!("Found existing event {} for '{}'", id, draft.title);
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryGateway;
    use crate::record::{Link, SubPeriod};
    use chrono::{Duration, TimeZone, Utc};

    fn make_record() -> ServiceRecord {
        ServiceRecord {
            id: "rec-1".to_string(),
            user_id: "agent".to_string(),
            date: "2026-01-26".to_string(),
            service_number: "41343".to_string(),
            sub_period1: SubPeriod {
                start: "05:30".to_string(),
                end: "12:06".to_string(),
                lines: vec!["056".to_string()],
                vehicles: vec![],
            },
            sub_period2: None,
            link: Link::default(),
        }
    }

    fn draft(title: &str, start: chrono::DateTime<Utc>) -> EventDraft {
        EventDraft {
            title: title.to_string(),
            description: String::new(),
            start,
            end: start + Duration::hours(6),
        }
    }

    #[tokio::test]
    async fn test_matches_same_day_despite_skew() {
        let gateway = MemoryGateway::new();
        let factory = EventFactory::default();
        // Provider shifted the start by 45 minutes
        let skewed = Utc.with_ymd_and_hms(2026, 1, 26, 5, 15, 0).unwrap();
        let id = gateway
            .insert("work", &draft("STIB 41343 L056", skewed))
            .await
            .unwrap();

        let detector = DuplicateDetector::new(&gateway, &factory);
        let found = detector
            .find(&make_record(), SubPeriodIndex::First, "work", &HashSet::new())
            .await
            .unwrap();

        assert_eq!(found, Some(id));
    }

    #[tokio::test]
    async fn test_ignores_other_days_and_calendars() {
        let gateway = MemoryGateway::new();
        let factory = EventFactory::default();
        let next_day = Utc.with_ymd_and_hms(2026, 1, 27, 4, 30, 0).unwrap();
        let same_day = Utc.with_ymd_and_hms(2026, 1, 26, 4, 30, 0).unwrap();
        gateway
            .insert("work", &draft("STIB 41343 L056", next_day))
            .await
            .unwrap();
        gateway
            .insert("personal", &draft("STIB 41343 L056", same_day))
            .await
            .unwrap();

        let detector = DuplicateDetector::new(&gateway, &factory);
        let found = detector
            .find(&make_record(), SubPeriodIndex::First, "work", &HashSet::new())
            .await
            .unwrap();

        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_skips_claimed_ids() {
        let gateway = MemoryGateway::new();
        let factory = EventFactory::default();
        let start = Utc.with_ymd_and_hms(2026, 1, 26, 4, 30, 0).unwrap();
        let first = gateway
            .insert("work", &draft("STIB 41343 L056", start))
            .await
            .unwrap();
        let second = gateway
            .insert("work", &draft("STIB 41343 L056", start))
            .await
            .unwrap();

        let claimed = HashSet::from([first]);
        let detector = DuplicateDetector::new(&gateway, &factory);
        let found = detector
            .find(&make_record(), SubPeriodIndex::First, "work", &claimed)
            .await
            .unwrap();

        assert_eq!(found, Some(second));
    }
}
