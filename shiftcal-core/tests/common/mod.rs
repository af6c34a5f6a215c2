#![allow(dead_code)]

use shiftcal_core::event::EventDraft;
use shiftcal_core::gateway::CalendarGateway;
use shiftcal_core::memory::{MemoryGateway, MemoryStore};
use shiftcal_core::{EventFactory, Link, ServiceRecord, SubPeriod, SyncEngine};

use chrono::{DateTime, Duration, TimeZone, Utc};

pub const USER: &str = "agent";

pub fn period(start: &str, end: &str, lines: &[&str]) -> SubPeriod {
    SubPeriod {
        start: start.to_string(),
        end: end.to_string(),
        lines: lines.iter().map(|l| l.to_string()).collect(),
        vehicles: vec![],
    }
}

pub fn single(id: &str, service: &str, date: &str, p1: SubPeriod) -> ServiceRecord {
    ServiceRecord {
        id: id.to_string(),
        user_id: USER.to_string(),
        date: date.to_string(),
        service_number: service.to_string(),
        sub_period1: p1,
        sub_period2: None,
        link: Link::default(),
    }
}

pub fn split(id: &str, service: &str, date: &str, p1: SubPeriod, p2: SubPeriod) -> ServiceRecord {
    ServiceRecord {
        sub_period2: Some(p2),
        ..single(id, service, date, p1)
    }
}

pub struct Fixture {
    pub gateway: MemoryGateway,
    pub store: MemoryStore,
}

impl Fixture {
    pub fn new(records: Vec<ServiceRecord>) -> Self {
        Fixture {
            gateway: MemoryGateway::new(),
            store: MemoryStore::with_records(records),
        }
    }

    pub fn engine(&self) -> SyncEngine<'_, MemoryGateway, MemoryStore> {
        SyncEngine::new(&self.gateway, &self.store, EventFactory::default())
    }

    pub async fn link(&self, record_id: &str) -> Link {
        self.store
            .record(record_id)
            .await
            .map(|r| r.link)
            .unwrap_or_default()
    }

    /// Insert an event as if someone else had created it.
    pub async fn insert_external(&self, calendar_id: &str, title: &str, start: DateTime<Utc>) -> String {
        self.gateway
            .insert(
                calendar_id,
                &EventDraft {
                    title: title.to_string(),
                    description: String::new(),
                    start,
                    end: start + Duration::hours(2),
                },
            )
            .await
            .unwrap()
    }
}

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}
