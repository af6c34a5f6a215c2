//! In-process gateway and store.
//!
//! Hosts that keep records and the mirror calendar in memory can use these
//! directly; the test suite uses them with failure injection to simulate a
//! flaky platform calendar.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::Mutex;

use crate::error::{ShiftcalError, ShiftcalResult};
use crate::event::{CalendarInfo, EventDraft, EventMatch, ExternalEvent, TaggedEvent};
use crate::gateway::CalendarGateway;
use crate::record::{Link, ServiceRecord};
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    Insert,
    Exists,
    Delete,
    QueryByTitle,
    ListTagged,
    ListCalendars,
}

#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<GatewayState>,
}

#[derive(Default)]
struct GatewayState {
    calendars: Vec<CalendarInfo>,
    /// Insertion order is kept so title queries are deterministic
    events: Vec<ExternalEvent>,
    failing_ops: HashSet<GatewayOp>,
    failing_titles: HashSet<String>,
    inserts: usize,
}

impl GatewayState {
    fn check(&self, op: GatewayOp) -> ShiftcalResult<()> {
        if self.failing_ops.contains(&op) {
            return Err(ShiftcalError::Gateway(format!("{:?} unavailable", op)));
        }
        Ok(())
    }

    fn check_title(&self, title: &str) -> ShiftcalResult<()> {
        if self.failing_titles.contains(title) {
            return Err(ShiftcalError::Gateway(format!("Calendar rejected '{}'", title)));
        }
        Ok(())
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_calendars(calendars: Vec<CalendarInfo>) -> Self {
        MemoryGateway {
            state: Mutex::new(GatewayState {
                calendars,
                ..Default::default()
            }),
        }
    }

    pub async fn events(&self, calendar_id: &str) -> Vec<ExternalEvent> {
        let state = self.state.lock().await;
        state
            .events
            .iter()
            .filter(|e| e.calendar_id == calendar_id)
            .cloned()
            .collect()
    }

    pub async fn event(&self, event_id: &str) -> Option<ExternalEvent> {
        let state = self.state.lock().await;
        state.events.iter().find(|e| e.id == event_id).cloned()
    }

    /// Number of successful inserts since creation.
    pub async fn insert_count(&self) -> usize {
        self.state.lock().await.inserts
    }

    /// Make every call of `op` fail until [`MemoryGateway::heal`].
    pub async fn fail_op(&self, op: GatewayOp) {
        self.state.lock().await.failing_ops.insert(op);
    }

    /// Make inserts and title queries for `title` fail until healed.
    pub async fn fail_title(&self, title: &str) {
        self.state.lock().await.failing_titles.insert(title.to_string());
    }

    pub async fn heal(&self) {
        let mut state = self.state.lock().await;
        state.failing_ops.clear();
        state.failing_titles.clear();
    }
}

#[async_trait]
impl CalendarGateway for MemoryGateway {
    async fn insert(&self, calendar_id: &str, draft: &EventDraft) -> ShiftcalResult<String> {
        let mut state = self.state.lock().await;
        state.check(GatewayOp::Insert)?;
        state.check_title(&draft.title)?;

        let id = uuid::Uuid::new_v4().to_string();
        state
            .events
            .push(ExternalEvent::from_draft(id.clone(), calendar_id, draft));
        state.inserts += 1;
        Ok(id)
    }

    async fn exists(&self, event_id: &str) -> ShiftcalResult<bool> {
        let state = self.state.lock().await;
        state.check(GatewayOp::Exists)?;
        Ok(state.events.iter().any(|e| e.id == event_id))
    }

    async fn delete(&self, event_id: &str) -> ShiftcalResult<bool> {
        let mut state = self.state.lock().await;
        state.check(GatewayOp::Delete)?;

        let before = state.events.len();
        state.events.retain(|e| e.id != event_id);
        Ok(state.events.len() < before)
    }

    async fn query_by_title(
        &self,
        calendar_id: &str,
        title: &str,
    ) -> ShiftcalResult<Vec<EventMatch>> {
        let state = self.state.lock().await;
        state.check(GatewayOp::QueryByTitle)?;
        state.check_title(title)?;

        Ok(state
            .events
            .iter()
            .filter(|e| e.calendar_id == calendar_id && e.title == title)
            .map(|e| EventMatch {
                id: e.id.clone(),
                start: e.start,
            })
            .collect())
    }

    async fn list_tagged(
        &self,
        calendar_id: &str,
        title_prefix: &str,
    ) -> ShiftcalResult<Vec<TaggedEvent>> {
        let state = self.state.lock().await;
        state.check(GatewayOp::ListTagged)?;

        Ok(state
            .events
            .iter()
            .filter(|e| e.calendar_id == calendar_id && e.title.starts_with(title_prefix))
            .map(|e| TaggedEvent {
                id: e.id.clone(),
                title: e.title.clone(),
            })
            .collect())
    }

    async fn list_calendars(&self) -> ShiftcalResult<Vec<CalendarInfo>> {
        let state = self.state.lock().await;
        state.check(GatewayOp::ListCalendars)?;
        Ok(state.calendars.clone())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, ServiceRecord>>,
    failing_writes: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ServiceRecord>) -> Self {
        MemoryStore {
            records: Mutex::new(records.into_iter().map(|r| (r.id.clone(), r)).collect()),
            failing_writes: Mutex::default(),
        }
    }

    pub async fn put_record(&self, record: ServiceRecord) {
        self.records.lock().await.insert(record.id.clone(), record);
    }

    pub async fn record(&self, record_id: &str) -> Option<ServiceRecord> {
        self.records.lock().await.get(record_id).cloned()
    }

    /// Make link writes for `record_id` fail until [`MemoryStore::heal`].
    pub async fn fail_writes_for(&self, record_id: &str) {
        self.failing_writes.lock().await.insert(record_id.to_string());
    }

    pub async fn heal(&self) {
        self.failing_writes.lock().await.clear();
    }

    async fn update_link(&self, record_id: &str, link: Link) -> ShiftcalResult<()> {
        if self.failing_writes.lock().await.contains(record_id) {
            return Err(ShiftcalError::Store(format!("Write rejected for {}", record_id)));
        }

        let mut records = self.records.lock().await;
        let record = records
            .get_mut(record_id)
            .ok_or_else(|| ShiftcalError::RecordNotFound(record_id.to_string()))?;
        record.link = link;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_records(&self, user_id: &str) -> ShiftcalResult<Vec<ServiceRecord>> {
        let records = self.records.lock().await;
        let mut list: Vec<ServiceRecord> = records
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(list)
    }

    async fn get_record(&self, record_id: &str) -> ShiftcalResult<Option<ServiceRecord>> {
        Ok(self.record(record_id).await)
    }

    async fn write_link(&self, record_id: &str, link: &Link) -> ShiftcalResult<()> {
        self.update_link(record_id, link.clone()).await
    }

    async fn clear_links(&self, record_id: &str) -> ShiftcalResult<()> {
        self.update_link(record_id, Link::default()).await
    }

    async fn delete_record(&self, record_id: &str) -> ShiftcalResult<()> {
        self.records.lock().await.remove(record_id);
        Ok(())
    }
}
