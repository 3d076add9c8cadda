//! Fakes shared by the infra tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};

use coffeeclub_core::{CoffeeType, ObjectId};
use coffeeclub_events::{
    ChainEvent, EventCursor, EventFilter, EventId, EventKind, EventPage, EventTypeResolver,
};

use crate::actuator::{Actuator, ActuatorError, BrewReport};
use crate::chain::{ChainClient, ChainError, ObjectContent, SortOrder};

pub fn resolver() -> EventTypeResolver {
    EventTypeResolver::new(ObjectId::parse("0xc0ffee").unwrap(), "coffee_club")
}

pub fn event(kind: EventKind, tx: &str, seq: u64, parsed_json: JsonValue) -> ChainEvent {
    ChainEvent::new(
        EventId {
            tx_digest: tx.to_string(),
            event_seq: seq,
        },
        resolver().event_type(kind),
        parsed_json,
    )
}

pub fn page(events: Vec<ChainEvent>, next: Option<EventCursor>, has_next_page: bool) -> EventPage {
    EventPage {
        data: events,
        next_cursor: next,
        has_next_page,
    }
}

pub fn order_object(id: &ObjectId, status: &str, coffee_type: Option<&str>) -> ObjectContent {
    let mut fields = json!({
        "id": { "id": id.as_str() },
        "status": { "variant": status, "fields": {} },
    });
    if let Some(coffee) = coffee_type {
        fields["coffee_type"] = json!({ "variant": coffee, "fields": {} });
    }
    ObjectContent {
        object_id: id.clone(),
        object_type: Some("0xc0ffee::coffee_club::CoffeeOrder".into()),
        fields,
    }
}

/// Scripted chain client.
///
/// Pages are queued per filter and handed out in order; once a queue is
/// drained, queries return an empty page. Objects are served from a map.
#[derive(Default)]
pub struct FakeChainClient {
    pages: Mutex<HashMap<String, VecDeque<Result<EventPage, ChainError>>>>,
    queries: Mutex<Vec<(EventFilter, Option<EventCursor>)>>,
    objects: Mutex<HashMap<ObjectId, ObjectContent>>,
    object_failure: Mutex<Option<ChainError>>,
    object_reads: Mutex<usize>,
}

fn filter_key(filter: &EventFilter) -> String {
    serde_json::to_string(filter).unwrap()
}

impl FakeChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, filter: &EventFilter, page: Result<EventPage, ChainError>) {
        self.pages
            .lock()
            .unwrap()
            .entry(filter_key(filter))
            .or_default()
            .push_back(page);
    }

    /// Cursors passed to `query_events` for `filter`, in call order.
    pub fn queried_cursors(&self, filter: &EventFilter) -> Vec<Option<EventCursor>> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|(f, _)| f == filter)
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn put_object(&self, content: ObjectContent) {
        self.objects
            .lock()
            .unwrap()
            .insert(content.object_id.clone(), content);
    }

    pub fn fail_object_reads(&self, err: ChainError) {
        *self.object_failure.lock().unwrap() = Some(err);
    }

    pub fn clear_object_failure(&self) {
        *self.object_failure.lock().unwrap() = None;
    }

    pub fn object_reads(&self) -> usize {
        *self.object_reads.lock().unwrap()
    }
}

#[async_trait]
impl ChainClient for FakeChainClient {
    async fn query_events(
        &self,
        filter: &EventFilter,
        cursor: Option<&EventCursor>,
        _limit: usize,
        _order: SortOrder,
    ) -> Result<EventPage, ChainError> {
        self.queries
            .lock()
            .unwrap()
            .push((filter.clone(), cursor.cloned()));
        let next = self
            .pages
            .lock()
            .unwrap()
            .get_mut(&filter_key(filter))
            .and_then(VecDeque::pop_front);
        next.unwrap_or_else(|| Ok(page(vec![], cursor.cloned(), false)))
    }

    async fn get_object(&self, id: &ObjectId) -> Result<Option<ObjectContent>, ChainError> {
        *self.object_reads.lock().unwrap() += 1;
        if let Some(err) = self.object_failure.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.objects.lock().unwrap().get(id).cloned())
    }
}

/// Records every brew request; optionally fails them all.
#[derive(Default)]
pub struct RecordingActuator {
    calls: Mutex<Vec<(String, CoffeeType)>>,
    failure: Option<String>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(stderr: &str) -> Self {
        Self {
            calls: Mutex::default(),
            failure: Some(stderr.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<(String, CoffeeType)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Actuator for RecordingActuator {
    async fn brew(
        &self,
        device_address: &str,
        coffee: CoffeeType,
    ) -> Result<BrewReport, ActuatorError> {
        self.calls
            .lock()
            .unwrap()
            .push((device_address.to_string(), coffee));
        match &self.failure {
            Some(stderr) => Err(ActuatorError::Failed {
                status: Some(1),
                stderr: stderr.clone(),
            }),
            None => Ok(BrewReport {
                stdout: format!("brewed {coffee}"),
            }),
        }
    }
}
