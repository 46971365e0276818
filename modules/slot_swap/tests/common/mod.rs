#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use slot_swap::config::SlotSwapConfig;
use slot_swap::contract::model::{NewSlot, Slot, SlotStatus};
use slot_swap::domain::service::Service;
use slot_swap::infra::realtime::{
    ConnectionGuard, ConnectionRegistry, DeliveryError, EventSink, RealtimeEvent,
};
use slot_swap::SlotSwap;

/// Sink that keeps every event it receives.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<RealtimeEvent>>,
}

impl CollectingSink {
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.name).collect()
    }

    pub fn events(&self) -> Vec<RealtimeEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for CollectingSink {
    fn deliver(&self, event: &RealtimeEvent) -> Result<(), DeliveryError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// A user with one live connection.
pub struct User {
    pub id: Uuid,
    pub sink: Arc<CollectingSink>,
    _guard: ConnectionGuard,
}

pub fn connect(registry: &Arc<ConnectionRegistry>) -> User {
    let id = Uuid::new_v4();
    let sink = Arc::new(CollectingSink::default());
    let guard = registry.register(id, sink.clone());
    User {
        id,
        sink,
        _guard: guard,
    }
}

pub fn module() -> SlotSwap {
    SlotSwap::new(SlotSwapConfig::default())
}

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, hour, 0, 0).unwrap()
}

pub fn new_slot(title: &str, hour: u32, status: SlotStatus) -> NewSlot {
    NewSlot {
        title: title.to_string(),
        start_time: at(hour),
        end_time: at(hour) + Duration::hours(1),
        status: Some(status),
    }
}

pub async fn swappable(service: &Service, owner: Uuid, hour: u32) -> Slot {
    service
        .create_slot(owner, new_slot("Shift", hour, SlotStatus::Swappable))
        .await
        .expect("create swappable slot")
}

pub async fn busy(service: &Service, owner: Uuid, hour: u32) -> Slot {
    service
        .create_slot(owner, new_slot("Meeting", hour, SlotStatus::Busy))
        .await
        .expect("create busy slot")
}

/// Current state of a slot as seen by its owner.
pub async fn reload(service: &Service, owner: Uuid, slot_id: Uuid) -> Option<Slot> {
    service
        .list_own_slots(owner)
        .await
        .expect("list slots")
        .into_iter()
        .find(|s| s.id == slot_id)
}
