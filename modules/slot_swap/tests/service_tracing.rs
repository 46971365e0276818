//! Tests to verify that the service layer emits expected tracing spans

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing_test::traced_test;
use uuid::Uuid;

use slot_swap::contract::model::{NewSlot, SlotStatus};
use slot_swap::domain::events::SwapDomainEvent;
use slot_swap::domain::ports::EventPublisher;
use slot_swap::domain::service::{Service, ServiceConfig};
use slot_swap::infra::storage::{InMemorySlotRepository, InMemorySwapRequestRepository};

// Publisher that only counts events
#[derive(Default)]
struct CountingPublisher {
    published: AtomicUsize,
}

impl EventPublisher<SwapDomainEvent> for CountingPublisher {
    fn publish(&self, _event: &SwapDomainEvent) {
        self.published.fetch_add(1, Ordering::SeqCst);
    }
}

fn service(events: Arc<CountingPublisher>) -> Service {
    Service::new(
        Arc::new(InMemorySlotRepository::new()),
        Arc::new(InMemorySwapRequestRepository::new()),
        events,
        ServiceConfig::default(),
    )
}

fn slot(status: SlotStatus) -> NewSlot {
    let start = Utc::now() + Duration::days(1);
    NewSlot {
        title: "On call".to_string(),
        start_time: start,
        end_time: start + Duration::hours(2),
        status: Some(status),
    }
}

#[traced_test]
#[tokio::test]
async fn create_slot_emits_spans() {
    let events = Arc::new(CountingPublisher::default());
    let svc = service(events.clone());

    let result = svc.create_slot(Uuid::new_v4(), slot(SlotStatus::Busy)).await;

    assert!(result.is_ok());
    assert!(logs_contain("slot_swap.slots.create_slot"));
    assert!(logs_contain("Successfully created slot"));
    assert_eq!(events.published.load(Ordering::SeqCst), 1);
}

#[traced_test]
#[tokio::test]
async fn negotiation_emits_spans() {
    let events = Arc::new(CountingPublisher::default());
    let svc = service(events.clone());
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let a = svc.create_slot(alice, slot(SlotStatus::Swappable)).await.unwrap();
    let b = svc.create_slot(bob, slot(SlotStatus::Swappable)).await.unwrap();

    let request = svc.create_swap_request(alice, a.id, b.id).await.unwrap();
    svc.respond_to_swap(bob, request.id, false).await.unwrap();

    assert!(logs_contain("slot_swap.negotiation.create_swap_request"));
    assert!(logs_contain("slot_swap.negotiation.respond_to_swap"));
    assert!(logs_contain("Swap request resolved"));
    // 2 created, requested + updated, updated + rejected
    assert_eq!(events.published.load(Ordering::SeqCst), 6);
}

#[traced_test]
#[tokio::test]
async fn conflicting_request_still_traced() {
    let svc = service(Arc::new(CountingPublisher::default()));
    let (alice, bob, carol) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let a = svc.create_slot(alice, slot(SlotStatus::Swappable)).await.unwrap();
    let b = svc.create_slot(bob, slot(SlotStatus::Swappable)).await.unwrap();
    let c = svc.create_slot(carol, slot(SlotStatus::Swappable)).await.unwrap();

    svc.create_swap_request(alice, a.id, b.id).await.unwrap();
    let err = svc.create_swap_request(carol, c.id, b.id).await.unwrap_err();

    assert!(err.is_conflict());
    assert!(logs_contain("Creating swap request"));
    assert!(logs_contain("Swap request created"));
}

#[traced_test]
#[tokio::test]
async fn marketplace_emits_spans() {
    let svc = service(Arc::new(CountingPublisher::default()));

    let result = svc.list_swappable(Uuid::new_v4()).await;

    assert!(result.unwrap().is_empty());
    assert!(logs_contain("slot_swap.marketplace.list_swappable"));
}
