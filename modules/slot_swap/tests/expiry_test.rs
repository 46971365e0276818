mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use common::{connect, reload, swappable};
use slot_swap::config::SlotSwapConfig;
use slot_swap::contract::model::{SlotStatus, SwapStatus};
use slot_swap::domain::error::DomainError;
use slot_swap::domain::repo::{SlotRepository, TransitionRequest};
use slot_swap::infra::realtime::fanout::SWAP_EXPIRED;
use slot_swap::infra::storage::{InMemorySlotRepository, InMemorySwapRequestRepository};
use slot_swap::SlotSwap;

#[tokio::test]
async fn expire_stale_only_touches_old_pending_requests() -> Result<()> {
    let m = common::module();
    let svc = m.service();
    let (alice, bob, carol, dave) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let a = swappable(&svc, alice, 9).await;
    let b = swappable(&svc, bob, 14).await;
    let c = swappable(&svc, carol, 16).await;
    let d = swappable(&svc, dave, 18).await;

    let old = svc.create_swap_request(alice, a.id, b.id).await?;
    let answered = svc.create_swap_request(carol, c.id, d.id).await?;
    svc.respond_to_swap(dave, answered.id, true).await?;

    // Nothing is old enough yet.
    let ttl = Duration::from_secs(60);
    assert!(svc.engine().expire_stale(Utc::now(), ttl).await?.is_empty());

    let later = Utc::now() + chrono::Duration::minutes(2);
    let expired = svc.engine().expire_stale(later, ttl).await?;
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id, old.id);
    assert_eq!(expired[0].status, SwapStatus::Rejected);

    assert_eq!(reload(&svc, alice, a.id).await.unwrap().status, SlotStatus::Swappable);
    assert_eq!(reload(&svc, bob, b.id).await.unwrap().status, SlotStatus::Swappable);
    assert_eq!(reload(&svc, dave, c.id).await.unwrap().status, SlotStatus::Busy);

    // An expired request cannot be answered anymore.
    let err = svc.respond_to_swap(bob, old.id, true).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidOperation { .. }));

    // A second sweep finds nothing.
    assert!(svc.engine().expire_stale(later, ttl).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn sweeper_expires_requests_and_notifies_both_parties() -> Result<()> {
    let config = SlotSwapConfig {
        pending_ttl: Some(Duration::from_millis(50)),
        sweep_interval: Duration::from_millis(10),
        ..Default::default()
    };
    let m = SlotSwap::new(config);
    let svc = m.service();
    let registry = m.registry();
    let alice = connect(&registry);
    let bob = connect(&registry);

    let a = swappable(&svc, alice.id, 9).await;
    let b = swappable(&svc, bob.id, 14).await;
    let request = svc.create_swap_request(alice.id, a.id, b.id).await?;

    let cancel = CancellationToken::new();
    let handle = m.start_background(cancel.clone()).expect("sweeper enabled");

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let listing = svc.list_requests(alice.id).await?;
        if listing.outgoing[0].request.status == SwapStatus::Rejected {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "request never expired");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    cancel.cancel();
    handle.await?;

    assert_eq!(reload(&svc, alice.id, a.id).await.unwrap().status, SlotStatus::Swappable);
    for user in [&alice, &bob] {
        let expired: Vec<_> = user
            .sink
            .events()
            .into_iter()
            .filter(|e| e.name == SWAP_EXPIRED)
            .collect();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].payload["requestId"], request.id.to_string());
    }
    Ok(())
}

#[tokio::test]
async fn sweeper_is_disabled_without_ttl() {
    let m = common::module();
    assert!(m.start_background(CancellationToken::new()).is_none());
}

#[tokio::test]
async fn tampered_slot_is_an_invariant_violation() -> Result<()> {
    let slots = Arc::new(InMemorySlotRepository::new());
    let m = SlotSwap::with_repositories(
        SlotSwapConfig::default(),
        slots.clone(),
        Arc::new(InMemorySwapRequestRepository::new()),
    );
    let svc = m.service();
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let a = swappable(&svc, alice, 9).await;
    let b = swappable(&svc, bob, 14).await;
    let request = svc.create_swap_request(alice, a.id, b.id).await?;

    // Release one slot behind the engine's back.
    slots
        .try_transition(TransitionRequest::new(
            a.id,
            alice,
            SlotStatus::SwapPending,
            SlotStatus::Swappable,
        ))
        .await?;

    let err = svc.respond_to_swap(bob, request.id, true).await.unwrap_err();
    assert!(matches!(err, DomainError::InvariantViolation { .. }), "{err}");

    // Nothing was applied: the request is still pending and b still locked.
    let listing = svc.list_requests(bob).await?;
    assert_eq!(listing.incoming[0].request.status, SwapStatus::Pending);
    assert_eq!(reload(&svc, bob, b.id).await.unwrap().status, SlotStatus::SwapPending);
    Ok(())
}
