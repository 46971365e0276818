use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{
    Slot, SlotStatus, SwapRequest, SwapRequestDetails, SwapRequestListing, SwapStatus,
};
use crate::domain::error::DomainError;
use crate::domain::events::SwapDomainEvent;
use crate::domain::locks::KeyedLocks;
use crate::domain::ports::EventPublisher;
use crate::domain::repo::{
    SlotRepository, StoreError, SwapRequestRepository, Transition, TransitionRequest,
};

/// Orchestrates the request → accept/reject → ownership transfer protocol.
///
/// Slot locking is done through the store's compare-and-swap primitive: a
/// slot in `SwapPending` is referenced by exactly one pending request. Answers
/// to the same request (respond, expiry) are additionally serialized per
/// request id so they never race each other on that request's slots.
#[derive(Clone)]
pub struct NegotiationEngine {
    slots: Arc<dyn SlotRepository>,
    requests: Arc<dyn SwapRequestRepository>,
    events: Arc<dyn EventPublisher<SwapDomainEvent>>,
    locks: Arc<KeyedLocks>,
}

impl NegotiationEngine {
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        requests: Arc<dyn SwapRequestRepository>,
        events: Arc<dyn EventPublisher<SwapDomainEvent>>,
    ) -> Self {
        Self {
            slots,
            requests,
            events,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Lock both slots as SWAP_PENDING and record a pending request.
    ///
    /// A slot that is BUSY fails with `PreconditionFailed`. A slot already
    /// SWAP_PENDING, or one lost to a concurrent request, fails with
    /// `Conflict`, which callers may retry once the other request resolves.
    #[instrument(
        name = "slot_swap.negotiation.create_swap_request",
        skip(self),
        fields(requester_id = %requester_id, offered_slot_id = %offered_slot_id, wanted_slot_id = %wanted_slot_id)
    )]
    pub async fn create_swap_request(
        &self,
        requester_id: Uuid,
        offered_slot_id: Uuid,
        wanted_slot_id: Uuid,
    ) -> Result<SwapRequest, DomainError> {
        info!("Creating swap request");

        if offered_slot_id == wanted_slot_id {
            return Err(DomainError::invalid_operation(
                "a slot cannot be swapped with itself",
            ));
        }

        let offered = self
            .load_slot(offered_slot_id)
            .await?
            .ok_or_else(|| DomainError::slot_not_found(offered_slot_id))?;
        let wanted = self
            .load_slot(wanted_slot_id)
            .await?
            .ok_or_else(|| DomainError::slot_not_found(wanted_slot_id))?;

        if wanted.owner_id == requester_id {
            return Err(DomainError::invalid_operation(
                "cannot request a swap for your own slot",
            ));
        }
        if offered.owner_id != requester_id {
            return Err(DomainError::invalid_operation(
                "offered slot is not owned by the requester",
            ));
        }
        ensure_open_for_swap(&offered)?;
        ensure_open_for_swap(&wanted)?;

        let receiver_id = wanted.owner_id;
        let transitions = self
            .slots
            .try_transition_all(vec![
                TransitionRequest::new(
                    offered.id,
                    requester_id,
                    SlotStatus::Swappable,
                    SlotStatus::SwapPending,
                ),
                TransitionRequest::new(
                    wanted.id,
                    receiver_id,
                    SlotStatus::Swappable,
                    SlotStatus::SwapPending,
                ),
            ])
            .await
            .map_err(|e| {
                let e = DomainError::from(e);
                if e.is_conflict() {
                    warn!(error = %e, "Lost the race for a slot");
                }
                e
            })?;

        let now = Utc::now();
        let request = SwapRequest {
            id: Uuid::new_v4(),
            requester_id,
            receiver_id,
            offered_slot_id,
            wanted_slot_id,
            status: SwapStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.requests.insert(request.clone()).await {
            warn!(error = %e, "Persisting swap request failed, releasing slots");
            self.revert(&transitions, request.id).await?;
            return Err(DomainError::database(e.to_string()));
        }

        self.events.publish(&SwapDomainEvent::swap_requested(&request));
        self.publish_slot_changes(&transitions, now);

        info!(request_id = %request.id, receiver_id = %receiver_id, "Swap request created");
        Ok(request)
    }

    #[instrument(
        name = "slot_swap.negotiation.respond_to_swap",
        skip(self),
        fields(responder_id = %responder_id, request_id = %request_id, accept = accept)
    )]
    pub async fn respond_to_swap(
        &self,
        responder_id: Uuid,
        request_id: Uuid,
        accept: bool,
    ) -> Result<SwapRequest, DomainError> {
        info!("Responding to swap request");

        let guard = self.locks.lock(request_id).await;
        let result = self.respond_locked(responder_id, request_id, accept).await;
        drop(guard);
        self.locks.release(&request_id);

        result
    }

    async fn respond_locked(
        &self,
        responder_id: Uuid,
        request_id: Uuid,
        accept: bool,
    ) -> Result<SwapRequest, DomainError> {
        let request = self
            .requests
            .find_by_id(request_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::request_not_found(request_id))?;

        if responder_id != request.receiver_id {
            return Err(DomainError::forbidden(responder_id, request_id));
        }
        if request.status.is_terminal() {
            return Err(DomainError::invalid_operation(format!(
                "swap request {} was already {}",
                request_id, request.status
            )));
        }

        self.load_locked_pair(&request).await?;

        let (outcome, plan) = if accept {
            (
                SwapStatus::Accepted,
                vec![
                    TransitionRequest::new(
                        request.offered_slot_id,
                        request.requester_id,
                        SlotStatus::SwapPending,
                        SlotStatus::Busy,
                    )
                    .with_new_owner(request.receiver_id),
                    TransitionRequest::new(
                        request.wanted_slot_id,
                        request.receiver_id,
                        SlotStatus::SwapPending,
                        SlotStatus::Busy,
                    )
                    .with_new_owner(request.requester_id),
                ],
            )
        } else {
            (SwapStatus::Rejected, release_plan(&request))
        };

        let resolved = self.settle(&request, plan, outcome).await?;
        let event = if accept {
            SwapDomainEvent::swap_accepted(&resolved)
        } else {
            SwapDomainEvent::swap_rejected(&resolved)
        };
        self.events.publish(&event);

        info!(status = %resolved.status, "Swap request resolved");
        Ok(resolved)
    }

    /// Revert every pending request created more than `ttl` before `now`.
    /// Returns the requests that were expired.
    #[instrument(name = "slot_swap.negotiation.expire_stale", skip(self))]
    pub async fn expire_stale(
        &self,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Vec<SwapRequest>, DomainError> {
        let Some(cutoff) = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_sub_signed(ttl))
        else {
            return Ok(Vec::new());
        };

        let candidates = self
            .requests
            .list_pending_created_before(cutoff)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!("Found {} expiry candidates", candidates.len());

        let mut expired = Vec::new();
        for candidate in candidates {
            let guard = self.locks.lock(candidate.id).await;
            let result = self.expire_locked(candidate.id, cutoff).await;
            drop(guard);
            self.locks.release(&candidate.id);

            match result {
                Ok(Some(request)) => expired.push(request),
                Ok(None) => {}
                Err(e) => warn!(request_id = %candidate.id, error = %e, "Failed to expire swap request"),
            }
        }

        if !expired.is_empty() {
            info!("Expired {} swap requests", expired.len());
        }
        Ok(expired)
    }

    async fn expire_locked(
        &self,
        request_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<SwapRequest>, DomainError> {
        // Re-read under the lock: the receiver may have answered meanwhile.
        let Some(request) = self
            .requests
            .find_by_id(request_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        else {
            return Ok(None);
        };
        if request.status.is_terminal() || request.created_at >= cutoff {
            return Ok(None);
        }

        self.load_locked_pair(&request).await?;
        let resolved = self
            .settle(&request, release_plan(&request), SwapStatus::Rejected)
            .await?;
        self.events.publish(&SwapDomainEvent::swap_expired(&resolved));

        info!(request_id = %resolved.id, "Swap request expired");
        Ok(Some(resolved))
    }

    #[instrument(name = "slot_swap.negotiation.list_requests", skip(self), fields(user_id = %user_id))]
    pub async fn list_requests(&self, user_id: Uuid) -> Result<SwapRequestListing, DomainError> {
        let incoming = self
            .requests
            .list_by_receiver(user_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        let outgoing = self
            .requests
            .list_by_requester(user_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!(
            "Found {} incoming and {} outgoing requests",
            incoming.len(),
            outgoing.len()
        );

        Ok(SwapRequestListing {
            incoming: self.with_slots(incoming).await?,
            outgoing: self.with_slots(outgoing).await?,
        })
    }

    // --- helpers ---

    /// Apply the slot transitions of an answer, then close the request.
    /// Both happen or neither does.
    async fn settle(
        &self,
        request: &SwapRequest,
        plan: Vec<TransitionRequest>,
        outcome: SwapStatus,
    ) -> Result<SwapRequest, DomainError> {
        let transitions = self
            .slots
            .try_transition_all(plan)
            .await
            .map_err(|e| locked_slot_error(request.id, e))?;

        let now = Utc::now();
        let resolved = match self.requests.resolve(request.id, outcome, now).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(error = %e, "Closing swap request failed, restoring slots");
                self.revert(&transitions, request.id).await?;
                return Err(locked_slot_error(request.id, e));
            }
        };

        self.publish_slot_changes(&transitions, now);
        Ok(resolved)
    }

    /// Check that both slots of a pending request are still locked for it.
    async fn load_locked_pair(&self, request: &SwapRequest) -> Result<(Slot, Slot), DomainError> {
        let offered = self.load_slot(request.offered_slot_id).await?;
        let wanted = self.load_slot(request.wanted_slot_id).await?;

        let (Some(offered), Some(wanted)) = (offered, wanted) else {
            return Err(DomainError::invariant_violation(format!(
                "pending swap request {} references a missing slot",
                request.id
            )));
        };

        for (slot, owner) in [
            (&offered, request.requester_id),
            (&wanted, request.receiver_id),
        ] {
            if slot.status != SlotStatus::SwapPending || slot.owner_id != owner {
                return Err(DomainError::invariant_violation(format!(
                    "pending swap request {} references slot {} that is {} and owned by {}",
                    request.id, slot.id, slot.status, slot.owner_id
                )));
            }
        }
        Ok((offered, wanted))
    }

    async fn revert(&self, transitions: &[Transition], request_id: Uuid) -> Result<(), DomainError> {
        let undo = transitions.iter().rev().map(Transition::reverse).collect();
        self.slots.try_transition_all(undo).await.map_err(|e| {
            DomainError::invariant_violation(format!(
                "could not release slots of swap request {}: {}",
                request_id, e
            ))
        })?;
        Ok(())
    }

    async fn load_slot(&self, id: Uuid) -> Result<Option<Slot>, DomainError> {
        self.slots
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))
    }

    async fn with_slots(
        &self,
        requests: Vec<SwapRequest>,
    ) -> Result<Vec<SwapRequestDetails>, DomainError> {
        let mut out = Vec::with_capacity(requests.len());
        for request in requests {
            let offered_slot = self.load_slot(request.offered_slot_id).await?;
            let wanted_slot = self.load_slot(request.wanted_slot_id).await?;
            out.push(SwapRequestDetails {
                request,
                offered_slot,
                wanted_slot,
            });
        }
        Ok(out)
    }

    fn publish_slot_changes(&self, transitions: &[Transition], at: DateTime<Utc>) {
        for event in SwapDomainEvent::slots_updated(transitions, at) {
            self.events.publish(&event);
        }
    }
}

/// Only `Swappable` slots can enter a negotiation. A slot already held by
/// another pending request means a concurrent negotiation won it.
fn ensure_open_for_swap(slot: &Slot) -> Result<(), DomainError> {
    match slot.status {
        SlotStatus::Swappable => Ok(()),
        SlotStatus::Busy => Err(DomainError::precondition_failed(slot.id, slot.status)),
        SlotStatus::SwapPending => Err(DomainError::conflict(format!(
            "slot {} is already part of a pending swap request",
            slot.id
        ))),
    }
}

/// Both slots back to `Swappable`, owners unchanged.
fn release_plan(request: &SwapRequest) -> Vec<TransitionRequest> {
    vec![
        TransitionRequest::new(
            request.offered_slot_id,
            request.requester_id,
            SlotStatus::SwapPending,
            SlotStatus::Swappable,
        ),
        TransitionRequest::new(
            request.wanted_slot_id,
            request.receiver_id,
            SlotStatus::SwapPending,
            SlotStatus::Swappable,
        ),
    ]
}

/// While a request is being answered its slots are locked for it, so any
/// stale state is a broken invariant rather than a lost race.
fn locked_slot_error(request_id: Uuid, e: StoreError) -> DomainError {
    match e {
        StoreError::Backend(e) => DomainError::database(e.to_string()),
        other => DomainError::invariant_violation(format!(
            "slots of swap request {} changed while it was pending: {}",
            request_id, other
        )),
    }
}
