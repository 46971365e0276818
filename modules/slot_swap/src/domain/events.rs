use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contract::model::{SlotStatus, SwapRequest};
use crate::domain::repo::Transition;

/// Transport-agnostic domain event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapDomainEvent {
    SwapRequested {
        request_id: Uuid,
        requester_id: Uuid,
        receiver_id: Uuid,
        at: DateTime<Utc>,
    },
    SwapAccepted {
        request_id: Uuid,
        requester_id: Uuid,
        receiver_id: Uuid,
        at: DateTime<Utc>,
    },
    SwapRejected {
        request_id: Uuid,
        requester_id: Uuid,
        receiver_id: Uuid,
        at: DateTime<Utc>,
    },
    /// A pending request outlived the configured TTL and was reverted.
    SwapExpired {
        request_id: Uuid,
        requester_id: Uuid,
        receiver_id: Uuid,
        at: DateTime<Utc>,
    },
    SlotCreated {
        slot_id: Uuid,
        owner_id: Uuid,
        status: SlotStatus,
        at: DateTime<Utc>,
    },
    SlotsUpdated {
        slot_ids: Vec<Uuid>,
        status: SlotStatus,
        at: DateTime<Utc>,
    },
    SlotDeleted {
        slot_id: Uuid,
        owner_id: Uuid,
        at: DateTime<Utc>,
    },
}

impl SwapDomainEvent {
    pub fn swap_requested(request: &SwapRequest) -> Self {
        Self::SwapRequested {
            request_id: request.id,
            requester_id: request.requester_id,
            receiver_id: request.receiver_id,
            at: request.updated_at,
        }
    }

    pub fn swap_accepted(request: &SwapRequest) -> Self {
        Self::SwapAccepted {
            request_id: request.id,
            requester_id: request.requester_id,
            receiver_id: request.receiver_id,
            at: request.updated_at,
        }
    }

    pub fn swap_rejected(request: &SwapRequest) -> Self {
        Self::SwapRejected {
            request_id: request.id,
            requester_id: request.requester_id,
            receiver_id: request.receiver_id,
            at: request.updated_at,
        }
    }

    pub fn swap_expired(request: &SwapRequest) -> Self {
        Self::SwapExpired {
            request_id: request.id,
            requester_id: request.requester_id,
            receiver_id: request.receiver_id,
            at: request.updated_at,
        }
    }

    /// One `SlotsUpdated` per target status, skipping transitions that left the
    /// status unchanged.
    pub fn slots_updated(transitions: &[Transition], at: DateTime<Utc>) -> Vec<Self> {
        let mut grouped: Vec<(SlotStatus, Vec<Uuid>)> = Vec::new();
        for t in transitions.iter().filter(|t| t.status_changed()) {
            match grouped.iter_mut().find(|(status, _)| *status == t.to) {
                Some((_, ids)) => ids.push(t.slot_id),
                None => grouped.push((t.to, vec![t.slot_id])),
            }
        }
        grouped
            .into_iter()
            .map(|(status, slot_ids)| Self::SlotsUpdated {
                slot_ids,
                status,
                at,
            })
            .collect()
    }
}
