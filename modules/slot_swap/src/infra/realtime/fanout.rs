use std::sync::Arc;

use serde_json::json;
use tracing::trace;
use uuid::Uuid;

use crate::contract::model::SlotStatus;
use crate::domain::events::SwapDomainEvent;
use crate::domain::ports::EventPublisher;

use super::registry::{ConnectionRegistry, RealtimeEvent};

pub const SWAP_REQUESTED: &str = "swap:requested";
pub const SWAP_ACCEPTED: &str = "swap:accepted";
pub const SWAP_REJECTED: &str = "swap:rejected";
pub const SWAP_EXPIRED: &str = "swap:expired";
pub const SLOT_CREATED: &str = "event:created";
pub const SLOTS_UPDATED: &str = "event:updated";
pub const SLOT_DELETED: &str = "event:deleted";

/// Who receives an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    Nobody,
    Users(Vec<Uuid>),
    Everyone,
}

/// Recipient rules. Request lifecycle events go to the participants only;
/// anything that changes what the marketplace shows goes to everyone.
pub fn recipients(event: &SwapDomainEvent) -> Recipients {
    match event {
        SwapDomainEvent::SwapRequested { receiver_id, .. } => Recipients::Users(vec![*receiver_id]),
        SwapDomainEvent::SwapAccepted {
            requester_id,
            receiver_id,
            ..
        }
        | SwapDomainEvent::SwapRejected {
            requester_id,
            receiver_id,
            ..
        }
        | SwapDomainEvent::SwapExpired {
            requester_id,
            receiver_id,
            ..
        } => Recipients::Users(vec![*requester_id, *receiver_id]),
        SwapDomainEvent::SlotCreated { status, .. } if *status == SlotStatus::Swappable => {
            Recipients::Everyone
        }
        SwapDomainEvent::SlotCreated { .. } => Recipients::Nobody,
        SwapDomainEvent::SlotsUpdated { .. } | SwapDomainEvent::SlotDeleted { .. } => {
            Recipients::Everyone
        }
    }
}

/// Wire name and payload for a domain event.
pub fn to_realtime(event: &SwapDomainEvent) -> RealtimeEvent {
    match event {
        SwapDomainEvent::SwapRequested { request_id, .. } => {
            RealtimeEvent::new(SWAP_REQUESTED, json!({ "requestId": request_id }))
        }
        SwapDomainEvent::SwapAccepted { request_id, .. } => {
            RealtimeEvent::new(SWAP_ACCEPTED, json!({ "requestId": request_id }))
        }
        SwapDomainEvent::SwapRejected { request_id, .. } => {
            RealtimeEvent::new(SWAP_REJECTED, json!({ "requestId": request_id }))
        }
        SwapDomainEvent::SwapExpired { request_id, .. } => {
            RealtimeEvent::new(SWAP_EXPIRED, json!({ "requestId": request_id }))
        }
        SwapDomainEvent::SlotCreated { slot_id, .. } => {
            RealtimeEvent::new(SLOT_CREATED, json!({ "slotId": slot_id }))
        }
        SwapDomainEvent::SlotsUpdated {
            slot_ids, status, ..
        } => RealtimeEvent::new(
            SLOTS_UPDATED,
            json!({ "slotIds": slot_ids, "status": status.as_str() }),
        ),
        SwapDomainEvent::SlotDeleted {
            slot_id, owner_id, ..
        } => RealtimeEvent::new(
            SLOT_DELETED,
            json!({ "slotId": slot_id, "userId": owner_id }),
        ),
    }
}

/// Adapter: implements the domain publisher port on top of the connection
/// registry.
pub struct NotificationFanout {
    registry: Arc<ConnectionRegistry>,
}

impl NotificationFanout {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }
}

impl EventPublisher<SwapDomainEvent> for NotificationFanout {
    fn publish(&self, event: &SwapDomainEvent) {
        let delivered: usize = match recipients(event) {
            Recipients::Nobody => return,
            Recipients::Users(users) => {
                let out = to_realtime(event);
                users
                    .into_iter()
                    .map(|user| self.registry.send_to_user(user, &out))
                    .sum()
            }
            Recipients::Everyone => self.registry.broadcast(&to_realtime(event)),
        };
        trace!(delivered, ?event, "Fanned out event");
    }
}
