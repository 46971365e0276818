use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Availability status of a slot.
///
/// `SwapPending` doubles as the lock flag: a slot in that status is promised to
/// exactly one pending swap request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotStatus {
    Busy,
    Swappable,
    SwapPending,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Busy => "BUSY",
            SlotStatus::Swappable => "SWAPPABLE",
            SlotStatus::SwapPending => "SWAP_PENDING",
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calendar slot owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: SlotStatus,
    /// Bumped by the store on every write.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a new slot. Status defaults to `Busy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSlot {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: Option<SlotStatus>,
}

/// Partial update of a slot by its owner.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlotPatch {
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: Option<SlotStatus>,
}

impl SlotPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.status.is_none()
    }
}

/// Swap request lifecycle. Non-pending states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapStatus {
    Pending,
    Accepted,
    Rejected,
}

impl SwapStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapStatus::Pending => "PENDING",
            SwapStatus::Accepted => "ACCEPTED",
            SwapStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SwapStatus::Pending)
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proposal to exchange `offered_slot_id` (held by the requester) for
/// `wanted_slot_id` (held by the receiver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub receiver_id: Uuid,
    pub offered_slot_id: Uuid,
    pub wanted_slot_id: Uuid,
    pub status: SwapStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SwapRequest {
    pub fn involves_slot(&self, slot_id: Uuid) -> bool {
        self.offered_slot_id == slot_id || self.wanted_slot_id == slot_id
    }

    pub fn participants(&self) -> [Uuid; 2] {
        [self.requester_id, self.receiver_id]
    }
}

/// A swap request together with snapshots of the two slots it references.
/// Snapshots are `None` when the slot no longer exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequestDetails {
    pub request: SwapRequest,
    pub offered_slot: Option<Slot>,
    pub wanted_slot: Option<Slot>,
}

/// Requests addressed to a user and requests the user sent, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SwapRequestListing {
    pub incoming: Vec<SwapRequestDetails>,
    pub outgoing: Vec<SwapRequestDetails>,
}
