use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contract::model::{
    NewSlot, Slot, SlotPatch, SlotStatus, SwapRequest, SwapRequestDetails, SwapRequestListing,
    SwapStatus,
};

/// Wire form of [`SlotStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatusDto {
    Busy,
    Swappable,
    SwapPending,
}

impl From<SlotStatus> for SlotStatusDto {
    fn from(s: SlotStatus) -> Self {
        match s {
            SlotStatus::Busy => Self::Busy,
            SlotStatus::Swappable => Self::Swappable,
            SlotStatus::SwapPending => Self::SwapPending,
        }
    }
}

impl From<SlotStatusDto> for SlotStatus {
    fn from(s: SlotStatusDto) -> Self {
        match s {
            SlotStatusDto::Busy => Self::Busy,
            SlotStatusDto::Swappable => Self::Swappable,
            SlotStatusDto::SwapPending => Self::SwapPending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapStatusDto {
    Pending,
    Accepted,
    Rejected,
}

impl From<SwapStatus> for SwapStatusDto {
    fn from(s: SwapStatus) -> Self {
        match s {
            SwapStatus::Pending => Self::Pending,
            SwapStatus::Accepted => Self::Accepted,
            SwapStatus::Rejected => Self::Rejected,
        }
    }
}

/// REST DTO for slot representation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDto {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: SlotStatusDto,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// REST DTO for creating a slot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotReq {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<SlotStatusDto>,
}

/// REST DTO for updating a slot (partial)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSlotReq {
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: Option<SlotStatusDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotEnvelope {
    pub event: SlotDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotListDto {
    pub events: Vec<SlotDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedDto {
    pub ok: bool,
}

/// REST DTO for proposing a swap
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSwapReq {
    pub my_slot_id: Uuid,
    pub their_slot_id: Uuid,
}

/// REST DTO for answering a swap request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondSwapReq {
    pub accepted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequestDto {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub receiver_id: Uuid,
    pub my_slot_id: Uuid,
    pub their_slot_id: Uuid,
    pub status: SwapStatusDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapEnvelope {
    pub swap: SwapRequestDto,
}

/// Swap request with snapshots of both slots; a deleted slot is `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequestDetailsDto {
    #[serde(flatten)]
    pub request: SwapRequestDto,
    pub my_slot: Option<SlotDto>,
    pub their_slot: Option<SlotDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRequestListingDto {
    pub incoming: Vec<SwapRequestDetailsDto>,
    pub outgoing: Vec<SwapRequestDetailsDto>,
}

// Conversion implementations between REST DTOs and contract models

impl From<Slot> for SlotDto {
    fn from(slot: Slot) -> Self {
        Self {
            id: slot.id,
            owner_id: slot.owner_id,
            title: slot.title,
            start_time: slot.start_time,
            end_time: slot.end_time,
            status: slot.status.into(),
            version: slot.version,
            created_at: slot.created_at,
            updated_at: slot.updated_at,
        }
    }
}

impl From<CreateSlotReq> for NewSlot {
    fn from(req: CreateSlotReq) -> Self {
        Self {
            title: req.title,
            start_time: req.start_time,
            end_time: req.end_time,
            status: req.status.map(Into::into),
        }
    }
}

impl From<UpdateSlotReq> for SlotPatch {
    fn from(req: UpdateSlotReq) -> Self {
        Self {
            title: req.title,
            start_time: req.start_time,
            end_time: req.end_time,
            status: req.status.map(Into::into),
        }
    }
}

impl From<SwapRequest> for SwapRequestDto {
    fn from(r: SwapRequest) -> Self {
        Self {
            id: r.id,
            requester_id: r.requester_id,
            receiver_id: r.receiver_id,
            my_slot_id: r.offered_slot_id,
            their_slot_id: r.wanted_slot_id,
            status: r.status.into(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl From<SwapRequestDetails> for SwapRequestDetailsDto {
    fn from(d: SwapRequestDetails) -> Self {
        Self {
            request: d.request.into(),
            my_slot: d.offered_slot.map(Into::into),
            their_slot: d.wanted_slot.map(Into::into),
        }
    }
}

impl From<SwapRequestListing> for SwapRequestListingDto {
    fn from(l: SwapRequestListing) -> Self {
        Self {
            incoming: l.incoming.into_iter().map(Into::into).collect(),
            outgoing: l.outgoing.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn slot_serializes_camel_case_with_wire_status() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let slot = Slot {
            id: Uuid::nil(),
            owner_id: Uuid::nil(),
            title: "Standup".into(),
            start_time: at,
            end_time: at + chrono::Duration::minutes(30),
            status: SlotStatus::SwapPending,
            version: 3,
            created_at: at,
            updated_at: at,
        };
        let v = serde_json::to_value(SlotDto::from(slot)).unwrap();
        assert_eq!(v["status"], "SWAP_PENDING");
        assert_eq!(v["ownerId"], Uuid::nil().to_string());
        assert!(v.get("startTime").is_some());
    }

    #[test]
    fn create_request_defaults_status() {
        let req: CreateSlotReq = serde_json::from_str(
            r#"{"title":"Focus","startTime":"2025-03-01T09:00:00Z","endTime":"2025-03-01T10:00:00Z"}"#,
        )
        .unwrap();
        let new_slot = NewSlot::from(req);
        assert_eq!(new_slot.status, None);
    }

    #[test]
    fn swap_request_uses_source_field_names() {
        let req: CreateSwapReq = serde_json::from_str(&format!(
            r#"{{"mySlotId":"{}","theirSlotId":"{}"}}"#,
            Uuid::nil(),
            Uuid::from_u128(7)
        ))
        .unwrap();
        assert_eq!(req.my_slot_id, Uuid::nil());
        assert_eq!(req.their_slot_id, Uuid::from_u128(7));
    }

    #[test]
    fn details_flatten_request_fields() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let details = SwapRequestDetails {
            request: SwapRequest {
                id: Uuid::nil(),
                requester_id: Uuid::nil(),
                receiver_id: Uuid::from_u128(7),
                offered_slot_id: Uuid::nil(),
                wanted_slot_id: Uuid::from_u128(7),
                status: SwapStatus::Pending,
                created_at: at,
                updated_at: at,
            },
            offered_slot: None,
            wanted_slot: None,
        };
        let v = serde_json::to_value(SwapRequestDetailsDto::from(details)).unwrap();
        assert_eq!(v["status"], "PENDING");
        assert_eq!(v["theirSlotId"], Uuid::from_u128(7).to_string());
        assert!(v["mySlot"].is_null());
    }
}
