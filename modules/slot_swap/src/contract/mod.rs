pub mod client;
pub mod error;
pub mod model;

pub use client::SlotSwapApi;
pub use error::SlotSwapError;
pub use model::{
    NewSlot, Slot, SlotPatch, SlotStatus, SwapRequest, SwapRequestDetails, SwapRequestListing,
    SwapStatus,
};
