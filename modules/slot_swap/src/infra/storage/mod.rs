pub mod memory;

pub use memory::{InMemorySlotRepository, InMemorySwapRequestRepository};
