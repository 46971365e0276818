pub mod error;
pub mod events;
pub mod expiry;
pub mod locks;
pub mod marketplace;
pub mod negotiation;
pub mod ports;
pub mod repo;
pub mod service;
pub mod slots;
