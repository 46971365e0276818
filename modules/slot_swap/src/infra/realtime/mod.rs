pub mod fanout;
pub mod registry;

pub use fanout::NotificationFanout;
pub use registry::{
    ConnectionGuard, ConnectionId, ConnectionRegistry, DeliveryError, EventSink, RealtimeEvent,
};
