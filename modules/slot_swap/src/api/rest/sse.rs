//! Server-Sent Events transport for the connection registry.

use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
    response::sse::{Event, KeepAlive, Sse},
    Extension,
};
use futures::Stream;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::rest::auth::AuthUser;
use crate::infra::realtime::{ConnectionRegistry, DeliveryError, EventSink, RealtimeEvent};

/// Sink backed by a bounded channel drained by one SSE response.
pub struct ChannelSink {
    tx: mpsc::Sender<RealtimeEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<RealtimeEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn deliver(&self, event: &RealtimeEvent) -> Result<(), DeliveryError> {
        self.tx.try_send(event.clone()).map_err(|e| match e {
            TrySendError::Closed(_) => DeliveryError::Closed,
            TrySendError::Full(_) => DeliveryError::Failed("outbound buffer full".into()),
        })
    }
}

/// Shared state of the realtime endpoint. Cancelling `shutdown` ends every
/// open stream.
#[derive(Clone)]
pub struct RealtimeChannel {
    pub registry: Arc<ConnectionRegistry>,
    pub buffer: usize,
    pub shutdown: CancellationToken,
}

impl RealtimeChannel {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        buffer: usize,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry,
            buffer: buffer.max(1),
            shutdown,
        }
    }
}

fn to_sse(event: &RealtimeEvent) -> Event {
    Event::default()
        .event(event.name)
        .json_data(&event.payload)
        .unwrap_or_else(|_| Event::default().event(event.name).data("serialization_error"))
}

/// SSE endpoint: one registered connection per open stream. The connection
/// is unregistered when the client goes away or the server shuts down.
pub async fn realtime_events(
    AuthUser(user_id): AuthUser,
    Extension(channel): Extension<RealtimeChannel>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel(channel.buffer);
    let guard = channel
        .registry
        .register(user_id, Arc::new(ChannelSink::new(tx)));
    info!(user_id = %user_id, connection_id = %guard.connection_id(), "New realtime stream");

    let state = (rx, guard, channel.shutdown.clone());
    let stream = futures::stream::unfold(state, |(mut rx, guard, shutdown)| async move {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                debug!(connection_id = %guard.connection_id(), "Closing realtime stream on shutdown");
                None
            }
            event = rx.recv() => event,
        };
        let event = next?;
        Some((Ok(to_sse(&event)), (rx, guard, shutdown)))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}
