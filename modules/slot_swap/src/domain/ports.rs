/// Output port: publish domain events (no knowledge of transport).
///
/// Publishing is fire-and-forget; implementations swallow delivery failures.
pub trait EventPublisher<E>: Send + Sync + 'static {
    fn publish(&self, event: &E);
}
