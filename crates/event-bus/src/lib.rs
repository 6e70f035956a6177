use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

use voicenav_core_types::VoiceError;

/// Trait implemented by payload types that can be carried on the bus.
pub trait Event: Clone + Send + Sync + std::fmt::Debug + 'static {}

impl<T> Event for T where T: Clone + Send + Sync + std::fmt::Debug + 'static {}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("no active subscribers")]
    NoSubscribers,
}

impl From<BusError> for VoiceError {
    fn from(err: BusError) -> Self {
        VoiceError::new(err.to_string())
    }
}

#[async_trait]
pub trait EventBus<E>: Send + Sync
where
    E: Event,
{
    /// Publish to every current subscriber, returning how many received it.
    async fn publish(&self, event: E) -> Result<usize, BusError>;
    fn subscribe(&self) -> broadcast::Receiver<E>;
}

/// Broadcast bus backed by a tokio channel.
pub struct InMemoryBus<E>
where
    E: Event,
{
    sender: broadcast::Sender<E>,
}

impl<E> InMemoryBus<E>
where
    E: Event,
{
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publish without caring whether anybody listens.
    pub fn emit(&self, event: E) {
        if self.sender.send(event).is_err() {
            debug!("event dropped: no subscribers");
        }
    }
}

#[async_trait]
impl<E> EventBus<E> for InMemoryBus<E>
where
    E: Event,
{
    async fn publish(&self, event: E) -> Result<usize, BusError> {
        self.sender
            .send(event)
            .map_err(|_| BusError::NoSubscribers)
    }

    fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_subscribers_reports_error() {
        let bus = InMemoryBus::<u32>::new(4);
        assert_eq!(bus.publish(1).await, Err(BusError::NoSubscribers));
    }

    #[tokio::test]
    async fn subscribers_receive_in_order() {
        let bus = InMemoryBus::<u32>::new(8);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        bus.publish(1).await.unwrap();
        bus.emit(2);
        assert_eq!(rx.recv().await, Ok(1));
        assert_eq!(rx.recv().await, Ok(2));
    }

    #[test]
    fn emit_without_subscribers_is_silent() {
        let bus = InMemoryBus::<u32>::new(0);
        bus.emit(7);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
