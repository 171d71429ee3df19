//! Event publishing/subscription abstraction (mechanics only).
//!
//! The bus distributes committed journal records to live consumers (the UI
//! layer). It is **transport-agnostic** and makes minimal assumptions:
//! no persistence (the journal is the source of truth), broadcast
//! semantics, and best-effort delivery. A subscriber that needs history
//! replays the journal first, then follows the feed.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to the event feed.
///
/// Each subscription receives a copy of every record published after it was
/// created, in publish order. Subscriptions are designed for
/// single-threaded consumption.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Pub/sub feed for committed records.
///
/// Publication happens strictly **after** commit: records are already in
/// the journal before they reach the bus, so a publish failure never
/// affects commit success and a lagging consumer can always catch up by
/// replaying the journal.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
