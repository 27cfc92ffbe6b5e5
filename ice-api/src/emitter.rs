//! Outbound event emission
//!
//! The dispatcher pushes chat chunks and lifecycle events through an
//! `EventEmitter` supplied per request. `BroadcastEmitter` fans events out
//! to any number of subscribers over a tokio broadcast channel.

use async_trait::async_trait;
use ice_ipc::{ApiError, OutboundEvent};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

/// Errors raised while delivering an event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmitError {
    #[error("Event channel closed")]
    Closed,

    #[error("Event rejected: {0}")]
    Rejected(String),
}

impl From<EmitError> for ApiError {
    fn from(err: EmitError) -> Self {
        ApiError::generic(err.to_string())
    }
}

/// Sink for outbound events.
#[async_trait]
pub trait EventEmitter: Send + Sync {
    async fn emit(&self, event: OutboundEvent) -> Result<(), EmitError>;
}

/// Broadcast-channel emitter.
#[derive(Clone)]
pub struct BroadcastEmitter {
    tx: broadcast::Sender<OutboundEvent>,
}

impl BroadcastEmitter {
    /// Create an emitter buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<OutboundEvent> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl EventEmitter for BroadcastEmitter {
    /// Never blocks. Events sent while nobody is subscribed are dropped.
    async fn emit(&self, event: OutboundEvent) -> Result<(), EmitError> {
        let event_type = event.event_type();
        match self.tx.send(event) {
            Ok(receiver_count) => {
                debug!(
                    event_type = event_type,
                    receivers = receiver_count,
                    "Broadcast event"
                );
            }
            Err(_) => {
                debug!(event_type = event_type, "No receivers for event");
            }
        }
        Ok(())
    }
}
