//! Notification dispatch.
//!
//! The reconciler decides *that* something must be announced; the
//! [`Dispatcher`] turns the event into text and hands it to a [`Delivery`]
//! collaborator that knows how to reach the destination. Delivery failures
//! are logged and swallowed: by the time an event is dispatched, the
//! registry change behind it is already persisted and is not rolled back.

use std::future::Future;
use std::sync::Arc;

use steamwatch_types::{Destination, TrackerEvent};
use tracing::{debug, info, warn};

use crate::render::render;

/// Errors a delivery collaborator can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The destination no longer exists (deleted out-of-band, access revoked).
    #[error("destination {0} cannot be resolved")]
    Unresolvable(Destination),

    /// The transport failed; the destination may or may not exist.
    #[error("delivery transport error: {0}")]
    Transport(String),

    /// The destination exists but refused the message.
    #[error("delivery rejected with status {status}: {body}")]
    Rejected {
        /// Status code returned by the remote side.
        status: u16,
        /// Response body, for diagnosis.
        body: String,
    },
}

/// Something that can carry a rendered message to a destination.
pub trait Delivery: Send + Sync {
    /// Whether `destination` currently exists.
    ///
    /// `Ok(false)` means the destination is gone. An error means the check
    /// itself failed; callers treat both as "skip for now".
    fn resolve(
        &self,
        destination: &Destination,
    ) -> impl Future<Output = Result<bool, DeliveryError>> + Send;

    /// Send `message` to `destination`.
    fn deliver(
        &self,
        destination: &Destination,
        message: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

impl<T: Delivery> Delivery for Arc<T> {
    fn resolve(
        &self,
        destination: &Destination,
    ) -> impl Future<Output = Result<bool, DeliveryError>> + Send {
        T::resolve(self, destination)
    }

    fn deliver(
        &self,
        destination: &Destination,
        message: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send {
        T::deliver(self, destination, message)
    }
}

/// Delivery that only writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDelivery;

impl Delivery for LogDelivery {
    async fn resolve(&self, _destination: &Destination) -> Result<bool, DeliveryError> {
        Ok(true)
    }

    async fn deliver(&self, destination: &Destination, message: &str) -> Result<(), DeliveryError> {
        info!(%destination, text = message, "Notification");
        Ok(())
    }
}

/// Renders events and hands them to a [`Delivery`].
#[derive(Debug, Clone)]
pub struct Dispatcher<D> {
    delivery: D,
}

impl<D: Delivery> Dispatcher<D> {
    /// Wrap a delivery collaborator.
    pub const fn new(delivery: D) -> Self {
        Self { delivery }
    }

    /// Whether items under `destination` should be evaluated this pass.
    pub async fn resolves(&self, destination: &Destination) -> bool {
        match self.delivery.resolve(destination).await {
            Ok(true) => true,
            Ok(false) => {
                warn!(%destination, "Destination no longer resolves, skipping its items");
                false
            }
            Err(error) => {
                warn!(%destination, error = %error, "Destination check failed, skipping its items");
                false
            }
        }
    }

    /// Render `event` and deliver it.
    ///
    /// # Errors
    ///
    /// Returns the [`DeliveryError`] after logging it. Callers are not
    /// expected to act on it beyond counting.
    pub async fn dispatch(&self, event: &TrackerEvent) -> Result<(), DeliveryError> {
        let destination = event.destination();
        let message = render(event);
        match self.delivery.deliver(destination, &message).await {
            Ok(()) => {
                debug!(%destination, event = event.name(), id = event.item().id, "Notification delivered");
                Ok(())
            }
            Err(error) => {
                warn!(
                    %destination,
                    event = event.name(),
                    id = event.item().id,
                    error = %error,
                    "Notification delivery failed"
                );
                Err(error)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use steamwatch_types::{ItemKind, TrackedItem};

    use super::*;

    #[derive(Default)]
    struct Capture {
        sent: Mutex<Vec<(Destination, String)>>,
        fail: bool,
    }

    impl Delivery for Capture {
        async fn resolve(&self, _destination: &Destination) -> Result<bool, DeliveryError> {
            if self.fail {
                Err(DeliveryError::Transport("down".to_owned()))
            } else {
                Ok(true)
            }
        }

        async fn deliver(
            &self,
            destination: &Destination,
            message: &str,
        ) -> Result<(), DeliveryError> {
            if self.fail {
                return Err(DeliveryError::Unresolvable(destination.clone()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((destination.clone(), message.to_owned()));
            Ok(())
        }
    }

    fn removed() -> TrackerEvent {
        TrackerEvent::Removed {
            destination: Destination::new("g", "c"),
            kind: ItemKind::WorkshopMod,
            item: TrackedItem::new("7", "Gone Mod", None),
        }
    }

    #[tokio::test]
    async fn dispatch_renders_and_delivers() {
        let capture = Arc::new(Capture::default());
        let dispatcher = Dispatcher::new(Arc::clone(&capture));
        dispatcher.dispatch(&removed()).await.unwrap();

        let sent = capture.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, Destination::new("g", "c"));
        assert!(sent[0].1.contains("**Gone Mod** (7)"));
    }

    #[tokio::test]
    async fn failures_are_reported_not_raised() {
        let dispatcher = Dispatcher::new(Capture {
            fail: true,
            ..Capture::default()
        });
        assert!(!dispatcher.resolves(&Destination::new("g", "c")).await);
        assert!(matches!(
            dispatcher.dispatch(&removed()).await,
            Err(DeliveryError::Unresolvable(_))
        ));
    }

    #[tokio::test]
    async fn log_delivery_always_resolves() {
        let dispatcher = Dispatcher::new(LogDelivery);
        assert!(dispatcher.resolves(&Destination::new("g", "c")).await);
        assert!(dispatcher.dispatch(&removed()).await.is_ok());
    }
}
