pub mod telegram;

pub use telegram::TelegramNotifier;

use async_trait::async_trait;

/// Failure to deliver a message to the chat platform.
#[derive(Debug, thiserror::Error)]
#[error("message delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Outbound interface to the chat platform.
///
/// Delivery is at-least-once: the poll loop only advances its store after a
/// successful send, so a failed send is retried verbatim on the next tick
/// and duplicates are tolerated by design.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), DeliveryError>;
}
