use async_trait::async_trait;
#[cfg(test)] use mockall::automock;

use crate::callsign::Callsign;

/// Capability for delivering inbound chat text to the application.
///
/// Implemented by the front end (GUI, terminal, ...) and invoked from the receive task:
///  at least once per received message, in arrival order per sender. A retransmitted
///  message is delivered again - this protocol has no sequence numbers, so the receiver
///  cannot tell a retransmission from a genuinely new message with the same text.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn on_message(&self, from: Callsign, text: String);
}
