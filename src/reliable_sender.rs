use anyhow::bail;
use tracing::{debug, info, warn};

use crate::ack_signal::{AckListener, AckWait};
use crate::callsign::Callsign;
use crate::config::KissConfig;
use crate::frame::encode_kiss_frame;
use crate::send_pipeline::SendPipeline;

/// Terminal result of a reliable send.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SendOutcome {
    /// The peer acknowledged the message.
    Acked { attempts: u32 },
    /// Every transmission timed out. The message may still have arrived - only the
    ///  ACKs may have been lost - but this side cannot tell.
    Exhausted { attempts: u32 },
}

impl SendOutcome {
    pub fn is_acked(&self) -> bool {
        matches!(self, SendOutcome::Acked { .. })
    }
}

/// Drives the send / await-ACK / retry state machine for outbound messages.
///
/// There is one instance per connection and at most one send in flight at a time; the
///  protocol is half-duplex-ack by design, so there is no send queue and no windowing.
pub struct ReliableSender {
    local_call: Callsign,
    send_pipeline: SendPipeline,
    ack_listener: AckListener,
}

impl ReliableSender {
    pub fn new(
        local_call: Callsign,
        send_pipeline: SendPipeline,
        ack_listener: AckListener,
    ) -> ReliableSender {
        ReliableSender {
            local_call,
            send_pipeline,
            ack_listener,
        }
    }

    /// Transmit `text` to `dst`, retransmitting until the peer's ACK arrives or the
    ///  attempt budget is exhausted. Blocks the caller for up to
    ///  `max_send_attempts * ack_timeout`.
    ///
    /// Input validation (callsign, ASCII payload) happens on the first line, before
    ///  anything touches the socket.
    pub async fn send(
        &mut self,
        dst: &Callsign,
        text: &str,
        config: &KissConfig,
    ) -> anyhow::Result<SendOutcome> {
        let frame = encode_kiss_frame(&self.local_call, dst, text)?;

        let mut attempts = 0;
        while attempts < config.max_send_attempts {
            // clear before transmitting: a late ACK for a previous attempt must not
            //  satisfy this one
            self.ack_listener.clear();

            attempts += 1;
            self.send_pipeline.send_frame(&frame).await?;
            debug!("sent message to {} (attempt {}/{})", dst, attempts, config.max_send_attempts);

            match self.ack_listener.wait(config.ack_timeout).await {
                AckWait::Acked => {
                    info!("ACK from {} after {} attempt(s)", dst, attempts);
                    return Ok(SendOutcome::Acked { attempts });
                }
                AckWait::TimedOut => {
                    warn!(
                        "no ACK from {} within {:?} (attempt {}/{})",
                        dst, config.ack_timeout, attempts, config.max_send_attempts
                    );
                }
                AckWait::Closed => bail!("connection closed while waiting for ACK"),
            }
        }

        warn!("giving up on message to {} after {} attempts", dst, attempts);
        Ok(SendOutcome::Exhausted { attempts })
    }
}
