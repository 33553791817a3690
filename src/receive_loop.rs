use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::select;
use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn};

use crate::ack_signal::AckNotifier;
use crate::callsign::Callsign;
use crate::frame::{encode_kiss_frame, Ax25Frame};
use crate::message_handler::MessageHandler;
use crate::send_pipeline::SendPipeline;

/// One session's receive side: owns the routing state for inbound frames - the local
///  callsign to filter on, the handler that text is delivered to, the notifier that
///  wakes a waiting reliable send, and a write handle for ACK replies.
///
/// The whole object is moved into the receive task; there is no shared running flag,
///  termination is signaled through the shutdown channel or by the socket itself.
pub struct ReceiveLoop {
    local_call: Callsign,
    handler: Arc<dyn MessageHandler>,
    ack_notifier: AckNotifier,
    send_pipeline: SendPipeline,
    read_buffer_size: usize,
}

impl ReceiveLoop {
    pub fn new(
        local_call: Callsign,
        handler: Arc<dyn MessageHandler>,
        ack_notifier: AckNotifier,
        send_pipeline: SendPipeline,
        read_buffer_size: usize,
    ) -> ReceiveLoop {
        ReceiveLoop {
            local_call,
            handler,
            ack_notifier,
            send_pipeline,
            read_buffer_size,
        }
    }

    /// Read chunks until the modem closes the connection, an I/O error occurs, or
    ///  shutdown is signaled. The modem delivers one KISS frame per chunk; there is no
    ///  re-framing across reads.
    ///
    /// Consuming `self` on exit drops the ACK notifier, which any reliable send still
    ///  waiting on an ACK observes as connection-closed.
    pub async fn run(self, mut read_half: OwnedReadHalf, mut shutdown: watch::Receiver<bool>) {
        info!("starting receive loop");
        let mut buf = vec![0u8; self.read_buffer_size];

        loop {
            let num_read = select! {
                r = read_half.read(&mut buf) => match r {
                    Ok(0) => {
                        info!("connection closed by modem");
                        break;
                    }
                    Ok(num_read) => num_read,
                    Err(e) => {
                        error!("socket error: {}", e);
                        break;
                    }
                },
                _ = shutdown.changed() => {
                    debug!("receive loop shutting down");
                    break;
                }
            };

            if let Err(e) = self.on_chunk(&buf[..num_read]).await {
                error!("error sending ACK reply: {}", e);
                break;
            }
        }
    }

    /// Decode and route one received chunk. Undecodable chunks are noise on a radio
    ///  link and are skipped; a failed ACK write is a terminal I/O error.
    async fn on_chunk(&self, chunk: &[u8]) -> anyhow::Result<()> {
        let frame = match Ax25Frame::decode_kiss_frame(chunk) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("received undecodable chunk, skipping: {}", e);
                return Ok(());
            }
        };
        trace!("received frame: {}", frame);

        if frame.dst != self.local_call {
            debug!("ignoring frame addressed to {}", frame.dst);
            return Ok(());
        }

        if frame.is_ack() {
            debug!("ACK received from {}", frame.src);
            self.ack_notifier.notify();
            return Ok(());
        }

        if !frame.payload.is_ascii() {
            warn!("frame from {} has a non-ASCII payload, skipping", frame.src);
            return Ok(());
        }

        self.handler
            .on_message(frame.src.clone(), frame.payload_text())
            .await;

        // every delivered message is acknowledged, retransmissions included - the
        //  sender stops retrying only once an ACK gets through to it
        let ack = encode_kiss_frame(&self.local_call, &frame.src, "ACK")?;
        self.send_pipeline.send_frame(&ack).await
    }
}
