use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)] use mockall::automock;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;
use tracing::trace;

/// Abstraction for writing one complete frame to the modem connection, introduced to
///  facilitate mocking the I/O part away for testing
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SendSocket: Send + Sync + 'static {
    /// Full-buffer write of one frame; a partial or failed write surfaces as an error.
    async fn do_send_frame(&self, frame_buf: &[u8]) -> anyhow::Result<()>;
}

/// The write half of the modem connection.
///
/// Both the reliable sender (outbound messages) and the receive loop (ACK replies)
///  write here; the mutex serializes them so two frames can never interleave on the
///  wire.
pub struct TcpSendSocket {
    write_half: Mutex<OwnedWriteHalf>,
}

impl TcpSendSocket {
    pub fn new(write_half: OwnedWriteHalf) -> TcpSendSocket {
        TcpSendSocket {
            write_half: Mutex::new(write_half),
        }
    }
}

#[async_trait]
impl SendSocket for TcpSendSocket {
    async fn do_send_frame(&self, frame_buf: &[u8]) -> anyhow::Result<()> {
        let mut write_half = self.write_half.lock().await;
        write_half.write_all(frame_buf).await?;
        write_half.flush().await?;
        Ok(())
    }
}

/// Shared handle to the write path, adding per-frame wire logging.
#[derive(Clone)]
pub struct SendPipeline {
    socket: Arc<dyn SendSocket>,
}

impl SendPipeline {
    pub fn new(socket: Arc<dyn SendSocket>) -> SendPipeline {
        SendPipeline { socket }
    }

    pub async fn send_frame(&self, frame_buf: &[u8]) -> anyhow::Result<()> {
        trace!("sending frame: {:?}", frame_buf);
        self.socket.do_send_frame(frame_buf).await
    }
}
