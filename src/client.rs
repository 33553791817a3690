use std::sync::Arc;

use anyhow::{bail, Context};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::ack_signal::ack_signal;
use crate::callsign::Callsign;
use crate::config::KissConfig;
use crate::message_handler::MessageHandler;
use crate::receive_loop::ReceiveLoop;
use crate::reliable_sender::{ReliableSender, SendOutcome};
use crate::send_pipeline::{SendPipeline, TcpSendSocket};

/// A connected KISS client session.
///
/// `connect` opens the TCP connection to the modem and spawns the receive task; from
///  then on inbound messages flow into the handler, and `send_reliable` pushes text
///  the other way with ACK/retry semantics. `close` (or dropping the client) tears the
///  session down.
pub struct KissClient {
    local_call: Callsign,
    remote_call: Callsign,
    config: KissConfig,
    sender: Mutex<ReliableSender>,
    shutdown: watch::Sender<bool>,
    receive_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl KissClient {
    /// Connect to a KISS modem with default tuning. `local_call` is this station,
    ///  `remote_call` the default destination for `send_reliable`, both in canonical
    ///  `CALL[-SSID]` form. The handler is handed to the receive task by ownership.
    ///
    /// A connection failure is surfaced immediately - there is no retry at this layer.
    pub async fn connect(
        host: &str,
        port: u16,
        local_call: &str,
        remote_call: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> anyhow::Result<KissClient> {
        Self::connect_with_config(host, port, local_call, remote_call, handler, KissConfig::default()).await
    }

    pub async fn connect_with_config(
        host: &str,
        port: u16,
        local_call: &str,
        remote_call: &str,
        handler: Arc<dyn MessageHandler>,
        config: KissConfig,
    ) -> anyhow::Result<KissClient> {
        config.validate()?;
        let local_call: Callsign = local_call.parse()?;
        let remote_call: Callsign = remote_call.parse()?;

        let stream = TcpStream::connect((host, port))
            .await
            .with_context(|| format!("connecting to KISS modem at {}:{}", host, port))?;
        info!("connected to KISS modem at {}:{} as {}", host, port, local_call);

        let (read_half, write_half) = stream.into_split();
        let send_pipeline = SendPipeline::new(Arc::new(TcpSendSocket::new(write_half)));
        let (ack_notifier, ack_listener) = ack_signal();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let receive_loop = ReceiveLoop::new(
            local_call.clone(),
            handler,
            ack_notifier,
            send_pipeline.clone(),
            config.read_buffer_size,
        );
        let receive_task = tokio::spawn(receive_loop.run(read_half, shutdown_rx));

        Ok(KissClient {
            sender: Mutex::new(ReliableSender::new(local_call.clone(), send_pipeline, ack_listener)),
            local_call,
            remote_call,
            config,
            shutdown: shutdown_tx,
            receive_task: std::sync::Mutex::new(Some(receive_task)),
        })
    }

    pub fn local_call(&self) -> &Callsign {
        &self.local_call
    }

    pub fn remote_call(&self) -> &Callsign {
        &self.remote_call
    }

    /// Send `text` to the default remote station, retrying per the configured attempt
    ///  budget. At most one send can be in flight; a concurrent call fails fast rather
    ///  than queueing behind the first.
    pub async fn send_reliable(&self, text: &str) -> anyhow::Result<SendOutcome> {
        let remote_call = self.remote_call.clone();
        self.send_reliable_to(&remote_call, text).await
    }

    /// Send `text` to an explicit destination station.
    pub async fn send_reliable_to(&self, dst: &Callsign, text: &str) -> anyhow::Result<SendOutcome> {
        let Ok(mut sender) = self.sender.try_lock() else {
            bail!("another send is already in flight");
        };
        sender.send(dst, text, &self.config).await
    }

    /// Tear the session down: stops the receive task and unblocks any in-flight send.
    ///  Safe to call more than once.
    pub async fn close(&self) {
        let _ = self.shutdown.send(true);

        let receive_task = self
            .receive_task
            .lock()
            .expect("receive task mutex poisoned")
            .take();
        if let Some(receive_task) = receive_task {
            debug!("closing connection");
            let _ = receive_task.await;
            info!("connection closed");
        }
    }
}

impl Drop for KissClient {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}
