use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::timeout;

/// Outcome of waiting for an acknowledgement.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AckWait {
    /// The ACK arrived within the deadline.
    Acked,
    /// The deadline elapsed without an ACK.
    TimedOut,
    /// The connection was torn down while waiting - there will never be an ACK.
    Closed,
}

/// Create the single-slot ACK signal shared between the receive loop (set side) and
///  the reliable sender (clear / wait side).
///
/// This is a capacity-1 channel rather than a polled flag: setting and clearing are
///  atomic channel operations, so an ACK arriving concurrently with the start of a
///  wait cannot be lost, and a signal left over from a previous attempt can be drained
///  before the next one consumes it.
pub fn ack_signal() -> (AckNotifier, AckListener) {
    let (tx, rx) = mpsc::channel(1);
    (AckNotifier { tx }, AckListener { rx })
}

#[derive(Clone)]
pub struct AckNotifier {
    tx: mpsc::Sender<()>,
}

impl AckNotifier {
    /// Signal that an ACK frame arrived. Signaling an already-signaled slot is a no-op,
    ///  so duplicate ACKs collapse into one.
    pub fn notify(&self) {
        let _ = self.tx.try_send(());
    }
}

pub struct AckListener {
    rx: mpsc::Receiver<()>,
}

impl AckListener {
    /// Drain a pending signal so a stale ACK from a previous attempt is not mistaken
    ///  for the response to the next one.
    pub fn clear(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(()) => {}
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return,
            }
        }
    }

    /// Wait for the signal up to `deadline`. Observes the notifier being dropped
    ///  (connection teardown) as `Closed` rather than blocking out the full deadline.
    pub async fn wait(&mut self, deadline: Duration) -> AckWait {
        match timeout(deadline, self.rx.recv()).await {
            Ok(Some(())) => AckWait::Acked,
            Ok(None) => AckWait::Closed,
            Err(_) => AckWait::TimedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::runtime::Builder;

    use super::*;

    fn paused_rt() -> tokio::runtime::Runtime {
        Builder::new_current_thread()
            .enable_all()
            .start_paused(true)
            .build()
            .unwrap()
    }

    #[test]
    fn test_notify_then_wait() {
        paused_rt().block_on(async {
            let (notifier, mut listener) = ack_signal();

            notifier.notify();
            assert_eq!(listener.wait(Duration::from_secs(5)).await, AckWait::Acked);
        });
    }

    #[test]
    fn test_wait_times_out() {
        paused_rt().block_on(async {
            let (_notifier, mut listener) = ack_signal();

            let started = tokio::time::Instant::now();
            assert_eq!(listener.wait(Duration::from_secs(5)).await, AckWait::TimedOut);
            assert_eq!(started.elapsed(), Duration::from_secs(5));
        });
    }

    #[test]
    fn test_clear_drains_stale_signal() {
        paused_rt().block_on(async {
            let (notifier, mut listener) = ack_signal();

            notifier.notify();
            listener.clear();
            assert_eq!(listener.wait(Duration::from_millis(10)).await, AckWait::TimedOut);
        });
    }

    #[test]
    fn test_duplicate_notifications_collapse() {
        paused_rt().block_on(async {
            let (notifier, mut listener) = ack_signal();

            notifier.notify();
            notifier.notify();
            notifier.notify();

            assert_eq!(listener.wait(Duration::from_millis(10)).await, AckWait::Acked);
            assert_eq!(listener.wait(Duration::from_millis(10)).await, AckWait::TimedOut);
        });
    }

    #[test]
    fn test_dropped_notifier_is_closed() {
        paused_rt().block_on(async {
            let (notifier, mut listener) = ack_signal();

            drop(notifier);
            assert_eq!(listener.wait(Duration::from_secs(5)).await, AckWait::Closed);
        });
    }

    #[test]
    fn test_clear_after_disconnect_terminates() {
        paused_rt().block_on(async {
            let (notifier, mut listener) = ack_signal();

            notifier.notify();
            drop(notifier);

            listener.clear();
            assert_eq!(listener.wait(Duration::from_secs(5)).await, AckWait::Closed);
        });
    }
}
