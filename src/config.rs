use std::time::Duration;

use anyhow::bail;

/// Tuning knobs for a KISS client session.
///
/// The defaults match the behavior of typical soundmodem chat setups: a 5 second ACK
///  window, three transmissions before giving up, and a 1 KiB receive buffer. There is
///  deliberately no backoff - on a narrowband half-duplex link a fixed timeout and a
///  fixed attempt cap are easier to reason about than an adaptive schedule, and the
///  worst-case blocking time (`max_send_attempts * ack_timeout`) stays predictable.
#[derive(Clone, Debug)]
pub struct KissConfig {
    /// How long a reliable send waits for the peer's ACK before retransmitting.
    pub ack_timeout: Duration,

    /// Total number of transmissions of a message (initial send plus retries) before
    ///  the send is reported as exhausted.
    pub max_send_attempts: u32,

    /// Size of the receive read buffer. One KISS frame is expected per read, so this
    ///  bounds the largest frame that can arrive intact.
    pub read_buffer_size: usize,
}

impl Default for KissConfig {
    fn default() -> KissConfig {
        KissConfig {
            ack_timeout: Duration::from_secs(5),
            max_send_attempts: 3,
            read_buffer_size: 1024,
        }
    }
}

impl KissConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ack_timeout.is_zero() {
            bail!("ack timeout must not be zero");
        }
        if self.max_send_attempts == 0 {
            bail!("at least one send attempt is required");
        }
        if self.read_buffer_size < 64 {
            bail!("read buffer is too small to hold a frame");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    #[rstest]
    fn test_default_is_valid() {
        assert!(KissConfig::default().validate().is_ok());
    }

    #[rstest]
    #[case::zero_timeout(KissConfig { ack_timeout: Duration::ZERO, ..KissConfig::default() })]
    #[case::zero_attempts(KissConfig { max_send_attempts: 0, ..KissConfig::default() })]
    #[case::tiny_buffer(KissConfig { read_buffer_size: 16, ..KissConfig::default() })]
    fn test_validate_rejects(#[case] config: KissConfig) {
        assert!(config.validate().is_err());
    }
}
