//! A client for the KISS protocol over TCP, exchanging AX.25 UI frames with a software
//!  modem (soundmodem, Direwolf and friends) and layering a minimal ACK/retry scheme on
//!  top to get at-least-once delivery of chat messages over a narrowband radio link.
//!
//! ## Design goals
//!
//! * Connectionless on the air: everything is sent as AX.25 *Unnumbered Information*
//!   frames - no SABM/DISC link establishment, no digipeater paths, no multi-frame
//!   segmentation. One message, one frame.
//! * Reliability lives entirely in the application layer: the receiver answers every
//!   message addressed to it with a frame whose payload is the literal `ACK`, and the
//!   sender retransmits on a fixed timeout until an ACK arrives or its attempt budget
//!   is spent. No backoff - bandwidth on these links is dominated by the radio side,
//!   and a predictable worst-case blocking time is worth more than an adaptive schedule.
//! * The modem connection is a plain TCP socket carrying KISS frames; the modem owns
//!   the radio-side timing (FCS, keying, persistence), this client never sends KISS
//!   configuration commands.
//!
//! ## Wire format
//!
//! Each frame on the TCP connection:
//!
//! ```ascii
//! 0xC0 | 0x00 | DST[7] | SRC[7] | 0x03 | 0xF0 | INFO... | 0xC0
//! FEND   cmd                      ctrl   PID             FEND
//! ```
//!
//! * `0xC0` (FEND) delimits the frame, `0x00` is the KISS command byte for "data
//!   frame, port 0" - the only command produced or expected.
//! * Each 7-byte address field encodes a callsign and SSID:
//!
//! ```ascii
//! 0-5: callsign, uppercase, right-padded with spaces, each ASCII code shifted
//!       left by one bit (low bit clear - reserved for the extension bit chain)
//! 6:   (ssid & 0x0F) << 1, with bit 0 set on the last address field only
//! ```
//!
//! * `0x03` marks a UI frame, `0xF0` means "no layer 3 protocol".
//! * `INFO` is the ASCII message text, or the literal `ACK`.
//!
//! ## Concurrency
//!
//! Two tasks run per session: the receive loop (spawned at connect time, owns the read
//!  half) and the caller's context issuing sends (at most one in flight; a concurrent
//!  send is rejected rather than queued). They share exactly two things: the write half
//!  of the socket, serialized by a mutex so message frames and ACK replies cannot
//!  interleave, and the single-slot ACK signal that the receive loop sets and a waiting
//!  send consumes.
//!
//! ## Protocol limitations
//!
//! There are no sequence numbers. The receiver cannot distinguish a retransmission
//!  from a new message that happens to carry the same text, and it acknowledges every
//!  message it receives - a retransmitted original therefore produces a duplicate ACK
//!  and a duplicate delivery. Deduplication would need a protocol change on both ends.

pub mod ack_signal;
pub mod callsign;
pub mod client;
pub mod config;
pub mod frame;
pub mod message_handler;
pub mod receive_loop;
pub mod reliable_sender;
pub mod send_pipeline;

#[cfg(test)]
mod tests {
    use tracing::Level;

    #[ctor::ctor]
    fn init_test_logging() {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(Level::TRACE)
            .try_init()
            .ok();
    }
}
