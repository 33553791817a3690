use std::fmt::{Display, Formatter};

use anyhow::bail;
use bytes::{BufMut, BytesMut};

use crate::callsign::Callsign;

/// KISS frame delimiter (FEND), marking the start and end of every frame.
pub const FEND: u8 = 0xC0;
/// KISS command byte for "data frame, port 0" - the only command this client produces
///  or expects.
pub const CMD_DATA: u8 = 0x00;
/// AX.25 control field: Unnumbered Information (UI) frame.
pub const CONTROL_UI: u8 = 0x03;
/// AX.25 PID: no layer 3 protocol.
pub const PID_NO_LAYER3: u8 = 0xF0;

/// Payload of the acknowledgement frames this protocol exchanges.
pub const ACK_PAYLOAD: &[u8] = b"ACK";

/// Two address fields plus control and PID.
const MIN_AX25_LEN: usize = 2 * Callsign::ENCODED_LEN + 2;

/// A decoded AX.25 UI frame.
///
/// `control` and `pid` are extracted but not validated - a modem may hand us frame
///  types this client does not produce, and dropping them here would be the wrong
///  layer for that decision.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Ax25Frame {
    pub dst: Callsign,
    pub src: Callsign,
    pub control: u8,
    pub pid: u8,
    pub payload: Vec<u8>,
}

/// Build a complete KISS-wrapped AX.25 UI frame:
///
/// ```ascii
/// FEND | CMD_DATA | DST[7] | SRC[7] | CONTROL | PID | INFO... | FEND
/// ```
///
/// The destination address field is encoded with the extension bit clear, the source
///  field with it set - the last address in the AX.25 chain marks the end of the
///  address section.
///
/// The payload must be ASCII; anything else is rejected here, before the frame gets
///  anywhere near the socket.
pub fn encode_kiss_frame(src: &Callsign, dst: &Callsign, payload: &str) -> anyhow::Result<BytesMut> {
    if !payload.is_ascii() {
        bail!("payload is not ASCII and cannot be represented on the wire");
    }

    let mut buf = BytesMut::with_capacity(MIN_AX25_LEN + payload.len() + 3);
    buf.put_u8(FEND);
    buf.put_u8(CMD_DATA);
    buf.put_slice(&dst.encode_address(false));
    buf.put_slice(&src.encode_address(true));
    buf.put_u8(CONTROL_UI);
    buf.put_u8(PID_NO_LAYER3);
    buf.put_slice(payload.as_bytes());
    buf.put_u8(FEND);
    Ok(buf)
}

impl Ax25Frame {
    /// Parse one KISS-wrapped frame: strip the FEND delimiters and the command byte,
    ///  then decode the AX.25 header. Fails on anything that is not a single complete
    ///  frame - the receive loop treats that as noise and skips it.
    pub fn decode_kiss_frame(bytes: &[u8]) -> anyhow::Result<Ax25Frame> {
        if bytes.len() < 2 || bytes[0] != FEND || bytes[bytes.len() - 1] != FEND {
            bail!("not a KISS frame: missing FEND delimiters");
        }
        let inner = &bytes[1..bytes.len() - 1];

        let Some((_command, ax25)) = inner.split_first() else {
            bail!("empty KISS frame");
        };
        if ax25.len() < MIN_AX25_LEN {
            bail!("AX.25 header truncated: {} bytes", ax25.len());
        }

        let dst = Callsign::decode_address(ax25[..Callsign::ENCODED_LEN].try_into()?)?;
        let src =
            Callsign::decode_address(ax25[Callsign::ENCODED_LEN..2 * Callsign::ENCODED_LEN].try_into()?)?;

        Ok(Ax25Frame {
            dst,
            src,
            control: ax25[2 * Callsign::ENCODED_LEN],
            pid: ax25[2 * Callsign::ENCODED_LEN + 1],
            payload: ax25[MIN_AX25_LEN..].to_vec(),
        })
    }

    /// The payload as text, for dispatch and logging.
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    pub fn is_ack(&self) -> bool {
        self.payload == ACK_PAYLOAD
    }
}

impl Display for Ax25Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}: {:?}", self.src, self.dst, self.payload_text())
    }
}
