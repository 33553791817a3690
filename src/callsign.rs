use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use anyhow::{anyhow, bail};

/// An AX.25 station address: a callsign of up to six printable ASCII characters plus a
///  4-bit SSID distinguishing several stations operating under the same callsign.
///
/// Callsigns are case-insensitive on the air, so they are normalized to uppercase on
///  construction - equality and address matching work on the normalized form.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Callsign {
    call: String,
    ssid: u8,
}

impl Callsign {
    /// Length of the encoded address field on the wire.
    pub const ENCODED_LEN: usize = 7;

    const MAX_CALL_LEN: usize = 6;
    const MAX_SSID: u8 = 15;

    pub fn new(call: &str, ssid: u8) -> anyhow::Result<Callsign> {
        let call = call.trim();
        if call.is_empty() {
            bail!("callsign must not be empty");
        }
        if call.len() > Self::MAX_CALL_LEN {
            bail!("callsign {:?} is longer than {} characters", call, Self::MAX_CALL_LEN);
        }
        if !call.bytes().all(|b| b.is_ascii_graphic()) {
            bail!("callsign {:?} contains non-printable or non-ASCII characters", call);
        }
        if ssid > Self::MAX_SSID {
            bail!("SSID {} does not fit in four bits", ssid);
        }

        Ok(Callsign {
            call: call.to_ascii_uppercase(),
            ssid,
        })
    }

    pub fn call(&self) -> &str {
        &self.call
    }

    pub fn ssid(&self) -> u8 {
        self.ssid
    }

    /// Encode as the 7-byte AX.25 address field: six bytes of callsign characters
    ///  right-padded with spaces, each ASCII code shifted left by one bit, followed by
    ///  the SSID byte.
    ///
    /// The low bit of every character byte stays clear - it is reserved for the address
    ///  extension bit chain, and only the trailing SSID byte of the *last* address field
    ///  sets it (`last`).
    pub fn encode_address(&self, last: bool) -> [u8; Callsign::ENCODED_LEN] {
        let mut encoded = [(b' ' << 1) & 0xFE; Callsign::ENCODED_LEN];
        for (i, b) in self.call.bytes().enumerate() {
            encoded[i] = (b << 1) & 0xFE;
        }

        let mut ssid_field = (self.ssid & 0x0F) << 1;
        if last {
            ssid_field |= 0x01;
        }
        encoded[Callsign::ENCODED_LEN - 1] = ssid_field;
        encoded
    }

    /// Decode a 7-byte address field, trimming the space padding.
    pub fn decode_address(field: &[u8; Callsign::ENCODED_LEN]) -> anyhow::Result<Callsign> {
        let mut call = String::with_capacity(Self::MAX_CALL_LEN);
        for &b in &field[..Self::MAX_CALL_LEN] {
            call.push((b >> 1) as char);
        }
        let ssid = (field[Callsign::ENCODED_LEN - 1] >> 1) & 0x0F;

        Callsign::new(call.trim_end_matches(' '), ssid)
    }
}

impl FromStr for Callsign {
    type Err = anyhow::Error;

    /// Parses the canonical `CALL-SSID` form; a missing suffix means SSID 0.
    fn from_str(s: &str) -> Result<Callsign, Self::Err> {
        match s.split_once('-') {
            None => Callsign::new(s, 0),
            Some((call, ssid)) => {
                let ssid = ssid
                    .parse()
                    .map_err(|_| anyhow!("invalid SSID suffix in callsign {:?}", s))?;
                Callsign::new(call, ssid)
            }
        }
    }
}

impl Display for Callsign {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.ssid == 0 {
            write!(f, "{}", self.call)
        }
        else {
            write!(f, "{}-{}", self.call, self.ssid)
        }
    }
}

impl Debug for Callsign {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    #[rstest]
    #[case::simple("CQ", 0, false, [0x86, 0xA2, 0x40, 0x40, 0x40, 0x40, 0x00])]
    #[case::simple_last("CQ", 0, true, [0x86, 0xA2, 0x40, 0x40, 0x40, 0x40, 0x01])]
    #[case::full_length("NOCALL", 0, true, [0x9C, 0x9E, 0x86, 0x82, 0x98, 0x98, 0x01])]
    #[case::lowercase_normalized("k8sdr", 1, true, [0x96, 0x70, 0xA6, 0x88, 0xA4, 0x40, 0x03])]
    #[case::max_ssid("K8SDR", 15, false, [0x96, 0x70, 0xA6, 0x88, 0xA4, 0x40, 0x1E])]
    fn test_encode_address(
        #[case] call: &str,
        #[case] ssid: u8,
        #[case] last: bool,
        #[case] expected: [u8; 7],
    ) {
        let callsign = Callsign::new(call, ssid).unwrap();
        assert_eq!(callsign.encode_address(last), expected);
    }

    #[rstest]
    #[case::no_ssid("CQ", 0)]
    #[case::full_length("NOCALL", 0)]
    #[case::with_ssid("K8SDR", 1)]
    #[case::max_ssid("K8SDR", 15)]
    #[case::single_char("X", 7)]
    fn test_address_round_trip(#[case] call: &str, #[case] ssid: u8) {
        let callsign = Callsign::new(call, ssid).unwrap();

        for last in [false, true] {
            let decoded = Callsign::decode_address(&callsign.encode_address(last)).unwrap();
            assert_eq!(decoded, callsign);
        }
    }

    #[rstest]
    fn test_character_bytes_have_low_bit_clear() {
        let encoded = Callsign::new("W1AW", 9).unwrap().encode_address(true);
        for b in &encoded[..6] {
            assert_eq!(b & 0x01, 0);
        }
    }

    #[rstest]
    #[case::no_suffix("NOCALL", "NOCALL", 0)]
    #[case::with_suffix("K8SDR-1", "K8SDR", 1)]
    #[case::two_digit_suffix("K8SDR-11", "K8SDR", 11)]
    #[case::lowercase("k8sdr-2", "K8SDR", 2)]
    fn test_parse(#[case] input: &str, #[case] expected_call: &str, #[case] expected_ssid: u8) {
        let callsign: Callsign = input.parse().unwrap();
        assert_eq!(callsign.call(), expected_call);
        assert_eq!(callsign.ssid(), expected_ssid);
    }

    #[rstest]
    #[case::zero_ssid_omitted("NOCALL", 0, "NOCALL")]
    #[case::nonzero_ssid_rendered("K8SDR", 2, "K8SDR-2")]
    fn test_display(#[case] call: &str, #[case] ssid: u8, #[case] expected: &str) {
        let callsign = Callsign::new(call, ssid).unwrap();
        assert_eq!(callsign.to_string(), expected);

        let reparsed: Callsign = expected.parse().unwrap();
        assert_eq!(reparsed, callsign);
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("   ")]
    #[case::too_long("TOOLONGCALL")]
    #[case::ssid_out_of_range("K8SDR-16")]
    #[case::ssid_not_a_number("K8SDR-x")]
    #[case::embedded_space("K8 SDR")]
    #[case::non_ascii("ÜBER")]
    fn test_parse_rejects(#[case] input: &str) {
        assert!(input.parse::<Callsign>().is_err());
    }

    #[rstest]
    fn test_new_rejects_ssid_out_of_range() {
        assert!(Callsign::new("K8SDR", 16).is_err());
    }
}
