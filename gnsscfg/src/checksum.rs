use core::fmt;

use crate::{
    constants::{NMEA_CHECKSUM_DELIMITER, NMEA_CHECKSUM_TEXT_LEN, NMEA_SYNC_CHAR},
    error::Error,
};

/// Compute the NMEA checksum of a sentence body.
///
/// The checksum is the XOR of every byte after the leading `$` up to, but not
/// including, the first `*`. A body without either delimiter is rejected.
///
/// ```
/// assert_eq!(gnsscfg::compute_checksum(b"$PUBX,40,GLL,0,0,0,0*"), Ok(0x5c));
/// ```
pub fn compute_checksum(body: &[u8]) -> Result<u8, Error> {
    if body.first() != Some(&NMEA_SYNC_CHAR) {
        return Err(Error::MalformedSentence {
            reason: "missing '$' start delimiter",
        });
    }
    let end = body
        .iter()
        .position(|b| *b == NMEA_CHECKSUM_DELIMITER)
        .ok_or(Error::MalformedSentence {
            reason: "missing '*' checksum delimiter",
        })?;

    Ok(body[1..end].iter().fold(0u8, |acc, b| acc ^ b))
}

/// Render a checksum as the two uppercase hex digits that follow the `*`
pub const fn render_hex(checksum: u8) -> HexChecksum {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    HexChecksum([
        DIGITS[(checksum >> 4) as usize],
        DIGITS[(checksum & 0x0f) as usize],
    ])
}

/// Two ASCII hex digits, always zero padded
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexChecksum([u8; NMEA_CHECKSUM_TEXT_LEN]);

impl HexChecksum {
    pub fn as_str(&self) -> &str {
        // Both bytes come from the ASCII digit table
        core::str::from_utf8(&self.0).unwrap_or("00")
    }

    pub const fn as_bytes(&self) -> &[u8; NMEA_CHECKSUM_TEXT_LEN] {
        &self.0
    }

    pub const fn value(&self) -> u8 {
        (hex_value(self.0[0]) << 4) | hex_value(self.0[1])
    }
}

impl fmt::Display for HexChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for HexChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HexChecksum({})", self.as_str())
    }
}

const fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}

/// UBX [Fletcher-16 checksum](https://en.wikipedia.org/wiki/Fletcher%27s_checksum)
/// over class, id, length and payload. Not related to the NMEA checksum.
#[derive(Default, Clone, Copy)]
pub struct UbxChecksum {
    ck_a: u8,
    ck_b: u8,
}

impl UbxChecksum {
    pub const fn new() -> Self {
        Self { ck_a: 0, ck_b: 0 }
    }

    /// Update checksum with new bytes
    pub const fn update(&mut self, bytes: &[u8]) {
        let mut i = 0;
        while i < bytes.len() {
            self.update_byte(bytes[i]);
            i += 1;
        }
    }

    /// Update checksum with a single byte
    pub const fn update_byte(&mut self, byte: u8) {
        self.ck_a = self.ck_a.wrapping_add(byte);
        self.ck_b = self.ck_b.wrapping_add(self.ck_a);
    }

    /// Get the current checksum result
    pub const fn result(self) -> (u8, u8) {
        (self.ck_a, self.ck_b)
    }
}

/// Single-shot UBX checksum of `bytes`
pub const fn ubx_checksum(bytes: &[u8]) -> (u8, u8) {
    let mut calc = UbxChecksum::new();
    calc.update(bytes);
    calc.result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_pubx_checksums() {
        assert_eq!(compute_checksum(b"$PUBX,40,GLL,0,0,0,0*"), Ok(0x5c));
        assert_eq!(compute_checksum(b"$PUBX,40,ZDA,1,1,1,0*"), Ok(0x45));
        assert_eq!(compute_checksum(b"$PUBX,41,1,3,3,115200,0*"), Ok(0x1c));
    }

    #[test]
    fn test_checksum_stops_at_first_delimiter() {
        assert_eq!(
            compute_checksum(b"$PUBX,40,GLL,0,0,0,0*5C"),
            compute_checksum(b"$PUBX,40,GLL,0,0,0,0*"),
        );
    }

    #[test]
    fn test_missing_delimiters() {
        assert!(matches!(
            compute_checksum(b"$PUBX,40,GLL,0,0,0,0"),
            Err(Error::MalformedSentence { .. })
        ));
        assert!(matches!(
            compute_checksum(b"PUBX,40,GLL,0,0,0,0*"),
            Err(Error::MalformedSentence { .. })
        ));
        assert!(matches!(
            compute_checksum(b""),
            Err(Error::MalformedSentence { .. })
        ));
    }

    #[test]
    fn test_empty_content_checksum_is_zero() {
        assert_eq!(compute_checksum(b"$*"), Ok(0));
    }

    #[test]
    fn test_render_hex_zero_pads() {
        assert_eq!(render_hex(0x03).as_str(), "03");
        assert_eq!(render_hex(0x00).as_str(), "00");
        assert_eq!(render_hex(0x5c).as_str(), "5C");
        assert_eq!(render_hex(0xff).as_str(), "FF");
        // "$AB*" -> 'A' ^ 'B' = 0x03
        let cs = compute_checksum(b"$AB*").unwrap();
        assert_eq!(render_hex(cs).as_str(), "03");
    }

    #[test]
    fn test_render_hex_value_round_trip() {
        for v in 0..=u8::MAX {
            let hex = render_hex(v);
            assert_eq!(hex.as_str().len(), 2);
            assert_eq!(hex.value(), v);
        }
    }

    #[test]
    fn test_ubx_checksum_ack_ack() {
        // UBX-ACK-ACK: class 0x05, id 0x01, length 2, payload [0x06, 0x01]
        assert_eq!(ubx_checksum(&[0x05, 0x01, 0x02, 0x00, 0x06, 0x01]), (0x0f, 0x38));
    }

    #[test]
    fn test_ubx_checksum_streaming_matches_single_shot() {
        let bytes = [0x06, 0x09, 0x0d, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff];
        let mut calc = UbxChecksum::new();
        for chunk in bytes.chunks(3) {
            calc.update(chunk);
        }
        assert_eq!(calc.result(), ubx_checksum(&bytes));
    }
}
