use alloc::{string::String, vec::Vec};
use core::fmt;

use crate::{
    checksum::{compute_checksum, render_hex, HexChecksum},
    constants::{
        NMEA_CHECKSUM_DELIMITER, NMEA_CHECKSUM_TEXT_LEN, NMEA_END_CHAR_1, NMEA_END_CHAR_2,
        NMEA_FIELD_SEPARATOR, NMEA_SYNC_CHAR, NMEA_TERMINATOR,
    },
    error::Error,
};

/// An NMEA sentence up to and including the `*` checksum delimiter,
/// e.g. `$PUBX,40,GLL,0,0,0,0*`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SentenceBody(String);

impl SentenceBody {
    /// Validates and takes ownership of a sentence body.
    ///
    /// The body must start with `$`, end with its one and only `*`, and be
    /// printable ASCII.
    pub fn new(body: impl Into<String>) -> Result<Self, Error> {
        let body = body.into();
        let bytes = body.as_bytes();
        if bytes.first() != Some(&NMEA_SYNC_CHAR) {
            return Err(Error::MalformedSentence {
                reason: "missing '$' start delimiter",
            });
        }
        match bytes.iter().position(|b| *b == NMEA_CHECKSUM_DELIMITER) {
            None => {
                return Err(Error::MalformedSentence {
                    reason: "missing '*' checksum delimiter",
                })
            },
            Some(end) if end != bytes.len() - 1 => {
                return Err(Error::MalformedSentence {
                    reason: "characters after '*' checksum delimiter",
                })
            },
            Some(_) => {},
        }
        if !bytes.iter().all(|b| b.is_ascii_graphic()) {
            return Err(Error::MalformedSentence {
                reason: "non printable or non ASCII character",
            });
        }
        Ok(Self(body))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Comma separated fields between `$` and `*`, starting with the tag
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        let inner = &self.0[..self.0.len() - 1];
        inner.split(char::from(NMEA_FIELD_SEPARATOR))
    }

    pub fn checksum(&self) -> u8 {
        // Delimiters were checked on construction
        compute_checksum(self.as_bytes()).unwrap_or_default()
    }
}

impl fmt::Display for SentenceBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SentenceBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SentenceBody({:?})", self.0)
    }
}

/// A complete NMEA frame ready for the wire: body, checksum and terminator
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    bytes: Vec<u8>,
    body_len: usize,
}

/// Concatenate a sentence body, its rendered checksum and a terminator.
///
/// Nothing is reformatted. `checksum_hex` must be exactly two hex digits and
/// the terminator must not be empty.
pub fn compile(body: &SentenceBody, checksum_hex: &str, terminator: &str) -> Result<Frame, Error> {
    if checksum_hex.len() != NMEA_CHECKSUM_TEXT_LEN
        || !checksum_hex.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return Err(Error::InvalidChecksumText {
            len: checksum_hex.chars().count(),
        });
    }
    if terminator.is_empty() {
        return Err(Error::MalformedSentence {
            reason: "empty terminator",
        });
    }

    let mut bytes = Vec::with_capacity(body.as_bytes().len() + checksum_hex.len() + terminator.len());
    bytes.extend_from_slice(body.as_bytes());
    bytes.extend_from_slice(checksum_hex.as_bytes());
    bytes.extend_from_slice(terminator.as_bytes());
    Ok(Frame {
        bytes,
        body_len: body.as_bytes().len(),
    })
}

impl Frame {
    /// Compute the checksum of `body` and terminate it with `\r\n`
    pub fn from_body(body: &SentenceBody) -> Frame {
        let hex = render_hex(body.checksum());
        let mut bytes = Vec::with_capacity(
            body.as_bytes().len() + NMEA_CHECKSUM_TEXT_LEN + NMEA_TERMINATOR.len(),
        );
        bytes.extend_from_slice(body.as_bytes());
        bytes.extend_from_slice(hex.as_bytes());
        bytes.extend_from_slice(NMEA_TERMINATOR.as_bytes());
        Frame {
            bytes,
            body_len: body.as_bytes().len(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The body part, up to and including the `*`
    pub fn body(&self) -> &str {
        core::str::from_utf8(&self.bytes[..self.body_len]).unwrap_or_default()
    }

    /// The two characters after the `*`
    pub fn checksum_text(&self) -> &str {
        core::str::from_utf8(&self.bytes[self.body_len..self.body_len + NMEA_CHECKSUM_TEXT_LEN])
            .unwrap_or_default()
    }

    pub fn terminator(&self) -> &[u8] {
        &self.bytes[self.body_len + NMEA_CHECKSUM_TEXT_LEN..]
    }

    /// Recompute the checksum over the embedded body, the way the receiver does
    pub fn verify(&self) -> bool {
        let Ok(checksum) = compute_checksum(&self.bytes[..self.body_len]) else {
            return false;
        };
        let text = self.checksum_text().as_bytes();
        text.len() == NMEA_CHECKSUM_TEXT_LEN
            && render_hex(checksum).as_bytes().eq_ignore_ascii_case(text)
    }

    pub fn hex_checksum(&self) -> Option<HexChecksum> {
        compute_checksum(&self.bytes[..self.body_len])
            .ok()
            .map(render_hex)
    }
}

impl fmt::Display for Frame {
    /// Printable form with the terminator escaped, e.g. `$PUBX,...*5C\r\n`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.bytes {
            match *b {
                NMEA_END_CHAR_1 => f.write_str("\\r")?,
                NMEA_END_CHAR_2 => f.write_str("\\n")?,
                b if b.is_ascii_graphic() || b == b' ' => write!(f, "{}", b as char)?,
                b => write!(f, "\\x{:02x}", b)?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame(\"{}\")", self)
    }
}
