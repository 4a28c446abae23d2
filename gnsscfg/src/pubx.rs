//! Builders for the proprietary `$PUBX` configuration sentences.
//!
//! * `$PUBX,40,<id>,<ddc>,<usart1>,<usart2>,<usb>*` sets the output rate of
//!   one NMEA sentence on each port (0 disables it).
//! * `$PUBX,41,<port>,<inProto>,<outProto>,<baud>,<autobauding>*` sets the
//!   protocols and baud rate of one port.

use alloc::format;
use bitflags::bitflags;

use crate::{
    constants::{PUBX_MSG_CONFIG, PUBX_MSG_RATE, PUBX_TAG},
    error::Error,
    nmea::SentenceBody,
};

bitflags! {
    /// A mask describing which input protocols are active
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InProtoMask: u16 {
        const UBLOX = 1;
        const NMEA = 2;
        const RTCM = 4;
        /// The bitfield inRtcm3 is not supported in protocol
        /// versions less than 20
        const RTCM3 = 0x20;
    }
}

bitflags! {
    /// A mask describing which output protocols are active
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OutProtoMask: u16 {
        const UBLOX = 1;
        const NMEA = 2;
        /// The bitfield outRtcm3 is not supported in protocol
        /// versions less than 20
        const RTCM3 = 0x20;
    }
}

/// Receiver port numbers as used by PUBX,41 and UBX-CFG-PRT
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortId {
    Ddc = 0,
    Uart1 = 1,
    Uart2 = 2,
    Usb = 3,
    Spi = 4,
}

/// Per-port output rate of one sentence: 0 disables, 1 emits every epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortRates {
    pub ddc: u8,
    pub usart1: u8,
    pub usart2: u8,
    pub usb: u8,
}

impl PortRates {
    /// Output on USART1 only
    pub const UART1_ONLY: PortRates = PortRates {
        ddc: 0,
        usart1: 1,
        usart2: 0,
        usb: 0,
    };

    /// Output nowhere
    pub const NONE: PortRates = PortRates {
        ddc: 0,
        usart1: 0,
        usart2: 0,
        usb: 0,
    };

    pub fn is_disabled(&self) -> bool {
        *self == Self::NONE
    }
}

/// Settings carried by a PUBX,41 sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfig {
    pub port: PortId,
    pub in_proto: InProtoMask,
    pub out_proto: OutProtoMask,
    pub baud_rate: u32,
    pub autobauding: bool,
}

impl PortConfig {
    /// USART1, UBX+NMEA in and out, autobauding off
    pub const fn uart1(baud_rate: u32) -> Self {
        Self {
            port: PortId::Uart1,
            in_proto: InProtoMask::UBLOX.union(InProtoMask::NMEA),
            out_proto: OutProtoMask::UBLOX.union(OutProtoMask::NMEA),
            baud_rate,
            autobauding: false,
        }
    }
}

/// Sentence identifiers are short uppercase names like `GGA` or `ZDA`
fn check_identifier(identifier: &str) -> Result<(), Error> {
    let valid_len = (1..=5).contains(&identifier.len());
    let valid_chars = identifier
        .bytes()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
    if valid_len && valid_chars {
        Ok(())
    } else {
        Err(Error::MalformedSentence {
            reason: "sentence identifier must be 1 to 5 uppercase letters or digits",
        })
    }
}

/// `$PUBX,40,<identifier>,<ddc>,<usart1>,<usart2>,<usb>*`
pub fn rate_sentence(identifier: &str, rates: PortRates) -> Result<SentenceBody, Error> {
    check_identifier(identifier)?;
    SentenceBody::new(format!(
        "{},{},{},{},{},{},{}*",
        PUBX_TAG, PUBX_MSG_RATE, identifier, rates.ddc, rates.usart1, rates.usart2, rates.usb
    ))
}

/// Enable `identifier` on USART1 and disable it on every other port
pub fn enable_on_uart1(identifier: &str) -> Result<SentenceBody, Error> {
    rate_sentence(identifier, PortRates::UART1_ONLY)
}

/// Disable `identifier` on all ports
pub fn disable_everywhere(identifier: &str) -> Result<SentenceBody, Error> {
    rate_sentence(identifier, PortRates::NONE)
}

/// `$PUBX,41,<port>,<inProto>,<outProto>,<baud>,<autobauding>*`
///
/// Protocol masks are written as hex without padding, which is what the
/// receiver accepts for both `3` and `0003`.
pub fn port_config(config: PortConfig) -> Result<SentenceBody, Error> {
    if config.baud_rate == 0 {
        return Err(Error::MalformedCommand {
            reason: "baud rate must not be zero",
        });
    }
    SentenceBody::new(format!(
        "{},{},{},{:X},{:X},{},{}*",
        PUBX_TAG,
        PUBX_MSG_CONFIG,
        config.port as u8,
        config.in_proto.bits(),
        config.out_proto.bits(),
        config.baud_rate,
        u8::from(config.autobauding),
    ))
}

/// Switch USART1 to `baud_rate`, keeping UBX and NMEA on both directions
pub fn baud_change(baud_rate: u32) -> Result<SentenceBody, Error> {
    port_config(PortConfig::uart1(baud_rate))
}
