use alloc::vec::Vec;
use core::fmt;

use crate::{
    checksum::{ubx_checksum, UbxChecksum},
    constants::{
        UBX_CHECKSUM_LEN, UBX_CLASS_OFFSET, UBX_HEADER_LEN, UBX_LENGTH_OFFSET, UBX_MSG_ID_OFFSET,
        UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2,
    },
    error::{Error, FrameError},
    pubx::{InProtoMask, OutProtoMask, PortId},
};

/// A complete UBX frame. The bytes and their length travel together, so a
/// frame can only be sent whole.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct UbxFrame(Vec<u8>);

/// Check that `bytes` is one complete UBX frame.
///
/// Verifies the `B5 62` sync header, that the buffer is exactly
/// `header + class/id + length + payload + checksum` long for the declared
/// payload length, and that the Fletcher checksum matches.
pub fn validate_ubx_frame(bytes: &[u8]) -> Result<UbxFrame, Error> {
    let min_len = UBX_HEADER_LEN + UBX_CHECKSUM_LEN;
    if bytes.len() < min_len {
        return Err(FrameError::TooShort { got: bytes.len() }.into());
    }
    if bytes[0] != UBX_SYNC_CHAR_1 || bytes[1] != UBX_SYNC_CHAR_2 {
        return Err(FrameError::BadSync {
            got: [bytes[0], bytes[1]],
        }
        .into());
    }

    let declared =
        u16::from_le_bytes([bytes[UBX_LENGTH_OFFSET], bytes[UBX_LENGTH_OFFSET + 1]]) as usize;
    let actual = bytes.len() - min_len;
    if declared != actual {
        return Err(FrameError::LengthMismatch { declared, actual }.into());
    }

    let (ck_a, ck_b) = ubx_checksum(&bytes[UBX_CLASS_OFFSET..UBX_HEADER_LEN + declared]);
    let (got_a, got_b) = (bytes[bytes.len() - 2], bytes[bytes.len() - 1]);
    if (ck_a, ck_b) != (got_a, got_b) {
        return Err(FrameError::ChecksumMismatch {
            expect: u16::from_le_bytes([got_a, got_b]),
            got: u16::from_le_bytes([ck_a, ck_b]),
        }
        .into());
    }

    Ok(UbxFrame(bytes.to_vec()))
}

impl UbxFrame {
    /// Build a frame from its class, id and payload, filling in the length
    /// and checksum
    pub fn new(class: u8, id: u8, payload: &[u8]) -> Result<Self, Error> {
        let len = u16::try_from(payload.len())
            .map_err(|_| FrameError::PayloadTooLong { got: payload.len() })?;

        let mut v = Vec::with_capacity(UBX_HEADER_LEN + payload.len() + UBX_CHECKSUM_LEN);
        v.push(UBX_SYNC_CHAR_1);
        v.push(UBX_SYNC_CHAR_2);
        v.push(class);
        v.push(id);
        v.extend_from_slice(&len.to_le_bytes());
        v.extend_from_slice(payload);

        let mut calc = UbxChecksum::new();
        calc.update(&v[UBX_CLASS_OFFSET..]);
        let (ck_a, ck_b) = calc.result();
        v.push(ck_a);
        v.push(ck_b);
        Ok(Self(v))
    }

    pub fn class(&self) -> u8 {
        self.0[UBX_CLASS_OFFSET]
    }

    pub fn id(&self) -> u8 {
        self.0[UBX_MSG_ID_OFFSET]
    }

    pub fn payload(&self) -> &[u8] {
        &self.0[UBX_HEADER_LEN..self.0.len() - UBX_CHECKSUM_LEN]
    }

    pub fn checksum(&self) -> (u8, u8) {
        (self.0[self.0.len() - 2], self.0[self.0.len() - 1])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl TryFrom<&[u8]> for UbxFrame {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        validate_ubx_frame(bytes)
    }
}

impl AsRef<[u8]> for UbxFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for UbxFrame {
    /// Space separated hex bytes
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for UbxFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UbxFrame {{ class: 0x{:02x}, id: 0x{:02x}, len: {} }}",
            self.class(),
            self.id(),
            self.payload().len()
        )
    }
}

pub const UBX_CLASS_CFG: u8 = 0x06;
pub const UBX_ID_CFG_PRT: u8 = 0x00;
pub const UBX_ID_CFG_CFG: u8 = 0x09;

/// 8 data bits, no parity, 1 stop bit in the CFG-PRT `mode` field
const UART_MODE_8N1: u32 = 0x0000_08d0;

bitflags::bitflags! {
    /// Storage devices a CFG-CFG command applies to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DeviceMask: u8 {
        const BBR = 0x01;
        const FLASH = 0x02;
        const EEPROM = 0x04;
        const SPI_FLASH = 0x10;
    }
}

/// UBX-CFG-PRT for USART1 at `baud_rate`, 8N1, UBX+NMEA+RTCM in, UBX+NMEA out
pub fn cfg_prt_uart(baud_rate: u32) -> Result<UbxFrame, Error> {
    let in_proto = InProtoMask::UBLOX | InProtoMask::NMEA | InProtoMask::RTCM;
    let out_proto = OutProtoMask::UBLOX | OutProtoMask::NMEA;

    let mut payload = Vec::with_capacity(20);
    payload.push(PortId::Uart1 as u8);
    payload.push(0); // reserved0
    payload.extend_from_slice(&0u16.to_le_bytes()); // tx_ready
    payload.extend_from_slice(&UART_MODE_8N1.to_le_bytes());
    payload.extend_from_slice(&baud_rate.to_le_bytes());
    payload.extend_from_slice(&in_proto.bits().to_le_bytes());
    payload.extend_from_slice(&out_proto.bits().to_le_bytes());
    payload.extend_from_slice(&0u16.to_le_bytes()); // flags
    payload.extend_from_slice(&0u16.to_le_bytes()); // reserved5
    UbxFrame::new(UBX_CLASS_CFG, UBX_ID_CFG_PRT, &payload)
}

/// UBX-CFG-CFG saving every section of the current configuration to
/// battery backed RAM and flash, so it survives a power cycle
pub fn cfg_cfg_save_all() -> Result<UbxFrame, Error> {
    let clear_mask: u32 = 0;
    let save_mask: u32 = 0x0000_ffff;
    let load_mask: u32 = 0;
    let device = DeviceMask::BBR | DeviceMask::FLASH;

    let mut payload = Vec::with_capacity(13);
    payload.extend_from_slice(&clear_mask.to_le_bytes());
    payload.extend_from_slice(&save_mask.to_le_bytes());
    payload.extend_from_slice(&load_mask.to_le_bytes());
    payload.push(device.bits());
    UbxFrame::new(UBX_CLASS_CFG, UBX_ID_CFG_CFG, &payload)
}
