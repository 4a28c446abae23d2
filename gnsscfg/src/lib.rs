//! # gnsscfg
//!
//! Build and send configuration commands to u-blox GNSS receivers over a UART,
//! using proprietary NMEA `$PUBX` sentences and binary UBX frames.
//!
//! Compiling Messages
//! ==================
//!
//! A PUBX command starts life as a [`SentenceBody`] ending in `*`. The checksum
//! is computed over the body and the frame is terminated with `\r\n`:
//! ```
//! use gnsscfg::{compile, compute_checksum, render_hex, SentenceBody};
//!
//! let body = SentenceBody::new("$PUBX,40,GLL,0,0,0,0*").unwrap();
//! let checksum = render_hex(compute_checksum(body.as_bytes()).unwrap());
//! let frame = compile(&body, checksum.as_str(), "\r\n").unwrap();
//! assert_eq!(frame.as_bytes(), b"$PUBX,40,GLL,0,0,0,0*5C\r\n");
//! ```
//! UBX frames are either built from class, id and payload, or checked with
//! [`validate_ubx_frame`] before they are accepted:
//! ```
//! let frame = gnsscfg::UbxFrame::new(0x0a, 0x04, &[]).unwrap();
//! assert_eq!(frame.as_bytes(), &[0xb5, 0x62, 0x0a, 0x04, 0x00, 0x00, 0x0e, 0x34]);
//! assert!(gnsscfg::validate_ubx_frame(&frame.as_bytes()[..7]).is_err());
//! ```
//!
//! Sending Commands
//! ================
//!
//! A [`TransportDriver`] wraps anything implementing [`SerialLink`]. Every
//! command is written several times back to back, since receivers sometimes
//! miss a single configuration frame and the commands are idempotent. After a
//! PUBX baud change has been fully written, the local port follows to the new
//! baud rate. The receiver never acknowledges PUBX commands, so the result of
//! a transmission only says what was written.
//! ```
//! use gnsscfg::{Command, PortSettings, TransmitOptions, TransportDriver};
//! # struct Null;
//! # impl gnsscfg::SerialLink for Null {
//! #     type Error = ();
//! #     fn configure(&mut self, _: &PortSettings) -> Result<(), ()> { Ok(()) }
//! #     fn write_all(&mut self, _: &[u8], _: Option<core::time::Duration>)
//! #         -> Result<(), gnsscfg::LinkError<()>> { Ok(()) }
//! #     fn set_baud_rate(&mut self, _: u32) -> Result<(), ()> { Ok(()) }
//! # }
//!
//! let mut driver = TransportDriver::open(Null, PortSettings::new(9600)).unwrap();
//! let command = Command::baud(115200).unwrap().compile();
//! let result = driver.transmit(&command, &TransmitOptions::new(5)).unwrap();
//! assert_eq!(result.baud_change(), Some(115200));
//! assert_eq!(driver.session().baud_rate(), 115200);
//! ```
//!
//! no_std Support
//! ==============
//!
//! Without the default `std` feature the crate only needs `alloc`. The
//! receive monitor and the `serialport` binding require `std`.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "serde")]
extern crate serde;

pub use crate::{
    catalog::{Catalog, Command, CommandBody, CommandKind, CommandSummary, CompiledCommand, Payload},
    checksum::{compute_checksum, render_hex, ubx_checksum, HexChecksum, UbxChecksum},
    error::{Error, FrameError, LinkError, TransmitError},
    nmea::{compile, Frame, SentenceBody},
    pubx::{InProtoMask, OutProtoMask, PortConfig, PortId, PortRates},
    transport::{
        extract_baud_rate, Parity, PortSettings, SerialLink, TransmitOptions, TransmitResult,
        TransportDriver, TransportSession,
    },
    ubx::{validate_ubx_frame, DeviceMask, UbxFrame},
};

#[cfg(feature = "std")]
pub use crate::monitor::{spawn_receiver, ReceiveMonitor, RxCallback, RxLog, RxStats, SerialSource};

mod catalog;
mod checksum;
pub mod constants;
mod error;
mod nmea;
pub mod pubx;
mod transport;
pub mod ubx;

#[cfg(feature = "std")]
mod monitor;
#[cfg(feature = "serialport")]
mod serialport;
