use alloc::{format, string::String, vec::Vec};
use core::time::Duration;

use log::{debug, info, warn};

use crate::{
    catalog::{CommandKind, CompiledCommand, Payload},
    constants::{
        DEFAULT_NMEA_REPEAT, DEFAULT_UBX_REPEAT, NMEA_CHECKSUM_DELIMITER, NMEA_FIELD_SEPARATOR,
        PUBX_41_BAUD_FIELD, PUBX_41_MIN_FIELDS,
    },
    error::{Error, LinkError, TransmitError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Line settings of the local UART
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSettings {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: Parity,
}

impl PortSettings {
    /// `baud_rate`, 8 data bits, no parity, 1 stop bit
    pub const fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            data_bits: 8,
            stop_bits: 1,
            parity: Parity::None,
        }
    }
}

/// The transmit half of a serial port
pub trait SerialLink {
    /// Link associated error type
    type Error;

    /// Open or reconfigure the port with the given line settings
    fn configure(&mut self, settings: &PortSettings) -> Result<(), Self::Error>;

    /// Write all of `bytes` and wait until they have left the local transmit
    /// buffer. With a timeout, give up with [`LinkError::TimedOut`] when the
    /// bytes could not be written in time. Whether the wait for the drain is
    /// bounded too is up to the implementation.
    fn write_all(
        &mut self,
        bytes: &[u8],
        timeout: Option<Duration>,
    ) -> Result<(), LinkError<Self::Error>>;

    /// Change the local baud rate. Takes effect immediately, bytes still
    /// queued are not waited for.
    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), Self::Error>;
}

impl<T: SerialLink + ?Sized> SerialLink for &mut T {
    type Error = T::Error;

    fn configure(&mut self, settings: &PortSettings) -> Result<(), Self::Error> {
        (**self).configure(settings)
    }

    fn write_all(
        &mut self,
        bytes: &[u8],
        timeout: Option<Duration>,
    ) -> Result<(), LinkError<Self::Error>> {
        (**self).write_all(bytes, timeout)
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), Self::Error> {
        (**self).set_baud_rate(baud_rate)
    }
}

/// State of the local end of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSession {
    settings: PortSettings,
    configured: bool,
}

impl TransportSession {
    pub fn baud_rate(&self) -> u32 {
        self.settings.baud_rate
    }

    pub fn settings(&self) -> &PortSettings {
        &self.settings
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }
}

/// How one command is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitOptions {
    /// Number of back to back copies of the frame
    pub repeat: usize,
    /// Only describe what would be sent
    pub dry_run: bool,
    /// Give up on a write that does not drain in time
    pub timeout: Option<Duration>,
}

impl TransmitOptions {
    pub const fn new(repeat: usize) -> Self {
        Self {
            repeat,
            dry_run: false,
            timeout: None,
        }
    }

    /// Default repeat count for the payload's protocol
    pub const fn for_payload(payload: &Payload) -> Self {
        match payload {
            Payload::Nmea(_) => Self::new(DEFAULT_NMEA_REPEAT),
            Payload::Ubx(_) => Self::new(DEFAULT_UBX_REPEAT),
        }
    }

    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Outcome of a successful [`TransportDriver::transmit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransmitResult {
    Sent {
        writes: usize,
        bytes: usize,
        /// New local baud rate, for baud change commands
        baud_change: Option<u32>,
    },
    DryRun {
        /// One line per write that would have happened, plus the baud switch
        trace: Vec<String>,
        baud_change: Option<u32>,
    },
}

impl TransmitResult {
    pub fn baud_change(&self) -> Option<u32> {
        match self {
            TransmitResult::Sent { baud_change, .. } | TransmitResult::DryRun { baud_change, .. } => {
                *baud_change
            },
        }
    }
}

/// Extract the new baud rate from a `$PUBX,41,...` body.
///
/// The body is split on `,`; it needs at least five fields after the message
/// type and the baud rate is the fifth field after `$PUBX`.
///
/// ```
/// assert_eq!(gnsscfg::extract_baud_rate("$PUBX,41,1,3,3,115200,0*"), Ok(115200));
/// ```
pub fn extract_baud_rate(body: &str) -> Result<u32, Error> {
    let end = body
        .bytes()
        .position(|b| b == NMEA_CHECKSUM_DELIMITER)
        .unwrap_or(body.len());
    let content = &body[..end];
    let fields = || content.split(char::from(NMEA_FIELD_SEPARATOR));

    if fields().count() < PUBX_41_MIN_FIELDS {
        return Err(Error::MalformedCommand {
            reason: "fewer than 5 fields after the message type",
        });
    }
    let field = fields()
        .nth(PUBX_41_BAUD_FIELD)
        .ok_or(Error::MalformedCommand {
            reason: "missing baud field",
        })?;
    match field.parse::<u32>() {
        Ok(0) | Err(_) => Err(Error::MalformedCommand {
            reason: "baud field is not a positive number",
        }),
        Ok(baud) => Ok(baud),
    }
}

/// Sends compiled commands over a [`SerialLink`] and keeps the local port in
/// step with baud changes
pub struct TransportDriver<L> {
    link: L,
    session: TransportSession,
}

impl<L: SerialLink> TransportDriver<L> {
    /// Configure `link` with `settings` and start a session on it
    pub fn open(mut link: L, settings: PortSettings) -> Result<Self, TransmitError<L::Error>> {
        link.configure(&settings).map_err(TransmitError::Link)?;
        debug!(
            "port configured: {} baud, {} data bits, {} stop bits, {:?} parity",
            settings.baud_rate, settings.data_bits, settings.stop_bits, settings.parity
        );
        Ok(Self {
            link,
            session: TransportSession {
                settings,
                configured: true,
            },
        })
    }

    pub fn session(&self) -> &TransportSession {
        &self.session
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn into_link(self) -> L {
        self.link
    }

    /// Send `command` `options.repeat` times.
    ///
    /// Writes are blocking and strictly sequential. For a
    /// [`CommandKind::PubxBaud`] command the local port switches to the new
    /// baud rate once the last copy has drained. If the baud rate cannot be
    /// read from the body, the frames have already been sent when
    /// [`Error::MalformedCommand`] is returned and the local baud rate is
    /// unchanged.
    ///
    /// In dry-run mode nothing is written and the result holds a trace of
    /// what would have been sent. Every trace line is also logged, before the
    /// baud rate is read, so an error still leaves the would-be writes in the
    /// log.
    pub fn transmit(
        &mut self,
        command: &CompiledCommand,
        options: &TransmitOptions,
    ) -> Result<TransmitResult, TransmitError<L::Error>> {
        if options.repeat == 0 {
            return Err(TransmitError::InvalidRepeat);
        }
        let bytes = command.as_bytes();

        if options.dry_run {
            let mut trace: Vec<String> = (1..=options.repeat)
                .map(|i| {
                    format!(
                        "[{}/{}] {} ({} bytes): {}",
                        i,
                        options.repeat,
                        command.name,
                        bytes.len(),
                        command.payload
                    )
                })
                .collect();
            // Logged before the baud check so a bad body still shows what
            // would have gone out
            for line in &trace {
                info!("TESTRUN: {}", line);
            }
            let baud_change = match command.kind {
                CommandKind::PubxBaud => {
                    let baud = baud_from_payload(&command.payload)?;
                    let line = format!("local port {} -> {} baud", self.session.baud_rate(), baud);
                    info!("TESTRUN: {}", line);
                    trace.push(line);
                    Some(baud)
                },
                _ => None,
            };
            return Ok(TransmitResult::DryRun { trace, baud_change });
        }

        info!(
            "firing off {} message '{}' x{}",
            if command.kind.is_nmea() { "NMEA" } else { "UBX" },
            command.name,
            options.repeat
        );
        for completed in 0..options.repeat {
            match self.link.write_all(bytes, options.timeout) {
                Ok(()) => debug!("> {}", command.payload),
                Err(LinkError::TimedOut) => {
                    warn!(
                        "write {} of '{}' timed out",
                        completed + 1,
                        command.name
                    );
                    return Err(TransmitError::Timeout { completed });
                },
                Err(LinkError::Io(e)) => return Err(TransmitError::Link(e)),
            }
        }

        // Every copy has drained at the old baud rate, only now is it safe to
        // switch the local side
        let baud_change = match command.kind {
            CommandKind::PubxBaud => {
                let baud = baud_from_payload(&command.payload)?;
                info!(
                    "updating local baud rate {} -> {}",
                    self.session.baud_rate(),
                    baud
                );
                self.link.set_baud_rate(baud).map_err(TransmitError::Link)?;
                self.session.settings.baud_rate = baud;
                Some(baud)
            },
            _ => None,
        };

        Ok(TransmitResult::Sent {
            writes: options.repeat,
            bytes: bytes.len() * options.repeat,
            baud_change,
        })
    }
}

fn baud_from_payload(payload: &Payload) -> Result<u32, Error> {
    match payload {
        Payload::Nmea(frame) => extract_baud_rate(frame.body()),
        Payload::Ubx(_) => Err(Error::MalformedCommand {
            reason: "baud change command is not a PUBX sentence",
        }),
    }
}
