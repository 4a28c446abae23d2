use core::fmt;

/// Errors raised while building or checking a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Sentence body without `$` start or `*` checksum delimiter, or with
    /// characters that cannot appear in a PUBX sentence
    MalformedSentence { reason: &'static str },
    /// The rendered checksum handed to the compiler is not two hex digits
    InvalidChecksumText { len: usize },
    /// The new baud rate could not be extracted from a PUBX,41 body
    MalformedCommand { reason: &'static str },
    /// A UBX frame failed validation
    MalformedFrame(FrameError),
}

/// Why a UBX frame was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    TooShort { got: usize },
    BadSync { got: [u8; 2] },
    PayloadTooLong { got: usize },
    LengthMismatch { declared: usize, actual: usize },
    ChecksumMismatch { expect: u16, got: u16 },
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Error::MalformedFrame(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedSentence { reason } => write!(f, "Malformed sentence: {}", reason),
            Error::InvalidChecksumText { len } => write!(
                f,
                "Checksum text must be exactly 2 hex digits, got {} characters",
                len
            ),
            Error::MalformedCommand { reason } => write!(f, "Malformed command: {}", reason),
            Error::MalformedFrame(e) => write!(f, "Malformed UBX frame: {}", e),
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::TooShort { got } => {
                write!(f, "frame too short, expect at least 8 bytes, got {}", got)
            },
            FrameError::BadSync { got } => {
                write!(f, "bad sync header {:02x} {:02x}", got[0], got[1])
            },
            FrameError::PayloadTooLong { got } => {
                write!(f, "payload of {} bytes does not fit the length field", got)
            },
            FrameError::LengthMismatch { declared, actual } => write!(
                f,
                "declared payload length {} but frame carries {}",
                declared, actual
            ),
            FrameError::ChecksumMismatch { expect, got } => write!(
                f,
                "Not valid frame checksum, expect {:x}, got {:x}",
                expect, got
            ),
        }
    }
}

impl core::error::Error for Error {}
impl core::error::Error for FrameError {}

/// A link level failure, as reported by a [`crate::SerialLink`]
#[derive(Debug)]
pub enum LinkError<E> {
    /// The write did not drain before the deadline
    TimedOut,
    Io(E),
}

impl<E> From<E> for LinkError<E> {
    fn from(e: E) -> Self {
        LinkError::Io(e)
    }
}

/// Errors from [`crate::TransportDriver::transmit`]
#[derive(Debug)]
pub enum TransmitError<E> {
    /// The command could not be interpreted. For a baud change this can be
    /// reported after the frames already went out; the local baud rate is
    /// left untouched in that case.
    Protocol(Error),
    /// A write did not drain in time; `completed` writes went out before it
    Timeout { completed: usize },
    /// A repeat count of zero was requested
    InvalidRepeat,
    /// The serial collaborator failed
    Link(E),
}

impl<E> From<Error> for TransmitError<E> {
    fn from(e: Error) -> Self {
        TransmitError::Protocol(e)
    }
}

impl<E: fmt::Display> fmt::Display for TransmitError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransmitError::Protocol(e) => e.fmt(f),
            TransmitError::Timeout { completed } => write!(
                f,
                "Transmit timed out after {} completed writes",
                completed
            ),
            TransmitError::InvalidRepeat => f.write_str("Repeat count must be at least 1"),
            TransmitError::Link(e) => write!(f, "Serial link error: {}", e),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> core::error::Error for TransmitError<E> {}
