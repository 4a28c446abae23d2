pub const UBX_SYNC_CHAR_1: u8 = 0xb5;
pub const UBX_SYNC_CHAR_2: u8 = 0x62;
pub(crate) const UBX_SYNC_SIZE: usize = 2;
pub(crate) const UBX_PAYLOAD_SIZE_LEN: usize = 2;
pub(crate) const UBX_CLASS_LEN: usize = 1;
pub(crate) const UBX_ID_LEN: usize = 1;
pub(crate) const UBX_HEADER_LEN: usize =
    UBX_SYNC_SIZE + UBX_PAYLOAD_SIZE_LEN + UBX_CLASS_LEN + UBX_ID_LEN;
pub(crate) const UBX_CHECKSUM_LEN: usize = 2;

pub(crate) const UBX_CLASS_OFFSET: usize = 2; // After SYNC_CHAR_1, SYNC_CHAR_2
pub(crate) const UBX_MSG_ID_OFFSET: usize = 3; // After CLASS
pub(crate) const UBX_LENGTH_OFFSET: usize = 4; // After MSG_ID

pub const NMEA_SYNC_CHAR: u8 = 0x24; // '$'
pub const NMEA_CHECKSUM_DELIMITER: u8 = 0x2a; // '*'
pub const NMEA_FIELD_SEPARATOR: u8 = 0x2c; // ','
pub const NMEA_END_CHAR_1: u8 = 0x0d; // '\r' (<CR>)
pub const NMEA_END_CHAR_2: u8 = 0x0a; // '\n' (<LF>)
pub const NMEA_TERMINATOR: &str = "\r\n";
pub(crate) const NMEA_CHECKSUM_TEXT_LEN: usize = 2;

pub const PUBX_TAG: &str = "$PUBX";
pub const PUBX_MSG_RATE: &str = "40";
pub const PUBX_MSG_CONFIG: &str = "41";

/// Index of the baud field in a split `$PUBX,41,...` body (`$PUBX` is field 0)
pub(crate) const PUBX_41_BAUD_FIELD: usize = 5;
/// `$PUBX` + msg type + port, in, out, baud, autobauding
pub(crate) const PUBX_41_MIN_FIELDS: usize = 7;

/// Repeat counts used when nothing else is requested. Modules are seen to
/// miss a single configuration frame now and then.
pub const DEFAULT_NMEA_REPEAT: usize = 5;
pub const DEFAULT_UBX_REPEAT: usize = 3;

pub const RX_BUFFER_MIN: usize = 255;
pub const RX_BUFFER_MAX: usize = 1024;
