//! Single-line Intel-HEX record codec.

use std::fmt;

use super::RecordError;

const START_CODE: char = ':';
/// byte count + address (2) + record type + checksum
const RECORD_OVERHEAD: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordType {
    Data = 0x00,
    EndOfFile = 0x01,
    ExtendedSegmentAddress = 0x02,
    StartSegmentAddress = 0x03,
    ExtendedLinearAddress = 0x04,
    StartLinearAddress = 0x05,
}

impl RecordType {
    pub fn from_code(code: u8) -> Result<Self, RecordError> {
        match code {
            0x00 => Ok(Self::Data),
            0x01 => Ok(Self::EndOfFile),
            0x02 => Ok(Self::ExtendedSegmentAddress),
            0x03 => Ok(Self::StartSegmentAddress),
            0x04 => Ok(Self::ExtendedLinearAddress),
            0x05 => Ok(Self::StartLinearAddress),
            _ => Err(RecordError::UnknownRecordType(code)),
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Required payload length for address records, `None` for free-length types.
    pub(crate) fn payload_len(self) -> Option<usize> {
        match self {
            Self::ExtendedSegmentAddress | Self::ExtendedLinearAddress => Some(2),
            Self::StartSegmentAddress | Self::StartLinearAddress => Some(4),
            Self::Data | Self::EndOfFile => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Data => "Data",
            Self::EndOfFile => "EndOfFile",
            Self::ExtendedSegmentAddress => "ExtendedSegmentAddress",
            Self::StartSegmentAddress => "StartSegmentAddress",
            Self::ExtendedLinearAddress => "ExtendedLinearAddress",
            Self::StartLinearAddress => "StartLinearAddress",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One decoded line. `address` is the raw 16-bit field, not yet resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub address: u16,
    pub record_type: RecordType,
    pub data: Vec<u8>,
    pub checksum: u8,
}

impl Record {
    /// Build a record with a correct checksum.
    ///
    /// Panics in debug builds if `data` exceeds 255 bytes.
    pub fn new(record_type: RecordType, address: u16, data: Vec<u8>) -> Self {
        debug_assert!(data.len() <= u8::MAX as usize, "record payload exceeds 255 bytes");
        let checksum = checksum(&header_and_data(record_type, address, &data));
        Self {
            address,
            record_type,
            data,
            checksum,
        }
    }

    pub fn data(address: u16, bytes: &[u8]) -> Self {
        Self::new(RecordType::Data, address, bytes.to_vec())
    }

    pub fn end_of_file() -> Self {
        Self::new(RecordType::EndOfFile, 0, Vec::new())
    }

    pub fn extended_segment_address(segment: u16) -> Self {
        Self::new(
            RecordType::ExtendedSegmentAddress,
            0,
            segment.to_be_bytes().to_vec(),
        )
    }

    pub fn extended_linear_address(upper: u16) -> Self {
        Self::new(
            RecordType::ExtendedLinearAddress,
            0,
            upper.to_be_bytes().to_vec(),
        )
    }

    pub fn start_segment_address(cs: u16, ip: u16) -> Self {
        let mut data = cs.to_be_bytes().to_vec();
        data.extend_from_slice(&ip.to_be_bytes());
        Self::new(RecordType::StartSegmentAddress, 0, data)
    }

    pub fn start_linear_address(address: u32) -> Self {
        Self::new(
            RecordType::StartLinearAddress,
            0,
            address.to_be_bytes().to_vec(),
        )
    }

    pub fn byte_count(&self) -> u8 {
        self.data.len() as u8
    }

    /// Checksum the record should carry given its other fields.
    pub fn expected_checksum(&self) -> u8 {
        checksum(&header_and_data(self.record_type, self.address, &self.data))
    }

    pub fn checksum_is_valid(&self) -> bool {
        self.checksum == self.expected_checksum()
    }

    /// Big-endian 16-bit payload of an extended address record.
    pub(crate) fn payload_u16(&self) -> u16 {
        u16::from_be_bytes([self.data[0], self.data[1]])
    }

    /// Big-endian 32-bit payload of a start address record.
    pub(crate) fn payload_u32(&self) -> u32 {
        u32::from_be_bytes([self.data[0], self.data[1], self.data[2], self.data[3]])
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_record(self))
    }
}

/// Two's complement of the byte sum.
pub fn checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    (!sum).wrapping_add(1)
}

fn header_and_data(record_type: RecordType, address: u16, data: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(RECORD_OVERHEAD + data.len());
    bytes.push(data.len() as u8);
    bytes.extend_from_slice(&address.to_be_bytes());
    bytes.push(record_type.code());
    bytes.extend_from_slice(data);
    bytes
}

/// Decode and checksum-verify one line.
pub fn decode_line(line: &str) -> Result<Record, RecordError> {
    let record = decode_line_unverified(line)?;
    if !record.checksum_is_valid() {
        return Err(RecordError::ChecksumMismatch {
            expected: record.expected_checksum(),
            actual: record.checksum,
        });
    }
    Ok(record)
}

/// Decode one line without rejecting a bad checksum.
pub fn decode_line_unverified(line: &str) -> Result<Record, RecordError> {
    let hex_str = line
        .trim()
        .strip_prefix(START_CODE)
        .ok_or(RecordError::MissingStartCode)?;

    let bytes = parse_hex_bytes(hex_str)?;
    if bytes.len() < RECORD_OVERHEAD {
        return Err(RecordError::TooShort(bytes.len()));
    }

    let byte_count = bytes[0] as usize;
    if bytes.len() != RECORD_OVERHEAD + byte_count {
        return Err(RecordError::LengthMismatch {
            declared: byte_count,
            actual: bytes.len() - RECORD_OVERHEAD,
        });
    }

    let record_type = RecordType::from_code(bytes[3])?;
    if let Some(expected) = record_type.payload_len()
        && expected != byte_count
    {
        return Err(RecordError::InvalidPayloadLength {
            record_type: record_type.code(),
            expected,
            actual: byte_count,
        });
    }

    Ok(Record {
        address: u16::from_be_bytes([bytes[1], bytes[2]]),
        record_type,
        data: bytes[4..4 + byte_count].to_vec(),
        checksum: bytes[4 + byte_count],
    })
}

/// Encode a record as one line (no terminator), recomputing the checksum.
pub fn encode_record(record: &Record) -> String {
    let bytes = header_and_data(record.record_type, record.address, &record.data);
    format!("{START_CODE}{}{:02X}", hex_string(&bytes), checksum(&bytes))
}

/// Uppercase hex, two digits per byte.
pub(crate) fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

fn parse_hex_bytes(digits: &str) -> Result<Vec<u8>, RecordError> {
    if !digits.len().is_multiple_of(2) {
        return Err(RecordError::OddLength);
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(RecordError::InvalidHexDigit(bad));
    }

    Ok(digits
        .as_bytes()
        .chunks_exact(2)
        .map(|pair| (nibble(pair[0]) << 4) | nibble(pair[1]))
        .collect())
}

/// Value of an already validated hex digit.
fn nibble(digit: u8) -> u8 {
    (digit as char).to_digit(16).map_or(0, |value| value as u8)
}
