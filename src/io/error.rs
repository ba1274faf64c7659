use thiserror::Error;

use crate::BuildError;

/// Structural or checksum failure of a single record line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("line does not start with ':'")]
    MissingStartCode,

    #[error("odd number of hex digits")]
    OddLength,

    #[error("invalid hex digit '{0}'")]
    InvalidHexDigit(char),

    /// A byte that is not part of any UTF-8 character, such as binary junk.
    #[error("invalid byte 0x{0:02X}")]
    InvalidByte(u8),

    #[error("record too short: {0} bytes, need at least 5")]
    TooShort(usize),

    #[error("byte count mismatch: header says {declared}, got {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("unsupported record type {0:02X}")]
    UnknownRecordType(u8),

    #[error("record type {record_type:02X} needs {expected} data bytes, got {actual}")]
    InvalidPayloadLength {
        record_type: u8,
        expected: usize,
        actual: usize,
    },

    #[error("checksum mismatch: expected {expected:02X}, got {actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid record at line {line}: {source}")]
    MalformedLine {
        line: usize,
        #[source]
        source: RecordError,
    },

    #[error("unsupported record type at line {line}: {record_type:02X}")]
    UnknownRecordType { line: usize, record_type: u8 },

    #[error("checksum mismatch at line {line}: expected {expected:02X}, got {actual:02X}")]
    ChecksumMismatch {
        line: usize,
        expected: u8,
        actual: u8,
    },

    #[error(transparent)]
    Build(#[from] BuildError),
}

impl ParseError {
    /// Attach a line number to a codec error.
    pub fn at_line(line: usize, err: RecordError) -> Self {
        match err {
            RecordError::UnknownRecordType(record_type) => {
                Self::UnknownRecordType { line, record_type }
            }
            RecordError::ChecksumMismatch { expected, actual } => Self::ChecksumMismatch {
                line,
                expected,
                actual,
            },
            source => Self::MalformedLine { line, source },
        }
    }

    /// Unknown record types count as malformed lines.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedLine { .. } | Self::UnknownRecordType { .. }
        )
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MalformedLine { line, .. }
            | Self::UnknownRecordType { line, .. }
            | Self::ChecksumMismatch { line, .. } => Some(*line),
            Self::Build(err) => err.line(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("binary image spans {span} bytes, limit is {limit}")]
    ImageTooLarge { span: u64, limit: usize },
}
