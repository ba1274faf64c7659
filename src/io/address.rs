//! Addressing-mode state for one pass over a record stream.

use std::fmt;

use serde::Serialize;

use super::{Record, RecordType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BaseKind {
    Segment,
    Linear,
}

/// Entry point carried by start address records. Not part of the memory image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StartAddress {
    Segment { cs: u16, ip: u16 },
    Linear { address: u32 },
}

impl fmt::Display for StartAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Segment { cs, ip } => write!(f, "{cs:04X}:{ip:04X}"),
            Self::Linear { address } => write!(f, "0x{address:08X}"),
        }
    }
}

/// Running base-address state. Both bases start at zero; whichever was set
/// most recently applies to subsequent data records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressingState {
    segment_base: u16,
    linear_base: u16,
    active: Option<BaseKind>,
    seen_segment: bool,
    seen_linear: bool,
    start_address: Option<StartAddress>,
    terminated: bool,
}

impl AddressingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw segment value as carried by the last type 02 record.
    pub fn segment_base(&self) -> u16 {
        self.segment_base
    }

    /// Upper 16 address bits as carried by the last type 04 record.
    pub fn linear_base(&self) -> u16 {
        self.linear_base
    }

    /// Offset added to the 16-bit record address.
    pub fn base(&self) -> u32 {
        match self.active {
            Some(BaseKind::Linear) => (self.linear_base as u32) << 16,
            Some(BaseKind::Segment) => (self.segment_base as u32) << 4,
            None => 0,
        }
    }

    /// Both segment and linear extended address records have been seen.
    pub fn is_mixed(&self) -> bool {
        self.seen_segment && self.seen_linear
    }

    pub fn start_address(&self) -> Option<StartAddress> {
        self.start_address
    }

    /// An end-of-file record has been consumed.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

/// Resolve a record against `state`, updating it as address records pass.
///
/// Returns the absolute address of a data record and `None` for everything
/// else. An end-of-file record marks the state terminated. An address or
/// start record whose payload has the wrong length leaves the state untouched.
pub fn resolve(record: &Record, state: &mut AddressingState) -> Option<u32> {
    if record
        .record_type
        .payload_len()
        .is_some_and(|len| len != record.data.len())
    {
        return None;
    }

    match record.record_type {
        RecordType::Data => Some(state.base() + record.address as u32),
        RecordType::EndOfFile => {
            state.terminated = true;
            None
        }
        RecordType::ExtendedSegmentAddress => {
            state.segment_base = record.payload_u16();
            state.active = Some(BaseKind::Segment);
            state.seen_segment = true;
            None
        }
        RecordType::ExtendedLinearAddress => {
            state.linear_base = record.payload_u16();
            state.active = Some(BaseKind::Linear);
            state.seen_linear = true;
            None
        }
        RecordType::StartSegmentAddress => {
            let cs = record.payload_u16();
            let ip = u16::from_be_bytes([record.data[2], record.data[3]]);
            state.start_address = Some(StartAddress::Segment { cs, ip });
            None
        }
        RecordType::StartLinearAddress => {
            state.start_address = Some(StartAddress::Linear {
                address: record.payload_u32(),
            });
            None
        }
    }
}
