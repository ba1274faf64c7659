//! Text views of decoded records and raw binary content.

use std::fmt;

use crate::Record;
use crate::io::hex_string;

pub const DEFAULT_DUMP_WIDTH: usize = 32;

/// One row per record: `index | type[name] | 0xADDR | DATA`.
#[derive(Debug, Clone, Copy)]
pub struct RecordListing<'a>(pub &'a [Record]);

impl fmt::Display for RecordListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Memory Block Data:")?;
        writeln!(f, " #   | Record                     | Offset | Data")?;
        writeln!(f, "{}", "-".repeat(67))?;
        for (index, record) in self.0.iter().enumerate() {
            writeln!(
                f,
                "{:04} | {:02}[{:<22}] | 0x{:04X} | {}",
                index + 1,
                record.record_type.code(),
                record.record_type.name(),
                record.address,
                hex_string(&record.data)
            )?;
        }
        Ok(())
    }
}

/// Offset/hex rows for a raw buffer, `width` bytes per row.
#[derive(Debug, Clone, Copy)]
pub struct HexDump<'a> {
    pub bytes: &'a [u8],
    pub width: usize,
}

impl<'a> HexDump<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            width: DEFAULT_DUMP_WIDTH,
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.bytes
            .chunks(self.width.max(1))
            .enumerate()
            .map(move |(row, chunk)| {
                format!("{:04X} : {}", row * self.width.max(1), hex_string(chunk))
            })
    }
}

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " Offset(h)     | Data (h)")?;
        writeln!(f, "------------------")?;
        for row in self.rows() {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}
