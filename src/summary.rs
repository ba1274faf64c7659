//! Display-ready statistics over a memory image.

use std::fmt;

use serde::Serialize;

use crate::MemoryImage;

const CRC32: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);
const RULE: &str =
    "--------------------------------------------------------------------------------";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    /// Position in address order, starting at 0.
    pub index: usize,
    pub start: u32,
    /// Inclusive.
    pub end: u32,
    pub size: u64,
    /// CRC-32 (ISO-HDLC) of the block bytes.
    pub crc32: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub blocks: Vec<BlockSummary>,
    /// `gaps[i]` is the blank space between `blocks[i]` and `blocks[i + 1]`.
    pub gaps: Vec<u64>,
    pub total_used: u64,
    pub total_blank: u64,
}

impl Summary {
    /// Blank bytes after block `index`; `None` for the last block.
    pub fn gap_after(&self, index: usize) -> Option<u64> {
        self.gaps.get(index).copied()
    }
}

pub fn summarize(image: &MemoryImage) -> Summary {
    let blocks: Vec<_> = image
        .blocks()
        .iter()
        .enumerate()
        .map(|(index, block)| BlockSummary {
            index,
            start: block.start,
            end: block.end(),
            size: block.size(),
            crc32: CRC32.checksum(&block.bytes),
        })
        .collect();
    let gaps: Vec<_> = image.gaps().collect();

    Summary {
        total_used: blocks.iter().map(|b| b.size).sum(),
        total_blank: gaps.iter().sum(),
        blocks,
        gaps,
    }
}

/// Human-readable byte count, e.g. `0512 bytes`, `2048 [2.00 KB]`.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes >= MB {
        format!("{bytes} [{:.2} MB]", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{bytes} [{:.2} KB]", bytes as f64 / KB as f64)
    } else {
        format!("{bytes:04} bytes")
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Memory Block Summary:")?;
        writeln!(
            f,
            " # | Start      | End        | Size                 | Blank After          | CRC-32"
        )?;
        writeln!(f, "{RULE}")?;
        for block in &self.blocks {
            let blank = self.gap_after(block.index).unwrap_or(0);
            writeln!(
                f,
                "{:02} | 0x{:08X} | 0x{:08X} | {:<20} | {:<20} | {:08X}",
                block.index + 1,
                block.start,
                block.end,
                format_size(block.size),
                format_size(blank),
                block.crc32
            )?;
        }
        writeln!(f, "{RULE}")?;
        writeln!(
            f,
            "{:>31}| {:<20} | {}",
            "Total: ",
            format_size(self.total_used),
            format_size(self.total_blank)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(writes: &[(u32, &[u8])]) -> MemoryImage {
        MemoryImage::from_writes(writes.iter().map(|&(a, d)| (a, d.to_vec()))).unwrap()
    }

    #[test]
    fn test_summarize_blocks_and_gaps() {
        let img = image(&[(0, &[0; 16]), (32, &[0; 16]), (0x100, &[0; 4])]);
        let s = summarize(&img);
        assert_eq!(s.blocks.len(), 3);
        assert_eq!(s.blocks[1].index, 1);
        assert_eq!(s.blocks[1].start, 32);
        assert_eq!(s.blocks[1].end, 47);
        assert_eq!(s.blocks[1].size, 16);
        assert_eq!(s.gaps, vec![16, 0x100 - 48]);
        assert_eq!(s.gap_after(2), None);
        assert_eq!(s.total_used, 36);
        assert_eq!(s.total_blank, 16 + 0x100 - 48);
    }

    #[test]
    fn test_summarize_empty() {
        let s = summarize(&MemoryImage::new());
        assert_eq!(s, Summary::default());
    }

    #[test]
    fn test_block_crc32() {
        let img = image(&[(0, b"123456789")]);
        assert_eq!(summarize(&img).blocks[0].crc32, 0xCBF4_3926);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0000 bytes");
        assert_eq!(format_size(512), "0512 bytes");
        assert_eq!(format_size(2048), "2048 [2.00 KB]");
        assert_eq!(format_size(1536), "1536 [1.50 KB]");
        assert_eq!(format_size(3 * 1024 * 1024), "3145728 [3.00 MB]");
    }

    #[test]
    fn test_display_table() {
        let img = image(&[(0, &[0; 16]), (32, &[0; 16])]);
        let text = summarize(&img).to_string();
        assert!(text.starts_with("Memory Block Summary:\n"));
        assert!(text.contains("01 | 0x00000000 | 0x0000000F | 0016 bytes"));
        assert!(text.contains("02 | 0x00000020 | 0x0000002F | 0016 bytes"));
        assert!(text.contains("Total: | 0032 bytes"));
    }
}
