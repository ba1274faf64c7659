use std::collections::BTreeMap;
use std::fmt;

use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

use crate::MemoryBlock;
use crate::io::{AddressingState, Record, StartAddress, resolve};

const ADDRESS_SPACE: u64 = 1 << 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("line {line}: data at {address:#010X} overwrites bytes already written")]
    OverlapConflict { line: usize, address: u32 },

    #[error("line {line}: {len} bytes at {address:#010X} run past the 32-bit address space")]
    AddressOverflow { line: usize, address: u32, len: usize },

    #[error("line {line}: record type {record_type:02X} has a malformed address payload")]
    InvalidPayload { line: usize, record_type: u8 },

    #[error("no data records found")]
    EmptyImage,
}

impl BuildError {
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::OverlapConflict { line, .. }
            | Self::AddressOverflow { line, .. }
            | Self::InvalidPayload { line, .. } => Some(*line),
            Self::EmptyImage => None,
        }
    }
}

/// What happens when a data record rewrites an address already holding data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Later bytes replace earlier ones, as when a patch is appended to a file.
    #[default]
    LastWriteWins,
    Reject,
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub overlap_policy: OverlapPolicy,
    pub require_non_empty: bool,
}

/// Non-fatal findings collected while reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Records follow the end-of-file record; they were ignored.
    TrailingDataAfterEof { line: usize },
    /// Checksum verification was disabled and this line failed it.
    ChecksumMismatch { line: usize, expected: u8, actual: u8 },
    /// Both segment and linear extended address records appear.
    MixedAddressingModes { line: usize },
    MissingEndOfFile,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrailingDataAfterEof { line } => {
                write!(f, "line {line}: data after end-of-file record ignored")
            }
            Self::ChecksumMismatch {
                line,
                expected,
                actual,
            } => write!(
                f,
                "line {line}: checksum mismatch, expected {expected:02X}, got {actual:02X}"
            ),
            Self::MixedAddressingModes { line } => write!(
                f,
                "line {line}: segment and linear extended addresses mixed, most recent base applies"
            ),
            Self::MissingEndOfFile => f.write_str("no end-of-file record"),
        }
    }
}

/// Result of a successful build: the image plus everything surfaced alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    pub image: MemoryImage,
    pub warnings: Vec<Warning>,
    pub start_address: Option<StartAddress>,
}

/// Sorted, disjoint, non-adjacent memory blocks reconstructed from one file.
///
/// Built once through [`build`], [`build_with`] or [`ImageBuilder`] and
/// read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryImage {
    blocks: Vec<MemoryBlock>,
}

impl MemoryImage {
    pub fn new() -> Self {
        Self { blocks: vec![] }
    }

    /// Apply `(address, bytes)` writes in order, last write wins.
    pub fn from_writes<I>(writes: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = (u32, Vec<u8>)>,
    {
        let mut builder = ImageBuilder::new(OverlapPolicy::LastWriteWins);
        for (index, (address, bytes)) in writes.into_iter().enumerate() {
            builder.insert(index + 1, address, &bytes)?;
        }
        Ok(builder.finish())
    }

    pub fn blocks(&self) -> &[MemoryBlock] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn min_address(&self) -> Option<u32> {
        self.blocks.first().map(|b| b.start)
    }

    pub fn max_address(&self) -> Option<u32> {
        self.blocks.last().map(|b| b.end())
    }

    pub fn total_bytes(&self) -> u64 {
        self.blocks.iter().map(|b| b.size()).sum()
    }

    /// Gap sizes between consecutive blocks; one fewer than there are blocks.
    pub fn gaps(&self) -> impl Iterator<Item = u64> + '_ {
        self.blocks.windows(2).map(|w| w[0].gap_to(&w[1]))
    }

    /// Read a single byte. Returns None for addresses in a gap.
    pub fn read_byte(&self, addr: u32) -> Option<u8> {
        let idx = self.blocks.partition_point(|b| b.start <= addr);
        let block = self.blocks.get(idx.checked_sub(1)?)?;
        block
            .contains(addr)
            .then(|| block.bytes[(addr - block.start) as usize])
    }

    /// Read bytes from address range. Returns None for gaps.
    pub fn read_bytes(&self, addr: u32, len: usize) -> Vec<Option<u8>> {
        (0..len)
            .map(|i| {
                let a = addr.checked_add(i as u32)?;
                self.read_byte(a)
            })
            .collect()
    }

    fn debug_check_invariants(&self) {
        debug_assert!(
            self.blocks
                .windows(2)
                .all(|w| w[0].end_exclusive() < w[1].start as u64),
            "memory blocks must be sorted and separated by a gap"
        );
    }
}

/// Incremental set of disjoint runs keyed by start address.
///
/// Runs may touch while building; [`ImageBuilder::finish`] joins them.
#[derive(Debug, Default)]
pub struct ImageBuilder {
    runs: BTreeMap<u32, Vec<u8>>,
    policy: OverlapPolicy,
}

impl ImageBuilder {
    pub fn new(policy: OverlapPolicy) -> Self {
        Self {
            runs: BTreeMap::new(),
            policy,
        }
    }

    /// Write the run `[address, address + bytes.len())`.
    ///
    /// Bytes landing on existing runs overwrite them in place; the uncovered
    /// pieces become new runs. Each byte is copied once, whatever the order
    /// of the writes.
    pub fn insert(&mut self, line: usize, address: u32, bytes: &[u8]) -> Result<(), BuildError> {
        if bytes.is_empty() {
            return Ok(());
        }

        let start = address as u64;
        let end = start + bytes.len() as u64;
        if end > ADDRESS_SPACE {
            return Err(BuildError::AddressOverflow {
                line,
                address,
                len: bytes.len(),
            });
        }

        let from = match self.runs.range(..address).next_back() {
            Some((&run_start, data)) if run_start as u64 + data.len() as u64 > start => run_start,
            _ => address,
        };

        let mut uncovered = Vec::new();
        let mut cursor = start;
        for (&run_start, data) in self.runs.range_mut(from..) {
            let run_start = run_start as u64;
            if run_start >= end {
                break;
            }
            if self.policy == OverlapPolicy::Reject {
                return Err(BuildError::OverlapConflict {
                    line,
                    address: run_start.max(start) as u32,
                });
            }

            if run_start > cursor {
                uncovered.push((cursor, run_start));
            }
            let lo = run_start.max(start);
            let hi = (run_start + data.len() as u64).min(end);
            data[(lo - run_start) as usize..(hi - run_start) as usize]
                .copy_from_slice(&bytes[(lo - start) as usize..(hi - start) as usize]);
            cursor = hi;
        }
        if cursor < end {
            uncovered.push((cursor, end));
        }

        for (lo, hi) in uncovered {
            let piece = bytes[(lo - start) as usize..(hi - start) as usize].to_vec();
            self.runs.insert(lo as u32, piece);
        }
        Ok(())
    }

    /// Join touching runs into maximal blocks.
    pub fn finish(self) -> MemoryImage {
        let mut blocks: Vec<MemoryBlock> = Vec::new();
        for (start, bytes) in self.runs {
            match blocks.last_mut() {
                Some(last) if last.end_exclusive() == start as u64 => {
                    last.bytes.extend_from_slice(&bytes);
                }
                _ => blocks.push(MemoryBlock::new(start, bytes)),
            }
        }
        let image = MemoryImage { blocks };
        image.debug_check_invariants();
        image
    }
}

/// Whether to keep feeding records after a [`RecordFold::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Folds a numbered record stream through the address resolver into an image.
#[derive(Debug)]
pub struct RecordFold {
    state: AddressingState,
    builder: ImageBuilder,
    warnings: Vec<Warning>,
    require_non_empty: bool,
}

impl RecordFold {
    pub fn new(options: &BuildOptions) -> Self {
        Self {
            state: AddressingState::new(),
            builder: ImageBuilder::new(options.overlap_policy),
            warnings: Vec::new(),
            require_non_empty: options.require_non_empty,
        }
    }

    pub fn push(&mut self, line: usize, record: &Record) -> Result<Flow, BuildError> {
        if self.state.is_terminated() {
            self.trailing(line);
            return Ok(Flow::Stop);
        }

        if let Some(expected) = record.record_type.payload_len()
            && record.data.len() != expected
        {
            return Err(BuildError::InvalidPayload {
                line,
                record_type: record.record_type.code(),
            });
        }

        let was_mixed = self.state.is_mixed();
        if let Some(address) = resolve(record, &mut self.state) {
            self.builder.insert(line, address, &record.data)?;
        }
        if !was_mixed && self.state.is_mixed() {
            self.warn(Warning::MixedAddressingModes { line });
        }

        if self.state.is_terminated() {
            debug!("end-of-file record at line {line}");
            Ok(Flow::Stop)
        } else {
            Ok(Flow::Continue)
        }
    }

    /// Note content found after the end-of-file record.
    pub fn trailing(&mut self, line: usize) {
        self.warn(Warning::TrailingDataAfterEof { line });
    }

    /// Record a warning found outside the fold, such as an unverified checksum.
    pub fn warn(&mut self, warning: Warning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }

    pub fn finish(mut self) -> Result<BuildOutput, BuildError> {
        if !self.state.is_terminated() {
            self.warn(Warning::MissingEndOfFile);
        }
        let image = self.builder.finish();
        if self.require_non_empty && image.is_empty() {
            return Err(BuildError::EmptyImage);
        }
        debug!(
            "built image: {} blocks, {} bytes",
            image.blocks().len(),
            image.total_bytes()
        );
        Ok(BuildOutput {
            image,
            warnings: self.warnings,
            start_address: self.state.start_address(),
        })
    }
}

/// Build an image with default options, numbering records by position.
pub fn build<I>(records: I) -> Result<MemoryImage, BuildError>
where
    I: IntoIterator<Item = Record>,
{
    let numbered = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| (index + 1, record));
    Ok(build_with(numbered, &BuildOptions::default())?.image)
}

/// Build an image from `(line, record)` pairs.
pub fn build_with<I>(records: I, options: &BuildOptions) -> Result<BuildOutput, BuildError>
where
    I: IntoIterator<Item = (usize, Record)>,
{
    let mut fold = RecordFold::new(options);
    let mut records = records.into_iter();
    for (line, record) in records.by_ref() {
        if fold.push(line, &record)? == Flow::Stop {
            break;
        }
    }
    if let Some((line, _)) = records.next() {
        fold.trailing(line);
    }
    fold.finish()
}
