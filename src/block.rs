/// A maximal run of contiguous, known bytes starting at `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBlock {
    pub start: u32,
    pub bytes: Vec<u8>,
}

impl MemoryBlock {
    pub fn new(start: u32, bytes: Vec<u8>) -> Self {
        debug_assert!(!bytes.is_empty(), "memory block must hold at least one byte");
        debug_assert!(
            start as u64 + bytes.len() as u64 <= 1 << 32,
            "memory block extends past the 32-bit address space"
        );
        Self { start, bytes }
    }

    /// Address of the last byte (inclusive).
    pub fn end(&self) -> u32 {
        (self.start as u64 + self.bytes.len() as u64 - 1) as u32
    }

    /// Exclusive end, widened so a block ending at `0xFFFF_FFFF` stays representable.
    pub(crate) fn end_exclusive(&self) -> u64 {
        self.start as u64 + self.bytes.len() as u64
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn contains(&self, addr: u32) -> bool {
        addr >= self.start && addr <= self.end()
    }

    /// Unfilled bytes between this block and a later one.
    pub fn gap_to(&self, next: &MemoryBlock) -> u64 {
        debug_assert!(next.start as u64 >= self.end_exclusive());
        next.start as u64 - self.end() as u64 - 1
    }
}
