pub mod block;
pub mod config;
pub mod error;
pub mod image;
pub mod io;
pub mod listing;
pub mod summary;

pub use block::MemoryBlock;
pub use config::{Config, ConfigError};
pub use error::Error;
pub use image::{
    BuildError, BuildOptions, BuildOutput, Flow, ImageBuilder, MemoryImage, OverlapPolicy,
    RecordFold, Warning, build, build_with,
};
pub use io::{
    AddressingState, BinaryWriteOptions, ExportError, FileFormat, IntelHexRead,
    IntelHexWriteOptions, LineEnding, LoadedFile, ParseError, Record, RecordError, RecordType,
    StartAddress, checksum, decode_line, decode_line_unverified, encode_record, load,
    parse_binary, parse_intel_hex, read_file, resolve, to_binary_image, to_hex_records,
    write_intel_hex,
};
pub use listing::{HexDump, RecordListing};
pub use summary::{BlockSummary, Summary, format_size, summarize};
