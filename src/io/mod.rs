mod address;
mod binary;
mod error;
mod file;
mod intel_hex;
mod record;

pub use address::{AddressingState, StartAddress, resolve};
pub use binary::{BinaryWriteOptions, parse_binary, to_binary_image};
pub use error::{ExportError, ParseError, RecordError};
pub use file::{FileFormat, LoadedFile, load, read_file};
pub use intel_hex::{
    IntelHexRead, IntelHexWriteOptions, LineEnding, parse_intel_hex, to_hex_records,
    write_intel_hex,
};
pub(crate) use record::hex_string;
pub use record::{
    Record, RecordType, checksum, decode_line, decode_line_unverified, encode_record,
};
