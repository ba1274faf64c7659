use std::path::Path;

use log::debug;
use serde::Serialize;

use super::{IntelHexRead, parse_binary, parse_intel_hex};
use crate::{Config, Error, MemoryImage, Warning};

/// Lines inspected when sniffing content of an unrecognised file.
const SNIFF_LINES: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    IntelHex,
    Binary,
}

impl FileFormat {
    /// Format implied by the file extension, if recognised.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "hex" | "eep" | "ihx" => Some(Self::IntelHex),
            "bin" => Some(Self::Binary),
            _ => None,
        }
    }

    /// Guess from content: ASCII text whose first non-empty line starts
    /// with ':' is Intel-HEX, anything else is binary.
    pub fn sniff(content: &[u8]) -> Self {
        let mut lines = content
            .split(|&b| b == b'\n' || b == b'\r')
            .filter(|line| !line.is_empty())
            .take(SNIFF_LINES)
            .peekable();

        let starts_with_colon = lines.peek().is_some_and(|line| line.first() == Some(&b':'));
        if starts_with_colon && lines.all(|line| line.is_ascii()) {
            Self::IntelHex
        } else {
            Self::Binary
        }
    }

    pub fn detect(path: &Path, content: &[u8]) -> Self {
        Self::from_path(path).unwrap_or_else(|| Self::sniff(content))
    }
}

/// A loaded input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedFile {
    IntelHex(IntelHexRead),
    /// Raw bytes placed at address 0.
    Binary(MemoryImage),
}

impl LoadedFile {
    pub fn format(&self) -> FileFormat {
        match self {
            Self::IntelHex(_) => FileFormat::IntelHex,
            Self::Binary(_) => FileFormat::Binary,
        }
    }

    pub fn image(&self) -> &MemoryImage {
        match self {
            Self::IntelHex(read) => &read.image,
            Self::Binary(image) => image,
        }
    }

    pub fn into_image(self) -> MemoryImage {
        match self {
            Self::IntelHex(read) => read.image,
            Self::Binary(image) => image,
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        match self {
            Self::IntelHex(read) => &read.warnings,
            Self::Binary(_) => &[],
        }
    }
}

/// Decode already-read file content; `path` only selects the format.
pub fn load(path: &Path, content: &[u8], config: &Config) -> Result<LoadedFile, Error> {
    let format = FileFormat::detect(path, content);
    debug!("loading {} as {format:?}", path.display());
    match format {
        FileFormat::IntelHex => Ok(LoadedFile::IntelHex(parse_intel_hex(content, config)?)),
        FileFormat::Binary => Ok(LoadedFile::Binary(parse_binary(content, 0)?)),
    }
}

/// Read and decode a file from disk.
pub fn read_file(path: &Path, config: &Config) -> Result<LoadedFile, Error> {
    let content = std::fs::read(path)?;
    load(path, &content, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(
            FileFormat::from_path(Path::new("fw.HEX")),
            Some(FileFormat::IntelHex)
        );
        assert_eq!(
            FileFormat::from_path(Path::new("eeprom.eep")),
            Some(FileFormat::IntelHex)
        );
        assert_eq!(
            FileFormat::from_path(Path::new("fw.bin")),
            Some(FileFormat::Binary)
        );
        assert_eq!(FileFormat::from_path(Path::new("fw.elf")), None);
        assert_eq!(FileFormat::from_path(Path::new("firmware")), None);
    }

    #[test]
    fn test_sniff() {
        assert_eq!(
            FileFormat::sniff(b"\r\n:00000001FF\r\n"),
            FileFormat::IntelHex
        );
        assert_eq!(FileFormat::sniff(&[0x3A, 0xFF, 0x00]), FileFormat::Binary);
        assert_eq!(FileFormat::sniff(b"S00F000068656C6C6F"), FileFormat::Binary);
        assert_eq!(FileFormat::sniff(b""), FileFormat::Binary);
    }

    #[test]
    fn test_load_by_extension() {
        let content = b":0100000055AA\n:00000001FF\n";
        let hex = load(Path::new("a.hex"), content, &Config::default()).unwrap();
        assert_eq!(hex.format(), FileFormat::IntelHex);
        assert_eq!(hex.image().read_byte(0), Some(0x55));

        let bin = load(Path::new("a.bin"), content, &Config::default()).unwrap();
        assert_eq!(bin.format(), FileFormat::Binary);
        assert_eq!(bin.image().total_bytes(), content.len() as u64);
        assert!(bin.warnings().is_empty());
    }

    #[test]
    fn test_load_unknown_extension_sniffs() {
        let content = b":0100000055AA\n:00000001FF\n";
        let loaded = load(Path::new("dump.txt"), content, &Config::default()).unwrap();
        assert_eq!(loaded.format(), FileFormat::IntelHex);
    }
}
