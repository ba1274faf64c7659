//! Caller-supplied settings for reading and exporting images.
//!
//! Settings can be loaded from an INI-style file:
//!
//! ```text
//! [settings]
//! VerifyChecksum = 1
//! DataBytesPerRecord = 32
//! PadByte = 0xFF
//! MaxImageSize = 0x4000000
//! OverlapPolicy = LastWriteWins
//! RequireNonEmpty = false
//! ```
//!
//! Keys are case-insensitive; `;` and `#` start comment lines and section
//! headers are ignored.

use std::path::Path;

use thiserror::Error;

use crate::{BinaryWriteOptions, BuildOptions, IntelHexWriteOptions, OverlapPolicy};

pub const DEFAULT_BYTES_PER_RECORD: u8 = 16;
pub const DEFAULT_PAD_BYTE: u8 = 0xFF;
/// 64 MiB
pub const DEFAULT_MAX_IMAGE_SIZE: usize = 64 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("unknown setting '{0}'")]
    UnknownKey(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Reject lines with a bad checksum. When off, mismatches become warnings.
    pub verify_checksum: bool,
    /// Data bytes per record when writing Intel-HEX.
    pub bytes_per_record: u8,
    /// Fill byte for gaps in binary exports.
    pub pad_byte: u8,
    /// Largest span a binary export may allocate.
    pub max_image_size: usize,
    pub overlap_policy: OverlapPolicy,
    pub require_non_empty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verify_checksum: true,
            bytes_per_record: DEFAULT_BYTES_PER_RECORD,
            pad_byte: DEFAULT_PAD_BYTE,
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
            overlap_policy: OverlapPolicy::LastWriteWins,
            require_non_empty: false,
        }
    }
}

impl Config {
    /// Load settings from an INI file, starting from the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ini(&content)
    }

    pub fn from_ini(content: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            config.set(key.trim(), value.trim().trim_matches('"'))?;
        }

        Ok(config)
    }

    /// Apply one `key = value` setting.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key.to_ascii_lowercase().as_str() {
            "verifychecksum" => self.verify_checksum = parse_bool(value).ok_or_else(invalid)?,
            "databytesperrecord" => {
                self.bytes_per_record = parse_number(value)
                    .and_then(|n| u8::try_from(n).ok())
                    .filter(|&n| n > 0)
                    .ok_or_else(invalid)?;
            }
            "padbyte" => {
                self.pad_byte = parse_number(value)
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(invalid)?;
            }
            "maximagesize" => {
                self.max_image_size = parse_number(value)
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(invalid)?;
            }
            "overlappolicy" => {
                self.overlap_policy = match value.to_ascii_lowercase().as_str() {
                    "lastwritewins" | "overwrite" => OverlapPolicy::LastWriteWins,
                    "reject" | "error" => OverlapPolicy::Reject,
                    _ => return Err(invalid()),
                };
            }
            "requirenonempty" => self.require_non_empty = parse_bool(value).ok_or_else(invalid)?,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            overlap_policy: self.overlap_policy,
            require_non_empty: self.require_non_empty,
        }
    }

    pub fn binary_options(&self) -> BinaryWriteOptions {
        BinaryWriteOptions {
            pad_byte: self.pad_byte,
            max_size: self.max_image_size,
        }
    }

    pub fn intel_hex_options(&self) -> IntelHexWriteOptions {
        IntelHexWriteOptions {
            bytes_per_record: self.bytes_per_record,
            ..IntelHexWriteOptions::default()
        }
    }
}

/// Integers count as true when positive.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        other => other.parse::<i64>().ok().map(|n| n > 0),
    }
}

/// Parse a number from decimal or hex (0x).
pub(crate) fn parse_number(s: &str) -> Option<u64> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}
