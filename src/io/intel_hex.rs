use log::debug;

use super::{
    ParseError, Record, RecordError, StartAddress, decode_line, decode_line_unverified,
    encode_record,
};
use crate::config::DEFAULT_BYTES_PER_RECORD;
use crate::{Config, Flow, MemoryImage, RecordFold, Warning};

/// Line terminator for written records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    Lf,
    #[default]
    CrLf,
}

impl LineEnding {
    fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntelHexWriteOptions {
    pub bytes_per_record: u8,
    pub line_ending: LineEnding,
    /// Entry point written just before the end-of-file record.
    pub start_address: Option<StartAddress>,
}

impl Default for IntelHexWriteOptions {
    fn default() -> Self {
        Self {
            bytes_per_record: DEFAULT_BYTES_PER_RECORD,
            line_ending: LineEnding::default(),
            start_address: None,
        }
    }
}

/// Everything recovered from one Intel-HEX file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntelHexRead {
    /// Decoded records up to and including end-of-file, in file order.
    pub records: Vec<Record>,
    pub image: MemoryImage,
    pub warnings: Vec<Warning>,
    pub start_address: Option<StartAddress>,
}

/// Parse Intel-HEX input into records and a memory image.
///
/// Any decode error aborts the whole read. Blank lines are skipped and
/// anything after the end-of-file record is reported as a warning without
/// being decoded, so binary padding after it is harmless.
pub fn parse_intel_hex(input: &[u8], config: &Config) -> Result<IntelHexRead, ParseError> {
    let mut fold = RecordFold::new(&config.build_options());
    let mut records = Vec::new();
    let mut eof_seen = false;

    for (line_num, raw) in input.split(|&b| b == b'\n').enumerate() {
        let line_num = line_num + 1;
        let raw = raw.trim_ascii();

        if raw.is_empty() {
            continue;
        }

        if eof_seen {
            fold.trailing(line_num);
            break;
        }

        let line = std::str::from_utf8(raw).map_err(|e| {
            ParseError::at_line(line_num, RecordError::InvalidByte(raw[e.valid_up_to()]))
        })?;

        let record = if config.verify_checksum {
            decode_line(line)
        } else {
            decode_line_unverified(line)
        }
        .map_err(|e| ParseError::at_line(line_num, e))?;

        if !record.checksum_is_valid() {
            fold.warn(Warning::ChecksumMismatch {
                line: line_num,
                expected: record.expected_checksum(),
                actual: record.checksum,
            });
        }

        eof_seen = fold.push(line_num, &record)? == Flow::Stop;
        records.push(record);
    }

    debug!("decoded {} records", records.len());
    let built = fold.finish()?;

    Ok(IntelHexRead {
        records,
        image: built.image,
        warnings: built.warnings,
        start_address: built.start_address,
    })
}

/// Split the image into data records of at most `bytes_per_record` bytes.
///
/// Extended linear address records are emitted whenever the upper 16 address
/// bits change; none is emitted for data below 0x10000. Records never cross a
/// 64 KiB window. The stream ends with one end-of-file record.
pub fn to_hex_records(image: &MemoryImage, bytes_per_record: u8) -> Vec<Record> {
    let bytes_per_record = if bytes_per_record == 0 {
        DEFAULT_BYTES_PER_RECORD
    } else {
        bytes_per_record
    } as usize;

    let mut records = Vec::new();
    let mut current_upper: u16 = 0;

    for block in image.blocks() {
        let mut addr = block.start;
        let mut offset = 0;

        while offset < block.bytes.len() {
            let upper = (addr >> 16) as u16;
            if upper != current_upper {
                records.push(Record::extended_linear_address(upper));
                current_upper = upper;
            }

            let low = (addr & 0xFFFF) as u16;
            let remaining_in_window = 0x10000 - low as usize;
            let chunk_len = bytes_per_record
                .min(remaining_in_window)
                .min(block.bytes.len() - offset);

            records.push(Record::data(low, &block.bytes[offset..offset + chunk_len]));

            offset += chunk_len;
            addr = addr.wrapping_add(chunk_len as u32);
        }
    }

    records.push(Record::end_of_file());
    records
}

/// Write Intel-HEX text, one record per line.
pub fn write_intel_hex(image: &MemoryImage, options: &IntelHexWriteOptions) -> String {
    let mut records = to_hex_records(image, options.bytes_per_record);
    if let Some(start) = options.start_address {
        records.insert(records.len() - 1, start_record(start));
    }

    let newline = options.line_ending.as_str();
    let mut output = String::new();
    for record in &records {
        output.push_str(&encode_record(record));
        output.push_str(newline);
    }
    output
}

fn start_record(start: StartAddress) -> Record {
    match start {
        StartAddress::Segment { cs, ip } => Record::start_segment_address(cs, ip),
        StartAddress::Linear { address } => Record::start_linear_address(address),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BuildError, OverlapPolicy, RecordType, build};

    fn parse(input: &[u8]) -> Result<IntelHexRead, ParseError> {
        parse_intel_hex(input, &Config::default())
    }

    #[test]
    fn test_parse_records_blocks_and_start() {
        let input = b":10010000214601360121470136007EFE09D2190140\n\
                      :100110002146017E17C20001FF5F16002148011928\n\
                      :0400000508000131BD\n\
                      :00000001FF\n";
        let read = parse(input).unwrap();
        let types: Vec<_> = read.records.iter().map(|r| r.record_type).collect();
        assert_eq!(
            types,
            vec![
                RecordType::Data,
                RecordType::Data,
                RecordType::StartLinearAddress,
                RecordType::EndOfFile
            ]
        );
        assert_eq!(read.image.blocks().len(), 1);
        assert_eq!(read.image.blocks()[0].start, 0x0100);
        assert_eq!(read.image.blocks()[0].size(), 32);
        assert_eq!(read.start_address.unwrap().to_string(), "0x08000131");
        assert!(read.warnings.is_empty());
    }

    #[test]
    fn test_segment_then_linear_base_warns() {
        let input = b":020000021000EC\n\
                      :0100000055AA\n\
                      :020000040800F2\n\
                      :010000006699\n\
                      :00000001FF\n";
        let read = parse(input).unwrap();
        let starts: Vec<_> = read.image.blocks().iter().map(|b| b.start).collect();
        assert_eq!(starts, vec![0x0001_0000, 0x0800_0000]);
        assert_eq!(
            read.warnings,
            vec![Warning::MixedAddressingModes { line: 3 }]
        );
    }

    #[test]
    fn test_binary_padding_after_eof_is_warning() {
        let mut input = b":0100000055AA\n:00000001FF\n".to_vec();
        input.extend([0xFF; 16]);
        let read = parse(&input).unwrap();
        assert_eq!(read.image.read_byte(0), Some(0x55));
        assert_eq!(
            read.warnings,
            vec![Warning::TrailingDataAfterEof { line: 3 }]
        );
    }

    #[test]
    fn test_non_utf8_byte_is_malformed_line() {
        let input = b":0100000055AA\n:01\xFF0000AA\n:00000001FF\n";
        let err = parse(input).unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(err.line(), Some(2));
        assert!(matches!(
            err,
            ParseError::MalformedLine {
                line: 2,
                source: RecordError::InvalidByte(0xFF)
            }
        ));
    }

    #[test]
    fn test_checksum_error_is_fatal_when_verifying() {
        let input = b":10010000214601360121470136007EFE09D2190141\n\
                      :00000001FF\n";
        let result = parse(input);
        assert!(matches!(
            result,
            Err(ParseError::ChecksumMismatch {
                line: 1,
                expected: 0x40,
                actual: 0x41
            })
        ));
    }

    #[test]
    fn test_checksum_error_is_warning_when_not_verifying() {
        let input = b":10010000214601360121470136007EFE09D2190141\n\
                      :00000001FF\n";
        let config = Config {
            verify_checksum: false,
            ..Config::default()
        };
        let read = parse_intel_hex(input, &config).unwrap();
        assert_eq!(read.image.blocks()[0].size(), 16);
        assert_eq!(
            read.warnings,
            vec![Warning::ChecksumMismatch {
                line: 1,
                expected: 0x40,
                actual: 0x41
            }]
        );
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let input = b":0201000000FF\n:00000001FF\n";
        let err = parse(input).unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn test_unknown_record_type_is_malformed() {
        let input = b":10010000214601360121470136007EFE09D2190140\n\
                      :00000006FA\n\
                      :00000001FF\n";
        let err = parse(input).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnknownRecordType {
                line: 2,
                record_type: 0x06
            }
        ));
        assert!(err.is_malformed());
    }

    #[test]
    fn test_trailing_data_after_eof_is_warning() {
        let input = b":0100000055AA\n\
                      :00000001FF\n\
                      \n\
                      garbage that is never decoded\n";
        let read = parse(input).unwrap();
        assert_eq!(read.image.blocks().len(), 1);
        assert_eq!(read.records.last().unwrap().record_type, RecordType::EndOfFile);
        assert_eq!(
            read.warnings,
            vec![Warning::TrailingDataAfterEof { line: 4 }]
        );
    }

    #[test]
    fn test_missing_eof_is_warning() {
        let input = b":10010000214601360121470136007EFE09D2190140\n";
        let read = parse(input).unwrap();
        assert_eq!(read.warnings, vec![Warning::MissingEndOfFile]);
    }

    #[test]
    fn test_crlf_input() {
        let input = b":0100000055AA\r\n:00000001FF\r\n";
        let read = parse(input).unwrap();
        assert_eq!(read.image.read_byte(0), Some(0x55));
    }

    #[test]
    fn test_start_linear_address_surfaced() {
        let input = b":0400000508000131BD\n:00000001FF\n";
        let read = parse(input).unwrap();
        assert!(read.image.is_empty());
        assert_eq!(
            read.start_address,
            Some(StartAddress::Linear {
                address: 0x0800_0131
            })
        );
    }

    #[test]
    fn test_overlap_rejected_by_config() {
        let config = Config {
            overlap_policy: OverlapPolicy::Reject,
            ..Config::default()
        };
        let input = b":0100000055AA\n:010000006699\n:00000001FF\n";
        assert!(matches!(
            parse_intel_hex(input, &config),
            Err(ParseError::Build(BuildError::OverlapConflict { line: 2, address: 0 }))
        ));
        let read = parse(input).unwrap();
        assert_eq!(read.image.read_byte(0), Some(0x66));
    }

    #[test]
    fn test_to_hex_records_chunking() {
        let image = MemoryImage::from_writes([(0x0100, (0u8..40).collect())]).unwrap();
        let records = to_hex_records(&image, 16);
        let lens: Vec<_> = records.iter().map(|r| r.byte_count()).collect();
        assert_eq!(lens, vec![16, 16, 8, 0]);
        assert_eq!(records[1].address, 0x0110);
        assert_eq!(records[3].record_type, RecordType::EndOfFile);
    }

    #[test]
    fn test_to_hex_records_zero_width_defaults() {
        let image = MemoryImage::from_writes([(0, vec![0; 20])]).unwrap();
        assert_eq!(to_hex_records(&image, 0)[0].byte_count(), 16);
    }

    #[test]
    fn test_to_hex_records_splits_at_window_boundary() {
        let image = MemoryImage::from_writes([(0xFFF8, vec![0xAB; 16])]).unwrap();
        let records = to_hex_records(&image, 32);
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].address, 0xFFF8);
        assert_eq!(records[0].byte_count(), 8);
        assert_eq!(records[1], Record::extended_linear_address(0x0001));
        assert_eq!(records[2].address, 0x0000);
        assert_eq!(records[2].byte_count(), 8);
        assert_eq!(build(records).unwrap(), image);
    }

    #[test]
    fn test_to_hex_records_high_blocks() {
        let image = MemoryImage::from_writes([
            (0x0800_0000, vec![1, 2, 3]),
            (0x0800_0100, vec![4]),
            (0x2000_0000, vec![5]),
        ])
        .unwrap();
        let records = to_hex_records(&image, 16);
        let elas: Vec<_> = records
            .iter()
            .filter(|r| r.record_type == RecordType::ExtendedLinearAddress)
            .collect();
        assert_eq!(elas.len(), 2);
        assert_eq!(build(records).unwrap(), image);
    }

    #[test]
    fn test_segment_file_rewritten_with_linear_base() {
        let input = b":020000021000EC\n\
                      :0400000001020304F2\n\
                      :0400000300001000E9\n\
                      :00000001FF\n";
        let read = parse(input).unwrap();
        assert_eq!(
            read.start_address,
            Some(StartAddress::Segment { cs: 0, ip: 0x1000 })
        );

        let options = IntelHexWriteOptions {
            start_address: read.start_address,
            ..IntelHexWriteOptions::default()
        };
        let output = write_intel_hex(&read.image, &options);
        assert_eq!(
            output,
            ":020000040001F9\r\n:0400000001020304F2\r\n:0400000300001000E9\r\n:00000001FF\r\n"
        );

        let again = parse(output.as_bytes()).unwrap();
        assert_eq!(again.image, read.image);
        assert_eq!(again.start_address, read.start_address);
    }

    #[test]
    fn test_write_block_above_first_window() {
        let image = MemoryImage::from_writes([(0x0001_0000, vec![0xAA, 0xBB])]).unwrap();
        let text = write_intel_hex(&image, &IntelHexWriteOptions::default());
        assert_eq!(text, ":020000040001F9\r\n:02000000AABB99\r\n:00000001FF\r\n");
    }

    #[test]
    fn test_write_start_address_and_lf() {
        let image = MemoryImage::from_writes([(0, vec![0x55])]).unwrap();
        let options = IntelHexWriteOptions {
            line_ending: LineEnding::Lf,
            start_address: Some(StartAddress::Linear {
                address: 0x0800_0131,
            }),
            ..IntelHexWriteOptions::default()
        };
        let text = write_intel_hex(&image, &options);
        assert_eq!(text, ":0100000055AA\n:0400000508000131BD\n:00000001FF\n");
    }
}
