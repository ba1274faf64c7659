use std::io::Write;
use std::path::Path;

use log::info;
use serde::Serialize;

use ihexmap::{
    Config, FileFormat, HexDump, IntelHexWriteOptions, LoadedFile, RecordListing, StartAddress,
    Summary, Warning, read_file, summarize, to_binary_image, write_intel_hex,
};

use crate::args::{Args, Command, OutputFormat};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct ShowReport<'a> {
    file: &'a Path,
    format: FileFormat,
    summary: Summary,
    warnings: &'a [Warning],
    start_address: Option<StartAddress>,
}

pub fn execute(args: &Args) -> Result<(), CliError> {
    let mut config = match args.config {
        Some(ref path) => Config::load(path)?,
        None => Config::default(),
    };

    match args.command {
        Command::Show {
            ref file,
            no_verify,
            json,
            summary_only,
        } => {
            if no_verify {
                config.verify_checksum = false;
            }
            show(file, &config, json, summary_only)
        }
        Command::Convert {
            ref input,
            ref output,
            format,
            bytes_per_record,
            pad_byte,
            no_verify,
        } => {
            if no_verify {
                config.verify_checksum = false;
            }
            if let Some(n) = bytes_per_record {
                config.bytes_per_record = n;
            }
            if let Some(b) = pad_byte {
                config.pad_byte = b;
            }
            convert(input, output, format, &config, args.silent)
        }
    }
}

fn show(path: &Path, config: &Config, json: bool, summary_only: bool) -> Result<(), CliError> {
    let loaded = read_file(path, config)?;
    let mut out = std::io::stdout().lock();

    if json {
        let (start_address, summary) = match loaded {
            LoadedFile::IntelHex(ref read) => (read.start_address, summarize(&read.image)),
            LoadedFile::Binary(ref image) => (None, summarize(image)),
        };
        let report = ShowReport {
            file: path,
            format: loaded.format(),
            summary,
            warnings: loaded.warnings(),
            start_address,
        };
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    match loaded {
        LoadedFile::IntelHex(ref read) => {
            write!(out, "{}", summarize(&read.image))?;
            if let Some(start) = read.start_address {
                writeln!(out, "Start address: {start}")?;
            }
            if !summary_only {
                writeln!(out)?;
                write!(out, "{}", RecordListing(&read.records))?;
            }
        }
        LoadedFile::Binary(ref image) => {
            write!(out, "{}", summarize(image))?;
            if !summary_only {
                let bytes = image
                    .blocks()
                    .first()
                    .map(|b| b.bytes.as_slice())
                    .unwrap_or_default();
                writeln!(out)?;
                write!(out, "{}", HexDump::new(bytes))?;
            }
        }
    }
    Ok(())
}

fn convert(
    input: &Path,
    output: &Path,
    format: Option<OutputFormat>,
    config: &Config,
    silent: bool,
) -> Result<(), CliError> {
    let format = match format {
        Some(format) => format,
        None => match FileFormat::from_path(output) {
            Some(FileFormat::IntelHex) => OutputFormat::Hex,
            Some(FileFormat::Binary) => OutputFormat::Bin,
            None => return Err(CliError::UnknownOutputFormat(output.to_path_buf())),
        },
    };

    let loaded = read_file(input, config)?;
    let start_address = match loaded {
        LoadedFile::IntelHex(ref read) => read.start_address,
        LoadedFile::Binary(_) => None,
    };
    let image = loaded.into_image();

    match format {
        OutputFormat::Hex => {
            let options = IntelHexWriteOptions {
                start_address,
                ..config.intel_hex_options()
            };
            std::fs::write(output, write_intel_hex(&image, &options))?;
            info!(
                "wrote {} blocks to {}",
                image.blocks().len(),
                output.display()
            );
        }
        OutputFormat::Bin => {
            let (base, data) = to_binary_image(&image, &config.binary_options())?;
            std::fs::write(output, &data)?;
            if !silent {
                println!("base address 0x{base:08X}, {} bytes", data.len());
            }
        }
    }
    Ok(())
}
