//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "ihexmap", version, about = "Inspect and convert Intel-HEX firmware images")]
pub struct Args {
    /// Settings file (INI: VerifyChecksum, DataBytesPerRecord, PadByte, ...)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress everything but the requested output
    #[arg(short, long, global = true)]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the memory block summary and record listing of a file
    Show {
        file: PathBuf,

        /// Accept lines with bad checksums, reporting them as warnings
        #[arg(long)]
        no_verify: bool,

        /// Emit the summary as JSON
        #[arg(long)]
        json: bool,

        /// Skip the per-record listing
        #[arg(long)]
        summary_only: bool,
    },

    /// Convert a file to Intel-HEX or a flat binary image
    Convert {
        input: PathBuf,
        output: PathBuf,

        /// Output format; inferred from the output extension when omitted
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Data bytes per Intel-HEX record
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..))]
        bytes_per_record: Option<u8>,

        /// Gap fill byte for binary output (decimal or 0x hex)
        #[arg(long, value_parser = parse_byte)]
        pad_byte: Option<u8>,

        /// Accept lines with bad checksums, reporting them as warnings
        #[arg(long)]
        no_verify: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Hex,
    Bin,
}

impl Args {
    /// Log filter for the verbosity flags; `RUST_LOG` overrides it.
    pub fn log_spec(&self) -> &'static str {
        if self.silent {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|_| format!("'{s}' is not a byte value"))
}
