use std::path::PathBuf;

use clap::{builder::ValueParser, value_parser, Arg, ArgAction, Command};
use coursecut_core::{OutputFormat, DEFAULT_ENCODER};

pub const DEFAULT_LABEL_DIR: &str = "labels";
pub const DEFAULT_FORMAT: &str = "mp3";

// Shape of the course this tool was written for; other material can override
// the numbers on the command line.
pub const DEFAULT_SECTION_COUNT: &str = "4";
pub const DEFAULT_TRACK_COUNT: &str = "43";

/// Parse a format name into an [`OutputFormat`].
///
/// Exactly `mp3`, `aac`, and `wav` are recognized, case-insensitively.
pub fn parse_format(value: &str) -> Result<OutputFormat, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "mp3" => Ok(OutputFormat::Mp3),
        "aac" => Ok(OutputFormat::Aac),
        "wav" => Ok(OutputFormat::Wav),
        _ => Err(format!(
            "unsupported format '{value}' (expected mp3, aac, or wav)"
        )),
    }
}

pub fn build_cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about("Split course recordings into per-track files from timestamp labels")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("labels")
                .short('l')
                .long("labels")
                .value_name("LABEL_DIR")
                .help("Directory containing the per-section label files (section<N>.txt)")
                .default_value(DEFAULT_LABEL_DIR)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("OUTPUT_DIR")
                .help("Directory where the extracted tracks will be written")
                .default_value(".")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("Output format: mp3, aac, or wav")
                .default_value(DEFAULT_FORMAT)
                .value_parser(ValueParser::new(parse_format)),
        )
        .arg(
            Arg::new("sections")
                .long("sections")
                .value_name("COUNT")
                .help("Number of section label files")
                .default_value(DEFAULT_SECTION_COUNT)
                .value_parser(value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("tracks")
                .long("tracks")
                .value_name("COUNT")
                .help("Total number of tracks across all sections")
                .default_value(DEFAULT_TRACK_COUNT)
                .value_parser(value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("encoder")
                .long("encoder")
                .value_name("PATH")
                .help("Encoder binary to invoke")
                .default_value(DEFAULT_ENCODER)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .help("Allow overwriting existing files in the output directory")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Preview the extraction plan without invoking the encoder")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("sources")
                .value_name("SOURCES")
                .help("Source recordings; file names must start with their section number")
                .required(true)
                .num_args(1..)
                .value_parser(value_parser!(PathBuf)),
        )
}
