use std::path::PathBuf;

use clap::{ArgAction, Parser, builder::ValueHint};
use pixelbridge::{BufferMode, DecodeOptions, Limits};

/// Command-line arguments for pixelbridge-probe.
#[derive(Parser, Debug)]
#[command(
    name = "pixelbridge-probe",
    about = "Decode a JPEG or PNG through RNImageDecoder.decodeImage and report the result.",
    author,
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// JPEG or PNG file to decode
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Write the decoded RGBA8888 pixels to this file
    #[arg(long = "out-raw", short = 'o', value_hint = ValueHint::FilePath, value_name = "FILE")]
    pub out_raw: Option<PathBuf>,

    /// Copy pixels into a runtime-owned buffer instead of aliasing decoder memory
    #[arg(long)]
    pub copy: bool,

    /// Reject inputs larger than this many bytes
    #[arg(long, value_name = "BYTES")]
    pub max_input_bytes: Option<usize>,

    /// Reject images whose header announces more than this many pixels
    #[arg(long, value_name = "PIXELS")]
    pub max_pixels: Option<u64>,

    /// Decode the file this many times and check every result matches
    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub repeat: u32,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn options(&self) -> DecodeOptions {
        DecodeOptions::default()
            .with_limits(Limits {
                max_input_bytes: self.max_input_bytes,
                max_pixels: self.max_pixels,
            })
            .with_buffer_mode(if self.copy {
                BufferMode::Copy
            } else {
                BufferMode::Alias
            })
    }
}
