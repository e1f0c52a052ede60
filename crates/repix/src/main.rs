#![doc = include_str!("../README.md")]

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use repix_core::prelude::*;

mod batch;

#[derive(Parser, Debug)]
#[command(name = "repix", version, about)]
pub(crate) struct Args {
    /// Output file, or directory to drop one output per input into.
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Pixel columns of raw input; guessed from row similarity when omitted.
    #[arg(short = 'c', long = "col", visible_alias = "width")]
    col: Option<u32>,

    /// Pixel rows of raw input; derived from the buffer length when omitted.
    #[arg(short = 'r', long = "row", visible_alias = "height")]
    row: Option<u32>,

    /// Bytes per stored row of raw input.
    #[arg(short, long)]
    stride: Option<usize>,

    /// Stored rows of the primary plane of raw input.
    #[arg(short = 'l', long)]
    scanline: Option<usize>,

    /// How to interpret the input bytes.
    #[arg(short, long = "input-type")]
    input_type: PixelFormat,

    /// Format to produce.
    #[arg(short, long = "output-type")]
    output_type: PixelFormat,

    /// Leading bytes to drop before decoding; for CSV input, leading records.
    #[arg(short = 'j', long, default_value_t = 0)]
    skip: usize,

    /// Standard the input YUV samples are encoded with.
    #[arg(long, default_value_t = ColorStandard::Bt601)]
    input_color: ColorStandard,

    /// Signal range of the input YUV samples.
    #[arg(long, default_value_t = SignalRange::Full)]
    input_range: SignalRange,

    /// Standard to encode output YUV samples with.
    #[arg(long, default_value_t = ColorStandard::Bt601)]
    output_color: ColorStandard,

    /// Signal range of the output YUV samples.
    #[arg(long, default_value_t = SignalRange::Full)]
    output_range: SignalRange,

    /// Single-channel scale target: N maps [0, N] onto [0, 255], 0 maps the
    /// observed maximum to 255.
    #[arg(short, long)]
    normalize: Option<f64>,

    /// Suffix appended verbatim to output names in a directory target,
    /// replacing the type-implied extension.
    #[arg(short = 'x', long)]
    suffix: Option<String>,

    /// Overwrite existing outputs without asking.
    #[arg(short, long)]
    force: bool,

    /// Print a per-file block with geometry and channel ranges.
    #[arg(short, long)]
    verbose: bool,

    /// Input files.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    batch::run(&args, &mut batch::confirm_on_stdin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn format_and_range_flags_parse_by_name() {
        let args = Args::parse_from([
            "repix",
            "-i",
            "nv12",
            "-o",
            "png",
            "--input-color",
            "bt709",
            "--input-range",
            "videorange",
            "--width",
            "640",
            "frame.nv12",
        ]);
        assert_eq!(args.input_type, PixelFormat::Nv12);
        assert_eq!(args.output_type, PixelFormat::Png);
        assert_eq!(args.input_color, ColorStandard::Bt709);
        assert_eq!(args.input_range, SignalRange::Studio);
        assert_eq!(args.col, Some(640));
    }
}
