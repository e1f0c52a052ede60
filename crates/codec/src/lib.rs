#![doc = include_str!("../README.md")]

use repix_core::prelude::*;

/// Everything that can go wrong while converting one buffer.
///
/// [`ConvertError::is_config`] splits the taxonomy in two: configuration
/// errors mean the spec itself can never work and a batch should abort,
/// everything else is specific to the data at hand and worth skipping past.
///
/// # Example
/// ```rust
/// use repix_codec::ConvertError;
///
/// let err = ConvertError::Config("normalize target must be a non-negative number".into());
/// assert!(err.is_config());
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    /// A raw-layout operation was asked of a container or CSV tag.
    #[error("'{0}' is not a raw pixel layout")]
    NotRaw(PixelFormat),
    /// Dimension resolution failed for this buffer.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// The target layout cannot represent these dimensions.
    #[error("cannot pack {width}x{height} pixels as {format}: even dimensions required")]
    UnsupportedDimensions {
        format: PixelFormat,
        width: u32,
        height: u32,
    },
    /// Container or CSV input could not be decoded.
    #[error("decode failed: {0}")]
    Decode(String),
    /// The target encoder rejected the image.
    #[error("encode failed: {0}")]
    Encode(String),
    /// CSV rows disagree on the column count.
    #[error("csv row {row} has {got} values, expected {expected}")]
    NonRectangularCsv {
        row: usize,
        expected: usize,
        got: usize,
    },
    /// The spec contradicts itself; no input could ever convert.
    #[error("invalid conversion spec: {0}")]
    Config(String),
}

impl ConvertError {
    /// True when the conversion spec itself is at fault and retrying with
    /// other input files cannot help.
    pub fn is_config(&self) -> bool {
        matches!(self, ConvertError::Config(_) | ConvertError::NotRaw(_))
    }
}

/// Everything [`convert_buffer`] needs to know besides the bytes.
///
/// # Example
/// ```rust
/// use repix_codec::ConversionSpec;
/// use repix_core::prelude::{GeometryOverrides, PixelFormat};
///
/// let mut spec = ConversionSpec::new(PixelFormat::Nv12, PixelFormat::Png);
/// spec.geometry = GeometryOverrides {
///     width: Some(640),
///     ..Default::default()
/// };
/// assert!(spec.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConversionSpec {
    /// How to interpret the input bytes.
    pub input: PixelFormat,
    /// Layout to produce.
    pub output: PixelFormat,
    /// Standard/range the input YUV samples are encoded with.
    pub input_color: ColorSpec,
    /// Standard/range to encode output YUV samples with.
    pub output_color: ColorSpec,
    /// Explicit dimension hints for raw input.
    pub geometry: GeometryOverrides,
    /// Single-channel scaling target: `Some(t)` clips to `[0, t]` and maps
    /// `t` to 255, `Some(0.0)` scales the observed maximum to 255, `None`
    /// applies the fixed per-depth scale.
    pub normalize: Option<f64>,
    /// Leading bytes to drop before decoding; for CSV input, leading records.
    pub skip: usize,
}

impl ConversionSpec {
    pub fn new(input: PixelFormat, output: PixelFormat) -> Self {
        Self {
            input,
            output,
            input_color: ColorSpec::default(),
            output_color: ColorSpec::default(),
            geometry: GeometryOverrides::default(),
            normalize: None,
            skip: 0,
        }
    }

    /// Rejects contradictions that are knowable without looking at any
    /// input bytes. Everything caught here is a [`ConvertError::Config`].
    pub fn validate(&self) -> Result<(), ConvertError> {
        if let Some(t) = self.normalize
            && (!t.is_finite() || t < 0.0)
        {
            return Err(ConvertError::Config(format!(
                "normalize target must be a non-negative number, got {t}"
            )));
        }

        let g = &self.geometry;
        if g.width == Some(0) || g.height == Some(0) || g.stride == Some(0) || g.scanline == Some(0)
        {
            return Err(ConvertError::Config(
                "explicit dimensions must be positive".into(),
            ));
        }
        if let Some(desc) = self.input.descriptor() {
            if let (Some(w), Some(s)) = (g.width, g.stride) {
                let row = w as usize * desc.pixel_bytes();
                if row > s {
                    return Err(ConvertError::Config(format!(
                        "width {w} needs {row} bytes per row but stride is {s}"
                    )));
                }
            }
            if desc.subsampled
                && let Some(d) = [
                    g.width.map(|w| w as usize),
                    g.height.map(|h| h as usize),
                    g.stride,
                    g.scanline,
                ]
                .into_iter()
                .flatten()
                .find(|d| d % 2 != 0)
            {
                return Err(ConvertError::Config(format!(
                    "{} input requires even dimensions, got {d}",
                    self.input
                )));
            }
        }
        if let Some(desc) = self.output.descriptor()
            && desc.subsampled
            && let Some(d) = [g.width, g.height]
                .into_iter()
                .flatten()
                .find(|d| d % 2 != 0)
        {
            return Err(ConvertError::Config(format!(
                "{} output requires even dimensions, got {d}",
                self.output
            )));
        }
        Ok(())
    }
}

/// Converts one buffer according to `spec`.
///
/// Returns the encoded output bytes together with the report of resolved
/// geometry, observed channel ranges and non-fatal warnings. The function
/// is pure; it touches no files and keeps no state between calls.
pub fn convert_buffer(
    data: &[u8],
    spec: &ConversionSpec,
) -> Result<(Vec<u8>, ColorRangeReport), ConvertError> {
    spec.validate()?;
    match spec.input {
        PixelFormat::Csv => {
            let grid = csv::read(data, spec.skip)?;
            // Bare CSV numbers carry no implied scale, so default to
            // max-normalization instead of a fixed depth scale.
            let mut spec = spec.clone();
            spec.normalize = spec.normalize.or(Some(0.0));
            convert_grid(grid, &spec)
        }
        fmt if fmt.is_container() => {
            convert_container(data.get(spec.skip..).unwrap_or_default(), fmt, spec)
        }
        fmt => {
            let desc = fmt.descriptor().ok_or(ConvertError::NotRaw(fmt))?;
            let data = data.get(spec.skip..).unwrap_or_default();
            let geo = resolve_geometry(data, &desc, &spec.geometry)?;
            let mut report = ColorRangeReport {
                width: geo.width.get(),
                height: geo.height.get(),
                stride: geo.stride,
                scanline: geo.scanline,
                ..ColorRangeReport::default()
            };
            let mut grid = unpack::unpack(data, fmt, &geo, &mut report)?;
            if fmt.is_yuv() {
                yuv::yuv_to_rgb(&mut grid, spec.input_color, &mut report);
            }
            normalize::apply(&mut grid, spec.normalize, ChannelId::Value, &mut report);
            let bytes = pack::encode(grid, spec.output, spec.output_color, &mut report)?;
            Ok((bytes, report))
        }
    }
}

/// Converts an already-decoded sample grid; the tail of the container and
/// CSV paths.
///
/// Channel ranges are recorded from the values as decoded, before any depth
/// folding: single channels as Y, gray+alpha as Y and A, color as R/G/B/A.
pub fn convert_grid(
    mut grid: SampleGrid,
    spec: &ConversionSpec,
) -> Result<(Vec<u8>, ColorRangeReport), ConvertError> {
    spec.validate()?;
    let mut report = ColorRangeReport {
        width: grid.width() as u32,
        height: grid.height() as u32,
        ..ColorRangeReport::default()
    };

    match grid.channels() {
        1 => {}
        2 => {
            record_channels(&grid, &[ChannelId::Y, ChannelId::A], &mut report);
            grid = fold_gray_alpha(grid);
        }
        3 | 4 => {
            record_channels(
                &grid,
                &[ChannelId::R, ChannelId::G, ChannelId::B, ChannelId::A],
                &mut report,
            );
            grid = fold_to_eight_bit(grid);
        }
        n => {
            return Err(ConvertError::Decode(format!(
                "unsupported channel count {n}"
            )));
        }
    }
    normalize::apply(&mut grid, spec.normalize, ChannelId::Y, &mut report);

    let bytes = pack::encode(grid, spec.output, spec.output_color, &mut report)?;
    Ok((bytes, report))
}

pub(crate) fn record_channels(grid: &SampleGrid, ids: &[ChannelId], report: &mut ColorRangeReport) {
    for (c, id) in ids.iter().take(grid.channels()).enumerate() {
        report.record(*id, ChannelRange::scan(grid.channel_iter(c)));
    }
}

/// Per-depth factor folding decoded values onto the 0..=255 working scale.
pub(crate) fn depth_fold(depth: SampleDepth) -> f64 {
    match depth {
        SampleDepth::U8 => 1.0,
        SampleDepth::U16 => 1.0 / 256.0,
        SampleDepth::U32 => 1.0 / 16_777_216.0,
        SampleDepth::F32 => 255.0,
    }
}

/// Gray+alpha becomes 8-bit RGBA with the gray value replicated.
fn fold_gray_alpha(grid: SampleGrid) -> SampleGrid {
    let factor = depth_fold(grid.depth());
    let mut samples = Vec::with_capacity(grid.width() * grid.height() * 4);
    for pair in grid.samples().chunks_exact(2) {
        let y = (pair[0] * factor).round();
        let a = (pair[1] * factor).round();
        samples.extend_from_slice(&[y, y, y, a]);
    }
    grid.remap(4, SampleDepth::U8, samples)
}

/// Deep color images quantize to the 8-bit working scale before re-packing.
fn fold_to_eight_bit(grid: SampleGrid) -> SampleGrid {
    if grid.depth() == SampleDepth::U8 {
        return grid;
    }
    let factor = depth_fold(grid.depth());
    let channels = grid.channels();
    let samples = grid
        .samples()
        .iter()
        .map(|v| (v * factor).round())
        .collect();
    grid.remap(channels, SampleDepth::U8, samples)
}

#[cfg(feature = "image")]
fn convert_container(
    data: &[u8],
    _fmt: PixelFormat,
    spec: &ConversionSpec,
) -> Result<(Vec<u8>, ColorRangeReport), ConvertError> {
    let grid = container::decode(data)?;
    convert_grid(grid, spec)
}

#[cfg(not(feature = "image"))]
fn convert_container(
    _data: &[u8],
    fmt: PixelFormat,
    _spec: &ConversionSpec,
) -> Result<(Vec<u8>, ColorRangeReport), ConvertError> {
    Err(ConvertError::NotRaw(fmt))
}

#[cfg(feature = "image")]
pub mod container;
pub mod csv;
pub mod normalize;
pub mod pack;
pub mod unpack;
pub mod yuv;

pub mod prelude {
    #[cfg(feature = "image")]
    pub use crate::container;
    pub use crate::{ConversionSpec, ConvertError, convert_buffer, convert_grid};
    #[allow(unused_imports)]
    pub use repix_core::prelude::*;
}
