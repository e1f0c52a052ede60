use std::{fmt, str::FromStr};

/// Format tag accepted on the command line, covering raw pixel layouts,
/// container formats and CSV text.
///
/// # Example
/// ```rust
/// use repix_core::prelude::PixelFormat;
///
/// let fmt: PixelFormat = "nv12".parse().unwrap();
/// assert!(fmt.is_raw());
/// assert_eq!(fmt.to_string(), "nv12");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PixelFormat {
    /// 8-bit gray.
    U8,
    /// 16-bit little-endian gray.
    U16,
    /// 32-bit little-endian gray.
    U32,
    /// 32-bit little-endian float gray.
    F32,
    /// Interleaved 8-bit blue/green/red.
    Bgr,
    /// Interleaved 8-bit red/green/blue.
    Rgb,
    /// Interleaved 8-bit red/green/blue/alpha.
    Rgba,
    /// Interleaved 8-bit blue/green/red/alpha.
    Bgra,
    /// Interleaved 8-bit Y/U/V, one triplet per pixel.
    Yuv,
    /// Semi-planar Y plane + interleaved V/U plane, 2x2 subsampled chroma.
    Nv21,
    /// Semi-planar Y plane + interleaved U/V plane, 2x2 subsampled chroma.
    Nv12,
    /// JPEG container (via the `image` crate).
    Jpg,
    /// PNG container (via the `image` crate).
    Png,
    /// BMP container (via the `image` crate).
    Bmp,
    /// Comma-separated text, one row per line.
    Csv,
}

impl PixelFormat {
    /// Layout facts for raw formats; `None` for containers and CSV, which do
    /// not have a fixed byte layout of their own.
    pub const fn descriptor(self) -> Option<FormatDescriptor> {
        let desc = match self {
            PixelFormat::U8 => FormatDescriptor::packed(1, SampleDepth::U8),
            PixelFormat::U16 => FormatDescriptor::packed(1, SampleDepth::U16),
            PixelFormat::U32 => FormatDescriptor::packed(1, SampleDepth::U32),
            PixelFormat::F32 => FormatDescriptor::packed(1, SampleDepth::F32),
            PixelFormat::Bgr | PixelFormat::Rgb | PixelFormat::Yuv => {
                FormatDescriptor::packed(3, SampleDepth::U8)
            }
            PixelFormat::Rgba | PixelFormat::Bgra => FormatDescriptor::packed(4, SampleDepth::U8),
            PixelFormat::Nv21 | PixelFormat::Nv12 => FormatDescriptor::semi_planar(),
            PixelFormat::Jpg | PixelFormat::Png | PixelFormat::Bmp | PixelFormat::Csv => {
                return None;
            }
        };
        Some(desc)
    }

    /// True for formats with a raw in-memory byte layout.
    pub const fn is_raw(self) -> bool {
        self.descriptor().is_some()
    }

    /// True for formats decoded/encoded through a container codec.
    pub const fn is_container(self) -> bool {
        matches!(self, PixelFormat::Jpg | PixelFormat::Png | PixelFormat::Bmp)
    }

    /// True for layouts that store luma/chroma samples rather than RGB.
    pub const fn is_yuv(self) -> bool {
        matches!(
            self,
            PixelFormat::Yuv | PixelFormat::Nv12 | PixelFormat::Nv21
        )
    }

    /// File extension used when naming outputs into a directory.
    pub const fn extension(self) -> &'static str {
        match self {
            PixelFormat::Jpg => "jpg",
            PixelFormat::Png => "png",
            PixelFormat::Bmp => "bmp",
            PixelFormat::Csv => "csv",
            PixelFormat::Yuv => "yuv",
            PixelFormat::Nv21 => "nv21",
            PixelFormat::Nv12 => "nv12",
            _ => "bin",
        }
    }

    const fn name(self) -> &'static str {
        match self {
            PixelFormat::U8 => "u8",
            PixelFormat::U16 => "u16",
            PixelFormat::U32 => "u32",
            PixelFormat::F32 => "f32",
            PixelFormat::Bgr => "bgr",
            PixelFormat::Rgb => "rgb",
            PixelFormat::Rgba => "rgba",
            PixelFormat::Bgra => "bgra",
            PixelFormat::Yuv => "yuv",
            PixelFormat::Nv21 => "nv21",
            PixelFormat::Nv12 => "nv12",
            PixelFormat::Jpg => "jpg",
            PixelFormat::Png => "png",
            PixelFormat::Bmp => "bmp",
            PixelFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fmt = match s {
            "u8" => PixelFormat::U8,
            "u16" => PixelFormat::U16,
            "u32" => PixelFormat::U32,
            "f32" => PixelFormat::F32,
            "bgr" => PixelFormat::Bgr,
            "rgb" => PixelFormat::Rgb,
            "rgba" => PixelFormat::Rgba,
            "bgra" => PixelFormat::Bgra,
            "yuv" => PixelFormat::Yuv,
            "nv21" => PixelFormat::Nv21,
            "nv12" => PixelFormat::Nv12,
            "jpg" => PixelFormat::Jpg,
            "png" => PixelFormat::Png,
            "bmp" => PixelFormat::Bmp,
            "csv" => PixelFormat::Csv,
            _ => return Err(format!("unknown image format '{s}'")),
        };
        Ok(fmt)
    }
}

/// Storage depth of a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SampleDepth {
    U8,
    U16,
    U32,
    F32,
}

impl SampleDepth {
    /// Bytes one sample occupies.
    pub const fn bytes(self) -> usize {
        match self {
            SampleDepth::U8 => 1,
            SampleDepth::U16 => 2,
            SampleDepth::U32 | SampleDepth::F32 => 4,
        }
    }
}

/// Byte-layout facts of a raw pixel format.
///
/// # Example
/// ```rust
/// use repix_core::prelude::PixelFormat;
///
/// let desc = PixelFormat::Nv12.descriptor().unwrap();
/// assert_eq!(desc.channels, 3);
/// assert!(desc.subsampled);
/// assert_eq!(desc.pixel_bytes(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormatDescriptor {
    /// Sample streams per pixel (1..=4).
    pub channels: usize,
    /// Depth of each stored sample.
    pub depth: SampleDepth,
    /// Chroma stored at quarter resolution in a trailing half-height plane.
    pub subsampled: bool,
}

impl FormatDescriptor {
    const fn packed(channels: usize, depth: SampleDepth) -> Self {
        Self {
            channels,
            depth,
            subsampled: false,
        }
    }

    const fn semi_planar() -> Self {
        Self {
            channels: 3,
            depth: SampleDepth::U8,
            subsampled: true,
        }
    }

    /// Bytes of one pixel slot in the primary plane. Semi-planar formats
    /// store one luma byte per pixel; the chroma plane adds its 1/2 on top
    /// and is accounted for separately in size checks.
    pub const fn pixel_bytes(&self) -> usize {
        if self.subsampled {
            1
        } else {
            self.channels * self.depth.bytes()
        }
    }
}

/// YUV matrix standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorStandard {
    /// Rec. 601.
    #[default]
    Bt601,
    /// Rec. 709.
    Bt709,
    /// Rec. 2020.
    Bt2020,
}

impl fmt::Display for ColorStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColorStandard::Bt601 => "bt601",
            ColorStandard::Bt709 => "bt709",
            ColorStandard::Bt2020 => "bt2020",
        })
    }
}

impl FromStr for ColorStandard {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bt601" => Ok(ColorStandard::Bt601),
            "bt709" => Ok(ColorStandard::Bt709),
            "bt2020" => Ok(ColorStandard::Bt2020),
            _ => Err(format!("unknown yuv color standard '{s}'")),
        }
    }
}

/// Signal range of YUV samples.
///
/// Full swing uses all 256 codes; studio (video) swing keeps Y in 16..=235
/// and chroma in 16..=240.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalRange {
    #[default]
    Full,
    Studio,
}

impl fmt::Display for SignalRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignalRange::Full => "fullrange",
            SignalRange::Studio => "videorange",
        })
    }
}

impl FromStr for SignalRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fullrange" | "fullswing" => Ok(SignalRange::Full),
            "videorange" | "studioswing" => Ok(SignalRange::Studio),
            _ => Err(format!("unknown yuv range '{s}'")),
        }
    }
}

/// Matrix standard plus signal range: everything needed to pick YUV
/// conversion coefficients.
///
/// # Example
/// ```rust
/// use repix_core::prelude::{ColorSpec, ColorStandard, SignalRange};
///
/// let spec = ColorSpec::default();
/// assert_eq!(spec.standard, ColorStandard::Bt601);
/// assert_eq!(spec.range, SignalRange::Full);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorSpec {
    pub standard: ColorStandard,
    pub range: SignalRange,
}

impl ColorSpec {
    pub const fn new(standard: ColorStandard, range: SignalRange) -> Self {
        Self { standard, range }
    }
}
