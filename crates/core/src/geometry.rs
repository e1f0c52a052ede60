use std::num::NonZeroU32;

use crate::format::FormatDescriptor;

/// Caller-supplied dimension hints. Any field left `None` is derived from the
/// buffer size, the other hints, or the row-repetition heuristic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeometryOverrides {
    /// Pixels per row.
    pub width: Option<u32>,
    /// Pixel rows.
    pub height: Option<u32>,
    /// Bytes per stored row, including padding.
    pub stride: Option<usize>,
    /// Stored rows in the primary plane, including padding rows.
    pub scanline: Option<usize>,
}

/// Fully resolved buffer geometry.
///
/// `stride`/`scanline` describe the stored plane and are always at least
/// `width * pixel_bytes` / `height` for raw buffers. Grids decoded from
/// containers carry `0` for both since no row padding exists there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    pub width: NonZeroU32,
    pub height: NonZeroU32,
    pub stride: usize,
    pub scanline: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    /// Dimensions are zero, contradict each other, or break a format rule.
    #[error("invalid geometry: {0}")]
    Invalid(String),
    /// The buffer does not hold enough bytes for the resolved layout.
    #[error("buffer too short: layout needs {needed} bytes, got {actual}")]
    InsufficientData { needed: usize, actual: usize },
    /// Plane arithmetic overflowed.
    #[error("geometry overflow computing {0}")]
    Overflow(&'static str),
}

/// Resolves width, height, stride and scanline for a raw buffer.
///
/// Resolution order:
/// 1. stride and scanline fill each other in from the buffer size,
/// 2. an explicit height fixes the width (explicit, from stride, or from the
///    buffer size),
/// 3. otherwise an explicit width fixes the height,
/// 4. otherwise stride plus scanline alone fix both,
/// 5. otherwise [`guess_width`] picks the width and the height follows,
/// 6. missing stride/scanline default to the tight values.
///
/// Semi-planar formats must resolve to even width, height, stride and
/// scanline so the quarter-resolution chroma plane lines up.
///
/// # Example
/// ```rust
/// use repix_core::prelude::{GeometryOverrides, PixelFormat, resolve_geometry};
///
/// let desc = PixelFormat::U16.descriptor().unwrap();
/// let data = vec![0u8; 64];
/// let overrides = GeometryOverrides {
///     width: Some(8),
///     ..Default::default()
/// };
/// let geo = resolve_geometry(&data, &desc, &overrides).unwrap();
/// assert_eq!(geo.height.get(), 4);
/// assert_eq!(geo.stride, 16);
/// ```
pub fn resolve_geometry(
    data: &[u8],
    desc: &FormatDescriptor,
    overrides: &GeometryOverrides,
) -> Result<Geometry, GeometryError> {
    if overrides.width == Some(0) || overrides.height == Some(0) {
        return Err(GeometryError::Invalid(
            "width and height must be positive".into(),
        ));
    }
    if overrides.stride == Some(0) || overrides.scanline == Some(0) {
        return Err(GeometryError::Invalid(
            "stride and scanline must be positive".into(),
        ));
    }

    let pixel_bytes = desc.pixel_bytes();
    // Subsampled layouts carry a half-height chroma plane after the luma
    // plane; the luma plane holds 2/3 of the bytes.
    let size = if desc.subsampled {
        data.len()
            .checked_mul(2)
            .ok_or(GeometryError::Overflow("luma plane size"))?
            / 3
    } else {
        data.len()
    };

    let mut stride = overrides.stride;
    let mut scanline = overrides.scanline;
    match (stride, scanline) {
        (Some(s), None) => scanline = Some(size / s),
        (None, Some(l)) => stride = Some(size / l),
        _ => {}
    }

    let (width, height) = if let Some(h) = overrides.height {
        let h = h as usize;
        let w = match (overrides.width, stride) {
            (Some(w), _) => w as usize,
            (None, Some(s)) => s / pixel_bytes,
            (None, None) => size / pixel_bytes / h,
        };
        (w, h)
    } else if let Some(w) = overrides.width {
        let w = w as usize;
        let h = scanline.unwrap_or(size / pixel_bytes / w);
        (w, h)
    } else if let (Some(s), Some(l)) = (stride, scanline) {
        (s / pixel_bytes, l)
    } else {
        let w = guess_width(data, desc);
        if w == 0 {
            return Err(GeometryError::Invalid(
                "cannot infer dimensions from an empty buffer".into(),
            ));
        }
        (w, size / pixel_bytes / w)
    };

    if width == 0 || height == 0 {
        return Err(GeometryError::Invalid(format!(
            "resolved to a degenerate {width}x{height} surface"
        )));
    }

    let row_bytes = width
        .checked_mul(pixel_bytes)
        .ok_or(GeometryError::Overflow("row size"))?;
    let stride = stride.unwrap_or(row_bytes);
    let scanline = scanline.unwrap_or(height);

    if desc.subsampled
        && (width % 2 != 0 || height % 2 != 0 || stride % 2 != 0 || scanline % 2 != 0)
    {
        return Err(GeometryError::Invalid(format!(
            "subsampled chroma requires even dimensions, got {width}x{height} (stride {stride}, scanline {scanline})"
        )));
    }
    if row_bytes > stride {
        return Err(GeometryError::Invalid(format!(
            "width {width} needs {row_bytes} bytes per row but stride is {stride}"
        )));
    }
    if scanline < height {
        return Err(GeometryError::Invalid(format!(
            "scanline {scanline} is shorter than height {height}"
        )));
    }

    let plane = stride
        .checked_mul(scanline)
        .ok_or(GeometryError::Overflow("plane size"))?;
    let needed = if desc.subsampled {
        plane
            .checked_mul(3)
            .ok_or(GeometryError::Overflow("plane size"))?
            / 2
    } else {
        plane
    };
    if data.len() < needed {
        return Err(GeometryError::InsufficientData {
            needed,
            actual: data.len(),
        });
    }

    let width = u32::try_from(width)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or_else(|| GeometryError::Invalid(format!("width {width} out of range")))?;
    let height = u32::try_from(height)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or_else(|| GeometryError::Invalid(format!("height {height} out of range")))?;

    Ok(Geometry {
        width,
        height,
        stride,
        scanline,
    })
}

/// Guesses the width of a tightly packed buffer by scoring how often
/// vertically adjacent pixels repeat.
///
/// Every candidate width in `[sqrt(n)/2, n / (sqrt(n)/2))` is scored by the
/// fraction of pixels equal to the pixel directly below; widths above 160
/// sample every 23rd row pair to bound the cost. The highest score wins and
/// ties go to the candidate closest to a square aspect. Returns `0` when the
/// buffer holds no complete pixel.
pub fn guess_width(data: &[u8], desc: &FormatDescriptor) -> usize {
    let pixel_bytes = desc.pixel_bytes();
    let pixel_count = if desc.subsampled {
        data.len() * 2 / 3
    } else {
        data.len() / pixel_bytes
    };
    if pixel_count == 0 {
        return 0;
    }

    let sqrt = (pixel_count as f64).sqrt();
    let mut result = sqrt.round() as usize;
    let min_width = ((sqrt as usize) / 2).max(1);
    let max_width = pixel_count / min_width;

    let slot = |i: usize| &data[i * pixel_bytes..(i + 1) * pixel_bytes];

    let mut peak = 0.0f64;
    let mut best_ratio = 1.0f64;
    for width in min_width..max_width {
        let mut height = pixel_count / width;
        if desc.subsampled {
            if width % 2 != 0 {
                continue;
            }
            height -= height % 2;
        }
        if height < 2 {
            continue;
        }

        let step = if width > 160 { 23 } else { 1 };
        let mut equal = 0usize;
        let mut total = 0usize;
        let mut y = 0;
        while y + 1 < height {
            let top = y * width;
            let bottom = (y + 1) * width;
            for x in 0..width {
                if slot(top + x) == slot(bottom + x) {
                    equal += 1;
                }
            }
            total += width;
            y += step;
        }
        if total == 0 {
            continue;
        }

        let probability = equal as f64 / total as f64;
        if probability > peak {
            peak = probability;
            result = width;
        } else if probability == peak {
            let ratio = (width as f64 / height as f64 - 1.0).abs();
            if ratio < best_ratio {
                best_ratio = ratio;
                result = width;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PixelFormat;

    fn desc(fmt: PixelFormat) -> FormatDescriptor {
        fmt.descriptor().unwrap()
    }

    #[test]
    fn explicit_width_derives_height_and_stride() {
        let data = vec![0u8; 64];
        let overrides = GeometryOverrides {
            width: Some(8),
            ..Default::default()
        };
        let geo = resolve_geometry(&data, &desc(PixelFormat::U16), &overrides).unwrap();
        assert_eq!(geo.width.get(), 8);
        assert_eq!(geo.height.get(), 4);
        assert_eq!(geo.stride, 16);
        assert_eq!(geo.scanline, 4);
    }

    #[test]
    fn explicit_height_derives_width() {
        let data = vec![0u8; 48];
        let overrides = GeometryOverrides {
            height: Some(4),
            ..Default::default()
        };
        let geo = resolve_geometry(&data, &desc(PixelFormat::Bgr), &overrides).unwrap();
        assert_eq!(geo.width.get(), 4);
        assert_eq!(geo.height.get(), 4);
    }

    #[test]
    fn stride_and_scanline_alone_fix_dimensions() {
        let data = vec![0u8; 32];
        let overrides = GeometryOverrides {
            stride: Some(8),
            scanline: Some(4),
            ..Default::default()
        };
        let geo = resolve_geometry(&data, &desc(PixelFormat::U16), &overrides).unwrap();
        assert_eq!(geo.width.get(), 4);
        assert_eq!(geo.height.get(), 4);
    }

    #[test]
    fn stride_with_height_crops_padding_columns() {
        // 6-byte rows of which only 4 pixels are image data.
        let data = vec![0u8; 24];
        let overrides = GeometryOverrides {
            width: Some(4),
            height: Some(4),
            stride: Some(6),
            ..Default::default()
        };
        let geo = resolve_geometry(&data, &desc(PixelFormat::U8), &overrides).unwrap();
        assert_eq!(geo.width.get(), 4);
        assert_eq!(geo.stride, 6);
        assert_eq!(geo.scanline, 4);
    }

    #[test]
    fn rejects_zero_overrides() {
        let data = vec![0u8; 16];
        let overrides = GeometryOverrides {
            width: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            resolve_geometry(&data, &desc(PixelFormat::U8), &overrides),
            Err(GeometryError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_width_wider_than_stride() {
        let data = vec![0u8; 64];
        let overrides = GeometryOverrides {
            width: Some(16),
            height: Some(4),
            stride: Some(8),
            ..Default::default()
        };
        assert!(matches!(
            resolve_geometry(&data, &desc(PixelFormat::U8), &overrides),
            Err(GeometryError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_short_buffer_with_exact_counts() {
        let data = vec![0u8; 30];
        let overrides = GeometryOverrides {
            width: Some(8),
            height: Some(8),
            ..Default::default()
        };
        let err = resolve_geometry(&data, &desc(PixelFormat::U8), &overrides).unwrap_err();
        assert_eq!(
            err,
            GeometryError::InsufficientData {
                needed: 64,
                actual: 30
            }
        );
    }

    #[test]
    fn rejects_odd_semi_planar_dimensions() {
        let data = vec![0u8; 18];
        let overrides = GeometryOverrides {
            width: Some(3),
            height: Some(4),
            ..Default::default()
        };
        assert!(matches!(
            resolve_geometry(&data, &desc(PixelFormat::Nv12), &overrides),
            Err(GeometryError::Invalid(_))
        ));
    }

    #[test]
    fn semi_planar_length_includes_chroma_plane() {
        // 4x4 nv12 needs 16 luma + 8 chroma bytes.
        let data = vec![0u8; 24];
        let overrides = GeometryOverrides {
            width: Some(4),
            ..Default::default()
        };
        let geo = resolve_geometry(&data, &desc(PixelFormat::Nv12), &overrides).unwrap();
        assert_eq!(geo.height.get(), 4);

        let short = vec![0u8; 23];
        let overrides = GeometryOverrides {
            width: Some(4),
            height: Some(4),
            ..Default::default()
        };
        assert_eq!(
            resolve_geometry(&short, &desc(PixelFormat::Nv12), &overrides).unwrap_err(),
            GeometryError::InsufficientData {
                needed: 24,
                actual: 23
            }
        );
    }

    #[test]
    fn guesses_width_from_repeating_rows() {
        // 64 identical rows of a 64-wide gradient.
        let data: Vec<u8> = (0..3072).map(|i| (i % 64) as u8).collect();
        let geo =
            resolve_geometry(&data, &desc(PixelFormat::U8), &GeometryOverrides::default()).unwrap();
        assert_eq!(geo.width.get(), 64);
        assert_eq!(geo.height.get(), 48);
    }

    #[test]
    fn guess_ties_break_toward_square() {
        // Constant data scores 1.0 for every candidate width.
        let data = vec![7u8; 64];
        assert_eq!(guess_width(&data, &desc(PixelFormat::U8)), 8);
    }

    #[test]
    fn guess_on_empty_buffer_is_rejected() {
        let err = resolve_geometry(&[], &desc(PixelFormat::U8), &GeometryOverrides::default())
            .unwrap_err();
        assert!(matches!(err, GeometryError::Invalid(_)));
    }

    #[test]
    fn guess_respects_semi_planar_evenness() {
        // 6x4 nv12 frame, rows repeat: 24 luma + 12 chroma bytes.
        let mut data = Vec::new();
        for _ in 0..4 {
            data.extend_from_slice(&[10, 20, 30, 40, 50, 60]);
        }
        data.extend_from_slice(&[128; 12]);
        let geo = resolve_geometry(
            &data,
            &desc(PixelFormat::Nv12),
            &GeometryOverrides::default(),
        )
        .unwrap();
        assert_eq!(geo.width.get(), 6);
        assert_eq!(geo.height.get(), 4);
    }
}
