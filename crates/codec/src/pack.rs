//! Re-packing of the canonical sample grid into the target byte layout.

use rayon::prelude::*;
use repix_core::prelude::*;

use crate::{ConvertError, csv, yuv};

#[cfg(feature = "image")]
use crate::container;

// sRGB luma weights, the same ones the container library applies when it
// grays out a color image.
const LUMA_R: f64 = 0.212671;
const LUMA_G: f64 = 0.715160;
const LUMA_B: f64 = 0.072169;

/// Encodes the grid as `output`, consuming it.
///
/// YUV-family targets run the forward matrix with `color`; everything the
/// encode pass observes lands in `report`.
pub fn encode(
    grid: SampleGrid,
    output: PixelFormat,
    color: ColorSpec,
    report: &mut ColorRangeReport,
) -> Result<Vec<u8>, ConvertError> {
    match output {
        PixelFormat::Csv => Ok(csv::write(&grid).into_bytes()),
        PixelFormat::U8 => Ok(pack_gray(&reduce_to_gray(grid), SampleDepth::U8)),
        PixelFormat::U16 => Ok(pack_gray(&reduce_to_gray(grid), SampleDepth::U16)),
        PixelFormat::U32 => Ok(pack_gray(&reduce_to_gray(grid), SampleDepth::U32)),
        PixelFormat::F32 => Ok(pack_gray(&reduce_to_gray(grid), SampleDepth::F32)),
        PixelFormat::Rgb => Ok(pack_interleaved(&to_rgb3(grid), &[0, 1, 2])),
        PixelFormat::Bgr => Ok(pack_interleaved(&to_rgb3(grid), &[2, 1, 0])),
        PixelFormat::Rgba => Ok(pack_interleaved(&to_rgba(grid), &[0, 1, 2, 3])),
        PixelFormat::Bgra => Ok(pack_interleaved(&to_rgba(grid), &[2, 1, 0, 3])),
        PixelFormat::Yuv => {
            let mut rgb = to_rgb3(grid);
            yuv::rgb_to_yuv(&mut rgb, color, report);
            Ok(pack_interleaved(&rgb, &[0, 1, 2]))
        }
        PixelFormat::Nv12 => pack_semi_planar(grid, output, color, report, 0),
        PixelFormat::Nv21 => pack_semi_planar(grid, output, color, report, 1),
        #[cfg(feature = "image")]
        PixelFormat::Jpg | PixelFormat::Png | PixelFormat::Bmp => container::encode(&grid, output),
        #[cfg(not(feature = "image"))]
        PixelFormat::Jpg | PixelFormat::Png | PixelFormat::Bmp => Err(ConvertError::NotRaw(output)),
    }
}

#[inline(always)]
fn clamp_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Color grids collapse to weighted luma; single channels pass through.
fn reduce_to_gray(grid: SampleGrid) -> SampleGrid {
    if grid.channels() == 1 {
        return grid;
    }
    let channels = grid.channels();
    let depth = grid.depth();
    let samples = grid
        .samples()
        .chunks_exact(channels)
        .map(|px| LUMA_R * px[0] + LUMA_G * px[1] + LUMA_B * px[2])
        .collect();
    grid.remap(1, depth, samples)
}

fn pack_gray(grid: &SampleGrid, depth: SampleDepth) -> Vec<u8> {
    let samples = grid.samples();
    match depth {
        SampleDepth::U8 => samples.iter().map(|&v| clamp_u8(v)).collect(),
        SampleDepth::U16 => {
            let mut out = Vec::with_capacity(samples.len() * 2);
            for &v in samples {
                let q = (v * 256.0).round().clamp(0.0, 65_535.0) as u16;
                out.extend_from_slice(&q.to_le_bytes());
            }
            out
        }
        SampleDepth::U32 => {
            let mut out = Vec::with_capacity(samples.len() * 4);
            for &v in samples {
                let q = (v * 16_777_216.0).round().clamp(0.0, u32::MAX as f64) as u32;
                out.extend_from_slice(&q.to_le_bytes());
            }
            out
        }
        SampleDepth::F32 => {
            let mut out = Vec::with_capacity(samples.len() * 4);
            for &v in samples {
                out.extend_from_slice(&((v / 255.0) as f32).to_le_bytes());
            }
            out
        }
    }
}

/// One quantized byte per sample, channels shuffled into `order`.
fn pack_interleaved(grid: &SampleGrid, order: &[usize]) -> Vec<u8> {
    let channels = grid.channels();
    debug_assert_eq!(channels, order.len());
    let row_len = grid.row_len();
    let mut out = vec![0u8; grid.samples().len()];
    out.par_chunks_mut(row_len)
        .zip(grid.samples().par_chunks(row_len))
        .for_each(|(dst, src)| {
            for (dpx, spx) in dst.chunks_exact_mut(channels).zip(src.chunks_exact(channels)) {
                for (c, &slot) in order.iter().enumerate() {
                    dpx[slot] = clamp_u8(spx[c]);
                }
            }
        });
    out
}

fn to_rgb3(grid: SampleGrid) -> SampleGrid {
    match grid.channels() {
        1 => {
            let samples = grid.samples().iter().flat_map(|&v| [v, v, v]).collect();
            grid.remap(3, SampleDepth::U8, samples)
        }
        4 => {
            let samples = grid
                .samples()
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            grid.remap(3, SampleDepth::U8, samples)
        }
        _ => grid,
    }
}

fn to_rgba(grid: SampleGrid) -> SampleGrid {
    match grid.channels() {
        1 => {
            let samples = grid
                .samples()
                .iter()
                .flat_map(|&v| [v, v, v, 255.0])
                .collect();
            grid.remap(4, SampleDepth::U8, samples)
        }
        3 => {
            let samples = grid
                .samples()
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], 255.0])
                .collect();
            grid.remap(4, SampleDepth::U8, samples)
        }
        _ => grid,
    }
}

/// Full-resolution luma plane followed by one half-height plane of chroma
/// pairs; each pair averages a 2x2 block.
fn pack_semi_planar(
    grid: SampleGrid,
    format: PixelFormat,
    color: ColorSpec,
    report: &mut ColorRangeReport,
    u_at: usize,
) -> Result<Vec<u8>, ConvertError> {
    let (width, height) = (grid.width(), grid.height());
    if width % 2 != 0 || height % 2 != 0 {
        return Err(ConvertError::UnsupportedDimensions {
            format,
            width: width as u32,
            height: height as u32,
        });
    }
    let mut rgb = to_rgb3(grid);
    yuv::rgb_to_yuv(&mut rgb, color, report);
    let mut out = Vec::with_capacity(width * height * 3 / 2);
    // The matrix pass quantized every sample, so a plain cast is exact.
    out.extend(rgb.channel_iter(0).map(|v| v as u8));
    let row_len = rgb.row_len();
    let mut rows = rgb.samples().chunks(row_len);
    while let (Some(top), Some(bottom)) = (rows.next(), rows.next()) {
        for (p0, p1) in top.chunks_exact(6).zip(bottom.chunks_exact(6)) {
            let u = ((p0[1] + p0[4] + p1[1] + p1[4]) / 4.0).round() as u8;
            let v = ((p0[2] + p0[5] + p1[2] + p1[5]) / 4.0).round() as u8;
            let mut pair = [0u8; 2];
            pair[u_at] = u;
            pair[1 - u_at] = v;
            out.extend_from_slice(&pair);
        }
    }
    Ok(out)
}
