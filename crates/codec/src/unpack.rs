//! Raw buffer decoding: slices the stored planes and lands every sample in
//! a row-major [`SampleGrid`].

use rayon::prelude::*;
use repix_core::prelude::*;

use crate::ConvertError;

/// Decodes a raw buffer into a sample grid.
///
/// Packed color formats come out in canonical R,G,B(,A) channel order;
/// `yuv`/`nv12`/`nv21` come out as full-resolution Y,U,V with subsampled
/// chroma replicated over each 2x2 block. Multi-channel ranges are recorded
/// into the report from the values as stored.
///
/// The resolved geometry must belong to this buffer; row slicing relies on
/// the length check the resolver already performed.
pub fn unpack(
    data: &[u8],
    format: PixelFormat,
    geo: &Geometry,
    report: &mut ColorRangeReport,
) -> Result<SampleGrid, ConvertError> {
    let desc = format.descriptor().ok_or(ConvertError::NotRaw(format))?;
    let width = geo.width.get() as usize;
    let height = geo.height.get() as usize;
    let stride = geo.stride;
    let mut grid = SampleGrid::filled(width, height, desc.channels, desc.depth);

    match format {
        PixelFormat::U8 => fill_rows(&mut grid, |y, row| {
            let src = &data[y * stride..][..width];
            for (dst, b) in row.iter_mut().zip(src) {
                *dst = *b as f64;
            }
        }),
        PixelFormat::U16 => fill_rows(&mut grid, |y, row| {
            let src = &data[y * stride..][..width * 2];
            for (dst, b) in row.iter_mut().zip(src.chunks_exact(2)) {
                *dst = u16::from_le_bytes([b[0], b[1]]) as f64;
            }
        }),
        PixelFormat::U32 => fill_rows(&mut grid, |y, row| {
            let src = &data[y * stride..][..width * 4];
            for (dst, b) in row.iter_mut().zip(src.chunks_exact(4)) {
                *dst = u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64;
            }
        }),
        PixelFormat::F32 => fill_rows(&mut grid, |y, row| {
            let src = &data[y * stride..][..width * 4];
            for (dst, b) in row.iter_mut().zip(src.chunks_exact(4)) {
                *dst = f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64;
            }
        }),
        PixelFormat::Bgr => interleaved(&mut grid, data, stride, &[2, 1, 0]),
        PixelFormat::Rgb | PixelFormat::Yuv => interleaved(&mut grid, data, stride, &[0, 1, 2]),
        PixelFormat::Rgba => interleaved(&mut grid, data, stride, &[0, 1, 2, 3]),
        PixelFormat::Bgra => interleaved(&mut grid, data, stride, &[2, 1, 0, 3]),
        PixelFormat::Nv12 => semi_planar(&mut grid, data, geo, 0),
        PixelFormat::Nv21 => semi_planar(&mut grid, data, geo, 1),
        _ => return Err(ConvertError::NotRaw(format)),
    }

    if desc.channels > 1 {
        let ids: &[ChannelId] = if format.is_yuv() {
            &[ChannelId::Y, ChannelId::U, ChannelId::V]
        } else {
            &[ChannelId::R, ChannelId::G, ChannelId::B, ChannelId::A]
        };
        crate::record_channels(&grid, ids, report);
    }
    Ok(grid)
}

fn fill_rows<F>(grid: &mut SampleGrid, fill: F)
where
    F: Fn(usize, &mut [f64]) + Sync,
{
    let row_len = grid.row_len();
    grid.samples_mut()
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| fill(y, row));
}

/// Packed one-byte-per-sample rows; `order[c]` is the stored byte position
/// of canonical channel `c`.
fn interleaved(grid: &mut SampleGrid, data: &[u8], stride: usize, order: &[usize]) {
    let width = grid.width();
    let channels = grid.channels();
    fill_rows(grid, |y, row| {
        let src = &data[y * stride..][..width * channels];
        for (px, stored) in row
            .chunks_exact_mut(channels)
            .zip(src.chunks_exact(channels))
        {
            for (c, at) in order.iter().enumerate() {
                px[c] = stored[*at] as f64;
            }
        }
    });
}

/// Full-resolution luma plane followed by a half-height plane of interleaved
/// chroma pairs; `u_at` selects which half of each pair holds U.
fn semi_planar(grid: &mut SampleGrid, data: &[u8], geo: &Geometry, u_at: usize) {
    let width = grid.width();
    let stride = geo.stride;
    let chroma = &data[stride * geo.scanline..];
    let v_at = 1 - u_at;
    fill_rows(grid, |y, row| {
        let luma = &data[y * stride..][..width];
        let pairs = &chroma[(y / 2) * stride..][..width];
        for (x, px) in row.chunks_exact_mut(3).enumerate() {
            px[0] = luma[x] as f64;
            px[1] = pairs[2 * (x / 2) + u_at] as f64;
            px[2] = pairs[2 * (x / 2) + v_at] as f64;
        }
    });
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;

    fn geometry(width: u32, height: u32, stride: usize) -> Geometry {
        Geometry {
            width: NonZeroU32::new(width).unwrap(),
            height: NonZeroU32::new(height).unwrap(),
            stride,
            scanline: height as usize,
        }
    }

    #[test]
    fn u16_rows_skip_stride_padding() {
        let data = [
            1, 0, 2, 0, 0xEE, 0xEE, // row 0 + 2 padding bytes
            3, 0, 4, 0, 0xEE, 0xEE,
        ];
        let geo = geometry(2, 2, 6);
        let mut report = ColorRangeReport::default();
        let grid = unpack(&data, PixelFormat::U16, &geo, &mut report).unwrap();
        assert_eq!(grid.samples(), &[1.0, 2.0, 3.0, 4.0]);
        assert!(report.channels.is_empty());
    }

    #[test]
    fn bgr_bytes_land_in_canonical_order() {
        let data = [30, 20, 10, 60, 50, 40];
        let geo = geometry(2, 1, 6);
        let mut report = ColorRangeReport::default();
        let grid = unpack(&data, PixelFormat::Bgr, &geo, &mut report).unwrap();
        assert_eq!(grid.pixel(0, 0), &[10.0, 20.0, 30.0]);
        assert_eq!(grid.pixel(1, 0), &[40.0, 50.0, 60.0]);
        assert_eq!(
            report.range(ChannelId::R),
            Some(ChannelRange {
                min: 10.0,
                max: 40.0
            })
        );
        assert!(report.range(ChannelId::A).is_none());
    }

    #[test]
    fn bgra_keeps_alpha_last() {
        let data = [30, 20, 10, 99];
        let geo = geometry(1, 1, 4);
        let mut report = ColorRangeReport::default();
        let grid = unpack(&data, PixelFormat::Bgra, &geo, &mut report).unwrap();
        assert_eq!(grid.pixel(0, 0), &[10.0, 20.0, 30.0, 99.0]);
        assert_eq!(
            report.range(ChannelId::A),
            Some(ChannelRange {
                min: 99.0,
                max: 99.0
            })
        );
    }

    #[test]
    fn nv12_replicates_chroma_over_each_block() {
        let mut data = vec![10, 20, 30, 40]; // 2x2 luma
        data.extend_from_slice(&[100, 200]); // one U,V pair
        let geo = geometry(2, 2, 2);
        let mut report = ColorRangeReport::default();
        let grid = unpack(&data, PixelFormat::Nv12, &geo, &mut report).unwrap();
        for (x, y, luma) in [(0, 0, 10.0), (1, 0, 20.0), (0, 1, 30.0), (1, 1, 40.0)] {
            assert_eq!(grid.pixel(x, y), &[luma, 100.0, 200.0]);
        }
    }

    #[test]
    fn nv21_swaps_the_pair() {
        let mut data = vec![10, 20, 30, 40];
        data.extend_from_slice(&[100, 200]);
        let geo = geometry(2, 2, 2);
        let mut report = ColorRangeReport::default();
        let grid = unpack(&data, PixelFormat::Nv21, &geo, &mut report).unwrap();
        assert_eq!(grid.pixel(0, 0), &[10.0, 200.0, 100.0]);
        assert_eq!(
            report.range(ChannelId::U),
            Some(ChannelRange {
                min: 200.0,
                max: 200.0
            })
        );
    }

    #[test]
    fn f32_samples_decode_bitwise() {
        let mut data = Vec::new();
        for v in [0.0f32, 0.5, 1.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let geo = geometry(3, 1, 12);
        let mut report = ColorRangeReport::default();
        let grid = unpack(&data, PixelFormat::F32, &geo, &mut report).unwrap();
        assert_eq!(grid.samples(), &[0.0, 0.5, 1.0]);
    }
}
