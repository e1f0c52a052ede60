//! Container images (JPEG/PNG/BMP) in and out of a sample grid, through
//! the `image` crate.

use image::GenericImageView;
use repix_core::prelude::*;

use crate::ConvertError;

/// Decodes any supported container into a grid at its native channel
/// count and depth. Unrecognized layouts flatten to 8-bit RGBA.
pub fn decode(data: &[u8]) -> Result<SampleGrid, ConvertError> {
    let image = image::load_from_memory(data).map_err(|e| ConvertError::Decode(e.to_string()))?;
    let (width, height) = image.dimensions();
    Ok(match image {
        image::DynamicImage::ImageLuma8(img) => {
            grid_from(img.into_raw(), width, height, 1, SampleDepth::U8)
        }
        image::DynamicImage::ImageLumaA8(img) => {
            grid_from(img.into_raw(), width, height, 2, SampleDepth::U8)
        }
        image::DynamicImage::ImageRgb8(img) => {
            grid_from(img.into_raw(), width, height, 3, SampleDepth::U8)
        }
        image::DynamicImage::ImageRgba8(img) => {
            grid_from(img.into_raw(), width, height, 4, SampleDepth::U8)
        }
        image::DynamicImage::ImageLuma16(img) => {
            grid_from(img.into_raw(), width, height, 1, SampleDepth::U16)
        }
        image::DynamicImage::ImageLumaA16(img) => {
            grid_from(img.into_raw(), width, height, 2, SampleDepth::U16)
        }
        image::DynamicImage::ImageRgb16(img) => {
            grid_from(img.into_raw(), width, height, 3, SampleDepth::U16)
        }
        image::DynamicImage::ImageRgba16(img) => {
            grid_from(img.into_raw(), width, height, 4, SampleDepth::U16)
        }
        image::DynamicImage::ImageRgb32F(img) => {
            grid_from(img.into_raw(), width, height, 3, SampleDepth::F32)
        }
        image::DynamicImage::ImageRgba32F(img) => {
            grid_from(img.into_raw(), width, height, 4, SampleDepth::F32)
        }
        other => grid_from(other.into_rgba8().into_raw(), width, height, 4, SampleDepth::U8),
    })
}

/// Encodes the grid into `format`'s byte stream.
///
/// PNG keeps 16-bit precision for a 16-bit single-channel source; JPEG
/// cannot carry alpha, so 4-channel grids flatten to RGB first.
pub fn encode(grid: &SampleGrid, format: PixelFormat) -> Result<Vec<u8>, ConvertError> {
    let target = match format {
        PixelFormat::Jpg => image::ImageFormat::Jpeg,
        PixelFormat::Png => image::ImageFormat::Png,
        PixelFormat::Bmp => image::ImageFormat::Bmp,
        other => {
            return Err(ConvertError::Encode(format!(
                "'{other}' is not a container format"
            )));
        }
    };
    let (width, height) = (grid.width(), grid.height());
    let image: image::DynamicImage = match (grid.channels(), grid.depth()) {
        (1, SampleDepth::U16) if format == PixelFormat::Png => {
            let data = grid
                .samples()
                .iter()
                .map(|&v| (v * 256.0).round().clamp(0.0, 65_535.0) as u16)
                .collect();
            buffer::<image::Luma<u16>>(width, height, data)?.into()
        }
        (1, _) => {
            let data = grid.samples().iter().map(|&v| clamp_u8(v)).collect();
            buffer::<image::Luma<u8>>(width, height, data)?.into()
        }
        (3, _) => {
            let data = grid.samples().iter().map(|&v| clamp_u8(v)).collect();
            buffer::<image::Rgb<u8>>(width, height, data)?.into()
        }
        (4, _) if format == PixelFormat::Jpg => {
            let data = grid
                .samples()
                .chunks_exact(4)
                .flat_map(|px| [clamp_u8(px[0]), clamp_u8(px[1]), clamp_u8(px[2])])
                .collect();
            buffer::<image::Rgb<u8>>(width, height, data)?.into()
        }
        (4, _) => {
            let data = grid.samples().iter().map(|&v| clamp_u8(v)).collect();
            buffer::<image::Rgba<u8>>(width, height, data)?.into()
        }
        (n, _) => {
            return Err(ConvertError::Encode(format!(
                "cannot encode a {n}-channel image"
            )));
        }
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, target)
        .map_err(|e| ConvertError::Encode(e.to_string()))?;
    Ok(cursor.into_inner())
}

fn grid_from<T>(raw: Vec<T>, width: u32, height: u32, channels: usize, depth: SampleDepth) -> SampleGrid
where
    T: Into<f64> + Copy,
{
    let samples = raw.iter().map(|&v| v.into()).collect();
    SampleGrid::new(width as usize, height as usize, channels, depth, samples)
}

fn buffer<P>(
    width: usize,
    height: usize,
    data: Vec<P::Subpixel>,
) -> Result<image::ImageBuffer<P, Vec<P::Subpixel>>, ConvertError>
where
    P: image::Pixel,
{
    image::ImageBuffer::from_raw(width as u32, height as u32, data)
        .ok_or_else(|| ConvertError::Encode("pixel buffer size mismatch".into()))
}

#[inline(always)]
fn clamp_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
