use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, Luma};

use crate::depth_pipeline::common::error::{DepthError, Result};

fn dims(width: usize, height: usize) -> Result<(u32, u32)> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(DepthError::InvalidDimensions(width, height)),
    }
}

fn encode(image: DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| DepthError::Encode(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// Lossless 16-bit single channel PNG.
pub fn encode_gray16(width: usize, height: usize, data: &[u16]) -> Result<Vec<u8>> {
    let (w, h) = dims(width, height)?;
    let image = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w, h, data.to_vec())
        .ok_or(DepthError::InvalidDimensions(width, height))?;
    encode(DynamicImage::ImageLuma16(image))
}

pub fn encode_gray8(width: usize, height: usize, data: &[u8]) -> Result<Vec<u8>> {
    let (w, h) = dims(width, height)?;
    let image = GrayImage::from_raw(w, h, data.to_vec())
        .ok_or(DepthError::InvalidDimensions(width, height))?;
    encode(DynamicImage::ImageLuma8(image))
}
