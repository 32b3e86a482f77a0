//! Conventional raster reader implementation.
//!
//! The container format is guessed from content, never from the file name,
//! and samples keep their native bit depth. TIFF goes through the `tiff`
//! decoder so float planes survive; everything else goes through `image`.
//! Multi-channel images are reduced to their first channel.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::ColorType;
use tracing::{debug, warn};

use crate::depth_pipeline::common::error::{DepthError, Result};
use crate::depth_pipeline::extract::reader::RasterReader;
use crate::depth_pipeline::extract::types::{
    ChannelReduction, DepthBuffer, DepthSamples, Extraction, SourceDetail,
};

/// Raster reader for PNG, TIFF and the other formats `image` understands.
pub struct ImageRasterReader;

/// Takes every `stride`-th sample starting at channel 0.
fn first_channel<T: Copy>(interleaved: &[T], stride: usize) -> Vec<T> {
    interleaved.iter().step_by(stride).copied().collect()
}

/// Single-plane samples plus what the source looked like.
struct Decoded {
    width: usize,
    height: usize,
    channels: usize,
    samples: DepthSamples,
    color_type: String,
}

fn decode_error(path: &Path, e: impl ToString) -> DepthError {
    DepthError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// Interleaved channel count of a TIFF color type we know how to reduce.
fn tiff_channels(color: ColorType) -> Option<usize> {
    match color {
        ColorType::Gray(_) => Some(1),
        ColorType::GrayA(_) => Some(2),
        ColorType::RGB(_) => Some(3),
        ColorType::RGBA(_) => Some(4),
        ColorType::Multiband { num_samples, .. } => Some(usize::from(num_samples)),
        _ => None,
    }
}

fn read_tiff(path: &Path, data: &[u8]) -> Result<Decoded> {
    let mut decoder = Decoder::new(Cursor::new(data)).map_err(|e| decode_error(path, e))?;
    let (width, height) = decoder.dimensions().map_err(|e| decode_error(path, e))?;
    let color = decoder.colortype().map_err(|e| decode_error(path, e))?;
    let (width, height) = (width as usize, height as usize);

    let unsupported = |reason: String| DepthError::UnsupportedShape {
        path: path.to_path_buf(),
        reason,
    };

    let channels = tiff_channels(color)
        .filter(|&c| c > 0)
        .ok_or_else(|| unsupported(format!("cannot reduce TIFF color type {:?} to one channel", color)))?;

    debug!("Decoding TIFF: {}x{} {:?}", width, height, color);

    let image = decoder.read_image().map_err(|e| decode_error(path, e))?;

    // Whole-valued integer planes widen to f64 without loss
    let samples = match image {
        DecodingResult::U8(v) => DepthSamples::U8(first_channel(&v[..], channels)),
        DecodingResult::U16(v) => DepthSamples::U16(first_channel(&v[..], channels)),
        DecodingResult::F32(v) => DepthSamples::F32(first_channel(&v[..], channels)),
        DecodingResult::F64(v) => DepthSamples::F64(first_channel(&v[..], channels)),
        DecodingResult::U32(v) => {
            DepthSamples::F64(first_channel(&v[..], channels).into_iter().map(f64::from).collect())
        }
        DecodingResult::I16(v) => {
            DepthSamples::F64(first_channel(&v[..], channels).into_iter().map(f64::from).collect())
        }
        DecodingResult::I32(v) => {
            DepthSamples::F64(first_channel(&v[..], channels).into_iter().map(f64::from).collect())
        }
        _ => {
            return Err(unsupported(format!(
                "TIFF sample format of {:?} is not supported",
                color
            )));
        }
    };

    if samples.len() != width * height {
        return Err(unsupported(format!(
            "{:?} plane holds {} samples, expected {}",
            color,
            samples.len(),
            width * height
        )));
    }

    Ok(Decoded {
        width,
        height,
        channels,
        samples,
        color_type: format!("TIFF {:?}", color),
    })
}

fn read_dynamic(path: &Path, image: DynamicImage) -> Result<Decoded> {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let color = image.color();
    let channels = usize::from(color.channel_count());

    debug!("Decoded raster: {}x{} {:?}", width, height, color);

    let samples = match image {
        DynamicImage::ImageLuma8(buf) => DepthSamples::U8(buf.into_raw()),
        DynamicImage::ImageLumaA8(buf) => DepthSamples::U8(first_channel(buf.as_raw(), 2)),
        DynamicImage::ImageRgb8(buf) => DepthSamples::U8(first_channel(buf.as_raw(), 3)),
        DynamicImage::ImageRgba8(buf) => DepthSamples::U8(first_channel(buf.as_raw(), 4)),
        DynamicImage::ImageLuma16(buf) => DepthSamples::U16(buf.into_raw()),
        DynamicImage::ImageLumaA16(buf) => DepthSamples::U16(first_channel(buf.as_raw(), 2)),
        DynamicImage::ImageRgb16(buf) => DepthSamples::U16(first_channel(buf.as_raw(), 3)),
        DynamicImage::ImageRgba16(buf) => DepthSamples::U16(first_channel(buf.as_raw(), 4)),
        DynamicImage::ImageRgb32F(buf) => DepthSamples::F32(first_channel(buf.as_raw(), 3)),
        DynamicImage::ImageRgba32F(buf) => DepthSamples::F32(first_channel(buf.as_raw(), 4)),
        other => {
            return Err(DepthError::UnsupportedShape {
                path: path.to_path_buf(),
                reason: format!("cannot reduce color type {:?} to one channel", other.color()),
            });
        }
    };

    Ok(Decoded {
        width,
        height,
        channels,
        samples,
        color_type: format!("{:?}", color),
    })
}

impl RasterReader for ImageRasterReader {
    fn read_raster(&self, path: &Path, data: &[u8]) -> Result<Extraction> {
        debug!("Decoding raster image, {} bytes", data.len());

        let decoded = if image::guess_format(data).ok() == Some(ImageFormat::Tiff) {
            read_tiff(path, data)?
        } else {
            let image = ImageReader::new(Cursor::new(data))
                .with_guessed_format()
                .map_err(|e| DepthError::io(path, e))?
                .decode()
                .map_err(|e| decode_error(path, e))?;
            read_dynamic(path, image)?
        };
        let channels = decoded.channels;

        let reduction = (channels > 1).then(|| {
            warn!(
                "{} has {} channels; keeping channel 0 only (policy reduction, not a color-to-depth conversion)",
                path.display(),
                channels
            );
            ChannelReduction {
                original_channels: channels,
                kept_channel: 0,
            }
        });

        let buffer = DepthBuffer::new(decoded.width, decoded.height, decoded.samples)?
            .with_source_channels(channels);

        Ok(Extraction {
            buffer,
            detail: SourceDetail::Raster {
                color_type: decoded.color_type,
                reduction,
            },
        })
    }
}
