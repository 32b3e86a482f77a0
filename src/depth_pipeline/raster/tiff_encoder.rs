use std::io::Cursor;

use tiff::encoder::{colortype::Gray16, compression::DeflateLevel, Compression, TiffEncoder};
use tiff::tags::Predictor;

use crate::depth_pipeline::common::error::{DepthError, Result};
use crate::depth_pipeline::raster::types::{ConversionConfig, TiffCompression};

/// 16-bit single channel TIFF with the configured compression.
pub fn encode_gray16(width: usize, height: usize, data: &[u16], config: &ConversionConfig) -> Result<Vec<u8>> {
    let (w, h) = match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(DepthError::InvalidDimensions(width, height)),
    };

    let mut buffer = Vec::new();

    let compression = match config.compression {
        TiffCompression::None => Compression::Uncompressed,
        TiffCompression::Lzw => Compression::Lzw,
        TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
        TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
        TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
    };

    let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
        .map_err(|e| DepthError::Encode(e.to_string()))?
        .with_compression(compression);

    if let Some(predictor_val) = config.predictor {
        let predictor = match predictor_val {
            2 => Predictor::Horizontal,
            _ => Predictor::None,
        };
        encoder = encoder.with_predictor(predictor);
    }

    encoder
        .write_image::<Gray16>(w, h, data)
        .map_err(|e| DepthError::Encode(e.to_string()))?;

    Ok(buffer)
}
