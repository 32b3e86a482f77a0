use std::io::Write;

use tracing::debug;

use crate::depth_pipeline::canonicalize::{CanonicalDepth, PreviewImage};
use crate::depth_pipeline::common::error::{DepthError, Result};
use crate::depth_pipeline::raster::types::{ConversionConfig, OutputFormat};
use crate::depth_pipeline::raster::writer::DepthRasterWriter;
use crate::depth_pipeline::raster::{png_encoder, tiff_encoder};

/// Writes PNG through `image` and TIFF through `tiff`.
///
/// The whole file is encoded in memory before anything reaches `output`.
pub struct StandardRasterWriter;

impl DepthRasterWriter for StandardRasterWriter {
    fn write_depth(&self, depth: &CanonicalDepth, output: &mut dyn Write, config: &ConversionConfig) -> Result<()> {
        debug!(
            "Encoding {:?} depth raster: {}x{}",
            config.output_format, depth.width, depth.height
        );

        let buffer = match config.output_format {
            OutputFormat::Png => png_encoder::encode_gray16(depth.width, depth.height, &depth.data)?,
            OutputFormat::Tiff => tiff_encoder::encode_gray16(depth.width, depth.height, &depth.data, config)?,
        };

        output.write_all(&buffer).map_err(|e| DepthError::Encode(e.to_string()))?;

        debug!("Raster encoding complete, {} bytes", buffer.len());
        Ok(())
    }

    fn write_preview(&self, preview: &PreviewImage, output: &mut dyn Write) -> Result<()> {
        let buffer = png_encoder::encode_gray8(preview.width, preview.height, &preview.data)?;
        output.write_all(&buffer).map_err(|e| DepthError::Encode(e.to_string()))?;
        Ok(())
    }
}
