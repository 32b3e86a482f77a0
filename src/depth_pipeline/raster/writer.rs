use std::io::Write;

use crate::depth_pipeline::canonicalize::{CanonicalDepth, PreviewImage};
use crate::depth_pipeline::common::error::Result;
use crate::depth_pipeline::raster::types::ConversionConfig;

pub trait DepthRasterWriter: Send + Sync {
    fn write_depth(&self, depth: &CanonicalDepth, output: &mut dyn Write, config: &ConversionConfig) -> Result<()>;
    fn write_preview(&self, preview: &PreviewImage, output: &mut dyn Write) -> Result<()>;
}
