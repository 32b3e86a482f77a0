use std::path::Path;

use crate::depth_pipeline::common::error::Result;
use crate::depth_pipeline::extract::types::{ChannelPriority, Extraction};

/// Decodes HDR containers. `path` is only used to label errors and logs.
pub trait HdrcReader: Send + Sync {
    fn read_hdrc(&self, path: &Path, data: &[u8], priority: &ChannelPriority) -> Result<Extraction>;
}

/// Decodes conventional rasters at their native bit depth.
pub trait RasterReader: Send + Sync {
    fn read_raster(&self, path: &Path, data: &[u8]) -> Result<Extraction>;
}
