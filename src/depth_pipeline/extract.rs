//! Depth extraction module
//!
//! Turns a classified file into a single-channel [`DepthBuffer`]. OpenEXR
//! decoding is an optional capability behind the `exr` cargo feature.

mod reader;
mod raster_reader;
mod extractor;
pub mod types;

#[cfg(feature = "exr")]
mod exr_reader;


pub use reader::{HdrcReader, RasterReader};
pub use raster_reader::ImageRasterReader;
pub use extractor::DepthExtractor;
pub use types::{
    ChannelCatalog, ChannelPriority, ChannelReduction, ChannelSelection, DataWindow, DepthBuffer,
    DepthSamples, Extraction, SampleType, SelectionRule, SourceDetail,
};

#[cfg(feature = "exr")]
pub use exr_reader::ExrHdrcReader;

/// HDR container reader for builds without OpenEXR support.
///
/// Every HDRC file fails fast with `CapabilityUnavailable`; conventional
/// rasters are unaffected.
pub struct UnavailableHdrcReader;

impl HdrcReader for UnavailableHdrcReader {
    fn read_hdrc(
        &self,
        path: &std::path::Path,
        _data: &[u8],
        _priority: &ChannelPriority,
    ) -> crate::depth_pipeline::Result<Extraction> {
        Err(crate::depth_pipeline::DepthError::CapabilityUnavailable {
            path: path.to_path_buf(),
            capability: "OpenEXR",
        })
    }
}

#[cfg(not(feature = "exr"))]
pub use UnavailableHdrcReader as ExrHdrcReader;
