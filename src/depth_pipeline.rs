//! Depth map pipeline module
//!
//! Content-based format detection, depth extraction, unit inspection and
//! canonical 16-bit millimeter conversion, with separate modules for each
//! stage and a conversion orchestrator on top.

pub mod common;
pub mod sniff;
pub mod extract;
pub mod canonicalize;
pub mod raster;
pub mod conversions;

#[cfg(test)]
pub(crate) mod test_support;

pub use common::{
    DepthError,
    Result,
};

pub use sniff::{
    classify,
    ContainerKind,
    SniffedFile,
    HDRC_MAGIC,
};

pub use extract::{
    ChannelCatalog,
    ChannelPriority,
    ChannelReduction,
    ChannelSelection,
    DataWindow,
    DepthBuffer,
    DepthExtractor,
    DepthSamples,
    Extraction,
    ExrHdrcReader,
    HdrcReader,
    ImageRasterReader,
    RasterReader,
    SampleType,
    SelectionRule,
    SourceDetail,
    UnavailableHdrcReader,
};

pub use canonicalize::{
    canonicalize,
    depth_stats,
    inspect,
    render_preview,
    CanonicalDepth,
    ClampReport,
    DepthStats,
    PreviewImage,
    UnitHint,
    UnitInference,
};

pub use raster::{
    ConversionConfig,
    ConversionConfigBuilder,
    DepthRasterWriter,
    OutputFormat,
    StandardRasterWriter,
    TiffCompression,
};

pub use conversions::{
    BatchFailure,
    BatchReport,
    ConversionResult,
    DepthToRasterPipeline,
    InspectionReport,
    collect_hdrc_candidates,
    default_output_path,
};
