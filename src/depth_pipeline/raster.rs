//! Raster writing module
//!
//! Encodes canonical depth as 16-bit grayscale PNG or TIFF, and previews as
//! 8-bit grayscale PNG.

mod writer;
mod png_encoder;
mod tiff_encoder;
mod standard_writer;
pub mod types;

pub use writer::DepthRasterWriter;
pub use standard_writer::StandardRasterWriter;
pub use types::{ConversionConfig, ConversionConfigBuilder, OutputFormat, TiffCompression};
