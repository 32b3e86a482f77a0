//! Pipeline conversions module
//!
//! Orchestrates sniff, extract, canonicalize and persist for single files and
//! whole directories.

mod depth_to_raster;
mod batch;
mod output;
pub mod types;

#[cfg(test)]
mod tests;

pub use depth_to_raster::DepthToRasterPipeline;
pub use batch::collect_hdrc_candidates;
pub use output::{default_output_path, write_atomically};
pub use types::{BatchFailure, BatchReport, ConversionResult, InspectionReport};
