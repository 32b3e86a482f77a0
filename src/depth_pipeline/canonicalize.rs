//! Unit inspection and canonical conversion
//!
//! The inspector only advises; the converter never consults it. Conversion
//! always treats samples as millimeters after applying the caller's scale.

mod inspect;
mod convert;
mod preview;

#[cfg(test)]
mod tests;

pub use inspect::{depth_stats, inspect, DepthStats, UnitHint, UnitInference};
pub use convert::{canonicalize, CanonicalDepth, ClampReport, DEPTH_CEILING};
pub use preview::{render_preview, PreviewImage};
