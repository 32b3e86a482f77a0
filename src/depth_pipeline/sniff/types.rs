//! Sniffing result types

use std::fmt;
use std::path::{Path, PathBuf};

/// Extension conventionally used by OpenEXR depth captures.
pub const HDRC_EXTENSION: &str = "exr";

/// Binary container family of a depth file, derived from content only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// OpenEXR high-dynamic-range container
    Hdrc,
    /// Anything a generic image reader should handle (PNG, TIFF, ...)
    ConventionalRaster,
}

impl ContainerKind {
    /// Whether `path`'s extension is the one this kind normally carries.
    ///
    /// Conventional rasters accept any extension except the HDRC one.
    pub fn matches_extension(&self, path: &Path) -> bool {
        let is_hdrc_ext = has_hdrc_extension(path);
        match self {
            ContainerKind::Hdrc => is_hdrc_ext,
            ContainerKind::ConventionalRaster => !is_hdrc_ext,
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Hdrc => write!(f, "OpenEXR"),
            ContainerKind::ConventionalRaster => write!(f, "conventional raster"),
        }
    }
}

/// Case-insensitive check for the `.exr` extension.
pub fn has_hdrc_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(HDRC_EXTENSION))
}

/// A path together with the leading bytes read for classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SniffedFile {
    path: PathBuf,
    magic: [u8; 4],
}

impl SniffedFile {
    pub(crate) fn new(path: PathBuf, magic: [u8; 4]) -> Self {
        Self { path, magic }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn magic(&self) -> [u8; 4] {
        self.magic
    }

    pub fn kind(&self) -> ContainerKind {
        if self.magic == super::HDRC_MAGIC {
            ContainerKind::Hdrc
        } else {
            ContainerKind::ConventionalRaster
        }
    }

    /// Extension as written on disk, lowercased, or an empty string.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default()
    }

    pub fn extension_disagrees(&self) -> bool {
        !self.kind().matches_extension(&self.path)
    }
}
