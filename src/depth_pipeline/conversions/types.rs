//! Conversion outcome types

use std::fmt;
use std::path::PathBuf;

use crate::depth_pipeline::canonicalize::{ClampReport, UnitInference};
use crate::depth_pipeline::common::error::DepthError;
use crate::depth_pipeline::extract::types::SourceDetail;
use crate::depth_pipeline::sniff::ContainerKind;

/// Outcome of converting one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub source: PathBuf,
    pub output: PathBuf,
    pub kind: ContainerKind,
    pub width: usize,
    pub height: usize,
    pub clamp: ClampReport,
}

impl fmt::Display for ConversionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({}x{}, scaled range {:.2}..{:.2}, stored {}..{}, {} clamped at ceiling, {} clamped at 0)",
            self.source.display(),
            self.output.display(),
            self.width,
            self.height,
            self.clamp.pre_min,
            self.clamp.pre_max,
            self.clamp.post_min,
            self.clamp.post_max,
            self.clamp.ceiling_clamped,
            self.clamp.floor_clamped
        )
    }
}

/// Outcome of inspecting one file.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectionReport {
    pub path: PathBuf,
    pub kind: ContainerKind,
    pub extension: String,
    pub extension_mismatch: bool,
    pub detail: SourceDetail,
    pub inference: UnitInference,
}

impl fmt::Display for InspectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "path: {}", self.path.display())?;
        write!(f, "container: {}", self.kind)?;
        if self.extension_mismatch {
            write!(f, " (named '.{}', decoded by content)", self.extension)?;
        }
        writeln!(f)?;

        match &self.detail {
            SourceDetail::Hdrc {
                catalog,
                selection,
                data_window,
            } => {
                writeln!(f, "channels: {:?}", catalog.names())?;
                writeln!(f, "selected channel: {} ({:?})", selection.name, selection.rule)?;
                writeln!(
                    f,
                    "data window: ({}, {}) - ({}, {})",
                    data_window.min_x, data_window.min_y, data_window.max_x, data_window.max_y
                )?;
            }
            SourceDetail::Raster {
                color_type,
                reduction,
            } => {
                writeln!(f, "color type: {}", color_type)?;
                if let Some(reduction) = reduction {
                    writeln!(
                        f,
                        "reduced: {} channels -> channel {} (first-channel policy, not a color-to-depth conversion)",
                        reduction.original_channels, reduction.kept_channel
                    )?;
                }
            }
        }

        write!(f, "{}", self.inference)
    }
}

/// A file the batch driver could not convert.
#[derive(Debug)]
pub struct BatchFailure {
    pub path: PathBuf,
    pub error: DepthError,
}

/// Per-file outcomes of a batch run, in lexicographic file order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub successes: Vec<ConversionResult>,
    pub failures: Vec<BatchFailure>,
    /// Files not started because the run was cancelled
    pub skipped: Vec<PathBuf>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len() + self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn cancelled(&self) -> bool {
        !self.skipped.is_empty()
    }
}
