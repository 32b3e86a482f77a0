//! Directory batch conversion.
//!
//! Every file runs the full single-file pipeline on its own; nothing is shared
//! between files except the read-only pipeline configuration. With the
//! `parallel` feature the files are spread over the rayon pool, otherwise they
//! run one after another. Either way the report lists files in lexicographic
//! order.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info, warn};

use crate::depth_pipeline::{
    common::error::{DepthError, Result},
    conversions::{
        depth_to_raster::DepthToRasterPipeline,
        output::default_output_path,
        types::{BatchFailure, BatchReport, ConversionResult},
    },
    extract::{HdrcReader, RasterReader},
    raster::DepthRasterWriter,
    sniff::has_hdrc_extension,
};

/// Regular files in `dir` with an `.exr` extension (any case), sorted by name.
pub fn collect_hdrc_candidates(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| DepthError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| DepthError::io(dir, e))?.path();
        if path.is_file() && has_hdrc_extension(&path) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

struct Job {
    input: PathBuf,
    output: PathBuf,
    /// Earlier source already writing to `output`
    claimed_by: Option<PathBuf>,
}

enum Outcome {
    Converted(ConversionResult),
    Failed(BatchFailure),
    Skipped(PathBuf),
}

impl<H: HdrcReader, R: RasterReader, W: DepthRasterWriter> DepthToRasterPipeline<H, R, W> {
    /// Converts every `.exr` file in `input_dir`.
    ///
    /// Outputs go to `output_dir` when given, otherwise next to each source.
    /// Only an invalid configuration, an unreadable `input_dir` or an
    /// uncreatable `output_dir` fails the call; per-file errors are collected
    /// in the report.
    pub fn run_batch(&self, input_dir: &Path, output_dir: Option<&Path>) -> Result<BatchReport> {
        self.run_batch_with_cancel(input_dir, output_dir, &AtomicBool::new(false))
    }

    /// Like [`run_batch`](Self::run_batch), checking `cancel` before each file.
    ///
    /// A file already in progress always finishes. Files not started once
    /// `cancel` is set are reported as skipped.
    pub fn run_batch_with_cancel(
        &self,
        input_dir: &Path,
        output_dir: Option<&Path>,
        cancel: &AtomicBool,
    ) -> Result<BatchReport> {
        self.config().validate()?;

        if !input_dir.is_dir() {
            return Err(DepthError::io(
                input_dir,
                io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            ));
        }

        let files = collect_hdrc_candidates(input_dir)?;
        if files.is_empty() {
            warn!("No .exr files found in {}", input_dir.display());
            return Ok(BatchReport::default());
        }

        if let Some(out) = output_dir {
            fs::create_dir_all(out).map_err(|e| DepthError::io(out, e))?;
        }

        info!("Found {} OpenEXR files in {}", files.len(), input_dir.display());

        // Sources differing only in extension case share an output name; the
        // first in sorted order keeps it and later ones fail
        let format = self.config().output_format;
        let mut claimed: HashMap<PathBuf, &PathBuf> = HashMap::new();
        let jobs: Vec<Job> = files
            .iter()
            .map(|path| {
                let output = default_output_path(path, output_dir, format);
                let claimed_by = claimed.get(&output).map(|first| (*first).clone());
                if claimed_by.is_none() {
                    claimed.insert(output.clone(), path);
                }
                Job {
                    input: path.clone(),
                    output,
                    claimed_by,
                }
            })
            .collect();

        let process = |job: &Job| -> Outcome {
            if let Some(first) = &job.claimed_by {
                let error = DepthError::OutputCollision {
                    path: job.input.clone(),
                    output: job.output.clone(),
                    claimed_by: first.clone(),
                };
                error!(path = %job.input.display(), "{}", error);
                return Outcome::Failed(BatchFailure {
                    path: job.input.clone(),
                    error,
                });
            }

            if cancel.load(Ordering::Relaxed) {
                return Outcome::Skipped(job.input.clone());
            }

            match self.convert_file(&job.input, &job.output) {
                Ok(result) => Outcome::Converted(result),
                Err(error) => {
                    error!(path = %job.input.display(), "Conversion failed: {}", error);
                    Outcome::Failed(BatchFailure {
                        path: job.input.clone(),
                        error,
                    })
                }
            }
        };

        #[cfg(feature = "parallel")]
        let outcomes: Vec<Outcome> = {
            use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
            jobs.par_iter().map(process).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<Outcome> = jobs.iter().map(process).collect();

        let mut report = BatchReport::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Converted(result) => report.successes.push(result),
                Outcome::Failed(failure) => report.failures.push(failure),
                Outcome::Skipped(path) => report.skipped.push(path),
            }
        }

        info!(
            converted = report.successes.len(),
            failed = report.failures.len(),
            skipped = report.skipped.len(),
            "Batch complete"
        );
        Ok(report)
    }
}
