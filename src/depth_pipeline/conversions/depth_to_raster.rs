use std::io::Write;
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::depth_pipeline::{
    canonicalize::{canonicalize, depth_stats, inspect, render_preview, ClampReport, DepthStats},
    common::error::{DepthError, Result},
    conversions::{
        output::write_atomically,
        types::{ConversionResult, InspectionReport},
    },
    extract::{
        DepthBuffer, DepthExtractor, ExrHdrcReader, HdrcReader, ImageRasterReader, RasterReader,
    },
    raster::{ConversionConfig, DepthRasterWriter, StandardRasterWriter},
};

pub struct DepthToRasterPipeline<H: HdrcReader, R: RasterReader, W: DepthRasterWriter> {
    extractor: DepthExtractor<H, R>,
    writer: W,
    config: ConversionConfig,
}

impl DepthToRasterPipeline<ExrHdrcReader, ImageRasterReader, StandardRasterWriter> {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            extractor: DepthExtractor::new(config.channel_priority.clone()),
            writer: StandardRasterWriter,
            config,
        }
    }
}

impl<H: HdrcReader, R: RasterReader, W: DepthRasterWriter> DepthToRasterPipeline<H, R, W> {
    pub fn with_custom(hdrc: H, raster: R, writer: W, config: ConversionConfig) -> Self {
        Self {
            extractor: DepthExtractor::with_custom(hdrc, raster, config.channel_priority.clone()),
            writer,
            config,
        }
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if width == 0 || height == 0 {
            return Err(DepthError::InvalidDimensions(width, height));
        }

        if let Some(max) = self.config.max_dimension {
            if width > max || height > max {
                warn!("Depth dimensions {}x{} exceed maximum {}", width, height, max);
                return Err(DepthError::InvalidDimensions(width, height));
            }
        }

        Ok(())
    }

    /// Sniffs and extracts `path`, then reports statistics and a unit guess.
    ///
    /// Nothing is written. The unit guess is advisory and has no influence on
    /// [`convert_file`](Self::convert_file).
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn inspect_file<P: AsRef<Path>>(&self, path: P) -> Result<InspectionReport> {
        let path = path.as_ref();
        let (sniffed, extraction) = self.extractor.extract_file(path)?;
        let inference = inspect(&extraction.buffer);

        info!(hint = %inference.hint, max = inference.stats.max, "Inspection complete");

        Ok(InspectionReport {
            path: path.to_path_buf(),
            kind: sniffed.kind(),
            extension: sniffed.extension(),
            extension_mismatch: sniffed.extension_disagrees(),
            detail: extraction.detail,
            inference,
        })
    }

    /// Canonicalizes `buffer` and encodes it into `output`.
    ///
    /// The buffer is treated as millimeters after multiplication by the
    /// configured scale, whatever the inspector would say about it.
    #[instrument(skip(self, buffer, output), fields(width = buffer.width(), height = buffer.height()))]
    pub fn convert(&self, buffer: &DepthBuffer, output: &mut dyn Write) -> Result<ClampReport> {
        self.config.validate()?;
        self.validate_dimensions(buffer.width(), buffer.height())?;

        let (canonical, report) = {
            let _span = tracing::info_span!("canonicalize", scale = self.config.scale).entered();
            canonicalize(buffer, self.config.scale)
        };

        if report.ceiling_clamped > 0 {
            warn!(
                "{} of {} samples exceeded {} after scaling by {} and were clamped; check the unit assumption",
                report.ceiling_clamped,
                canonical.data.len(),
                u16::MAX,
                self.config.scale
            );
        }
        if report.all_floor_clamped(canonical.data.len()) {
            warn!(
                "All {} samples were negative after scaling by {} and are stored as 0",
                report.floor_clamped,
                self.config.scale
            );
        } else if report.floor_clamped > 0 {
            debug!("{} negative samples clamped to 0", report.floor_clamped);
        }
        if report.non_finite > 0 {
            warn!("{} NaN samples written as 0", report.non_finite);
        }

        {
            let _span = tracing::info_span!("encode", format = ?self.config.output_format).entered();
            self.writer.write_depth(&canonical, output, &self.config)?;
        }

        Ok(report)
    }

    /// Converts one file to a canonical 16-bit millimeter raster.
    ///
    /// The raster is encoded fully in memory and then moved into place, so a
    /// failed conversion never leaves a partial `output_path` behind.
    #[instrument(skip(self, input_path, output_path))]
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<ConversionResult> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        info!(
            input = %input_path.display(),
            output = %output_path.display(),
            "Converting file"
        );

        let (sniffed, extraction) = self.extractor.extract_file(input_path)?;
        let buffer = extraction.buffer;

        let mut encoded = Vec::new();
        let clamp = self.convert(&buffer, &mut encoded)?;

        {
            let _span = tracing::info_span!("persist").entered();
            write_atomically(output_path, &encoded)?;
        }

        let result = ConversionResult {
            source: input_path.to_path_buf(),
            output: output_path.to_path_buf(),
            kind: sniffed.kind(),
            width: buffer.width(),
            height: buffer.height(),
            clamp,
        };

        info!(
            width = result.width,
            height = result.height,
            min = result.clamp.post_min,
            max = result.clamp.post_max,
            "Conversion complete"
        );
        Ok(result)
    }

    /// Writes a min-max normalized 8-bit preview of `input_path`.
    pub fn preview_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<DepthStats> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        let (_, extraction) = self.extractor.extract_file(input_path)?;
        let stats = depth_stats(&extraction.buffer);
        let preview = render_preview(&extraction.buffer);

        let mut encoded = Vec::new();
        self.writer.write_preview(&preview, &mut encoded)?;
        write_atomically(output_path, &encoded)?;

        info!(output = %output_path.display(), "Preview written");
        Ok(stats)
    }

    pub fn extractor(&self) -> &DepthExtractor<H, R> {
        &self.extractor
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ConversionConfig) {
        self.extractor.set_priority(config.channel_priority.clone());
        self.config = config;
    }
}
