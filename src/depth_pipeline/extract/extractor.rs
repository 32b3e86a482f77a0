use std::path::Path;

use tracing::{info, instrument};

use crate::depth_pipeline::{
    common::error::{DepthError, Result},
    extract::{
        reader::{HdrcReader, RasterReader},
        types::{ChannelPriority, Extraction},
        ExrHdrcReader, ImageRasterReader,
    },
    sniff::{sniff, ContainerKind, SniffedFile},
};

/// Dispatches a classified file to the matching reader.
pub struct DepthExtractor<H: HdrcReader, R: RasterReader> {
    hdrc: H,
    raster: R,
    priority: ChannelPriority,
}

impl DepthExtractor<ExrHdrcReader, ImageRasterReader> {
    pub fn new(priority: ChannelPriority) -> Self {
        Self {
            hdrc: ExrHdrcReader,
            raster: ImageRasterReader,
            priority,
        }
    }
}

impl Default for DepthExtractor<ExrHdrcReader, ImageRasterReader> {
    fn default() -> Self {
        Self::new(ChannelPriority::default())
    }
}

impl<H: HdrcReader, R: RasterReader> DepthExtractor<H, R> {
    pub fn with_custom(hdrc: H, raster: R, priority: ChannelPriority) -> Self {
        Self {
            hdrc,
            raster,
            priority,
        }
    }

    pub fn priority(&self) -> &ChannelPriority {
        &self.priority
    }

    pub fn set_priority(&mut self, priority: ChannelPriority) {
        self.priority = priority;
    }

    /// Decodes in-memory file contents of an already classified file.
    pub fn extract_bytes(&self, path: &Path, data: &[u8], kind: ContainerKind) -> Result<Extraction> {
        match kind {
            ContainerKind::Hdrc => self.hdrc.read_hdrc(path, data, &self.priority),
            ContainerKind::ConventionalRaster => self.raster.read_raster(path, data),
        }
    }

    /// Reads `path` and decodes it according to `kind`.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn extract<P: AsRef<Path>>(&self, path: P, kind: ContainerKind) -> Result<Extraction> {
        let path = path.as_ref();

        let data = {
            let _span = tracing::info_span!("read_input_file").entered();
            std::fs::read(path).map_err(|e| DepthError::io(path, e))?
        };

        let extraction = self.extract_bytes(path, &data, kind)?;

        info!(
            width = extraction.buffer.width(),
            height = extraction.buffer.height(),
            dtype = %extraction.buffer.sample_type(),
            "Extracted depth buffer"
        );
        Ok(extraction)
    }

    /// Sniffs, then extracts along the path the content calls for.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<(SniffedFile, Extraction)> {
        let path = path.as_ref();
        let sniffed = {
            let _span = tracing::info_span!("sniff").entered();
            sniff(path)?
        };
        let extraction = self.extract(path, sniffed.kind())?;
        Ok((sniffed, extraction))
    }
}
