//! Depth extraction data types

use std::fmt;

use crate::depth_pipeline::common::error::{DepthError, Result};

/// Element type of a decoded depth buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    U8,
    U16,
    F32,
    F64,
}

impl SampleType {
    pub fn is_float(&self) -> bool {
        matches!(self, SampleType::F32 | SampleType::F64)
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleType::U8 => "uint8",
            SampleType::U16 => "uint16",
            SampleType::F32 => "float32",
            SampleType::F64 => "float64",
        };
        f.write_str(name)
    }
}

/// Row-major single-channel samples, kept at the source bit depth.
#[derive(Debug, Clone, PartialEq)]
pub enum DepthSamples {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl DepthSamples {
    pub fn len(&self) -> usize {
        match self {
            DepthSamples::U8(v) => v.len(),
            DepthSamples::U16(v) => v.len(),
            DepthSamples::F32(v) => v.len(),
            DepthSamples::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sample_type(&self) -> SampleType {
        match self {
            DepthSamples::U8(_) => SampleType::U8,
            DepthSamples::U16(_) => SampleType::U16,
            DepthSamples::F32(_) => SampleType::F32,
            DepthSamples::F64(_) => SampleType::F64,
        }
    }

    /// Every sample widened to `f64`, in row-major order.
    pub fn iter_f64(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            DepthSamples::U8(v) => Box::new(v.iter().map(|&s| f64::from(s))),
            DepthSamples::U16(v) => Box::new(v.iter().map(|&s| f64::from(s))),
            DepthSamples::F32(v) => Box::new(v.iter().map(|&s| f64::from(s))),
            DepthSamples::F64(v) => Box::new(v.iter().copied()),
        }
    }
}

/// A decoded depth raster with exactly one logical channel.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthBuffer {
    width: usize,
    height: usize,
    samples: DepthSamples,
    /// Channel count of the source before reduction (1 when nothing was dropped)
    source_channels: usize,
}

impl DepthBuffer {
    /// Builds a buffer, rejecting empty grids and sample counts that do not
    /// match `width * height`.
    pub fn new(width: usize, height: usize, samples: DepthSamples) -> Result<Self> {
        if width == 0 || height == 0 || samples.len() != width * height {
            return Err(DepthError::InvalidDimensions(width, height));
        }

        Ok(Self {
            width,
            height,
            samples,
            source_channels: 1,
        })
    }

    pub fn with_source_channels(mut self, channels: usize) -> Self {
        self.source_channels = channels.max(1);
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(height, width)`, matching row-major indexing.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn samples(&self) -> &DepthSamples {
        &self.samples
    }

    pub fn into_samples(self) -> DepthSamples {
        self.samples
    }

    pub fn sample_type(&self) -> SampleType {
        self.samples.sample_type()
    }

    pub fn source_channels(&self) -> usize {
        self.source_channels
    }

    pub fn was_reduced(&self) -> bool {
        self.source_channels > 1
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y * self.width + x;
        Some(match &self.samples {
            DepthSamples::U8(v) => f64::from(v[idx]),
            DepthSamples::U16(v) => f64::from(v[idx]),
            DepthSamples::F32(v) => f64::from(v[idx]),
            DepthSamples::F64(v) => v[idx],
        })
    }
}

/// Channel names found in an OpenEXR header, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelCatalog(Vec<String>);

impl ChannelCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// How a channel was picked out of a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRule {
    /// The canonical depth channel was present
    Primary,
    /// The n-th entry of the fallback list matched
    Fallback(usize),
    /// Nothing in the priority list matched; the first channel was taken
    FirstAvailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSelection {
    pub name: String,
    pub rule: SelectionRule,
}

/// Ordered channel names to try when pulling depth out of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPriority {
    pub primary: String,
    pub fallbacks: Vec<String>,
}

impl Default for ChannelPriority {
    fn default() -> Self {
        Self {
            primary: "Z".to_string(),
            fallbacks: vec!["depth".to_string(), "Y".to_string(), "R".to_string()],
        }
    }
}

impl ChannelPriority {
    /// Builds a priority list from `names`; the first entry becomes the primary.
    pub fn from_names<I, S>(names: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names = names.into_iter().map(Into::into);
        let primary = names.next()?;
        Some(Self {
            primary,
            fallbacks: names.collect(),
        })
    }

    /// Picks one channel. Returns `None` only for an empty catalog.
    pub fn select(&self, catalog: &ChannelCatalog) -> Option<ChannelSelection> {
        if catalog.contains(&self.primary) {
            return Some(ChannelSelection {
                name: self.primary.clone(),
                rule: SelectionRule::Primary,
            });
        }

        if let Some((idx, name)) = self
            .fallbacks
            .iter()
            .enumerate()
            .find(|(_, name)| catalog.contains(name))
        {
            return Some(ChannelSelection {
                name: name.clone(),
                rule: SelectionRule::Fallback(idx),
            });
        }

        catalog.names().first().map(|name| ChannelSelection {
            name: name.clone(),
            rule: SelectionRule::FirstAvailable,
        })
    }
}

/// Declared pixel rectangle of an OpenEXR part, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataWindow {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl DataWindow {
    /// Window starting at `origin` and spanning `size` pixels.
    ///
    /// Fails with `InvalidDimensions` when the size is zero or the far corner
    /// does not fit in `i32`.
    pub fn from_origin_and_size(origin: (i32, i32), size: (usize, usize)) -> Result<Self> {
        let far = |start: i32, len: usize| {
            let span = i32::try_from(len).ok()?.checked_sub(1)?;
            if span < 0 {
                return None;
            }
            start.checked_add(span)
        };

        match (far(origin.0, size.0), far(origin.1, size.1)) {
            (Some(max_x), Some(max_y)) => Ok(Self {
                min_x: origin.0,
                min_y: origin.1,
                max_x,
                max_y,
            }),
            _ => Err(DepthError::InvalidDimensions(size.0, size.1)),
        }
    }

    pub fn width(&self) -> usize {
        (i64::from(self.max_x) - i64::from(self.min_x) + 1).max(0) as usize
    }

    pub fn height(&self) -> usize {
        (i64::from(self.max_y) - i64::from(self.min_y) + 1).max(0) as usize
    }
}

/// Record of a lossy multi-channel to single-channel reduction.
///
/// Only the first channel survives; this is a compatibility policy, not a
/// color-to-depth conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelReduction {
    pub original_channels: usize,
    pub kept_channel: usize,
}

/// Format-specific details of how a buffer was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceDetail {
    Hdrc {
        catalog: ChannelCatalog,
        selection: ChannelSelection,
        data_window: DataWindow,
    },
    Raster {
        color_type: String,
        reduction: Option<ChannelReduction>,
    },
}

/// Output of the extractor: the depth buffer and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub buffer: DepthBuffer,
    pub detail: SourceDetail,
}

impl Extraction {
    pub fn catalog(&self) -> Option<&ChannelCatalog> {
        match &self.detail {
            SourceDetail::Hdrc { catalog, .. } => Some(catalog),
            SourceDetail::Raster { .. } => None,
        }
    }

    pub fn selected_channel(&self) -> Option<&ChannelSelection> {
        match &self.detail {
            SourceDetail::Hdrc { selection, .. } => Some(selection),
            SourceDetail::Raster { .. } => None,
        }
    }

    pub fn reduction(&self) -> Option<&ChannelReduction> {
        match &self.detail {
            SourceDetail::Raster { reduction, .. } => reduction.as_ref(),
            SourceDetail::Hdrc { .. } => None,
        }
    }
}
