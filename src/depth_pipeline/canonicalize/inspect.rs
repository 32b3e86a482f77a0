use std::fmt;

use crate::depth_pipeline::extract::types::{DepthBuffer, SampleType};

/// Float buffers whose maximum stays below this are probably in meters.
const METERS_MAX: f64 = 50.0;
/// Buffers whose maximum stays below this are probably in millimeters.
const MILLIMETERS_MAX: f64 = 10_000.0;

/// Advisory unit classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitHint {
    LikelyMeters,
    LikelyMillimeters,
    Indeterminate,
}

impl fmt::Display for UnitHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitHint::LikelyMeters => write!(f, "likely meters (m)"),
            UnitHint::LikelyMillimeters => write!(f, "likely millimeters (mm)"),
            UnitHint::Indeterminate => write!(f, "indeterminate"),
        }
    }
}

/// Summary statistics of a depth buffer.
///
/// `min`, `max` and `mean` cover finite samples only; NaN and infinities are
/// counted in `non_finite` instead. `valid` counts samples strictly above zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthStats {
    pub dtype: SampleType,
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub valid: usize,
    pub non_finite: usize,
}

impl DepthStats {
    pub fn total(&self) -> usize {
        self.width * self.height
    }
}

pub fn depth_stats(buffer: &DepthBuffer) -> DepthStats {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut finite = 0usize;
    let mut valid = 0usize;
    let mut non_finite = 0usize;

    for v in buffer.samples().iter_f64() {
        if !v.is_finite() {
            non_finite += 1;
            continue;
        }
        min = min.min(v);
        max = max.max(v);
        sum += v;
        finite += 1;
        if v > 0.0 {
            valid += 1;
        }
    }

    let (min, max, mean) = if finite == 0 {
        (f64::NAN, f64::NAN, f64::NAN)
    } else {
        (min, max, sum / finite as f64)
    };

    DepthStats {
        dtype: buffer.sample_type(),
        width: buffer.width(),
        height: buffer.height(),
        channels: buffer.source_channels(),
        min,
        max,
        mean,
        valid,
        non_finite,
    }
}

/// Unit guess plus the statistics it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitInference {
    pub hint: UnitHint,
    pub note: &'static str,
    pub stats: DepthStats,
}

/// Guesses the physical unit of `buffer` from its value range.
///
/// Float and `u16` buffers use different rules. Buffers reduced from a
/// multi-channel source are never classified.
pub fn inspect(buffer: &DepthBuffer) -> UnitInference {
    let stats = depth_stats(buffer);
    let max = stats.max;
    let positive_below = |limit: f64| max > 0.0 && max < limit;

    let (hint, note) = if buffer.was_reduced() {
        (
            UnitHint::Indeterminate,
            "multi-channel source: likely a rendered visualization, not metric data",
        )
    } else {
        match stats.dtype {
            SampleType::F32 | SampleType::F64 if positive_below(METERS_MAX) => (
                UnitHint::LikelyMeters,
                "float depth with a small range, probably meters",
            ),
            SampleType::F32 | SampleType::F64 if positive_below(MILLIMETERS_MAX) => (
                UnitHint::LikelyMillimeters,
                "float depth in the thousands, probably millimeters or pre-scaled",
            ),
            SampleType::F32 | SampleType::F64 => (
                UnitHint::Indeterminate,
                "range too large to classify; confirm the unit and pick a scale manually",
            ),
            SampleType::U16 if positive_below(MILLIMETERS_MAX) => (
                UnitHint::LikelyMillimeters,
                "16-bit single channel in the thousands, almost certainly uint16 millimeters",
            ),
            SampleType::U16 => (
                UnitHint::Indeterminate,
                "unusual 16-bit range; check the camera documentation for the unit",
            ),
            SampleType::U8 => (
                UnitHint::Indeterminate,
                "single channel 8-bit data, probably a special encoding rather than metric depth",
            ),
        }
    };

    UnitInference { hint, note, stats }
}

fn fmt_value(dtype: SampleType, v: f64) -> String {
    if dtype.is_float() || !v.is_finite() {
        format!("{}", v)
    } else {
        format!("{}", v as i64)
    }
}

impl fmt::Display for UnitInference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        writeln!(f, "dtype: {}", s.dtype)?;
        if s.channels > 1 {
            writeln!(f, "shape: ({}, {}, {})", s.height, s.width, s.channels)?;
        } else {
            writeln!(f, "shape: ({}, {})", s.height, s.width)?;
        }
        writeln!(f, "min: {}", fmt_value(s.dtype, s.min))?;
        writeln!(f, "max: {}", fmt_value(s.dtype, s.max))?;
        writeln!(f, "mean: {}", s.mean)?;
        writeln!(f, "valid (>0): {} / {}", s.valid, s.total())?;
        if s.non_finite > 0 {
            writeln!(f, "non-finite: {}", s.non_finite)?;
        }
        write!(f, "unit: {} ({})", self.hint, self.note)
    }
}
