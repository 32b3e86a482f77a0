use crate::depth_pipeline::extract::types::{DepthBuffer, DepthSamples};

/// Largest value representable in the canonical encoding.
pub const DEPTH_CEILING: f64 = u16::MAX as f64;

/// Canonical depth raster: single channel, `u16` millimeters, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalDepth {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u16>,
}

/// What clamping did to a buffer during [`canonicalize`].
///
/// `pre_*` are taken after scaling and before clamping, over finite samples.
/// A non-zero `ceiling_clamped` usually means the unit assumption is wrong.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampReport {
    pub pre_min: f64,
    pub pre_max: f64,
    pub post_min: u16,
    pub post_max: u16,
    pub floor_clamped: usize,
    pub ceiling_clamped: usize,
    /// NaN samples, written as 0
    pub non_finite: usize,
}

impl ClampReport {
    /// True when samples were floor clamped and nothing else survived.
    pub fn all_floor_clamped(&self, total: usize) -> bool {
        self.floor_clamped > 0 && self.floor_clamped + self.non_finite == total
    }
}

#[derive(Default)]
struct Tally {
    pre_min: f64,
    pre_max: f64,
    floor_clamped: usize,
    ceiling_clamped: usize,
    non_finite: usize,
}

impl Tally {
    fn new() -> Self {
        Self {
            pre_min: f64::INFINITY,
            pre_max: f64::NEG_INFINITY,
            ..Self::default()
        }
    }

    /// Clamps one scaled sample into `0..=65535` and truncates it.
    fn clamp(&mut self, v: f64) -> u16 {
        if v.is_nan() {
            self.non_finite += 1;
            return 0;
        }
        if v.is_finite() {
            self.pre_min = self.pre_min.min(v);
            self.pre_max = self.pre_max.max(v);
        }
        if v < 0.0 {
            self.floor_clamped += 1;
            0
        } else if v > DEPTH_CEILING {
            self.ceiling_clamped += 1;
            u16::MAX
        } else {
            // `as` truncates toward zero
            v as u16
        }
    }
}

/// Scales, clamps to `[0, 65535]` and truncates every sample.
///
/// Samples are treated as millimeters after multiplication by `scale`.
/// Single precision sources are scaled in `f32` so output matches prior
/// float32 tooling bit for bit; `f64` sources are scaled in `f64`.
pub fn canonicalize(buffer: &DepthBuffer, scale: f64) -> (CanonicalDepth, ClampReport) {
    let mut tally = Tally::new();
    let scale32 = scale as f32;

    let data: Vec<u16> = match buffer.samples() {
        DepthSamples::U8(v) => v
            .iter()
            .map(|&s| tally.clamp(f64::from(f32::from(s) * scale32)))
            .collect(),
        DepthSamples::U16(v) => v
            .iter()
            .map(|&s| tally.clamp(f64::from(f32::from(s) * scale32)))
            .collect(),
        DepthSamples::F32(v) => v
            .iter()
            .map(|&s| tally.clamp(f64::from(s * scale32)))
            .collect(),
        DepthSamples::F64(v) => v.iter().map(|&s| tally.clamp(s * scale)).collect(),
    };

    let post_min = data.iter().copied().min().unwrap_or(0);
    let post_max = data.iter().copied().max().unwrap_or(0);

    let (pre_min, pre_max) = if tally.pre_min.is_finite() {
        (tally.pre_min, tally.pre_max)
    } else {
        (f64::NAN, f64::NAN)
    };

    let report = ClampReport {
        pre_min,
        pre_max,
        post_min,
        post_max,
        floor_clamped: tally.floor_clamped,
        ceiling_clamped: tally.ceiling_clamped,
        non_finite: tally.non_finite,
    };

    (
        CanonicalDepth {
            width: buffer.width(),
            height: buffer.height(),
            data,
        },
        report,
    )
}
