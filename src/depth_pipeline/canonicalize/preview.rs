use crate::depth_pipeline::extract::types::DepthBuffer;

/// 8-bit grayscale rendering of a depth buffer, for eyeballing only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

/// Min-max normalizes finite samples to `0..=255`.
///
/// Non-finite samples render black. A flat buffer renders black as well.
pub fn render_preview(buffer: &DepthBuffer) -> PreviewImage {
    let (lo, hi) = buffer
        .samples()
        .iter_f64()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let span = hi - lo;
    let data = buffer
        .samples()
        .iter_f64()
        .map(|v| {
            if !v.is_finite() || !(span > 0.0) {
                0
            } else {
                ((v - lo) / span * 255.0).round() as u8
            }
        })
        .collect();

    PreviewImage {
        width: buffer.width(),
        height: buffer.height(),
        data,
    }
}
