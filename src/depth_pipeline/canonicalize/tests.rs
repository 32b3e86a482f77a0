use crate::depth_pipeline::canonicalize::{canonicalize, depth_stats, inspect, render_preview, UnitHint};
use crate::depth_pipeline::extract::{DepthBuffer, DepthSamples};
use crate::depth_pipeline::test_support::f32_buffer;

#[test]
fn test_float_unit_inference_thresholds() {
    let meters = inspect(&f32_buffer(2, 1, vec![0.4, 2.3]));
    assert_eq!(meters.hint, UnitHint::LikelyMeters);
    assert_eq!(meters.stats.max, f64::from(2.3f32));

    let millimeters = inspect(&f32_buffer(2, 1, vec![250.0, 3000.0]));
    assert_eq!(millimeters.hint, UnitHint::LikelyMillimeters);

    let unknown = inspect(&f32_buffer(2, 1, vec![10.0, 200_000.0]));
    assert_eq!(unknown.hint, UnitHint::Indeterminate);

    // A non-positive maximum is never classified
    let empty = inspect(&f32_buffer(2, 1, vec![0.0, -1.0]));
    assert_eq!(empty.hint, UnitHint::Indeterminate);
}

#[test]
fn test_integer_unit_inference() {
    let mm = DepthBuffer::new(2, 1, DepthSamples::U16(vec![0, 4002])).unwrap();
    assert_eq!(inspect(&mm).hint, UnitHint::LikelyMillimeters);

    // A u16 buffer with a tiny maximum is not read as meters
    let small = DepthBuffer::new(2, 1, DepthSamples::U16(vec![1, 3])).unwrap();
    assert_eq!(inspect(&small).hint, UnitHint::LikelyMillimeters);

    let saturated = DepthBuffer::new(2, 1, DepthSamples::U16(vec![0, 65535])).unwrap();
    assert_eq!(inspect(&saturated).hint, UnitHint::Indeterminate);

    let eight_bit = DepthBuffer::new(2, 1, DepthSamples::U8(vec![3, 40])).unwrap();
    assert_eq!(inspect(&eight_bit).hint, UnitHint::Indeterminate);
}

#[test]
fn test_reduced_source_is_visualization() {
    let buffer = DepthBuffer::new(2, 1, DepthSamples::U8(vec![10, 20]))
        .unwrap()
        .with_source_channels(3);
    let inference = inspect(&buffer);
    assert_eq!(inference.hint, UnitHint::Indeterminate);
    assert!(inference.note.contains("visualization"));
    assert!(inference.to_string().contains("shape: (1, 2, 3)"));
}

#[test]
fn test_stats_skip_non_finite() {
    let stats = depth_stats(&f32_buffer(2, 2, vec![0.0, 4.0, f32::NAN, 2.0]));
    assert_eq!(stats.min, 0.0);
    assert_eq!(stats.max, 4.0);
    assert_eq!(stats.mean, 2.0);
    assert_eq!(stats.valid, 2);
    assert_eq!(stats.non_finite, 1);
    assert_eq!(stats.total(), 4);
}

#[test]
fn test_truncates_toward_zero() {
    let values: Vec<f32> = (0..200).map(|i| i as f32 * 4.99 + 0.5).collect();
    let (canonical, report) = canonicalize(&f32_buffer(20, 10, values.clone()), 1.0);

    let expected: Vec<u16> = values.iter().map(|v| v.floor() as u16).collect();
    assert_eq!(canonical.data, expected);
    assert_eq!(report.ceiling_clamped, 0);
    assert_eq!(report.floor_clamped, 0);
    assert_eq!(canonical.width, 20);
    assert_eq!(canonical.height, 10);
}

#[test]
fn test_ceiling_and_floor_clamps() {
    let (canonical, report) = canonicalize(&f32_buffer(4, 1, vec![70000.0, -5.0, 65535.0, 12.9]), 1.0);

    assert_eq!(canonical.data, vec![65535, 0, 65535, 12]);
    assert_eq!(report.ceiling_clamped, 1);
    assert_eq!(report.floor_clamped, 1);
    assert_eq!(report.pre_min, -5.0);
    assert_eq!(report.pre_max, 70000.0);
    assert_eq!(report.post_min, 0);
    assert_eq!(report.post_max, 65535);
    assert!(!report.all_floor_clamped(4));
}

#[test]
fn test_all_floor_clamped() {
    let (_, report) = canonicalize(&f32_buffer(3, 1, vec![-1.0, -0.5, f32::NAN]), 1.0);
    assert_eq!(report.floor_clamped, 2);
    assert!(report.all_floor_clamped(3));

    let (_, report) = canonicalize(&f32_buffer(2, 1, vec![f32::NAN, f32::NAN]), 1.0);
    assert!(!report.all_floor_clamped(2));
}

#[test]
fn test_scale_applied_before_clamping() {
    // 0.1 mm units
    let (canonical, report) = canonicalize(&f32_buffer(3, 1, vec![15000.0, 700000.0, -20.0]), 0.1);

    assert_eq!(canonical.data, vec![1500, 65535, 0]);
    assert_eq!(report.ceiling_clamped, 1);

    let u16_source = DepthBuffer::new(2, 1, DepthSamples::U16(vec![1000, 40000])).unwrap();
    let (canonical, report) = canonicalize(&u16_source, 2.0);
    assert_eq!(canonical.data, vec![2000, 65535]);
    assert_eq!(report.ceiling_clamped, 1);
}

#[test]
fn test_nan_written_as_zero() {
    let (canonical, report) = canonicalize(&f32_buffer(2, 1, vec![f32::NAN, 5.5]), 1.0);
    assert_eq!(canonical.data, vec![0, 5]);
    assert_eq!(report.non_finite, 1);
    assert_eq!(report.ceiling_clamped, 0);
}

#[test]
fn test_f64_source() {
    let buffer = DepthBuffer::new(2, 1, DepthSamples::F64(vec![1234.999, 99999.0])).unwrap();
    let (canonical, report) = canonicalize(&buffer, 1.0);
    assert_eq!(canonical.data, vec![1234, 65535]);
    assert_eq!(report.ceiling_clamped, 1);
}

#[test]
fn test_preview_normalizes_range() {
    let preview = render_preview(&f32_buffer(4, 1, vec![100.0, 150.0, 200.0, f32::INFINITY]));
    assert_eq!(preview.data, vec![0, 128, 255, 0]);

    let flat = render_preview(&f32_buffer(2, 1, vec![7.0, 7.0]));
    assert_eq!(flat.data, vec![0, 0]);
}
