use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use tempfile::tempdir;

use crate::depth_pipeline::canonicalize::{CanonicalDepth, PreviewImage};
use crate::depth_pipeline::common::error::{DepthError, Result};
use crate::depth_pipeline::conversions::{default_output_path, DepthToRasterPipeline};
use crate::depth_pipeline::extract::{
    ChannelCatalog, ChannelPriority, ChannelSelection, DataWindow, Extraction, HdrcReader,
    RasterReader, SelectionRule, SourceDetail,
};
use crate::depth_pipeline::raster::{
    ConversionConfig, DepthRasterWriter, OutputFormat, TiffCompression,
};
use crate::depth_pipeline::sniff::{ContainerKind, HDRC_MAGIC};
use crate::depth_pipeline::test_support::{f32_buffer, read_gray16};

struct MockHdrcReader {
    should_fail: bool,
    values: Vec<f32>,
}

impl HdrcReader for MockHdrcReader {
    fn read_hdrc(&self, path: &Path, _data: &[u8], priority: &ChannelPriority) -> Result<Extraction> {
        if self.should_fail {
            return Err(DepthError::Decode {
                path: path.to_path_buf(),
                reason: "Mock decode error".to_string(),
            });
        }
        let width = self.values.len();
        Ok(Extraction {
            buffer: f32_buffer(width, 1, self.values.clone()),
            detail: SourceDetail::Hdrc {
                catalog: ChannelCatalog::new([priority.primary.clone()]),
                selection: ChannelSelection {
                    name: priority.primary.clone(),
                    rule: SelectionRule::Primary,
                },
                data_window: DataWindow::from_origin_and_size((0, 0), (width, 1)).unwrap(),
            },
        })
    }
}

struct MockRasterReader;

impl RasterReader for MockRasterReader {
    fn read_raster(&self, path: &Path, _data: &[u8]) -> Result<Extraction> {
        Err(DepthError::UnsupportedShape {
            path: path.to_path_buf(),
            reason: "mock raster reader".to_string(),
        })
    }
}

struct MockWriter {
    should_fail: bool,
    written_data: Arc<Mutex<Vec<CanonicalDepth>>>,
}

impl DepthRasterWriter for MockWriter {
    fn write_depth(&self, depth: &CanonicalDepth, output: &mut dyn Write, _config: &ConversionConfig) -> Result<()> {
        if self.should_fail {
            return Err(DepthError::Encode("Mock encode error".to_string()));
        }
        self.written_data.lock().unwrap().push(depth.clone());
        output.write_all(b"mock raster").unwrap();
        Ok(())
    }

    fn write_preview(&self, _preview: &PreviewImage, _output: &mut dyn Write) -> Result<()> {
        Ok(())
    }
}

fn mock_pipeline(
    reader_fails: bool,
    writer_fails: bool,
    values: Vec<f32>,
    config: ConversionConfig,
) -> (
    DepthToRasterPipeline<MockHdrcReader, MockRasterReader, MockWriter>,
    Arc<Mutex<Vec<CanonicalDepth>>>,
) {
    let written = Arc::new(Mutex::new(Vec::new()));
    let pipeline = DepthToRasterPipeline::with_custom(
        MockHdrcReader {
            should_fail: reader_fails,
            values,
        },
        MockRasterReader,
        MockWriter {
            should_fail: writer_fails,
            written_data: written.clone(),
        },
        config,
    );
    (pipeline, written)
}

/// A file that sniffs as OpenEXR; the mock reader ignores its body.
fn write_fake_hdrc(path: &Path) {
    let mut bytes = HDRC_MAGIC.to_vec();
    bytes.extend_from_slice(&[0u8; 16]);
    fs::write(path, bytes).unwrap();
}

fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_config_builder() {
    let config = ConversionConfig::builder()
        .scale(0.1)
        .output_format(OutputFormat::Tiff)
        .compression(TiffCompression::DeflateBalanced)
        .predictor(Some(2))
        .validate_dimensions(false)
        .max_dimension(Some(10000))
        .channel_priority(ChannelPriority::from_names(["depth"]).unwrap())
        .build();

    assert_eq!(config.scale, 0.1);
    assert_eq!(config.output_format, OutputFormat::Tiff);
    assert_eq!(config.compression, TiffCompression::DeflateBalanced);
    assert_eq!(config.predictor, Some(2));
    assert!(!config.validate_dimensions);
    assert_eq!(config.max_dimension, Some(10000));
    assert_eq!(config.channel_priority.primary, "depth");

    let default = ConversionConfig::default();
    assert_eq!(default.scale, 1.0);
    assert_eq!(default.output_format, OutputFormat::Png);
}

#[test]
fn test_successful_conversion() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("capture.exr");
    write_fake_hdrc(&input);
    let output = dir.path().join("nested/out/capture.png");

    let (pipeline, written) = mock_pipeline(
        false,
        false,
        vec![12.7, 70000.0, -3.0],
        ConversionConfig::default(),
    );
    let result = pipeline.convert_file(&input, &output).unwrap();

    assert_eq!(result.kind, ContainerKind::Hdrc);
    assert_eq!(result.output, output);
    assert_eq!((result.width, result.height), (3, 1));
    assert_eq!(result.clamp.ceiling_clamped, 1);
    assert_eq!(result.clamp.post_max, 65535);
    assert_eq!(result.clamp.post_min, 0);
    assert_eq!(written.lock().unwrap()[0].data, vec![12, 65535, 0]);
    assert_eq!(fs::read(&output).unwrap(), b"mock raster");
    assert_eq!(dir_entries(output.parent().unwrap()), vec!["capture.png".to_string()]);
}

#[test]
fn test_reader_failure() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("capture.exr");
    write_fake_hdrc(&input);
    let output = dir.path().join("capture.png");

    let (pipeline, written) = mock_pipeline(true, false, vec![1.0], ConversionConfig::default());
    let result = pipeline.convert_file(&input, &output);

    assert!(matches!(result, Err(DepthError::Decode { .. })));
    assert!(written.lock().unwrap().is_empty());
    assert!(!output.exists());
}

#[test]
fn test_writer_failure_leaves_no_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("capture.exr");
    write_fake_hdrc(&input);
    let output = dir.path().join("capture.png");

    let (pipeline, _) = mock_pipeline(false, true, vec![1.0], ConversionConfig::default());
    let result = pipeline.convert_file(&input, &output);

    assert!(matches!(result, Err(DepthError::Encode(_))));
    assert_eq!(dir_entries(dir.path()), vec!["capture.exr".to_string()]);
}

#[test]
fn test_dimension_validation() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("wide.exr");
    write_fake_hdrc(&input);

    let config = ConversionConfig::builder().max_dimension(Some(4)).build();
    let (pipeline, _) = mock_pipeline(false, false, vec![1.0; 8], config);
    let result = pipeline.convert_file(&input, dir.path().join("wide.png"));
    assert!(matches!(result, Err(DepthError::InvalidDimensions(8, 1))));

    let config = ConversionConfig::builder()
        .validate_dimensions(false)
        .max_dimension(Some(4))
        .build();
    let (pipeline, _) = mock_pipeline(false, false, vec![1.0; 8], config);
    assert!(pipeline.convert_file(&input, dir.path().join("wide.png")).is_ok());
}

#[test]
fn test_conventional_input_goes_to_raster_reader() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("depth.exr");
    fs::write(&input, b"\x89PNG\r\n\x1a\n not really").unwrap();

    let (pipeline, _) = mock_pipeline(false, false, vec![1.0], ConversionConfig::default());
    let result = pipeline.convert_file(&input, dir.path().join("depth.png"));
    assert!(matches!(result, Err(DepthError::UnsupportedShape { .. })));
}

#[test]
fn test_default_output_path() {
    let input = Path::new("/data/captures/frame.0001.exr");
    assert_eq!(
        default_output_path(input, None, OutputFormat::Png),
        PathBuf::from("/data/captures/frame.0001.png")
    );
    assert_eq!(
        default_output_path(input, Some(Path::new("/out")), OutputFormat::Tiff),
        PathBuf::from("/out/frame.0001.tiff")
    );

    // Never overwrite a disguised source
    let disguised = Path::new("/data/depth.png");
    assert_eq!(
        default_output_path(disguised, None, OutputFormat::Png),
        PathBuf::from("/data/depth_depth.png")
    );
}

#[test]
fn test_batch_with_mocks_processes_in_order() {
    let dir = tempdir().unwrap();
    for name in ["b.exr", "a.EXR", "c.exr", "notes.txt", "preview.png"] {
        write_fake_hdrc(&dir.path().join(name));
    }
    fs::create_dir(dir.path().join("nested.exr")).unwrap();
    let out_dir = dir.path().join("converted");

    let (pipeline, written) = mock_pipeline(false, false, vec![5.0], ConversionConfig::default());
    let report = pipeline.run_batch(dir.path(), Some(out_dir.as_path())).unwrap();

    let sources: Vec<String> = report
        .successes
        .iter()
        .map(|r| r.source.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(sources, vec!["a.EXR", "b.exr", "c.exr"]);
    assert!(report.failures.is_empty());
    assert_eq!(written.lock().unwrap().len(), 3);
    assert_eq!(dir_entries(&out_dir), vec!["a.png", "b.png", "c.png"]);
}

#[test]
fn test_batch_empty_directory() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("readme.md"), "nothing here").unwrap();

    let (pipeline, _) = mock_pipeline(false, false, vec![1.0], ConversionConfig::default());
    let report = pipeline.run_batch(dir.path(), None).unwrap();
    assert!(report.is_empty());
}

#[test]
fn test_batch_rejects_missing_root() {
    let dir = tempdir().unwrap();
    let (pipeline, _) = mock_pipeline(false, false, vec![1.0], ConversionConfig::default());
    let result = pipeline.run_batch(&dir.path().join("absent"), None);
    assert!(matches!(result, Err(DepthError::Io { .. })));
}

#[test]
fn test_batch_cancelled_before_start() {
    let dir = tempdir().unwrap();
    for name in ["a.exr", "b.exr"] {
        write_fake_hdrc(&dir.path().join(name));
    }

    let (pipeline, written) = mock_pipeline(false, false, vec![1.0], ConversionConfig::default());
    let cancel = AtomicBool::new(true);
    let report = pipeline.run_batch_with_cancel(dir.path(), None, &cancel).unwrap();

    assert!(report.cancelled());
    assert_eq!(report.skipped.len(), 2);
    assert!(report.successes.is_empty());
    assert!(written.lock().unwrap().is_empty());
}

#[test]
fn test_batch_rejects_output_collisions() {
    let dir = tempdir().unwrap();
    for name in ["a.exr", "a.EXR", "b.exr"] {
        write_fake_hdrc(&dir.path().join(name));
    }
    let out_dir = dir.path().join("converted");

    let (pipeline, written) = mock_pipeline(false, false, vec![5.0], ConversionConfig::default());
    let report = pipeline.run_batch(dir.path(), Some(out_dir.as_path())).unwrap();

    let sources: Vec<PathBuf> = report.successes.iter().map(|r| r.source.clone()).collect();
    assert_eq!(sources, vec![dir.path().join("a.EXR"), dir.path().join("b.exr")]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, dir.path().join("a.exr"));
    match &report.failures[0].error {
        DepthError::OutputCollision {
            output, claimed_by, ..
        } => {
            assert_eq!(output, &out_dir.join("a.png"));
            assert_eq!(claimed_by, &dir.path().join("a.EXR"));
        }
        other => panic!("expected OutputCollision, got {:?}", other),
    }

    // Only the surviving sources were encoded
    assert_eq!(written.lock().unwrap().len(), 2);
    assert_eq!(dir_entries(&out_dir), vec!["a.png", "b.png"]);
}

#[test]
fn test_invalid_scale_rejected() {
    for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let config = ConversionConfig::builder().scale(scale).build();
        assert!(matches!(config.validate(), Err(DepthError::InvalidScale(_))));
    }
    assert!(ConversionConfig::builder().scale(0.001).build().validate().is_ok());

    let dir = tempdir().unwrap();
    let input = dir.path().join("capture.exr");
    write_fake_hdrc(&input);
    let output = dir.path().join("capture.png");

    let config = ConversionConfig::builder().scale(-1.0).build();
    let (pipeline, written) = mock_pipeline(false, false, vec![100.0], config);

    let result = pipeline.convert_file(&input, &output);
    assert!(matches!(result, Err(DepthError::InvalidScale(s)) if s == -1.0));
    assert!(!output.exists());
    assert!(written.lock().unwrap().is_empty());

    let batch = pipeline.run_batch(dir.path(), None);
    assert!(matches!(batch, Err(DepthError::InvalidScale(_))));
}

#[test]
fn test_all_negative_depth_is_reported() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("capture.exr");
    write_fake_hdrc(&input);

    let (pipeline, _) = mock_pipeline(false, false, vec![-3.0, -1.0], ConversionConfig::default());
    let result = pipeline
        .convert_file(&input, dir.path().join("capture.png"))
        .unwrap();

    assert_eq!(result.clamp.floor_clamped, 2);
    assert_eq!(result.clamp.post_max, 0);
    assert!(result.clamp.all_floor_clamped(2));
    assert!(result.to_string().contains("2 clamped at 0"));
}

#[test]
fn test_float_tiff_converts_to_millimeters() {
    use crate::depth_pipeline::test_support::write_tiff;
    use tiff::encoder::colortype::Gray32Float;

    let dir = tempdir().unwrap();
    let input = dir.path().join("depth.tif");
    write_tiff::<Gray32Float>(&input, 2, 2, &[1234.9, 70000.0, -2.0, 10.0]);

    let pipeline = DepthToRasterPipeline::new(ConversionConfig::default());
    let output = default_output_path(&input, None, OutputFormat::Png);
    let result = pipeline.convert_file(&input, &output).unwrap();

    assert_eq!(result.kind, ContainerKind::ConventionalRaster);
    assert_eq!(result.clamp.ceiling_clamped, 1);
    assert_eq!(result.clamp.floor_clamped, 1);
    let (_, _, data) = read_gray16(&output);
    assert_eq!(data, vec![1234, 65535, 0, 10]);
}

#[cfg(feature = "exr")]
mod exr_files {
    use super::*;
    use crate::depth_pipeline::test_support::write_exr;

    #[test]
    fn test_round_trip_to_png() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("depth.exr");
        let values: Vec<f32> = (0..48).map(|i| (i as f32 * 20.83) % 1000.0).collect();
        write_exr(&input, 8, 6, &[("Z", values.clone())]);

        let pipeline = DepthToRasterPipeline::new(ConversionConfig::default());
        let output = default_output_path(&input, None, OutputFormat::Png);
        let result = pipeline.convert_file(&input, &output).unwrap();

        assert_eq!(result.clamp.ceiling_clamped, 0);
        let (width, height, data) = read_gray16(&output);
        assert_eq!((width, height), (8, 6));
        let expected: Vec<u16> = values.iter().map(|v| v.floor() as u16).collect();
        assert_eq!(data, expected);
    }

    #[test]
    fn test_tiff_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("depth.exr");
        write_exr(&input, 2, 2, &[("Z", vec![1.9, 70000.0, -5.0, 4321.0])]);

        let config = ConversionConfig::builder()
            .output_format(OutputFormat::Tiff)
            .compression(TiffCompression::Lzw)
            .build();
        let pipeline = DepthToRasterPipeline::new(config);
        let output = dir.path().join("out/depth.tiff");
        let result = pipeline.convert_file(&input, &output).unwrap();

        assert_eq!(result.clamp.ceiling_clamped, 1);
        let (_, _, data) = read_gray16(&output);
        assert_eq!(data, vec![1, 65535, 0, 4321]);
    }

    #[test]
    fn test_batch_survives_corrupt_file() {
        let dir = tempdir().unwrap();
        let out_dir = dir.path().join("png");
        for i in 1..=5 {
            let path = dir.path().join(format!("depth_{:02}.exr", i));
            write_exr(&path, 4, 2, &[("Z", vec![i as f32 * 100.0; 8])]);
        }
        let corrupt = dir.path().join("depth_03.exr");
        let bytes = fs::read(&corrupt).unwrap();
        fs::write(&corrupt, &bytes[..40]).unwrap();

        let pipeline = DepthToRasterPipeline::new(ConversionConfig::default());
        let report = pipeline.run_batch(dir.path(), Some(out_dir.as_path())).unwrap();

        assert_eq!(report.successes.len(), 4);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, corrupt);
        assert!(matches!(report.failures[0].error, DepthError::Decode { .. }));
        assert_eq!(
            dir_entries(&out_dir),
            vec!["depth_01.png", "depth_02.png", "depth_04.png", "depth_05.png"]
        );

        let (_, _, data) = read_gray16(&out_dir.join("depth_05.png"));
        assert_eq!(data, vec![500; 8]);
    }

    #[test]
    fn test_inspect_disguised_container() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("depth.png");
        write_exr(&input, 2, 1, &[("R", vec![0.5, 0.5]), ("Z", vec![1.2, 2.3])]);

        let pipeline = DepthToRasterPipeline::new(ConversionConfig::default());
        let report = pipeline.inspect_file(&input).unwrap();

        assert_eq!(report.kind, ContainerKind::Hdrc);
        assert!(report.extension_mismatch);
        assert_eq!(
            report.inference.hint,
            crate::depth_pipeline::canonicalize::UnitHint::LikelyMeters
        );
        let text = report.to_string();
        assert!(text.contains("selected channel: Z"));
        assert!(text.contains("dtype: float32"));
    }

    #[test]
    fn test_preview_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("depth.exr");
        write_exr(&input, 2, 1, &[("Z", vec![100.0, 300.0])]);

        let pipeline = DepthToRasterPipeline::new(ConversionConfig::default());
        let output = dir.path().join("depth_preview.png");
        let stats = pipeline.preview_file(&input, &output).unwrap();
        assert_eq!(stats.max, 300.0);

        let preview = image::open(&output).unwrap().to_luma8();
        assert_eq!(preview.into_raw(), vec![0, 255]);
    }
}
