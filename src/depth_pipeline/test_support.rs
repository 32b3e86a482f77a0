//! Fixture writers shared by the unit tests.

use std::path::Path;

use image::{ImageBuffer, Luma};

use crate::depth_pipeline::extract::{DepthBuffer, DepthSamples};

pub fn f32_buffer(width: usize, height: usize, values: Vec<f32>) -> DepthBuffer {
    DepthBuffer::new(width, height, DepthSamples::F32(values)).unwrap()
}

/// Writes an uncompressed single-part OpenEXR file with `f32` channels.
#[cfg(feature = "exr")]
pub fn write_exr(path: &Path, width: usize, height: usize, channels: &[(&str, Vec<f32>)]) {
    write_exr_at(path, (0, 0), width, height, channels);
}

/// Same as [`write_exr`], with the data window starting at `origin`.
#[cfg(feature = "exr")]
pub fn write_exr_at(
    path: &Path,
    origin: (i32, i32),
    width: usize,
    height: usize,
    channels: &[(&str, Vec<f32>)],
) {
    use exr::prelude::*;

    let list: Vec<AnyChannel<FlatSamples>> = channels
        .iter()
        .map(|(name, values)| AnyChannel::new(*name, FlatSamples::F32(values.clone())))
        .collect();

    let mut layer = Layer::new(
        (width, height),
        LayerAttributes::named("depth"),
        Encoding::UNCOMPRESSED,
        AnyChannels::sort(list.into()),
    );
    layer.attributes.layer_position = Vec2(origin.0, origin.1);

    Image::from_layer(layer).write().to_file(path).unwrap();
}

pub fn write_gray16_png(path: &Path, width: u32, height: u32, data: Vec<u16>) {
    ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(width, height, data)
        .unwrap()
        .save(path)
        .unwrap();
}

/// Writes an uncompressed TIFF of color type `C`.
pub fn write_tiff<C>(path: &Path, width: u32, height: u32, data: &[C::Inner])
where
    C: tiff::encoder::colortype::ColorType,
    [C::Inner]: tiff::encoder::TiffValue,
{
    let file = std::fs::File::create(path).unwrap();
    let mut encoder = tiff::encoder::TiffEncoder::new(file).unwrap();
    encoder.write_image::<C>(width, height, data).unwrap();
}

/// Decodes a 16-bit grayscale raster from disk, whatever its container.
pub fn read_gray16(path: &Path) -> (u32, u32, Vec<u16>) {
    let image = image::ImageReader::open(path)
        .unwrap()
        .with_guessed_format()
        .unwrap()
        .decode()
        .unwrap();
    match image {
        image::DynamicImage::ImageLuma16(buf) => (buf.width(), buf.height(), buf.into_raw()),
        other => panic!("expected 16-bit grayscale, got {:?}", other.color()),
    }
}
