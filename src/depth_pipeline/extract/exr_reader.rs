//! OpenEXR reader implementation using the exr library.
//!
//! Only the first valid layer at its largest resolution level is read. One
//! channel is selected by [`ChannelPriority`] and widened to `f32`; no other
//! channel contributes to the result.

use std::io::Cursor;
use std::path::Path;

use exr::prelude::{read, FlatSamples, ReadChannels, ReadLayers};
use tracing::{debug, info, warn};

use crate::depth_pipeline::common::error::{DepthError, Result};
use crate::depth_pipeline::extract::reader::HdrcReader;
use crate::depth_pipeline::extract::types::{
    ChannelCatalog, ChannelPriority, DataWindow, DepthBuffer, DepthSamples, Extraction,
    SelectionRule, SourceDetail,
};

/// HDR container reader backed by the `exr` crate.
pub struct ExrHdrcReader;

impl HdrcReader for ExrHdrcReader {
    /// Decodes the container and returns the selected channel as `f32`.
    ///
    /// The buffer size comes from the data window (`max - min + 1` per axis),
    /// whose origin may be anywhere.
    ///
    /// # Errors
    ///
    /// * `Decode` - corrupt header or truncated pixel data
    /// * `ChannelNotFound` - the layer exposes no channels
    /// * `InvalidDimensions` - the data window is empty
    fn read_hdrc(&self, path: &Path, data: &[u8], priority: &ChannelPriority) -> Result<Extraction> {
        debug!("Decoding OpenEXR container, {} bytes", data.len());

        let image = read()
            .no_deep_data()
            .largest_resolution_level()
            .all_channels()
            .first_valid_layer()
            .all_attributes()
            .from_buffered(Cursor::new(data))
            .map_err(|e| DepthError::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let layer = image.layer_data;
        let (width, height) = (layer.size.0, layer.size.1);
        let origin = layer.attributes.layer_position;
        let data_window = DataWindow::from_origin_and_size((origin.0, origin.1), (width, height))?;

        let catalog = ChannelCatalog::new(layer.channel_data.list.iter().map(|c| c.name.to_string()));
        debug!("Data window {:?}, channels {:?}", data_window, catalog.names());

        let channel_not_found = || DepthError::ChannelNotFound {
            path: path.to_path_buf(),
            available: catalog.names().to_vec(),
        };

        let selection = priority.select(&catalog).ok_or_else(channel_not_found)?;

        match selection.rule {
            SelectionRule::Primary => debug!("Using depth channel '{}'", selection.name),
            SelectionRule::Fallback(_) => info!(
                "{}: no '{}' channel, falling back to '{}'",
                path.display(),
                priority.primary,
                selection.name
            ),
            SelectionRule::FirstAvailable => warn!(
                "{}: none of '{}' or {:?} present, using first channel '{}'",
                path.display(),
                priority.primary,
                priority.fallbacks,
                selection.name
            ),
        }

        let channel = layer
            .channel_data
            .list
            .into_iter()
            .find(|c| c.name.to_string() == selection.name)
            .ok_or_else(channel_not_found)?;

        // Half and unsigned planes are widened; float planes pass through untouched
        let samples: Vec<f32> = match channel.sample_data {
            FlatSamples::F16(values) => values.into_iter().map(|v| v.to_f32()).collect(),
            FlatSamples::F32(values) => values,
            FlatSamples::U32(values) => values.into_iter().map(|v| v as f32).collect(),
        };

        let buffer = DepthBuffer::new(width, height, DepthSamples::F32(samples))?;

        Ok(Extraction {
            buffer,
            detail: SourceDetail::Hdrc {
                catalog,
                selection,
                data_window,
            },
        })
    }
}
