use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::depth_pipeline::common::error::{DepthError, Result};
use crate::depth_pipeline::sniff::types::{ContainerKind, SniffedFile};

/// OpenEXR magic number, little-endian `20000630`.
pub const HDRC_MAGIC: [u8; 4] = [0x76, 0x2F, 0x31, 0x01];

/// Reads exactly four bytes from the start of `path`.
///
/// Files shorter than four bytes fail with an `UnexpectedEof` I/O error. An
/// extension that disagrees with the content is logged at info level and
/// otherwise ignored.
pub fn sniff<P: AsRef<Path>>(path: P) -> Result<SniffedFile> {
    let path = path.as_ref();
    let mut magic = [0u8; 4];

    File::open(path)
        .and_then(|mut file| file.read_exact(&mut magic))
        .map_err(|e| DepthError::io(path, e))?;

    let sniffed = SniffedFile::new(path.to_path_buf(), magic);
    let kind = sniffed.kind();

    debug!(
        path = %path.display(),
        magic = ?magic,
        %kind,
        "Sniffed container"
    );

    if sniffed.extension_disagrees() {
        info!(
            "{} holds {} content but is named '.{}'; decoding by content",
            path.display(),
            kind,
            sniffed.extension()
        );
    }

    Ok(sniffed)
}

/// Classifies `path` by its magic bytes alone.
pub fn classify<P: AsRef<Path>>(path: P) -> Result<ContainerKind> {
    sniff(path).map(|sniffed| sniffed.kind())
}

/// Classifies an in-memory prefix. Returns `None` when fewer than four bytes
/// are available.
pub fn classify_bytes(data: &[u8]) -> Option<ContainerKind> {
    let magic = data.get(..4)?;
    Some(if magic == HDRC_MAGIC {
        ContainerKind::Hdrc
    } else {
        ContainerKind::ConventionalRaster
    })
}
