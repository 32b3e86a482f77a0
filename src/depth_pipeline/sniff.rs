//! Content-based format detection
//!
//! The first four bytes of a file decide how it is decoded. File extensions
//! are only compared afterwards to surface a diagnostic when they disagree.

mod magic;
pub mod types;


pub use magic::{classify, classify_bytes, sniff, HDRC_MAGIC};
pub use types::{has_hdrc_extension, ContainerKind, SniffedFile, HDRC_EXTENSION};
