//! Common utilities module
//!
//! This module contains shared utilities used across the depth pipeline.

pub mod error;

pub use error::{DepthError, Result};
