#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

//! graphseg - Efficient graph-based image segmentation
//!
//! Implements the algorithm of Felzenszwalb & Huttenlocher (2004). An 8-bit
//! image is smoothed, turned into an 8-connected graph whose edge weights are
//! colour distances, and grown into regions with a union-find forest: two
//! regions merge when the edge between them is no heavier than either
//! region's internal difference plus `k / size`. A final pass absorbs regions
//! below a minimum pixel count.
//!
//! The library is a set of pure functions over in-memory buffers; [`segment`]
//! is the entry point.

pub mod error;
pub mod forest;
pub mod graph;
pub mod grid;
pub mod merge;
pub mod segmenter;
pub mod smoothing;

pub use error::{GraphSegError, Result};
pub use grid::{LabelGrid, PixelGrid, SegmentationSummary};
pub use segmenter::{segment, SegmentationParams, Segmenter};

/// Default Gaussian smoothing sigma
pub const DEFAULT_SIGMA: f64 = 0.5;

/// Default merge threshold scale
pub const DEFAULT_K: f32 = 300.0;

/// Default minimum segment size in pixels
pub const DEFAULT_MIN_SIZE: i32 = 100;

/// Maximum supported image width or height
pub const MAX_DIMENSION: u32 = 65536;

/// Maximum pixel count; labels are 32-bit signed integers
pub const MAX_PIXELS: usize = i32::MAX as usize;
