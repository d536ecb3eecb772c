use std::time::Instant;

use image::DynamicImage;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{GraphSegError, Result};
use crate::graph::build_edges;
use crate::grid::{LabelGrid, PixelGrid};
use crate::merge::{label_components, merge, post_merge_small_components};
use crate::smoothing::smooth;

/// Parameters of graph-based segmentation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationParams {
    /// Gaussian smoothing strength; `<= 0` disables smoothing
    pub sigma: f64,
    /// Merge threshold scale; larger values favour larger segments
    pub k: f32,
    /// Minimum segment size in pixels; `<= 0` disables the size post-pass
    pub min_size: i32,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            sigma: crate::DEFAULT_SIGMA,
            k: crate::DEFAULT_K,
            min_size: crate::DEFAULT_MIN_SIZE,
        }
    }
}

impl SegmentationParams {
    pub fn new(sigma: f64, k: f32, min_size: i32) -> Self {
        Self { sigma, k, min_size }
    }

    /// Reject parameters outside their documented range
    pub fn validate(&self) -> Result<()> {
        if !self.sigma.is_finite() {
            return Err(GraphSegError::invalid_input(format!(
                "sigma must be finite, got {}",
                self.sigma
            )));
        }

        if !self.k.is_finite() || self.k < 0.0 {
            return Err(GraphSegError::invalid_input(format!(
                "k must be finite and non-negative, got {}",
                self.k
            )));
        }

        Ok(())
    }
}

/// Segment `image` into regions of similar colour.
///
/// Smooths with `sigma`, merges along the 8-connected pixel graph with scale
/// `k`, then absorbs segments smaller than `min_size`. Labels are dense in
/// `0..num_segments`, numbered in row-major order of first appearance.
pub fn segment(image: &PixelGrid, sigma: f64, k: f32, min_size: i32) -> Result<LabelGrid> {
    let params = SegmentationParams::new(sigma, k, min_size);
    params.validate()?;

    let (width, height) = (image.width(), image.height());
    debug!(
        "segmenting {}x{}x{} image (sigma={}, k={}, min_size={})",
        width,
        height,
        image.channels(),
        sigma,
        k,
        min_size
    );

    let start = Instant::now();
    let smoothed = smooth(image, sigma)?;
    debug!("smoothing took {:?}", start.elapsed());

    let start = Instant::now();
    let edges = build_edges(&smoothed)?;
    drop(smoothed);
    debug!("graph construction took {:?} ({} edges)", start.elapsed(), edges.len());

    let start = Instant::now();
    let forest = merge(&edges, image.pixel_count(), k)?;
    let merged = forest.component_count();
    let mut forest = post_merge_small_components(forest, &edges, min_size);
    drop(edges);
    debug!(
        "merging took {:?} ({} components, {} after size post-pass)",
        start.elapsed(),
        merged,
        forest.component_count()
    );

    label_components(&mut forest, width, height)
}

/// Reusable segmentation settings with the classic property surface.
///
/// Holds only values; cloning or dropping it has no side effects.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Segmenter {
    params: SegmentationParams,
}

impl Segmenter {
    /// Create a segmenter with explicit parameters
    pub fn new(params: SegmentationParams) -> Self {
        Self { params }
    }

    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.params.sigma = sigma;
        self
    }

    pub fn with_k(mut self, k: f32) -> Self {
        self.params.k = k;
        self
    }

    pub fn with_min_size(mut self, min_size: i32) -> Self {
        self.params.min_size = min_size;
        self
    }

    pub fn params(&self) -> SegmentationParams {
        self.params
    }

    pub fn sigma(&self) -> f64 {
        self.params.sigma
    }

    pub fn set_sigma(&mut self, sigma: f64) {
        self.params.sigma = sigma;
    }

    pub fn k(&self) -> f32 {
        self.params.k
    }

    pub fn set_k(&mut self, k: f32) {
        self.params.k = k;
    }

    pub fn min_size(&self) -> i32 {
        self.params.min_size
    }

    pub fn set_min_size(&mut self, min_size: i32) {
        self.params.min_size = min_size;
    }

    /// Segment a raw pixel grid
    pub fn process_image(&self, image: &PixelGrid) -> Result<LabelGrid> {
        let SegmentationParams { sigma, k, min_size } = self.params;
        segment(image, sigma, k, min_size)
    }

    /// Segment a decoded image, converting it to an 8-bit grid first
    pub fn process_dynamic(&self, image: &DynamicImage) -> Result<LabelGrid> {
        let grid = PixelGrid::from_dynamic(image)?;
        self.process_image(&grid)
    }
}

impl From<SegmentationParams> for Segmenter {
    fn from(params: SegmentationParams) -> Self {
        Self::new(params)
    }
}
