use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{GraphSegError, Result};

/// Caller-owned 8-bit input image in row-major, channel-interleaved layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl PixelGrid {
    /// Wrap a raw sample buffer.
    ///
    /// `data.len()` must equal `width * height * channels` and `channels`
    /// must be 1 (gray), 3 (RGB) or 4 (RGBA / RGB-D).
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GraphSegError::invalid_input(format!(
                "Image dimensions must be greater than zero, got {width}x{height}"
            )));
        }

        if width > crate::MAX_DIMENSION || height > crate::MAX_DIMENSION {
            return Err(GraphSegError::invalid_input(format!(
                "Image dimensions exceed maximum of {}",
                crate::MAX_DIMENSION
            )));
        }

        if !matches!(channels, 1 | 3 | 4) {
            return Err(GraphSegError::invalid_input(format!(
                "Unsupported channel count {channels}, expected 1, 3 or 4"
            )));
        }

        let pixels = width as usize * height as usize;
        if pixels > crate::MAX_PIXELS {
            return Err(GraphSegError::invalid_input(format!(
                "Image has {pixels} pixels, labels support at most {}",
                crate::MAX_PIXELS
            )));
        }

        let expected = pixels * channels as usize;
        if data.len() != expected {
            return Err(GraphSegError::invalid_input(format!(
                "Buffer holds {} bytes, {width}x{height}x{channels} requires {expected}",
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Convert a decoded image into the nearest 1/3/4 channel 8-bit layout.
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        let (channels, data) = match image {
            DynamicImage::ImageLuma8(buf) => (1, buf.as_raw().clone()),
            DynamicImage::ImageRgb8(buf) => (3, buf.as_raw().clone()),
            DynamicImage::ImageRgba8(buf) => (4, buf.as_raw().clone()),
            DynamicImage::ImageLuma16(_) => (1, image.to_luma8().into_raw()),
            DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgb32F(_) => {
                (3, image.to_rgb8().into_raw())
            }
            // Gray+alpha has no 2-channel counterpart here; keep the alpha plane.
            _ => (4, image.to_rgba8().into_raw()),
        };

        Self::new(width, height, channels, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Number of pixels (graph nodes)
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Raw interleaved samples
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Channel samples of the pixel at `(row, col)`
    pub fn pixel(&self, row: u32, col: u32) -> &[u8] {
        let c = self.channels as usize;
        let start = (row as usize * self.width as usize + col as usize) * c;
        &self.data[start..start + c]
    }
}

impl TryFrom<&DynamicImage> for PixelGrid {
    type Error = GraphSegError;

    fn try_from(image: &DynamicImage) -> Result<Self> {
        Self::from_dynamic(image)
    }
}

/// Segmentation output: one dense segment id per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelGrid {
    width: u32,
    height: u32,
    labels: Vec<i32>,
    num_segments: usize,
}

impl LabelGrid {
    pub(crate) fn new(width: u32, height: u32, labels: Vec<i32>, num_segments: usize) -> Self {
        debug_assert_eq!(labels.len(), width as usize * height as usize);
        Self {
            width,
            height,
            labels,
            num_segments,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Label of the pixel at `(row, col)`
    pub fn get(&self, row: u32, col: u32) -> i32 {
        self.labels[row as usize * self.width as usize + col as usize]
    }

    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    pub fn into_labels(self) -> Vec<i32> {
        self.labels
    }

    /// Number of distinct segments; labels span `0..num_segments`
    pub fn num_segments(&self) -> usize {
        self.num_segments
    }

    /// Pixel count of every segment, indexed by label
    pub fn segment_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.num_segments];
        for &label in &self.labels {
            sizes[label as usize] += 1;
        }
        sizes
    }

    /// Row-major membership mask for one segment
    pub fn mask(&self, label: i32) -> Vec<bool> {
        self.labels.iter().map(|&l| l == label).collect()
    }

    /// Render every segment with a stable pseudo-random colour.
    pub fn colorize(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            label_color(self.get(y, x))
        })
    }

    pub fn summary(&self) -> SegmentationSummary {
        let sizes = self.segment_sizes();
        let min = sizes.iter().copied().min().unwrap_or(0);
        let max = sizes.iter().copied().max().unwrap_or(0);
        let mean = if sizes.is_empty() {
            0.0
        } else {
            self.labels.len() as f64 / sizes.len() as f64
        };

        SegmentationSummary {
            width: self.width,
            height: self.height,
            num_segments: self.num_segments,
            min_segment_size: min,
            max_segment_size: max,
            mean_segment_size: mean,
        }
    }
}

/// Aggregate statistics of a label map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationSummary {
    pub width: u32,
    pub height: u32,
    pub num_segments: usize,
    pub min_segment_size: usize,
    pub max_segment_size: usize,
    pub mean_segment_size: f64,
}

fn label_color(label: i32) -> Rgb<u8> {
    // splitmix32-style scramble so neighbouring ids get distant colours
    let mut h = (label as u32).wrapping_add(0x9e37_79b9);
    h = (h ^ (h >> 16)).wrapping_mul(0x85eb_ca6b);
    h = (h ^ (h >> 13)).wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    let [r, g, b, _] = h.to_le_bytes();
    Rgb([r, g, b])
}
