//! Stage 1: separable Gaussian smoothing.
//!
//! Every channel is blurred independently with a 1-D kernel, first along
//! rows and then along columns. Each axis gets its own kernel, folded onto the
//! reflect period when the Gaussian is wider than the image. Borders are mirrored without repeating
//! the edge sample (reflect-101), so `… 2 1 | 0 1 2 … n-1 | n-2 n-3 …`.

#[cfg(feature = "performance")]
use rayon::prelude::*;

use crate::error::{GraphSegError, Result};
use crate::grid::PixelGrid;

/// Owned multi-channel f32 image, row-major and channel-interleaved.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatImage {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<f32>,
}

impl FloatImage {
    /// Convert 8-bit samples to f32 without rescaling.
    pub fn from_pixels(image: &PixelGrid) -> Result<Self> {
        let bytes = image.as_bytes();
        let mut data = Vec::new();
        data.try_reserve_exact(bytes.len())
            .map_err(|e| GraphSegError::allocation("smoothing buffer", e))?;
        data.extend(bytes.iter().map(|&v| f32::from(v)));

        Ok(Self {
            width: image.width() as usize,
            height: image.height() as usize,
            channels: image.channels() as usize,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Channel vector of the pixel with linear index `node`
    #[inline]
    pub fn pixel(&self, node: usize) -> &[f32] {
        let start = node * self.channels;
        &self.data[start..start + self.channels]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    fn row_len(&self) -> usize {
        self.width * self.channels
    }

    /// Same geometry around a new sample buffer
    fn with_data(&self, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), self.data.len());
        Self {
            width: self.width,
            height: self.height,
            channels: self.channels,
            data,
        }
    }
}

/// Kernel periods folded at most when the radius exceeds the reflect period.
const MAX_FOLDED_PERIODS: usize = 64;

/// 1-D Gaussian for one image axis; `weights[i]` applies to offset `origin + i`.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisKernel {
    origin: isize,
    weights: Vec<f32>,
}

impl AxisKernel {
    /// Offset of the first tap
    pub fn origin(&self) -> isize {
        self.origin
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }
}

#[inline]
fn gaussian_tap(offset: f64, sigma: f64) -> f64 {
    (-0.5 * (offset / sigma).powi(2)).exp()
}

/// Normalised Gaussian taps for an axis of `len` samples.
///
/// Covers `[-r, r]` with `r = ceil(4 * sigma)`. Once `r` reaches the
/// reflect-101 period `2 * (len - 1)` the taps are folded onto that period,
/// so the kernel never grows past twice the axis length. Folding sums at most
/// `MAX_FOLDED_PERIODS` periods on each side; that far out the folded taps
/// are already close to uniform over the period.
///
/// Callers must pass a finite, positive `sigma`.
pub fn axis_kernel(sigma: f64, len: usize) -> Result<AxisKernel> {
    if len <= 1 {
        return Ok(AxisKernel {
            origin: 0,
            weights: vec![1.0],
        });
    }

    let radius = ((4.0 * sigma).ceil() as usize).max(1);
    let period = 2 * (len - 1);

    if radius < period {
        let mut raw = GraphSegError::try_vec(2 * radius + 1, 0.0f64, "gaussian kernel")?;
        for (i, w) in raw.iter_mut().enumerate() {
            *w = gaussian_tap(i as f64 - radius as f64, sigma);
        }
        return normalise(-(radius as isize), &raw);
    }

    let reach = radius.min(MAX_FOLDED_PERIODS * period) as isize;
    let mut raw = GraphSegError::try_vec(period, 0.0f64, "gaussian kernel")?;
    for offset in -reach..=reach {
        raw[offset.rem_euclid(period as isize) as usize] += gaussian_tap(offset as f64, sigma);
    }
    normalise(0, &raw)
}

fn normalise(origin: isize, raw: &[f64]) -> Result<AxisKernel> {
    // the centre tap is exactly 1, so the sum is never zero
    let sum: f64 = raw.iter().sum();
    let mut weights = Vec::new();
    weights
        .try_reserve_exact(raw.len())
        .map_err(|e| GraphSegError::allocation("gaussian kernel", e))?;
    weights.extend(raw.iter().map(|w| (w / sum) as f32));
    Ok(AxisKernel { origin, weights })
}

/// Blur `image` with a Gaussian of standard deviation `sigma`.
///
/// `sigma <= 0` is the identity: samples come back as exact f32 copies.
pub fn smooth(image: &PixelGrid, sigma: f64) -> Result<FloatImage> {
    if !sigma.is_finite() {
        return Err(GraphSegError::invalid_input(format!(
            "sigma must be finite, got {sigma}"
        )));
    }

    let source = FloatImage::from_pixels(image)?;
    if sigma <= 0.0 {
        return Ok(source);
    }

    let horizontal = convolve_rows(&source, &axis_kernel(sigma, source.width)?)?;
    convolve_columns(&horizontal, &axis_kernel(sigma, source.height)?)
}

fn convolve_rows(src: &FloatImage, kernel: &AxisKernel) -> Result<FloatImage> {
    let (width, channels) = (src.width, src.channels);
    let row_len = src.row_len();
    let mut data = GraphSegError::try_vec(src.data.len(), 0.0f32, "smoothing buffer")?;

    for_each_row(&mut data, row_len, |y, out| {
        let row = &src.data[y * row_len..(y + 1) * row_len];
        for x in 0..width {
            for c in 0..channels {
                let mut acc = 0.0f32;
                for (i, &w) in kernel.weights.iter().enumerate() {
                    let sx = reflect_101(x as isize + kernel.origin + i as isize, width);
                    acc += w * row[sx * channels + c];
                }
                out[x * channels + c] = acc;
            }
        }
    });

    Ok(src.with_data(data))
}

fn convolve_columns(src: &FloatImage, kernel: &AxisKernel) -> Result<FloatImage> {
    let height = src.height;
    let row_len = src.row_len();
    let mut data = GraphSegError::try_vec(src.data.len(), 0.0f32, "smoothing buffer")?;

    for_each_row(&mut data, row_len, |y, out| {
        for (i, &w) in kernel.weights.iter().enumerate() {
            let sy = reflect_101(y as isize + kernel.origin + i as isize, height);
            let row = &src.data[sy * row_len..(sy + 1) * row_len];
            for (o, &v) in out.iter_mut().zip(row) {
                *o += w * v;
            }
        }
    });

    Ok(src.with_data(data))
}

#[cfg(feature = "performance")]
fn for_each_row<F>(data: &mut [f32], row_len: usize, f: F)
where
    F: Fn(usize, &mut [f32]) + Sync + Send,
{
    data.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

#[cfg(not(feature = "performance"))]
fn for_each_row<F>(data: &mut [f32], row_len: usize, f: F)
where
    F: Fn(usize, &mut [f32]),
{
    data.chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

/// Mirror an out-of-range coordinate back into `0..n`.
#[inline]
fn reflect_101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let period = 2 * (n - 1);
    let mut i = i.rem_euclid(period);
    if i >= n {
        i = period - i;
    }
    i as usize
}
