//! Stage 2: 8-connected pixel graph and its ascending edge order.

use std::cmp::Ordering;

#[cfg(feature = "performance")]
use rayon::prelude::*;

use crate::error::{GraphSegError, Result};
use crate::smoothing::FloatImage;

/// Undirected edge between two pixel nodes (linear indices `row * width + col`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub weight: f32,
}

impl Edge {
    /// Total order: weight, then endpoints.
    ///
    /// Equal-weight edges may be merged in any order without changing the
    /// algorithm's guarantees; the endpoint tie-break only pins this
    /// implementation to one reproducible sequence.
    pub fn ordering(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then(self.a.cmp(&other.a))
            .then(self.b.cmp(&other.b))
    }
}

/// Exact number of edges [`build_edges`] emits for a `width x height` grid.
pub fn edge_count(width: usize, height: usize) -> usize {
    if width == 0 || height == 0 {
        return 0;
    }
    let right = (width - 1) * height;
    let down = width * (height - 1);
    let diagonals = 2 * (width - 1) * (height - 1);
    right + down + diagonals
}

/// Euclidean distance between two channel vectors.
#[inline]
pub fn color_distance(p: &[f32], q: &[f32]) -> f32 {
    p.iter()
        .zip(q)
        .map(|(a, b)| {
            let d = a - b;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// Build the edge list of the smoothed image, sorted by ascending weight.
///
/// Each pixel links to its right, below, below-right and below-left
/// neighbours, which covers every 8-connected pair exactly once.
pub fn build_edges(image: &FloatImage) -> Result<Vec<Edge>> {
    let (width, height) = (image.width(), image.height());
    let count = edge_count(width, height);

    let mut edges = Vec::new();
    edges
        .try_reserve_exact(count)
        .map_err(|e| GraphSegError::allocation("edge list", e))?;

    for y in 0..height {
        for x in 0..width {
            let a = y * width + x;
            let mut link = |b: usize| edges.push(Edge { a, b, weight: 0.0 });

            if x + 1 < width {
                link(a + 1);
            }
            if y + 1 < height {
                link(a + width);
                if x + 1 < width {
                    link(a + width + 1);
                }
                if x > 0 {
                    link(a + width - 1);
                }
            }
        }
    }
    debug_assert_eq!(edges.len(), count);

    assign_weights(image, &mut edges);
    sort_edges(&mut edges);

    log::trace!("built {} edges for {}x{} image", edges.len(), width, height);
    Ok(edges)
}

#[cfg(feature = "performance")]
fn assign_weights(image: &FloatImage, edges: &mut [Edge]) {
    edges
        .par_iter_mut()
        .for_each(|e| e.weight = color_distance(image.pixel(e.a), image.pixel(e.b)));
}

#[cfg(not(feature = "performance"))]
fn assign_weights(image: &FloatImage, edges: &mut [Edge]) {
    for e in edges.iter_mut() {
        e.weight = color_distance(image.pixel(e.a), image.pixel(e.b));
    }
}

/// Sort ascending by [`Edge::ordering`].
pub fn sort_edges(edges: &mut [Edge]) {
    #[cfg(feature = "performance")]
    edges.par_sort_unstable_by(Edge::ordering);

    #[cfg(not(feature = "performance"))]
    edges.sort_unstable_by(Edge::ordering);
}
