//! Stage 3: region growing over the sorted edge list.
//!
//! Runs on a single thread. Every merge decision reads component sizes and
//! internal differences left behind by the previous edge.

use crate::error::{GraphSegError, Result};
use crate::forest::DisjointSetForest;
use crate::graph::Edge;
use crate::grid::LabelGrid;

/// Merge components along `edges` (ascending weight) with scale `k`.
///
/// Two components join iff the edge weight is no larger than the smaller of
/// their thresholds `internal_difference + k / size`.
pub fn merge(edges: &[Edge], node_count: usize, k: f32) -> Result<DisjointSetForest> {
    let mut forest = DisjointSetForest::new(node_count)?;

    for edge in edges {
        let a = forest.find(edge.a);
        let b = forest.find(edge.b);
        if a == b {
            continue;
        }

        let limit = forest.threshold(a, k).min(forest.threshold(b, k));
        if edge.weight <= limit {
            forest.union(a, b, edge.weight);
        }
    }

    Ok(forest)
}

/// Absorb every component smaller than `min_size` into a neighbour.
///
/// Walks the same sorted edges once more and merges unconditionally whenever
/// either side is still too small. `min_size <= 0` leaves the forest as is.
pub fn post_merge_small_components(
    mut forest: DisjointSetForest,
    edges: &[Edge],
    min_size: i32,
) -> DisjointSetForest {
    let Ok(min_size) = usize::try_from(min_size) else {
        return forest;
    };
    if min_size == 0 {
        return forest;
    }

    for edge in edges {
        let a = forest.find(edge.a);
        let b = forest.find(edge.b);
        if a != b && (forest.size(a) < min_size || forest.size(b) < min_size) {
            forest.union(a, b, edge.weight);
        }
    }

    forest
}

/// Assign dense ids to the final components in row-major discovery order.
pub fn label_components(
    forest: &mut DisjointSetForest,
    width: u32,
    height: u32,
) -> Result<LabelGrid> {
    let node_count = forest.len();
    debug_assert_eq!(node_count, width as usize * height as usize);

    let mut root_label = GraphSegError::try_vec(node_count, -1i32, "label map")?;
    let mut labels = GraphSegError::try_vec(node_count, 0i32, "label map")?;
    let mut next = 0i32;

    for (node, label) in labels.iter_mut().enumerate() {
        let root = forest.find(node);
        if root_label[root] < 0 {
            root_label[root] = next;
            next += 1;
        }
        *label = root_label[root];
    }

    debug_assert_eq!(next as usize, forest.component_count());
    Ok(LabelGrid::new(width, height, labels, next as usize))
}
