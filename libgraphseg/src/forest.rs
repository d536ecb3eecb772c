use crate::error::{GraphSegError, Result};

/// Union-find over pixel nodes, tracking per-component size and internal
/// difference (largest edge weight merged into the component so far).
///
/// Size and internal difference are only meaningful at roots.
#[derive(Debug, Clone)]
pub struct DisjointSetForest {
    parent: Vec<usize>,
    size: Vec<usize>,
    internal_difference: Vec<f32>,
    components: usize,
}

impl DisjointSetForest {
    /// Create `node_count` singleton components.
    pub fn new(node_count: usize) -> Result<Self> {
        let mut parent = Vec::new();
        parent
            .try_reserve_exact(node_count)
            .map_err(|e| GraphSegError::allocation("disjoint-set forest", e))?;
        parent.extend(0..node_count);

        Ok(Self {
            parent,
            size: GraphSegError::try_vec(node_count, 1, "disjoint-set forest")?,
            internal_difference: GraphSegError::try_vec(node_count, 0.0, "disjoint-set forest")?,
            components: node_count,
        })
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Number of disjoint components
    pub fn component_count(&self) -> usize {
        self.components
    }

    /// Root of `node`, compressing the path behind it.
    pub fn find(&mut self, node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut cur = node;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    pub fn size(&self, root: usize) -> usize {
        self.size[root]
    }

    pub fn internal_difference(&self, root: usize) -> f32 {
        self.internal_difference[root]
    }

    /// `internal_difference(C) + k / size(C)`
    pub fn threshold(&self, root: usize, k: f32) -> f32 {
        self.internal_difference[root] + k / self.size[root] as f32
    }

    /// Join two distinct roots through an edge of weight `weight`.
    ///
    /// The smaller tree hangs under the larger one (ties keep `a` as root).
    /// Returns the surviving root.
    pub fn union(&mut self, a: usize, b: usize, weight: f32) -> usize {
        debug_assert_eq!(self.parent[a], a);
        debug_assert_eq!(self.parent[b], b);
        debug_assert_ne!(a, b);

        let (root, child) = if self.size[a] >= self.size[b] {
            (a, b)
        } else {
            (b, a)
        };

        self.parent[child] = root;
        self.size[root] += self.size[child];
        self.internal_difference[root] = weight
            .max(self.internal_difference[root])
            .max(self.internal_difference[child]);
        self.components -= 1;
        root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_attaches_smaller_tree() {
        let mut forest = DisjointSetForest::new(4).unwrap();
        let ab = forest.union(0, 1, 1.0);
        let root = forest.union(2, ab, 2.0);

        assert_eq!(root, ab);
        assert_eq!(forest.size(root), 3);
        assert_eq!(forest.internal_difference(root), 2.0);
        assert_eq!(forest.component_count(), 2);
        assert_eq!(forest.find(2), root);
        assert_eq!(forest.find(3), 3);
    }

    #[test]
    fn find_compresses_paths() {
        let mut forest = DisjointSetForest::new(3).unwrap();
        // chain 2 -> 1 -> 0
        forest.parent[2] = 1;
        forest.parent[1] = 0;

        assert_eq!(forest.find(2), 0);
        assert_eq!(forest.parent[2], 0);
    }

    #[test]
    fn threshold_shrinks_with_size() {
        let mut forest = DisjointSetForest::new(2).unwrap();
        assert_eq!(forest.threshold(0, 300.0), 300.0);

        let root = forest.union(0, 1, 0.5);
        assert_eq!(forest.threshold(root, 300.0), 150.5);
    }
}
