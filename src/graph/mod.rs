//! Erdős–Rényi ソーシャルグラフの生成。
//! ノードは 0..N-1 のユーザーインデックスに対応する。

pub(crate) mod metrics;

use petgraph::{
    Undirected,
    graph::{Graph, NodeIndex},
};
use rand::Rng;

pub use metrics::StructuralFeatures;

/// Undirected random graph over synthetic users.
///
/// Node `i` of the underlying petgraph graph is user `i`; the generator
/// inserts nodes in index order so `NodeIndex::new(i)` is always valid for
/// `i < user_count`.
#[derive(Debug, Clone)]
pub struct SocialGraph {
    inner: Graph<usize, (), Undirected>,
}

impl SocialGraph {
    /// Generates an Erdős–Rényi graph: each of the n(n-1)/2 candidate
    /// edges is present independently with probability `edge_probability`.
    pub fn erdos_renyi<R: Rng>(user_count: usize, edge_probability: f64, rng: &mut R) -> Self {
        let mut inner = Graph::with_capacity(user_count, 0);
        for user in 0..user_count {
            inner.add_node(user);
        }
        for i in 0..user_count {
            for j in (i + 1)..user_count {
                if rng.gen_bool(edge_probability) {
                    inner.add_edge(NodeIndex::new(i), NodeIndex::new(j), ());
                }
            }
        }
        Self { inner }
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.inner.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Incident edge count for one user.
    #[must_use]
    pub fn degree(&self, user: usize) -> usize {
        self.inner.neighbors(NodeIndex::new(user)).count()
    }

    /// Neighbor user indices, unordered.
    pub fn neighbors(&self, user: usize) -> impl Iterator<Item = usize> + '_ {
        self.inner
            .neighbors(NodeIndex::new(user))
            .map(NodeIndex::index)
    }

    /// All edges as (user, user) pairs.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.inner
            .edge_indices()
            .filter_map(|edge| self.inner.edge_endpoints(edge))
            .map(|(a, b)| (a.index(), b.index()))
    }

    /// Adjacency lists indexed by user. Used by the metric passes, which
    /// walk neighborhoods repeatedly.
    #[must_use]
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.user_count()];
        for (a, b) in self.edges() {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
        adjacency
    }

    #[must_use]
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.inner
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .is_some()
    }

    /// Builds a graph from an explicit edge list, for metric tests.
    #[cfg(test)]
    pub(crate) fn from_edges(user_count: usize, edges: &[(usize, usize)]) -> Self {
        let mut inner = Graph::with_capacity(user_count, edges.len());
        for user in 0..user_count {
            inner.add_node(user);
        }
        for &(a, b) in edges {
            inner.add_edge(NodeIndex::new(a), NodeIndex::new(b), ());
        }
        Self { inner }
    }
}
