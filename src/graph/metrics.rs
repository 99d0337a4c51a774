//! Structural feature extraction: degree, local clustering coefficient,
//! betweenness centrality (Brandes).

use std::collections::VecDeque;

use rayon::prelude::*;

use super::SocialGraph;

/// Per-node structural features, row `i` describing user `i`.
#[derive(Debug, Clone)]
pub struct StructuralFeatures {
    pub degree: Vec<usize>,
    pub clustering: Vec<f64>,
    pub betweenness: Vec<f64>,
}

impl StructuralFeatures {
    /// Extracts all structural features in one pass over the graph.
    #[must_use]
    pub fn extract(graph: &SocialGraph) -> Self {
        let adjacency = graph.adjacency();
        let degree: Vec<usize> = adjacency.iter().map(Vec::len).collect();
        let clustering = clustering_coefficients(graph, &adjacency);
        let betweenness = betweenness_centrality(&adjacency);
        Self {
            degree,
            clustering,
            betweenness,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.degree.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.degree.is_empty()
    }
}

/// Fraction of a node's neighbor pairs that are themselves connected.
/// Nodes with fewer than two neighbors score 0.0.
fn clustering_coefficients(graph: &SocialGraph, adjacency: &[Vec<usize>]) -> Vec<f64> {
    adjacency
        .iter()
        .map(|neighbors| {
            let k = neighbors.len();
            if k < 2 {
                return 0.0;
            }
            let mut closed = 0usize;
            for (i, &a) in neighbors.iter().enumerate() {
                for &b in &neighbors[i + 1..] {
                    if graph.has_edge(a, b) {
                        closed += 1;
                    }
                }
            }
            closed as f64 / (k * (k - 1) / 2) as f64
        })
        .collect()
}

/// Brandes betweenness centrality over the unweighted graph.
///
/// Each source contributes one BFS plus a dependency accumulation; sources
/// run in parallel and the per-source deltas are summed. The accumulation
/// counts every ordered (s, t) pair, so dividing by (n-1)(n-2) yields the
/// undirected normalization with values in [0, 1].
fn betweenness_centrality(adjacency: &[Vec<usize>]) -> Vec<f64> {
    let n = adjacency.len();
    if n < 3 {
        return vec![0.0; n];
    }

    let centrality = (0..n)
        .into_par_iter()
        .map(|source| single_source_dependencies(adjacency, source))
        .reduce(
            || vec![0.0; n],
            |mut acc, partial| {
                for (total, value) in acc.iter_mut().zip(partial) {
                    *total += value;
                }
                acc
            },
        );

    let norm = 1.0 / ((n - 1) * (n - 2)) as f64;
    centrality.into_iter().map(|c| c * norm).collect()
}

fn single_source_dependencies(adjacency: &[Vec<usize>], source: usize) -> Vec<f64> {
    let n = adjacency.len();
    let mut stack: Vec<usize> = Vec::with_capacity(n);
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0f64; n];
    let mut dist = vec![-1i64; n];

    sigma[source] = 1.0;
    dist[source] = 0;

    let mut queue = VecDeque::new();
    queue.push_back(source);

    while let Some(v) = queue.pop_front() {
        stack.push(v);
        for &w in &adjacency[v] {
            if dist[w] < 0 {
                dist[w] = dist[v] + 1;
                queue.push_back(w);
            }
            if dist[w] == dist[v] + 1 {
                sigma[w] += sigma[v];
                predecessors[w].push(v);
            }
        }
    }

    let mut delta = vec![0.0f64; n];
    let mut dependency = vec![0.0f64; n];
    while let Some(w) = stack.pop() {
        for &v in &predecessors[w] {
            delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
        }
        if w != source {
            dependency[w] = delta[w];
        }
    }
    dependency
}
