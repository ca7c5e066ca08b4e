//! Fixtures shared by the contagion test suites.
//!
//! Every graph returned here is populated and enrolled, with a link pool
//! sized exactly for its membership records and edges.

use contagion_graph::Graph;
use contagion_types::NodeIndex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Deterministic RNG for tests.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// `size` enrolled nodes and no edges, with pool room for `max_fanout`
/// neighbours per node.
pub fn enrolled_graph(size: usize, max_fanout: usize) -> Graph {
    let capacity =
        Graph::pool_capacity_for(size, max_fanout).expect("fixture pool size overflows");
    let mut graph = Graph::new(capacity).expect("fixture pool allocation failed");
    graph
        .create_population(size)
        .expect("fixture population allocation failed");
    graph
        .enroll_susceptible()
        .expect("fixture enrollment failed");
    graph
}

/// Graph with exactly the given undirected edges.
pub fn graph_with_edges(size: usize, edges: &[(NodeIndex, NodeIndex)]) -> Graph {
    let mut graph = Graph::new(size + 2 * edges.len()).expect("fixture pool allocation failed");
    graph
        .create_population(size)
        .expect("fixture population allocation failed");
    graph
        .enroll_susceptible()
        .expect("fixture enrollment failed");
    for &(a, b) in edges {
        assert!(
            graph.connect(a, b).expect("fixture pool exhausted"),
            "fixture edge ({a}, {b}) is a duplicate or self loop"
        );
    }
    graph
}

/// Two connected nodes.
pub fn pair_graph() -> Graph {
    graph_with_edges(2, &[(0, 1)])
}

/// Node 0 connected to each of `leaves` other nodes.
pub fn star_graph(leaves: usize) -> Graph {
    let edges: Vec<_> = (1..=leaves as NodeIndex).map(|leaf| (0, leaf)).collect();
    graph_with_edges(leaves + 1, &edges)
}

/// `size` nodes joined in a path `0 - 1 - ... - size-1`.
pub fn line_graph(size: usize) -> Graph {
    let edges: Vec<_> = (1..size as NodeIndex).map(|n| (n - 1, n)).collect();
    graph_with_edges(size, &edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contagion_types::NodeState;

    #[test]
    fn test_fixture_shapes() {
        let star = star_graph(4);
        assert_eq!(star.population_size(), 5);
        assert_eq!(star.edge_count(), 4);
        assert_eq!(star.node(0).unwrap().degree(), 4);
        assert_eq!(star.pool_len(), star.pool_capacity());

        let line = line_graph(5);
        assert_eq!(line.edge_count(), 4);
        assert_eq!(line.neighbors(2).collect::<Vec<_>>(), vec![1, 3]);

        let empty = enrolled_graph(4, 0);
        assert_eq!(empty.edge_count(), 0);
        assert_eq!(empty.partition_len(NodeState::Susceptible), 4);
    }
}
