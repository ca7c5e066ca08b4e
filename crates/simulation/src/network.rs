//! Random contact network construction.

use contagion_graph::{Graph, GraphError};
use contagion_types::NodeIndex;
use rand::Rng;
use tracing::{debug, info};

/// Outcome of building a contact network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkSummary {
    /// Connection attempts drawn.
    pub attempts: usize,
    /// Edges actually added.
    pub edges_added: usize,
    /// Attempts naming an existing edge.
    pub duplicates: usize,
    /// Attempts refused because an endpoint was at the fan-out bound.
    pub saturated: usize,
}

/// Connect random pairs of nodes without letting any degree exceed
/// `max_fanout`.
///
/// Every node in index order draws a number of attempts in
/// `0..=max_fanout`, and for each attempt a uniformly random peer other
/// than itself. Pool exhaustion is returned rather than swallowed.
pub fn build_contact_network<R: Rng + ?Sized>(
    graph: &mut Graph,
    rng: &mut R,
    max_fanout: usize,
) -> Result<NetworkSummary, GraphError> {
    let mut summary = NetworkSummary::default();
    let population = graph.population_size();
    if population < 2 || max_fanout == 0 {
        return Ok(summary);
    }

    for node in 0..population as NodeIndex {
        let attempts = rng.gen_range(0..=max_fanout);
        for _ in 0..attempts {
            let peer = random_peer(rng, population, node);
            summary.attempts += 1;

            if graph.degree(node) >= max_fanout || graph.degree(peer) >= max_fanout {
                summary.saturated += 1;
                continue;
            }
            if graph.connect(node, peer)? {
                summary.edges_added += 1;
            } else {
                summary.duplicates += 1;
            }
        }
        debug!(node, degree = graph.degree(node), "Connected node");
    }

    info!(
        attempts = summary.attempts,
        edges = summary.edges_added,
        duplicates = summary.duplicates,
        saturated = summary.saturated,
        "Built contact network"
    );
    Ok(summary)
}

/// Uniform node index in `0..population` other than `exclude`.
fn random_peer<R: Rng + ?Sized>(rng: &mut R, population: usize, exclude: NodeIndex) -> NodeIndex {
    let peer = rng.gen_range(0..population - 1) as NodeIndex;
    if peer >= exclude {
        peer + 1
    } else {
        peer
    }
}
