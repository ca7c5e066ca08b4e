//! Diagnostic dumps of the contact graph.

use contagion_graph::{Graph, Node};
use contagion_types::{NodeId, NodeIndex, NodeState};
use tracing::info;

/// Identifiers of the nodes in the partition for `state`, in list order.
pub fn partition_members(graph: &Graph, state: NodeState) -> Vec<NodeId> {
    graph
        .partition(state)
        .filter_map(|index| graph.node(index).map(Node::id))
        .collect()
}

/// One `"<id>: <neighbour ids>"` line per node, in index order.
pub fn adjacency_lines(graph: &Graph) -> Vec<String> {
    graph
        .nodes()
        .enumerate()
        .map(|(index, node)| {
            let neighbours: Vec<String> = graph
                .neighbors(index as NodeIndex)
                .filter_map(|peer| graph.node(peer))
                .map(|peer| peer.id().0.to_string())
                .collect();
            format!("{}: {}", node.id(), neighbours.join(" "))
        })
        .collect()
}

/// Log the members of every partition.
pub fn dump_partitions(graph: &Graph) {
    for state in NodeState::ALL {
        let members = partition_members(graph, state);
        let members: Vec<String> = members.iter().map(|id| id.0.to_string()).collect();
        info!(%state, size = members.len(), members = %members.join(" "), "Partition");
    }
}

/// Log every node's neighbours.
pub fn dump_adjacency(graph: &Graph) {
    info!(nodes = graph.population_size(), edges = graph.edge_count(), "Adjacency");
    for line in adjacency_lines(graph) {
        info!("{line}");
    }
}
