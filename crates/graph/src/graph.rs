//! Population, adjacency and membership partitions.

use crate::{GraphError, LinkHandle, LinkList, LinkPool, ListIter};
use contagion_types::{NodeId, NodeIdGenerator, NodeIndex, NodeState};
use tracing::{debug, info};

/// A member of the population.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    state: NodeState,
    /// Already processed as an initial spreader.
    seeded: bool,
    adjacency: LinkList,
}

impl Node {
    /// Identifier assigned at creation.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Current compartment.
    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Whether the node was seeded as an initial spreader.
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Number of neighbours.
    pub fn degree(&self) -> usize {
        self.adjacency.len()
    }
}

/// The contact graph and its membership partitions.
///
/// Owns the link pool, the node population, the three partitions, the edge
/// counter and the identifier generator. Nothing here is global: every
/// operation goes through a `Graph` value.
#[derive(Debug)]
pub struct Graph {
    nodes: Vec<Node>,
    pool: LinkPool,
    /// Indexed by [`NodeState::index`].
    partitions: [LinkList; 3],
    edge_count: usize,
    ids: NodeIdGenerator,
}

impl Graph {
    /// Create an empty graph whose pool holds `pool_capacity` records.
    pub fn new(pool_capacity: usize) -> Result<Self, GraphError> {
        Self::with_id_generator(pool_capacity, NodeIdGenerator::new())
    }

    /// Create an empty graph that issues identifiers from `ids`.
    pub fn with_id_generator(
        pool_capacity: usize,
        ids: NodeIdGenerator,
    ) -> Result<Self, GraphError> {
        Ok(Self {
            nodes: Vec::new(),
            pool: LinkPool::with_capacity(pool_capacity)?,
            partitions: Default::default(),
            edge_count: 0,
            ids,
        })
    }

    /// Pool size covering one partition entry per node plus both records of
    /// every edge when no node exceeds `max_fanout` neighbours.
    ///
    /// Returns `None` on arithmetic overflow.
    pub fn pool_capacity_for(population: usize, max_fanout: usize) -> Option<usize> {
        population
            .checked_mul(max_fanout)
            .and_then(|adjacency| adjacency.checked_add(population))
    }

    /// Allocate `size` Susceptible nodes with fresh ascending identifiers.
    pub fn create_population(&mut self, size: usize) -> Result<(), GraphError> {
        if !self.nodes.is_empty() {
            return Err(GraphError::PopulationExists {
                size: self.nodes.len(),
            });
        }

        let ids = self.ids.allocate(size)?;
        self.pool.prepare()?;
        self.nodes
            .try_reserve_exact(size)
            .map_err(|_| GraphError::AllocationFailure {
                what: "nodes",
                count: size,
            })?;
        self.nodes.extend(ids.map(|id| Node {
            id,
            state: NodeState::Susceptible,
            seeded: false,
            adjacency: LinkList::new(),
        }));

        info!(
            size,
            first_id = ?self.nodes.first().map(Node::id),
            pool_capacity = self.pool.capacity(),
            "Created population"
        );
        Ok(())
    }

    /// Put every node into the Susceptible partition.
    ///
    /// Draws one pool record per node.
    pub fn enroll_susceptible(&mut self) -> Result<(), GraphError> {
        if self.partitions.iter().any(|list| !list.is_empty()) {
            return Err(GraphError::AlreadyEnrolled);
        }

        for index in 0..self.nodes.len() as NodeIndex {
            self.nodes[index as usize].state = NodeState::Susceptible;
            self.list_append(index, NodeState::Susceptible)?;
        }
        Ok(())
    }

    /// Add an undirected edge between `a` and `b`.
    ///
    /// Returns `Ok(false)` without touching the pool for self loops and
    /// existing edges. Fails with [`GraphError::PoolExhausted`] when the pool
    /// cannot supply both records; no half edge is ever left behind.
    ///
    /// # Panics
    ///
    /// Panics if either index is outside the population.
    pub fn connect(&mut self, a: NodeIndex, b: NodeIndex) -> Result<bool, GraphError> {
        assert!(self.contains(a), "connect: node index {a} out of range");
        assert!(self.contains(b), "connect: node index {b} out of range");

        if a == b || self.nodes[a as usize].adjacency.contains(&self.pool, b) {
            return Ok(false);
        }
        if self.pool.available() < 2 {
            return Err(GraphError::PoolExhausted {
                capacity: self.pool.capacity(),
            });
        }

        let to_b = self.pool.alloc(b)?;
        self.nodes[a as usize].adjacency.append(&mut self.pool, to_b);
        let to_a = self.pool.alloc(a)?;
        self.nodes[b as usize].adjacency.append(&mut self.pool, to_a);
        self.edge_count += 1;
        Ok(true)
    }

    /// Append a new record for `node` to the partition for `state`.
    pub fn list_append(&mut self, node: NodeIndex, state: NodeState) -> Result<(), GraphError> {
        let handle = self.pool.alloc(node)?;
        self.partitions[state.index()].append(&mut self.pool, handle);
        Ok(())
    }

    /// Unlink `node` from the partition for `state`, returning its record.
    pub fn list_remove(&mut self, node: NodeIndex, state: NodeState) -> Option<LinkHandle> {
        self.partitions[state.index()].remove(&mut self.pool, node)
    }

    /// Move `node` into the partition for `to` and update its state.
    ///
    /// The record is removed from the partition matching the node's current
    /// state and threaded into the target partition, so no pool record is
    /// consumed. Moving to the current state is a no-op.
    pub fn move_to_partition(&mut self, node: NodeIndex, to: NodeState) -> Result<(), GraphError> {
        let entry = &self.nodes[node as usize];
        let (id, from) = (entry.id, entry.state);
        if from == to {
            return Ok(());
        }

        let handle = self
            .list_remove(node, from)
            .ok_or(GraphError::NotInPartition { node: id, state: from })?;
        self.partitions[to.index()].append(&mut self.pool, handle);
        self.nodes[node as usize].state = to;

        debug!(node = %id, %from, %to, "Moved node");
        Ok(())
    }

    /// Flag `node` as an initial spreader. Returns `false` if it already was.
    pub fn mark_seeded(&mut self, node: NodeIndex) -> bool {
        let entry = &mut self.nodes[node as usize];
        !std::mem::replace(&mut entry.seeded, true)
    }

    /// Whether `node` indexes a member of the population.
    pub fn contains(&self, node: NodeIndex) -> bool {
        (node as usize) < self.nodes.len()
    }

    /// The node at `index`, if any.
    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index as usize)
    }

    /// All nodes in index order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Number of nodes in the population.
    pub fn population_size(&self) -> usize {
        self.nodes.len()
    }

    /// Neighbours of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is outside the population.
    pub fn neighbors(&self, node: NodeIndex) -> ListIter<'_> {
        self.nodes[node as usize].adjacency.iter(&self.pool)
    }

    /// Number of neighbours of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is outside the population.
    pub fn degree(&self, node: NodeIndex) -> usize {
        self.nodes[node as usize].degree()
    }

    /// Members of the partition for `state`.
    pub fn partition(&self, state: NodeState) -> ListIter<'_> {
        self.partitions[state.index()].iter(&self.pool)
    }

    /// Number of members in the partition for `state`.
    pub fn partition_len(&self, state: NodeState) -> usize {
        self.partitions[state.index()].len()
    }

    /// Combined size of the three partitions.
    pub fn enrolled(&self) -> usize {
        self.partitions.iter().map(LinkList::len).sum()
    }

    /// Whether every node sits exactly once in the partition of its state.
    ///
    /// Walks every partition; meant for tests and diagnostics.
    pub fn partitions_consistent(&self) -> bool {
        let mut seen = vec![false; self.nodes.len()];
        for state in NodeState::ALL {
            for index in self.partition(state) {
                let Some(node) = self.nodes.get(index as usize) else {
                    return false;
                };
                if node.state != state || std::mem::replace(&mut seen[index as usize], true) {
                    return false;
                }
            }
        }
        seen.into_iter().all(|s| s)
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Records handed out by the pool.
    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    /// Maximum number of pool records.
    pub fn pool_capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Last identifier issued by this graph, if any.
    pub fn last_issued_id(&self) -> Option<NodeId> {
        self.ids.last_issued()
    }

    /// Drop the population, its partitions, its edges and the whole pool.
    ///
    /// The identifier generator is kept, so a later population continues
    /// the identifier sequence.
    pub fn destroy_population(&mut self) {
        info!(
            size = self.nodes.len(),
            edges = self.edge_count,
            pool_used = self.pool.len(),
            "Destroying population"
        );
        self.nodes = Vec::new();
        for list in &mut self.partitions {
            list.clear();
        }
        self.edge_count = 0;
        self.pool.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn enrolled_graph(size: usize, max_fanout: usize) -> Graph {
        let capacity = Graph::pool_capacity_for(size, max_fanout).unwrap();
        let mut graph = Graph::new(capacity).unwrap();
        graph.create_population(size).unwrap();
        graph.enroll_susceptible().unwrap();
        graph
    }

    #[test]
    fn test_population_starts_susceptible_with_ascending_ids() {
        let graph = enrolled_graph(5, 2);

        assert_eq!(graph.population_size(), 5);
        assert_eq!(graph.partition_len(NodeState::Susceptible), 5);
        assert_eq!(graph.partition_len(NodeState::Infected), 0);
        assert_eq!(graph.partition_len(NodeState::Recovered), 0);

        let ids: Vec<_> = graph.nodes().map(Node::id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert!(graph.nodes().all(|n| n.degree() == 0 && !n.is_seeded()));
        assert!(graph.partitions_consistent());
    }

    #[test]
    fn test_connect_is_idempotent() {
        let mut graph = enrolled_graph(3, 2);

        assert_eq!(graph.connect(0, 1), Ok(true));
        assert_eq!(graph.connect(0, 1), Ok(false));
        assert_eq!(graph.connect(1, 0), Ok(false));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.neighbors(0).collect::<Vec<_>>(), vec![1]);
        assert_eq!(graph.neighbors(1).collect::<Vec<_>>(), vec![0]);
        assert_eq!(graph.degree(2), 0);
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut graph = enrolled_graph(2, 1);
        let used = graph.pool_len();

        assert_eq!(graph.connect(1, 1), Ok(false));
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.pool_len(), used);
    }

    #[test]
    fn test_pool_exhaustion_is_reported_not_silent() {
        // Room for enrollment plus exactly one edge
        let mut graph = Graph::new(3 + 2).unwrap();
        graph.create_population(3).unwrap();
        graph.enroll_susceptible().unwrap();

        assert_eq!(graph.connect(0, 1), Ok(true));
        assert_eq!(
            graph.connect(1, 2),
            Err(GraphError::PoolExhausted { capacity: 5 })
        );
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.neighbors(2).count(), 0);
        assert_eq!(graph.neighbors(1).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_half_edge_never_left_behind() {
        // Enrollment plus one spare record: not enough for an edge
        let mut graph = Graph::new(2 + 1).unwrap();
        graph.create_population(2).unwrap();
        graph.enroll_susceptible().unwrap();

        assert!(graph.connect(0, 1).is_err());
        assert_eq!(graph.neighbors(0).count(), 0);
        assert_eq!(graph.pool_len(), 2);
    }

    #[test]
    fn test_move_reuses_record() {
        let mut graph = enrolled_graph(4, 1);
        let used = graph.pool_len();

        graph.move_to_partition(2, NodeState::Infected).unwrap();
        graph.move_to_partition(2, NodeState::Recovered).unwrap();
        graph.move_to_partition(3, NodeState::Recovered).unwrap();

        assert_eq!(graph.pool_len(), used);
        assert_eq!(graph.partition_len(NodeState::Susceptible), 2);
        assert_eq!(graph.partition_len(NodeState::Recovered), 2);
        assert_eq!(graph.enrolled(), 4);
        assert_eq!(graph.node(2).unwrap().state(), NodeState::Recovered);
        assert!(graph.partitions_consistent());
    }

    #[test]
    fn test_move_without_enrollment_fails() {
        let mut graph = Graph::new(4).unwrap();
        graph.create_population(2).unwrap();

        let err = graph.move_to_partition(0, NodeState::Infected).unwrap_err();
        assert!(matches!(err, GraphError::NotInPartition { .. }));
    }

    #[test]
    fn test_list_remove_and_append_by_state() {
        let mut graph = enrolled_graph(3, 1);

        assert!(graph.list_remove(1, NodeState::Susceptible).is_some());
        assert!(graph.list_remove(1, NodeState::Susceptible).is_none());
        assert_eq!(graph.partition(NodeState::Susceptible).collect::<Vec<_>>(), vec![0, 2]);
        // The partitions no longer cover node 1
        assert!(!graph.partitions_consistent());

        graph.list_append(1, NodeState::Susceptible).unwrap();
        assert!(graph.partitions_consistent());
    }

    #[test]
    fn test_mark_seeded_once() {
        let mut graph = enrolled_graph(2, 1);
        assert!(graph.mark_seeded(0));
        assert!(!graph.mark_seeded(0));
        assert!(graph.node(0).unwrap().is_seeded());
        assert!(!graph.node(1).unwrap().is_seeded());
    }

    #[traced_test]
    #[test]
    fn test_ids_continue_after_destroy() {
        let mut graph = enrolled_graph(3, 1);
        graph.connect(0, 2).unwrap();
        graph.destroy_population();

        assert_eq!(graph.population_size(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.pool_len(), 0);
        assert_eq!(graph.enrolled(), 0);

        graph.create_population(2).unwrap();
        let ids: Vec<_> = graph.nodes().map(Node::id).collect();
        assert_eq!(ids, vec![NodeId(4), NodeId(5)]);
        assert!(logs_contain("Destroying population"));
    }

    #[test]
    fn test_second_population_rejected_while_alive() {
        let mut graph = enrolled_graph(2, 1);
        assert_eq!(
            graph.create_population(1),
            Err(GraphError::PopulationExists { size: 2 })
        );
        assert_eq!(graph.enroll_susceptible(), Err(GraphError::AlreadyEnrolled));
    }

    #[test]
    fn test_identifier_exhaustion() {
        let mut graph =
            Graph::with_id_generator(8, NodeIdGenerator::resuming_after(u32::MAX - 1)).unwrap();
        let err = graph.create_population(2).unwrap_err();
        assert!(matches!(err, GraphError::IdentifierSpaceExhausted(_)));
        assert_eq!(graph.population_size(), 0);

        graph.create_population(1).unwrap();
        assert_eq!(graph.last_issued_id(), Some(NodeId(u32::MAX)));
    }

    #[test]
    fn test_pool_capacity_for() {
        assert_eq!(Graph::pool_capacity_for(100, 10), Some(1100));
        assert_eq!(Graph::pool_capacity_for(usize::MAX, 2), None);
    }
}
