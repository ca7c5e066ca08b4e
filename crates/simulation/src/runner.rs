//! Deterministic epidemic runner.
//!
//! Owns the graph, the event queue, the RNG and the virtual clock. Events
//! are popped in timestamp order and applied one at a time; every draw from
//! the RNG happens in a fixed order, so the same seed and configuration
//! always produce the same run.

use crate::{
    build_contact_network, toss_coin, Event, EventKind, EventProbabilities, PriorityQueue,
    SimulationConfig, SimulationError,
};
use contagion_graph::Graph;
use contagion_types::{NodeIndex, NodeState, ReinfectionPolicy, Timestamp};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace, warn};

/// Statistics collected during a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SimulationStats {
    /// Events dispatched before the horizon.
    pub events_processed: u64,
    /// Transmit events dispatched.
    pub transmits_processed: u64,
    /// Recover events dispatched.
    pub recoveries_processed: u64,
    /// Nodes moved into Infected.
    pub infections: u64,
    /// Infections of previously Recovered nodes.
    pub reinfections: u64,
    /// Nodes moved into Recovered.
    pub recoveries: u64,
    /// Dispatched events that changed nothing.
    pub noop_events: u64,
    /// Neighbour Transmit/Recover pairs enqueued.
    pub propagations_scheduled: u64,
    /// Neighbour pairs dropped because the queue could not grow.
    pub propagations_dropped: u64,
    /// Events left unprocessed at or past the horizon.
    pub events_discarded: u64,
    /// Timestamp of the last dispatched event.
    pub last_event_time: Timestamp,
}

/// A node changing compartment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub node: NodeIndex,
    pub from: NodeState,
    pub to: NodeState,
}

/// Result of a single [`EpidemicRunner::step`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// An event was dispatched.
    Processed {
        event: Event,
        /// `None` when the event was a no-op.
        transition: Option<Transition>,
    },
    /// The horizon was reached or nothing is left; the queue has been drained.
    Finished,
}

/// Summary of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationReport {
    pub population: usize,
    pub initial_spreaders: usize,
    pub edges: usize,
    pub pool_used: usize,
    pub pool_capacity: usize,
    pub susceptible: usize,
    pub infected: usize,
    pub recovered: usize,
    pub horizon: Timestamp,
    pub stats: SimulationStats,
}

impl SimulationReport {
    /// Final size of the partition for `state`.
    pub fn partition_len(&self, state: NodeState) -> usize {
        match state {
            NodeState::Susceptible => self.susceptible,
            NodeState::Infected => self.infected,
            NodeState::Recovered => self.recovered,
        }
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n=== Population ===");
        println!("Nodes:             {}", self.population);
        println!("Edges:             {}", self.edges);
        println!("Link records:      {} / {}", self.pool_used, self.pool_capacity);
        println!("Initial spreaders: {}", self.initial_spreaders);

        println!("\n=== Final State (horizon {}) ===", self.horizon);
        for state in NodeState::ALL {
            println!("{:<18} {}", format!("{state}:"), self.partition_len(state));
        }

        let stats = &self.stats;
        println!("\n=== Events ===");
        println!("Processed:         {}", stats.events_processed);
        println!("  Transmit:        {}", stats.transmits_processed);
        println!("  Recover:         {}", stats.recoveries_processed);
        println!("  No-op:           {}", stats.noop_events);
        println!("Infections:        {}", stats.infections);
        println!("  Reinfections:    {}", stats.reinfections);
        println!("Recoveries:        {}", stats.recoveries);
        println!("Propagations:      {}", stats.propagations_scheduled);
        println!("  Dropped:         {}", stats.propagations_dropped);
        println!("Discarded:         {}", stats.events_discarded);
        println!("Last event:        {}", stats.last_event_time);
    }
}

/// Discrete-event SIR runner.
///
/// ```text
/// new / with_graph ──► seed_random_spreaders / seed_spreader ──► step* ──► Finished
/// ```
///
/// Once [`StepOutcome::Finished`] is returned the queue is empty and further
/// steps do nothing.
#[derive(Debug)]
pub struct EpidemicRunner {
    graph: Graph,
    queue: PriorityQueue,
    rng: ChaCha8Rng,
    horizon: Timestamp,
    policy: ReinfectionPolicy,

    /// Timestamp of the event being (or last) processed.
    now: Timestamp,

    /// Set once the remaining events have been drained.
    finished: bool,

    stats: SimulationStats,
    initial_spreaders: usize,
}

impl EpidemicRunner {
    /// Build a population and its random contact network from `config`.
    ///
    /// Nodes are created, enrolled as Susceptible and connected with at
    /// most `max_fanout` neighbours each. No spreaders are seeded yet.
    pub fn new(config: &SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;

        let mut graph = Graph::new(config.resolved_pool_capacity()?)?;
        graph.create_population(config.population_size)?;
        graph.enroll_susceptible()?;

        let mut runner = Self::assemble(graph, config)?;
        build_contact_network(&mut runner.graph, &mut runner.rng, config.max_fanout)?;
        Ok(runner)
    }

    /// Run over an existing, enrolled graph.
    ///
    /// Only the dynamics of `config` are used: horizon, probabilities,
    /// seed, reinfection policy and queue bound.
    pub fn with_graph(graph: Graph, config: &SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Self::assemble(graph, config)
    }

    fn assemble(graph: Graph, config: &SimulationConfig) -> Result<Self, SimulationError> {
        let mut queue = PriorityQueue::new(EventProbabilities {
            transmission: config.transmission_probability,
            recovery: config.recovery_probability,
        })?;
        if let Some(max) = config.max_pending_events {
            queue = queue.with_max_pending(max);
        }

        info!(
            population = graph.population_size(),
            horizon = %config.horizon,
            seed = config.seed,
            policy = %config.reinfection,
            "Simulation ready"
        );

        Ok(Self {
            graph,
            queue,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            horizon: config.horizon,
            policy: config.reinfection,
            now: Timestamp::ZERO,
            finished: false,
            stats: SimulationStats::default(),
            initial_spreaders: 0,
        })
    }

    /// Seed a random set of initial spreaders.
    ///
    /// Draws a count in `1..=n`, then that many nodes uniformly; nodes drawn
    /// twice are seeded once. Returns the number of distinct spreaders.
    pub fn seed_random_spreaders(&mut self) -> Result<usize, SimulationError> {
        let population = self.graph.population_size();
        if population == 0 {
            return Ok(0);
        }

        let draws = self.rng.gen_range(1..=population);
        let mut seeded = 0;
        for _ in 0..draws {
            let node = self.rng.gen_range(0..population) as NodeIndex;
            if self.seed_spreader(node)? {
                seeded += 1;
            }
        }

        info!(draws, seeded, "Seeded initial spreaders");
        Ok(seeded)
    }

    /// Seed `node` as a spreader: Transmit at time zero and Recover after a
    /// recovery coin-toss delay.
    ///
    /// Returns `false` if the node was already seeded.
    ///
    /// # Panics
    ///
    /// Panics if `node` is outside the population.
    pub fn seed_spreader(&mut self, node: NodeIndex) -> Result<bool, SimulationError> {
        assert!(self.graph.contains(node), "seed_spreader: node index {node} out of range");
        if self.graph.node(node).is_some_and(|n| n.is_seeded()) {
            return Ok(false);
        }

        let transmit = self.queue.new_event(node, EventKind::Transmit);
        let mut recover = self.queue.new_event(node, EventKind::Recover);
        recover.timestamp = toss_coin(
            &mut self.rng,
            Timestamp::ZERO,
            recover.probability,
            self.horizon,
        );
        let recover_at = recover.timestamp;

        self.queue.add_pair(transmit, recover)?;
        self.graph.mark_seeded(node);
        self.initial_spreaders += 1;

        trace!(node, recover_at = %recover_at, "Seeded spreader");
        Ok(true)
    }

    /// Pop and apply the next event.
    ///
    /// When the next event lies at or past the horizon, or none is left, the
    /// remaining events are discarded and [`StepOutcome::Finished`] is
    /// returned.
    pub fn step(&mut self) -> Result<StepOutcome, SimulationError> {
        if self.finished {
            return Ok(StepOutcome::Finished);
        }

        let Some(event) = self.queue.pop() else {
            self.finish();
            return Ok(StepOutcome::Finished);
        };
        if event.timestamp >= self.horizon {
            self.stats.events_discarded += 1;
            self.finish();
            return Ok(StepOutcome::Finished);
        }

        self.now = event.timestamp;
        self.stats.last_event_time = event.timestamp;
        self.stats.events_processed += 1;
        let transition = self.dispatch(&event)?;

        Ok(StepOutcome::Processed { event, transition })
    }

    /// Step until finished and report.
    pub fn run(&mut self) -> Result<SimulationReport, SimulationError> {
        info!(
            pending = self.queue.len(),
            spreaders = self.initial_spreaders,
            "Starting simulation"
        );

        while let StepOutcome::Processed { .. } = self.step()? {}

        let report = self.report();
        info!(
            events = report.stats.events_processed,
            susceptible = report.susceptible,
            infected = report.infected,
            recovered = report.recovered,
            last_event = %report.stats.last_event_time,
            "Simulation complete"
        );
        Ok(report)
    }

    fn dispatch(&mut self, event: &Event) -> Result<Option<Transition>, SimulationError> {
        assert!(
            self.graph.contains(event.target),
            "dispatch: event target {} out of range",
            event.target
        );

        let transition = match event.kind {
            EventKind::Transmit => {
                self.stats.transmits_processed += 1;
                self.process_transmit(event)?
            }
            EventKind::Recover => {
                self.stats.recoveries_processed += 1;
                self.process_recover(event)?
            }
            EventKind::Sentinel => panic!("dispatch: sentinel event reached processing"),
        };

        if transition.is_none() {
            self.stats.noop_events += 1;
        }
        debug!(
            time = %event.timestamp,
            kind = ?event.kind,
            node = event.target,
            ?transition,
            "Processed event"
        );
        Ok(transition)
    }

    /// Infect the target and schedule a Transmit/Recover pair for every
    /// neighbour that can still be infected.
    fn process_transmit(&mut self, event: &Event) -> Result<Option<Transition>, SimulationError> {
        let target = event.target;
        let from = self.state_of(target);
        if !self.policy.admits_infection(from) {
            return Ok(None);
        }

        self.graph.move_to_partition(target, NodeState::Infected)?;
        self.stats.infections += 1;
        if from == NodeState::Recovered {
            self.stats.reinfections += 1;
        }

        for peer in self.graph.neighbors(target) {
            let peer_state = self
                .graph
                .node(peer)
                .map_or(NodeState::Infected, |n| n.state());
            if !self.policy.admits_infection(peer_state) {
                continue;
            }

            let mut transmit = self.queue.new_event(peer, EventKind::Transmit);
            transmit.timestamp =
                toss_coin(&mut self.rng, event.timestamp, event.probability, self.horizon);
            let mut recover = self.queue.new_event(peer, EventKind::Recover);
            recover.timestamp = toss_coin(
                &mut self.rng,
                transmit.timestamp,
                recover.probability,
                self.horizon,
            );
            let (transmit_at, recover_at) = (transmit.timestamp, recover.timestamp);

            match self.queue.add_pair(transmit, recover) {
                Ok(()) => {
                    self.stats.propagations_scheduled += 1;
                    trace!(
                        from = target,
                        to = peer,
                        transmit_at = %transmit_at,
                        recover_at = %recover_at,
                        "Scheduled propagation"
                    );
                }
                Err(error) => {
                    self.stats.propagations_dropped += 1;
                    warn!(
                        from = target,
                        to = peer,
                        %error,
                        "Dropped propagation attempt"
                    );
                }
            }
        }

        Ok(Some(Transition {
            node: target,
            from,
            to: NodeState::Infected,
        }))
    }

    fn process_recover(&mut self, event: &Event) -> Result<Option<Transition>, SimulationError> {
        let target = event.target;
        let from = self.state_of(target);
        if from == NodeState::Recovered {
            return Ok(None);
        }

        self.graph.move_to_partition(target, NodeState::Recovered)?;
        self.stats.recoveries += 1;
        Ok(Some(Transition {
            node: target,
            from,
            to: NodeState::Recovered,
        }))
    }

    fn state_of(&self, node: NodeIndex) -> NodeState {
        self.graph
            .node(node)
            .map(|n| n.state())
            .unwrap_or_else(|| panic!("node index {node} out of range"))
    }

    /// Discard everything still queued.
    ///
    /// A sentinel carrying the largest timestamp is enqueued and events are
    /// popped until it surfaces. If the sentinel cannot be enqueued the
    /// queue is popped until empty instead.
    fn finish(&mut self) {
        self.finished = true;

        let mut discarded = 0u64;
        match self.queue.add(Event::sentinel()) {
            Ok(()) => {
                while let Some(event) = self.queue.pop() {
                    if event.is_sentinel() {
                        break;
                    }
                    discarded += 1;
                }
            }
            // step() pops before finishing, so a bounded queue always has
            // room here; only a failed allocation reaches this arm
            Err(error) => {
                warn!(%error, "Could not enqueue drain sentinel, draining until empty");
                while self.queue.pop().is_some() {
                    discarded += 1;
                }
            }
        }

        self.stats.events_discarded += discarded;
        debug!(
            discarded = self.stats.events_discarded,
            now = %self.now,
            "Drained remaining events"
        );
    }

    /// The contact graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Statistics so far.
    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Current virtual time.
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Events still queued.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the run has finished.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Distinct nodes seeded as spreaders.
    pub fn initial_spreaders(&self) -> usize {
        self.initial_spreaders
    }

    /// Snapshot of the current state.
    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            population: self.graph.population_size(),
            initial_spreaders: self.initial_spreaders,
            edges: self.graph.edge_count(),
            pool_used: self.graph.pool_len(),
            pool_capacity: self.graph.pool_capacity(),
            susceptible: self.graph.partition_len(NodeState::Susceptible),
            infected: self.graph.partition_len(NodeState::Infected),
            recovered: self.graph.partition_len(NodeState::Recovered),
            horizon: self.horizon,
            stats: self.stats.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contagion_test_helpers::{enrolled_graph, pair_graph, star_graph};
    use tracing_test::traced_test;

    #[test]
    fn test_new_builds_enrolled_population() {
        let config = SimulationConfig::new(50).with_max_fanout(4).with_seed(9);
        let runner = EpidemicRunner::new(&config).unwrap();

        let graph = runner.graph();
        assert_eq!(graph.population_size(), 50);
        assert_eq!(graph.partition_len(NodeState::Susceptible), 50);
        assert!(graph.nodes().all(|n| n.degree() <= 4));
        assert_eq!(runner.queue_len(), 0);
        assert_eq!(runner.now(), Timestamp::ZERO);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = SimulationConfig::new(0);
        assert!(matches!(
            EpidemicRunner::new(&config),
            Err(SimulationError::Config(_))
        ));
    }

    #[test]
    fn test_seed_spreader_schedules_pair_once() {
        let config = SimulationConfig::default().with_horizon(Timestamp(50));
        let mut runner = EpidemicRunner::with_graph(pair_graph(), &config).unwrap();

        assert!(runner.seed_spreader(0).unwrap());
        assert!(!runner.seed_spreader(0).unwrap());
        assert_eq!(runner.queue_len(), 2);
        assert_eq!(runner.initial_spreaders(), 1);
        assert!(runner.graph().node(0).unwrap().is_seeded());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_seed_spreader_out_of_range_panics() {
        let config = SimulationConfig::default();
        let mut runner = EpidemicRunner::with_graph(pair_graph(), &config).unwrap();
        let _ = runner.seed_spreader(2);
    }

    #[test]
    fn test_random_seeding_seeds_at_least_one() {
        for seed in 0..20 {
            let config = SimulationConfig::new(10).with_max_fanout(2).with_seed(seed);
            let mut runner = EpidemicRunner::new(&config).unwrap();
            let seeded = runner.seed_random_spreaders().unwrap();

            assert!((1..=10).contains(&seeded));
            assert_eq!(runner.queue_len(), 2 * seeded);
            let flagged = runner.graph().nodes().filter(|n| n.is_seeded()).count();
            assert_eq!(flagged, seeded);
        }
    }

    #[test]
    fn test_first_step_infects_spreader() {
        let config = SimulationConfig::default()
            .with_transmission_probability(1.0)
            .with_horizon(Timestamp(100));
        let mut runner = EpidemicRunner::with_graph(pair_graph(), &config).unwrap();
        runner.seed_spreader(0).unwrap();

        let outcome = runner.step().unwrap();
        let StepOutcome::Processed { event, transition } = outcome else {
            panic!("expected an event, got {outcome:?}");
        };
        assert_eq!(event.kind, EventKind::Transmit);
        assert_eq!(event.timestamp, Timestamp::ZERO);
        assert_eq!(
            transition,
            Some(Transition {
                node: 0,
                from: NodeState::Susceptible,
                to: NodeState::Infected,
            })
        );
        assert_eq!(runner.stats().propagations_scheduled, 1);
        assert_eq!(runner.graph().partition_len(NodeState::Infected), 1);
    }

    #[test]
    fn test_sir_never_reinfects() {
        let config = SimulationConfig::default()
            .with_transmission_probability(1.0)
            .with_recovery_probability(1.0)
            .with_reinfection(ReinfectionPolicy::Sir)
            .with_horizon(Timestamp(200));
        let mut runner = EpidemicRunner::with_graph(star_graph(6), &config).unwrap();
        runner.seed_spreader(0).unwrap();

        loop {
            match runner.step().unwrap() {
                StepOutcome::Processed {
                    transition: Some(t),
                    ..
                } => assert_ne!(t.from, NodeState::Recovered),
                StepOutcome::Processed { .. } => {}
                StepOutcome::Finished => break,
            }
        }
        assert_eq!(runner.stats().reinfections, 0);
        let report = runner.report();
        assert_eq!(report.susceptible + report.infected + report.recovered, 7);
    }

    #[test]
    fn test_recover_is_noop_when_recovered() {
        let config = SimulationConfig::default();
        let mut runner = EpidemicRunner::with_graph(pair_graph(), &config).unwrap();
        let mut event = runner.queue.new_event(1, EventKind::Recover);
        event.timestamp = Timestamp(3);

        assert!(runner.dispatch(&event).unwrap().is_some());
        assert!(runner.dispatch(&event).unwrap().is_none());
        assert_eq!(runner.stats().recoveries, 1);
        assert_eq!(runner.stats().noop_events, 1);
    }

    #[test]
    fn test_recovered_node_is_reinfected_under_sirs() {
        let config = SimulationConfig::default().with_reinfection(ReinfectionPolicy::Sirs);
        let mut runner = EpidemicRunner::with_graph(pair_graph(), &config).unwrap();
        let recover = runner.queue.new_event(1, EventKind::Recover);
        let transmit = runner.queue.new_event(1, EventKind::Transmit);

        runner.dispatch(&recover).unwrap();
        let transition = runner.dispatch(&transmit).unwrap();

        assert_eq!(
            transition,
            Some(Transition {
                node: 1,
                from: NodeState::Recovered,
                to: NodeState::Infected,
            })
        );
        assert_eq!(runner.stats().reinfections, 1);
    }

    #[test]
    #[should_panic(expected = "sentinel")]
    fn test_sentinel_dispatch_panics() {
        let config = SimulationConfig::default();
        let mut runner = EpidemicRunner::with_graph(pair_graph(), &config).unwrap();
        let _ = runner.dispatch(&Event::sentinel());
    }

    #[test]
    fn test_events_past_horizon_are_discarded() {
        let config = SimulationConfig::default().with_horizon(Timestamp(10));
        let mut runner = EpidemicRunner::with_graph(pair_graph(), &config).unwrap();
        for time in [2u64, 10, 15, 40] {
            let mut event = runner.queue.new_event(1, EventKind::Recover);
            event.timestamp = Timestamp(time);
            runner.queue.add(event).unwrap();
        }

        let report = runner.run().unwrap();
        assert_eq!(report.stats.events_processed, 1);
        assert_eq!(report.stats.events_discarded, 3);
        assert_eq!(report.stats.last_event_time, Timestamp(2));
        assert_eq!(runner.queue_len(), 0);
        assert!(runner.is_finished());
        assert_eq!(runner.step().unwrap(), StepOutcome::Finished);
    }

    #[traced_test]
    #[test]
    fn test_full_queue_drops_propagation() {
        // Room for the seeded pair only
        let config = SimulationConfig::default()
            .with_max_pending_events(2)
            .with_horizon(Timestamp(100));
        let mut runner = EpidemicRunner::with_graph(star_graph(3), &config).unwrap();
        runner.seed_spreader(0).unwrap();

        // Transmit at 0 pops first, leaving one free slot: too few for a pair
        runner.step().unwrap();

        assert_eq!(runner.stats().propagations_dropped, 3);
        assert_eq!(runner.stats().propagations_scheduled, 0);
        assert_eq!(runner.queue_len(), 1);
        assert!(logs_contain("Dropped propagation attempt"));
    }

    #[traced_test]
    #[test]
    fn test_drain_without_room_for_sentinel_empties_queue() {
        let config = SimulationConfig::default()
            .with_max_pending_events(2)
            .with_horizon(Timestamp(5));
        let mut runner = EpidemicRunner::with_graph(pair_graph(), &config).unwrap();
        for time in [7u64, 9] {
            let mut event = runner.queue.new_event(0, EventKind::Transmit);
            event.timestamp = Timestamp(time);
            runner.queue.add(event).unwrap();
        }

        // Full queue: the sentinel cannot be enqueued
        runner.finish();

        assert_eq!(runner.queue_len(), 0);
        assert_eq!(runner.stats().events_discarded, 2);
        assert!(runner.is_finished());
        assert!(logs_contain("draining until empty"));
    }

    #[test]
    fn test_zero_recovery_with_huge_horizon_seeds_promptly() {
        let horizon = Timestamp(1_000_000_000_000);
        let config = SimulationConfig::default()
            .with_recovery_probability(0.0)
            .with_horizon(horizon);
        let mut runner = EpidemicRunner::with_graph(enrolled_graph(1, 0), &config).unwrap();

        assert!(runner.seed_spreader(0).unwrap());
        let report = runner.run().unwrap();

        assert_eq!(report.infected, 1);
        assert_eq!(report.stats.events_processed, 1);
        // The recovery landed on the horizon and was discarded
        assert_eq!(report.stats.events_discarded, 1);
    }
}
