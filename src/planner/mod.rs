//! Branch-and-bound planner over the action graph.
//!
//! The planner explores the goal's [`RelevantSubgraph`] depth-first from the
//! root, threading a branch-private clone of the simulation state through
//! the recursion. A shared mutable bounds record (lowest successful cost and
//! key-node count) is tightened by every complete path and prunes later
//! branches past best-known-plus-offset; a depth-indexed solve record prunes
//! partial dead ends once an equal-or-better result at the same depth is
//! known. That second table is what keeps deep, heavily self-looped graphs
//! tractable.
//!
//! One canonical strategy lives here. Depth-bounded truncation means the
//! result is a bounded approximation, not a global optimum.

mod collapse;

pub use collapse::collapse_loops;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GambitResult, ValidationError};
use crate::graph::{ActionGraph, NodeId, RelevantSubgraph};
use crate::node::SimState;
use crate::path::SimulatedPath;

/// Tuning knobs for one planning call.
///
/// `None` consistently means "unbounded": no path-count cap, exhaustive
/// offsets, no deadline. `cost_offset`/`node_offset` of zero keep only
/// ever-improving branches once a first success is known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanOptions {
    /// Maximum search depth (also bounds backward-reachability extraction).
    pub max_depth: usize,
    /// Stop after this many successful paths.
    pub max_success_paths: Option<usize>,
    /// Stop after this many partial (dead-end) paths.
    pub max_partial_paths: Option<usize>,
    /// Acceptable cost overshoot above the best known successful cost.
    pub cost_offset: Option<f64>,
    /// Acceptable key-node overshoot above the best known successful count.
    pub node_offset: Option<usize>,
    /// Cooperative wall-clock budget, checked at each recursive step.
    pub timeout: Option<Duration>,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            max_depth: 20,
            max_success_paths: None,
            max_partial_paths: None,
            cost_offset: None,
            node_offset: None,
            timeout: None,
        }
    }
}

/// Request envelope recorded for every planning call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Unique id of this request.
    pub request_id: Uuid,
    /// When the request was issued.
    pub timestamp: DateTime<Utc>,
    /// Options the call ran with.
    pub options: PlanOptions,
}

impl PlanRequest {
    fn new(options: PlanOptions) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            options,
        }
    }
}

/// Serializable summary of one planning call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanReport {
    /// The request envelope.
    pub request: PlanRequest,
    /// Size of the relevant subgraph the search ran over.
    pub relevant_nodes: usize,
    /// Successful paths discovered.
    pub success_paths: usize,
    /// Partial paths discovered.
    pub partial_paths: usize,
    /// Whether the cooperative deadline fired during the search.
    pub timed_out: bool,
    /// Wall-clock time spent planning.
    pub elapsed_ms: u64,
}

/// Everything one planning call produced.
#[derive(Debug)]
pub struct PlanOutcome<S: SimState> {
    /// All discovered paths, successful and partial.
    pub paths: Vec<SimulatedPath<S>>,
    /// Summary of the call.
    pub report: PlanReport,
}

impl<S: SimState> PlanOutcome<S> {
    /// The best path under the selection order of [`select_best`].
    #[must_use]
    pub fn best(&self) -> Option<&SimulatedPath<S>> {
        select_best(&self.paths)
    }

    /// The best *successful* path, if any.
    #[must_use]
    pub fn best_success(&self) -> Option<&SimulatedPath<S>> {
        self.best().filter(|p| p.success())
    }
}

/// Pick the best path: success over partial, then lowest cost, then fewest
/// total nodes, then fewest key nodes. First in input order wins remaining
/// ties, which keeps selection deterministic.
#[must_use]
pub fn select_best<S: SimState>(paths: &[SimulatedPath<S>]) -> Option<&SimulatedPath<S>> {
    let any_success = paths.iter().any(SimulatedPath::success);
    let mut pool: Vec<&SimulatedPath<S>> = paths
        .iter()
        .filter(|p| !any_success || p.success())
        .collect();
    if pool.is_empty() {
        return None;
    }

    let lowest_cost = pool.iter().map(|p| p.cost()).fold(f64::INFINITY, f64::min);
    pool.retain(|p| p.cost() <= lowest_cost);

    let shortest = pool.iter().map(|p| p.len()).min().unwrap_or(0);
    pool.retain(|p| p.len() == shortest);

    let fewest_keys = pool.iter().map(|p| p.key_nodes()).min().unwrap_or(0);
    pool.retain(|p| p.key_nodes() == fewest_keys);

    pool.first().copied()
}

/// Depth-indexed memo of the best result seen at that depth.
#[derive(Debug, Clone, Copy)]
struct SolveSlot {
    lowest_cost: f64,
    key_nodes: usize,
    success: bool,
}

impl Default for SolveSlot {
    fn default() -> Self {
        Self {
            lowest_cost: f64::INFINITY,
            key_nodes: usize::MAX,
            success: false,
        }
    }
}

/// Planner over a composed action graph.
pub struct Planner<'g, S: SimState, C> {
    graph: &'g ActionGraph<S, C>,
}

impl<'g, S: SimState, C> Planner<'g, S, C> {
    /// Create a planner borrowing the graph.
    #[must_use]
    pub const fn new(graph: &'g ActionGraph<S, C>) -> Self {
        Self { graph }
    }

    /// Search for paths from `root` to `goal`.
    ///
    /// `ctx` feeds the `should_consider` pruning gates; `state` seeds the
    /// branch-private simulation clones. Finding nothing is not an error:
    /// the outcome simply carries zero paths.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a zero `max_depth` and a graph error
    /// for unknown `root`/`goal` handles.
    pub fn plan(
        &self,
        root: NodeId,
        goal: NodeId,
        ctx: &C,
        state: S,
        options: &PlanOptions,
    ) -> GambitResult<PlanOutcome<S>> {
        if options.max_depth == 0 {
            return Err(ValidationError::ZeroMaxDepth.into());
        }
        self.graph.node(root)?;
        self.graph.node(goal)?;

        let started = Instant::now();
        let request = PlanRequest::new(options.clone());

        let sub = self.graph.relevant_subgraph(goal, options.max_depth)?;

        // Consider gates are cheap but evaluated once per call, not once
        // per visit.
        let mut consider = HashMap::with_capacity(sub.len());
        for id in sub.iter() {
            consider.insert(id, self.graph.node(id)?.should_consider(ctx));
        }

        let mut search = Search {
            graph: self.graph,
            sub: &sub,
            goal,
            max_depth: options.max_depth,
            max_success: options.max_success_paths.unwrap_or(usize::MAX),
            max_partial: options.max_partial_paths.unwrap_or(usize::MAX),
            cost_offset: options.cost_offset.unwrap_or(f64::INFINITY),
            node_offset: options.node_offset.unwrap_or(usize::MAX),
            deadline: options.timeout.map(|t| started + t),
            consider,
            best_cost: f64::INFINITY,
            best_keys: usize::MAX,
            success_count: 0,
            partial_count: 0,
            solve: vec![SolveSlot::default(); options.max_depth + 1],
            timed_out: false,
        };

        // A root outside the relevant set can never reach the goal within
        // the bound; surface that as "no paths", not an error.
        let paths = if sub.contains(root) {
            search.descend(root, state, 0.0, 0, 0)?
        } else {
            Vec::new()
        };

        let report = PlanReport {
            request,
            relevant_nodes: sub.len(),
            success_paths: search.success_count,
            partial_paths: search.partial_count,
            timed_out: search.timed_out,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        Ok(PlanOutcome { paths, report })
    }
}

struct Search<'a, S: SimState, C> {
    graph: &'a ActionGraph<S, C>,
    sub: &'a RelevantSubgraph,
    goal: NodeId,
    max_depth: usize,
    max_success: usize,
    max_partial: usize,
    cost_offset: f64,
    node_offset: usize,
    deadline: Option<Instant>,
    consider: HashMap<NodeId, bool>,
    best_cost: f64,
    best_keys: usize,
    success_count: usize,
    partial_count: usize,
    solve: Vec<SolveSlot>,
    timed_out: bool,
}

impl<S: SimState, C> Search<'_, S, C> {
    fn descend(
        &mut self,
        node: NodeId,
        mut state: S,
        mut cost: f64,
        mut keys: usize,
        depth: usize,
    ) -> GambitResult<Vec<SimulatedPath<S>>> {
        if depth >= self.max_depth {
            return Ok(Vec::new());
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                // Cooperative: the branch unwinds normally, we just stop
                // opening new work.
                self.timed_out = true;
                return Ok(Vec::new());
            }
        }
        if self.success_count >= self.max_success || self.partial_count >= self.max_partial {
            return Ok(Vec::new());
        }
        if cost > self.best_cost + self.cost_offset {
            return Ok(Vec::new());
        }
        if keys > self.best_keys.saturating_add(self.node_offset) {
            return Ok(Vec::new());
        }
        if self.solve[depth].lowest_cost < cost {
            return Ok(Vec::new());
        }

        if !self.consider.get(&node).copied().unwrap_or(false) {
            // Not worth pursuing. Emit the dead end as a partial path
            // unless a success at this depth already made it pointless.
            if self.solve[depth].success {
                return Ok(Vec::new());
            }
            self.partial_count += 1;
            let slot = &mut self.solve[depth];
            slot.lowest_cost = slot.lowest_cost.min(cost);
            slot.key_nodes = slot.key_nodes.min(keys);
            return Ok(vec![SimulatedPath::new(false, state, cost, keys, Vec::new())]);
        }

        let node_ref = self.graph.node(node)?;
        if node_ref.is_already_completed(&state) {
            // Zero cost, no hooks, still traversed structurally.
        } else if node_ref.should_enter(&state) {
            node_ref.sim_enter(&mut state);
            let add_cost = node_ref.calculate_cost(&state);
            node_ref.sim_exit(&mut state);
            if add_cost > 0.0 {
                keys += 1;
            }
            cost += add_cost;
        } else {
            // Admission rejection: prune, not an error.
            return Ok(Vec::new());
        }

        if node == self.goal {
            self.success_count += 1;
            self.best_cost = self.best_cost.min(cost);
            self.best_keys = self.best_keys.min(keys);
            let slot = &mut self.solve[depth];
            slot.lowest_cost = slot.lowest_cost.min(cost);
            slot.key_nodes = slot.key_nodes.min(keys);
            slot.success = true;
            return Ok(vec![SimulatedPath::new(true, state, cost, keys, vec![node])]);
        }

        let children = self.sub.children_of(node).to_vec();
        let mut out = Vec::new();
        for child in children {
            let found = self.descend(child, state.clone(), cost, keys, depth + 1)?;
            for path in found {
                out.push(path.prepended(node));
            }
        }
        Ok(out)
    }
}
