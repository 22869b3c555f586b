//! Simulated paths produced by the planner.

use crate::error::{GambitResult, GraphError};
use crate::graph::NodeId;
use crate::node::SimState;

/// One explored route through the action graph.
///
/// Owns the ordered node sequence, the simulation state the route results
/// in, its total cost, whether it actually reached the goal, and how many
/// of its steps contributed non-zero cost ("key nodes"). Paths are
/// immutable after construction; the planner produces many and filters.
///
/// A path tagged `success == false` is a *partial* path: the best dead end
/// found within budget, kept for diagnostics and any-time planning.
#[derive(Debug, Clone)]
pub struct SimulatedPath<S: SimState> {
    success: bool,
    nodes: Vec<NodeId>,
    state: S,
    cost: f64,
    key_nodes: usize,
}

impl<S: SimState> SimulatedPath<S> {
    pub(crate) fn new(
        success: bool,
        state: S,
        cost: f64,
        key_nodes: usize,
        nodes: Vec<NodeId>,
    ) -> Self {
        Self {
            success,
            nodes,
            state,
            cost,
            key_nodes,
        }
    }

    /// Prepend a node while bubbling paths up the search recursion.
    pub(crate) fn prepended(mut self, node: NodeId) -> Self {
        self.nodes.insert(0, node);
        self
    }

    /// Whether this path reaches the goal.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }

    /// The ordered node sequence, root first.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The simulation state this route results in.
    #[must_use]
    pub const fn state(&self) -> &S {
        &self.state
    }

    /// Total simulated cost of the route.
    #[must_use]
    pub const fn cost(&self) -> f64 {
        self.cost
    }

    /// Number of steps with non-zero cost contribution.
    #[must_use]
    pub const fn key_nodes(&self) -> usize {
        self.key_nodes
    }

    /// Number of steps in the route.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the route has no steps (possible for partial paths).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First node, if any.
    #[must_use]
    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    /// Last node, if any.
    #[must_use]
    pub fn last(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// The step after the first occurrence of `node`.
    ///
    /// With self-looping graphs a node may appear several times; this
    /// resolves against the first occurrence. The execution handler tracks
    /// its position by index instead, so the ambiguity only affects callers
    /// probing a path from outside.
    pub fn next_after(&self, node: NodeId) -> GambitResult<NodeId> {
        let index = self.position_of(node)?;
        if index + 1 >= self.nodes.len() {
            return Err(GraphError::NoNextNode { id: node }.into());
        }
        Ok(self.nodes[index + 1])
    }

    /// The step before the first occurrence of `node`.
    pub fn previous_before(&self, node: NodeId) -> GambitResult<NodeId> {
        let index = self.position_of(node)?;
        if index == 0 {
            return Err(GraphError::NoPreviousNode { id: node }.into());
        }
        Ok(self.nodes[index - 1])
    }

    fn position_of(&self, node: NodeId) -> GambitResult<usize> {
        self.nodes
            .iter()
            .position(|&n| n == node)
            .ok_or_else(|| GraphError::NodeNotInPath { id: node }.into())
    }
}
