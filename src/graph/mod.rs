//! Arena-based action graph with symmetric adjacency.
//!
//! Nodes are owned by the arena and addressed through stable, opaque
//! [`NodeId`] handles; adjacency is stored as index lists. This keeps cyclic
//! graphs (including the self-loops that represent "repeat this action")
//! free of reference-cycle ownership problems.
//!
//! The graph is mutated only during composition. Planning derives a
//! [`RelevantSubgraph`] per call and never expands outside it.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GambitResult, GraphError};
use crate::node::{ActionNode, SimState};

/// Stable opaque handle for a node in an [`ActionGraph`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Build a handle from a raw arena index.
    ///
    /// Handles are only meaningful against the arena that issued them;
    /// accessors validate and return [`GraphError::UnknownNode`] otherwise.
    #[must_use]
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// The raw arena index backing this handle.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutable cyclic action graph over a node arena.
///
/// `link` registers both directions of an edge and ignores duplicates, so
/// composition code can declare prerequisites from either side without
/// bookkeeping.
pub struct ActionGraph<S: SimState, C> {
    nodes: Vec<Box<dyn ActionNode<S, C>>>,
    children: Vec<Vec<NodeId>>,
    parents: Vec<Vec<NodeId>>,
}

impl<S: SimState, C> Default for ActionGraph<S, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SimState, C> ActionGraph<S, C> {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            children: Vec::new(),
            parents: Vec::new(),
        }
    }

    /// Move a node into the arena, returning its handle.
    pub fn add_node(&mut self, node: Box<dyn ActionNode<S, C>>) -> NodeId {
        let id = NodeId::from_index(self.nodes.len() as u32);
        self.nodes.push(node);
        self.children.push(Vec::new());
        self.parents.push(Vec::new());
        id
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` belongs to this arena.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    fn check(&self, id: NodeId) -> GambitResult<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(GraphError::UnknownNode { id }.into())
        }
    }

    /// Register `child` as a successor of `parent`.
    ///
    /// The reverse direction is registered at the same time; repeating an
    /// existing edge is a no-op. `parent == child` is legal and represents
    /// "this action may repeat".
    pub fn link(&mut self, parent: NodeId, child: NodeId) -> GambitResult<()> {
        self.check(parent)?;
        self.check(child)?;

        let down = &mut self.children[parent.index()];
        if !down.contains(&child) {
            down.push(child);
        }
        let up = &mut self.parents[child.index()];
        if !up.contains(&parent) {
            up.push(parent);
        }
        Ok(())
    }

    /// Link each node in `chain` to its successor.
    pub fn link_chain(&mut self, chain: &[NodeId]) -> GambitResult<()> {
        for pair in chain.windows(2) {
            self.link(pair[0], pair[1])?;
        }
        Ok(())
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> GambitResult<&dyn ActionNode<S, C>> {
        self.check(id)?;
        Ok(self.nodes[id.index()].as_ref())
    }

    /// Mutably borrow a node (real hooks take `&mut self`).
    pub fn node_mut(&mut self, id: NodeId) -> GambitResult<&mut dyn ActionNode<S, C>> {
        self.check(id)?;
        Ok(self.nodes[id.index()].as_mut())
    }

    /// The node's name, for diagnostics.
    pub fn name(&self, id: NodeId) -> GambitResult<&str> {
        Ok(self.node(id)?.name())
    }

    /// Successors of `id`, in registration order.
    pub fn children(&self, id: NodeId) -> GambitResult<&[NodeId]> {
        self.check(id)?;
        Ok(&self.children[id.index()])
    }

    /// Predecessors of `id`, in registration order.
    pub fn parents(&self, id: NodeId) -> GambitResult<&[NodeId]> {
        self.check(id)?;
        Ok(&self.parents[id.index()])
    }

    /// Extract the subgraph backward-reachable from `goal` within `max_depth`
    /// parent hops.
    ///
    /// The walk is cycle-safe via membership test: a node already collected
    /// is not re-expanded. Child adjacency in the result is restricted to
    /// edges whose target is also relevant.
    pub fn relevant_subgraph(
        &self,
        goal: NodeId,
        max_depth: usize,
    ) -> GambitResult<RelevantSubgraph> {
        self.check(goal)?;

        let mut members = HashSet::new();
        self.collect_backward(goal, 0, max_depth, &mut members);

        let mut children = vec![Vec::new(); self.nodes.len()];
        for &id in &members {
            children[id.index()] = self.children[id.index()]
                .iter()
                .copied()
                .filter(|child| members.contains(child))
                .collect();
        }

        Ok(RelevantSubgraph { members, children })
    }

    fn collect_backward(
        &self,
        node: NodeId,
        depth: usize,
        max_depth: usize,
        members: &mut HashSet<NodeId>,
    ) {
        if depth >= max_depth || members.contains(&node) {
            return;
        }
        members.insert(node);
        for i in 0..self.parents[node.index()].len() {
            let parent = self.parents[node.index()][i];
            self.collect_backward(parent, depth + 1, max_depth, members);
        }
    }
}

impl<S: SimState, C> fmt::Debug for ActionGraph<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionGraph")
            .field("nodes", &self.nodes.len())
            .field(
                "edges",
                &self.children.iter().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}

/// Nodes backward-reachable from a goal within the depth bound, with child
/// adjacency restricted to relevant targets.
///
/// Derived per planning call; the planner never expands outside this set.
#[derive(Debug, Clone)]
pub struct RelevantSubgraph {
    members: HashSet<NodeId>,
    children: Vec<Vec<NodeId>>,
}

impl RelevantSubgraph {
    /// Whether `id` is backward-reachable from the goal within the bound.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.members.contains(&id)
    }

    /// Number of relevant nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether no node is relevant.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Relevant successors of `id`, in graph registration order.
    #[must_use]
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id.index())
            .map_or(&[], Vec::as_slice)
    }

    /// Iterate over the relevant node set (unordered).
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.members.iter().copied()
    }
}
