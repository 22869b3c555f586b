//! The action-node contract.
//!
//! Every candidate step in a plan implements [`ActionNode`]. The core depends
//! only on this trait; concrete domain actions (move, gather, craft, ...)
//! live outside the crate and are registered into an
//! [`ActionGraph`](crate::graph::ActionGraph) at composition time.
//!
//! The contract splits cleanly into three method groups:
//!
//! - **Planning predicates and hooks** (`should_enter`, `is_already_completed`,
//!   `should_consider`, `calculate_cost`, `sim_enter`, `sim_exit`): evaluated
//!   against a branch-private clone of the simulation state. They must be
//!   deterministic and free of real-world side effects.
//! - **Real hooks** (`on_enter`, `on_exit`): irreversible side effects against
//!   the live context. `on_enter` starts the work; completion is reported
//!   through the status group, polled once per tick.
//! - **Status polls** (`is_finished`, `is_failed`, `is_interrupted`) and
//!   `cleanup`, consumed by the execution handler.

/// Cloneable simulation state threaded through planning.
///
/// Cloning must produce an independent deep copy: exploring one branch must
/// never leak simulated consumption or production into a sibling branch.
/// Flat scalar records get this for free from `#[derive(Clone)]`; states
/// holding nested collections must make sure the derive deep-copies them.
pub trait SimState: Clone {}

impl<T: Clone> SimState for T {}

/// One candidate step in the action graph.
///
/// `S` is the cloneable simulation state used during planning; `C` is the
/// real, unclonable live context mutated during execution. `C` doubles as
/// the cheap pruning context for [`ActionNode::should_consider`].
pub trait ActionNode<S: SimState, C> {
    /// Human-readable name, used in events and diagnostics.
    fn name(&self) -> &str;

    /// Whether this node is legally reachable given the simulated state.
    ///
    /// Returning false during search abandons the branch at this node. This
    /// is a routine admission rejection, not an error.
    fn should_enter(&self, _state: &S) -> bool {
        true
    }

    /// Whether this node's effect is already satisfied.
    ///
    /// Completed nodes contribute zero cost and skip their hooks, but are
    /// still traversed structurally.
    fn is_already_completed(&self, _state: &S) -> bool {
        false
    }

    /// Cheap pruning gate evaluated once per planning call.
    ///
    /// Returning false marks this branch as not worth pursuing; the planner
    /// yields a tagged partial path instead of recursing further.
    fn should_consider(&self, _ctx: &C) -> bool {
        true
    }

    /// Deterministic cost of entering this node when not already completed.
    fn calculate_cost(&self, _state: &S) -> f64 {
        0.0
    }

    /// Apply hypothetical consumption to the cloned simulation state.
    fn sim_enter(&self, _state: &mut S) {}

    /// Apply hypothetical production to the cloned simulation state.
    fn sim_exit(&self, _state: &mut S) {}

    /// Begin the real side effect. Possibly long-running; progress is
    /// reported through the status polls.
    fn on_enter(&mut self, _live: &mut C) {}

    /// Tear down the real side effect after the node finished or was left.
    fn on_exit(&mut self, _live: &mut C) {}

    /// Whether the real work of this node has completed.
    fn is_finished(&self, _live: &C) -> bool {
        true
    }

    /// Whether the real work of this node has failed.
    fn is_failed(&self, _live: &C) -> bool {
        false
    }

    /// Whether an external condition demands the interrupt node run first.
    fn is_interrupted(&self, _live: &C) -> bool {
        false
    }

    /// Invoked once when an entire path is discarded, regardless of how far
    /// execution progressed.
    fn cleanup(&mut self) {}
}
