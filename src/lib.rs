//! # Gambit - Multi-Step Acquisition Planning for Autonomous Agents
//!
//! Gambit plans and executes multi-step action sequences over a graph of
//! prerequisite-linked actions. Each action simulates its own effects on a
//! cheap clone of the agent's state; the planner runs a branch-and-bound
//! depth-first search over the goal's relevant subgraph, collapses
//! redundant loop repetitions out of the winner, and hands the result to a
//! tick-driven execution handler that survives failures and interrupts.
//!
//! ## Core Concepts
//!
//! - **ActionNode**: One action with admission predicates, simulation
//!   hooks, a cost, and live execution hooks
//! - **ActionGraph**: Arena of actions wired by prerequisite adjacency
//! - **SimulatedPath**: A node sequence with its simulated end state,
//!   total cost, and key-node count
//! - **ExecutionHandler**: Tick-driven executor with backtracking and
//!   interrupt handling
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gambit::{ActionGraph, ExecutionHandler, PlanOptions, Planner};
//!
//! let mut graph = ActionGraph::new();
//! let root = graph.add_node(Box::new(Idle));
//! let chop = graph.add_node(Box::new(ChopWood));
//! let craft = graph.add_node(Box::new(CraftTable));
//! graph.link(root, chop)?;
//! graph.link(chop, chop)?;
//! graph.link(chop, craft)?;
//!
//! // One-shot planning
//! let outcome = Planner::new(&graph).plan(root, craft, &world, state, &PlanOptions::default())?;
//!
//! // Or tick-driven execution
//! let mut handler = ExecutionHandler::new(graph);
//! handler.init(root, craft, None, state, PlanOptions::default())?;
//! handler.update(&mut world)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod executor;
pub mod graph;
pub mod node;
pub mod path;
pub mod planner;

// Re-export primary types at crate root for convenience
pub use error::{
    ExecutionError, GambitError, GambitResult, GraphError, ValidationError,
};
pub use executor::{
    ExecutionEvent, ExecutionEventKind, ExecutionEventStream, ExecutionHandler, TickStatus,
};
pub use graph::{ActionGraph, NodeId, RelevantSubgraph};
pub use node::{ActionNode, SimState};
pub use path::SimulatedPath;
pub use planner::{
    collapse_loops, select_best, PlanOptions, PlanOutcome, PlanReport, PlanRequest, Planner,
};
