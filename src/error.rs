//! Error types for Gambit.
//!
//! All errors in Gambit are strongly typed using thiserror.
//! This enables pattern matching on specific error conditions
//! and provides clear error messages.
//!
//! Routine planning setbacks are deliberately *not* errors: an admission
//! predicate rejecting a branch prunes it, and a dead end is recorded as a
//! partial path. Only configuration defects and execution-protocol
//! violations surface through this module.

use thiserror::Error;

use crate::graph::NodeId;

/// Validation errors that occur while checking planner or handler inputs.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Max depth must be at least 1")]
    ZeroMaxDepth,

    #[error("Interrupt node {node} cannot also be the root or goal")]
    InterruptCollidesWithTarget { node: NodeId },

    #[error("Root node {root} and goal node {goal} must differ")]
    RootEqualsGoal { root: NodeId, goal: NodeId },
}

/// Structural errors raised by graph and path accessors.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Unknown node id: {id}")]
    UnknownNode { id: NodeId },

    #[error("Node {id} is not part of the path")]
    NodeNotInPath { id: NodeId },

    #[error("Node {id} has no successor in the path")]
    NoNextNode { id: NodeId },

    #[error("Node {id} has no predecessor in the path")]
    NoPreviousNode { id: NodeId },
}

/// Execution errors raised by the execution handler.
///
/// The protocol-violation variants indicate a graph or configuration
/// defect, not a routine setback, and must propagate to the driver.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Interrupt node {node} was interrupted while already handling an interruption")]
    InterruptedWhileHandlingInterrupt { node: NodeId },

    #[error("Interrupt node {node} failed while handling an interruption")]
    FailedWhileHandlingInterrupt { node: NodeId },

    #[error("Root node {node} failed with nothing to backtrack to")]
    RootFailed { node: NodeId },

    #[error("Execution handler used before init()")]
    NotInitialized,

    #[error("No active path")]
    NoActivePath,

    #[error("Event stream disconnected: {path}")]
    Disconnected { path: String },

    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
}

/// Top-level error type for Gambit.
///
/// This enum encompasses all possible errors that can occur
/// when using the planner or the execution handler.
#[derive(Debug, Error)]
pub enum GambitError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl GambitError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a graph error.
    #[must_use]
    pub const fn is_graph(&self) -> bool {
        matches!(self, Self::Graph(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this error is a fatal execution-protocol violation.
    ///
    /// Protocol violations mean the action graph or handler wiring is
    /// defective; retrying the tick will not help.
    #[must_use]
    pub const fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::Execution(
                ExecutionError::InterruptedWhileHandlingInterrupt { .. }
                    | ExecutionError::FailedWhileHandlingInterrupt { .. }
                    | ExecutionError::RootFailed { .. }
                    | ExecutionError::NotInitialized
                    | ExecutionError::NoActivePath
            )
        )
    }
}

/// Result type alias for Gambit operations.
pub type GambitResult<T> = Result<T, GambitError>;
