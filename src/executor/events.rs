use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use serde::{Deserialize, Serialize};

use crate::error::{ExecutionError, GambitError, GambitResult};
use crate::graph::NodeId;

/// What happened to a node (or the executor as a whole) on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionEventKind {
    /// A node's live entry hook ran.
    Entered,
    /// A node's live exit hook ran.
    Exited,
    /// The active node reported failure; the executor backtracked.
    Failed,
    /// The active node reported an interrupt; the interrupt node took over.
    Interrupted,
    /// Interrupt handling finished and the interrupted node was re-entered.
    Resumed,
    /// The goal node finished; the plan is done.
    Completed,
    /// The active path was abandoned and its nodes cleaned up.
    Abandoned,
}

/// One observable step of plan execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEvent {
    /// What happened.
    pub kind: ExecutionEventKind,
    /// Update tick on which it happened.
    pub tick: u64,
    /// The node involved, when the event concerns a single node.
    pub node: Option<NodeId>,
    /// Display name of that node.
    pub name: Option<String>,
    /// Wall-clock time the event was emitted.
    pub timestamp: DateTime<Utc>,
}

impl ExecutionEvent {
    pub(crate) fn new(kind: ExecutionEventKind, tick: u64, node: Option<(NodeId, &str)>) -> Self {
        Self {
            kind,
            tick,
            node: node.map(|(id, _)| id),
            name: node.map(|(_, name)| name.to_string()),
            timestamp: Utc::now(),
        }
    }
}

/// A subscription stream for execution events.
///
/// Delivery is lossy: when the bounded channel is full, new events are
/// dropped rather than blocking the executor's update loop.
#[derive(Debug)]
pub struct ExecutionEventStream {
    rx: Receiver<ExecutionEvent>,
}

impl ExecutionEventStream {
    pub(crate) fn new(rx: Receiver<ExecutionEvent>) -> Self {
        Self { rx }
    }

    /// Receive the next event (blocking).
    pub fn recv(&self) -> GambitResult<ExecutionEvent> {
        self.rx.recv().map_err(|_| {
            GambitError::Execution(ExecutionError::Disconnected {
                path: "execution_events".to_string(),
            })
        })
    }

    /// Receive the next event with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> GambitResult<ExecutionEvent> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => GambitError::Execution(ExecutionError::Timeout {
                duration_ms: timeout.as_millis().min(u128::from(u64::MAX)) as u64,
            }),
            RecvTimeoutError::Disconnected => GambitError::Execution(ExecutionError::Disconnected {
                path: "execution_events".to_string(),
            }),
        })
    }

    /// Receive the next event if one is already queued.
    pub fn try_recv(&self) -> GambitResult<Option<ExecutionEvent>> {
        match self.rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(GambitError::Execution(
                ExecutionError::Disconnected {
                    path: "execution_events".to_string(),
                },
            )),
        }
    }
}
