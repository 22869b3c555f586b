//! Tick-driven execution of planned paths.
//!
//! The [`ExecutionHandler`] owns the action graph and a bookkeeping mirror
//! of the simulation state. Each [`ExecutionHandler::update`] call is one
//! tick: it replans when idle, polls the active node's live status, and
//! advances, backtracks, or hands control to the interrupt node. Routine
//! setbacks (a failed step with somewhere to backtrack to) are statuses;
//! protocol violations (the interrupt handler itself failing, the root
//! failing) are errors that must reach the driver.

mod events;

pub use events::{ExecutionEvent, ExecutionEventKind, ExecutionEventStream};

use std::collections::HashSet;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use crate::error::{ExecutionError, GambitError, GambitResult, ValidationError};
use crate::graph::{ActionGraph, NodeId};
use crate::node::SimState;
use crate::path::SimulatedPath;
use crate::planner::{collapse_loops, PlanOptions, PlanReport, Planner};

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickStatus {
    /// No active path and replanning found none.
    Idle,
    /// The active node is executing.
    Running,
    /// The active node was interrupted; the interrupt node took over.
    Interrupted,
    /// Interrupt handling finished; the interrupted node was re-entered.
    Resumed,
    /// The active node failed; execution moved one step back.
    Backtracked,
    /// The goal node finished. Subsequent ticks keep reporting this.
    Completed,
}

/// Root, goal and interrupt configuration of one execution session.
#[derive(Debug, Clone, Copy)]
struct Targets {
    root: NodeId,
    goal: NodeId,
    interrupt: Option<NodeId>,
}

/// Tick-driven plan executor over an owned action graph.
///
/// The mirror state shadows what execution has actually achieved so far:
/// finished nodes fold their simulation effects into it, replanning seeds
/// the search from it, and nodes it already marks completed skip their
/// live entry and exit hooks.
pub struct ExecutionHandler<S: SimState, C> {
    graph: ActionGraph<S, C>,
    options: PlanOptions,
    targets: Option<Targets>,
    mirror: Option<S>,
    path: Option<SimulatedPath<S>>,
    position: usize,
    entered: bool,
    handling_interrupt: bool,
    done: bool,
    tick: u64,
    last_report: Option<PlanReport>,
    events_tx: Option<Sender<ExecutionEvent>>,
}

impl<S: SimState, C> ExecutionHandler<S, C> {
    /// Take ownership of a composed graph.
    #[must_use]
    pub fn new(graph: ActionGraph<S, C>) -> Self {
        Self {
            graph,
            options: PlanOptions::default(),
            targets: None,
            mirror: None,
            path: None,
            position: 0,
            entered: false,
            handling_interrupt: false,
            done: false,
            tick: 0,
            last_report: None,
            events_tx: None,
        }
    }

    /// Configure a session: root, goal, optional interrupt node, the
    /// initial mirror state and the planning options. Discards any active
    /// path without running cleanup; call [`Self::abandon`] first when one
    /// is in flight.
    ///
    /// # Errors
    ///
    /// Returns a graph error for unknown handles and a validation error
    /// when root equals goal or the interrupt node collides with either.
    pub fn init(
        &mut self,
        root: NodeId,
        goal: NodeId,
        interrupt: Option<NodeId>,
        state: S,
        options: PlanOptions,
    ) -> GambitResult<()> {
        self.graph.node(root)?;
        self.graph.node(goal)?;
        if root == goal {
            return Err(ValidationError::RootEqualsGoal { root, goal }.into());
        }
        if let Some(node) = interrupt {
            self.graph.node(node)?;
            if node == root || node == goal {
                return Err(ValidationError::InterruptCollidesWithTarget { node }.into());
            }
        }

        self.targets = Some(Targets {
            root,
            goal,
            interrupt,
        });
        self.mirror = Some(state);
        self.options = options;
        self.path = None;
        self.position = 0;
        self.entered = false;
        self.handling_interrupt = false;
        self.done = false;
        Ok(())
    }

    /// Run one tick.
    ///
    /// With no active path this replans from the mirror state; with one,
    /// it polls the active node's live status and reacts. `ctx` is the
    /// live context the node hooks and status predicates see.
    ///
    /// # Errors
    ///
    /// [`ExecutionError::NotInitialized`] before [`Self::init`], and the
    /// protocol-violation variants when the interrupt node fails or is
    /// itself interrupted, or when the root node fails.
    pub fn update(&mut self, ctx: &mut C) -> GambitResult<TickStatus> {
        let targets = self.targets.ok_or(ExecutionError::NotInitialized)?;
        self.tick += 1;

        if self.done {
            return Ok(TickStatus::Completed);
        }

        if self.path.is_none() {
            if !self.replan(ctx, targets)? {
                return Ok(TickStatus::Idle);
            }
            let first = self.current_node().ok_or(ExecutionError::NoActivePath)?;
            self.enter_node(ctx, first, ExecutionEventKind::Entered)?;
            return Ok(TickStatus::Running);
        }

        if self.handling_interrupt {
            return self.update_interrupt(ctx, targets);
        }

        let node = self.current_node().ok_or(ExecutionError::NoActivePath)?;
        let (interrupted, failed, finished) = self.status_of(node, ctx)?;

        if interrupted {
            if let Some(interrupt) = targets.interrupt {
                self.exit_node(ctx, node)?;
                self.emit(ExecutionEventKind::Interrupted, Some(node));
                self.handling_interrupt = true;
                self.enter_node(ctx, interrupt, ExecutionEventKind::Entered)?;
                return Ok(TickStatus::Interrupted);
            }
            // No interrupt node configured: fall through to the failure
            // path so execution still backs off the node.
        }

        if failed || interrupted {
            if self.position == 0 {
                return Err(ExecutionError::RootFailed { node }.into());
            }
            self.exit_node(ctx, node)?;
            self.emit(ExecutionEventKind::Failed, Some(node));
            self.position -= 1;
            let previous = self.current_node().ok_or(ExecutionError::NoActivePath)?;
            self.enter_node(ctx, previous, ExecutionEventKind::Entered)?;
            return Ok(TickStatus::Backtracked);
        }

        if finished {
            self.exit_node(ctx, node)?;
            self.absorb_into_mirror(node)?;

            let len = self.path.as_ref().map_or(0, SimulatedPath::len);
            if self.position + 1 >= len {
                self.done = true;
                self.emit(ExecutionEventKind::Completed, Some(node));
                return Ok(TickStatus::Completed);
            }
            self.position += 1;
            let next = self.current_node().ok_or(ExecutionError::NoActivePath)?;
            self.enter_node(ctx, next, ExecutionEventKind::Entered)?;
            return Ok(TickStatus::Running);
        }

        Ok(TickStatus::Running)
    }

    /// One tick while the interrupt node is in control.
    fn update_interrupt(&mut self, ctx: &mut C, targets: Targets) -> GambitResult<TickStatus> {
        let node = targets
            .interrupt
            .ok_or_else(|| GambitError::internal("interrupt in progress without interrupt node"))?;
        let (interrupted, failed, finished) = self.status_of(node, ctx)?;

        if interrupted {
            return Err(ExecutionError::InterruptedWhileHandlingInterrupt { node }.into());
        }
        if failed {
            return Err(ExecutionError::FailedWhileHandlingInterrupt { node }.into());
        }
        if finished {
            self.exit_node(ctx, node)?;
            self.handling_interrupt = false;
            let resumed = self.current_node().ok_or(ExecutionError::NoActivePath)?;
            self.enter_node(ctx, resumed, ExecutionEventKind::Resumed)?;
            return Ok(TickStatus::Resumed);
        }
        Ok(TickStatus::Running)
    }

    /// Drop the active path, exiting the active node and running each
    /// distinct path node's `cleanup` exactly once.
    ///
    /// # Errors
    ///
    /// [`ExecutionError::NoActivePath`] when there is nothing to abandon.
    pub fn abandon(&mut self, ctx: &mut C) -> GambitResult<()> {
        if self.path.is_none() {
            return Err(ExecutionError::NoActivePath.into());
        }
        let targets = self.targets.ok_or(ExecutionError::NotInitialized)?;

        if self.entered {
            let active = if self.handling_interrupt {
                targets.interrupt.ok_or_else(|| {
                    GambitError::internal("interrupt in progress without interrupt node")
                })?
            } else {
                self.current_node().ok_or(ExecutionError::NoActivePath)?
            };
            self.exit_node(ctx, active)?;
        }

        let path = self.path.take().ok_or(ExecutionError::NoActivePath)?;
        let mut cleaned = HashSet::new();
        for &id in path.nodes() {
            if cleaned.insert(id) {
                self.graph.node_mut(id)?.cleanup();
            }
        }
        if self.handling_interrupt {
            if let Some(interrupt) = targets.interrupt {
                if cleaned.insert(interrupt) {
                    self.graph.node_mut(interrupt)?.cleanup();
                }
            }
        }

        self.position = 0;
        self.handling_interrupt = false;
        self.emit(ExecutionEventKind::Abandoned, None);
        Ok(())
    }

    /// Subscribe to execution events over a bounded, lossy channel.
    ///
    /// A new subscription replaces any previous one.
    pub fn events(&mut self, capacity: usize) -> ExecutionEventStream {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        self.events_tx = Some(tx);
        ExecutionEventStream::new(rx)
    }

    /// Node the handler is currently positioned on, if a path is active.
    #[must_use]
    pub fn current_node(&self) -> Option<NodeId> {
        self.path
            .as_ref()
            .and_then(|p| p.nodes().get(self.position).copied())
    }

    /// The active path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&SimulatedPath<S>> {
        self.path.as_ref()
    }

    /// Simulated cost of the active path, if one is installed.
    #[must_use]
    pub fn cost(&self) -> Option<f64> {
        self.path.as_ref().map(SimulatedPath::cost)
    }

    /// Whether the goal node has finished.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Whether the interrupt node is currently in control.
    #[must_use]
    pub const fn is_handling_interrupt(&self) -> bool {
        self.handling_interrupt
    }

    /// Ticks run since construction.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Report of the most recent planning call, if one has run.
    #[must_use]
    pub const fn last_plan_report(&self) -> Option<&PlanReport> {
        self.last_report.as_ref()
    }

    /// Bookkeeping mirror of the simulation state.
    #[must_use]
    pub const fn mirror(&self) -> Option<&S> {
        self.mirror.as_ref()
    }

    /// Borrow the owned graph.
    #[must_use]
    pub const fn graph(&self) -> &ActionGraph<S, C> {
        &self.graph
    }

    /// Give the graph back.
    #[must_use]
    pub fn into_graph(self) -> ActionGraph<S, C> {
        self.graph
    }

    /// Plan from the mirror state and install the best successful path,
    /// loop-collapsed. Returns false when no successful path exists;
    /// partial paths are not executable.
    fn replan(&mut self, ctx: &C, targets: Targets) -> GambitResult<bool> {
        let seed = self
            .mirror
            .as_ref()
            .ok_or(ExecutionError::NotInitialized)?
            .clone();

        let outcome =
            Planner::new(&self.graph).plan(targets.root, targets.goal, ctx, seed, &self.options)?;

        let installed = match outcome.best_success() {
            Some(best) => {
                let initial = self
                    .mirror
                    .as_ref()
                    .ok_or(ExecutionError::NotInitialized)?;
                let collapsed = collapse_loops(&self.graph, best, initial)?;
                self.path = Some(collapsed);
                self.position = 0;
                self.entered = false;
                self.handling_interrupt = false;
                true
            }
            None => false,
        };
        self.last_report = Some(outcome.report);
        Ok(installed)
    }

    fn status_of(&self, id: NodeId, ctx: &C) -> GambitResult<(bool, bool, bool)> {
        let node = self.graph.node(id)?;
        Ok((
            node.is_interrupted(ctx),
            node.is_failed(ctx),
            node.is_finished(ctx),
        ))
    }

    /// Run a node's live entry hook unless the mirror already marks it
    /// completed, then emit `kind`.
    fn enter_node(&mut self, ctx: &mut C, id: NodeId, kind: ExecutionEventKind) -> GambitResult<()> {
        let skip = match &self.mirror {
            Some(mirror) => self.graph.node(id)?.is_already_completed(mirror),
            None => false,
        };
        if !skip {
            self.graph.node_mut(id)?.on_enter(ctx);
        }
        self.entered = true;
        self.emit(kind, Some(id));
        Ok(())
    }

    /// Run a node's live exit hook, symmetric with [`Self::enter_node`].
    /// A node that was never entered is never exited.
    fn exit_node(&mut self, ctx: &mut C, id: NodeId) -> GambitResult<()> {
        if !self.entered {
            return Ok(());
        }
        let skip = match &self.mirror {
            Some(mirror) => self.graph.node(id)?.is_already_completed(mirror),
            None => false,
        };
        if !skip {
            self.graph.node_mut(id)?.on_exit(ctx);
        }
        self.entered = false;
        self.emit(ExecutionEventKind::Exited, Some(id));
        Ok(())
    }

    /// Fold a finished node's simulation effects into the mirror, unless
    /// the mirror already marks it completed.
    fn absorb_into_mirror(&mut self, id: NodeId) -> GambitResult<()> {
        if let Some(mirror) = self.mirror.as_mut() {
            let node = self.graph.node(id)?;
            if !node.is_already_completed(mirror) {
                node.sim_enter(mirror);
                node.sim_exit(mirror);
            }
        }
        Ok(())
    }

    fn emit(&self, kind: ExecutionEventKind, node: Option<NodeId>) {
        if let Some(tx) = &self.events_tx {
            let info = node.and_then(|id| self.graph.name(id).ok().map(|name| (id, name)));
            // Lossy on purpose: a full or dropped subscriber never stalls
            // the tick.
            let _ = tx.try_send(ExecutionEvent::new(kind, self.tick, info));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ActionNode;

    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Tally {
        counter: i64,
    }

    /// Live context the fixture nodes report their status from.
    #[derive(Debug, Default)]
    struct World {
        log: Vec<String>,
        fail_on: Option<&'static str>,
        interrupt_on: Option<&'static str>,
    }

    /// Scriptable fixture node: simulation effects are scalar counter
    /// arithmetic; live status comes from the [`World`].
    struct Step {
        name: &'static str,
        cost: f64,
        bump: i64,
        need: i64,
        completed_at: Option<i64>,
        cleanup_log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl ActionNode<Tally, World> for Step {
        fn name(&self) -> &str {
            self.name
        }

        fn should_enter(&self, state: &Tally) -> bool {
            state.counter >= self.need
        }

        fn is_already_completed(&self, state: &Tally) -> bool {
            self.completed_at.is_some_and(|at| state.counter >= at)
        }

        fn calculate_cost(&self, _state: &Tally) -> f64 {
            self.cost
        }

        fn sim_exit(&self, state: &mut Tally) {
            state.counter += self.bump;
        }

        fn on_enter(&mut self, live: &mut World) {
            live.log.push(format!("enter:{}", self.name));
        }

        fn on_exit(&mut self, live: &mut World) {
            live.log.push(format!("exit:{}", self.name));
        }

        fn is_finished(&self, live: &World) -> bool {
            live.fail_on != Some(self.name) && live.interrupt_on != Some(self.name)
        }

        fn is_failed(&self, live: &World) -> bool {
            live.fail_on == Some(self.name)
        }

        fn is_interrupted(&self, live: &World) -> bool {
            live.interrupt_on == Some(self.name)
        }

        fn cleanup(&mut self) {
            self.cleanup_log.borrow_mut().push(self.name);
        }
    }

    struct Fixture {
        handler: ExecutionHandler<Tally, World>,
        root: NodeId,
        step: NodeId,
        goal: NodeId,
        interrupt: NodeId,
    }

    /// root -> step -> goal linear chain plus a detached interrupt node.
    fn fixture() -> Fixture {
        let cleanups: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let step = |name, cost, bump, need| {
            Box::new(Step {
                name,
                cost,
                bump,
                need,
                completed_at: None,
                cleanup_log: Rc::clone(&cleanups),
            })
        };

        let mut graph = ActionGraph::new();
        let root = graph.add_node(step("root", 0.0, 0, 0));
        let mid = graph.add_node(step("step", 1.0, 1, 0));
        let goal = graph.add_node(step("goal", 1.0, 0, 0));
        let interrupt = graph.add_node(step("pause", 0.0, 0, 0));
        graph.link_chain(&[root, mid, goal]).unwrap();

        Fixture {
            handler: ExecutionHandler::new(graph),
            root,
            step: mid,
            goal,
            interrupt,
        }
    }

    fn init(fx: &mut Fixture, interrupt: bool) {
        fx.handler
            .init(
                fx.root,
                fx.goal,
                interrupt.then_some(fx.interrupt),
                Tally::default(),
                PlanOptions::default(),
            )
            .unwrap();
    }

    #[test]
    fn update_before_init_is_a_protocol_violation() {
        let mut fx = fixture();
        let mut world = World::default();
        let err = fx.handler.update(&mut world).unwrap_err();
        assert!(err.is_protocol_violation());
    }

    #[test]
    fn init_rejects_colliding_targets() {
        let mut fx = fixture();
        let err = fx
            .handler
            .init(
                fx.root,
                fx.root,
                None,
                Tally::default(),
                PlanOptions::default(),
            )
            .unwrap_err();
        assert!(err.is_validation());

        let err = fx
            .handler
            .init(
                fx.root,
                fx.goal,
                Some(fx.goal),
                Tally::default(),
                PlanOptions::default(),
            )
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn linear_path_runs_to_completion_with_paired_hooks() {
        let mut fx = fixture();
        init(&mut fx, false);
        let mut world = World::default();

        assert_eq!(fx.handler.update(&mut world).unwrap(), TickStatus::Running);
        assert_eq!(
            fx.handler.path().unwrap().nodes(),
            &[fx.root, fx.step, fx.goal]
        );
        assert_eq!(fx.handler.update(&mut world).unwrap(), TickStatus::Running);
        assert_eq!(fx.handler.update(&mut world).unwrap(), TickStatus::Running);
        assert_eq!(
            fx.handler.update(&mut world).unwrap(),
            TickStatus::Completed
        );
        assert!(fx.handler.is_done());

        assert_eq!(
            world.log,
            vec![
                "enter:root",
                "exit:root",
                "enter:step",
                "exit:step",
                "enter:goal",
                "exit:goal",
            ]
        );
        // Finished steps fold their simulation effects into the mirror.
        assert_eq!(fx.handler.mirror().unwrap().counter, 1);

        // Done is sticky.
        assert_eq!(
            fx.handler.update(&mut world).unwrap(),
            TickStatus::Completed
        );
    }

    #[test]
    fn failure_backtracks_one_step_and_recovers() {
        let mut fx = fixture();
        init(&mut fx, false);
        let mut world = World::default();

        fx.handler.update(&mut world).unwrap(); // plan, enter root
        fx.handler.update(&mut world).unwrap(); // root done, enter step
        assert_eq!(fx.handler.current_node(), Some(fx.step));

        world.fail_on = Some("step");
        assert_eq!(
            fx.handler.update(&mut world).unwrap(),
            TickStatus::Backtracked
        );
        assert_eq!(fx.handler.current_node(), Some(fx.root));

        world.fail_on = None;
        fx.handler.update(&mut world).unwrap(); // root done again, enter step
        fx.handler.update(&mut world).unwrap(); // step done, enter goal
        assert_eq!(
            fx.handler.update(&mut world).unwrap(),
            TickStatus::Completed
        );
    }

    #[test]
    fn root_failure_is_fatal() {
        let mut fx = fixture();
        init(&mut fx, false);
        let mut world = World::default();

        fx.handler.update(&mut world).unwrap(); // plan, enter root
        world.fail_on = Some("root");
        let err = fx.handler.update(&mut world).unwrap_err();
        assert!(err.is_protocol_violation());
        assert!(matches!(
            err,
            GambitError::Execution(ExecutionError::RootFailed { .. })
        ));
    }

    #[test]
    fn interrupt_hands_control_over_and_resumes() {
        let mut fx = fixture();
        init(&mut fx, true);
        let mut world = World::default();

        fx.handler.update(&mut world).unwrap(); // plan, enter root
        fx.handler.update(&mut world).unwrap(); // enter step

        world.interrupt_on = Some("step");
        assert_eq!(
            fx.handler.update(&mut world).unwrap(),
            TickStatus::Interrupted
        );
        assert!(fx.handler.is_handling_interrupt());

        world.interrupt_on = None;
        assert_eq!(fx.handler.update(&mut world).unwrap(), TickStatus::Resumed);
        assert!(!fx.handler.is_handling_interrupt());
        assert_eq!(fx.handler.current_node(), Some(fx.step));

        // The interrupted node was exited, pause ran, step re-entered.
        assert_eq!(
            world.log,
            vec![
                "enter:root",
                "exit:root",
                "enter:step",
                "exit:step",
                "enter:pause",
                "exit:pause",
                "enter:step",
            ]
        );
    }

    #[test]
    fn nested_interrupt_or_failure_during_handling_is_fatal() {
        let mut fx = fixture();
        init(&mut fx, true);
        let mut world = World::default();

        fx.handler.update(&mut world).unwrap();
        fx.handler.update(&mut world).unwrap();
        world.interrupt_on = Some("step");
        fx.handler.update(&mut world).unwrap();

        world.interrupt_on = Some("pause");
        let err = fx.handler.update(&mut world).unwrap_err();
        assert!(matches!(
            err,
            GambitError::Execution(ExecutionError::InterruptedWhileHandlingInterrupt { .. })
        ));
        assert!(err.is_protocol_violation());

        world.interrupt_on = None;
        world.fail_on = Some("pause");
        let err = fx.handler.update(&mut world).unwrap_err();
        assert!(matches!(
            err,
            GambitError::Execution(ExecutionError::FailedWhileHandlingInterrupt { .. })
        ));
    }

    #[test]
    fn interrupt_without_configured_node_backtracks() {
        let mut fx = fixture();
        init(&mut fx, false);
        let mut world = World::default();

        fx.handler.update(&mut world).unwrap();
        fx.handler.update(&mut world).unwrap();
        world.interrupt_on = Some("step");
        assert_eq!(
            fx.handler.update(&mut world).unwrap(),
            TickStatus::Backtracked
        );
        assert_eq!(fx.handler.current_node(), Some(fx.root));
    }

    #[test]
    fn abandon_cleans_each_distinct_node_once() {
        let cleanups: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let step = |name, cost, bump, need| {
            Box::new(Step {
                name,
                cost,
                bump,
                need,
                completed_at: None,
                cleanup_log: Rc::clone(&cleanups),
            })
        };

        // Self-looping middle step so the planned path repeats a node.
        let mut graph = ActionGraph::new();
        let root = graph.add_node(step("root", 0.0, 0, 0));
        let inc = graph.add_node(step("inc", 1.0, 1, 0));
        let goal = graph.add_node(step("goal", 1.0, 0, 2));
        graph.link(root, inc).unwrap();
        graph.link(inc, inc).unwrap();
        graph.link(inc, goal).unwrap();

        let mut handler = ExecutionHandler::new(graph);
        handler
            .init(root, goal, None, Tally::default(), PlanOptions::default())
            .unwrap();
        let mut world = World::default();

        handler.update(&mut world).unwrap();
        assert_eq!(handler.path().unwrap().nodes(), &[root, inc, inc, goal]);

        handler.abandon(&mut world).unwrap();
        assert!(handler.path().is_none());
        assert_eq!(&*cleanups.borrow(), &["root", "inc", "goal"]);
        // The active node was exited on the way out.
        assert_eq!(world.log.last().map(String::as_str), Some("exit:root"));

        let err = handler.abandon(&mut world).unwrap_err();
        assert!(matches!(
            err,
            GambitError::Execution(ExecutionError::NoActivePath)
        ));
    }

    #[test]
    fn unreachable_goal_reports_idle() {
        let cleanups: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let mut graph = ActionGraph::new();
        let root = graph.add_node(Box::new(Step {
            name: "root",
            cost: 0.0,
            bump: 0,
            need: 0,
            completed_at: None,
            cleanup_log: Rc::clone(&cleanups),
        }));
        let goal = graph.add_node(Box::new(Step {
            name: "goal",
            cost: 1.0,
            bump: 0,
            need: 0,
            completed_at: None,
            cleanup_log: Rc::clone(&cleanups),
        }));
        // No edge between them.
        graph.link(root, root).unwrap();

        let mut handler = ExecutionHandler::new(graph);
        handler
            .init(root, goal, None, Tally::default(), PlanOptions::default())
            .unwrap();
        let mut world = World::default();
        assert_eq!(handler.update(&mut world).unwrap(), TickStatus::Idle);
        assert!(handler.path().is_none());
        assert_eq!(handler.last_plan_report().unwrap().success_paths, 0);
    }

    #[test]
    fn already_completed_nodes_skip_live_hooks() {
        let cleanups: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let step = |name, cost, bump, completed_at| {
            Box::new(Step {
                name,
                cost,
                bump,
                need: 0,
                completed_at,
                cleanup_log: Rc::clone(&cleanups),
            })
        };

        let mut graph = ActionGraph::new();
        let root = graph.add_node(step("root", 0.0, 0, None));
        // Completed from the start: the mirror counter begins at 1.
        let done = graph.add_node(step("done", 1.0, 1, Some(1)));
        let goal = graph.add_node(step("goal", 1.0, 0, None));
        graph.link_chain(&[root, done, goal]).unwrap();

        let mut handler = ExecutionHandler::new(graph);
        handler
            .init(
                root,
                goal,
                None,
                Tally { counter: 1 },
                PlanOptions::default(),
            )
            .unwrap();
        let mut world = World::default();

        while handler.update(&mut world).unwrap() != TickStatus::Completed {}

        // The completed node never ran its live hooks and never re-applied
        // its simulation effects to the mirror.
        assert!(!world.log.iter().any(|entry| entry.contains("done")));
        assert_eq!(handler.mirror().unwrap().counter, 1);
    }

    #[test]
    fn events_mirror_the_run() {
        let mut fx = fixture();
        init(&mut fx, false);
        let stream = fx.handler.events(32);
        let mut world = World::default();

        while fx.handler.update(&mut world).unwrap() != TickStatus::Completed {}

        let mut kinds = Vec::new();
        while let Some(event) = stream.try_recv().unwrap() {
            kinds.push(event.kind);
        }
        assert_eq!(
            kinds,
            vec![
                ExecutionEventKind::Entered,
                ExecutionEventKind::Exited,
                ExecutionEventKind::Entered,
                ExecutionEventKind::Exited,
                ExecutionEventKind::Entered,
                ExecutionEventKind::Exited,
                ExecutionEventKind::Completed,
            ]
        );
    }
}
