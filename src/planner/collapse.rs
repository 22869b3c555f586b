//! Loop collapsing: post-processing of raw best paths.
//!
//! Search-time pruning over-counts downstream requirements, so raw best
//! paths routinely over-repeat self-looping nodes. Collapsing re-simulates
//! the exact sequence on a fresh state clone ("is this still achievable,
//! and at what cost"), then greedily truncates repetition runs while the
//! sequence keeps re-validating. This is a local greedy relaxation,
//! best-effort by design: it never makes a path worse, but it does not
//! guarantee the global optimum either.

use crate::error::GambitResult;
use crate::graph::{ActionGraph, NodeId};
use crate::node::SimState;
use crate::path::SimulatedPath;

/// Outcome of deterministically re-simulating a node sequence.
struct Revalidation<S> {
    cost: f64,
    key_nodes: usize,
    state: S,
    /// Indices of steps that were already completed when reached.
    completed_markers: Vec<usize>,
}

/// Collapse redundant loop repetitions out of a successful path.
///
/// Partial paths and empty paths pass through unchanged. The result never
/// has higher cost or more nodes than the input and always re-validates
/// against a fresh clone of `initial`.
pub fn collapse_loops<S: SimState, C>(
    graph: &ActionGraph<S, C>,
    path: &SimulatedPath<S>,
    initial: &S,
) -> GambitResult<SimulatedPath<S>> {
    if !path.success() || path.is_empty() {
        return Ok(path.clone());
    }

    // Runs interact (shrinking one can unlock shrinking another), so a
    // single pass is not enough. Each pass strictly lowers cost or length,
    // which bounds the iteration.
    let mut collapsed = path.nodes().to_vec();
    loop {
        let next = collapse_nodes(graph, &collapsed, initial)?;
        if next == collapsed {
            break;
        }
        collapsed = next;
    }

    match revalidate(graph, &collapsed, initial)? {
        Some(r) => Ok(SimulatedPath::new(
            true,
            r.state,
            r.cost,
            r.key_nodes,
            collapsed,
        )),
        // The input did not re-validate as given; leave it untouched.
        None => Ok(path.clone()),
    }
}

/// Re-apply every predicate and sim hook of `nodes` in order against a
/// fresh clone of `initial`.
///
/// Returns `None` when the sequence is not achievable. Already-completed
/// steps contribute zero cost and are recorded as markers.
fn revalidate<S: SimState, C>(
    graph: &ActionGraph<S, C>,
    nodes: &[NodeId],
    initial: &S,
) -> GambitResult<Option<Revalidation<S>>> {
    let mut state = initial.clone();
    let mut cost = 0.0;
    let mut key_nodes = 0;
    let mut completed_markers = Vec::new();

    for (index, &id) in nodes.iter().enumerate() {
        let node = graph.node(id)?;
        if node.is_already_completed(&state) {
            completed_markers.push(index);
            continue;
        }
        if !node.should_enter(&state) {
            return Ok(None);
        }
        node.sim_enter(&mut state);
        let add_cost = node.calculate_cost(&state);
        node.sim_exit(&mut state);
        if add_cost > 0.0 {
            key_nodes += 1;
        }
        cost += add_cost;
    }

    Ok(Some(Revalidation {
        cost,
        key_nodes,
        state,
        completed_markers,
    }))
}

/// Maximal contiguous same-node runs of length two or more, as
/// `(start, len)` pairs in ascending order.
fn find_runs(nodes: &[NodeId]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=nodes.len() {
        if i == nodes.len() || nodes[i] != nodes[start] {
            if i - start >= 2 {
                runs.push((start, i - start));
            }
            start = i;
        }
    }
    runs
}

fn collapse_nodes<S: SimState, C>(
    graph: &ActionGraph<S, C>,
    nodes: &[NodeId],
    initial: &S,
) -> GambitResult<Vec<NodeId>> {
    let Some(base) = revalidate(graph, nodes, initial)? else {
        return Ok(nodes.to_vec());
    };

    // Per run, keep the largest removal that stays achievable when applied
    // to the original sequence in isolation.
    let mut removals: Vec<(usize, usize)> = Vec::new();
    for &(start, len) in &find_runs(nodes) {
        for removed in (1..len).rev() {
            let mut candidate = nodes.to_vec();
            candidate.drain(start..start + removed);
            if revalidate(graph, &candidate, initial)?.is_some() {
                removals.push((start, removed));
                break;
            }
        }
    }

    let mut variants: Vec<Vec<NodeId>> = vec![nodes.to_vec()];

    if !removals.is_empty() {
        // Right-to-left so earlier removals do not shift later indices.
        let mut combined = nodes.to_vec();
        for &(start, removed) in removals.iter().rev() {
            combined.drain(start..start + removed);
        }
        variants.push(combined);
    }

    // If the combined removals did not actually improve cost, retry the
    // transformation on sub-paths starting at each already-completed
    // marker; the prefix before a marker stays fixed.
    let improved = best_cost(graph, &variants, initial)? < base.cost;
    if !improved {
        for &marker in &base.completed_markers {
            if marker == 0 {
                continue;
            }
            let prefix = &nodes[..marker];
            let Some(at_marker) = revalidate(graph, prefix, initial)? else {
                continue;
            };
            let suffix = collapse_nodes(graph, &nodes[marker..], &at_marker.state)?;
            let mut variant = prefix.to_vec();
            variant.extend(suffix);
            variants.push(variant);
        }
    }

    // Keep the globally cheapest achievable variant; ties go to the
    // shortest, then to the earliest produced (the original comes first).
    let mut best: Option<(f64, usize, Vec<NodeId>)> = None;
    for variant in variants {
        let Some(r) = revalidate(graph, &variant, initial)? else {
            continue;
        };
        let better = match &best {
            None => true,
            Some((cost, len, _)) => {
                r.cost < *cost || (r.cost <= *cost && variant.len() < *len)
            }
        };
        if better {
            best = Some((r.cost, variant.len(), variant));
        }
    }

    Ok(best.map_or_else(|| nodes.to_vec(), |(_, _, v)| v))
}

fn best_cost<S: SimState, C>(
    graph: &ActionGraph<S, C>,
    variants: &[Vec<NodeId>],
    initial: &S,
) -> GambitResult<f64> {
    let mut best = f64::INFINITY;
    for variant in variants {
        if let Some(r) = revalidate(graph, variant, initial)? {
            best = best.min(r.cost);
        }
    }
    Ok(best)
}
