//! Queue resolution
//!
//! Turns a requested list of command names into one final, safe execution
//! sequence: prerequisite expansion, soft-order refinement, phase
//! partitioning, and a closing requirement check. Resolution is pure with
//! respect to the registry; the same registry and request always produce
//! the same sequence.

use crate::error::{ResolveError, ResolveResult};
use crate::registry::{CommandRegistry, PhasePlan};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Resolve a requested queue into the final execution sequence
pub fn resolve(
    registry: &CommandRegistry,
    plan: Option<&PhasePlan>,
    requested: &[String],
) -> ResolveResult<Vec<String>> {
    let mut seq = Vec::new();
    let mut stack = Vec::new();

    // Step 1: seed expansion. Prerequisites are inserted before their
    // dependent and skipped when already present; explicit requests are
    // never deduplicated.
    for name in requested {
        let cmd = registry.get(name)?;
        stack.push(name.clone());
        for prereq in &cmd.require_before {
            expand_prereq(registry, prereq, &mut seq, &mut stack, None)?;
        }
        stack.pop();
        seq.push(name.clone());
    }

    // Step 2: soft-order refinement (stable topological sort).
    let seq = refine(registry, seq)?;

    // Step 3: phase partitioning (stable regroup).
    let seq = partition(registry, plan, seq)?;

    // Step 4: the combined ordering must still satisfy every requirement.
    verify_requirements(registry, &seq)?;

    Ok(seq)
}

/// Expand a dynamically queued command into its not-yet-completed
/// prerequisite closure, ending with the command itself
///
/// Used by the executor when a command that entered the queue at run time
/// (a chain or a trigger) still has unmet requirements.
pub(crate) fn expand_runtime(
    registry: &CommandRegistry,
    name: &str,
    completed: &HashSet<String>,
) -> ResolveResult<Vec<String>> {
    let mut seq = Vec::new();
    let mut stack = vec![name.to_string()];

    let cmd = registry.get(name)?;
    for prereq in &cmd.require_before {
        expand_prereq(registry, prereq, &mut seq, &mut stack, Some(completed))?;
    }
    seq.push(name.to_string());
    Ok(seq)
}

/// Recursively insert a prerequisite and its own prerequisites
fn expand_prereq(
    registry: &CommandRegistry,
    name: &str,
    seq: &mut Vec<String>,
    stack: &mut Vec<String>,
    completed: Option<&HashSet<String>>,
) -> ResolveResult<()> {
    if stack.iter().any(|n| n == name) {
        let mut chain = stack.clone();
        chain.push(name.to_string());
        return Err(ResolveError::CircularRequirement(chain.join(" -> ")));
    }
    if seq.iter().any(|n| n == name) {
        return Ok(());
    }
    if completed.map_or(false, |done| done.contains(name)) {
        return Ok(());
    }

    let cmd = registry.get(name)?;
    stack.push(name.to_string());
    for prereq in &cmd.require_before {
        expand_prereq(registry, prereq, seq, stack, completed)?;
    }
    stack.pop();
    seq.push(name.to_string());
    Ok(())
}

/// Stable topological sort over the soft and hard ordering constraints
///
/// Edges run from the first occurrence of the must-precede name to every
/// occurrence of the must-follow name; unconstrained commands keep their
/// insertion order.
fn refine(registry: &CommandRegistry, seq: Vec<String>) -> ResolveResult<Vec<String>> {
    let n = seq.len();
    if n <= 1 {
        return Ok(seq);
    }

    let mut first_occurrence: HashMap<&str, usize> = HashMap::new();
    let mut occurrences: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, name) in seq.iter().enumerate() {
        first_occurrence.entry(name.as_str()).or_insert(i);
        occurrences.entry(name.as_str()).or_default().push(i);
    }

    let mut edges: BTreeSet<(usize, usize)> = BTreeSet::new();
    let mut add_relation = |precedes: &str, follows: &str| {
        if precedes == follows {
            return;
        }
        if let (Some(&src), Some(dsts)) = (
            first_occurrence.get(precedes),
            occurrences.get(follows),
        ) {
            for &dst in dsts {
                if src != dst {
                    edges.insert((src, dst));
                }
            }
        }
    };

    for name in seq.iter() {
        let cmd = registry.get(name)?;
        for after in &cmd.goes_after {
            add_relation(after, name);
        }
        for before in &cmd.goes_before {
            add_relation(name, before);
        }
        for prereq in &cmd.require_before {
            add_relation(prereq, name);
        }
    }

    let mut indegree = vec![0usize; n];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(src, dst) in &edges {
        indegree[dst] += 1;
        outgoing[src].push(dst);
    }

    let mut placed = vec![false; n];
    let mut result = Vec::with_capacity(n);
    for _ in 0..n {
        let next = (0..n).find(|&i| !placed[i] && indegree[i] == 0);
        match next {
            Some(i) => {
                placed[i] = true;
                result.push(seq[i].clone());
                for &dst in &outgoing[i] {
                    indegree[dst] -= 1;
                }
            }
            None => return Err(conflict_pair(&seq, &edges, &placed)),
        }
    }

    Ok(result)
}

/// Report a conflicting pair from a stalled topological sort
fn conflict_pair(seq: &[String], edges: &BTreeSet<(usize, usize)>, placed: &[bool]) -> ResolveError {
    for &(src, dst) in edges {
        if !placed[src] && !placed[dst] {
            return ResolveError::OrderingConflict {
                first: seq[src].clone(),
                second: seq[dst].clone(),
            };
        }
    }
    // a stall always leaves at least one fully-unplaced edge
    ResolveError::OrderingConflict {
        first: String::from("<unresolved>"),
        second: String::from("<unresolved>"),
    }
}

/// Stable regroup of the sequence by declared phase order
fn partition(
    registry: &CommandRegistry,
    plan: Option<&PhasePlan>,
    seq: Vec<String>,
) -> ResolveResult<Vec<String>> {
    let Some(plan) = plan else {
        return Ok(seq);
    };

    let mut keyed = Vec::with_capacity(seq.len());
    for name in seq {
        let cmd = registry.get(&name)?;
        let rank = match &cmd.phase {
            Some(phase) => plan
                .rank(phase)
                .ok_or_else(|| crate::error::RegistryError::UnknownPhase {
                    phase: phase.clone(),
                    referenced_by: name.clone(),
                })?,
            None => plan.default_rank(),
        };
        keyed.push((rank, name));
    }

    keyed.sort_by_key(|(rank, _)| *rank);
    Ok(keyed.into_iter().map(|(_, name)| name).collect())
}

/// Verify every requirement survived refinement and partitioning
fn verify_requirements(registry: &CommandRegistry, seq: &[String]) -> ResolveResult<()> {
    let mut first_occurrence: HashMap<&str, usize> = HashMap::new();
    for (i, name) in seq.iter().enumerate() {
        first_occurrence.entry(name.as_str()).or_insert(i);
    }

    let mut checked: HashSet<&str> = HashSet::new();
    for name in seq {
        if !checked.insert(name.as_str()) {
            continue;
        }
        let cmd = registry.get(name)?;
        for prereq in &cmd.require_before {
            if let (Some(&req_pos), Some(&cmd_pos)) = (
                first_occurrence.get(prereq.as_str()),
                first_occurrence.get(name.as_str()),
            ) {
                if req_pos > cmd_pos {
                    return Err(ResolveError::OrderingConflict {
                        first: prereq.clone(),
                        second: name.clone(),
                    });
                }
            }
        }
    }

    Ok(())
}
