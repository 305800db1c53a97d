//! ConflictDetector: decide whether a new policy conflicts with
//! any already-admitted policy.
//!
//! Grounded directly in `pkg/conflict/conflict.go`'s `overlappingContext` +
//! `FindConflictingPolicies`: a full-expansion path set per policy, an
//! overlap test, and a `mutable` check on both sides. The string-join
//! substring overlap test is preserved bit-for-bit as the default; `strict` mode compares expanded paths by exact element
//! sequence instead.

use meshplace_core::Strng;

use crate::config::VacuousWildcardPolicy;
use crate::expand::expand;
use crate::model::error::{PlacementError, Result};
use crate::model::graph::CallGraph;
use crate::model::policy::Policy;

/// Whether `shorter` appears as a contiguous subsequence of `longer`.
fn is_contiguous_subsequence(shorter: &[Strng], longer: &[Strng]) -> bool {
	if shorter.is_empty() || shorter.len() > longer.len() {
		return shorter.is_empty();
	}
	longer.windows(shorter.len()).any(|w| w == shorter)
}

/// The source's overlap test: join each path with `,` and ask whether one
/// joined form is a substring of the other. Deliberately lossy -- a service
/// name that is a substring of another service name can produce a false
/// positive; callers that care use `strict` mode instead.
fn overlaps_lossy(a: &[Strng], b: &[Strng]) -> bool {
	let joined_a = a.iter().map(Strng::as_str).collect::<Vec<_>>().join(",");
	let joined_b = b.iter().map(Strng::as_str).collect::<Vec<_>>().join(",");
	if joined_a.len() > joined_b.len() {
		joined_a.contains(&joined_b)
	} else {
		joined_b.contains(&joined_a)
	}
}

fn overlaps_strict(a: &[Strng], b: &[Strng]) -> bool {
	if a.len() > b.len() {
		is_contiguous_subsequence(b, a)
	} else {
		is_contiguous_subsequence(a, b)
	}
}

fn any_path_overlaps(paths_a: &[Vec<Strng>], paths_b: &[Vec<Strng>], strict: bool) -> bool {
	for pa in paths_a {
		for pb in paths_b {
			let overlap = if strict {
				overlaps_strict(pa, pb)
			} else {
				overlaps_lossy(pa, pb)
			};
			if overlap {
				return true;
			}
		}
	}
	false
}

/// Decide whether `a` and `b` conflict: both must mutate, and their full
/// expansions must share a prefix/suffix containment. Symmetric
/// in `a`/`b` by construction (testable property 7).
pub fn conflicts(a: &Policy, b: &Policy, graph: &CallGraph, strict: bool, vacuous: VacuousWildcardPolicy) -> Result<bool> {
	if !a.mutates() || !b.mutates() {
		return Ok(false);
	}

	let paths_a = expand(a.context(), graph, true)?;
	let paths_b = expand(b.context(), graph, true)?;

	if paths_a.is_empty() || paths_b.is_empty() {
		if matches!(vacuous, VacuousWildcardPolicy::Escalate) && (paths_a.is_empty() || paths_b.is_empty()) {
			return Err(PlacementError::MalformedContext {
				reason: "wildcard has no connecting path; escalated by configuration".to_string(),
			});
		}
		return Ok(false);
	}

	Ok(any_path_overlaps(&paths_a, &paths_b, strict))
}

/// `findConflicts`: every policy in `existing` that conflicts
/// with `candidate`, in the order they appear in `existing`.
pub fn find_conflicts(
	existing: &[Policy],
	candidate: &Policy,
	graph: &CallGraph,
	strict: bool,
	vacuous: VacuousWildcardPolicy,
) -> Result<Vec<usize>> {
	let mut result = Vec::new();
	for (idx, policy) in existing.iter().enumerate() {
		if conflicts(policy, candidate, graph, strict, vacuous)? {
			result.push(idx);
		}
	}
	Ok(result)
}

#[cfg(test)]
#[path = "conflict_tests.rs"]
mod tests;
