//! ConstraintEncoder: turns policies, the call graph, a
//! dataplane catalog, and a pre-assignment into a 0/1 integer program.
//!
//! `X[i][m]`/`E[j][m]`/`S[i][j]` integer-cost encoding generalizes
//! the Boolean, single-dataplane encoding in `pkg/placement/smt/smt.go`;
//! Constraint 2's per-policy site derivation (`lastNodes`/`penultimateNodes`)
//! is the direct descendant of that file's sender/receiver handling.

pub mod program;
pub mod smtlib;

use meshplace_core::Strng;

use crate::model::error::{PlacementError, Result};
use crate::model::graph::CallGraph;
use crate::model::policy::{ConstraintAnnotation, Policy};
use crate::model::dataplane::{DataplaneCatalog, SidecarAssignment};
use program::{Expr, Program, Term, Var};

/// Above this many services, encoding time and query size become
/// prohibitive.
pub const SERVICE_LIMIT: usize = 500;

fn service_index(services: &[Strng], name: &str) -> Option<usize> {
	services.iter().position(|s| s.as_str() == name)
}

/// Derive `(penultimateNodes, lastNodes)` for a policy.
fn last_and_penultimate(policy: &Policy, graph: &CallGraph) -> Result<(Vec<Strng>, Vec<Strng>)> {
	let context = policy.context();
	if policy.ends_with_wildcard() {
		let second_last = context[context.len() - 2].as_literal().ok_or_else(|| {
			PlacementError::MalformedContext {
				reason: "element before a trailing wildcard must be a literal".to_string(),
			}
		})?;
		let penultimate = vec![second_last.clone()];
		let last = graph.children(second_last).to_vec();
		Ok((penultimate, last))
	} else {
		let last_literal = context[context.len() - 1].as_literal().ok_or_else(|| {
			PlacementError::MalformedContext {
				reason: "final context element must be a literal when the context does not end in a wildcard".to_string(),
			}
		})?;
		let last = vec![last_literal.clone()];
		let penultimate = graph.parents(last_literal);
		Ok((penultimate, last))
	}
}

/// Encode a placement problem into a [`Program`]. `services`
/// fixes the index assigned to each service for the `m` dimension of every
/// variable; callers typically pass `graph.services()` sorted as they see
/// fit, since service ordering is left unspecified beyond "declarations in
/// a fixed order."
pub fn encode(
	services: &[Strng],
	graph: &CallGraph,
	policies: &[Policy],
	catalog: &DataplaneCatalog,
	pre_assignment: &SidecarAssignment,
) -> Result<Program> {
	if services.len() > SERVICE_LIMIT {
		return Err(PlacementError::TooLarge {
			service_count: services.len(),
			limit: SERVICE_LIMIT,
		});
	}

	for policy in policies {
		for function in policy.functions() {
			catalog.validate_indices(function.supports.iter().copied())?;
		}
	}

	let mut program = Program::new();

	// Declare X[i][m], then E[j][m], then S[i][j] -- a fixed order, kept for
	// deterministic emission.
	for i in catalog.indices() {
		for m in 0..services.len() {
			program.declare(Var::X { dataplane: i, service: m });
		}
	}
	for j in 0..policies.len() {
		for m in 0..services.len() {
			program.declare(Var::E { policy: j, service: m });
		}
	}
	for i in catalog.indices() {
		for j in 0..policies.len() {
			program.declare(Var::S { dataplane: i, policy: j });
		}
	}

	// Constraint 1: placement exclusivity.
	for m in 0..services.len() {
		let vars: Vec<Var> = catalog
			.indices()
			.map(|i| Var::X { dataplane: i, service: m })
			.collect();
		program.assert(Expr::Le(Term::sum(vars), Term::Const(1)));
	}

	// Constraint 2: placement site, per policy.
	for (j, policy) in policies.iter().enumerate() {
		let (penultimate, last) = last_and_penultimate(policy, graph)?;
		let penultimate_indices: Vec<usize> = penultimate
			.iter()
			.filter_map(|s| service_index(services, s))
			.collect();
		let last_indices: Vec<usize> = last
			.iter()
			.filter_map(|s| service_index(services, s))
			.collect();

		let e_at = |m: usize| Var::E { policy: j, service: m };

		// The zeroing set depends on the annotation: Sender/Receiver pin
		// everything outside their one named site set to 0, while
		// SenderOrReceiver only zeroes the complement of the union (either
		// site set is allowed). Leaving the non-pinned side unconstrained,
		// as a union-only zeroing set would for Sender/Receiver, lets the
		// solver free an E[j][m] the spec requires to be 0 (testable
		// property 3).
		let pinned: std::collections::BTreeSet<usize> = match policy.constraint() {
			ConstraintAnnotation::Sender => {
				program.assert(Expr::all_eq(penultimate_indices.iter().map(|&m| e_at(m)), 1));
				penultimate_indices.iter().copied().collect()
			}
			ConstraintAnnotation::Receiver => {
				program.assert(Expr::all_eq(last_indices.iter().map(|&m| e_at(m)), 1));
				last_indices.iter().copied().collect()
			}
			ConstraintAnnotation::SenderOrReceiver => {
				if penultimate_indices.is_empty() {
					program.assert(Expr::all_eq(last_indices.iter().map(|&m| e_at(m)), 1));
				} else if last_indices.is_empty() {
					program.assert(Expr::all_eq(penultimate_indices.iter().map(|&m| e_at(m)), 1));
				} else {
					program.assert(Expr::xor(
						Expr::all_eq(penultimate_indices.iter().map(|&m| e_at(m)), 1),
						Expr::all_eq(last_indices.iter().map(|&m| e_at(m)), 1),
					));
				}
				penultimate_indices.iter().chain(last_indices.iter()).copied().collect()
			}
		};

		for m in 0..services.len() {
			if !pinned.contains(&m) {
				program.assert(Expr::var_eq(e_at(m), 0));
			}
		}

		// Constraint 3: execution requires dataplane support.
		let supported = policy.supported_dataplanes();
		for m in 0..services.len() {
			let consequent = Expr::Or(
				catalog
					.indices()
					.filter(|i| supported.contains(i))
					.map(|i| {
						Expr::And(vec![
							Expr::var_eq(Var::X { dataplane: i, service: m }, 1),
							Expr::var_eq(Var::S { dataplane: i, policy: j }, 1),
						])
					})
					.collect(),
			);
			program.assert(Expr::implies(Expr::var_eq(e_at(m), 1), consequent));
		}

		// Constraint 4: dataplane-support pinning.
		for i in catalog.indices() {
			let value = if supported.contains(&i) { 1 } else { 0 };
			program.assert(Expr::var_eq(Var::S { dataplane: i, policy: j }, value));
		}
	}

	// Constraint 5: pre-assignment pinning.
	for (service, &dataplane) in pre_assignment.iter() {
		let Some(m) = service_index(services, service) else {
			continue;
		};
		program.assert(Expr::var_eq(Var::X { dataplane, service: m }, 1));
	}

	// Objective: minimize total sidecar cost.
	for i in catalog.indices() {
		let cost = catalog.cost(i).unwrap_or(0);
		for m in 0..services.len() {
			program.objective.push((Var::X { dataplane: i, service: m }, cost));
		}
	}

	Ok(program)
}

/// As [`encode`], plus one additional constraint bounding the total number
/// of services with any sidecar installed to at most `target`. Since Constraint 1
/// already limits each service to at most one dataplane, `Σ X[i][m] ≤
/// target` over all `i, m` is exactly "at most `target` services have a
/// sidecar."
pub fn encode_with_budget(
	services: &[Strng],
	graph: &CallGraph,
	policies: &[Policy],
	catalog: &DataplaneCatalog,
	pre_assignment: &SidecarAssignment,
	target: usize,
) -> Result<Program> {
	let mut program = encode(services, graph, policies, catalog, pre_assignment)?;
	let all_x: Vec<Var> = catalog
		.indices()
		.flat_map(|i| (0..services.len()).map(move |m| Var::X { dataplane: i, service: m }))
		.collect();
	program.assert(Expr::Le(Term::sum(all_x), Term::Const(target as i64)));
	Ok(program)
}

#[cfg(test)]
#[path = "encode_tests.rs"]
mod tests;
