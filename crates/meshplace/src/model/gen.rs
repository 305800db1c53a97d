//! Synthetic application graphs and policy sets for property tests and
//! scale benchmarks. Not a product feature — no CLI wraps this module.
//!
//! Grounded in `pkg/placement/generate.go`'s `GenerateDAG`/`GeneratePolicies`
//! in the original `wire-mesh` source: a tiered random DAG, then random
//! policy contexts walked along its edges with wildcards substituted in at
//! random.

use rand::Rng;

use meshplace_core::Strng;

use crate::model::graph::CallGraph;
use crate::model::policy::{ConstraintAnnotation, ContextElement, Policy, PolicyFunction};

/// Rough scale knobs for the generated graph, mirroring the original
/// `GraphSize` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphSize {
	Small,
	Medium,
	Large,
}

/// Build a tiered random DAG: each tier's services each draw a random
/// subset of the previous tiers' services as callers, with the subset size
/// governed by `density`.
pub fn generate_dag(rng: &mut impl Rng, density: f64, size: GraphSize) -> CallGraph {
	let mut graph = CallGraph::new();
	let mut services: Vec<Strng> = Vec::new();

	let base_tiers = 3;
	let tiers = match size {
		GraphSize::Small => base_tiers,
		GraphSize::Medium => base_tiers + rng.random_range(0..3),
		GraphSize::Large => base_tiers + rng.random_range(0..6),
	};

	for tier in 0..tiers {
		let base_new = 5;
		let new_services = match size {
			GraphSize::Small => base_new,
			GraphSize::Medium => base_new + rng.random_range(0..5),
			GraphSize::Large => 2 * base_new + rng.random_range(0..5),
		};

		let mut existing = services.clone();
		for k in 0..new_services {
			// Fisher-Yates shuffle of the existing services so we draw a
			// random subset of callers for the new service.
			for i in (1..existing.len()).rev() {
				let j = rng.random_range(0..=i);
				existing.swap(i, j);
			}

			let num_edges = (1.0 + existing.len() as f64 * density) as usize;
			let num_edges = num_edges.min(existing.len());

			let child = Strng::from(format!("svc-{tier}-{k}"));
			for caller in existing.iter().take(num_edges) {
				graph.add_edge(caller.clone(), child.clone());
			}
		}

		for k in 0..new_services {
			services.push(Strng::from(format!("svc-{tier}-{k}")));
		}
	}

	graph
}

/// Generate `num_policies` random policies over `graph`, drawing contexts by
/// random-walking call-graph edges and substituting some literal elements
/// with wildcards.
pub fn generate_policies(rng: &mut impl Rng, graph: &CallGraph, num_policies: usize) -> Vec<Policy> {
	let non_leaf: Vec<Strng> = graph
		.services()
		.into_iter()
		.filter(|s| !graph.children(s).is_empty())
		.collect();
	if non_leaf.is_empty() {
		return Vec::new();
	}

	let max_path_length = 5;
	let catalog_functions = [
		PolicyFunction::new("setHeader", ConstraintAnnotation::SenderOrReceiver, false, [0]),
		PolicyFunction::new("count", ConstraintAnnotation::SenderOrReceiver, false, [0]),
		PolicyFunction::new("setDeadline", ConstraintAnnotation::Sender, true, [0]),
		PolicyFunction::new("loadBalance", ConstraintAnnotation::Sender, true, [0]),
	];

	let mut policies = Vec::with_capacity(num_policies);
	for _ in 0..num_policies {
		let mut svc = non_leaf[rng.random_range(0..non_leaf.len())].clone();
		let mut context_svcs = vec![svc.clone()];

		let mut length = 1;
		loop {
			let edges = graph.children(&svc);
			if edges.is_empty() {
				break;
			}
			let next = edges[rng.random_range(0..edges.len())].clone();
			context_svcs.push(next.clone());
			svc = next;

			length += 1;
			if length >= max_path_length {
				break;
			}
		}

		let mut context: Vec<ContextElement> = context_svcs
			.iter()
			.map(|s| ContextElement::Literal(s.clone()))
			.collect();
		for j in 0..context.len() {
			let prev_is_wildcard = j > 0 && context[j - 1].is_wildcard();
			if j != 0 && !prev_is_wildcard && rng.random_bool(0.5) {
				context[j] = ContextElement::Wildcard;
			}
		}

		// A single-element context can't satisfy the minimum length
		// invariant; duplicate the only service rather than discard the
		// sample, keeping path semantics (an edge to itself is never
		// required since the context element is literal either way).
		if context.len() < 2 {
			context.push(context[0].clone());
		}

		let num_functions = 1 + rng.random_range(0..catalog_functions.len());
		let functions: Vec<PolicyFunction> = catalog_functions[..num_functions].to_vec();

		if let Ok(policy) = Policy::new(context, functions) {
			policies.push(policy);
		}
	}

	policies
}

#[cfg(test)]
#[path = "gen_tests.rs"]
mod tests;
