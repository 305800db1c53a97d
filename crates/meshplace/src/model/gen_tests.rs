use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;

#[test]
fn generated_dag_has_no_self_loops_and_scales_with_size() {
	let mut rng = StdRng::seed_from_u64(42);
	let small = generate_dag(&mut rng, 0.3, GraphSize::Small);
	let mut rng = StdRng::seed_from_u64(42);
	let large = generate_dag(&mut rng, 0.3, GraphSize::Large);

	assert!(!small.is_empty());
	assert!(large.len() >= small.len());

	for svc in small.services() {
		assert!(!small.has_edge(&svc, &svc));
	}
}

#[test]
fn generated_policies_satisfy_the_context_invariants() {
	let mut rng = StdRng::seed_from_u64(7);
	let graph = generate_dag(&mut rng, 0.5, GraphSize::Medium);
	let policies = generate_policies(&mut rng, &graph, 25);

	assert!(!policies.is_empty());
	for policy in &policies {
		assert!(policy.context().len() >= 2);
		for pair in policy.context().windows(2) {
			assert!(!(pair[0].is_wildcard() && pair[1].is_wildcard()));
		}
		assert!(!policy.functions().is_empty());
	}
}

#[test]
fn empty_graph_yields_no_policies() {
	let mut rng = StdRng::seed_from_u64(1);
	let graph = CallGraph::new();
	let policies = generate_policies(&mut rng, &graph, 10);
	assert!(policies.is_empty());
}
