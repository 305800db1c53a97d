use meshplace_core::Strng;
use rstest::rstest;

use super::*;
use crate::model::policy::{ConstraintAnnotation, PolicyFunction};

fn svc(name: &str) -> Strng {
	Strng::from(name)
}

/// Recursively search an assertion tree for `(= var value)`.
fn contains_var_eq(expr: &Expr, var: Var, value: i64) -> bool {
	match expr {
		Expr::Eq(Term::Var(v), Term::Const(c)) => *v == var && *c == value,
		Expr::Eq(..) | Expr::Le(..) => false,
		Expr::Not(e) => contains_var_eq(e, var, value),
		Expr::And(es) | Expr::Or(es) => es.iter().any(|e| contains_var_eq(e, var, value)),
		Expr::Xor(a, b) | Expr::Implies(a, b) => {
			contains_var_eq(a, var, value) || contains_var_eq(b, var, value)
		}
	}
}

fn program_asserts(program: &Program, var: Var, value: i64) -> bool {
	program
		.assertions
		.iter()
		.any(|a| contains_var_eq(a, var, value))
}

#[test]
fn size_guard_rejects_more_than_500_services() {
	let services: Vec<Strng> = (0..501).map(|i| svc(&format!("svc-{i}"))).collect();
	let graph = CallGraph::new();
	let catalog = DataplaneCatalog::new(vec![0]);
	let err = encode(&services, &graph, &[], &catalog, &SidecarAssignment::new()).unwrap_err();
	assert!(matches!(
		err,
		PlacementError::TooLarge {
			service_count: 501,
			limit: 500
		}
	));
}

#[test]
fn unknown_dataplane_index_is_rejected() {
	let services = vec![svc("A"), svc("B")];
	let mut graph = CallGraph::new();
	graph.add_edge(svc("A"), svc("B"));
	let catalog = DataplaneCatalog::new(vec![0]);
	let policy = Policy::new(
		vec!["A".into(), "B".into()],
		vec![PolicyFunction::new("f", ConstraintAnnotation::Sender, false, [5])],
	)
	.unwrap();

	let err = encode(&services, &graph, &[policy], &catalog, &SidecarAssignment::new()).unwrap_err();
	assert!(matches!(
		err,
		PlacementError::UnknownDataplane {
			index: 5,
			catalog_len: 1
		}
	));
}

/// Services {A,B,C}, edges A->{B,C}; first
/// policy (`[A,B]`, setHeader: Sender) pins execution at A (its
/// penultimate), second policy (`[A,C]`, SenderOrReceiver, supports={2})
/// can execute at either A or C.
#[test]
fn sender_policy_pins_its_penultimate_node() {
	let services = vec![svc("A"), svc("B"), svc("C")];
	let mut graph = CallGraph::new();
	graph.add_edge(svc("A"), svc("B"));
	graph.add_edge(svc("A"), svc("C"));
	let catalog = DataplaneCatalog::new(vec![0, 1, 2]);

	let policy = Policy::new(
		vec!["A".into(), "B".into()],
		vec![PolicyFunction::new(
			"setHeader",
			ConstraintAnnotation::Sender,
			false,
			[0, 1],
		)],
	)
	.unwrap();

	let program = encode(&services, &graph, &[policy], &catalog, &SidecarAssignment::new()).unwrap();

	// A is index 0: the policy's penultimate for target B (parents(B) = {A}).
	assert!(program_asserts(&program, Var::E { policy: 0, service: 0 }, 1));
	// Every other service must be pinned to not execute it.
	assert!(program_asserts(&program, Var::E { policy: 0, service: 1 }, 0));
	assert!(program_asserts(&program, Var::E { policy: 0, service: 2 }, 0));
}

/// Mirrors `sender_policy_pins_its_penultimate_node` for the `Receiver`
/// side: the penultimate (parent) node must be pinned to 0, not left free.
#[test]
fn receiver_policy_pins_its_last_node_only() {
	let services = vec![svc("A"), svc("B"), svc("C")];
	let mut graph = CallGraph::new();
	graph.add_edge(svc("A"), svc("B"));
	graph.add_edge(svc("A"), svc("C"));
	let catalog = DataplaneCatalog::new(vec![0, 1, 2]);

	let policy = Policy::new(
		vec!["A".into(), "B".into()],
		vec![PolicyFunction::new(
			"getHeader",
			ConstraintAnnotation::Receiver,
			false,
			[0, 1],
		)],
	)
	.unwrap();

	let program = encode(&services, &graph, &[policy], &catalog, &SidecarAssignment::new()).unwrap();

	// B is index 1: the policy's last node (the target itself).
	assert!(program_asserts(&program, Var::E { policy: 0, service: 1 }, 1));
	// A is B's parent (the penultimate node) and must be pinned to 0, not
	// left free, same as every other service.
	assert!(program_asserts(&program, Var::E { policy: 0, service: 0 }, 0));
	assert!(program_asserts(&program, Var::E { policy: 0, service: 2 }, 0));
}

#[test]
fn pre_assignment_pins_the_installed_dataplane() {
	let services = vec![svc("A"), svc("B")];
	let mut graph = CallGraph::new();
	graph.add_edge(svc("A"), svc("B"));
	let catalog = DataplaneCatalog::new(vec![0, 1, 2]);

	let mut pre = SidecarAssignment::new();
	pre.set(svc("A"), 1);

	let program = encode(&services, &graph, &[], &catalog, &pre).unwrap();

	assert!(program_asserts(&program, Var::X { dataplane: 1, service: 0 }, 1));
}

#[test]
fn objective_weights_every_placement_variable_by_cost() {
	let services = vec![svc("A")];
	let graph = CallGraph::new();
	let catalog = DataplaneCatalog::new(vec![3, 7]);

	let program = encode(&services, &graph, &[], &catalog, &SidecarAssignment::new()).unwrap();

	assert_eq!(program.objective.len(), 2);
	assert!(program
		.objective
		.contains(&(Var::X { dataplane: 0, service: 0 }, 3)));
	assert!(program
		.objective
		.contains(&(Var::X { dataplane: 1, service: 0 }, 7)));
}

/// For each annotation, the policy's site constraint must pin exactly the
/// site(s) that annotation names: `Sender` pins the penultimate node,
/// `Receiver` pins the last node, and `SenderOrReceiver` allows either (spec
/// §4.2 Constraint 2).
#[rstest]
#[case::sender(ConstraintAnnotation::Sender, Var::E { policy: 0, service: 0 })]
#[case::receiver(ConstraintAnnotation::Receiver, Var::E { policy: 0, service: 1 })]
fn constraint_annotation_pins_its_named_site(#[case] constraint: ConstraintAnnotation, #[case] pinned: Var) {
	let services = vec![svc("A"), svc("B")];
	let mut graph = CallGraph::new();
	graph.add_edge(svc("A"), svc("B"));
	let catalog = DataplaneCatalog::new(vec![0]);

	let policy = Policy::new(
		vec!["A".into(), "B".into()],
		vec![PolicyFunction::new("f", constraint, false, [0])],
	)
	.unwrap();

	let program = encode(&services, &graph, &[policy], &catalog, &SidecarAssignment::new()).unwrap();
	assert!(program_asserts(&program, pinned, 1));
}

#[test]
fn senderorreceiver_with_no_penultimate_collapses_to_last() {
	// A policy whose target has no parents (target is itself a root) has an
	// empty penultimate set; the SenderOrReceiver site constraint must
	// degenerate to pinning only the last-node set.
	let services = vec![svc("A"), svc("B")];
	let mut graph = CallGraph::new();
	graph.add_edge(svc("A"), svc("B"));
	let catalog = DataplaneCatalog::new(vec![0]);

	let policy = Policy::new(
		vec!["A".into(), "B".into()],
		vec![PolicyFunction::new(
			"count",
			ConstraintAnnotation::SenderOrReceiver,
			false,
			[0],
		)],
	)
	.unwrap();

	// B has a parent (A), so force the empty-penultimate branch by asking
	// about a target with no parents: use A itself via a single-node graph.
	let services2 = vec![svc("A")];
	let graph2 = CallGraph::new();
	let policy2 = Policy::new(
		vec!["A".into(), "A".into()],
		vec![PolicyFunction::new(
			"count",
			ConstraintAnnotation::SenderOrReceiver,
			false,
			[0],
		)],
	)
	.unwrap();
	let program2 = encode(&services2, &graph2, &[policy2], &catalog, &SidecarAssignment::new()).unwrap();
	assert!(program_asserts(&program2, Var::E { policy: 0, service: 0 }, 1));

	// Sanity: the ordinary two-service case still encodes without error.
	let _ = encode(&services, &graph, &[policy], &catalog, &SidecarAssignment::new()).unwrap();
}
