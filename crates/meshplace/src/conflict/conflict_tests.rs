use super::*;
use crate::model::policy::{ConstraintAnnotation, PolicyFunction};

/// `A -> {B,C}, B -> {C}`.
fn s2_graph() -> CallGraph {
	let mut g = CallGraph::new();
	g.add_edge("A".into(), "B".into());
	g.add_edge("A".into(), "C".into());
	g.add_edge("B".into(), "C".into());
	g
}

fn mutable_sender(name: &str) -> PolicyFunction {
	PolicyFunction::new(name, ConstraintAnnotation::Sender, true, [0])
}

fn mutable_sr(name: &str) -> PolicyFunction {
	PolicyFunction::new(name, ConstraintAnnotation::SenderOrReceiver, true, [0])
}

fn immutable_sr(name: &str) -> PolicyFunction {
	PolicyFunction::new(name, ConstraintAnnotation::SenderOrReceiver, false, [0])
}

#[test]
fn s2_candidate_conflicts_with_exactly_one_existing_policy() {
	let g = s2_graph();
	let existing1 = Policy::new(
		vec!["A".into(), "*".into()],
		vec![mutable_sender("set_header"), immutable_sr("get_header")],
	)
	.unwrap();
	let existing2 = Policy::new(vec!["A".into(), "C".into()], vec![mutable_sender("set_header")]).unwrap();
	let candidate = Policy::new(
		vec!["*".into(), "B".into(), "C".into()],
		vec![mutable_sender("set_header")],
	)
	.unwrap();

	let conflicts = find_conflicts(&[existing1, existing2], &candidate, &g, false, VacuousWildcardPolicy::Vacuous).unwrap();
	assert_eq!(conflicts, vec![0]);
}

#[test]
fn conflict_is_symmetric() {
	let g = s2_graph();
	let a = Policy::new(vec!["A".into(), "*".into()], vec![mutable_sender("f")]).unwrap();
	let b = Policy::new(vec!["A".into(), "B".into()], vec![mutable_sender("f")]).unwrap();

	let ab = conflicts(&a, &b, &g, false, VacuousWildcardPolicy::Vacuous).unwrap();
	let ba = conflicts(&b, &a, &g, false, VacuousWildcardPolicy::Vacuous).unwrap();
	assert_eq!(ab, ba);
}

#[test]
fn non_mutating_policies_never_conflict() {
	let g = s2_graph();
	let a = Policy::new(vec!["A".into(), "B".into()], vec![immutable_sr("f")]).unwrap();
	let b = Policy::new(vec!["A".into(), "B".into()], vec![immutable_sr("f")]).unwrap();
	assert!(!conflicts(&a, &b, &g, false, VacuousWildcardPolicy::Vacuous).unwrap());
}

#[test]
fn identical_mutating_policy_conflicts_with_itself() {
	let g = s2_graph();
	let a = Policy::new(vec!["A".into(), "B".into()], vec![mutable_sr("f")]).unwrap();
	assert!(conflicts(&a, &a, &g, false, VacuousWildcardPolicy::Vacuous).unwrap());
}

#[test]
fn identical_non_mutating_policy_does_not_conflict_with_itself() {
	let g = s2_graph();
	let a = Policy::new(vec!["A".into(), "B".into()], vec![immutable_sr("f")]).unwrap();
	assert!(!conflicts(&a, &a, &g, false, VacuousWildcardPolicy::Vacuous).unwrap());
}

#[test]
fn empty_expansion_on_either_side_is_not_conflicting() {
	// C is a leaf; there is no path from C to B, so the wildcard span is
	// disconnected and the expansion is empty.
	let g = s2_graph();
	let a = Policy::new(vec!["C".into(), "*".into(), "B".into()], vec![mutable_sr("f")]).unwrap();
	let b = Policy::new(vec!["A".into(), "B".into()], vec![mutable_sr("f")]).unwrap();
	assert!(!conflicts(&a, &b, &g, false, VacuousWildcardPolicy::Vacuous).unwrap());
}

#[test]
fn escalate_vacuous_turns_empty_expansion_into_an_error() {
	let g = s2_graph();
	let a = Policy::new(vec!["C".into(), "*".into(), "B".into()], vec![mutable_sr("f")]).unwrap();
	let b = Policy::new(vec!["A".into(), "B".into()], vec![mutable_sr("f")]).unwrap();
	let err = conflicts(&a, &b, &g, false, VacuousWildcardPolicy::Escalate).unwrap_err();
	assert!(matches!(err, PlacementError::MalformedContext { .. }));
}

#[test]
fn strict_mode_rejects_a_lossy_substring_false_positive() {
	// A service literally named "A,B" makes the comma-joined form of the
	// two-element path [A, B] textually identical to the joined form of the
	// one-element path ["A,B"], even though neither is really a subsequence
	// of the other's elements. `strict` mode must not reproduce this false
	// positive.
	let path_ab: Vec<Strng> = vec!["A".into(), "B".into()];
	let path_single: Vec<Strng> = vec!["A,B".into()];

	assert!(overlaps_lossy(&path_ab, &path_single));
	assert!(!overlaps_strict(&path_ab, &path_single));
}

#[test]
fn strict_mode_still_detects_a_genuine_prefix_overlap() {
	let mut g = CallGraph::new();
	g.add_edge("svc-1".into(), "svc-2".into());
	g.add_edge("svc-2".into(), "svc-3".into());
	let a = Policy::new(vec!["svc-1".into(), "svc-2".into()], vec![mutable_sr("f")]).unwrap();
	let b = Policy::new(
		vec!["svc-1".into(), "svc-2".into(), "svc-3".into()],
		vec![mutable_sr("f")],
	)
	.unwrap();
	assert!(conflicts(&a, &b, &g, false, VacuousWildcardPolicy::Vacuous).unwrap());
	assert!(conflicts(&a, &b, &g, true, VacuousWildcardPolicy::Vacuous).unwrap());
}
