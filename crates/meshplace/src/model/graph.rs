use std::collections::BTreeMap;

use meshplace_core::Strng;

/// The reserved context element that stands in for a wildcard span. Must
/// never be used as a real service identifier.
pub const WILDCARD: &str = "*";

/// A microservice application call graph: a mapping from a service to its
/// ordered list of callees. The graph is assumed to be a DAG; this type does
/// not verify acyclicity.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CallGraph {
	edges: BTreeMap<Strng, Vec<Strng>>,
}

impl CallGraph {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build a graph from an edge map. Leaves absent as keys are still valid
	/// services as long as they appear as some other service's callee.
	pub fn from_edges(edges: BTreeMap<Strng, Vec<Strng>>) -> Self {
		Self { edges }
	}

	pub fn add_edge(&mut self, from: Strng, to: Strng) {
		self.edges.entry(from).or_default().push(to);
	}

	/// Every service mentioned anywhere in the graph, either as a caller or
	/// as a callee.
	pub fn services(&self) -> Vec<Strng> {
		let mut seen: Vec<Strng> = Vec::new();
		for (svc, callees) in &self.edges {
			if !seen.contains(svc) {
				seen.push(svc.clone());
			}
			for callee in callees {
				if !seen.contains(callee) {
					seen.push(callee.clone());
				}
			}
		}
		seen
	}

	/// Callees of `service`, in declared order. Leaves have no entry and
	/// return an empty slice.
	pub fn children(&self, service: &str) -> &[Strng] {
		self
			.edges
			.get(service)
			.map(Vec::as_slice)
			.unwrap_or_default()
	}

	/// Every service with an edge into `service`. Unlike `children`, this is
	/// a derived view computed by scanning the whole graph, since the edge
	/// map only stores the forward direction.
	pub fn parents(&self, service: &str) -> Vec<Strng> {
		self
			.edges
			.iter()
			.filter(|(_, callees)| callees.iter().any(|c| c.as_str() == service))
			.map(|(svc, _)| svc.clone())
			.collect()
	}

	pub fn has_edge(&self, from: &str, to: &str) -> bool {
		self
			.edges
			.get(from)
			.is_some_and(|callees| callees.iter().any(|c| c.as_str() == to))
	}

	pub fn contains_service(&self, service: &str) -> bool {
		self.edges.contains_key(service)
			|| self
				.edges
				.values()
				.any(|callees| callees.iter().any(|c| c.as_str() == service))
	}

	pub fn len(&self) -> usize {
		self.services().len()
	}

	pub fn is_empty(&self) -> bool {
		self.edges.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn graph() -> CallGraph {
		// A -> {B, C}, B -> {E}, C -> {D}, D -> {E}, E -> {F, G}
		let mut g = CallGraph::new();
		g.add_edge("A".into(), "B".into());
		g.add_edge("A".into(), "C".into());
		g.add_edge("B".into(), "E".into());
		g.add_edge("C".into(), "D".into());
		g.add_edge("D".into(), "E".into());
		g.add_edge("E".into(), "F".into());
		g.add_edge("E".into(), "G".into());
		g
	}

	#[test]
	fn children_and_parents_are_derived_correctly() {
		let g = graph();
		assert_eq!(g.children("A"), &["B".into(), "C".into()] as &[Strng]);
		assert_eq!(g.children("F"), &[] as &[Strng]);

		let mut parents_of_e = g.parents("E");
		parents_of_e.sort();
		assert_eq!(parents_of_e, vec![Strng::from("B"), Strng::from("D")]);
	}

	#[test]
	fn services_lists_leaves_too() {
		let g = graph();
		let mut services = g.services();
		services.sort();
		assert_eq!(
			services,
			vec!["A", "B", "C", "D", "E", "F", "G"]
				.into_iter()
				.map(Strng::from)
				.collect::<Vec<_>>()
		);
	}

	#[test]
	fn has_edge() {
		let g = graph();
		assert!(g.has_edge("A", "B"));
		assert!(!g.has_edge("B", "A"));
		assert!(!g.has_edge("A", "F"));
	}
}
