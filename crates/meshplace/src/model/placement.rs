use std::collections::{BTreeMap, BTreeSet};

use meshplace_core::Strng;

/// The outcome of a successful solve: which service got which dataplane, and
/// which services execute each policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlacementResult {
	placements: BTreeMap<Strng, usize>,
	/// Indexed the same way as the policy slice that produced this result.
	implementers: Vec<BTreeSet<Strng>>,
}

impl PlacementResult {
	pub fn new(placements: BTreeMap<Strng, usize>, implementers: Vec<BTreeSet<Strng>>) -> Self {
		Self {
			placements,
			implementers,
		}
	}

	pub fn dataplane_for(&self, service: &str) -> Option<usize> {
		self.placements.get(service).copied()
	}

	pub fn placements(&self) -> &BTreeMap<Strng, usize> {
		&self.placements
	}

	pub fn implementers_of(&self, policy_index: usize) -> Option<&BTreeSet<Strng>> {
		self.implementers.get(policy_index)
	}

	pub fn implementers(&self) -> &[BTreeSet<Strng>] {
		&self.implementers
	}

	pub fn sidecar_count(&self) -> usize {
		self.placements.len()
	}
}
