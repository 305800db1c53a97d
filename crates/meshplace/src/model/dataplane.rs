use std::collections::BTreeMap;

use meshplace_core::Strng;

use crate::model::error::{PlacementError, Result};

/// The ordered list of dataplane variants available to the solver. Index
/// `i` is the value used in `PolicyFunction::supports` and in
/// `SidecarAssignment`/`PlacementResult`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DataplaneCatalog {
	cost: Vec<u64>,
}

impl DataplaneCatalog {
	pub fn new(cost: Vec<u64>) -> Self {
		Self { cost }
	}

	pub fn len(&self) -> usize {
		self.cost.len()
	}

	pub fn is_empty(&self) -> bool {
		self.cost.is_empty()
	}

	pub fn cost(&self, index: usize) -> Option<u64> {
		self.cost.get(index).copied()
	}

	pub fn indices(&self) -> impl Iterator<Item = usize> {
		0..self.cost.len()
	}

	pub fn contains(&self, index: usize) -> bool {
		index < self.cost.len()
	}

	/// Validate that every dataplane index referenced by `supports` is
	/// within the catalog.
	pub fn validate_indices(&self, supports: impl IntoIterator<Item = usize>) -> Result<()> {
		for index in supports {
			if !self.contains(index) {
				return Err(PlacementError::UnknownDataplane {
					index,
					catalog_len: self.len(),
				});
			}
		}
		Ok(())
	}
}

/// A partial mapping `service -> dataplane index`: the "already installed"
/// pre-state the encoder must pin into the constraint program.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SidecarAssignment {
	assigned: BTreeMap<Strng, usize>,
}

impl SidecarAssignment {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_map(assigned: BTreeMap<Strng, usize>) -> Self {
		Self { assigned }
	}

	pub fn set(&mut self, service: Strng, dataplane: usize) {
		self.assigned.insert(service, dataplane);
	}

	pub fn get(&self, service: &str) -> Option<usize> {
		self.assigned.get(service).copied()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&Strng, &usize)> {
		self.assigned.iter()
	}

	pub fn is_empty(&self) -> bool {
		self.assigned.is_empty()
	}
}
