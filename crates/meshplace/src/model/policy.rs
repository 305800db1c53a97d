use std::collections::BTreeSet;

use meshplace_core::Strng;

use crate::model::error::{PlacementError, Result};
use crate::model::graph::WILDCARD;

/// Governs where a policy function may execute relative to the edge it
/// instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ConstraintAnnotation {
	Sender,
	Receiver,
	SenderOrReceiver,
}

/// A single named dataplane action a policy invokes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PolicyFunction {
	pub name: Strng,
	pub constraint: ConstraintAnnotation,
	/// Whether executing this function may alter the cross-service request
	/// envelope. Consumed by the conflict detector.
	pub mutable: bool,
	/// Which dataplane variants (indices into the catalog) provide this
	/// function.
	pub supports: BTreeSet<usize>,
}

impl PolicyFunction {
	pub fn new(
		name: impl Into<Strng>,
		constraint: ConstraintAnnotation,
		mutable: bool,
		supports: impl IntoIterator<Item = usize>,
	) -> Self {
		Self {
			name: name.into(),
			constraint,
			mutable,
			supports: supports.into_iter().collect(),
		}
	}
}

/// One element of a policy's context: either a concrete service or the
/// wildcard span.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContextElement {
	Literal(Strng),
	Wildcard,
}

impl ContextElement {
	pub fn as_literal(&self) -> Option<&Strng> {
		match self {
			ContextElement::Literal(s) => Some(s),
			ContextElement::Wildcard => None,
		}
	}

	pub fn is_wildcard(&self) -> bool {
		matches!(self, ContextElement::Wildcard)
	}
}

impl From<&str> for ContextElement {
	fn from(s: &str) -> Self {
		if s == WILDCARD {
			ContextElement::Wildcard
		} else {
			ContextElement::Literal(Strng::from(s))
		}
	}
}

/// An ordered, possibly wildcarded policy context plus the dataplane
/// functions it invokes along any path that matches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
	context: Vec<ContextElement>,
	functions: Vec<PolicyFunction>,
}

impl Policy {
	/// Construct a policy, validating its invariants:
	/// - at least two context elements,
	/// - no two consecutive wildcards,
	/// - at least one function,
	/// - functions don't mix `Sender` and `Receiver`.
	pub fn new(context: Vec<ContextElement>, functions: Vec<PolicyFunction>) -> Result<Self> {
		if context.len() < 2 {
			return Err(PlacementError::MalformedContext {
				reason: format!("context must have at least 2 elements, got {}", context.len()),
			});
		}
		for pair in context.windows(2) {
			if pair[0].is_wildcard() && pair[1].is_wildcard() {
				return Err(PlacementError::MalformedContext {
					reason: "two consecutive wildcards are not allowed".to_string(),
				});
			}
		}
		if functions.is_empty() {
			return Err(PlacementError::MalformedContext {
				reason: "a policy must have at least one function".to_string(),
			});
		}

		let has_sender = functions
			.iter()
			.any(|f| f.constraint == ConstraintAnnotation::Sender);
		let has_receiver = functions
			.iter()
			.any(|f| f.constraint == ConstraintAnnotation::Receiver);
		if has_sender && has_receiver {
			return Err(PlacementError::MalformedContext {
				reason: "a policy cannot mix Sender and Receiver functions".to_string(),
			});
		}

		Ok(Self { context, functions })
	}

	pub fn context(&self) -> &[ContextElement] {
		&self.context
	}

	pub fn functions(&self) -> &[PolicyFunction] {
		&self.functions
	}

	/// The policy's unique non-`SenderOrReceiver` annotation across its
	/// functions, or `SenderOrReceiver` if every function is that.
	pub fn constraint(&self) -> ConstraintAnnotation {
		self
			.functions
			.iter()
			.map(|f| f.constraint)
			.find(|c| *c != ConstraintAnnotation::SenderOrReceiver)
			.unwrap_or(ConstraintAnnotation::SenderOrReceiver)
	}

	/// The intersection of `supports` across all functions: the set of
	/// dataplanes able to implement every function the policy needs.
	pub fn supported_dataplanes(&self) -> BTreeSet<usize> {
		let mut iter = self.functions.iter();
		let Some(first) = iter.next() else {
			return BTreeSet::new();
		};
		let mut acc = first.supports.clone();
		for f in iter {
			acc = acc.intersection(&f.supports).copied().collect();
		}
		acc
	}

	pub fn mutates(&self) -> bool {
		self.functions.iter().any(|f| f.mutable)
	}

	pub fn ends_with_wildcard(&self) -> bool {
		self.context.last().is_some_and(ContextElement::is_wildcard)
	}

	pub fn starts_with_wildcard(&self) -> bool {
		self.context.first().is_some_and(ContextElement::is_wildcard)
	}
}
