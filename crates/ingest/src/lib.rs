//! Degraded JSON ingestion: parses the upstream
//! policy/interface supplier's JSON shape into [`Policy`]/[`PolicyFunction`]
//! values so fixtures shaped like real upstream output can be loaded without
//! writing a full parser. Grounded in `platform.go`'s `RegisterDataplane`
//! and `ParsePolicy`. The structure this module parses "is not normative for
//! the core" -- this crate is test/interop tooling, not a
//! placement-solving path.

use std::collections::BTreeMap;

use meshplace::model::{ConstraintAnnotation, ContextElement, Policy, PolicyFunction};
use meshplace_core::Strng;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
	#[error("malformed ingestion json: {0}")]
	Json(#[from] serde_json::Error),
	#[error("missing expected field at {path}")]
	MissingField { path: String },
	#[error(transparent)]
	Policy(#[from] meshplace::PlacementError),
}

pub type Result<T> = std::result::Result<T, IngestError>;

fn missing(path: &str) -> IngestError {
	IngestError::MissingField { path: path.to_string() }
}

/// The functions a single dataplane descriptor JSON makes available, keyed
/// by dataplane name.
#[derive(Debug, Default)]
pub struct DataplaneRegistry {
	dataplanes: BTreeMap<String, BTreeMap<String, PolicyFunction>>,
}

impl DataplaneRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register one dataplane's function set from its descriptor JSON,
	/// grounded in `platform.go`'s `RegisterDataplane`: walk `groups[].inner
	/// .Specification.CnoInterface.fields[]`, reading each field's
	/// `Action.name.name` and an optional `Action.type_.Function[0].self_`
	/// placement/mutability pair. `index` is this dataplane's position in
	/// the caller's `DataplaneCatalog`; every registered function's
	/// `supports` set becomes `{index}`, since one descriptor names
	/// functions for exactly one dataplane.
	pub fn register(&mut self, name: impl Into<String>, index: usize, json: &str) -> Result<()> {
		let root: Value = serde_json::from_str(json)?;
		let groups = root.get("groups").and_then(Value::as_array).ok_or_else(|| missing("groups"))?;

		let mut functions = BTreeMap::new();
		for group in groups {
			let Some(fields) = group.pointer("/inner/Specification/CnoInterface/fields").and_then(Value::as_array) else {
				continue;
			};
			for field in fields {
				let Some(action) = field.get("Action") else {
					continue;
				};
				let Some(function_name) = action.pointer("/name/name").and_then(Value::as_str) else {
					tracing::warn!("could not find function name in dataplane descriptor; skipping");
					continue;
				};

				let (constraint, mutable) = match action.pointer("/type_/Function/0/self_") {
					None => (ConstraintAnnotation::SenderOrReceiver, false),
					Some(self_) => {
						let placement = self_.get("placement").and_then(Value::as_str).unwrap_or("");
						let constraint = match placement {
							"In" => ConstraintAnnotation::Receiver,
							"Out" => ConstraintAnnotation::Sender,
							_ => ConstraintAnnotation::SenderOrReceiver,
						};
						let mutable = self_.get("mutability").and_then(Value::as_str) == Some("Mut");
						(constraint, mutable)
					},
				};

				functions.insert(
					function_name.to_string(),
					PolicyFunction::new(function_name, constraint, mutable, [index]),
				);
			}
		}

		self.dataplanes.insert(name.into(), functions);
		Ok(())
	}

	pub fn functions_for(&self, dataplane_name: &str) -> Option<&BTreeMap<String, PolicyFunction>> {
		self.dataplanes.get(dataplane_name)
	}
}

/// Collect the endpoint names in one context block into a single
/// [`ContextElement`]. A block with more than one endpoint is joined into a
/// bracketed literal (`[a,b]`), matching `platform.go`'s `ParsePolicy`
/// exactly -- the ingestion shape has no concept of a context element that
/// is a true set, only this textual stand-in.
fn context_element_from_block(block: &Value) -> Option<ContextElement> {
	let endpoints = block.pointer("/inner/Endpoints").and_then(Value::as_array)?;
	let names: Vec<&str> = endpoints.iter().filter_map(|e| e.get("name").and_then(Value::as_str)).collect();
	match names.as_slice() {
		[] => None,
		[single] => Some(ContextElement::from(*single)),
		many => Some(ContextElement::Literal(Strng::from(format!("[{}]", many.join(","))))),
	}
}

/// Parse one policy submission JSON into a
/// [`Policy`], resolving its `used_abstract_fields` against `registry`.
/// Grounded in `platform.go`'s `ParsePolicy`. Functions the registry has no
/// entry for are silently dropped, matching the original's best-effort
/// lookup (`p.functionsRegistry[dataplaneName][functionName]`, which
/// defaults to a zero value on a missing key).
pub fn parse_policy(json: &str, registry: &DataplaneRegistry) -> Result<Policy> {
	let root: Value = serde_json::from_str(json)?;

	let matches = root
		.pointer("/groups/0/inner/Policy/matches")
		.and_then(Value::as_array)
		.ok_or_else(|| missing("groups[0].inner.Policy.matches"))?;

	let context_blocks = matches
		.iter()
		.find_map(|m| m.get("Context"))
		.and_then(|c| c.get("blocks"))
		.and_then(Value::as_array)
		.ok_or_else(|| missing("groups[0].inner.Policy.matches[].Context.blocks"))?;

	let context: Vec<ContextElement> = context_blocks.iter().filter_map(context_element_from_block).collect();

	let dataplane_path = root.pointer("/imports/0/path").and_then(Value::as_str).ok_or_else(|| missing("imports[0].path"))?;
	let dataplane_name = format!("{dataplane_path}.json");
	let registry_functions = registry.functions_for(&dataplane_name);

	let used_fields = root
		.pointer("/groups/0/inner/Policy/used_abstract_fields")
		.and_then(Value::as_array)
		.ok_or_else(|| missing("groups[0].inner.Policy.used_abstract_fields"))?;

	let mut functions = Vec::new();
	for group in used_fields {
		let Some(entries) = group.as_array() else {
			continue;
		};
		for entry in entries {
			let Some(function_name) = entry.pointer("/set/0").and_then(Value::as_str) else {
				continue;
			};
			match registry_functions.and_then(|fs| fs.get(function_name)) {
				Some(pf) => functions.push(pf.clone()),
				None => tracing::warn!(dataplane = %dataplane_name, function_name, "unknown function referenced by policy; dropping"),
			}
		}
	}

	Policy::new(context, functions).map_err(IngestError::from)
}
