//! The compact little-endian persisted test-case format: used to pin down
//! regression fixtures (a call graph plus a policy set) without re-deriving
//! them from the JSON ingestion path on every run.
//!
//! Grounded in `pkg/placement/generate.go`'s `WriteApplication`/
//! `ReadApplication` in the original `wire-mesh` source: same little-endian,
//! length-prefixed-string layout, just expressed with `byteorder` instead of
//! Go's `encoding/binary`.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use meshplace_core::Strng;

use crate::model::graph::CallGraph;
use crate::model::policy::{ConstraintAnnotation, ContextElement, Policy, PolicyFunction};

/// A fixture: services, the call graph, and the policy set, exactly as the
/// orchestrator would receive them from its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
	pub services: Vec<Strng>,
	pub graph: CallGraph,
	pub policies: Vec<Policy>,
}

fn write_string(w: &mut impl Write, s: &str) -> io::Result<()> {
	w.write_u32::<LittleEndian>(s.len() as u32)?;
	w.write_all(s.as_bytes())
}

fn read_string(r: &mut impl Read) -> io::Result<String> {
	let len = r.read_u32::<LittleEndian>()? as usize;
	let mut buf = vec![0u8; len];
	r.read_exact(&mut buf)?;
	String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn constraint_to_u32(c: ConstraintAnnotation) -> u32 {
	match c {
		ConstraintAnnotation::Sender => 0,
		ConstraintAnnotation::Receiver => 1,
		ConstraintAnnotation::SenderOrReceiver => 2,
	}
}

fn constraint_from_u32(v: u32) -> io::Result<ConstraintAnnotation> {
	match v {
		0 => Ok(ConstraintAnnotation::Sender),
		1 => Ok(ConstraintAnnotation::Receiver),
		2 => Ok(ConstraintAnnotation::SenderOrReceiver),
		other => Err(io::Error::new(
			io::ErrorKind::InvalidData,
			format!("unknown constraint tag {other}"),
		)),
	}
}

fn context_element_str(e: &ContextElement) -> String {
	match e {
		ContextElement::Literal(s) => s.to_string(),
		ContextElement::Wildcard => "*".to_string(),
	}
}

/// Write an [`Application`] to `w` in the persisted binary test-case format.
pub fn write_application(w: &mut impl Write, app: &Application) -> io::Result<()> {
	w.write_u32::<LittleEndian>(app.services.len() as u32)?;
	for svc in &app.services {
		write_string(w, svc)?;
	}

	let services = app.graph.services();
	w.write_u32::<LittleEndian>(services.len() as u32)?;
	for svc in &services {
		write_string(w, svc)?;
		let children = app.graph.children(svc);
		w.write_u32::<LittleEndian>(children.len() as u32)?;
		for child in children {
			write_string(w, child)?;
		}
	}

	w.write_u32::<LittleEndian>(app.policies.len() as u32)?;
	for policy in &app.policies {
		w.write_u32::<LittleEndian>(policy.context().len() as u32)?;
		for elem in policy.context() {
			write_string(w, &context_element_str(elem))?;
		}

		w.write_u32::<LittleEndian>(policy.functions().len() as u32)?;
		for func in policy.functions() {
			write_string(w, &func.name)?;
			w.write_u32::<LittleEndian>(constraint_to_u32(func.constraint))?;
			w.write_u8(func.mutable as u8)?;
			w.write_u32::<LittleEndian>(func.supports.len() as u32)?;
			for d in &func.supports {
				w.write_u32::<LittleEndian>(*d as u32)?;
			}
		}
	}

	Ok(())
}

/// Read an [`Application`] previously written by [`write_application`].
///
/// Returns an `io::Error` on truncated/malformed input; a reconstructed
/// [`Policy`] that violates its construction invariants is also surfaced as
/// an `io::Error` rather than panicking.
pub fn read_application(r: &mut impl Read) -> io::Result<Application> {
	let num_services = r.read_u32::<LittleEndian>()?;
	let mut services = Vec::with_capacity(num_services as usize);
	for _ in 0..num_services {
		services.push(Strng::from(read_string(r)?));
	}

	let num_keys = r.read_u32::<LittleEndian>()?;
	let mut edges: BTreeMap<Strng, Vec<Strng>> = BTreeMap::new();
	for _ in 0..num_keys {
		let svc = Strng::from(read_string(r)?);
		let num_edges = r.read_u32::<LittleEndian>()?;
		let mut children = Vec::with_capacity(num_edges as usize);
		for _ in 0..num_edges {
			children.push(Strng::from(read_string(r)?));
		}
		edges.insert(svc, children);
	}
	let graph = CallGraph::from_edges(edges);

	let num_policies = r.read_u32::<LittleEndian>()?;
	let mut policies = Vec::with_capacity(num_policies as usize);
	for _ in 0..num_policies {
		let context_len = r.read_u32::<LittleEndian>()?;
		let mut context = Vec::with_capacity(context_len as usize);
		for _ in 0..context_len {
			context.push(ContextElement::from(read_string(r)?.as_str()));
		}

		let num_functions = r.read_u32::<LittleEndian>()?;
		let mut functions = Vec::with_capacity(num_functions as usize);
		for _ in 0..num_functions {
			let name = read_string(r)?;
			let constraint = constraint_from_u32(r.read_u32::<LittleEndian>()?)?;
			let mutable = r.read_u8()? != 0;
			let num_dataplanes = r.read_u32::<LittleEndian>()?;
			let mut supports = Vec::with_capacity(num_dataplanes as usize);
			for _ in 0..num_dataplanes {
				supports.push(r.read_u32::<LittleEndian>()? as usize);
			}
			functions.push(PolicyFunction::new(name, constraint, mutable, supports));
		}

		let policy = Policy::new(context, functions)
			.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
		policies.push(policy);
	}

	Ok(Application {
		services,
		graph,
		policies,
	})
}

#[cfg(test)]
#[path = "binary_tests.rs"]
mod tests;
