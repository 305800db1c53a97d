//! SolverAdapter: render a [`Program`] to SMT-LIB2, invoke the
//! [`backend::SolverBackend`], and parse its response back into a
//! [`SolveOutcome`] or a [`model::PlacementResult`].

pub mod backend;

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use meshplace_core::Strng;

use crate::encode::program::{Program, Var};
use crate::encode::smtlib;
use crate::model::error::{PlacementError, Result};
use crate::model::placement::PlacementResult;
use backend::SolverBackend;

/// The backend's tri-state reply to one query: satisfiable
/// (with a model), unsatisfiable, or timed out. A plain `Err` from
/// [`SolverAdapter::solve`] is reserved for backend failures that are not
/// one of these three documented outcomes (malformed grammar, launch
/// failure) -- still recoverable at the orchestrator's probe level, but not
/// modeled as a query result.
#[derive(Debug, Clone)]
pub enum SolveOutcome {
	Sat(BTreeMap<Var, bool>),
	Unsat,
	Timeout,
}

impl SolveOutcome {
	pub fn is_sat(&self) -> bool {
		matches!(self, SolveOutcome::Sat(_))
	}
}

/// Parse one `true`/`false`/`1`/`0` value off the end of a `(get-value ...)`
/// response line, stripping the trailing close-parens.
fn parse_value_line(line: &str) -> Result<bool> {
	let trimmed = line.trim_end_matches(')').trim();
	if trimmed.ends_with("true") || trimmed == "1" || trimmed.ends_with(" 1") {
		Ok(true)
	} else if trimmed.ends_with("false") || trimmed == "0" || trimmed.ends_with(" 0") {
		Ok(false)
	} else {
		Err(PlacementError::SolverMalformedResponse {
			reason: format!("could not parse boolean value from '{line}'"),
		})
	}
}

/// Which grammar [`SolverAdapter::solve`] expects in a `sat` response.
/// `Positional` is the default -- value lines are matched to variables
/// purely by emission order. `NameTagged` instead reads the variable name
/// each `(get-value ...)` line already carries and matches by name, which
/// removes the positional coupling that makes a reordering or batching
/// backend misparse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
	#[default]
	Positional,
	NameTagged,
}

/// Parse a backend's full stdout against the variable order it was given:
/// first line `sat`/`unsat`, then on `sat` one value line per declared
/// variable, in declaration order.
pub fn parse_response(stdout: &str, vars: &[Var]) -> Result<SolveOutcome> {
	let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
	let first = lines.next().ok_or_else(|| PlacementError::SolverMalformedResponse {
		reason: "backend produced no output".to_string(),
	})?;

	match first {
		"unsat" => return Ok(SolveOutcome::Unsat),
		"sat" => {},
		other => {
			return Err(PlacementError::SolverMalformedResponse {
				reason: format!("expected 'sat' or 'unsat' as the first line, got '{other}'"),
			});
		},
	}

	let mut values = BTreeMap::new();
	for var in vars {
		let line = lines.next().ok_or_else(|| PlacementError::SolverMalformedResponse {
			reason: format!("backend response ended before a value line for {var}"),
		})?;
		values.insert(*var, parse_value_line(line)?);
	}

	Ok(SolveOutcome::Sat(values))
}

/// Parse one `(NAME VALUE)` reply to a single `(get-value (NAME))` query,
/// tolerating the extra wrapping parens the grammar nests it in.
fn parse_tagged_line(line: &str) -> Result<(String, bool)> {
	let inner = line.trim().trim_start_matches('(').trim_end_matches(')');
	let mut parts = inner.split_whitespace();
	let name = parts.next().ok_or_else(|| PlacementError::SolverMalformedResponse {
		reason: format!("could not find a variable name in '{line}'"),
	})?;
	let value_token = parts.next().ok_or_else(|| PlacementError::SolverMalformedResponse {
		reason: format!("could not find a value token in '{line}'"),
	})?;
	let value = match value_token {
		"true" | "1" => true,
		"false" | "0" => false,
		other => {
			return Err(PlacementError::SolverMalformedResponse {
				reason: format!("unexpected value token '{other}' in '{line}'"),
			});
		},
	};
	Ok((name.to_string(), value))
}

/// As [`parse_response`], but matches each `(get-value ...)` reply to a
/// declared variable by the name it carries rather than by its position in
/// the response, so a backend that reorders or batches its replies still
/// parses correctly.
pub fn parse_response_tagged(stdout: &str, vars: &[Var]) -> Result<SolveOutcome> {
	let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
	let first = lines.next().ok_or_else(|| PlacementError::SolverMalformedResponse {
		reason: "backend produced no output".to_string(),
	})?;

	match first {
		"unsat" => return Ok(SolveOutcome::Unsat),
		"sat" => {},
		other => {
			return Err(PlacementError::SolverMalformedResponse {
				reason: format!("expected 'sat' or 'unsat' as the first line, got '{other}'"),
			});
		},
	}

	let mut by_name: std::collections::HashMap<String, bool> = std::collections::HashMap::new();
	for line in lines {
		let (name, value) = parse_tagged_line(line)?;
		by_name.insert(name, value);
	}

	let mut values = BTreeMap::new();
	for var in vars {
		let value = by_name.get(&var.to_string()).copied().ok_or_else(|| PlacementError::SolverMalformedResponse {
			reason: format!("backend response did not include a value for {var}"),
		})?;
		values.insert(*var, value);
	}

	Ok(SolveOutcome::Sat(values))
}

/// Scan a satisfying model into a [`PlacementResult`]: for each service, the
/// one dataplane (if any) whose `X[i][m]` is true; for each policy, the
/// services whose `E[j][m]` is true.
pub fn extract_placement(
	model: &BTreeMap<Var, bool>,
	services: &[Strng],
	num_dataplanes: usize,
	num_policies: usize,
) -> PlacementResult {
	let mut placements = BTreeMap::new();
	for (m, service) in services.iter().enumerate() {
		for i in 0..num_dataplanes {
			if model.get(&Var::X { dataplane: i, service: m }).copied().unwrap_or(false) {
				placements.insert(service.clone(), i);
				break;
			}
		}
	}

	let mut implementers = vec![BTreeSet::new(); num_policies];
	for (j, implementers_j) in implementers.iter_mut().enumerate() {
		for (m, service) in services.iter().enumerate() {
			if model.get(&Var::E { policy: j, service: m }).copied().unwrap_or(false) {
				implementers_j.insert(service.clone());
			}
		}
	}

	PlacementResult::new(placements, implementers)
}

/// Drives one backend invocation end to end: render, check, parse.
pub struct SolverAdapter<B: SolverBackend> {
	backend: B,
	timeout: Duration,
	response_format: ResponseFormat,
}

impl<B: SolverBackend> SolverAdapter<B> {
	pub fn new(backend: B, timeout: Duration) -> Self {
		Self {
			backend,
			timeout,
			response_format: ResponseFormat::default(),
		}
	}

	/// Opt into name-tagged response parsing.
	pub fn with_response_format(mut self, response_format: ResponseFormat) -> Self {
		self.response_format = response_format;
		self
	}

	/// Render `program`, invoke the backend, and parse its response. A
	/// backend-reported timeout becomes [`SolveOutcome::Timeout`] rather
	/// than a hard error, since the orchestrator's search strategies treat
	/// it the same as "infeasible for this target," not as fatal.
	pub async fn solve(&self, program: &Program) -> Result<SolveOutcome> {
		let query = smtlib::render(program);
		match self.backend.check(&query, self.timeout).await {
			Ok(raw) => match self.response_format {
				ResponseFormat::Positional => parse_response(&raw.stdout, &program.vars),
				ResponseFormat::NameTagged => parse_response_tagged(&raw.stdout, &program.vars),
			},
			Err(PlacementError::SolverTimeout) => Ok(SolveOutcome::Timeout),
			Err(e) => Err(e),
		}
	}
}

#[cfg(test)]
#[path = "solve_tests.rs"]
mod tests;
