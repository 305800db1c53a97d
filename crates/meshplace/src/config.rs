//! Solver configuration: a plain, `Default`-able struct validated once at
//! construction, shaped like a `RawConfig` -> `Config` split even though
//! there is no env/file layer here -- this is a library, not a CLI.

use std::time::Duration;

use crate::model::error::{PlacementError, Result};
use crate::solve::ResponseFormat;

/// How PathExpander and the conflict detector treat a wildcard that falls
/// between two literals with no connecting path.
/// The source behavior treats this as a vacuously satisfied, still-admissible
/// policy; this flag lets a caller escalate it to an error instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VacuousWildcardPolicy {
	/// Default: an empty expansion is a normal, vacuous result.
	#[default]
	Vacuous,
	/// Escalate: an empty expansion caused by a disconnected wildcard span
	/// is surfaced as `MalformedContext`.
	Escalate,
}

/// Construction-time configuration for the solver pipeline: the backend
/// command, its timeout, the parallel-probing thread cap, the batch-admission
/// size, and two behavioral switches for otherwise-ambiguous cases (vacuous
/// wildcard handling, solver response parsing).
#[derive(Debug, Clone)]
pub struct SolverConfig {
	/// Executable name or path resolved via `which`.
	pub backend_command: String,
	/// Wall-clock timeout per solver invocation; default 60s.
	pub timeout: Duration,
	/// Upper bound on concurrent probes dispatched by Strategy C.
	pub max_threads: usize,
	/// Policies per batch for Strategy D.
	pub batch_size: usize,
	/// Conflict detection containment test: substring-of-joined-paths
	/// (default, bit-for-bit with the source) or exact element-sequence
	/// comparison.
	pub strict_conflict_mode: bool,
	/// How a disconnected wildcard span is treated.
	pub vacuous_wildcard: VacuousWildcardPolicy,
	/// How `(get-value ...)` replies are matched back to declared variables.
	pub response_format: ResponseFormat,
}

impl Default for SolverConfig {
	fn default() -> Self {
		Self {
			backend_command: "z3".to_string(),
			timeout: Duration::from_secs(60),
			max_threads: num_cpus::get(),
			batch_size: 50,
			strict_conflict_mode: false,
			vacuous_wildcard: VacuousWildcardPolicy::Vacuous,
			response_format: ResponseFormat::default(),
		}
	}
}

impl SolverConfig {
	/// Validate the fields that have a meaningful invalid range. Called
	/// once by constructors that accept a `SolverConfig`, not on every use.
	pub fn validate(&self) -> Result<()> {
		if self.max_threads == 0 {
			return Err(PlacementError::SolverUnavailable {
				reason: "max_threads must be at least 1".to_string(),
			});
		}
		if self.batch_size == 0 {
			return Err(PlacementError::SolverUnavailable {
				reason: "batch_size must be at least 1".to_string(),
			});
		}
		if self.timeout.is_zero() {
			return Err(PlacementError::SolverUnavailable {
				reason: "timeout must be nonzero".to_string(),
			});
		}
		Ok(())
	}
}
