//! The external SMT backend modeled as a black-box trait: the default
//! implementation shells out, following the `tokio::process::Command`
//! child-process pattern in `mcp/upstream/mod.rs`'s stdio transport setup; a
//! unit-test implementation injects canned models to exercise the
//! orchestrator without a real solver on `PATH`.

use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::model::error::{PlacementError, Result};

/// Raw stdout captured from one backend invocation, not yet parsed against
/// the expected `(get-value ...)` grammar.
#[derive(Debug, Clone)]
pub struct RawOutput {
	pub stdout: String,
}

/// One SMT backend invocation: write `query` to a file, run the backend
/// against it with a wall-clock `timeout`, return its stdout.
#[async_trait]
pub trait SolverBackend: Send + Sync {
	async fn check(&self, query: &str, timeout: Duration) -> Result<RawOutput>;
}

/// Shells out to a real SMT-LIB2-speaking backend (e.g. `z3`), resolved via
/// `which` and invoked with the query file as its single positional argument.
pub struct ProcessBackend {
	command: PathBuf,
}

impl ProcessBackend {
	/// Resolve `command` on `PATH` once at construction, so a missing
	/// backend fails fast instead of on the first probe.
	pub fn resolve(command: &str) -> Result<Self> {
		let path = which::which(command).map_err(|e| PlacementError::SolverUnavailable {
			reason: format!("could not resolve backend '{command}': {e}"),
		})?;
		Ok(Self { command: path })
	}

	/// Build from an already-resolved path, bypassing `PATH` lookup (tests,
	/// or callers that already know exactly which binary to run).
	pub fn at_path(path: impl Into<PathBuf>) -> Self {
		Self { command: path.into() }
	}
}

#[async_trait]
impl SolverBackend for ProcessBackend {
	async fn check(&self, query: &str, timeout: Duration) -> Result<RawOutput> {
		let mut file = tempfile::NamedTempFile::new().map_err(|e| PlacementError::SolverUnavailable {
			reason: format!("could not create query file: {e}"),
		})?;
		file.write_all(query.as_bytes()).map_err(|e| PlacementError::SolverUnavailable {
			reason: format!("could not write query file: {e}"),
		})?;
		let query_path = file.path().to_path_buf();

		let mut command = Command::new(&self.command);
		command.arg(&query_path);
		command.kill_on_drop(true);

		let run = command.output();
		match tokio::time::timeout(timeout, run).await {
			Ok(Ok(output)) => {
				if !output.status.success() {
					return Err(PlacementError::SolverUnavailable {
						reason: format!("backend exited with status {}", output.status),
					});
				}
				Ok(RawOutput {
					stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
				})
			},
			Ok(Err(e)) => Err(PlacementError::SolverUnavailable {
				reason: format!("could not launch backend: {e}"),
			}),
			Err(_) => Err(PlacementError::SolverTimeout),
		}
	}
}

#[async_trait]
impl<T: SolverBackend + ?Sized> SolverBackend for std::sync::Arc<T> {
	async fn check(&self, query: &str, timeout: Duration) -> Result<RawOutput> {
		(**self).check(query, timeout).await
	}
}

/// A single canned reply for [`ScriptedBackend`].
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
	Output(String),
	Timeout,
	Unavailable(String),
}

/// Test-only backend that replays a fixed sequence of responses, one per
/// call to `check`, regardless of the query it was given. Feature-gated
/// behind `test-util` so production consumers don't pull in the extra
/// surface.
#[cfg(any(test, feature = "test-util"))]
pub struct ScriptedBackend {
	responses: std::sync::Mutex<std::collections::VecDeque<ScriptedResponse>>,
}

#[cfg(any(test, feature = "test-util"))]
impl ScriptedBackend {
	pub fn new(responses: impl IntoIterator<Item = ScriptedResponse>) -> Self {
		Self {
			responses: std::sync::Mutex::new(responses.into_iter().collect()),
		}
	}
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl SolverBackend for ScriptedBackend {
	async fn check(&self, _query: &str, _timeout: Duration) -> Result<RawOutput> {
		let next = self.responses.lock().expect("scripted backend mutex poisoned").pop_front();
		match next {
			Some(ScriptedResponse::Output(stdout)) => Ok(RawOutput { stdout }),
			Some(ScriptedResponse::Timeout) => Err(PlacementError::SolverTimeout),
			Some(ScriptedResponse::Unavailable(reason)) => Err(PlacementError::SolverUnavailable { reason }),
			None => Err(PlacementError::SolverUnavailable {
				reason: "scripted backend exhausted".to_string(),
			}),
		}
	}
}
