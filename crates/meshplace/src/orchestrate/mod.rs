//! PlacementOrchestrator: drive the solver via one of four
//! strategies -- a single cost-minimizing solve, binary search on a sidecar
//! budget, parallel probing of several budgets at once, or batched admission
//! of a large policy set with placements carried forward between batches.
//!
//! Strategy B's binary-search shape is grounded directly in
//! `pkg/placement/placement.go`'s `GetPlacement`: the same `low`/`high`
//! narrowing loop, kept here alongside the newer cost-aware Strategy A
//! instead of being the only search mode. Strategy C's fan-out/gather is
//! `futures::future::join_all` over one future per probe; each probe's
//! backend invocation is an independent subprocess (or, in tests, an
//! independent scripted call) with its own query file, so they still run
//! concurrently even though the futures themselves are polled from one task
//! rather than `tokio::spawn`ed onto separate ones -- the probes borrow
//! `request`, which isn't `'static`, so spawning would need an owned clone
//! per probe for no real benefit.

use std::collections::BTreeMap;

use futures::future::join_all;
use meshplace_core::Strng;

use crate::config::SolverConfig;
use crate::encode::program::Var;
use crate::encode::{encode, encode_with_budget};
use crate::model::dataplane::{DataplaneCatalog, SidecarAssignment};
use crate::model::error::{PlacementError, Result};
use crate::model::graph::CallGraph;
use crate::model::placement::PlacementResult;
use crate::model::policy::Policy;
use crate::solve::backend::SolverBackend;
use crate::solve::{SolveOutcome, SolverAdapter, extract_placement};

/// The inputs every strategy shares: services, the call graph, the policies
/// to place, the dataplane catalog, and the current pre-assignment.
pub struct PlacementRequest<'a> {
	pub services: &'a [Strng],
	pub graph: &'a CallGraph,
	pub policies: &'a [Policy],
	pub catalog: &'a DataplaneCatalog,
	pub pre_assignment: &'a SidecarAssignment,
}

pub struct PlacementOrchestrator<B: SolverBackend> {
	adapter: SolverAdapter<B>,
	config: SolverConfig,
}

impl<B: SolverBackend> PlacementOrchestrator<B> {
	pub fn new(backend: B, config: SolverConfig) -> Result<Self> {
		config.validate()?;
		let adapter = SolverAdapter::new(backend, config.timeout).with_response_format(config.response_format);
		Ok(Self { adapter, config })
	}

	/// Strategy A: emit the full cost-encoded program and return the
	/// backend's optimal model directly. The only strategy that actually
	/// minimizes cost; B/C/D all target a sidecar-count budget instead.
	pub async fn solve_optimal(&self, request: &PlacementRequest<'_>) -> Result<PlacementResult> {
		let program = encode(
			request.services,
			request.graph,
			request.policies,
			request.catalog,
			request.pre_assignment,
		)?;
		match self.adapter.solve(&program).await? {
			SolveOutcome::Sat(model) => Ok(extract_placement(
				&model,
				request.services,
				request.catalog.len(),
				request.policies.len(),
			)),
			SolveOutcome::Unsat | SolveOutcome::Timeout => Err(PlacementError::Infeasible),
		}
	}

	async fn probe_target(&self, request: &PlacementRequest<'_>, target: usize) -> SolveOutcome {
		let program = match encode_with_budget(
			request.services,
			request.graph,
			request.policies,
			request.catalog,
			request.pre_assignment,
			target,
		) {
			Ok(p) => p,
			Err(_) => return SolveOutcome::Unsat,
		};
		// A backend failure is logged and treated as infeasible for this
		// target; the orchestrator does not retry.
		match self.adapter.solve(&program).await {
			Ok(outcome) => outcome,
			Err(e) => {
				tracing::warn!(error = %e, target, "solver probe failed; treating as infeasible");
				SolveOutcome::Unsat
			},
		}
	}

	/// Strategy B: binary search the smallest feasible sidecar-count target
	/// in `[0, |services|]`.
	pub async fn solve_binary_search(&self, request: &PlacementRequest<'_>) -> Result<PlacementResult> {
		let mut low = 0usize;
		let mut high = request.services.len();
		let mut best: Option<BTreeMap<Var, bool>> = None;

		while low < high {
			let mid = low + (high - low) / 2;
			match self.probe_target(request, mid).await {
				SolveOutcome::Sat(model) => {
					best = Some(model);
					high = mid;
				},
				SolveOutcome::Unsat | SolveOutcome::Timeout => {
					low = mid + 1;
				},
			}
		}

		// The search converges on `low == high`; `best` always covers it,
		// since `high` only ever shrinks to a value that was just proven
		// feasible.
		match best {
			Some(model) => Ok(extract_placement(
				&model,
				request.services,
				request.catalog.len(),
				request.policies.len(),
			)),
			None => Err(PlacementError::Infeasible),
		}
	}

	/// Evenly spaced probe targets in `[low, high]`, capped at `max_threads`
	/// and deduplicated.
	fn spaced_targets(low: usize, high: usize, max_threads: usize) -> Vec<usize> {
		if low > high {
			return Vec::new();
		}
		let span = high - low;
		let count = max_threads.max(1).min(span + 1);
		if count <= 1 {
			return vec![low];
		}
		let mut targets: Vec<usize> = (0..count)
			.map(|k| low + (span * k) / (count - 1))
			.collect();
		targets.dedup();
		targets
	}

	/// Strategy C: dispatch probes at evenly spaced targets concurrently,
	/// then locate the smallest feasible one. If it isn't the lowest
	/// dispatched target, recurse on the interval between the two flanking
	/// targets -- the feasibility predicate is monotone in `target`, so the
	/// first feasible probe bounds the optimum from above.
	pub fn solve_parallel_probe<'a>(
		&'a self,
		request: &'a PlacementRequest<'a>,
		low: usize,
		high: usize,
	) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<PlacementResult>> + 'a>> {
		Box::pin(async move {
			if low > high {
				return Err(PlacementError::Infeasible);
			}

			let targets = Self::spaced_targets(low, high, self.config.max_threads);
			let futures = targets.iter().map(|&target| async move { (target, self.probe_target(request, target).await) });
			let mut probes = join_all(futures).await;
			probes.sort_by_key(|(target, _)| *target);

			let feasible_idx = probes.iter().position(|(_, outcome)| outcome.is_sat());
			match feasible_idx {
				None => Err(PlacementError::Infeasible),
				Some(0) => {
					let SolveOutcome::Sat(model) = &probes[0].1 else {
						unreachable!("feasible_idx only points at Sat outcomes");
					};
					Ok(extract_placement(
						model,
						request.services,
						request.catalog.len(),
						request.policies.len(),
					))
				},
				Some(i) => {
					let flank_low = probes[i - 1].0;
					let flank_high = probes[i].0;
					self.solve_parallel_probe(request, flank_low + 1, flank_high).await
				},
			}
		})
	}

	/// Strategy D: partition `policies` into fixed-size batches, solve each
	/// in turn, and carry the resulting sidecar set forward as the next
	/// batch's pre-assignment. Trades optimality for solve-time linearity;
	/// the only fully-incremental mode.
	pub async fn solve_batched(
		&self,
		services: &[Strng],
		graph: &CallGraph,
		policies: &[Policy],
		catalog: &DataplaneCatalog,
		initial_assignment: &SidecarAssignment,
	) -> Result<PlacementResult> {
		let mut assignment = initial_assignment.clone();
		let mut last = None;

		for batch in policies.chunks(self.config.batch_size) {
			let request = PlacementRequest {
				services,
				graph,
				policies: batch,
				catalog,
				pre_assignment: &assignment,
			};
			let result = self.solve_optimal(&request).await?;

			let mut next_assignment = SidecarAssignment::new();
			for (service, dataplane) in result.placements() {
				next_assignment.set(service.clone(), *dataplane);
			}
			assignment = next_assignment;
			last = Some(result);
		}

		last.ok_or(PlacementError::Infeasible)
	}
}

#[cfg(test)]
#[path = "orchestrate_tests.rs"]
mod tests;
