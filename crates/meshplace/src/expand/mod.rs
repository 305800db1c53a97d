//! PathExpander: expands a wildcarded policy context over the
//! call graph into the set of concrete request paths it matches.
//!
//! Grounded directly in `pkg/placement/smt/smt.go`'s `forwardPolicyContext`,
//! `backwardPolicyContext`, and `ExpandPolicyContext` from the original
//! `wire-mesh` source — same BFS-prefix-carrying algorithm, re-expressed
//! with owned `Vec<Strng>` paths and a `VecDeque` instead of Go's
//! slice-as-queue idiom.

use std::collections::VecDeque;

use itertools::iproduct;
use meshplace_core::Strng;

use crate::model::error::{PlacementError, Result};
use crate::model::graph::CallGraph;
use crate::model::policy::ContextElement;

/// BFS-expand every path starting at a child of `from`, stopping as soon as
/// `target` is reached on a branch (excluding `target` itself from the
/// emitted path — the caller appends it, or the next stage, as needed).
fn bfs_paths_to(graph: &CallGraph, from: &str, target: &str) -> Vec<Vec<Strng>> {
	let mut queue: VecDeque<Vec<Strng>> = graph
		.children(from)
		.iter()
		.map(|c| vec![c.clone()])
		.collect();
	let mut found = Vec::new();

	while let Some(path) = queue.pop_front() {
		let current = path.last().expect("BFS paths are never empty");
		if current.as_str() == target {
			// Drop the target itself; the caller reattaches it.
			let mut prefix = path;
			prefix.pop();
			found.push(prefix);
			continue;
		}
		for child in graph.children(current) {
			let mut next = path.clone();
			next.push(child.clone());
			queue.push_back(next);
		}
	}

	found
}

/// BFS-expand every path starting at a child of `from` all the way out to
/// every leaf reachable from it (used for the "full expand" trailing
/// wildcard case).
fn bfs_paths_to_every_leaf(graph: &CallGraph, from: &str) -> Vec<Vec<Strng>> {
	let mut queue: VecDeque<Vec<Strng>> = graph
		.children(from)
		.iter()
		.map(|c| vec![c.clone()])
		.collect();
	let mut found = Vec::new();

	while let Some(path) = queue.pop_front() {
		let current = path.last().expect("BFS paths are never empty");
		let children = graph.children(current);
		if children.is_empty() {
			found.push(path);
			continue;
		}
		for child in children {
			let mut next = path.clone();
			next.push(child.clone());
			queue.push_back(next);
		}
	}

	found
}

/// Cross every path prefix in `current` with every span, appending the span
/// onto a clone of its prefix. Shared by the internal-wildcard, full-trailing-
/// wildcard, and partial-trailing-wildcard branches below, each of which
/// differs only in how `spans` was produced.
fn extend_with_spans(current: &[Vec<Strng>], spans: &[Vec<Strng>]) -> Vec<Vec<Strng>> {
	iproduct!(current, spans)
		.map(|(prefix, span)| prefix.iter().chain(span.iter()).cloned().collect())
		.collect()
}

/// Left-to-right expansion of a context that does not begin with a
/// wildcard: `forwardPolicyContext` in the original source.
fn expand_forward(context: &[ContextElement], graph: &CallGraph, full_expand: bool) -> Result<Vec<Vec<Strng>>> {
	let ContextElement::Literal(first) = &context[0] else {
		return Err(PlacementError::MalformedContext {
			reason: "expand_forward requires a literal first element".to_string(),
		});
	};

	let mut current: Vec<Vec<Strng>> = vec![vec![first.clone()]];
	let mut prev_node = first.clone();

	let mut i = 1;
	while i < context.len() {
		match &context[i] {
			ContextElement::Literal(next) => {
				prev_node = next.clone();
				for path in &mut current {
					path.push(prev_node.clone());
				}
			}
			ContextElement::Wildcard => {
				let target = context.get(i + 1).and_then(ContextElement::as_literal);
				match target {
					Some(target) => {
						let spans = bfs_paths_to(graph, &prev_node, target);
						current = extend_with_spans(&current, &spans);
					}
					None => {
						// Trailing wildcard: there is no literal after it.
						if full_expand {
							let spans = bfs_paths_to_every_leaf(graph, &prev_node);
							current = extend_with_spans(&current, &spans);
						} else {
							let spans: Vec<Vec<Strng>> =
								graph.children(&prev_node).iter().map(|c| vec![c.clone()]).collect();
							current = extend_with_spans(&current, &spans);
						}
					}
				}
			}
		}
		i += 1;
	}

	Ok(current)
}

/// BFS over the reverse-edge graph: every nontrivial ancestor path ending at
/// `target` (`backwardPolicyContext` in the original source).
fn expand_backward(graph: &CallGraph, target: &str) -> Vec<Vec<Strng>> {
	let mut queue: VecDeque<Vec<Strng>> = VecDeque::new();
	queue.push_back(vec![Strng::from(target)]);
	let mut found = Vec::new();

	while let Some(path) = queue.pop_front() {
		if path.len() > 1 {
			found.push(path.clone());
		}
		let head = &path[0];
		for parent in graph.parents(head) {
			let mut next = vec![parent];
			next.extend(path.iter().cloned());
			queue.push_back(next);
		}
	}

	found
}

/// Expand `context` into the set of concrete request paths it matches.
/// `full_expand` controls whether a trailing wildcard is
/// extended only one hop (partial, used by the encoder) or all the way to
/// every leaf (full, used by the conflict detector).
pub fn expand(context: &[ContextElement], graph: &CallGraph, full_expand: bool) -> Result<Vec<Vec<Strng>>> {
	if context.len() < 2 {
		return Err(PlacementError::MalformedContext {
			reason: "context must have at least 2 elements".to_string(),
		});
	}

	if !context[0].is_wildcard() {
		return expand_forward(context, graph, full_expand);
	}

	// Leading wildcard: split into a backward expansion ending at
	// context[1], and a forward expansion starting at context[1..], then
	// cross them, dropping the duplicated join element.
	let join = context.get(1).and_then(ContextElement::as_literal).ok_or_else(|| {
		PlacementError::MalformedContext {
			reason: "leading wildcard must be followed by a literal".to_string(),
		}
	})?;

	let pre = expand_backward(graph, join);
	let post = expand_forward(&context[1..], graph, full_expand)?;

	// Cross product of the two expansions, dropping the duplicated join
	// element from each `post` path. If either side is vacuous (no
	// connecting path), the joined relation is vacuous too -- an empty
	// `post` must not fall back to the bare ancestor paths in `pre`.
	let mut combined = Vec::new();
	for pre_path in &pre {
		for post_path in &post {
			let mut joined = pre_path.clone();
			joined.extend(post_path.iter().skip(1).cloned());
			combined.push(joined);
		}
	}

	Ok(combined)
}

#[cfg(test)]
#[path = "expand_tests.rs"]
mod tests;
