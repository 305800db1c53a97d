//! Renders an in-memory [`Program`] to SMT-LIB2 text: declarations, domain
//! restrictions, assertions, objective, `(check-sat)`, then one
//! `(get-value ...)` per variable in declaration order.

use std::fmt::Write as _;

use super::program::{Expr, Program, Term, Var};

fn render_term(term: &Term) -> String {
	match term {
		Term::Var(v) => v.to_string(),
		Term::Const(c) => c.to_string(),
		Term::Sum(terms) => {
			if terms.is_empty() {
				"0".to_string()
			} else {
				let joined = terms.iter().map(render_term).collect::<Vec<_>>().join(" ");
				format!("(+ {joined})")
			}
		}
	}
}

fn render_expr(expr: &Expr) -> String {
	match expr {
		Expr::Eq(a, b) => format!("(= {} {})", render_term(a), render_term(b)),
		Expr::Le(a, b) => format!("(<= {} {})", render_term(a), render_term(b)),
		Expr::Not(e) => format!("(not {})", render_expr(e)),
		Expr::And(es) => {
			if es.is_empty() {
				"true".to_string()
			} else {
				let joined = es.iter().map(render_expr).collect::<Vec<_>>().join(" ");
				format!("(and {joined})")
			}
		}
		Expr::Or(es) => {
			if es.is_empty() {
				"false".to_string()
			} else {
				let joined = es.iter().map(render_expr).collect::<Vec<_>>().join(" ");
				format!("(or {joined})")
			}
		}
		Expr::Xor(a, b) => format!("(xor {} {})", render_expr(a), render_expr(b)),
		Expr::Implies(a, b) => format!("(=> {} {})", render_expr(a), render_expr(b)),
	}
}

fn render_objective(objective: &[(Var, u64)]) -> String {
	let terms: Vec<String> = objective
		.iter()
		.filter(|(_, cost)| *cost != 0)
		.map(|(v, cost)| format!("(* {cost} {v})"))
		.collect();
	if terms.is_empty() {
		"0".to_string()
	} else {
		format!("(+ {})", terms.join(" "))
	}
}

/// Serialize `program` as a complete SMT-LIB2 query, ready to hand to the
/// backend as a single file.
pub fn render(program: &Program) -> String {
	let mut out = String::new();

	for var in &program.vars {
		let _ = writeln!(out, "(declare-const {var} Int)");
	}
	for var in &program.vars {
		let _ = writeln!(out, "(assert (or (= {var} 0) (= {var} 1)))");
	}
	for assertion in &program.assertions {
		let _ = writeln!(out, "(assert {})", render_expr(assertion));
	}
	if !program.objective.is_empty() {
		let _ = writeln!(out, "(minimize {})", render_objective(&program.objective));
	}
	let _ = writeln!(out, "(check-sat)");
	for var in &program.vars {
		let _ = writeln!(out, "(get-value ({var}))");
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn declares_domain_restricts_and_reads_back_every_var() {
		let mut program = Program::new();
		program.declare(Var::X { dataplane: 0, service: 0 });
		program.assert(Expr::var_eq(Var::X { dataplane: 0, service: 0 }, 1));
		program.objective.push((Var::X { dataplane: 0, service: 0 }, 3));

		let text = render(&program);
		assert!(text.contains("(declare-const X_0_0 Int)"));
		assert!(text.contains("(assert (or (= X_0_0 0) (= X_0_0 1)))"));
		assert!(text.contains("(assert (= X_0_0 1))"));
		assert!(text.contains("(minimize (+ (* 3 X_0_0)))"));
		assert!(text.contains("(check-sat)"));
		assert!(text.contains("(get-value (X_0_0))"));
	}

	#[test]
	fn zero_cost_terms_are_dropped_from_the_objective() {
		let mut program = Program::new();
		program.objective.push((Var::X { dataplane: 0, service: 0 }, 0));
		program.objective.push((Var::X { dataplane: 1, service: 0 }, 5));
		let text = render(&program);
		assert!(text.contains("(minimize (+ (* 5 X_1_0)))"));
	}

	/// Pins the full query shape (declaration block, domain restriction
	/// block, assertions, objective, check-sat, get-value block) for a
	/// two-dataplane, single-policy program, so a change to the rendering
	/// order shows up as a diff instead of a passing-but-wrong test.
	#[test]
	fn renders_a_small_program_in_the_expected_shape() {
		let mut program = Program::new();
		program.declare(Var::X { dataplane: 0, service: 0 });
		program.declare(Var::X { dataplane: 1, service: 0 });
		program.declare(Var::E { policy: 0, service: 0 });
		program.assert(Expr::var_eq(Var::E { policy: 0, service: 0 }, 1));
		program.assert(Expr::implies(
			Expr::var_eq(Var::E { policy: 0, service: 0 }, 1),
			Expr::Or(vec![
				Expr::var_eq(Var::X { dataplane: 0, service: 0 }, 1),
				Expr::var_eq(Var::X { dataplane: 1, service: 0 }, 1),
			]),
		));
		program.objective.push((Var::X { dataplane: 0, service: 0 }, 2));
		program.objective.push((Var::X { dataplane: 1, service: 0 }, 4));

		insta::assert_snapshot!(render(&program), @r###"
  (declare-const X_0_0 Int)
  (declare-const X_1_0 Int)
  (declare-const E_0_0 Int)
  (assert (or (= X_0_0 0) (= X_0_0 1)))
  (assert (or (= X_1_0 0) (= X_1_0 1)))
  (assert (or (= E_0_0 0) (= E_0_0 1)))
  (assert (= E_0_0 1))
  (assert (=> (= E_0_0 1) (or (= X_0_0 1) (= X_1_0 1))))
  (minimize (+ (* 2 X_0_0) (* 4 X_1_0)))
  (check-sat)
  (get-value (X_0_0))
  (get-value (X_1_0))
  (get-value (E_0_0))
  "###);
	}
}
