use std::fmt;

/// One 0/1 integer decision variable in the encoded program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Var {
	/// `X[i][m]`: dataplane `i` is installed on service `m`.
	X { dataplane: usize, service: usize },
	/// `E[j][m]`: policy `j` executes at service `m`.
	E { policy: usize, service: usize },
	/// `S[i][j]`: dataplane `i` supports policy `j`.
	S { dataplane: usize, policy: usize },
}

impl fmt::Display for Var {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Var::X { dataplane, service } => write!(f, "X_{dataplane}_{service}"),
			Var::E { policy, service } => write!(f, "E_{policy}_{service}"),
			Var::S { dataplane, policy } => write!(f, "S_{dataplane}_{policy}"),
		}
	}
}

/// An arithmetic term: either a variable, a constant, or a sum of terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
	Var(Var),
	Const(i64),
	Sum(Vec<Term>),
}

impl Term {
	pub fn sum(vars: impl IntoIterator<Item = Var>) -> Term {
		Term::Sum(vars.into_iter().map(Term::Var).collect())
	}
}

/// A Boolean formula over 0/1-restricted integer variables, built up the way
/// an SMT-LIB2 assertion's s-expression nests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
	Eq(Term, Term),
	Le(Term, Term),
	Not(Box<Expr>),
	And(Vec<Expr>),
	Or(Vec<Expr>),
	Xor(Box<Expr>, Box<Expr>),
	Implies(Box<Expr>, Box<Expr>),
}

impl Expr {
	pub fn var_eq(var: Var, value: i64) -> Expr {
		Expr::Eq(Term::Var(var), Term::Const(value))
	}

	/// `And` over "every var in `vars` equals `value`" — used for the
	/// penultimate/last-node pinning blocks in Constraint 2.
	pub fn all_eq(vars: impl IntoIterator<Item = Var>, value: i64) -> Expr {
		Expr::And(vars.into_iter().map(|v| Expr::var_eq(v, value)).collect())
	}

	pub fn implies(antecedent: Expr, consequent: Expr) -> Expr {
		Expr::Implies(Box::new(antecedent), Box::new(consequent))
	}

	pub fn xor(a: Expr, b: Expr) -> Expr {
		Expr::Xor(Box::new(a), Box::new(b))
	}
}

/// The encoder's output: the declared variables (in the fixed `X`-then-`E`-
/// then-`S` declaration order, also the read-back order), the assertions
/// constraining them, and the cost-minimization objective.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
	pub vars: Vec<Var>,
	pub assertions: Vec<Expr>,
	/// Coefficient per variable in the minimized sum; only `X` variables
	/// carry a nonzero coefficient, but the type doesn't enforce that.
	pub objective: Vec<(Var, u64)>,
}

impl Program {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn declare(&mut self, var: Var) {
		self.vars.push(var);
	}

	pub fn assert(&mut self, expr: Expr) {
		self.assertions.push(expr);
	}
}
