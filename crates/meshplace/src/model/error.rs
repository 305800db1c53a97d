use meshplace_core::Strng;

/// Shared error vocabulary for the solver pipeline.
///
/// Leaf crates' own errors (expansion, encoding, solving) convert into this
/// enum via `#[from]`, the same way many HTTP-layer modules convert into a
/// single `ProxyError`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
	#[error("malformed policy context: {reason}")]
	MalformedContext { reason: String },

	#[error("policy references dataplane index {index} which is outside the catalog of size {catalog_len}")]
	UnknownDataplane { index: usize, catalog_len: usize },

	#[error("{service_count} services exceeds the encoder's limit of {limit}")]
	TooLarge { service_count: usize, limit: usize },

	#[error("solver backend could not be launched: {reason}")]
	SolverUnavailable { reason: String },

	#[error("solver backend exceeded its deadline")]
	SolverTimeout,

	#[error("solver backend returned output that does not match the expected grammar: {reason}")]
	SolverMalformedResponse { reason: String },

	#[error("no satisfying placement exists for the given policies and budget")]
	Infeasible,

	#[error("service identifier '{0}' is reserved for the wildcard and must not name a real service")]
	ReservedServiceName(Strng),
}

pub type Result<T> = std::result::Result<T, PlacementError>;
