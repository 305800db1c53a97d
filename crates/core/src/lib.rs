//! Small cross-cutting utilities shared by every `meshplace` crate.
//!
//! Kept deliberately thin: this crate holds only the identifier type and a
//! couple of generic helpers that have no natural home in a single solver
//! component. Domain types live in `meshplace`.

/// A cheaply-clonable interned string, used for service identifiers,
/// dataplane function names, and anything else that gets copied into many
/// path and constraint collections during encoding.
pub type Strng = arcstr::ArcStr;

/// Build a [`Strng`] from anything that can be viewed as `&str`.
pub fn strng(s: impl AsRef<str>) -> Strng {
	Strng::from(s.as_ref())
}
