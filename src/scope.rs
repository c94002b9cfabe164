//! Scope values and their normalization.
//!
//! A scope is a string label identifying a UI region. Callers may pass a
//! single name or a list of names; both are normalized to a slice view at the
//! API boundary so everything downstream operates on lists. The sentinel
//! scope `"global"` means "blocks every scope".

use derive_more::From;
use serde::Serialize;

/// The sentinel scope that blocks every other scope.
pub const GLOBAL_SCOPE: &str = "global";

/// One scope name or an ordered list of scope names.
///
/// Any string is a valid scope name, including the empty string.
#[derive(Clone, Debug, Eq, From, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scope {
	Single(String),
	Many(Vec<String>),
}

impl Scope {
	/// The `"global"` scope.
	pub fn global() -> Self {
		Self::Single(GLOBAL_SCOPE.to_owned())
	}

	/// View as a list of scope names regardless of variant.
	pub fn normalize(&self) -> &[String] {
		match self {
			Self::Single(name) => std::slice::from_ref(name),
			Self::Many(names) => names.as_slice(),
		}
	}

	/// Whether `"global"` is among the normalized names.
	pub fn is_global(&self) -> bool {
		self.contains(GLOBAL_SCOPE)
	}

	/// Whether `name` is among the normalized names.
	pub fn contains(&self, name: &str) -> bool {
		self.normalize().iter().any(|s| s == name)
	}

	/// Whether the two normalized name lists share at least one name.
	pub fn intersects(&self, other: &Scope) -> bool {
		self.normalize().iter().any(|s| other.contains(s))
	}
}

impl Default for Scope {
	fn default() -> Self {
		Self::global()
	}
}

impl From<&str> for Scope {
	fn from(name: &str) -> Self {
		Self::Single(name.to_owned())
	}
}

impl From<&[&str]> for Scope {
	fn from(names: &[&str]) -> Self {
		Self::Many(names.iter().map(|s| (*s).to_owned()).collect())
	}
}

impl<const N: usize> From<[&str; N]> for Scope {
	fn from(names: [&str; N]) -> Self {
		Self::Many(names.iter().map(|s| (*s).to_owned()).collect())
	}
}
