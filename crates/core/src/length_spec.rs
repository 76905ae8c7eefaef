//! The "exact integer or `min-max` range" grammar shared by the constraint
//! engine's `pattern` condition (§4.6) and the admin pattern-length filter
//! (§4.8).
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LengthSpec {
	Exact(usize),
	Range(usize, usize),
}

impl std::fmt::Display for LengthSpec {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match *self {
			LengthSpec::Exact(n) => write!(f, "{n}"),
			LengthSpec::Range(lo, hi) => write!(f, "{lo}-{hi}"),
		}
	}
}

impl TryFrom<String> for LengthSpec {
	type Error = String;

	fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
		parse(&s).ok_or_else(|| format!("invalid length spec: {s}"))
	}
}

impl From<LengthSpec> for String {
	fn from(spec: LengthSpec) -> Self {
		spec.to_string()
	}
}

impl LengthSpec {
	pub fn matches(&self, len: usize) -> bool {
		match *self {
			LengthSpec::Exact(n) => len == n,
			LengthSpec::Range(lo, hi) => len >= lo && len <= hi,
		}
	}
}

pub fn parse(spec: &str) -> Option<LengthSpec> {
	match spec.split_once('-') {
		Some((lo, hi)) => {
			let lo: usize = lo.trim().parse().ok()?;
			let hi: usize = hi.trim().parse().ok()?;
			Some(LengthSpec::Range(lo, hi))
		}
		None => spec.trim().parse().ok().map(LengthSpec::Exact),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_exact() {
		assert_eq!(parse("5"), Some(LengthSpec::Exact(5)));
	}

	#[test]
	fn parses_range() {
		assert_eq!(parse("3-6"), Some(LengthSpec::Range(3, 6)));
	}

	#[test]
	fn range_matches_inclusive() {
		let spec = LengthSpec::Range(3, 6);
		assert!(spec.matches(3));
		assert!(spec.matches(6));
		assert!(!spec.matches(7));
	}
}
