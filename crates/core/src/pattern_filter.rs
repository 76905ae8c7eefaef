//! Bulk admin node filters (§4.8): pattern length, allowed-character class of
//! a code substring, and predicates on ancestors at specific levels.
use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, Unexpected};
use serde::{Deserialize, Serialize};

use crate::err::Result;
use crate::length_spec::{self, LengthSpec};
use crate::model::Node;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternClass {
	Alphabetic,
	Numeric,
	Alphanumeric,
}

/// `{length, type}`, per spec §9 Open Question 2 accepting only the dict
/// form internally. A bare JSON integer is normalised to `{length: n, type:
/// None}` at the deserialization boundary by the custom impl below.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthType {
	pub length: usize,
	#[serde(rename = "type")]
	pub class: Option<PatternClass>,
}

impl<'de> Deserialize<'de> for LengthType {
	fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Repr {
			Bare(i64),
			Dict {
				length: i64,
				#[serde(rename = "type", default)]
				class: Option<PatternClass>,
			},
		}

		let to_usize = |n: i64, err_ctx: &'static str| -> std::result::Result<usize, D::Error> {
			usize::try_from(n).map_err(|_| {
				de::Error::invalid_value(Unexpected::Signed(n), &err_ctx)
			})
		};

		match Repr::deserialize(deserializer)? {
			Repr::Bare(n) => Ok(LengthType { length: to_usize(n, "a non-negative length")?, class: None }),
			Repr::Dict { length, class } => {
				Ok(LengthType { length: to_usize(length, "a non-negative length")?, class })
			}
		}
	}
}

impl fmt::Display for LengthType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{{length: {}, type: {:?}}}", self.length, self.class)
	}
}

/// An ancestor-at-level predicate: either a length/class check or a set of
/// exact codes / `PREFIX*` wildcards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NodeFilter {
	pub pattern: Option<LengthSpec>,
	pub allowed_pattern: Option<AllowedPattern>,
	#[serde(default)]
	pub parent_level_patterns: Vec<(i32, LengthType)>,
	#[serde(default)]
	pub parent_level_options: Vec<(i32, Vec<String>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedPattern {
	pub from: usize,
	pub to: usize,
	pub class: PatternClass,
}

/// Special characters are excluded from the classification: a letter counts
/// toward `alphabetic`, a digit toward `numeric`, either toward `alphanumeric`.
pub fn matches_class(s: &str, class: PatternClass) -> bool {
	let has_alpha = s.chars().any(|c| c.is_ascii_alphabetic());
	let has_digit = s.chars().any(|c| c.is_ascii_digit());
	match class {
		PatternClass::Alphabetic => has_alpha && !has_digit,
		PatternClass::Numeric => has_digit && !has_alpha,
		PatternClass::Alphanumeric => has_alpha || has_digit,
	}
}

fn allowed_pattern_matches(code: &str, pattern: &AllowedPattern) -> bool {
	let chars: Vec<char> = code.chars().collect();
	let end = pattern.to.min(chars.len());
	if pattern.from >= end {
		return false;
	}
	let slice: String = chars[pattern.from..end].iter().collect();
	matches_class(&slice, pattern.class)
}

fn option_matches(code: &str, option: &str) -> bool {
	match option.strip_suffix('*') {
		Some(prefix) => code.starts_with(prefix),
		None => code == option,
	}
}

/// Whether `node` satisfies every predicate in `filter`. Ancestor predicates
/// fetch the single root-to-node chain (§4.1's forest has one parent per
/// node) and check the ancestor at each named level.
pub async fn matches_filter(store: &Store, node: &Node, filter: &NodeFilter) -> Result<bool> {
	if let Some(pattern) = &filter.pattern {
		let len = node.code.as_deref().map(|c| c.chars().count()).unwrap_or(0);
		if !pattern.matches(len) {
			return Ok(false);
		}
	}
	if let Some(allowed) = &filter.allowed_pattern {
		let code = node.code.as_deref().unwrap_or("");
		if !allowed_pattern_matches(code, allowed) {
			return Ok(false);
		}
	}
	if filter.parent_level_patterns.is_empty() && filter.parent_level_options.is_empty() {
		return Ok(true);
	}

	let ancestors = store.ancestors_of(node.id, true).await?;
	let by_level: BTreeMap<i32, &Node> = ancestors.iter().map(|n| (n.level, n)).collect();

	for (level, lt) in &filter.parent_level_patterns {
		let Some(ancestor) = by_level.get(level) else {
			return Ok(false);
		};
		let code = ancestor.code.as_deref().unwrap_or("");
		if !LengthSpec::Exact(lt.length).matches(code.chars().count()) {
			return Ok(false);
		}
		if let Some(class) = lt.class {
			if !matches_class(code, class) {
				return Ok(false);
			}
		}
	}

	for (level, options) in &filter.parent_level_options {
		let Some(ancestor) = by_level.get(level) else {
			return Ok(false);
		};
		let code = ancestor.code.as_deref().unwrap_or("");
		if !options.iter().any(|opt| option_matches(code, opt)) {
			return Ok(false);
		}
	}

	Ok(true)
}

/// `pattern` (code length filter): exact integer or `"min-max"` range,
/// reusing the shared grammar from [`length_spec`].
pub fn parse_pattern(spec: &str) -> Option<LengthSpec> {
	length_spec::parse(spec)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classifies_ignoring_special_chars() {
		assert!(matches_class("AB-12", PatternClass::Alphanumeric));
		assert!(matches_class("AB-CD", PatternClass::Alphabetic));
		assert!(matches_class("12-34", PatternClass::Numeric));
		assert!(!matches_class("AB-12", PatternClass::Alphabetic));
	}

	#[test]
	fn allowed_pattern_checks_substring_slice() {
		let p = AllowedPattern { from: 2, to: 5, class: PatternClass::Numeric };
		assert!(allowed_pattern_matches("AB123C", &p));
		assert!(!allowed_pattern_matches("ABXYZC", &p));
	}

	#[test]
	fn option_matches_exact_and_wildcard() {
		assert!(option_matches("PS010", "PS010"));
		assert!(option_matches("PS010", "PS*"));
		assert!(!option_matches("GS010", "PS*"));
	}

	#[test]
	fn length_type_accepts_bare_integer_or_dict() {
		let bare: LengthType = serde_json::from_str("3").unwrap();
		assert_eq!(bare, LengthType { length: 3, class: None });
		let dict: LengthType = serde_json::from_str(r#"{"length":3,"type":"numeric"}"#).unwrap();
		assert_eq!(dict, LengthType { length: 3, class: Some(PatternClass::Numeric) });
	}
}
