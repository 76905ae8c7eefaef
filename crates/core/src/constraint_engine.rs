//! Per-level constraint evaluation (§4.6): allow/deny rules over a partial
//! selection, with range expansion for `code_value`.
use std::collections::BTreeMap;

use crate::cnf;
use crate::length_spec;
use crate::model::{Constraint, ConstraintCode, ConstraintCondition, ConstraintMode, CodeType, ConditionType};

const CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ValidationResult {
	pub is_valid: bool,
	pub violated_constraints: Vec<i64>,
	pub message: Option<String>,
}

/// Evaluate every constraint at `target_level` against `selection`
/// (level → chosen code) and report whether `candidate_code` is permitted.
pub fn validate_code(
	constraints: &[Constraint],
	selection: &BTreeMap<i32, String>,
	target_level: i32,
	candidate_code: &str,
) -> ValidationResult {
	let mut violated = Vec::new();
	let mut messages = Vec::new();

	for c in constraints.iter().filter(|c| c.level == target_level) {
		if !c.conditions.iter().all(|cond| condition_holds(cond, selection)) {
			continue;
		}
		let codes = expand_codes(&c.codes);
		let in_set = codes.iter().any(|code| code == candidate_code);
		let violates = match c.mode {
			ConstraintMode::Allow => !in_set,
			ConstraintMode::Deny => in_set,
		};
		if violates {
			if let Some(id) = c.id {
				violated.push(id);
			}
			messages.push(match c.mode {
				ConstraintMode::Allow => format!("code {candidate_code} is not among the allowed codes"),
				ConstraintMode::Deny => format!("code {candidate_code} is denied at this level"),
			});
		}
	}

	ValidationResult {
		is_valid: violated.is_empty(),
		message: if messages.is_empty() { None } else { Some(messages.join("; ")) },
		violated_constraints: violated,
	}
}

fn condition_holds(condition: &ConstraintCondition, selection: &BTreeMap<i32, String>) -> bool {
	let Some(value_at_level) = selection.get(&condition.target_level) else {
		return false;
	};
	match condition.condition_type {
		ConditionType::ExactCode => value_at_level == &condition.value,
		ConditionType::Prefix => value_at_level.starts_with(&condition.value),
		ConditionType::Pattern => length_spec::parse(&condition.value)
			.map(|spec| spec.matches(value_at_level.chars().count()))
			.unwrap_or(false),
	}
}

pub fn expand_codes(codes: &[ConstraintCode]) -> Vec<String> {
	codes
		.iter()
		.flat_map(|c| match c.code_type {
			CodeType::Single => vec![c.code_value.clone()],
			CodeType::Range => expand_range(&c.code_value),
		})
		.collect()
}

/// Expand a `"lo-hi"` range per §4.6: a shared alphabetic/numeric prefix
/// with a zero-padded numeric suffix, or a positional range over equal-length
/// codes ordered `0-9A-Z`. Above [`cnf::RANGE_EXPANSION_LIMIT`] emitted
/// codes, falls back to `[lo, hi]` only.
pub fn expand_range(value: &str) -> Vec<String> {
	let Some((lo, hi)) = value.split_once('-') else {
		return vec![value.to_string()];
	};
	if let Some(v) = expand_numeric_suffix(lo, hi) {
		return v;
	}
	if let Some(v) = expand_positional(lo, hi) {
		return v;
	}
	vec![lo.to_string(), hi.to_string()]
}

fn split_numeric_suffix(s: &str) -> (&str, &str) {
	let digit_start = s.rfind(|c: char| !c.is_ascii_digit()).map(|i| i + 1).unwrap_or(0);
	(&s[..digit_start], &s[digit_start..])
}

fn expand_numeric_suffix(lo: &str, hi: &str) -> Option<Vec<String>> {
	let (lo_prefix, lo_digits) = split_numeric_suffix(lo);
	let (hi_prefix, hi_digits) = split_numeric_suffix(hi);
	if lo_prefix != hi_prefix || lo_digits.is_empty() || hi_digits.is_empty() {
		return None;
	}
	let width = lo_digits.len().max(hi_digits.len());
	let lo_n: u64 = lo_digits.parse().ok()?;
	let hi_n: u64 = hi_digits.parse().ok()?;
	if lo_n > hi_n {
		return None;
	}
	if (hi_n - lo_n + 1) as usize > cnf::RANGE_EXPANSION_LIMIT {
		return Some(vec![lo.to_string(), hi.to_string()]);
	}
	Some((lo_n..=hi_n).map(|n| format!("{lo_prefix}{n:0width$}")).collect())
}

fn char_rank(c: char) -> Option<u64> {
	CHARSET.iter().position(|&b| b == c.to_ascii_uppercase() as u8).map(|i| i as u64)
}

fn rank_char(i: u64) -> char {
	CHARSET[i as usize] as char
}

fn expand_positional(lo: &str, hi: &str) -> Option<Vec<String>> {
	if lo.is_empty() || lo.len() != hi.len() {
		return None;
	}
	let base = CHARSET.len() as u64;
	let to_num = |s: &str| -> Option<u64> {
		s.chars().try_fold(0u64, |acc, c| char_rank(c).map(|r| acc * base + r))
	};
	let lo_n = to_num(lo)?;
	let hi_n = to_num(hi)?;
	if lo_n > hi_n {
		return None;
	}
	let count = hi_n - lo_n + 1;
	if count as usize > cnf::RANGE_EXPANSION_LIMIT {
		return Some(vec![lo.to_string(), hi.to_string()]);
	}
	let width = lo.chars().count();
	Some(
		(lo_n..=hi_n)
			.map(|mut n| {
				let mut chars = vec!['0'; width];
				for slot in chars.iter_mut().rev() {
					*slot = rank_char(n % base);
					n /= base;
				}
				chars.into_iter().collect::<String>()
			})
			.collect(),
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{CodeType, ConstraintCode};

	#[test]
	fn numeric_suffix_range_preserves_width() {
		let expanded = expand_range("PS001-PS003");
		assert_eq!(expanded, vec!["PS001", "PS002", "PS003"]);
	}

	#[test]
	fn alphabetic_range() {
		assert_eq!(expand_range("A-C"), vec!["A", "B", "C"]);
	}

	#[test]
	fn single_char_alphanumeric_range_orders_digits_before_letters() {
		assert_eq!(expand_range("8-B"), vec!["8", "9", "A", "B"]);
	}

	#[test]
	fn two_char_range_falls_back_above_limit() {
		// AA-ZZ spans far more than RANGE_EXPANSION_LIMIT codes.
		let expanded = expand_range("AA-ZZ");
		assert_eq!(expanded, vec!["AA".to_string(), "ZZ".to_string()]);
	}

	#[test]
	fn two_char_range_expands_within_limit() {
		assert_eq!(expand_range("A0-A3"), vec!["A0", "A1", "A2", "A3"]);
	}

	#[test]
	fn expand_codes_mixes_single_and_range() {
		let codes = vec![
			ConstraintCode { code_type: CodeType::Single, code_value: "X".into() },
			ConstraintCode { code_type: CodeType::Range, code_value: "A-C".into() },
		];
		assert_eq!(expand_codes(&codes), vec!["X", "A", "B", "C"]);
	}

	proptest::proptest! {
		// Invariant 6: a numeric "PREFIX<lo>-PREFIX<hi>" range expands to a
		// sorted, contiguous, zero-padded run of exactly hi - lo + 1 codes.
		#[test]
		fn numeric_range_expands_sorted_contiguous_zero_padded(
			prefix in "[A-Z]{0,3}",
			lo in 0u32..200,
			span in 0u32..50,
		) {
			let hi = lo + span;
			let width = lo.max(hi).to_string().len();
			let value = format!("{prefix}{lo:0width$}-{prefix}{hi:0width$}");
			let expanded = expand_range(&value);
			proptest::prop_assert_eq!(expanded.len(), (span + 1) as usize);
			let mut sorted = expanded.clone();
			sorted.sort();
			proptest::prop_assert_eq!(&expanded, &sorted);
			for (i, code) in expanded.iter().enumerate() {
				proptest::prop_assert_eq!(code, &format!("{prefix}{:0width$}", lo + i as u32));
			}
		}
	}
}
