//! Splits a user-entered type code into upper-cased tokens and reconstructs
//! the canonical form from a token list.
//!
//! Separators are `-`, runs of whitespace, runs of two or more `_`, and a
//! single `_` flanked by word characters on both sides. A bare `_` at a
//! boundary (not flanked on both sides) is kept as part of its token rather
//! than treated as a separator. The wildcard token `*` is never a separator
//! and is preserved verbatim.

fn is_word_char(c: char) -> bool {
	c.is_alphanumeric() || c == '_'
}

/// Tokenise `s` into upper-cased, non-empty parts.
pub fn split(s: &str) -> Vec<String> {
	let chars: Vec<char> = s.chars().collect();
	let n = chars.len();
	let mut tokens = Vec::new();
	let mut current = String::new();
	let mut i = 0;
	while i < n {
		let c = chars[i];
		if c == '-' || c.is_whitespace() {
			while i < n && (chars[i] == '-' || chars[i].is_whitespace()) {
				i += 1;
			}
			if !current.is_empty() {
				tokens.push(std::mem::take(&mut current));
			}
			continue;
		}
		if c == '_' {
			let start = i;
			while i < n && chars[i] == '_' {
				i += 1;
			}
			let run_len = i - start;
			if run_len >= 2 {
				if !current.is_empty() {
					tokens.push(std::mem::take(&mut current));
				}
				continue;
			}
			let prev_is_word = start > 0 && is_word_char(chars[start - 1]);
			let next_is_word = i < n && is_word_char(chars[i]);
			if prev_is_word && next_is_word {
				if !current.is_empty() {
					tokens.push(std::mem::take(&mut current));
				}
				continue;
			}
			current.push('_');
			continue;
		}
		current.push(c);
		i += 1;
	}
	if !current.is_empty() {
		tokens.push(current);
	}
	tokens.into_iter().map(|t| t.to_uppercase()).filter(|t| !t.is_empty()).collect()
}

/// Rebuild the canonical `FAMILY TOK2-TOK3-...` form from tokens.
pub fn reconstruct(parts: &[String]) -> String {
	match parts.len() {
		0 => String::new(),
		1 => parts[0].clone(),
		_ => format!("{} {}", parts[0], parts[1..].join("-")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn splits_on_dash_and_space() {
		assert_eq!(split("bcc m313-gs-op123"), vec!["BCC", "M313", "GS", "OP123"]);
	}

	#[test]
	fn collapses_double_underscore() {
		assert_eq!(split("a__b"), vec!["A", "B"]);
	}

	#[test]
	fn single_underscore_flanked_splits() {
		assert_eq!(split("a1_b2"), vec!["A1", "B2"]);
	}

	#[test]
	fn leading_underscore_is_kept() {
		assert_eq!(split("_abc"), vec!["_ABC"]);
	}

	#[test]
	fn wildcard_preserved() {
		assert_eq!(split("BCC M313 * OP123"), vec!["BCC", "M313", "*", "OP123"]);
	}

	#[test]
	fn reconstruct_single_part() {
		assert_eq!(reconstruct(&["BCC".to_string()]), "BCC");
	}

	#[test]
	fn reconstruct_multi_part() {
		let parts = vec!["BCC".to_string(), "M313".to_string(), "GS".to_string()];
		assert_eq!(reconstruct(&parts), "BCC M313-GS");
	}

	proptest::proptest! {
		#[test]
		fn idempotent(s in "[A-Za-z0-9_ -]{1,40}") {
			let once = reconstruct(&split(&s));
			let twice = reconstruct(&split(&once));
			proptest::prop_assert_eq!(once, twice);
		}
	}
}
