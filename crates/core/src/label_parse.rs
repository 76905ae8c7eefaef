//! Structured label parsing (§4.12): splits a free-form label string into
//! titled blocks of `CODE = TEXT` / plain-text lines, and the inverse
//! reconstruction. Runs once at import and as a standalone admin operation —
//! never on a request hot path.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{LabelSegment, NodeId};

static CODE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Za-z0-9]+)\s*=\s*(.+)$").unwrap());

/// One parsed line, before it is paired with its other-language counterpart
/// and assigned a `node_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSegment {
	pub title: Option<String>,
	pub code_segment: Option<String>,
	pub text: String,
	pub position_start: Option<i32>,
	pub position_end: Option<i32>,
	pub display_order: i32,
}

/// Parse `label_text` into blocks (separated by a blank line). The first
/// line of a block may be `TITLE: content`, which sets the title carried by
/// every segment in that block (and, if the next block lacks a title line,
/// carries forward into it too). Only the first `CODE = TEXT`-shaped line
/// per block is treated as a code segment; later such lines in the same
/// block are kept as plain text.
pub fn parse_structured_label(label_text: &str, full_code: Option<&str>) -> Vec<ParsedSegment> {
	if label_text.trim().is_empty() {
		return Vec::new();
	}

	let mut results = Vec::new();
	let mut display_order = 0;
	let mut current_title: Option<String> = None;

	for block in label_text.split("\n\n") {
		let lines: Vec<&str> = block.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
		if lines.is_empty() {
			continue;
		}

		let mut found_code_in_block = false;
		let first_line = lines[0];
		let rest_lines: &[&str];

		if let Some((title, content)) = split_title(first_line) {
			current_title = Some(title.to_string());
			rest_lines = &lines[1..];
			if !content.is_empty() {
				let seg = parse_content_line(content, full_code, true);
				found_code_in_block |= seg.code_segment.is_some();
				results.push(finish(seg, current_title.clone(), display_order));
				display_order += 1;
			}
		} else {
			rest_lines = &lines[..];
		}

		for &line in rest_lines {
			let seg = parse_content_line(line, full_code, !found_code_in_block);
			found_code_in_block |= seg.code_segment.is_some();
			results.push(finish(seg, current_title.clone(), display_order));
			display_order += 1;
		}
	}

	results
}

struct RawSegment {
	code_segment: Option<String>,
	text: String,
	position_start: Option<i32>,
	position_end: Option<i32>,
}

fn finish(raw: RawSegment, title: Option<String>, display_order: i32) -> ParsedSegment {
	ParsedSegment {
		title,
		code_segment: raw.code_segment,
		text: raw.text,
		position_start: raw.position_start,
		position_end: raw.position_end,
		display_order,
	}
}

fn split_title(line: &str) -> Option<(&str, &str)> {
	let (title, rest) = line.split_once(':')?;
	Some((title.trim(), rest.trim()))
}

fn parse_content_line(line: &str, full_code: Option<&str>, allow_code_segment: bool) -> RawSegment {
	if allow_code_segment {
		if let Some(caps) = CODE_LINE.captures(line) {
			let code_segment = caps.get(1).unwrap().as_str().to_string();
			let text = caps.get(2).unwrap().as_str().trim().to_string();
			let (position_start, position_end) = full_code
				.and_then(|fc| char_find(fc, &code_segment))
				.map(|start| (start as i32 + 1, (start + code_segment.chars().count()) as i32))
				.unzip();
			return RawSegment { code_segment: Some(code_segment), text, position_start, position_end };
		}
	}
	RawSegment { code_segment: None, text: line.to_string(), position_start: None, position_end: None }
}

fn char_find(haystack: &str, needle: &str) -> Option<usize> {
	let hay: Vec<char> = haystack.chars().collect();
	let ned: Vec<char> = needle.chars().collect();
	if ned.is_empty() || ned.len() > hay.len() {
		return None;
	}
	hay.windows(ned.len()).position(|w| w == ned.as_slice())
}

/// Zip a German-language and an English-language parse of the same label
/// structure into the bilingual [`LabelSegment`] rows the store persists.
/// Assumes both parses produced the same block/line shape, which holds
/// whenever the two label fields were authored in parallel.
pub fn merge_bilingual(de: Vec<ParsedSegment>, en: Vec<ParsedSegment>, node_id: NodeId) -> Vec<LabelSegment> {
	let len = de.len().max(en.len());
	(0..len)
		.map(|i| {
			let d = de.get(i);
			let e = en.get(i);
			LabelSegment {
				id: None,
				node_id,
				title: d.and_then(|s| s.title.clone()).or_else(|| e.and_then(|s| s.title.clone())),
				code_segment: d
					.and_then(|s| s.code_segment.clone())
					.or_else(|| e.and_then(|s| s.code_segment.clone())),
				position_start: d.and_then(|s| s.position_start).or_else(|| e.and_then(|s| s.position_start)),
				position_end: d.and_then(|s| s.position_end).or_else(|| e.and_then(|s| s.position_end)),
				label_de: d.map(|s| s.text.clone()),
				label_en: e.map(|s| s.text.clone()),
				display_order: i as i32,
			}
		})
		.collect()
}

/// Inverse of [`parse_structured_label`]: group consecutive segments sharing
/// a title into a block, join `CODE = TEXT` (or bare `TEXT`) lines with a
/// newline, and blocks with a blank line. `label_of` selects which language
/// field to render.
pub fn reconstruct_label(segments: &[LabelSegment], label_of: impl Fn(&LabelSegment) -> Option<&str>) -> String {
	if segments.is_empty() {
		return String::new();
	}

	let mut blocks: Vec<String> = Vec::new();
	let mut i = 0;
	while i < segments.len() {
		let title = &segments[i].title;
		let mut j = i;
		while j < segments.len() && &segments[j].title == title {
			j += 1;
		}
		let group = &segments[i..j];
		let mut lines = Vec::with_capacity(group.len());
		for (k, seg) in group.iter().enumerate() {
			let text = label_of(seg).unwrap_or_default();
			let line = match &seg.code_segment {
				Some(code) => format!("{code} = {text}"),
				None => text.to_string(),
			};
			if k == 0 {
				if let Some(t) = title {
					lines.push(format!("{t}: {line}"));
					continue;
				}
			}
			lines.push(line);
		}
		blocks.push(lines.join("\n"));
		i = j;
	}
	blocks.join("\n\n")
}

/// Re-derive and persist `node_id`'s label segments from raw `label`/`label_en`
/// text, without running a full JSON re-import. Used by the admin label
/// re-parse endpoint (§4.12, §6).
pub async fn reparse_node_label(
	store: &crate::store::Store,
	node_id: NodeId,
	full_code: Option<&str>,
	label: Option<&str>,
	label_en: Option<&str>,
) -> crate::err::Result<Vec<LabelSegment>> {
	let de = label.map(|t| parse_structured_label(t, full_code)).unwrap_or_default();
	let en = label_en.map(|t| parse_structured_label(t, full_code)).unwrap_or_default();
	let segments = merge_bilingual(de, en, node_id);
	store.replace_label_segments(node_id, &segments).await?;
	Ok(segments)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_titled_block_with_code_segments() {
		let text = "Spannung: P = 10-30V DC\nS = Schließer\n\nHinweis: Nur für Industrieanwendungen";
		let parsed = parse_structured_label(text, Some("PSIC20B"));
		assert_eq!(parsed.len(), 3);
		assert_eq!(parsed[0].title.as_deref(), Some("Spannung"));
		assert_eq!(parsed[0].code_segment.as_deref(), Some("P"));
		assert_eq!(parsed[0].text, "10-30V DC");
		assert_eq!(parsed[1].code_segment.as_deref(), Some("S"));
		assert_eq!(parsed[2].title.as_deref(), Some("Hinweis"));
		assert_eq!(parsed[2].code_segment, None);
	}

	#[test]
	fn computes_one_based_positions() {
		let parsed = parse_structured_label("P = 10-30V", Some("PSIC20B"));
		assert_eq!(parsed[0].position_start, Some(1));
		assert_eq!(parsed[0].position_end, Some(1));
	}

	#[test]
	fn only_first_code_line_per_block_is_extracted() {
		let parsed = parse_structured_label("A = one\nB = two", None);
		assert_eq!(parsed[0].code_segment.as_deref(), Some("A"));
		assert_eq!(parsed[1].code_segment, None);
		assert_eq!(parsed[1].text, "B = two");
	}

	#[test]
	fn title_carries_forward_to_untitled_block() {
		let parsed = parse_structured_label("Spannung: P = 10V\n\nQ = 20V", None);
		assert_eq!(parsed[1].title.as_deref(), Some("Spannung"));
	}

	#[test]
	fn reconstruct_matches_original_shape() {
		let text = "Spannung: P = 10-30V DC\nS = Schließer\n\nHinweis: Nur für Industrieanwendungen";
		let parsed = parse_structured_label(text, None);
		let segments = merge_bilingual(parsed, Vec::new(), 1);
		let rebuilt = reconstruct_label(&segments, |s| s.label_de.as_deref());
		assert_eq!(rebuilt, text);
	}
}
