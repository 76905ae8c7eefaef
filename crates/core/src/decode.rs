//! The type-code decoder (§4.5): turns a raw, user-typed string into a
//! resolved path through the variant forest.
use crate::cnf;
use crate::err::Result;
use crate::merge;
use crate::model::{Link, Node, NodeId, Picture};
use crate::normalize;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
	ProductFamily,
	LevelCode,
	CompleteProduct,
	PartialCode,
	WildcardSearch,
	Unknown,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CodePathSegment {
	pub code: String,
	pub name: Option<String>,
	pub label: Option<String>,
	pub label_en: Option<String>,
	pub position_start: usize,
	pub position_end: usize,
	pub pictures: Vec<Picture>,
	pub links: Vec<Link>,
	pub group_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DecodeResult {
	pub exists: bool,
	pub normalized_code: String,
	pub is_complete_product: bool,
	pub product_type: ProductType,
	pub path_segments: Vec<CodePathSegment>,
	pub families: Vec<Node>,
	pub group_name: Option<String>,
}

pub async fn decode(store: &Store, raw: &str) -> Result<DecodeResult> {
	let parts = normalize::split(raw);
	if parts.is_empty() {
		return Ok(unknown(raw));
	}
	if parts.iter().any(|p| p == "*") {
		return decode_wildcard(store, &parts).await;
	}
	if parts.len() == 1 {
		return decode_single(store, &parts[0]).await;
	}
	decode_multi(store, &parts).await
}

fn unknown(raw: &str) -> DecodeResult {
	DecodeResult {
		exists: false,
		normalized_code: raw.to_string(),
		is_complete_product: false,
		product_type: ProductType::Unknown,
		path_segments: Vec::new(),
		families: Vec::new(),
		group_name: None,
	}
}

async fn decode_single(store: &Store, code: &str) -> Result<DecodeResult> {
	let family_ids = store.nodes_by_code_level(code, 0, None).await?;
	if !family_ids.is_empty() {
		let nodes = store.get_nodes(&family_ids).await?;
		let segment = segment_from_nodes(&nodes, code, 0);
		return Ok(DecodeResult {
			exists: true,
			normalized_code: code.to_string(),
			is_complete_product: false,
			product_type: ProductType::ProductFamily,
			path_segments: vec![segment],
			families: nodes.clone(),
			group_name: merge::union_first_seen(nodes.iter().filter_map(|n| n.group_name.as_deref())),
		});
	}

	let candidates = store.nodes_by_code(code).await?;
	let Some(lowest_level) = candidates.first().map(|n| n.level) else {
		return Ok(unknown(code));
	};
	let matched: Vec<Node> = candidates.into_iter().take_while(|n| n.level == lowest_level).collect();
	let segment = segment_from_nodes(&matched, code, 0);
	Ok(DecodeResult {
		exists: true,
		normalized_code: code.to_string(),
		is_complete_product: false,
		product_type: ProductType::LevelCode,
		path_segments: vec![segment],
		families: Vec::new(),
		group_name: merge::union_first_seen(matched.iter().filter_map(|n| n.group_name.as_deref())),
	})
}

async fn decode_multi(store: &Store, parts: &[String]) -> Result<DecodeResult> {
	let normalized = normalize::reconstruct(parts);

	if let Some(node) = store.node_by_full_typecode(&normalized).await? {
		let nodes = store.ancestors_of(node.id, true).await?;
		let segments = segments_for_chain(&nodes, parts);
		return Ok(DecodeResult {
			exists: true,
			normalized_code: normalized,
			is_complete_product: true,
			product_type: ProductType::CompleteProduct,
			path_segments: segments,
			families: nodes.first().cloned().into_iter().collect(),
			group_name: node.group_name.clone(),
		});
	}

	let family_ids = store.nodes_by_code_level(&parts[0], 0, None).await?;
	if family_ids.is_empty() {
		return Ok(unknown(&normalized));
	}
	let family_nodes = store.get_nodes(&family_ids).await?;

	let mut segments = vec![segment_from_nodes(&family_nodes, &parts[0], 0)];
	let mut frontier = family_ids;
	let mut exists = true;
	let mut last_group_name = merge::union_first_seen(family_nodes.iter().filter_map(|n| n.group_name.as_deref()));

	for (level, part) in parts.iter().enumerate().skip(1) {
		let mut matched: Vec<Node> = Vec::new();
		for &f in &frontier {
			for id in store.nodes_by_code_level(part, level as i32, Some(f)).await? {
				matched.push(store.get_node(id).await?);
			}
		}
		if matched.is_empty() {
			exists = false;
			break;
		}
		frontier = matched.iter().map(|n| n.id).collect();
		last_group_name = merge::union_first_seen(matched.iter().filter_map(|n| n.group_name.as_deref()));
		segments.push(segment_from_nodes(&matched, part, 0));
	}

	if !exists {
		return Ok(unknown(&normalized));
	}

	let segments = assign_positions(segments, parts);

	Ok(DecodeResult {
		exists: true,
		normalized_code: normalized,
		is_complete_product: false,
		product_type: ProductType::PartialCode,
		path_segments: segments,
		families: family_nodes,
		group_name: last_group_name,
	})
}

/// Wildcard branch: the first token is a literal family; `*` tokens advance
/// the frontier to every descendant at the next level, literal tokens
/// constrain it to descendants carrying that code.
async fn decode_wildcard(store: &Store, parts: &[String]) -> Result<DecodeResult> {
	if parts[0] == "*" {
		return Ok(unknown(&parts.join(" ")));
	}
	let family_ids = store.nodes_by_code_level(&parts[0], 0, None).await?;
	if family_ids.is_empty() {
		return Ok(unknown(&parts.join(" ")));
	}
	let family_nodes = store.get_nodes(&family_ids).await?;

	let mut segments = vec![segment_from_nodes(&family_nodes, &parts[0], 0)];
	let mut frontier = family_ids;

	for (level, part) in parts.iter().enumerate().skip(1) {
		if part == "*" {
			let rows = store.descendants_at_any(&frontier, level as i32).await?;
			let nodes: Vec<Node> = rows.into_iter().map(|(n, _)| n).collect();
			if nodes.is_empty() {
				frontier = Vec::new();
				segments.push(wildcard_summary_segment(&[]));
				break;
			}
			frontier = nodes.iter().map(|n| n.id).collect();
			segments.push(wildcard_summary_segment(&nodes));
		} else {
			let candidates = store.nodes_by_code_level(part, level as i32, None).await?;
			let retained = store.reachable_subset(&frontier, &candidates).await?;
			if retained.is_empty() {
				frontier = Vec::new();
				break;
			}
			let ids: Vec<NodeId> = retained.into_iter().collect();
			let nodes = store.get_nodes(&ids).await?;
			frontier = ids;
			segments.push(segment_from_nodes(&nodes, part, 0));
		}
	}

	let group_name = segments.last().and_then(|s| s.group_name.clone());
	let normalized = parts.join(" ");
	Ok(DecodeResult {
		exists: !frontier.is_empty(),
		normalized_code: normalized,
		is_complete_product: false,
		product_type: ProductType::WildcardSearch,
		path_segments: assign_positions(segments, parts),
		families: family_nodes,
		group_name,
	})
}

/// `start_0based` is the code's 0-based offset into the reconstructed
/// string; positions are reported 1-based inclusive, matching
/// `label_parse`'s convention.
fn segment_from_nodes(nodes: &[Node], code: &str, start_0based: usize) -> CodePathSegment {
	CodePathSegment {
		code: code.to_string(),
		name: merge::union_first_seen(nodes.iter().filter_map(|n| n.name.as_deref())),
		label: merge::union_sorted(nodes.iter().filter_map(|n| n.label.as_deref())),
		label_en: merge::union_sorted(nodes.iter().filter_map(|n| n.label_en.as_deref())),
		position_start: start_0based + 1,
		position_end: start_0based + code.chars().count(),
		pictures: merge::union_pictures(nodes.iter()),
		links: merge::union_links(nodes.iter()),
		group_name: merge::union_first_seen(nodes.iter().filter_map(|n| n.group_name.as_deref())),
	}
}

fn wildcard_summary_segment(nodes: &[Node]) -> CodePathSegment {
	let mut codes: Vec<&str> = Vec::new();
	for n in nodes {
		if let Some(c) = n.code.as_deref() {
			if !codes.contains(&c) {
				codes.push(c);
			}
		}
	}
	let shown: Vec<&str> = codes.iter().take(cnf::WILDCARD_SUMMARY_LIMIT).copied().collect();
	let remaining = codes.len().saturating_sub(shown.len());
	let summary = if remaining > 0 {
		format!("{} +{remaining} more", shown.join(", "))
	} else {
		shown.join(", ")
	};
	CodePathSegment {
		code: summary,
		name: None,
		label: merge::union_sorted(nodes.iter().filter_map(|n| n.label.as_deref())),
		label_en: merge::union_sorted(nodes.iter().filter_map(|n| n.label_en.as_deref())),
		position_start: 0,
		position_end: 0,
		pictures: Vec::new(),
		links: Vec::new(),
		group_name: merge::union_first_seen(nodes.iter().filter_map(|n| n.group_name.as_deref())),
	}
}

/// Recompute `position_start`/`position_end` cumulatively over `parts`; a
/// one-character separator sits between every adjacent pair (space after the
/// family token, dashes thereafter — both count as one character). Positions
/// are 1-based inclusive, matching `label_parse`'s convention.
fn assign_positions(mut segments: Vec<CodePathSegment>, parts: &[String]) -> Vec<CodePathSegment> {
	let mut cursor = 0usize;
	for (i, seg) in segments.iter_mut().enumerate() {
		if i > 0 {
			cursor += 1;
		}
		let len = parts.get(i).map(|p| p.chars().count()).unwrap_or(0);
		seg.position_start = cursor + 1;
		seg.position_end = cursor + len;
		cursor += len;
	}
	segments
}

/// Build path segments for a resolved root-to-leaf node chain (complete
/// product lookup), one segment per coded node in ascending level order.
fn segments_for_chain(nodes: &[Node], parts: &[String]) -> Vec<CodePathSegment> {
	let coded: Vec<Node> = nodes.iter().filter(|n| n.code.is_some()).cloned().collect();
	let segments: Vec<CodePathSegment> = coded
		.iter()
		.map(|n| segment_from_nodes(std::slice::from_ref(n), n.code.as_deref().unwrap_or_default(), 0))
		.collect();
	assign_positions(segments, parts)
}
