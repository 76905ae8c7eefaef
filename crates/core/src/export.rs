//! KMAT reference and label-segment (de)serialisation adapters (§4.14),
//! grounded in `export_kmat_references.py` / `import_kmat_references.py` /
//! `export_subsegments.py`. Thin CRUD plus format conversion; no algorithmic
//! content beyond the `(family_id, path_node_ids)` uniqueness already
//! enforced by [`crate::store::Store::create_kmat_reference`].
use serde::{Deserialize, Serialize};

use crate::err::{Error, Result};
use crate::model::{LabelSegment, NodeId};
use crate::store::Store;

/// A KMAT reference keyed by node codes rather than ids, so it survives a
/// dump/reload into a database with different primary keys (the original
/// prototype's export format).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KmatExportEntry {
	pub family_code: String,
	pub path_codes: Vec<String>,
	pub full_typecode: String,
	pub kmat_reference: String,
}

pub async fn export_kmat_references(store: &Store) -> Result<Vec<KmatExportEntry>> {
	let refs = store.all_kmat_references().await?;
	let mut entries = Vec::with_capacity(refs.len());
	for r in refs {
		let family = store.get_node(r.family_id).await?;
		let family_code = family
			.code
			.ok_or_else(|| Error::integrity(format!("family node {} has no code", r.family_id)))?;
		let mut path_codes = Vec::with_capacity(r.path_node_ids.len());
		for id in &r.path_node_ids {
			let node = store.get_node(*id).await?;
			if let Some(code) = node.code {
				path_codes.push(code);
			}
		}
		entries.push(KmatExportEntry {
			family_code,
			path_codes,
			full_typecode: r.full_typecode,
			kmat_reference: r.kmat_reference,
		});
	}
	Ok(entries)
}

pub fn kmat_references_to_json(entries: &[KmatExportEntry]) -> Result<String> {
	serde_json::to_string_pretty(entries).map_err(|e| Error::internal(format!("kmat export serialisation failed: {e}")))
}

pub fn kmat_references_from_json(json: &str) -> Result<Vec<KmatExportEntry>> {
	serde_json::from_str(json).map_err(|e| Error::validation(format!("invalid kmat reference JSON: {e}")))
}

/// Re-resolve `entries`' family/path codes against the current tree and
/// insert a `KmatReference` row for each. A code that can't be resolved to
/// a node under the matching family is reported as `not_found` rather than
/// silently skipped.
pub async fn import_kmat_references(store: &Store, entries: &[KmatExportEntry]) -> Result<usize> {
	let mut imported = 0;
	for entry in entries {
		let families = store.nodes_by_code(&entry.family_code).await?;
		let family = families
			.into_iter()
			.find(|n| n.level == 0)
			.ok_or_else(|| Error::not_found(format!("family with code {}", entry.family_code)))?;

		let mut path_node_ids: Vec<NodeId> = vec![family.id];
		let mut current = family.id;
		for code in entry.path_codes.iter().skip(1) {
			let children = store.skip_pattern_children(current).await?;
			let next = children
				.into_iter()
				.find(|n| n.code.as_deref() == Some(code.as_str()))
				.ok_or_else(|| Error::not_found(format!("node with code {code} under family {}", entry.family_code)))?;
			path_node_ids.push(next.id);
			current = next.id;
		}

		store
			.create_kmat_reference(crate::model::KmatReference {
				id: None,
				family_id: family.id,
				path_node_ids,
				full_typecode: entry.full_typecode.clone(),
				kmat_reference: entry.kmat_reference.clone(),
			})
			.await?;
		imported += 1;
	}
	Ok(imported)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LabelSegmentCsvRow {
	node_id: NodeId,
	title: Option<String>,
	code_segment: Option<String>,
	position_start: Option<i32>,
	position_end: Option<i32>,
	label_de: Option<String>,
	label_en: Option<String>,
	display_order: i32,
}

impl From<&LabelSegment> for LabelSegmentCsvRow {
	fn from(s: &LabelSegment) -> Self {
		LabelSegmentCsvRow {
			node_id: s.node_id,
			title: s.title.clone(),
			code_segment: s.code_segment.clone(),
			position_start: s.position_start,
			position_end: s.position_end,
			label_de: s.label_de.clone(),
			label_en: s.label_en.clone(),
			display_order: s.display_order,
		}
	}
}

pub async fn export_label_segments_for_family(store: &Store, family_id: NodeId) -> Result<Vec<LabelSegment>> {
	let descendants = store.descendants_by_depth(family_id).await?;
	let mut segments = Vec::new();
	for (node, _depth) in descendants {
		segments.extend(store.label_segments_for(node.id).await?);
	}
	Ok(segments)
}

pub fn label_segments_to_csv(segments: &[LabelSegment]) -> Result<String> {
	let mut writer = csv::Writer::from_writer(Vec::new());
	for segment in segments {
		writer
			.serialize(LabelSegmentCsvRow::from(segment))
			.map_err(|e| Error::internal(format!("label segment CSV export failed: {e}")))?;
	}
	let bytes =
		writer.into_inner().map_err(|e| Error::internal(format!("label segment CSV export failed: {e}")))?;
	String::from_utf8(bytes).map_err(|e| Error::internal(format!("label segment CSV export failed: {e}")))
}

/// Re-import previously exported label segments, replacing each named
/// node's segments wholesale (matching [`Store::replace_label_segments`]'s
/// own replace-not-merge contract).
pub async fn import_label_segments_csv(store: &Store, csv_text: &str) -> Result<usize> {
	let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
	let mut by_node: std::collections::BTreeMap<NodeId, Vec<LabelSegment>> = std::collections::BTreeMap::new();
	for result in reader.deserialize() {
		let row: LabelSegmentCsvRow =
			result.map_err(|e| Error::validation(format!("invalid label segment CSV: {e}")))?;
		by_node.entry(row.node_id).or_default().push(LabelSegment {
			id: None,
			node_id: row.node_id,
			title: row.title,
			code_segment: row.code_segment,
			position_start: row.position_start,
			position_end: row.position_end,
			label_de: row.label_de,
			label_en: row.label_en,
			display_order: row.display_order,
		});
	}
	let count = by_node.len();
	for (node_id, segments) in by_node {
		store.replace_label_segments(node_id, &segments).await?;
	}
	Ok(count)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn kmat_entries_round_trip_through_json() {
		let entries = vec![KmatExportEntry {
			family_code: "A".into(),
			path_codes: vec!["A".into(), "01".into()],
			full_typecode: "A-01".into(),
			kmat_reference: "KMAT-1".into(),
		}];
		let json = kmat_references_to_json(&entries).unwrap();
		let back = kmat_references_from_json(&json).unwrap();
		assert_eq!(entries, back);
	}

	#[test]
	fn label_segments_round_trip_through_csv() {
		let segments = vec![LabelSegment {
			id: None,
			node_id: 42,
			title: Some("Range".into()),
			code_segment: Some("01".into()),
			position_start: Some(0),
			position_end: Some(5),
			label_de: Some("Bereich".into()),
			label_en: Some("Range".into()),
			display_order: 0,
		}];
		let csv_text = label_segments_to_csv(&segments).unwrap();
		assert!(csv_text.contains("Range"));
		assert!(csv_text.contains("42"));
	}
}
