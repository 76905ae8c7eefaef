//! Bulk tree import from the hierarchical JSON export format (§4.13,
//! SUPPLEMENT): walk a nested `children` tree, insert every node in
//! ascending-level order inside one transaction, then parse and persist
//! structured labels.
use serde::Deserialize;

use crate::err::{Error, Result};
use crate::label_parse::{merge_bilingual, parse_structured_label};
use crate::model::{Link, NodeId, Picture};
use crate::store::node::{insert_node_tx, NewNode};
use crate::store::Store;

/// One node as it appears in the import JSON. Mirrors the shape nodes are
/// serialised in: a node with `pattern` set and no `code` is a pattern
/// container, transparent to level counting.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportNode {
	pub code: Option<String>,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub label: Option<String>,
	#[serde(default, alias = "label-en")]
	pub label_en: Option<String>,
	#[serde(default)]
	pub position: i32,
	#[serde(default)]
	pub pattern: Option<i32>,
	#[serde(default)]
	pub full_typecode: Option<String>,
	#[serde(default)]
	pub is_intermediate_code: bool,
	#[serde(default, rename = "group")]
	pub group_name: Option<String>,
	#[serde(default)]
	pub pictures: Vec<Picture>,
	#[serde(default)]
	pub links: Vec<Link>,
	#[serde(default)]
	pub children: Vec<ImportNode>,
}

/// Either `[...product families]` or `{"children": [...product families]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ImportDocument {
	List(Vec<ImportNode>),
	Wrapped { children: Vec<ImportNode> },
}

impl ImportDocument {
	fn into_families(self) -> Vec<ImportNode> {
		match self {
			ImportDocument::List(nodes) => nodes,
			ImportDocument::Wrapped { children } => children,
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ImportStats {
	pub nodes_imported: usize,
	pub product_families: usize,
	pub pattern_containers: usize,
	pub code_nodes: usize,
	pub leaf_products: usize,
	pub intermediate_products: usize,
	pub labels_imported: usize,
}

struct PendingLabels {
	node_id: NodeId,
	code: Option<String>,
	label: Option<String>,
	label_en: Option<String>,
}

pub async fn import_tree(store: &Store, json: &str) -> Result<ImportStats> {
	let doc: ImportDocument =
		serde_json::from_str(json).map_err(|e| Error::validation(format!("invalid import JSON: {e}")))?;
	let families = doc.into_families();

	let mut stats = ImportStats::default();
	let mut pending_labels = Vec::new();

	let mut tx = store.pool().begin().await?;
	for family in &families {
		import_node(&mut tx, family, None, &mut stats, &mut pending_labels).await?;
	}
	tx.commit().await?;

	for pending in pending_labels {
		if pending.label.is_none() && pending.label_en.is_none() {
			continue;
		}
		let de = pending.label.as_deref().map(|t| parse_structured_label(t, pending.code.as_deref())).unwrap_or_default();
		let en = pending
			.label_en
			.as_deref()
			.map(|t| parse_structured_label(t, pending.code.as_deref()))
			.unwrap_or_default();
		if de.is_empty() && en.is_empty() {
			continue;
		}
		let segments = merge_bilingual(de, en, pending.node_id);
		stats.labels_imported += segments.len();
		store.replace_label_segments(pending.node_id, &segments).await?;
	}

	Ok(stats)
}

fn import_node<'a>(
	tx: &'a mut sqlx::Transaction<'_, sqlx::Postgres>,
	node: &'a ImportNode,
	parent_id: Option<NodeId>,
	stats: &'a mut ImportStats,
	pending_labels: &'a mut Vec<PendingLabels>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
	Box::pin(async move {
		let is_pattern_container = node.pattern.is_some() && node.code.is_none();

		let new = NewNode {
			code: node.code.clone(),
			name: node.name.clone(),
			label: node.label.clone(),
			label_en: node.label_en.clone(),
			position: node.position,
			pattern: node.pattern,
			group_name: node.group_name.clone(),
			full_typecode: node.full_typecode.clone(),
			is_intermediate_code: node.is_intermediate_code,
			parent_id,
			pictures: node.pictures.clone(),
			links: node.links.clone(),
		};
		let inserted = insert_node_tx(tx, new).await?;
		stats.nodes_imported += 1;

		if parent_id.is_none() {
			stats.product_families += 1;
		} else if is_pattern_container {
			stats.pattern_containers += 1;
		} else if node.code.is_some() {
			stats.code_nodes += 1;
			if node.full_typecode.is_some() {
				if node.is_intermediate_code {
					stats.intermediate_products += 1;
				} else {
					stats.leaf_products += 1;
				}
			}
		}

		if node.label.is_some() || node.label_en.is_some() {
			pending_labels.push(PendingLabels {
				node_id: inserted.id,
				code: node.code.clone(),
				label: node.label.clone(),
				label_en: node.label_en.clone(),
			});
		}

		for child in &node.children {
			import_node(tx, child, Some(inserted.id), stats, pending_labels).await?;
		}

		Ok(())
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_array_document() {
		let json = r#"[{"code": "A", "name": "family"}]"#;
		let doc: ImportDocument = serde_json::from_str(json).unwrap();
		assert_eq!(doc.into_families().len(), 1);
	}

	#[test]
	fn parses_wrapped_document() {
		let json = r#"{"children": [{"code": "A"}, {"code": "B"}]}"#;
		let doc: ImportDocument = serde_json::from_str(json).unwrap();
		assert_eq!(doc.into_families().len(), 2);
	}

	#[test]
	fn detects_pattern_container() {
		let json = r#"{"pattern": 2, "children": []}"#;
		let node: ImportNode = serde_json::from_str(json).unwrap();
		assert!(node.pattern.is_some() && node.code.is_none());
	}

	#[test]
	fn accepts_hyphenated_label_en_alias() {
		let json = r#"{"code": "A", "label-en": "hello"}"#;
		let node: ImportNode = serde_json::from_str(json).unwrap();
		assert_eq!(node.label_en.as_deref(), Some("hello"));
	}
}
