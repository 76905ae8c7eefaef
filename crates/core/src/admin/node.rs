//! Node and family lifecycle, bulk filtered updates, and subtree info.
use crate::cnf;
use crate::deepcopy;
use crate::err::{Error, Result};
use crate::model::{Link, Node, NodeId, Picture};
use crate::pattern_filter::{self, NodeFilter};
use crate::store::node::{NewNode, NodePatch};
use crate::store::Store;

/// Create a node under `parent_id`. Rejects a level-0 node here — use
/// [`create_family`] for that, matching the distinct admin endpoints.
pub async fn create_node(store: &Store, parent_id: NodeId, new: NewNode) -> Result<Node> {
	let new = NewNode { parent_id: Some(parent_id), ..new };
	store.insert_node(new).await
}

/// Create a new product family (a level-0 node; `parent_id = None`).
pub async fn create_family(store: &Store, new: NewNode) -> Result<Node> {
	let new = NewNode { parent_id: None, ..new };
	store.insert_node(new).await
}

/// Delete `id` and its subtree. Refuses a level-0 node: families are
/// deleted only through [`delete_family`], per §7's integrity rule
/// ("delete a level-0 node via the generic node-delete endpoint").
pub async fn delete_node(store: &Store, id: NodeId) -> Result<()> {
	let node = store.get_node(id).await?;
	if node.level == 0 {
		return Err(Error::integrity("use delete_family to remove a product family"));
	}
	store.delete_node(id).await
}

pub async fn delete_family(store: &Store, id: NodeId) -> Result<()> {
	let node = store.get_node(id).await?;
	if node.level != 0 {
		return Err(Error::validation(format!("node {id} is not a product family")));
	}
	store.delete_node(id).await
}

pub async fn add_picture(store: &Store, id: NodeId, picture: Picture) -> Result<Node> {
	let node = store.get_node(id).await?;
	let mut pictures = node.pictures.clone();
	pictures.push(picture);
	store.update_node(id, NodePatch { pictures: Some(pictures), ..Default::default() }).await
}

pub async fn delete_picture(store: &Store, id: NodeId, url: &str) -> Result<Node> {
	let node = store.get_node(id).await?;
	let pictures = node.pictures.iter().filter(|p| p.url != url).cloned().collect();
	store.update_node(id, NodePatch { pictures: Some(pictures), ..Default::default() }).await
}

pub async fn add_link(store: &Store, id: NodeId, link: Link) -> Result<Node> {
	let node = store.get_node(id).await?;
	let mut links = node.links.clone();
	links.push(link);
	store.update_node(id, NodePatch { links: Some(links), ..Default::default() }).await
}

pub async fn delete_link(store: &Store, id: NodeId, url: &str) -> Result<Node> {
	let node = store.get_node(id).await?;
	let links = node.links.iter().filter(|l| l.url != url).cloned().collect();
	store.update_node(id, NodePatch { links: Some(links), ..Default::default() }).await
}

pub async fn deep_copy(store: &Store, source_node_id: NodeId, new_parent_id: NodeId) -> Result<Vec<Node>> {
	deepcopy::deep_copy(store, source_node_id, new_parent_id).await
}

/// Counts and level range of `root`'s subtree, for the admin subtree-info
/// panel.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct SubtreeInfo {
	pub descendant_count: usize,
	pub max_depth: i32,
	pub leaf_products: usize,
	pub intermediate_products: usize,
}

pub async fn subtree_info(store: &Store, root: NodeId) -> Result<SubtreeInfo> {
	let descendants = store.descendants_by_depth(root).await?;
	let mut info = SubtreeInfo::default();
	info.descendant_count = descendants.len();
	for (node, depth) in &descendants {
		info.max_depth = info.max_depth.max(*depth);
		if node.full_typecode.is_some() {
			if node.is_intermediate_code {
				info.intermediate_products += 1;
			} else {
				info.leaf_products += 1;
			}
		}
	}
	Ok(info)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkUpdateMode {
	Set,
	Append,
}

/// Fields a bulk update may touch, per §4 ("set or append to name, label,
/// label_en, group_name"). Untouched fields are `None`.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct BulkUpdateFields {
	pub name: Option<String>,
	pub label: Option<String>,
	pub label_en: Option<String>,
	pub group_name: Option<String>,
}

fn apply_field(mode: BulkUpdateMode, current: Option<String>, incoming: &Option<String>) -> Option<String> {
	match (incoming, mode) {
		(None, _) => current,
		(Some(v), BulkUpdateMode::Set) => Some(v.clone()),
		(Some(v), BulkUpdateMode::Append) => Some(current.map(|c| format!("{c}{v}")).unwrap_or_else(|| v.clone())),
	}
}

/// Apply `fields` in `mode` to every descendant of `root` matching `filter`.
/// Bounded by [`cnf::MAX_BULK_UPDATE_ROWS`] — rejected before any write if
/// the matched set is too large, rather than silently truncated.
pub async fn bulk_update(
	store: &Store,
	root: NodeId,
	filter: &NodeFilter,
	mode: BulkUpdateMode,
	fields: &BulkUpdateFields,
) -> Result<Vec<Node>> {
	let descendants = store.descendants_by_depth(root).await?;
	let mut matched = Vec::new();
	for (node, _depth) in descendants {
		if pattern_filter::matches_filter(store, &node, filter).await? {
			matched.push(node);
		}
	}
	if matched.len() > *cnf::MAX_BULK_UPDATE_ROWS {
		return Err(Error::validation(format!(
			"bulk update would touch {} nodes, exceeding the limit of {}",
			matched.len(),
			*cnf::MAX_BULK_UPDATE_ROWS
		)));
	}

	let mut updated = Vec::with_capacity(matched.len());
	for node in matched {
		let patch = NodePatch {
			name: apply_field(mode, node.name.clone(), &fields.name),
			label: apply_field(mode, node.label.clone(), &fields.label),
			label_en: apply_field(mode, node.label_en.clone(), &fields.label_en),
			group_name: apply_field(mode, node.group_name.clone(), &fields.group_name),
			..Default::default()
		};
		updated.push(store.update_node(node.id, patch).await?);
	}
	Ok(updated)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn append_concatenates_onto_current_value() {
		let result = apply_field(BulkUpdateMode::Append, Some("A".into()), &Some("-B".into()));
		assert_eq!(result.as_deref(), Some("A-B"));
	}

	#[test]
	fn set_replaces_regardless_of_current_value() {
		let result = apply_field(BulkUpdateMode::Set, Some("A".into()), &Some("B".into()));
		assert_eq!(result.as_deref(), Some("B"));
	}

	#[test]
	fn untouched_field_is_left_alone() {
		let result = apply_field(BulkUpdateMode::Set, Some("A".into()), &None);
		assert_eq!(result.as_deref(), Some("A"));
	}
}
