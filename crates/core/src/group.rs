//! Derived group name inference (§4.7): a UI hint showing the probable
//! product attribute from the leaves still reachable under the current
//! selections, before the user finishes choosing.
use crate::err::{Error, Result};
use crate::model::NodeId;
use crate::selection::{family_selection, Selection};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GroupInference {
	pub candidates: Vec<String>,
	pub is_unique: bool,
}

pub async fn infer_group(store: &Store, selections: &[Selection]) -> Result<GroupInference> {
	let family = family_selection(selections)
		.filter(|s| s.is_usable())
		.ok_or_else(|| Error::validation("a family (level 0) selection with ids is required"))?;
	let family_root = *family.ids.iter().next().expect("is_usable checked non-empty");

	let mut leaves = store.reachable_leaves(&[family_root]).await?;
	for sel in selections {
		if sel.level == 0 || !sel.is_usable() {
			continue;
		}
		// A leaf has no descendants of its own, so every other selection is
		// necessarily an ancestor of it: the forward check from §4.4 always
		// applies here, never the backward one.
		let sel_ids: Vec<NodeId> = sel.ids.iter().copied().collect();
		let leaf_ids: Vec<NodeId> = leaves.iter().copied().collect();
		leaves = store.reachable_subset(&sel_ids, &leaf_ids).await?;
		if leaves.is_empty() {
			break;
		}
	}

	let leaf_ids: Vec<NodeId> = leaves.into_iter().collect();
	let nodes = store.get_nodes(&leaf_ids).await?;
	let mut candidates: Vec<String> = Vec::new();
	for n in &nodes {
		if let Some(g) = &n.group_name {
			if !candidates.contains(g) {
				candidates.push(g.clone());
			}
		}
	}
	let is_unique = candidates.len() == 1;
	Ok(GroupInference { candidates, is_unique })
}
