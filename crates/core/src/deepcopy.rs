//! Deep-copy of a subtree (§4.9): reinsert every descendant of `source` under
//! a freshly created `new_parent`, preserving the shape but minting fresh
//! ids and closure rows.
//!
//! Each new node is inserted via [`crate::store::node::insert_node_tx`],
//! which derives its closure rows from its parent's existing ancestors — so
//! once a copied node's parent is in place (new_parent, or an
//! already-copied ancestor), invariant I2 falls out of that single
//! primitive rather than needing separate closure arithmetic here.
use std::collections::HashMap;

use crate::cnf;
use crate::err::{Error, Result};
use crate::model::{Node, NodeId};
use crate::store::node::{insert_node_tx, NewNode};
use crate::store::Store;

pub async fn deep_copy(store: &Store, source_node_id: NodeId, new_parent_id: NodeId) -> Result<Vec<Node>> {
	let descendants = store.descendants_by_depth(source_node_id).await?;
	let max_depth = descendants.iter().map(|(_, d)| *d).max().unwrap_or(0);
	if max_depth as u32 > *cnf::MAX_DEEPCOPY_DEPTH {
		return Err(Error::validation(format!(
			"subtree depth {max_depth} exceeds the maximum deep-copy depth {}",
			*cnf::MAX_DEEPCOPY_DEPTH
		)));
	}

	let mut tx = store.pool().begin().await?;
	let mut old_to_new: HashMap<NodeId, NodeId> = HashMap::new();
	let mut copied = Vec::with_capacity(descendants.len());

	for (old_node, _depth) in descendants {
		let old_parent_id = old_node
			.parent_id
			.ok_or_else(|| Error::internal(format!("descendant {} of a subtree has no parent", old_node.id)))?;
		let new_parent = if old_parent_id == source_node_id {
			new_parent_id
		} else {
			*old_to_new
				.get(&old_parent_id)
				.ok_or_else(|| Error::internal("deep-copy visited a node before its parent"))?
		};

		let new_node = insert_node_tx(
			&mut tx,
			NewNode {
				code: old_node.code.clone(),
				name: old_node.name.clone(),
				label: old_node.label.clone(),
				label_en: old_node.label_en.clone(),
				position: old_node.position,
				pattern: old_node.pattern,
				group_name: old_node.group_name.clone(),
				full_typecode: old_node.full_typecode.clone(),
				is_intermediate_code: old_node.is_intermediate_code,
				parent_id: Some(new_parent),
				pictures: old_node.pictures.clone(),
				links: old_node.links.clone(),
			},
		)
		.await?;

		old_to_new.insert(old_node.id, new_node.id);
		copied.push(new_node);
	}

	tx.commit().await?;
	info!(source_node_id, new_parent_id, copied = copied.len(), "deep-copied subtree");
	Ok(copied)
}
