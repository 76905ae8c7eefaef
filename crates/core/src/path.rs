//! Computed views over closure paths (§4.2): level/depth maxima and the
//! reachable-leaf set used by the derived group inference (§4.7).
use std::collections::BTreeSet;

use crate::err::Result;
use crate::model::NodeId;
use crate::store::Store;

impl Store {
	/// Max `level` among coded descendants of `node_id`, optionally
	/// restricted to the given family (by requiring membership in that
	/// family's descendant set).
	pub async fn max_level_below(&self, node_id: NodeId, family: Option<NodeId>) -> Result<Option<i32>> {
		let descendants = self.descendants_by_depth(node_id).await?;
		let coded: Vec<_> = descendants.into_iter().filter(|(n, _)| n.code.is_some()).collect();
		match family {
			None => Ok(coded.into_iter().map(|(n, _)| n.level).max()),
			Some(family) => {
				let ids: Vec<NodeId> = coded.iter().map(|(n, _)| n.id).collect();
				let in_family = self.reachable_subset(&[family], &ids).await?;
				Ok(coded.into_iter().filter(|(n, _)| in_family.contains(&n.id)).map(|(n, _)| n.level).max())
			}
		}
	}

	/// Max depth (including pattern containers) among all descendants.
	pub async fn max_depth_below(&self, node_id: NodeId) -> Result<i32> {
		let descendants = self.descendants_by_depth(node_id).await?;
		Ok(descendants.into_iter().map(|(_, depth)| depth).max().unwrap_or(0))
	}

	/// Descendants of `ancestors` that are not themselves a `parent_id` of
	/// any other node — i.e. the leaves of the reachable subtree.
	pub async fn reachable_leaves(&self, ancestors: &[NodeId]) -> Result<BTreeSet<NodeId>> {
		let mut leaves = BTreeSet::new();
		for &a in ancestors {
			let descendants = self.descendants_by_depth(a).await?;
			let ids: BTreeSet<NodeId> = descendants.iter().map(|(n, _)| n.id).collect();
			let parents: BTreeSet<NodeId> =
				descendants.iter().filter_map(|(n, _)| n.parent_id).collect();
			leaves.extend(ids.difference(&parents).copied());
		}
		Ok(leaves)
	}
}
