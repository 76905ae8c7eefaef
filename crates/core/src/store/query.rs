//! Thin node-graph query conveniences (§6): composed entirely from the
//! primitives in [`super::node`] and [`crate::path`] — no new algorithmic
//! content, just the lookups the API surface names directly.
use crate::err::Result;
use crate::model::NodeId;

use super::Store;

impl Store {
	/// Walk `family_root` down through `parent_codes` (one coded node per
	/// entry, transparently skipping pattern containers), then find `code`
	/// at `level` among the final parent's children.
	pub async fn find_node_by_path(
		&self,
		family_root: NodeId,
		parent_codes: &[String],
		code: &str,
		level: i32,
	) -> Result<Option<NodeId>> {
		let mut current = family_root;
		for parent_code in parent_codes {
			let children = self.skip_pattern_children(current).await?;
			let Some(next) = children.iter().find(|n| n.code.as_deref() == Some(parent_code.as_str())) else {
				return Ok(None);
			};
			current = next.id;
		}
		let children = self.skip_pattern_children(current).await?;
		Ok(children.into_iter().find(|n| n.level == level && n.code.as_deref() == Some(code)).map(|n| n.id))
	}

	/// Whether `code` exists at `level` somewhere under `family_root`,
	/// optionally narrowed to direct children of `parent_id`.
	pub async fn code_exists_at(
		&self,
		family_root: NodeId,
		level: i32,
		code: &str,
		parent_id: Option<NodeId>,
	) -> Result<bool> {
		match parent_id {
			Some(parent_id) => {
				let children = self.skip_pattern_children(parent_id).await?;
				Ok(children.iter().any(|n| n.level == level && n.code.as_deref() == Some(code)))
			}
			None => {
				let (node, _) = self
					.descendants_at(family_root, level)
					.await?
					.into_iter()
					.find(|(n, _)| n.code.as_deref() == Some(code))
					.map(|pair| (Some(pair.0), ()))
					.unwrap_or((None, ()));
				Ok(node.is_some())
			}
		}
	}

	/// Distinct codes available at `level` under `family_root`, for
	/// suggestion/autocomplete UI. `prefix` narrows the match when given.
	pub async fn suggest_codes_at(
		&self,
		family_root: NodeId,
		level: i32,
		prefix: Option<&str>,
	) -> Result<Vec<String>> {
		let nodes = self.descendants_at(family_root, level).await?;
		let mut codes: Vec<String> = nodes
			.into_iter()
			.filter_map(|(n, _)| n.code)
			.filter(|c| prefix.map(|p| c.starts_with(p)).unwrap_or(true))
			.collect();
		codes.sort();
		codes.dedup();
		Ok(codes)
	}
}
