//! Node + closure-table operations. See the specification's Store contract
//! table (`descendantsAt`, `ancestorsOf`, `batchPathExists`,
//! `nodesByCodeLevel`, `skipPatternChildren`) and the closure-table
//! discipline for `insertNode` / `deleteNode`.
use std::collections::BTreeSet;

use serde_json::Value as Json;
use sqlx::{FromRow, Postgres, Transaction};

use crate::err::{Error, Result};
use crate::model::{Link, Node, NodeId, Picture};

use super::Store;

#[derive(Debug, FromRow)]
struct NodeRow {
	id: NodeId,
	code: Option<String>,
	name: Option<String>,
	label: Option<String>,
	label_en: Option<String>,
	level: i32,
	position: i32,
	pattern: Option<i32>,
	group_name: Option<String>,
	full_typecode: Option<String>,
	is_intermediate_code: bool,
	pictures: Json,
	links: Json,
	parent_id: Option<NodeId>,
}

impl NodeRow {
	fn into_node(self) -> Node {
		Node {
			id: self.id,
			code: self.code,
			name: self.name,
			label: self.label,
			label_en: self.label_en,
			level: self.level,
			position: self.position,
			pattern: self.pattern,
			group_name: self.group_name,
			full_typecode: self.full_typecode,
			is_intermediate_code: self.is_intermediate_code,
			pictures: serde_json::from_value::<Vec<Picture>>(self.pictures).unwrap_or_default(),
			links: serde_json::from_value::<Vec<Link>>(self.links).unwrap_or_default(),
			parent_id: self.parent_id,
		}
	}
}

const NODE_COLUMNS: &str = "id, code, name, label, label_en, level, position, pattern, \
	group_name, full_typecode, is_intermediate_code, pictures, links, parent_id";

/// Like [`NodeRow`] but carrying a closure-table depth alongside, for the
/// joined `descendants_by_depth` query.
#[derive(Debug, FromRow)]
struct NodeDepthRow {
	id: NodeId,
	code: Option<String>,
	name: Option<String>,
	label: Option<String>,
	label_en: Option<String>,
	level: i32,
	position: i32,
	pattern: Option<i32>,
	group_name: Option<String>,
	full_typecode: Option<String>,
	is_intermediate_code: bool,
	pictures: Json,
	links: Json,
	parent_id: Option<NodeId>,
	depth: i32,
}

impl NodeDepthRow {
	fn into_pair(self) -> (Node, i32) {
		let depth = self.depth;
		let node = NodeRow {
			id: self.id,
			code: self.code,
			name: self.name,
			label: self.label,
			label_en: self.label_en,
			level: self.level,
			position: self.position,
			pattern: self.pattern,
			group_name: self.group_name,
			full_typecode: self.full_typecode,
			is_intermediate_code: self.is_intermediate_code,
			pictures: self.pictures,
			links: self.links,
			parent_id: self.parent_id,
		}
		.into_node();
		(node, depth)
	}
}

/// Like [`NodeRow`] but carrying the parent's `pattern` value alongside, for
/// `descendants_at`'s UI-grouping ordering.
#[derive(Debug, FromRow)]
struct NodeParentPatternRow {
	id: NodeId,
	code: Option<String>,
	name: Option<String>,
	label: Option<String>,
	label_en: Option<String>,
	level: i32,
	position: i32,
	pattern: Option<i32>,
	group_name: Option<String>,
	full_typecode: Option<String>,
	is_intermediate_code: bool,
	pictures: Json,
	links: Json,
	parent_id: Option<NodeId>,
	parent_pattern: Option<i32>,
}

impl NodeParentPatternRow {
	fn into_pair(self) -> (Node, Option<i32>) {
		let parent_pattern = self.parent_pattern;
		let node = NodeRow {
			id: self.id,
			code: self.code,
			name: self.name,
			label: self.label,
			label_en: self.label_en,
			level: self.level,
			position: self.position,
			pattern: self.pattern,
			group_name: self.group_name,
			full_typecode: self.full_typecode,
			is_intermediate_code: self.is_intermediate_code,
			pictures: self.pictures,
			links: self.links,
			parent_id: self.parent_id,
		}
		.into_node();
		(node, parent_pattern)
	}
}

/// Fields accepted when creating a node. Exactly one of `code` / `pattern`
/// must be `Some`, enforced by `Store::insert_node`.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct NewNode {
	pub code: Option<String>,
	pub name: Option<String>,
	pub label: Option<String>,
	pub label_en: Option<String>,
	pub position: i32,
	pub pattern: Option<i32>,
	pub group_name: Option<String>,
	pub full_typecode: Option<String>,
	pub is_intermediate_code: bool,
	pub parent_id: Option<NodeId>,
	pub pictures: Vec<Picture>,
	pub links: Vec<Link>,
}

/// Patchable node fields. `code` and `level` are deliberately absent: they
/// can never be renamed in place (§4.1) — callers must delete and recreate.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct NodePatch {
	pub name: Option<String>,
	pub label: Option<String>,
	pub label_en: Option<String>,
	pub group_name: Option<String>,
	pub position: Option<i32>,
	pub is_intermediate_code: Option<bool>,
	pub pictures: Option<Vec<Picture>>,
	pub links: Option<Vec<Link>>,
}

impl Store {
	pub async fn get_node(&self, id: NodeId) -> Result<Node> {
		let row: Option<NodeRow> =
			sqlx::query_as(&format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = $1"))
				.bind(id)
				.fetch_optional(&self.pool)
				.await?;
		row.map(NodeRow::into_node).ok_or_else(|| Error::not_found(format!("node {id}")))
	}

	pub async fn get_nodes(&self, ids: &[NodeId]) -> Result<Vec<Node>> {
		let rows: Vec<NodeRow> =
			sqlx::query_as(&format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ANY($1)"))
				.bind(ids)
				.fetch_all(&self.pool)
				.await?;
		Ok(rows.into_iter().map(NodeRow::into_node).collect())
	}

	/// Product families: every level-0 node.
	pub async fn families(&self) -> Result<Vec<Node>> {
		let rows: Vec<NodeRow> = sqlx::query_as(&format!(
			"SELECT {NODE_COLUMNS} FROM nodes WHERE level = 0 AND code IS NOT NULL ORDER BY position, code"
		))
		.fetch_all(&self.pool)
		.await?;
		Ok(rows.into_iter().map(NodeRow::into_node).collect())
	}

	/// All nodes with the given `level` reachable from `ancestor_id`, ordered
	/// by `(parent.pattern, position, code)`. Each result also carries its
	/// parent's `pattern` value, needed for UI grouping downstream.
	pub async fn descendants_at(&self, ancestor_id: NodeId, level: i32) -> Result<Vec<(Node, Option<i32>)>> {
		let cols = node_cols("n");
		let rows: Vec<NodeParentPatternRow> = sqlx::query_as(&format!(
			"SELECT {cols}, parent.pattern AS parent_pattern FROM nodes n
			 JOIN node_paths p ON p.descendant_id = n.id
			 LEFT JOIN nodes parent ON parent.id = n.parent_id
			 WHERE p.ancestor_id = $1 AND n.level = $2 AND n.code IS NOT NULL
			 ORDER BY parent.pattern ASC NULLS FIRST, n.position ASC, n.code ASC"
		))
		.bind(ancestor_id)
		.bind(level)
		.fetch_all(&self.pool)
		.await?;
		Ok(rows.into_iter().map(NodeParentPatternRow::into_pair).collect())
	}

	/// Like [`Store::descendants_at`] but from a set of ancestors at once —
	/// used by the decoder's wildcard branch to advance a multi-id frontier.
	pub async fn descendants_at_any(&self, ancestor_ids: &[NodeId], level: i32) -> Result<Vec<(Node, Option<i32>)>> {
		if ancestor_ids.is_empty() {
			return Ok(Vec::new());
		}
		let cols = node_cols("n");
		let rows: Vec<NodeParentPatternRow> = sqlx::query_as(&format!(
			"SELECT DISTINCT {cols}, parent.pattern AS parent_pattern FROM nodes n
			 JOIN node_paths p ON p.descendant_id = n.id
			 LEFT JOIN nodes parent ON parent.id = n.parent_id
			 WHERE p.ancestor_id = ANY($1) AND n.level = $2 AND n.code IS NOT NULL
			 ORDER BY parent.pattern ASC NULLS FIRST, n.position ASC, n.code ASC"
		))
		.bind(ancestor_ids)
		.bind(level)
		.fetch_all(&self.pool)
		.await?;
		Ok(rows.into_iter().map(NodeParentPatternRow::into_pair).collect())
	}

	/// Root-to-`id` path segments in root-first order (`depth` is the
	/// ancestor-descendant distance, so `id` itself sits at `depth = 0` and
	/// the root at the largest depth — descending depth is root-first).
	/// When `skip_patterns` is set, pattern containers are removed from the
	/// result (the caller still gets a correctly ordered coded-node chain).
	pub async fn ancestors_of(&self, id: NodeId, skip_patterns: bool) -> Result<Vec<Node>> {
		let cols = node_cols("n");
		let rows: Vec<NodeRow> = sqlx::query_as(&format!(
			"SELECT {cols} FROM nodes n
			 JOIN node_paths p ON p.ancestor_id = n.id
			 WHERE p.descendant_id = $1
			 ORDER BY p.depth DESC"
		))
		.bind(id)
		.fetch_all(&self.pool)
		.await?;
		let nodes = rows.into_iter().map(NodeRow::into_node);
		Ok(if skip_patterns {
			nodes.filter(|n| !n.is_pattern_container()).collect()
		} else {
			nodes.collect()
		})
	}

	/// Exact match on `full_typecode`, used by the decoder's length-≥2
	/// complete-product check.
	pub async fn node_by_full_typecode(&self, full_typecode: &str) -> Result<Option<Node>> {
		let row: Option<NodeRow> =
			sqlx::query_as(&format!("SELECT {NODE_COLUMNS} FROM nodes WHERE full_typecode = $1"))
				.bind(full_typecode)
				.fetch_optional(&self.pool)
				.await?;
		Ok(row.map(NodeRow::into_node))
	}

	/// True iff there exists `(a in a_set, b in b_set, *)` in the closure
	/// table. This is the hot path (§4.4) — always a single query, never a
	/// per-id loop.
	pub async fn batch_path_exists(&self, a_set: &[NodeId], b_set: &[NodeId]) -> Result<bool> {
		if a_set.is_empty() || b_set.is_empty() {
			return Ok(false);
		}
		let exists: (bool,) = sqlx::query_as(
			"SELECT EXISTS(SELECT 1 FROM node_paths WHERE ancestor_id = ANY($1) AND descendant_id = ANY($2))",
		)
		.bind(a_set)
		.bind(b_set)
		.fetch_one(&self.pool)
		.await?;
		Ok(exists.0)
	}

	/// Same as [`Store::batch_path_exists`] but returns the subset of `b_set`
	/// reachable from `a_set`, used by the compatibility engine's pruning
	/// step so it stays a single query per selection per direction.
	pub async fn reachable_subset(&self, a_set: &[NodeId], b_set: &[NodeId]) -> Result<BTreeSet<NodeId>> {
		if a_set.is_empty() || b_set.is_empty() {
			return Ok(BTreeSet::new());
		}
		let rows: Vec<(NodeId,)> = sqlx::query_as(
			"SELECT DISTINCT descendant_id FROM node_paths WHERE ancestor_id = ANY($1) AND descendant_id = ANY($2)",
		)
		.bind(a_set)
		.bind(b_set)
		.fetch_all(&self.pool)
		.await?;
		Ok(rows.into_iter().map(|(id,)| id).collect())
	}

	/// Subset of `a_candidates` that are ancestors of some id in `b_set` —
	/// the mirror of [`Store::reachable_subset`], used by the compatibility
	/// engine's backward pruning check.
	pub async fn ancestor_subset(&self, a_candidates: &[NodeId], b_set: &[NodeId]) -> Result<BTreeSet<NodeId>> {
		if a_candidates.is_empty() || b_set.is_empty() {
			return Ok(BTreeSet::new());
		}
		let rows: Vec<(NodeId,)> = sqlx::query_as(
			"SELECT DISTINCT ancestor_id FROM node_paths WHERE ancestor_id = ANY($1) AND descendant_id = ANY($2)",
		)
		.bind(a_candidates)
		.bind(b_set)
		.fetch_all(&self.pool)
		.await?;
		Ok(rows.into_iter().map(|(id,)| id).collect())
	}

	/// All node ids sharing `code` at `level`, optionally restricted to
	/// descendants of `family`.
	pub async fn nodes_by_code_level(
		&self,
		code: &str,
		level: i32,
		family: Option<NodeId>,
	) -> Result<Vec<NodeId>> {
		let rows: Vec<(NodeId,)> = match family {
			Some(family) => {
				sqlx::query_as(
					"SELECT n.id FROM nodes n
					 JOIN node_paths p ON p.descendant_id = n.id AND p.ancestor_id = $3
					 WHERE n.code = $1 AND n.level = $2",
				)
				.bind(code)
				.bind(level)
				.bind(family)
				.fetch_all(&self.pool)
				.await?
			}
			None => {
				sqlx::query_as("SELECT id FROM nodes WHERE code = $1 AND level = $2")
					.bind(code)
					.bind(level)
					.fetch_all(&self.pool)
					.await?
			}
		};
		Ok(rows.into_iter().map(|(id,)| id).collect())
	}

	/// Every node sharing `code` across any level/family (used by the
	/// decoder's length-1 lookup, which picks ascending by level then id).
	pub async fn nodes_by_code(&self, code: &str) -> Result<Vec<Node>> {
		let rows: Vec<NodeRow> = sqlx::query_as(&format!(
			"SELECT {NODE_COLUMNS} FROM nodes WHERE code = $1 ORDER BY level ASC, id ASC"
		))
		.bind(code)
		.fetch_all(&self.pool)
		.await?;
		Ok(rows.into_iter().map(NodeRow::into_node).collect())
	}

	/// Direct children of `parent`, transparently recursing through any
	/// chain of pattern containers.
	pub async fn skip_pattern_children(&self, parent: NodeId) -> Result<Vec<Node>> {
		let mut frontier = vec![parent];
		let mut result = Vec::new();
		while !frontier.is_empty() {
			let rows: Vec<NodeRow> = sqlx::query_as(&format!(
				"SELECT {NODE_COLUMNS} FROM nodes WHERE parent_id = ANY($1) ORDER BY position, code"
			))
			.bind(&frontier)
			.fetch_all(&self.pool)
			.await?;
			let mut next_frontier = Vec::new();
			for row in rows {
				let node = row.into_node();
				if node.is_pattern_container() {
					next_frontier.push(node.id);
				} else {
					result.push(node);
				}
			}
			frontier = next_frontier;
		}
		Ok(result)
	}

	/// Direct children of `parent`, without skipping pattern containers.
	/// Used by admin tooling that needs to see the raw tree shape.
	pub async fn children_of(&self, parent: NodeId) -> Result<Vec<Node>> {
		let rows: Vec<NodeRow> = sqlx::query_as(&format!(
			"SELECT {NODE_COLUMNS} FROM nodes WHERE parent_id = $1 ORDER BY position, code"
		))
		.bind(parent)
		.fetch_all(&self.pool)
		.await?;
		Ok(rows.into_iter().map(NodeRow::into_node).collect())
	}

	/// All descendants (any level) of `ancestor`, ordered by ascending depth
	/// — used by deep-copy (§4.9) and bulk filters (§4.8).
	pub async fn descendants_by_depth(&self, ancestor: NodeId) -> Result<Vec<(Node, i32)>> {
		let cols = node_cols("n");
		let rows: Vec<NodeDepthRow> = sqlx::query_as(&format!(
			"SELECT {cols}, p.depth AS depth FROM nodes n
			 JOIN node_paths p ON p.descendant_id = n.id
			 WHERE p.ancestor_id = $1 AND p.depth > 0
			 ORDER BY p.depth ASC"
		))
		.bind(ancestor)
		.fetch_all(&self.pool)
		.await?;
		Ok(rows.into_iter().map(NodeDepthRow::into_pair).collect())
	}

	pub async fn insert_node(&self, new: NewNode) -> Result<Node> {
		if new.code.is_none() == new.pattern.is_none() {
			return Err(Error::validation(
				"exactly one of code/pattern must be set on a node",
			));
		}
		let mut tx = self.pool.begin().await?;
		let node = insert_node_tx(&mut tx, new).await?;
		tx.commit().await?;
		trace!(node_id = node.id, level = node.level, "inserted node");
		Ok(node)
	}

	/// Cascade-delete `id` and its whole descendant set, removing every
	/// path row that references any deleted node as ancestor or descendant.
	pub async fn delete_node(&self, id: NodeId) -> Result<()> {
		let mut tx = self.pool.begin().await?;
		delete_node_tx(&mut tx, id).await?;
		tx.commit().await?;
		debug!(node_id = id, "deleted node and its descendant subtree");
		Ok(())
	}

	/// Update the patchable fields of a node in place. Never touches
	/// `code` or `level` — there is no way to request that through
	/// `NodePatch`, so this can never violate the rename prohibition.
	pub async fn update_node(&self, id: NodeId, patch: NodePatch) -> Result<Node> {
		let current = self.get_node(id).await?;
		let name = patch.name.or(current.name);
		let label = patch.label.or(current.label);
		let label_en = patch.label_en.or(current.label_en);
		let group_name = patch.group_name.or(current.group_name);
		let position = patch.position.unwrap_or(current.position);
		let is_intermediate_code = patch.is_intermediate_code.unwrap_or(current.is_intermediate_code);
		let pictures = serde_json::to_value(patch.pictures.unwrap_or(current.pictures)).unwrap();
		let links = serde_json::to_value(patch.links.unwrap_or(current.links)).unwrap();
		let row: NodeRow = sqlx::query_as(&format!(
			"UPDATE nodes SET name = $1, label = $2, label_en = $3, group_name = $4, position = $5,
			 is_intermediate_code = $6, pictures = $7, links = $8
			 WHERE id = $9 RETURNING {NODE_COLUMNS}"
		))
		.bind(name)
		.bind(label)
		.bind(label_en)
		.bind(group_name)
		.bind(position)
		.bind(is_intermediate_code)
		.bind(pictures)
		.bind(links)
		.bind(id)
		.fetch_one(&self.pool)
		.await?;
		Ok(row.into_node())
	}
}

fn node_cols(alias: &str) -> String {
	["id", "code", "name", "label", "label_en", "level", "position", "pattern", "group_name",
		"full_typecode", "is_intermediate_code", "pictures", "links", "parent_id"]
		.iter()
		.map(|c| format!("{alias}.{c}"))
		.collect::<Vec<_>>()
		.join(", ")
}

pub(crate) async fn insert_node_tx(
	tx: &mut Transaction<'_, Postgres>,
	new: NewNode,
) -> Result<Node> {
	let pictures = serde_json::to_value(&new.pictures).unwrap();
	let links = serde_json::to_value(&new.links).unwrap();
	let level = match new.parent_id {
		None => 0,
		Some(parent_id) => {
			let parent: (i32,) = sqlx::query_as("SELECT level FROM nodes WHERE id = $1")
				.bind(parent_id)
				.fetch_optional(&mut **tx)
				.await?
				.ok_or_else(|| Error::not_found(format!("parent node {parent_id}")))?;
			if new.code.is_some() {
				parent.0 + 1
			} else {
				parent.0
			}
		}
	};
	let row: NodeRow = sqlx::query_as(&format!(
		"INSERT INTO nodes (code, name, label, label_en, level, position, pattern, group_name,
		 full_typecode, is_intermediate_code, pictures, links, parent_id)
		 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13) RETURNING {NODE_COLUMNS}"
	))
	.bind(new.code)
	.bind(new.name)
	.bind(new.label)
	.bind(new.label_en)
	.bind(level)
	.bind(new.position)
	.bind(new.pattern)
	.bind(new.group_name)
	.bind(new.full_typecode)
	.bind(new.is_intermediate_code)
	.bind(pictures)
	.bind(links)
	.bind(new.parent_id)
	.fetch_one(&mut **tx)
	.await?;

	sqlx::query("INSERT INTO node_paths (ancestor_id, descendant_id, depth) VALUES ($1, $1, 0)")
		.bind(row.id)
		.execute(&mut **tx)
		.await?;

	if let Some(parent_id) = new.parent_id {
		sqlx::query(
			"INSERT INTO node_paths (ancestor_id, descendant_id, depth)
			 SELECT ancestor_id, $2, depth + 1 FROM node_paths WHERE descendant_id = $1",
		)
		.bind(parent_id)
		.bind(row.id)
		.execute(&mut **tx)
		.await?;
	}

	Ok(row.into_node())
}

pub(crate) async fn delete_node_tx(tx: &mut Transaction<'_, Postgres>, id: NodeId) -> Result<()> {
	let descendants: Vec<(NodeId,)> =
		sqlx::query_as("SELECT descendant_id FROM node_paths WHERE ancestor_id = $1")
			.bind(id)
			.fetch_all(&mut **tx)
			.await?;
	let ids: Vec<NodeId> = descendants.into_iter().map(|(d,)| d).collect();
	if ids.is_empty() {
		return Ok(());
	}
	sqlx::query("DELETE FROM node_paths WHERE ancestor_id = ANY($1) OR descendant_id = ANY($1)")
		.bind(&ids)
		.execute(&mut **tx)
		.await?;
	sqlx::query("DELETE FROM nodes WHERE id = ANY($1)").bind(&ids).execute(&mut **tx).await?;
	Ok(())
}
