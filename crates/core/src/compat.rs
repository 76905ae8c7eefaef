//! The compatibility engine (§4.4, §4.4b): given a target level and the
//! caller's current selections, resolve which options remain reachable and
//! which are merely shown greyed-out.
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use crate::err::{Error, Result};
use crate::merge;
use crate::model::{Link, Node, NodeId, Picture};
use crate::selection::{family_selection, Selection};
use crate::store::Store;

/// One resolved option at `target_level`, ready for the UI to render.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AvailableOption {
	pub representative_id: NodeId,
	pub ids: BTreeSet<NodeId>,
	pub code: String,
	pub label: Option<String>,
	pub label_en: Option<String>,
	pub name: Option<String>,
	pub group_name: Option<String>,
	pub level: i32,
	pub position: i32,
	pub parent_pattern: Option<i32>,
	pub is_compatible: bool,
	pub pictures: Vec<Picture>,
	pub links: Vec<Link>,
}

/// One code-group of candidate nodes, carried through pruning.
struct Group {
	code: String,
	ids: BTreeSet<NodeId>,
	nodes: Vec<Node>,
	parent_pattern: Option<i32>,
	position: i32,
}

/// Resolve the available options at `target_level` given the caller's
/// current `selections`. `selections` must contain exactly one `level = 0`
/// entry naming the active family; its `ids` carry every node sharing that
/// family code (pattern containers are never family nodes, so this is
/// unambiguous).
pub async fn resolve_options(
	store: &Store,
	target_level: i32,
	selections: &[Selection],
	group_filter: Option<&str>,
) -> Result<Vec<AvailableOption>> {
	let family = family_selection(selections)
		.filter(|s| s.is_usable())
		.ok_or_else(|| Error::validation("a family (level 0) selection with ids is required"))?;
	// A family selection names exactly one family root; pick any id as the
	// subtree root for the candidate fetch (all of `family.ids` denote the
	// same catalogue family, so any representative works).
	let family_root = *family.ids.iter().next().expect("is_usable checked non-empty");

	let groups = fetch_candidate_groups(store, family_root, target_level).await?;
	let mut groups = prune_groups(store, groups, selections, target_level).await?;

	if let Some(gf) = group_filter {
		apply_group_filter(store, &mut groups, gf).await?;
	}

	let mut options: Vec<AvailableOption> = groups.into_iter().map(materialise).collect();
	options.sort_by(|a, b| {
		(a.parent_pattern, Reverse(a.is_compatible), a.position, a.code.clone()).cmp(&(
			b.parent_pattern,
			Reverse(b.is_compatible),
			b.position,
			b.code.clone(),
		))
	});
	Ok(options)
}

/// §4.4b: same resolution, then filtered by code prefix / code length /
/// case-insensitive label substring match (either language).
pub async fn resolve_options_search(
	store: &Store,
	target_level: i32,
	selections: &[Selection],
	group_filter: Option<&str>,
	code_prefix: Option<&str>,
	code_length: Option<usize>,
	label_substring: Option<&str>,
) -> Result<Vec<AvailableOption>> {
	let options = resolve_options(store, target_level, selections, group_filter).await?;
	let needle = label_substring.map(|s| s.to_lowercase());
	Ok(options
		.into_iter()
		.filter(|o| code_prefix.map(|p| o.code.starts_with(p)).unwrap_or(true))
		.filter(|o| code_length.map(|l| o.code.chars().count() == l).unwrap_or(true))
		.filter(|o| match &needle {
			None => true,
			Some(n) => {
				let label = o.label.as_deref().unwrap_or_default().to_lowercase();
				let label_en = o.label_en.as_deref().unwrap_or_default().to_lowercase();
				label.contains(n) || label_en.contains(n)
			}
		})
		.collect())
}

async fn fetch_candidate_groups(store: &Store, family_root: NodeId, target_level: i32) -> Result<Vec<Group>> {
	let rows = store.descendants_at(family_root, target_level).await?;
	let mut by_code: BTreeMap<String, Group> = BTreeMap::new();
	for (node, parent_pattern) in rows {
		let Some(code) = node.code.clone() else { continue };
		let entry = by_code.entry(code.clone()).or_insert_with(|| Group {
			code,
			ids: BTreeSet::new(),
			nodes: Vec::new(),
			parent_pattern,
			position: node.position,
		});
		entry.ids.insert(node.id);
		entry.nodes.push(node);
	}
	// Final ordering is applied once in `resolve_options` after pruning.
	Ok(by_code.into_values().collect())
}

/// Path filtering per selection (step 3): for every other selection, retain
/// only ids reachable to/from it, and mark groups that emptied out.
async fn prune_groups(
	store: &Store,
	groups: Vec<Group>,
	selections: &[Selection],
	target_level: i32,
) -> Result<Vec<(Group, bool)>> {
	let mut out = Vec::with_capacity(groups.len());
	for group in groups {
		let mut current = group.ids.clone();
		for sel in selections {
			if sel.level == target_level || !sel.is_usable() {
				continue;
			}
			let ids: Vec<NodeId> = current.iter().copied().collect();
			let sel_ids: Vec<NodeId> = sel.ids.iter().copied().collect();
			current = if sel.level < target_level {
				// forward: retain b ∈ B reachable from some a ∈ S.ids
				store.reachable_subset(&sel_ids, &ids).await?
			} else {
				// backward: retain b ∈ B that are ancestors of some a ∈ S.ids
				store.ancestor_subset(&ids, &sel_ids).await?
			};
		}
		let is_compatible = !current.is_empty();
		let final_ids = if is_compatible { current } else { group.ids.clone() };
		out.push((
			Group {
				code: group.code,
				ids: final_ids,
				nodes: group.nodes,
				parent_pattern: group.parent_pattern,
				position: group.position,
			},
			is_compatible,
		));
	}
	Ok(out)
}

async fn apply_group_filter(store: &Store, groups: &mut [(Group, bool)], group_filter: &str) -> Result<()> {
	for (group, is_compatible) in groups.iter_mut() {
		if !*is_compatible {
			continue;
		}
		let mut found = false;
		for &id in &group.ids {
			let descendants = store.descendants_by_depth(id).await?;
			if descendants.iter().any(|(n, _)| n.group_name.as_deref() == Some(group_filter)) {
				found = true;
				break;
			}
		}
		*is_compatible = found;
	}
	Ok(())
}

fn materialise((group, is_compatible): (Group, bool)) -> AvailableOption {
	let filtered: Vec<&Node> = group.nodes.iter().filter(|n| group.ids.contains(&n.id)).collect();
	let representative_id = filtered.first().map(|n| n.id).unwrap_or_else(|| {
		group.nodes.first().map(|n| n.id).expect("a code group always has at least one node")
	});
	let level = filtered.first().map(|n| n.level).unwrap_or(group.nodes[0].level);

	if filtered.len() == 1 {
		let n = filtered[0];
		return AvailableOption {
			representative_id,
			ids: group.ids,
			code: group.code,
			label: n.label.clone(),
			label_en: n.label_en.clone(),
			name: n.name.clone(),
			group_name: n.group_name.clone(),
			level,
			position: group.position,
			parent_pattern: group.parent_pattern,
			is_compatible,
			pictures: n.pictures.clone(),
			links: n.links.clone(),
		};
	}

	AvailableOption {
		representative_id,
		ids: group.ids,
		code: group.code,
		label: merge::union_sorted(filtered.iter().filter_map(|n| n.label.as_deref())),
		label_en: merge::union_sorted(filtered.iter().filter_map(|n| n.label_en.as_deref())),
		name: merge::union_first_seen(filtered.iter().filter_map(|n| n.name.as_deref())),
		group_name: merge::union_first_seen(filtered.iter().filter_map(|n| n.group_name.as_deref())),
		level,
		position: group.position,
		parent_pattern: group.parent_pattern,
		is_compatible,
		pictures: merge::union_pictures(filtered.iter().copied()),
		links: merge::union_links(filtered.iter().copied()),
	}
}
