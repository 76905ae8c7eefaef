//! Successor resolution (§4.10): find the next-to-show replacement warning
//! for a node or configuration path, and plan bulk successor creation.
use chrono::NaiveDate;

use crate::err::Result;
use crate::model::{Node, NodeId, Severity, Successor};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SuccessorResolution {
	pub has_successor: bool,
	pub successor: Option<Successor>,
}

/// Filter to `show_warning` successors whose `effective_date` has passed (or
/// is unset), then pick the most severe, most recent one.
pub fn resolve_successor(successors: &[Successor], today: NaiveDate) -> SuccessorResolution {
	let mut candidates: Vec<&Successor> = successors
		.iter()
		.filter(|s| s.show_warning)
		.filter(|s| s.effective_date.map(|d| d <= today).unwrap_or(true))
		.collect();
	candidates.sort_by(|a, b| b.severity.cmp(&a.severity).then(b.effective_date.cmp(&a.effective_date)));
	match candidates.into_iter().next() {
		Some(s) => SuccessorResolution { has_successor: true, successor: Some(s.clone()) },
		None => SuccessorResolution { has_successor: false, successor: None },
	}
}

pub async fn resolve_for_ids(store: &Store, ids: &[NodeId], today: NaiveDate) -> Result<SuccessorResolution> {
	let successors = store.successors_for_nodes(ids).await?;
	Ok(resolve_successor(&successors, today))
}

/// Plan bulk successor rows for a `sources -> targets` replacement. Skips
/// any pair already present in `product_successors`.
pub async fn plan_bulk_successors(
	store: &Store,
	sources: &[Node],
	targets: &[Node],
	replacement_type: &str,
	pairing_severity: Severity,
) -> Result<Vec<Successor>> {
	let one_to_one = sources.len() == targets.len()
		&& !sources.is_empty()
		&& sources.iter().all(|n| n.full_typecode.is_some())
		&& targets.iter().all(|n| n.full_typecode.is_some());

	let mut pairs = Vec::new();
	if one_to_one {
		for (s, t) in sources.iter().zip(targets.iter()) {
			if store.successor_pair_exists(Some(s.id), Some(t.id)).await? {
				continue;
			}
			pairs.push(successor_row(s, t, replacement_type, pairing_severity, None));
		}
	} else {
		let total = sources.len() * targets.len();
		for s in sources {
			for t in targets {
				if store.successor_pair_exists(Some(s.id), Some(t.id)).await? {
					continue;
				}
				let note = format!("one of {total} possible replacements in this bulk operation");
				pairs.push(successor_row(s, t, replacement_type, Severity::Info, Some(note)));
			}
		}
	}
	Ok(pairs)
}

fn successor_row(
	source: &Node,
	target: &Node,
	replacement_type: &str,
	severity: Severity,
	migration_notes: Option<String>,
) -> Successor {
	Successor {
		id: None,
		source_node_id: Some(source.id),
		source_full_typecode: source.full_typecode.clone(),
		target_node_id: Some(target.id),
		target_full_typecode: target.full_typecode.clone(),
		replacement_type: replacement_type.to_string(),
		severity,
		effective_date: None,
		show_warning: true,
		migration_notes,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn successor(severity: Severity, effective_date: Option<NaiveDate>) -> Successor {
		Successor {
			id: None,
			source_node_id: Some(1),
			source_full_typecode: None,
			target_node_id: Some(2),
			target_full_typecode: None,
			replacement_type: "discontinued".into(),
			severity,
			effective_date,
			show_warning: true,
			migration_notes: None,
		}
	}

	#[test]
	fn picks_highest_severity() {
		let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
		let successors = vec![successor(Severity::Info, None), successor(Severity::Critical, None)];
		let resolved = resolve_successor(&successors, today);
		assert_eq!(resolved.successor.unwrap().severity, Severity::Critical);
	}

	#[test]
	fn ignores_future_effective_dates() {
		let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
		let future = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
		let successors = vec![successor(Severity::Critical, Some(future))];
		let resolved = resolve_successor(&successors, today);
		assert!(!resolved.has_successor);
	}

	#[test]
	fn ignores_hidden_warnings() {
		let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
		let mut s = successor(Severity::Critical, None);
		s.show_warning = false;
		let resolved = resolve_successor(&[s], today);
		assert!(!resolved.has_successor);
	}
}
