//! Bulk successor creation (§4.10): plan then persist the pairs, skipping
//! any that already exist. Single-pair CRUD is plain Store access and has
//! no wrapper here.
use crate::err::Result;
use crate::model::{Node, Severity, Successor};
use crate::store::Store;
use crate::successor_resolve::plan_bulk_successors;

pub async fn bulk_create_successors(
	store: &Store,
	sources: &[Node],
	targets: &[Node],
	replacement_type: &str,
	pairing_severity: Severity,
) -> Result<Vec<Successor>> {
	let planned = plan_bulk_successors(store, sources, targets, replacement_type, pairing_severity).await?;
	let mut created = Vec::with_capacity(planned.len());
	for successor in planned {
		created.push(store.create_successor(successor).await?);
	}
	Ok(created)
}
