//! `product_successors` persistence.
use chrono::NaiveDate;
use sqlx::FromRow;

use crate::err::{Error, Result};
use crate::model::{NodeId, Severity, Successor};

use super::Store;

#[derive(Debug, FromRow)]
struct SuccessorRow {
	id: i64,
	source_node_id: Option<NodeId>,
	source_full_typecode: Option<String>,
	target_node_id: Option<NodeId>,
	target_full_typecode: Option<String>,
	replacement_type: String,
	severity: String,
	effective_date: Option<NaiveDate>,
	show_warning: bool,
	migration_notes: Option<String>,
}

fn parse_severity(s: &str) -> Severity {
	match s {
		"critical" => Severity::Critical,
		"warning" => Severity::Warning,
		_ => Severity::Info,
	}
}

fn severity_str(s: Severity) -> &'static str {
	match s {
		Severity::Critical => "critical",
		Severity::Warning => "warning",
		Severity::Info => "info",
	}
}

impl From<SuccessorRow> for Successor {
	fn from(r: SuccessorRow) -> Self {
		Successor {
			id: Some(r.id),
			source_node_id: r.source_node_id,
			source_full_typecode: r.source_full_typecode,
			target_node_id: r.target_node_id,
			target_full_typecode: r.target_full_typecode,
			replacement_type: r.replacement_type,
			severity: parse_severity(&r.severity),
			effective_date: r.effective_date,
			show_warning: r.show_warning,
			migration_notes: r.migration_notes,
		}
	}
}

const SUCCESSOR_COLUMNS: &str = "id, source_node_id, source_full_typecode, target_node_id, \
	target_full_typecode, replacement_type, severity, effective_date, show_warning, migration_notes";

impl Store {
	pub async fn successors_for_node(&self, node_id: NodeId) -> Result<Vec<Successor>> {
		let rows: Vec<SuccessorRow> = sqlx::query_as(&format!(
			"SELECT {SUCCESSOR_COLUMNS} FROM product_successors WHERE source_node_id = $1"
		))
		.bind(node_id)
		.fetch_all(&self.pool)
		.await?;
		Ok(rows.into_iter().map(Into::into).collect())
	}

	pub async fn successors_for_nodes(&self, node_ids: &[NodeId]) -> Result<Vec<Successor>> {
		let rows: Vec<SuccessorRow> = sqlx::query_as(&format!(
			"SELECT {SUCCESSOR_COLUMNS} FROM product_successors WHERE source_node_id = ANY($1)"
		))
		.bind(node_ids)
		.fetch_all(&self.pool)
		.await?;
		Ok(rows.into_iter().map(Into::into).collect())
	}

	pub async fn all_successors(&self) -> Result<Vec<Successor>> {
		let rows: Vec<SuccessorRow> =
			sqlx::query_as(&format!("SELECT {SUCCESSOR_COLUMNS} FROM product_successors"))
				.fetch_all(&self.pool)
				.await?;
		Ok(rows.into_iter().map(Into::into).collect())
	}

	pub async fn successor_pair_exists(
		&self,
		source_node_id: Option<NodeId>,
		target_node_id: Option<NodeId>,
	) -> Result<bool> {
		let exists: (bool,) = sqlx::query_as(
			"SELECT EXISTS(SELECT 1 FROM product_successors WHERE source_node_id IS NOT DISTINCT FROM $1
			 AND target_node_id IS NOT DISTINCT FROM $2)",
		)
		.bind(source_node_id)
		.bind(target_node_id)
		.fetch_one(&self.pool)
		.await?;
		Ok(exists.0)
	}

	pub async fn create_successor(&self, s: Successor) -> Result<Successor> {
		let row: SuccessorRow = sqlx::query_as(&format!(
			"INSERT INTO product_successors (source_node_id, source_full_typecode, target_node_id,
			 target_full_typecode, replacement_type, severity, effective_date, show_warning, migration_notes)
			 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9) RETURNING {SUCCESSOR_COLUMNS}"
		))
		.bind(s.source_node_id)
		.bind(&s.source_full_typecode)
		.bind(s.target_node_id)
		.bind(&s.target_full_typecode)
		.bind(&s.replacement_type)
		.bind(severity_str(s.severity))
		.bind(s.effective_date)
		.bind(s.show_warning)
		.bind(&s.migration_notes)
		.fetch_one(&self.pool)
		.await?;
		Ok(row.into())
	}

	pub async fn delete_successor(&self, id: i64) -> Result<()> {
		let result =
			sqlx::query("DELETE FROM product_successors WHERE id = $1").bind(id).execute(&self.pool).await?;
		if result.rows_affected() == 0 {
			return Err(Error::not_found(format!("successor {id}")));
		}
		Ok(())
	}

	pub async fn update_successor(&self, s: Successor) -> Result<Successor> {
		let id = s.id.ok_or_else(|| Error::validation("successor id required for update"))?;
		let row: SuccessorRow = sqlx::query_as(&format!(
			"UPDATE product_successors SET source_node_id = $1, source_full_typecode = $2, target_node_id = $3,
			 target_full_typecode = $4, replacement_type = $5, severity = $6, effective_date = $7,
			 show_warning = $8, migration_notes = $9 WHERE id = $10 RETURNING {SUCCESSOR_COLUMNS}"
		))
		.bind(s.source_node_id)
		.bind(&s.source_full_typecode)
		.bind(s.target_node_id)
		.bind(&s.target_full_typecode)
		.bind(&s.replacement_type)
		.bind(severity_str(s.severity))
		.bind(s.effective_date)
		.bind(s.show_warning)
		.bind(&s.migration_notes)
		.bind(id)
		.fetch_one(&self.pool)
		.await?;
		Ok(row.into())
	}
}
