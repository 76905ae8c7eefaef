//! `kmat_references` persistence. Unique on `(family_id, path_node_ids)`.
use sqlx::FromRow;

use crate::err::{Error, Result};
use crate::model::{KmatReference, NodeId};

use super::Store;

#[derive(Debug, FromRow)]
struct KmatRow {
	id: i64,
	family_id: NodeId,
	path_node_ids: Vec<NodeId>,
	full_typecode: String,
	kmat_reference: String,
}

impl From<KmatRow> for KmatReference {
	fn from(r: KmatRow) -> Self {
		KmatReference {
			id: Some(r.id),
			family_id: r.family_id,
			path_node_ids: r.path_node_ids,
			full_typecode: r.full_typecode,
			kmat_reference: r.kmat_reference,
		}
	}
}

const KMAT_COLUMNS: &str = "id, family_id, path_node_ids, full_typecode, kmat_reference";

impl Store {
	pub async fn kmat_references_for_family(&self, family_id: NodeId) -> Result<Vec<KmatReference>> {
		let rows: Vec<KmatRow> = sqlx::query_as(&format!(
			"SELECT {KMAT_COLUMNS} FROM kmat_references WHERE family_id = $1 ORDER BY id"
		))
		.bind(family_id)
		.fetch_all(&self.pool)
		.await?;
		Ok(rows.into_iter().map(Into::into).collect())
	}

	pub async fn all_kmat_references(&self) -> Result<Vec<KmatReference>> {
		let rows: Vec<KmatRow> =
			sqlx::query_as(&format!("SELECT {KMAT_COLUMNS} FROM kmat_references ORDER BY id"))
				.fetch_all(&self.pool)
				.await?;
		Ok(rows.into_iter().map(Into::into).collect())
	}

	pub async fn create_kmat_reference(&self, k: KmatReference) -> Result<KmatReference> {
		let row: KmatRow = sqlx::query_as(&format!(
			"INSERT INTO kmat_references (family_id, path_node_ids, full_typecode, kmat_reference)
			 VALUES ($1,$2,$3,$4) RETURNING {KMAT_COLUMNS}"
		))
		.bind(k.family_id)
		.bind(&k.path_node_ids)
		.bind(&k.full_typecode)
		.bind(&k.kmat_reference)
		.fetch_one(&self.pool)
		.await?;
		Ok(row.into())
	}

	pub async fn update_kmat_reference(&self, k: KmatReference) -> Result<KmatReference> {
		let id = k.id.ok_or_else(|| Error::validation("kmat reference id required for update"))?;
		let row: KmatRow = sqlx::query_as(&format!(
			"UPDATE kmat_references SET family_id = $1, path_node_ids = $2, full_typecode = $3, kmat_reference = $4
			 WHERE id = $5 RETURNING {KMAT_COLUMNS}"
		))
		.bind(k.family_id)
		.bind(&k.path_node_ids)
		.bind(&k.full_typecode)
		.bind(&k.kmat_reference)
		.bind(id)
		.fetch_one(&self.pool)
		.await?;
		Ok(row.into())
	}

	pub async fn delete_kmat_reference(&self, id: i64) -> Result<()> {
		let result =
			sqlx::query("DELETE FROM kmat_references WHERE id = $1").bind(id).execute(&self.pool).await?;
		if result.rows_affected() == 0 {
			return Err(Error::not_found(format!("kmat reference {id}")));
		}
		Ok(())
	}
}
