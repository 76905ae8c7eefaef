//! `constraints` / `constraint_conditions` / `constraint_codes` persistence.
use sqlx::FromRow;

use crate::err::{Error, Result};
use crate::model::{CodeType, ConditionType, Constraint, ConstraintCode, ConstraintCondition, ConstraintMode};

use super::Store;

#[derive(Debug, FromRow)]
struct ConstraintRow {
	id: i64,
	level: i32,
	mode: String,
}

#[derive(Debug, FromRow)]
struct ConditionRow {
	condition_type: String,
	target_level: i32,
	value: String,
}

#[derive(Debug, FromRow)]
struct CodeRow {
	code_type: String,
	code_value: String,
}

fn parse_mode(s: &str) -> Result<ConstraintMode> {
	match s {
		"allow" => Ok(ConstraintMode::Allow),
		"deny" => Ok(ConstraintMode::Deny),
		other => Err(Error::internal(format!("unknown constraint mode {other}"))),
	}
}

fn mode_str(mode: ConstraintMode) -> &'static str {
	match mode {
		ConstraintMode::Allow => "allow",
		ConstraintMode::Deny => "deny",
	}
}

fn parse_condition_type(s: &str) -> Result<ConditionType> {
	match s {
		"pattern" => Ok(ConditionType::Pattern),
		"prefix" => Ok(ConditionType::Prefix),
		"exact_code" => Ok(ConditionType::ExactCode),
		other => Err(Error::internal(format!("unknown condition type {other}"))),
	}
}

fn condition_type_str(t: ConditionType) -> &'static str {
	match t {
		ConditionType::Pattern => "pattern",
		ConditionType::Prefix => "prefix",
		ConditionType::ExactCode => "exact_code",
	}
}

fn parse_code_type(s: &str) -> Result<CodeType> {
	match s {
		"single" => Ok(CodeType::Single),
		"range" => Ok(CodeType::Range),
		other => Err(Error::internal(format!("unknown code type {other}"))),
	}
}

fn code_type_str(t: CodeType) -> &'static str {
	match t {
		CodeType::Single => "single",
		CodeType::Range => "range",
	}
}

impl Store {
	pub async fn constraints_at_level(&self, level: i32) -> Result<Vec<Constraint>> {
		let rows: Vec<ConstraintRow> =
			sqlx::query_as("SELECT id, level, mode FROM constraints WHERE level = $1 ORDER BY id")
				.bind(level)
				.fetch_all(&self.pool)
				.await?;
		let mut out = Vec::with_capacity(rows.len());
		for row in rows {
			out.push(self.load_constraint(row).await?);
		}
		Ok(out)
	}

	pub async fn all_constraints(&self) -> Result<Vec<Constraint>> {
		let rows: Vec<ConstraintRow> =
			sqlx::query_as("SELECT id, level, mode FROM constraints ORDER BY id")
				.fetch_all(&self.pool)
				.await?;
		let mut out = Vec::with_capacity(rows.len());
		for row in rows {
			out.push(self.load_constraint(row).await?);
		}
		Ok(out)
	}

	async fn load_constraint(&self, row: ConstraintRow) -> Result<Constraint> {
		let conditions: Vec<ConditionRow> = sqlx::query_as(
			"SELECT condition_type, target_level, value FROM constraint_conditions WHERE constraint_id = $1 ORDER BY id",
		)
		.bind(row.id)
		.fetch_all(&self.pool)
		.await?;
		let codes: Vec<CodeRow> = sqlx::query_as(
			"SELECT code_type, code_value FROM constraint_codes WHERE constraint_id = $1 ORDER BY id",
		)
		.bind(row.id)
		.fetch_all(&self.pool)
		.await?;
		Ok(Constraint {
			id: Some(row.id),
			level: row.level,
			mode: parse_mode(&row.mode)?,
			conditions: conditions
				.into_iter()
				.map(|c| {
					Ok(ConstraintCondition {
						condition_type: parse_condition_type(&c.condition_type)?,
						target_level: c.target_level,
						value: c.value,
					})
				})
				.collect::<Result<Vec<_>>>()?,
			codes: codes
				.into_iter()
				.map(|c| {
					Ok(ConstraintCode {
						code_type: parse_code_type(&c.code_type)?,
						code_value: c.code_value,
					})
				})
				.collect::<Result<Vec<_>>>()?,
		})
	}

	pub async fn create_constraint(&self, constraint: Constraint) -> Result<Constraint> {
		let mut tx = self.pool.begin().await?;
		let row: (i64,) = sqlx::query_as("INSERT INTO constraints (level, mode) VALUES ($1, $2) RETURNING id")
			.bind(constraint.level)
			.bind(mode_str(constraint.mode))
			.fetch_one(&mut *tx)
			.await?;
		let id = row.0;
		for cond in &constraint.conditions {
			sqlx::query(
				"INSERT INTO constraint_conditions (constraint_id, condition_type, target_level, value) VALUES ($1,$2,$3,$4)",
			)
			.bind(id)
			.bind(condition_type_str(cond.condition_type))
			.bind(cond.target_level)
			.bind(&cond.value)
			.execute(&mut *tx)
			.await?;
		}
		for code in &constraint.codes {
			sqlx::query("INSERT INTO constraint_codes (constraint_id, code_type, code_value) VALUES ($1,$2,$3)")
				.bind(id)
				.bind(code_type_str(code.code_type))
				.bind(&code.code_value)
				.execute(&mut *tx)
				.await?;
		}
		tx.commit().await?;
		Ok(Constraint {
			id: Some(id),
			..constraint
		})
	}

	pub async fn delete_constraint(&self, id: i64) -> Result<()> {
		let result = sqlx::query("DELETE FROM constraints WHERE id = $1").bind(id).execute(&self.pool).await?;
		if result.rows_affected() == 0 {
			return Err(Error::not_found(format!("constraint {id}")));
		}
		Ok(())
	}

	pub async fn update_constraint(&self, constraint: Constraint) -> Result<Constraint> {
		let id = constraint.id.ok_or_else(|| Error::validation("constraint id required for update"))?;
		let mut tx = self.pool.begin().await?;
		let result = sqlx::query("UPDATE constraints SET level = $1, mode = $2 WHERE id = $3")
			.bind(constraint.level)
			.bind(mode_str(constraint.mode))
			.bind(id)
			.execute(&mut *tx)
			.await?;
		if result.rows_affected() == 0 {
			return Err(Error::not_found(format!("constraint {id}")));
		}
		sqlx::query("DELETE FROM constraint_conditions WHERE constraint_id = $1").bind(id).execute(&mut *tx).await?;
		sqlx::query("DELETE FROM constraint_codes WHERE constraint_id = $1").bind(id).execute(&mut *tx).await?;
		for cond in &constraint.conditions {
			sqlx::query(
				"INSERT INTO constraint_conditions (constraint_id, condition_type, target_level, value) VALUES ($1,$2,$3,$4)",
			)
			.bind(id)
			.bind(condition_type_str(cond.condition_type))
			.bind(cond.target_level)
			.bind(&cond.value)
			.execute(&mut *tx)
			.await?;
		}
		for code in &constraint.codes {
			sqlx::query("INSERT INTO constraint_codes (constraint_id, code_type, code_value) VALUES ($1,$2,$3)")
				.bind(id)
				.bind(code_type_str(code.code_type))
				.bind(&code.code_value)
				.execute(&mut *tx)
				.await?;
		}
		tx.commit().await?;
		Ok(constraint)
	}
}
