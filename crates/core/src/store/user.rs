//! `users` persistence, including the last-admin guard (§4.11, §5): the
//! count of active admins is checked under a row-locking transaction so two
//! concurrent admin-delete (or admin-disable) requests can never both
//! succeed and leave zero admins.
use sqlx::FromRow;

use crate::err::{Error, Result};
use crate::model::{Role, User};

use super::Store;

#[derive(Debug, FromRow)]
struct UserRow {
	id: i64,
	username: String,
	password_hash: String,
	role: String,
	active: bool,
	must_change_password: bool,
}

fn parse_role(s: &str) -> Role {
	match s {
		"admin" => Role::Admin,
		_ => Role::User,
	}
}

fn role_str(r: Role) -> &'static str {
	match r {
		Role::Admin => "admin",
		Role::User => "user",
	}
}

impl From<UserRow> for User {
	fn from(r: UserRow) -> Self {
		User {
			id: r.id,
			username: r.username,
			password_hash: r.password_hash,
			role: parse_role(&r.role),
			active: r.active,
			must_change_password: r.must_change_password,
		}
	}
}

const USER_COLUMNS: &str = "id, username, password_hash, role, active, must_change_password";

#[derive(Debug, Clone)]
pub struct NewUser {
	pub username: String,
	pub password_hash: String,
	pub role: Role,
	pub must_change_password: bool,
}

impl Store {
	pub async fn get_user(&self, id: i64) -> Result<User> {
		let row: Option<UserRow> =
			sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
				.bind(id)
				.fetch_optional(&self.pool)
				.await?;
		row.map(Into::into).ok_or_else(|| Error::not_found(format!("user {id}")))
	}

	pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
		let row: Option<UserRow> =
			sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
				.bind(username)
				.fetch_optional(&self.pool)
				.await?;
		Ok(row.map(Into::into))
	}

	pub async fn list_users(&self) -> Result<Vec<User>> {
		let rows: Vec<UserRow> =
			sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id")).fetch_all(&self.pool).await?;
		Ok(rows.into_iter().map(Into::into).collect())
	}

	pub async fn create_user(&self, new: NewUser) -> Result<User> {
		let row: UserRow = sqlx::query_as(&format!(
			"INSERT INTO users (username, password_hash, role, active, must_change_password)
			 VALUES ($1,$2,$3,true,$4) RETURNING {USER_COLUMNS}"
		))
		.bind(&new.username)
		.bind(&new.password_hash)
		.bind(role_str(new.role))
		.bind(new.must_change_password)
		.fetch_one(&self.pool)
		.await?;
		Ok(row.into())
	}

	pub async fn update_password(&self, id: i64, password_hash: &str, must_change_password: bool) -> Result<()> {
		let result = sqlx::query("UPDATE users SET password_hash = $1, must_change_password = $2 WHERE id = $3")
			.bind(password_hash)
			.bind(must_change_password)
			.bind(id)
			.execute(&self.pool)
			.await?;
		if result.rows_affected() == 0 {
			return Err(Error::not_found(format!("user {id}")));
		}
		Ok(())
	}

	pub async fn update_role(&self, id: i64, role: Role) -> Result<User> {
		let row: UserRow = sqlx::query_as(&format!(
			"UPDATE users SET role = $1 WHERE id = $2 RETURNING {USER_COLUMNS}"
		))
		.bind(role_str(role))
		.bind(id)
		.fetch_one(&self.pool)
		.await?;
		Ok(row.into())
	}

	/// Toggle `active`. When deactivating an admin, this runs the same
	/// last-admin guard as [`Store::delete_user`].
	pub async fn set_active(&self, id: i64, active: bool) -> Result<User> {
		let mut tx = self.pool.begin().await?;
		let target: UserRow =
			sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"))
				.bind(id)
				.fetch_optional(&mut *tx)
				.await?
				.ok_or_else(|| Error::not_found(format!("user {id}")))?;
		if !active && target.role == "admin" && target.active {
			ensure_other_active_admin_locked(&mut tx, id).await?;
		}
		let row: UserRow = sqlx::query_as(&format!(
			"UPDATE users SET active = $1 WHERE id = $2 RETURNING {USER_COLUMNS}"
		))
		.bind(active)
		.bind(id)
		.fetch_one(&mut *tx)
		.await?;
		tx.commit().await?;
		if !active {
			info!(user_id = id, "deactivated user");
		}
		Ok(row.into())
	}

	/// Delete a user, guarded per §4.11: may not delete self, may not
	/// delete id 1 (the bootstrap admin), may not delete the last admin.
	pub async fn delete_user(&self, id: i64, acting_user_id: i64) -> Result<()> {
		if id == acting_user_id {
			return Err(Error::integrity("cannot delete your own account"));
		}
		if id == 1 {
			return Err(Error::integrity("cannot delete the initial admin account"));
		}
		let mut tx = self.pool.begin().await?;
		let target: UserRow =
			sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"))
				.bind(id)
				.fetch_optional(&mut *tx)
				.await?
				.ok_or_else(|| Error::not_found(format!("user {id}")))?;
		if target.role == "admin" && target.active {
			ensure_other_active_admin_locked(&mut tx, id).await?;
		}
		sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&mut *tx).await?;
		tx.commit().await?;
		info!(user_id = id, acting_user_id, "deleted user");
		Ok(())
	}
}

/// Lock every other active admin row and check at least one remains;
/// must run inside the same transaction as the mutation it guards.
async fn ensure_other_active_admin_locked(
	tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
	excluding_id: i64,
) -> Result<()> {
	let others: Vec<(i64,)> = sqlx::query_as(
		"SELECT id FROM users WHERE role = 'admin' AND active = true AND id != $1 FOR UPDATE",
	)
	.bind(excluding_id)
	.fetch_all(&mut **tx)
	.await?;
	if others.is_empty() {
		warn!(excluding_id, "blocked last-admin guard violation");
		return Err(Error::integrity("at least one active admin must remain"));
	}
	Ok(())
}
