//! User lifecycle orchestration (§4.11, §4.15): password hashing lives here
//! rather than in the Store, since the Store only ever sees the resulting
//! hash. Login token issuance is the server crate's job — this module stops
//! at "verify this password", deliberately staying ignorant of JWTs.
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::err::{Error, Result};
use crate::model::{Role, User};
use crate::store::user::NewUser;
use crate::store::Store;

pub fn hash_password(password: &str) -> Result<String> {
	let salt = SaltString::generate(&mut OsRng);
	Argon2::default()
		.hash_password(password.as_bytes(), &salt)
		.map(|h| h.to_string())
		.map_err(|e| Error::internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
	let Ok(parsed) = PasswordHash::new(hash) else {
		return false;
	};
	Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

pub async fn create_user(
	store: &Store,
	username: &str,
	password: &str,
	role: Role,
	must_change_password: bool,
) -> Result<User> {
	let password_hash = hash_password(password)?;
	store
		.create_user(NewUser { username: username.to_string(), password_hash, role, must_change_password })
		.await
}

/// Verify the user's current password, then replace it and clear
/// `must_change_password` (the first-login flow of §4.11's state machine).
pub async fn change_password(store: &Store, user_id: i64, current_password: &str, new_password: &str) -> Result<()> {
	let user = store.get_user(user_id).await?;
	if !verify_password(current_password, &user.password_hash) {
		return Err(Error::unauthorised("current password is incorrect"));
	}
	let new_hash = hash_password(new_password)?;
	store.update_password(user_id, &new_hash, false).await
}

/// Reset a user's password as an admin action, without knowing the old one.
/// Forces `must_change_password` so the user must pick their own on next login.
pub async fn admin_reset_password(store: &Store, user_id: i64, new_password: &str) -> Result<()> {
	let new_hash = hash_password(new_password)?;
	store.update_password(user_id, &new_hash, true).await
}

/// Verify credentials for login. Unknown username, wrong password and a
/// malformed hash are all folded into a single `unauthorised` outcome to
/// avoid leaking which case occurred (username enumeration, §4.15).
pub async fn verify_login(store: &Store, username: &str, password: &str) -> Result<User> {
	let user = store.get_user_by_username(username).await?;
	match user {
		Some(user) if verify_password(password, &user.password_hash) => {
			if !user.active {
				return Err(Error::forbidden("account is disabled"));
			}
			Ok(user)
		}
		_ => Err(Error::unauthorised("invalid username or password")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hash_round_trips() {
		let hash = hash_password("correct horse battery staple").unwrap();
		assert!(verify_password("correct horse battery staple", &hash));
		assert!(!verify_password("wrong password", &hash));
	}
}
