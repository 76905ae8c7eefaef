//! JWT issuance and verification (§4.15). Claims carry only what this
//! system's single-role model needs — `sub`, `role`, `exp`, `iat` — unlike
//! the teacher's `iam::token::Claims`, which also threads namespace/
//! database/scope claims that have no analogue in a single-tenant service.
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use variant_core::model::Role;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
	pub sub: String,
	pub role: Role,
	pub exp: i64,
	pub iat: i64,
}

pub fn issue_token(secret: &str, username: &str, role: Role, expiry_secs: i64) -> Result<String, ApiError> {
	let now = chrono::Utc::now().timestamp();
	let claims = Claims { sub: username.to_string(), role, exp: now + expiry_secs, iat: now };
	encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
		.map_err(|e| ApiError(variant_core::err::Error::internal(format!("token issuance failed: {e}"))))
}

fn verify_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
	decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
		.map(|data| data.claims)
		.map_err(|_| ApiError(variant_core::err::Error::unauthorised("invalid or expired token")))
}

/// An authenticated request's claims, extracted from the bearer token.
/// Handlers that need the caller's identity or role take this as an
/// argument; handlers that don't simply omit it.
#[derive(Debug, Clone)]
pub struct AuthUser {
	pub username: String,
	pub role: Role,
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AuthUser {
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		let TypedHeader(Authorization(bearer)) =
			TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
				.await
				.map_err(|_| ApiError(variant_core::err::Error::unauthorised("missing bearer token")))?;
		let claims = verify_token(&state.config.jwt_secret, bearer.token())?;
		Ok(AuthUser { username: claims.sub, role: claims.role })
	}
}

/// Rejects non-admin callers. Used as an argument type in admin-only
/// handlers instead of `AuthUser` to make the requirement visible in the
/// handler's signature.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AdminUser {
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		let user = AuthUser::from_request_parts(parts, state).await?;
		if user.role != Role::Admin {
			return Err(ApiError(variant_core::err::Error::forbidden("admin role required")));
		}
		Ok(AdminUser(user))
	}
}
