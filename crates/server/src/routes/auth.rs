//! Login and self-service password change (§4.15).
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use variant_core::admin::users;

use crate::auth::{issue_token, AuthUser};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
	username: String,
	password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
	token: String,
	must_change_password: bool,
}

pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> ApiResult<Json<LoginResponse>> {
	let user = users::verify_login(&state.store, &req.username, &req.password).await?;
	let token = issue_token(&state.config.jwt_secret, &user.username, user.role, state.config.jwt_expiry_secs)?;
	Ok(Json(LoginResponse { token, must_change_password: user.must_change_password }))
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
	current_password: String,
	new_password: String,
}

pub async fn change_password(
	State(state): State<AppState>,
	auth: AuthUser,
	Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<()> {
	let user = state
		.store
		.get_user_by_username(&auth.username)
		.await?
		.ok_or_else(|| variant_core::err::Error::unauthorised("unknown user"))?;
	users::change_password(&state.store, user.id, &req.current_password, &req.new_password).await?;
	Ok(())
}
