//! Picture and link attachments on a node (§4.1), and raw-byte upload
//! through the pluggable blob store (§6).
use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use variant_core::admin::node as admin_node;
use variant_core::err::Error;
use variant_core::model::{Link, Node, NodeId, Picture};

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct UploadResponse {
	url: String,
}

/// Accepts a single-part multipart upload and stores it under a fresh
/// `nodes/<id>/<uuid>.<ext>` path (never the caller-supplied filename, to
/// rule out collisions and path traversal through the field name),
/// returning the URL the caller then attaches via [`add_picture`] or
/// [`add_link`].
pub async fn upload(
	State(state): State<AppState>,
	_admin: AdminUser,
	Path(id): Path<NodeId>,
	mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
	let field = multipart
		.next_field()
		.await
		.map_err(|e| Error::validation(format!("invalid multipart body: {e}")))?
		.ok_or_else(|| Error::validation("missing upload field"))?;
	let original_name = field.file_name().unwrap_or("upload").to_string();
	let extension = std::path::Path::new(&original_name)
		.extension()
		.and_then(|e| e.to_str())
		.map(|e| format!(".{e}"))
		.unwrap_or_default();
	let bytes = field.bytes().await.map_err(|e| Error::validation(format!("invalid multipart body: {e}")))?;
	let subpath = format!("nodes/{id}/{}{extension}", uuid::Uuid::new_v4());
	let url = state.blobs.put(&subpath, bytes.as_ref())?;
	Ok(Json(UploadResponse { url }))
}

pub async fn add_picture(
	State(state): State<AppState>,
	_admin: AdminUser,
	Path(id): Path<NodeId>,
	Json(picture): Json<Picture>,
) -> ApiResult<Json<Node>> {
	Ok(Json(admin_node::add_picture(&state.store, id, picture).await?))
}

#[derive(Deserialize)]
pub struct DeleteByUrl {
	url: String,
}

pub async fn delete_picture(
	State(state): State<AppState>,
	_admin: AdminUser,
	Path(id): Path<NodeId>,
	Json(req): Json<DeleteByUrl>,
) -> ApiResult<Json<Node>> {
	Ok(Json(admin_node::delete_picture(&state.store, id, &req.url).await?))
}

pub async fn add_link(
	State(state): State<AppState>,
	_admin: AdminUser,
	Path(id): Path<NodeId>,
	Json(link): Json<Link>,
) -> ApiResult<Json<Node>> {
	Ok(Json(admin_node::add_link(&state.store, id, link).await?))
}

pub async fn delete_link(
	State(state): State<AppState>,
	_admin: AdminUser,
	Path(id): Path<NodeId>,
	Json(req): Json<DeleteByUrl>,
) -> ApiResult<Json<Node>> {
	Ok(Json(admin_node::delete_link(&state.store, id, &req.url).await?))
}
