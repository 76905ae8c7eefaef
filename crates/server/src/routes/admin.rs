//! Admin-only mutators (§4, §6). Every handler requires [`AdminUser`] and
//! calls a single `variant_core::admin` or `Store` operation.
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use variant_core::admin::{node as admin_node, successors as admin_successors, users as admin_users, validate};
use variant_core::constraint_engine::ValidationResult;
use variant_core::model::{Constraint, KmatReference, Node, NodeId, Role, Severity, Successor, User};
use variant_core::pattern_filter::NodeFilter;
use variant_core::store::node::{NewNode, NodePatch};

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_node(
	State(state): State<AppState>,
	_admin: AdminUser,
	Path(parent_id): Path<NodeId>,
	Json(new): Json<NewNode>,
) -> ApiResult<Json<Node>> {
	Ok(Json(admin_node::create_node(&state.store, parent_id, new).await?))
}

pub async fn update_node(
	State(state): State<AppState>,
	_admin: AdminUser,
	Path(id): Path<NodeId>,
	Json(patch): Json<NodePatch>,
) -> ApiResult<Json<Node>> {
	Ok(Json(state.store.update_node(id, patch).await?))
}

pub async fn delete_node(State(state): State<AppState>, _admin: AdminUser, Path(id): Path<NodeId>) -> ApiResult<()> {
	admin_node::delete_node(&state.store, id).await?;
	Ok(())
}

pub async fn create_family(
	State(state): State<AppState>,
	_admin: AdminUser,
	Json(new): Json<NewNode>,
) -> ApiResult<Json<Node>> {
	Ok(Json(admin_node::create_family(&state.store, new).await?))
}

pub async fn delete_family(State(state): State<AppState>, _admin: AdminUser, Path(id): Path<NodeId>) -> ApiResult<()> {
	admin_node::delete_family(&state.store, id).await?;
	Ok(())
}

#[derive(Deserialize)]
pub struct BulkUpdateRequest {
	filter: NodeFilter,
	mode: admin_node::BulkUpdateMode,
	fields: admin_node::BulkUpdateFields,
}

pub async fn bulk_update(
	State(state): State<AppState>,
	_admin: AdminUser,
	Path(id): Path<NodeId>,
	Json(req): Json<BulkUpdateRequest>,
) -> ApiResult<Json<Vec<Node>>> {
	let updated = admin_node::bulk_update(&state.store, id, &req.filter, req.mode, &req.fields).await?;
	Ok(Json(updated))
}

pub async fn deep_copy(
	State(state): State<AppState>,
	_admin: AdminUser,
	Path((id, new_parent_id)): Path<(NodeId, NodeId)>,
) -> ApiResult<Json<Vec<Node>>> {
	Ok(Json(admin_node::deep_copy(&state.store, id, new_parent_id).await?))
}

pub async fn subtree_info(
	State(state): State<AppState>,
	_admin: AdminUser,
	Path(id): Path<NodeId>,
) -> ApiResult<Json<admin_node::SubtreeInfo>> {
	Ok(Json(admin_node::subtree_info(&state.store, id).await?))
}

pub async fn list_constraints(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Json<Vec<Constraint>>> {
	Ok(Json(state.store.all_constraints().await?))
}

pub async fn create_constraint(
	State(state): State<AppState>,
	_admin: AdminUser,
	Json(constraint): Json<Constraint>,
) -> ApiResult<Json<Constraint>> {
	Ok(Json(state.store.create_constraint(constraint).await?))
}

pub async fn update_constraint(
	State(state): State<AppState>,
	_admin: AdminUser,
	Path(id): Path<i64>,
	Json(constraint): Json<Constraint>,
) -> ApiResult<Json<Constraint>> {
	let constraint = Constraint { id: Some(id), ..constraint };
	Ok(Json(state.store.update_constraint(constraint).await?))
}

pub async fn delete_constraint(State(state): State<AppState>, _admin: AdminUser, Path(id): Path<i64>) -> ApiResult<()> {
	state.store.delete_constraint(id).await?;
	Ok(())
}

#[derive(Deserialize)]
pub struct ValidateCodeRequest {
	selection: std::collections::BTreeMap<i32, String>,
	target_level: i32,
	candidate_code: String,
}

pub async fn validate_code(
	State(state): State<AppState>,
	_admin: AdminUser,
	Json(req): Json<ValidateCodeRequest>,
) -> ApiResult<Json<ValidationResult>> {
	let result =
		validate::validate_code_against_constraints(&state.store, &req.selection, req.target_level, &req.candidate_code)
			.await?;
	Ok(Json(result))
}

pub async fn list_successors(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Json<Vec<Successor>>> {
	Ok(Json(state.store.all_successors().await?))
}

pub async fn create_successor(
	State(state): State<AppState>,
	_admin: AdminUser,
	Json(successor): Json<Successor>,
) -> ApiResult<Json<Successor>> {
	Ok(Json(state.store.create_successor(successor).await?))
}

pub async fn update_successor(
	State(state): State<AppState>,
	_admin: AdminUser,
	Path(id): Path<i64>,
	Json(successor): Json<Successor>,
) -> ApiResult<Json<Successor>> {
	let successor = Successor { id: Some(id), ..successor };
	Ok(Json(state.store.update_successor(successor).await?))
}

pub async fn delete_successor(State(state): State<AppState>, _admin: AdminUser, Path(id): Path<i64>) -> ApiResult<()> {
	state.store.delete_successor(id).await?;
	Ok(())
}

#[derive(Deserialize)]
pub struct BulkSuccessorRequest {
	source_ids: Vec<NodeId>,
	target_ids: Vec<NodeId>,
	replacement_type: String,
	pairing_severity: Severity,
}

pub async fn bulk_create_successors(
	State(state): State<AppState>,
	_admin: AdminUser,
	Json(req): Json<BulkSuccessorRequest>,
) -> ApiResult<Json<Vec<Successor>>> {
	let sources = state.store.get_nodes(&req.source_ids).await?;
	let targets = state.store.get_nodes(&req.target_ids).await?;
	let created = admin_successors::bulk_create_successors(
		&state.store,
		&sources,
		&targets,
		&req.replacement_type,
		req.pairing_severity,
	)
	.await?;
	Ok(Json(created))
}

pub async fn list_kmat_references(
	State(state): State<AppState>,
	_admin: AdminUser,
) -> ApiResult<Json<Vec<KmatReference>>> {
	Ok(Json(state.store.all_kmat_references().await?))
}

pub async fn export_kmat_references(
	State(state): State<AppState>,
	_admin: AdminUser,
) -> ApiResult<Json<Vec<variant_core::export::KmatExportEntry>>> {
	Ok(Json(variant_core::export::export_kmat_references(&state.store).await?))
}

pub async fn import_kmat_references(
	State(state): State<AppState>,
	_admin: AdminUser,
	Json(entries): Json<Vec<variant_core::export::KmatExportEntry>>,
) -> ApiResult<Json<usize>> {
	Ok(Json(variant_core::export::import_kmat_references(&state.store, &entries).await?))
}

#[derive(Deserialize)]
pub struct ReparseLabelRequest {
	full_code: Option<String>,
	label: Option<String>,
	label_en: Option<String>,
}

pub async fn reparse_label(
	State(state): State<AppState>,
	_admin: AdminUser,
	Path(id): Path<NodeId>,
	Json(req): Json<ReparseLabelRequest>,
) -> ApiResult<Json<Vec<variant_core::model::LabelSegment>>> {
	let segments = variant_core::label_parse::reparse_node_label(
		&state.store,
		id,
		req.full_code.as_deref(),
		req.label.as_deref(),
		req.label_en.as_deref(),
	)
	.await?;
	Ok(Json(segments))
}

pub async fn export_label_segments(
	State(state): State<AppState>,
	_admin: AdminUser,
	Path(family_id): Path<NodeId>,
) -> ApiResult<String> {
	let segments = variant_core::export::export_label_segments_for_family(&state.store, family_id).await?;
	variant_core::export::label_segments_to_csv(&segments)
		.map_err(Into::into)
}

pub async fn create_kmat_reference(
	State(state): State<AppState>,
	_admin: AdminUser,
	Json(kmat): Json<KmatReference>,
) -> ApiResult<Json<KmatReference>> {
	Ok(Json(state.store.create_kmat_reference(kmat).await?))
}

pub async fn update_kmat_reference(
	State(state): State<AppState>,
	_admin: AdminUser,
	Path(id): Path<i64>,
	Json(kmat): Json<KmatReference>,
) -> ApiResult<Json<KmatReference>> {
	let kmat = KmatReference { id: Some(id), ..kmat };
	Ok(Json(state.store.update_kmat_reference(kmat).await?))
}

pub async fn delete_kmat_reference(
	State(state): State<AppState>,
	_admin: AdminUser,
	Path(id): Path<i64>,
) -> ApiResult<()> {
	state.store.delete_kmat_reference(id).await?;
	Ok(())
}

pub async fn list_users(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Json<Vec<User>>> {
	Ok(Json(state.store.list_users().await?))
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
	username: String,
	password: String,
	role: Role,
	#[serde(default)]
	must_change_password: bool,
}

pub async fn create_user(
	State(state): State<AppState>,
	_admin: AdminUser,
	Json(req): Json<CreateUserRequest>,
) -> ApiResult<Json<User>> {
	let user = admin_users::create_user(&state.store, &req.username, &req.password, req.role, req.must_change_password)
		.await?;
	Ok(Json(user))
}

#[derive(Deserialize)]
pub struct UpdateRoleRequest {
	role: Role,
}

pub async fn update_user_role(
	State(state): State<AppState>,
	_admin: AdminUser,
	Path(id): Path<i64>,
	Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<User>> {
	Ok(Json(state.store.update_role(id, req.role).await?))
}

#[derive(Deserialize)]
pub struct SetActiveRequest {
	active: bool,
}

pub async fn set_user_active(
	State(state): State<AppState>,
	_admin: AdminUser,
	Path(id): Path<i64>,
	Json(req): Json<SetActiveRequest>,
) -> ApiResult<Json<User>> {
	Ok(Json(state.store.set_active(id, req.active).await?))
}

pub async fn delete_user(
	State(state): State<AppState>,
	admin: AdminUser,
	Path(id): Path<i64>,
) -> ApiResult<()> {
	let acting_user = state
		.store
		.get_user_by_username(&admin.0.username)
		.await?
		.ok_or_else(|| variant_core::err::Error::unauthorised("unknown user"))?;
	state.store.delete_user(id, acting_user.id).await?;
	Ok(())
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
	new_password: String,
}

pub async fn admin_reset_password(
	State(state): State<AppState>,
	_admin: AdminUser,
	Path(id): Path<i64>,
	Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<()> {
	admin_users::admin_reset_password(&state.store, id, &req.new_password).await?;
	Ok(())
}
