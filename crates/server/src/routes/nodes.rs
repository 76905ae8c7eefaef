//! Plain node-graph queries — each handler calls exactly one Store method.
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use variant_core::model::{LabelSegment, Node, NodeId};
use variant_core::pattern_filter::NodeFilter;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn families(State(state): State<AppState>) -> ApiResult<Json<Vec<Node>>> {
	Ok(Json(state.store.families().await?))
}

pub async fn children(State(state): State<AppState>, Path(id): Path<NodeId>) -> ApiResult<Json<Vec<Node>>> {
	Ok(Json(state.store.skip_pattern_children(id).await?))
}

pub async fn ancestors(State(state): State<AppState>, Path(id): Path<NodeId>) -> ApiResult<Json<Vec<Node>>> {
	Ok(Json(state.store.ancestors_of(id, true).await?))
}

#[derive(Deserialize)]
pub struct MaxLevelQuery {
	family: Option<NodeId>,
}

#[derive(Serialize)]
pub struct MaxLevelResponse {
	max_level: Option<i32>,
}

pub async fn max_level(
	State(state): State<AppState>,
	Path(id): Path<NodeId>,
	Query(q): Query<MaxLevelQuery>,
) -> ApiResult<Json<MaxLevelResponse>> {
	let max_level = state.store.max_level_below(id, q.family).await?;
	Ok(Json(MaxLevelResponse { max_level }))
}

pub async fn nodes_by_code(State(state): State<AppState>, Path(code): Path<String>) -> ApiResult<Json<Vec<Node>>> {
	Ok(Json(state.store.nodes_by_code(&code).await?))
}

pub async fn bulk_filter(
	State(state): State<AppState>,
	Path(id): Path<NodeId>,
	Json(filter): Json<NodeFilter>,
) -> ApiResult<Json<Vec<Node>>> {
	let descendants = state.store.descendants_by_depth(id).await?;
	let mut matched = Vec::new();
	for (node, _depth) in descendants {
		if variant_core::pattern_filter::matches_filter(&state.store, &node, &filter).await? {
			matched.push(node);
		}
	}
	Ok(Json(matched))
}

#[derive(Deserialize)]
pub struct SuggestQuery {
	level: i32,
	prefix: Option<String>,
}

pub async fn suggest_codes(
	State(state): State<AppState>,
	Path(id): Path<NodeId>,
	Query(q): Query<SuggestQuery>,
) -> ApiResult<Json<Vec<String>>> {
	Ok(Json(state.store.suggest_codes_at(id, q.level, q.prefix.as_deref()).await?))
}

#[derive(Deserialize)]
pub struct CodeExistsQuery {
	level: i32,
	code: String,
	parent_id: Option<NodeId>,
}

#[derive(Serialize)]
pub struct CodeExistsResponse {
	exists: bool,
}

pub async fn code_exists(
	State(state): State<AppState>,
	Path(id): Path<NodeId>,
	Query(q): Query<CodeExistsQuery>,
) -> ApiResult<Json<CodeExistsResponse>> {
	let exists = state.store.code_exists_at(id, q.level, &q.code, q.parent_id).await?;
	Ok(Json(CodeExistsResponse { exists }))
}

#[derive(Deserialize)]
pub struct FindByPathRequest {
	family_root: NodeId,
	parent_codes: Vec<String>,
	code: String,
	level: i32,
}

#[derive(Serialize)]
pub struct FindByPathResponse {
	node_id: Option<NodeId>,
}

pub async fn find_by_path(
	State(state): State<AppState>,
	Json(req): Json<FindByPathRequest>,
) -> ApiResult<Json<FindByPathResponse>> {
	let node_id = state.store.find_node_by_path(req.family_root, &req.parent_codes, &req.code, req.level).await?;
	Ok(Json(FindByPathResponse { node_id }))
}

pub async fn label_hints(
	State(state): State<AppState>,
	Path(id): Path<NodeId>,
) -> ApiResult<Json<Vec<LabelSegment>>> {
	Ok(Json(state.store.label_segments_for(id).await?))
}
