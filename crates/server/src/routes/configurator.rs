//! The configurator-facing read path (§4.4, §4.5, §4.9, §4.10): resolving
//! options, inferring groups, decoding raw strings, validating candidate
//! codes and surfacing successor warnings.
use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use variant_core::admin::validate::validate_code_against_constraints;
use variant_core::admin::successors::bulk_create_successors;
use variant_core::compat::{resolve_options, resolve_options_search, AvailableOption};
use variant_core::constraint_engine::ValidationResult;
use variant_core::decode::{decode as decode_code, DecodeResult};
use variant_core::group::{infer_group, GroupInference};
use variant_core::model::{NodeId, Severity, Successor};
use variant_core::selection::Selection;
use variant_core::successor_resolve::{resolve_for_ids, SuccessorResolution};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct OptionsRequest {
	target_level: i32,
	selections: Vec<Selection>,
	group_filter: Option<String>,
}

pub async fn options(
	State(state): State<AppState>,
	Json(req): Json<OptionsRequest>,
) -> ApiResult<Json<Vec<AvailableOption>>> {
	let options = resolve_options(&state.store, req.target_level, &req.selections, req.group_filter.as_deref()).await?;
	Ok(Json(options))
}

#[derive(Deserialize)]
pub struct OptionsSearchRequest {
	target_level: i32,
	selections: Vec<Selection>,
	group_filter: Option<String>,
	code_prefix: Option<String>,
	code_length: Option<usize>,
	label_substring: Option<String>,
}

pub async fn options_search(
	State(state): State<AppState>,
	Json(req): Json<OptionsSearchRequest>,
) -> ApiResult<Json<Vec<AvailableOption>>> {
	let options = resolve_options_search(
		&state.store,
		req.target_level,
		&req.selections,
		req.group_filter.as_deref(),
		req.code_prefix.as_deref(),
		req.code_length,
		req.label_substring.as_deref(),
	)
	.await?;
	Ok(Json(options))
}

#[derive(Deserialize)]
pub struct GroupRequest {
	selections: Vec<Selection>,
}

pub async fn group(
	State(state): State<AppState>,
	Json(req): Json<GroupRequest>,
) -> ApiResult<Json<GroupInference>> {
	Ok(Json(infer_group(&state.store, &req.selections).await?))
}

#[derive(Deserialize)]
pub struct DecodeRequest {
	raw: String,
}

pub async fn decode(
	State(state): State<AppState>,
	Json(req): Json<DecodeRequest>,
) -> ApiResult<Json<DecodeResult>> {
	Ok(Json(decode_code(&state.store, &req.raw).await?))
}

#[derive(Deserialize)]
pub struct CheckRequest {
	selection: BTreeMap<i32, String>,
	target_level: i32,
	candidate_code: String,
}

pub async fn check(
	State(state): State<AppState>,
	Json(req): Json<CheckRequest>,
) -> ApiResult<Json<ValidationResult>> {
	let result =
		validate_code_against_constraints(&state.store, &req.selection, req.target_level, &req.candidate_code).await?;
	Ok(Json(result))
}

pub async fn node_successor(
	State(state): State<AppState>,
	Path(id): Path<NodeId>,
) -> ApiResult<Json<SuccessorResolution>> {
	let today = Utc::now().date_naive();
	Ok(Json(resolve_for_ids(&state.store, &[id], today).await?))
}

#[derive(Deserialize)]
pub struct ConfiguredProductSuccessorRequest {
	source_ids: Vec<NodeId>,
	target_ids: Vec<NodeId>,
	replacement_type: String,
	pairing_severity: Severity,
}

pub async fn configured_product_successor(
	State(state): State<AppState>,
	Json(req): Json<ConfiguredProductSuccessorRequest>,
) -> ApiResult<Json<Vec<Successor>>> {
	let sources = state.store.get_nodes(&req.source_ids).await?;
	let targets = state.store.get_nodes(&req.target_ids).await?;
	let created =
		bulk_create_successors(&state.store, &sources, &targets, &req.replacement_type, req.pairing_severity).await?;
	Ok(Json(created))
}
