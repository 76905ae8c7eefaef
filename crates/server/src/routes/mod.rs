pub mod admin;
pub mod auth;
pub mod configurator;
pub mod media;
pub mod nodes;

use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
	let max_concurrent_requests = state.config.max_concurrent_requests;
	Router::new()
		.route("/auth/login", post(auth::login))
		.route("/auth/change-password", post(auth::change_password))
		.route("/families", get(nodes::families))
		.route("/nodes/:id/children", get(nodes::children))
		.route("/nodes/:id/ancestors", get(nodes::ancestors))
		.route("/nodes/:id/max-level", get(nodes::max_level))
		.route("/nodes/by-code/:code", get(nodes::nodes_by_code))
		.route("/nodes/:id/bulk-filter", post(nodes::bulk_filter))
		.route("/nodes/:id/suggest-codes", get(nodes::suggest_codes))
		.route("/nodes/:id/code-exists", get(nodes::code_exists))
		.route("/nodes/find-by-path", post(nodes::find_by_path))
		.route("/nodes/:id/label-hints", get(nodes::label_hints))
		.route("/configurator/options", post(configurator::options))
		.route("/configurator/options/search", post(configurator::options_search))
		.route("/configurator/group", post(configurator::group))
		.route("/configurator/decode", post(configurator::decode))
		.route("/configurator/check", post(configurator::check))
		.route("/nodes/:id/successor", get(configurator::node_successor))
		.route("/nodes/successor/bulk", post(configurator::configured_product_successor))
		.route("/admin/nodes/:parent_id", post(admin::create_node))
		.route("/admin/nodes/:id", patch(admin::update_node).delete(admin::delete_node))
		.route("/admin/families", post(admin::create_family))
		.route("/admin/families/:id", delete(admin::delete_family))
		.route("/admin/nodes/:id/bulk-update", post(admin::bulk_update))
		.route("/admin/nodes/:id/deep-copy/:new_parent_id", post(admin::deep_copy))
		.route("/admin/nodes/:id/subtree-info", get(admin::subtree_info))
		.route("/admin/constraints", get(admin::list_constraints).post(admin::create_constraint))
		.route(
			"/admin/constraints/:id",
			put(admin::update_constraint).delete(admin::delete_constraint),
		)
		.route("/admin/validate", post(admin::validate_code))
		.route(
			"/admin/successors",
			get(admin::list_successors).post(admin::create_successor),
		)
		.route(
			"/admin/successors/:id",
			put(admin::update_successor).delete(admin::delete_successor),
		)
		.route("/admin/successors/bulk", post(admin::bulk_create_successors))
		.route(
			"/admin/kmat",
			get(admin::list_kmat_references).post(admin::create_kmat_reference),
		)
		.route(
			"/admin/kmat/:id",
			put(admin::update_kmat_reference).delete(admin::delete_kmat_reference),
		)
		.route("/admin/kmat/export", get(admin::export_kmat_references))
		.route("/admin/kmat/import", post(admin::import_kmat_references))
		.route("/admin/families/:family_id/labels/export", get(admin::export_label_segments))
		.route("/admin/nodes/:id/label/reparse", post(admin::reparse_label))
		.route("/admin/users", get(admin::list_users).post(admin::create_user))
		.route("/admin/users/:id/role", put(admin::update_user_role))
		.route("/admin/users/:id/active", put(admin::set_user_active))
		.route("/admin/users/:id", delete(admin::delete_user))
		.route("/admin/users/:id/reset-password", post(admin::admin_reset_password))
		.route("/nodes/:id/media/upload", post(media::upload))
		.route("/nodes/:id/pictures", post(media::add_picture))
		.route("/nodes/:id/pictures/delete", post(media::delete_picture))
		.route("/nodes/:id/links", post(media::add_link))
		.route("/nodes/:id/links/delete", post(media::delete_link))
		.layer(CatchPanicLayer::new())
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
		.layer(ConcurrencyLimitLayer::new(max_concurrent_requests))
		.with_state(state)
}
