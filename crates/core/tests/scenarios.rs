//! Concrete scenarios S1-S8 and the DB-backed universal invariants (1, 2, 4,
//! 7, 8) of §8, run against a real Postgres via `#[sqlx::test]`.
use std::collections::{BTreeMap, BTreeSet};

use sqlx::PgPool;

use variant_core::admin::{node as admin_node, validate};
use variant_core::model::{Constraint, ConstraintCode, ConstraintCondition, ConstraintMode, CodeType, ConditionType};
use variant_core::selection::Selection;
use variant_core::store::node::NewNode;
use variant_core::{compat, decode, Store};

fn node(code: &str, parent_id: Option<i64>, position: i32) -> NewNode {
	NewNode { code: Some(code.to_string()), parent_id, position, ..Default::default() }
}

fn sel(level: i32, code: &str, ids: impl IntoIterator<Item = i64>) -> Selection {
	Selection::new(level, code, ids.into_iter().collect::<BTreeSet<_>>())
}

/// Builds the small BCC/M100/M200 tree shared by S1, S2 and invariant 2.
async fn build_bcc_tree(store: &Store) -> (i64, i64, i64, i64, i64, i64, i64) {
	let bcc = store.insert_node(node("BCC", None, 0)).await.unwrap().id;
	let m100 = store.insert_node(node("M100", Some(bcc), 0)).await.unwrap().id;
	let m200 = store.insert_node(node("M200", Some(bcc), 1)).await.unwrap().id;
	let x1 = store.insert_node(node("X1", Some(m100), 0)).await.unwrap().id;
	let x2 = store.insert_node(node("X2", Some(m200), 0)).await.unwrap().id;
	let op123 = store.insert_node(node("OP123", Some(x1), 0)).await.unwrap().id;
	let op999 = store.insert_node(node("OP999", Some(x2), 0)).await.unwrap().id;
	(bcc, m100, m200, x1, x2, op123, op999)
}

#[sqlx::test]
async fn s1_options_at_level1_in_family(pool: PgPool) {
	let store = Store::new(pool);
	let (bcc, _m100, _m200, ..) = build_bcc_tree(&store).await;

	let options = compat::resolve_options(&store, 1, &[sel(0, "BCC", [bcc])], None).await.unwrap();

	let codes: Vec<&str> = options.iter().map(|o| o.code.as_str()).collect();
	assert_eq!(codes, vec!["M100", "M200"]);
	assert!(options.iter().all(|o| o.is_compatible));
}

#[sqlx::test]
async fn s2_backward_pruning(pool: PgPool) {
	let store = Store::new(pool);
	let (bcc, _m100, _m200, _x1, _x2, op123, _op999) = build_bcc_tree(&store).await;

	let options =
		compat::resolve_options(&store, 1, &[sel(0, "BCC", [bcc]), sel(3, "OP123", [op123])], None).await.unwrap();

	let by_code: BTreeMap<&str, bool> = options.iter().map(|o| (o.code.as_str(), o.is_compatible)).collect();
	assert_eq!(by_code.get("M100"), Some(&true));
	assert_eq!(by_code.get("M200"), Some(&false));
}

/// Invariant 2: options resolved for family `BCC` never include a node from
/// an unrelated family, even when that family reuses the same level-1 code.
#[sqlx::test]
async fn invariant_family_isolation(pool: PgPool) {
	let store = Store::new(pool);
	let (bcc, ..) = build_bcc_tree(&store).await;
	let other_family = store.insert_node(node("ZZZ", None, 1)).await.unwrap().id;
	store.insert_node(node("M100", Some(other_family), 0)).await.unwrap();

	let options = compat::resolve_options(&store, 1, &[sel(0, "BCC", [bcc])], None).await.unwrap();
	assert_eq!(options.len(), 2, "the other family's M100 must not leak into BCC's options");
}

#[sqlx::test]
async fn s3_decode_complete_product(pool: PgPool) {
	let store = Store::new(pool);
	let a = store.insert_node(node("A", None, 0)).await.unwrap().id;
	let a12 = store.insert_node(node("A12", Some(a), 0)).await.unwrap().id;
	let mut x = node("X", Some(a12), 0);
	x.full_typecode = Some("A A12-X".to_string());
	store.insert_node(x).await.unwrap();

	let result = decode::decode(&store, "A A12-X").await.unwrap();

	assert!(result.exists);
	assert!(result.is_complete_product);
	assert_eq!(result.product_type, decode::ProductType::CompleteProduct);
	assert_eq!(result.path_segments.len(), 3);
	let positions: Vec<(usize, usize)> =
		result.path_segments.iter().map(|s| (s.position_start, s.position_end)).collect();
	assert_eq!(positions, vec![(1, 1), (3, 5), (7, 7)]);
}

/// Invariant 4: every node with a non-NULL `full_typecode` decodes to
/// `is_complete_product = true` and reproduces its own ancestor chain.
#[sqlx::test]
async fn invariant_decoder_bijection_on_complete_products(pool: PgPool) {
	let store = Store::new(pool);
	let a = store.insert_node(node("A", None, 0)).await.unwrap().id;
	let a12 = store.insert_node(node("A12", Some(a), 0)).await.unwrap().id;
	let mut x = node("X", Some(a12), 0);
	x.full_typecode = Some("A A12-X".to_string());
	let x_id = store.insert_node(x).await.unwrap().id;

	let node_x = store.get_node(x_id).await.unwrap();
	let result = decode::decode(&store, node_x.full_typecode.as_deref().unwrap()).await.unwrap();
	assert!(result.is_complete_product);
	let decoded_codes: Vec<&str> = result.path_segments.iter().map(|s| s.code.as_str()).collect();
	assert_eq!(decoded_codes, vec!["A", "A12", "X"]);
}

#[sqlx::test]
async fn s4_partial_mismatch_reports_unknown(pool: PgPool) {
	let store = Store::new(pool);
	let a = store.insert_node(node("A", None, 0)).await.unwrap().id;
	store.insert_node(node("A12", Some(a), 0)).await.unwrap();

	let result = decode::decode(&store, "A A12-NOPE").await.unwrap();

	assert!(!result.exists);
	assert_eq!(result.product_type, decode::ProductType::Unknown);
}

#[sqlx::test]
async fn s5_wildcard_summarises_level2_codes(pool: PgPool) {
	let store = Store::new(pool);
	let bcc = store.insert_node(node("BCC", None, 0)).await.unwrap().id;
	let m313 = store.insert_node(node("M313", Some(bcc), 0)).await.unwrap().id;
	let g1 = store.insert_node(node("G1", Some(m313), 0)).await.unwrap().id;
	store.insert_node(node("G2", Some(m313), 1)).await.unwrap();
	store.insert_node(node("G3", Some(m313), 2)).await.unwrap();
	store.insert_node(node("OP123", Some(g1), 0)).await.unwrap();

	let result = decode::decode(&store, "BCC M313 * OP123").await.unwrap();

	assert!(result.exists);
	assert_eq!(result.product_type, decode::ProductType::WildcardSearch);
	assert_eq!(result.path_segments.len(), 4);
	assert_eq!(result.path_segments[2].code, "G1, G2, G3");
	assert_eq!(result.path_segments[3].code, "OP123");
}

#[sqlx::test]
async fn s6_constraint_allow_violation(pool: PgPool) {
	let store = Store::new(pool);
	store
		.create_constraint(Constraint {
			id: None,
			level: 3,
			mode: ConstraintMode::Allow,
			conditions: vec![ConstraintCondition {
				condition_type: ConditionType::Prefix,
				target_level: 1,
				value: "M".to_string(),
			}],
			codes: vec![ConstraintCode { code_type: CodeType::Range, code_value: "C010-C020".to_string() }],
		})
		.await
		.unwrap();

	let mut selection = BTreeMap::new();
	selection.insert(1, "M313".to_string());

	let invalid = validate::validate_code_against_constraints(&store, &selection, 3, "X999").await.unwrap();
	assert!(!invalid.is_valid);
	assert_eq!(invalid.violated_constraints.len(), 1);

	let valid = validate::validate_code_against_constraints(&store, &selection, 3, "C015").await.unwrap();
	assert!(valid.is_valid);
}

#[sqlx::test]
async fn s7_deep_copy_preserves_structure(pool: PgPool) {
	let store = Store::new(pool);
	let source = store.insert_node(node("SRC", None, 0)).await.unwrap().id;
	let child_a = store.insert_node(node("A", Some(source), 0)).await.unwrap().id;
	let child_b = store.insert_node(node("B", Some(source), 1)).await.unwrap().id;
	store.insert_node(node("A1", Some(child_a), 0)).await.unwrap();
	store.insert_node(node("A2", Some(child_a), 1)).await.unwrap();
	store.insert_node(node("B1", Some(child_b), 0)).await.unwrap();

	let new_parent = store.insert_node(node("DST", None, 1)).await.unwrap().id;

	let copied = admin_node::deep_copy(&store, source, new_parent).await.unwrap();
	assert_eq!(copied.len(), 5, "one copy per descendant of the source subtree");

	let new_children = store.children_of(new_parent).await.unwrap();
	let mut new_child_codes: Vec<&str> = new_children.iter().filter_map(|n| n.code.as_deref()).collect();
	new_child_codes.sort();
	assert_eq!(new_child_codes, vec!["A", "B"]);

	for child in &new_children {
		let grandchildren = store.children_of(child.id).await.unwrap();
		assert!(!grandchildren.is_empty(), "copied grandchildren must hang off the copied child, not the source's");
		for gc in &grandchildren {
			let ancestors = store.ancestors_of(gc.id, false).await.unwrap();
			assert_eq!(ancestors.last().unwrap().id, gc.id);
			assert!(ancestors.iter().any(|n| n.id == new_parent), "invariant I2: closure must reach the new parent");
			assert!(!ancestors.iter().any(|n| n.id == source), "the copy must not be reachable from the old source");
		}
	}
}

#[sqlx::test]
async fn s8_last_admin_guard(pool: PgPool) {
	use variant_core::admin::users;
	use variant_core::model::Role;

	let store = Store::new(pool);
	let admin_a = users::create_user(&store, "a", "password-a", Role::Admin, false).await.unwrap();
	let admin_b = users::create_user(&store, "b", "password-b", Role::Admin, false).await.unwrap();

	store.set_active(admin_b.id, false).await.unwrap();

	let result = store.set_active(admin_a.id, false).await;
	assert!(matches!(result, Err(variant_core::Error::Integrity(_))));

	let still_active = store.get_user(admin_a.id).await.unwrap();
	assert!(still_active.active, "the guarded mutation must not have partially applied");
}

/// Invariant 1: every path row for `n`'s ancestor chain exists exactly once,
/// and no extra rows name `n` as descendant.
#[sqlx::test]
async fn invariant_closure_completeness(pool: PgPool) {
	let store = Store::new(pool);
	let a = store.insert_node(node("A", None, 0)).await.unwrap().id;
	let b = store.insert_node(node("B", Some(a), 0)).await.unwrap().id;
	let c = store.insert_node(node("C", Some(b), 0)).await.unwrap().id;

	let rows: Vec<(i64, i32)> =
		sqlx::query_as("SELECT ancestor_id, depth FROM node_paths WHERE descendant_id = $1 ORDER BY depth")
			.bind(c)
			.fetch_all(store.pool())
			.await
			.unwrap();

	assert_eq!(rows, vec![(c, 0), (b, 1), (a, 2)]);
}
