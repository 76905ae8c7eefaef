//! Wires the constraint engine's pure evaluation to the Store's persisted
//! rules, for the admin "validate code against constraints" operation.
use std::collections::BTreeMap;

use crate::constraint_engine::{self, ValidationResult};
use crate::err::Result;
use crate::store::Store;

pub async fn validate_code_against_constraints(
	store: &Store,
	selection: &BTreeMap<i32, String>,
	target_level: i32,
	candidate_code: &str,
) -> Result<ValidationResult> {
	let constraints = store.constraints_at_level(target_level).await?;
	Ok(constraint_engine::validate_code(&constraints, selection, target_level, candidate_code))
}
