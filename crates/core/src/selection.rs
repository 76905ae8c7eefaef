//! The `Selection` type consumed by the compatibility engine and the
//! derived-group inference.
//!
//! An absent or empty `ids` set means "unspecified": the engine ignores that
//! selection rather than trying to back-fill ids from `code`. This is a
//! deliberate contract carried over from the source prototype (there is no
//! fallback code-to-id lookup).
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::NodeId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
	pub level: i32,
	pub code: String,
	#[serde(default)]
	pub ids: BTreeSet<NodeId>,
}

impl Selection {
	pub fn new(level: i32, code: impl Into<String>, ids: BTreeSet<NodeId>) -> Self {
		Self {
			level,
			code: code.into(),
			ids,
		}
	}

	/// A selection is usable by the engines only when it carries at least one id.
	pub fn is_usable(&self) -> bool {
		!self.ids.is_empty()
	}
}

/// Find the mandatory level-0 (family) selection among a selection set.
pub fn family_selection(selections: &[Selection]) -> Option<&Selection> {
	selections.iter().find(|s| s.level == 0)
}
