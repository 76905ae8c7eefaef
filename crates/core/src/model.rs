//! The entities described in the specification's data model: nodes, closure
//! paths, label segments, constraints, successors, KMAT references and users.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type NodeId = i64;

/// A single entry in a node's `pictures` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Picture {
	pub url: String,
	pub description: Option<String>,
	pub timestamp: DateTime<Utc>,
}

/// A single entry in a node's `links` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
	pub url: String,
	pub title: Option<String>,
	pub description: Option<String>,
	pub timestamp: DateTime<Utc>,
}

/// A position in the variant forest.
///
/// Invariant: exactly one of `code` / `pattern` is `Some`. A pattern
/// container (`code = None, pattern = Some(_)`) is transparent to level
/// counting and to UI child listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
	pub id: NodeId,
	pub code: Option<String>,
	pub name: Option<String>,
	pub label: Option<String>,
	pub label_en: Option<String>,
	pub level: i32,
	pub position: i32,
	pub pattern: Option<i32>,
	pub group_name: Option<String>,
	pub full_typecode: Option<String>,
	pub is_intermediate_code: bool,
	pub pictures: Vec<Picture>,
	pub links: Vec<Link>,
	pub parent_id: Option<NodeId>,
}

impl Node {
	pub fn is_pattern_container(&self) -> bool {
		self.code.is_none() && self.pattern.is_some()
	}
}

/// A precomputed `(ancestor, descendant, depth)` closure-table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosurePath {
	pub ancestor_id: NodeId,
	pub descendant_id: NodeId,
	pub depth: i32,
}

/// A structured sub-part of a node's label, parsed once at import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSegment {
	pub id: Option<i64>,
	pub node_id: NodeId,
	pub title: Option<String>,
	pub code_segment: Option<String>,
	pub position_start: Option<i32>,
	pub position_end: Option<i32>,
	pub label_de: Option<String>,
	pub label_en: Option<String>,
	pub display_order: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintMode {
	Allow,
	Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
	Pattern,
	Prefix,
	ExactCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeType {
	Single,
	Range,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintCondition {
	pub condition_type: ConditionType,
	pub target_level: i32,
	pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintCode {
	pub code_type: CodeType,
	pub code_value: String,
}

/// A rule: a constraint fires iff every condition matches the selection;
/// a fired `allow` constraint is violated by codes outside `codes`, a fired
/// `deny` constraint is violated by codes inside `codes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
	pub id: Option<i64>,
	pub level: i32,
	pub mode: ConstraintMode,
	pub conditions: Vec<ConstraintCondition>,
	pub codes: Vec<ConstraintCode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
	Info,
	Warning,
	Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Successor {
	pub id: Option<i64>,
	pub source_node_id: Option<NodeId>,
	pub source_full_typecode: Option<String>,
	pub target_node_id: Option<NodeId>,
	pub target_full_typecode: Option<String>,
	pub replacement_type: String,
	pub severity: Severity,
	pub effective_date: Option<chrono::NaiveDate>,
	pub show_warning: bool,
	pub migration_notes: Option<String>,
}

/// A bound label for an exact configured path. Unique on `(family_id, path_node_ids)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KmatReference {
	pub id: Option<i64>,
	pub family_id: NodeId,
	pub path_node_ids: Vec<NodeId>,
	pub full_typecode: String,
	pub kmat_reference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	Admin,
	User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
	pub id: i64,
	pub username: String,
	#[serde(skip_serializing)]
	pub password_hash: String,
	pub role: Role,
	pub active: bool,
	pub must_change_password: bool,
}
