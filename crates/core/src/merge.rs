//! Metadata union rules (spec §4.4 step 6), shared by the compatibility
//! engine and the decoder's ambiguous-segment handling.
use std::collections::BTreeSet;

use crate::cnf;
use crate::model::{Link, Node, Picture};

/// Sorted, deduplicated join — used for label/label_en union.
pub fn union_sorted<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
	let mut vals: Vec<&str> = values.collect();
	vals.sort_unstable();
	vals.dedup();
	if vals.is_empty() {
		None
	} else {
		Some(vals.join(cnf::LABEL_UNION_SEPARATOR))
	}
}

/// First-seen-order, deduplicated join — used for name/group_name union.
pub fn union_first_seen<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
	let mut seen = BTreeSet::new();
	let mut out = Vec::new();
	for v in values {
		if seen.insert(v) {
			out.push(v);
		}
	}
	if out.is_empty() {
		None
	} else {
		Some(out.join(cnf::NAME_UNION_SEPARATOR))
	}
}

/// Pictures deduplicated by `url`, preserving first-seen order.
pub fn union_pictures<'a>(nodes: impl Iterator<Item = &'a Node>) -> Vec<Picture> {
	let mut seen = BTreeSet::new();
	let mut out = Vec::new();
	for n in nodes {
		for p in &n.pictures {
			if seen.insert(p.url.clone()) {
				out.push(p.clone());
			}
		}
	}
	out
}

/// Links deduplicated by `url`, preserving first-seen order.
pub fn union_links<'a>(nodes: impl Iterator<Item = &'a Node>) -> Vec<Link> {
	let mut seen = BTreeSet::new();
	let mut out = Vec::new();
	for n in nodes {
		for l in &n.links {
			if seen.insert(l.url.clone()) {
				out.push(l.clone());
			}
		}
	}
	out
}
