//! Engine-wide tunables. Anything that varies per-deployment but isn't secret
//! lives here, in the style of the teacher's `cnf` module: plain constants for
//! values that never change, `once_cell::sync::Lazy` for values read from the
//! environment.
use once_cell::sync::Lazy;

/// How many distinct codes a wildcard segment (§4.5) will list before
/// collapsing the remainder into a `+N more` suffix.
pub const WILDCARD_SUMMARY_LIMIT: usize = 10;

/// Above this many codes, a two-character range expansion (§4.6) falls back
/// to `{start, end}` only, per the documented limitation.
pub const RANGE_EXPANSION_LIMIT: usize = 1000;

/// The character used to separate concatenated labels when multiple ids in
/// an `AvailableOption` group disagree (§4.4 step 6).
pub const LABEL_UNION_SEPARATOR: &str = "\n---\n";

/// The separator used to join concatenated names/group_names (§4.4 step 6).
pub const NAME_UNION_SEPARATOR: &str = ", ";

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
	std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Maximum number of rows a single admin bulk-update may touch before it is
/// rejected as too broad; guards against accidental whole-table rewrites.
pub static MAX_BULK_UPDATE_ROWS: Lazy<usize> =
	Lazy::new(|| env_parse("VARIANT_MAX_BULK_UPDATE_ROWS", 10_000usize));

/// Maximum depth the deep-copy operation (§4.9) will walk before it is
/// rejected, to bound a single transaction's size.
pub static MAX_DEEPCOPY_DEPTH: Lazy<u32> = Lazy::new(|| env_parse("VARIANT_MAX_DEEPCOPY_DEPTH", 64u32));
