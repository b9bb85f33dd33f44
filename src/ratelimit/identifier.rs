//! Classification of caller-supplied rate-limit identifiers.
//!
//! A caller may pass either a bare model name (`gpt-4o-mini`) or a full or
//! partial rate-limit id (`rl-gpt-4o-mini`, `rl-gpt-4o-mini-a1b2c3`). The
//! platform appends an opaque per-project suffix to some ids; the heuristic in
//! [`looks_like_project_suffix`] lets callers omit it.

pub const RATE_LIMIT_ID_PREFIX: &str = "rl-";

/// Longest segment still treated as an opaque project suffix.
pub const MAX_SUFFIX_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentifier {
    pub search_key: String,
    // may be empty
    pub derived_model: String,
}

// Any non-empty segment of at most eight characters qualifies, so `rl-gpt-4`
// is read as model `gpt` plus a suffix. Callers rely on this exact rule.
pub fn looks_like_project_suffix(segment: &str) -> bool {
    !segment.is_empty() && segment.len() <= MAX_SUFFIX_LEN
}

pub fn resolve_identifier(raw: &str) -> ResolvedIdentifier {
    let Some(rest) = raw.strip_prefix(RATE_LIMIT_ID_PREFIX) else {
        return ResolvedIdentifier {
            search_key: format!("{}{}", RATE_LIMIT_ID_PREFIX, raw),
            derived_model: raw.to_string(),
        };
    };

    // A lone short segment counts as a suffix too, leaving no model to match on.
    let segments: Vec<&str> = rest.split('-').collect();
    let derived_model = match segments.split_last() {
        Some((last, head)) if looks_like_project_suffix(last) => head.join("-"),
        _ => rest.to_string(),
    };

    ResolvedIdentifier {
        search_key: raw.to_string(),
        derived_model,
    }
}
