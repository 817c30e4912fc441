//! # Legacy Field Shim
//!
//! Some upstream credential issuers hand over subject fields already
//! flattened into `key=value` text, e.g.
//!
//! ```text
//! fn  = "[{language=eng, value=Juan}]"
//! dob = "Date of Birth 1990/01/15"
//! BF  = "[{rank=1, subType=Left Thumb}, {rank=2, subType=Right Index}]"
//! ```
//!
//! These helpers undo exactly those patterns and nothing else. They are a
//! compatibility layer: a well-typed record never needs them, and each one
//! is a no-op on input that does not carry its pattern.

/// Prefix of a flattened English localized value.
pub const LANGUAGE_WRAPPER_PREFIX: &str = "[{language=eng, value=";

/// Suffix of a flattened localized value.
pub const LANGUAGE_WRAPPER_SUFFIX: &str = "}]";

/// Label some issuers prepend to the date of birth.
pub const DATE_LABEL: &str = "Date of Birth ";

/// Remove every occurrence of the English localized-value wrapper.
pub fn strip_language_wrapper(raw: &str) -> String {
    raw.replace(LANGUAGE_WRAPPER_PREFIX, "")
        .replace(LANGUAGE_WRAPPER_SUFFIX, "")
}

/// Remove the `"Date of Birth "` label.
pub fn strip_date_label(raw: &str) -> String {
    raw.replace(DATE_LABEL, "")
}

/// Normalize date separators: `1990/01/15` → `1990-01-15`.
pub fn normalize_date_separators(raw: &str) -> String {
    raw.replace('/', "-")
}

/// Extract the two finger ranks from a flattened best-two-fingers list.
///
/// `"[{rank=1, subType=Left Thumb}, {rank=2, subType=Right Index}]"` yields
/// `"[1,2]"`. The first rank runs from the first `{rank=` to the first
/// `, subType`; the second from the first `, {rank=` to the next
/// `, subType`. Returns `None` when either marker is missing.
pub fn extract_rank_pair(raw: &str) -> Option<String> {
    const RANK: &str = "{rank=";
    const NEXT_RANK: &str = ", {rank=";
    const SUBTYPE: &str = ", subType";

    let first_start = raw.find(RANK)? + RANK.len();
    let first_end = raw.find(SUBTYPE)?;
    let first = raw.get(first_start..first_end)?;

    let rest = &raw[raw.find(NEXT_RANK)? + NEXT_RANK.len()..];
    let second = &rest[..rest.find(SUBTYPE)?];

    Some(format!("[{first},{second}]"))
}
