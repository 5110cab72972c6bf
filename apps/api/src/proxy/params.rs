//! Canonicalization of request parameters for cache keys and diagnostics.
//!
//! Operations describe their parameters as an ordered list of named fields
//! where a `None` value means "not supplied by the caller". The same list
//! feeds two consumers with different rules:
//!
//! - the outbound query string ([`query_pairs`]) omits absent fields, and
//! - the cache key ([`cache_key`]) includes every named field with absent
//!   values coerced to the empty string, sorted byte-wise by name so the key
//!   is identical no matter how the caller assembled the set.

/// A named parameter set for one upstream operation.
pub type ParamSet = Vec<(&'static str, Option<String>)>;

/// Derives the cache key for `(operation, params)`.
///
/// Shape: `operation:name1=value1&name2=value2&...` with names sorted
/// lexicographically. Total over any finite parameter set; identical values
/// under any insertion order produce identical keys, and any changed value
/// produces a different key.
pub fn cache_key(operation: &str, params: &[(&'static str, Option<String>)]) -> String {
    let mut fields: Vec<(&str, &str)> = params
        .iter()
        .map(|(name, value)| (*name, value.as_deref().unwrap_or("")))
        .collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    let joined = fields
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    format!("{operation}:{joined}")
}

/// Converts a parameter set into the query pairs actually sent upstream.
/// Absent fields are dropped rather than sent as empty strings.
pub fn query_pairs(params: &[(&'static str, Option<String>)]) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| ((*name).to_string(), v.clone())))
        .collect()
}
