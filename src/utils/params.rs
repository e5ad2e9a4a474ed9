//! Lenient parsing for query strings and loosely typed JSON bodies.
//!
//! Clients send `?page=2.7`, `{"count": "10"}` and friends. Anything numeric
//! is floored; anything else counts as absent.

use serde_json::Value as JsonValue;

/// Parses a decimal string and floors it. `None` for blanks, garbage and non-finite values.
pub fn parse_floor(raw: Option<&str>) -> Option<i64> {
    let value: f64 = raw?.trim().parse().ok()?;
    floor_finite(value)
}

/// Same as [`parse_floor`] for a JSON value that may be a number or a numeric string.
pub fn json_floor(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => floor_finite(n.as_f64()?),
        JsonValue::String(s) => parse_floor(Some(s)),
        _ => None,
    }
}

fn floor_finite(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let floored = value.floor();
    if floored > i64::MAX as f64 || floored < i64::MIN as f64 {
        return None;
    }
    Some(floored as i64)
}

/// Decodes a JSON body, treating an empty or malformed body as `T::default()`.
pub fn lenient_json<T>(body: &[u8]) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    serde_json::from_slice(body).unwrap_or_default()
}

/// A resolved page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Missing or non-positive limits fall back to `default_limit`; larger ones are capped.
    /// Pages below 1 become 1.
    pub fn from_raw(
        page: Option<&str>,
        limit: Option<&str>,
        default_limit: i64,
        max_limit: i64,
    ) -> Self {
        let limit = match parse_floor(limit) {
            Some(l) if l > 0 => l.min(max_limit),
            _ => default_limit,
        };
        let page = parse_floor(page).unwrap_or(1).max(1);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// `ceil(total / limit)`, never less than 1.
pub fn page_count(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 1;
    }
    ((total + limit - 1) / limit).max(1)
}
