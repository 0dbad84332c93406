//! Shared pagination rules for list endpoints.

/// Default page size for project listings.
pub const DEFAULT_LIMIT: i64 = 20;

/// Largest page a client may request.
pub const MAX_LIMIT: i64 = 100;

/// `limit` defaulted and clamped to `1..=max`.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

/// `offset` defaulted to zero; negative values become zero.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
