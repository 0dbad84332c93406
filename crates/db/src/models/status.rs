//! Lookup-table helpers.
//!
//! Review status IDs match the seed order of the `review_statuses` table and
//! the discriminants of [`karyakita_core::review::ReviewStatus`]; rows decode
//! straight into the domain enum through its `TryFrom<i16>` impl.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;
