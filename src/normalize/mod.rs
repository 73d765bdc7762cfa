//! Field-level normalization shared by the entity builders.
pub mod address;
pub mod timestamp;

pub use address::{canonical_address, display_name};
pub use timestamp::{from_unix_millis, parse_entry_date, TimestampGuard, TimestampPolicy};
