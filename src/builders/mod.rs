//! Constructors turning raw column values into normalized entities.
//!
//! Every builder marks its entity as [`DeletedState::Intact`](crate::types::DeletedState)
//! and leaves optional fields unset when the source column is null.
pub mod account;
pub mod message;
pub mod party;

pub use account::{build_account, AccountParts};
pub use message::{build_message, MessageParts};
pub use party::build_party;
