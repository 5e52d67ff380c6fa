//! # cosmea-shared
//!
//! Types shared by every Cosmea crate: identifier newtypes, collection and
//! preference-key constants, and credential hashing.

pub mod constants;
pub mod crypto;
pub mod error;
pub mod types;

pub use error::CryptoError;
pub use types::{ChannelId, ServerId, UserId};
