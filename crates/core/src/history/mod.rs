//! Per-user chat sessions and the exchanges recorded in them.

mod sqlite;
mod store;
mod types;

pub use sqlite::*;
pub use store::*;
pub use types::*;
