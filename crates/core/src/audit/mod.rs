//! Audit trail: service lifecycle and per-request generation outcomes,
//! written asynchronously to SQLite.

mod events;
mod handle;
mod sqlite;
mod store;
mod writer;

pub use events::*;
pub use handle::*;
pub use sqlite::*;
pub use store::*;
pub use writer::*;
