//! Dispatch - the request orchestrator.
//!
//! ```text
//! prompt, mode ──► PromptRouter ──► RoutingDecision
//!                                        │
//!                       ┌────────────────┴───────────────┐
//!                       ▼                                ▼
//!                  TextAdapter                      ImageAdapter
//!            (errors are fatal)            (primary ─► fallback, total)
//!                       │                                │
//!                       └──────────────► Dispatched ◄────┘
//!                                          │
//!                                   ResponseEnvelope
//! ```

mod dispatcher;
mod error;
mod types;

pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use types::{Dispatched, ResponseEnvelope, ResponseMeta};
