//! HTTP service exposing the prompt router.
//!
//! The binary (`nexus`) wires configuration, adapters and storage together;
//! this library target holds everything else so tests can drive the router
//! in-process.

pub mod api;
pub mod metrics;
pub mod state;
