//! Caller identity and per-request authorization.
//!
//! # Purpose
//! Groups bearer-token identity resolution and the middleware that asks the
//! permission engine for a decision before any handler runs.
pub mod middleware;
pub mod principal;
