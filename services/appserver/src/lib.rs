//! Warden application server library crate.
//!
//! # Purpose
//! Hosts the permission engine behind an HTTP API: boot-time route
//! registration, the per-request authorization middleware and the handlers
//! that consume the caller's authorization context.
//!
//! # Notes
//! The binary and the integration tests share these modules.
pub mod api;
pub mod app;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod observability;
pub mod routes;
