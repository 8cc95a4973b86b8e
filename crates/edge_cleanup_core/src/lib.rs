//! Shared edge-cleanup domain primitives.
//!
//! This crate owns deterministic teardown behavior: version identity and
//! classification, the cleanup request/report contracts, and the deployment
//! context document. It intentionally excludes AWS SDK and CLI concerns.

pub mod arn;
pub mod context;
pub mod contract;
