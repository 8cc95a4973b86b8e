//! AWS-facing adapters and handlers for edge function decommissioning.
//!
//! This crate owns the gateway seams to the content-delivery and function
//! services, the detach/reap/orchestrate handlers built on those seams, and
//! the `edge-cleanup` binary that wires real SDK clients into them.

pub mod adapters;
pub mod handlers;
