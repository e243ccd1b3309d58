//! Structured errors for the Trellis container
//!
//! Every failure the container reports is a [`CoreError`]: a kind, a stable
//! `PREFIX_CODE` string, a human message, optional details and an optional
//! serializable cause chain.

pub mod cause;
pub mod core;

pub use cause::ErrorCause;
pub use core::{CoreError, CoreResult, ErrorKind};
