//! Trellis Core - Foundation types for the Trellis component container
//!
//! This crate provides the structured error taxonomy shared by every Trellis
//! crate: stable machine-readable codes, HTTP-ish status codes, opaque detail
//! maps, serializable cause chains, and a lossless JSON wire format.

pub mod error;

pub use error::{CoreError, CoreResult, ErrorCause, ErrorKind};
