//! Core data models for the file-sharing gateway.
//!
//! The gateway owns no durable state; these types describe what the bucket
//! listing reports and what the HTTP responses serialize via `serde`.

pub mod object;
