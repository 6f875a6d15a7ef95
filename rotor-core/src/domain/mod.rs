//! Core domain types
//!
//! Pipelines live on the build service, repositories and their hooks on the
//! hosting service. Nothing links the two except the webhook token.

pub mod hook;
pub mod pipeline;
pub mod repository;
