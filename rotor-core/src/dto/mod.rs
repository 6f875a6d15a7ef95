//! Data Transfer Objects exchanged with external services
//!
//! DTOs are the raw shapes the service clients hand to the core. The catalog
//! validates them into domain types.

pub mod pipeline;
