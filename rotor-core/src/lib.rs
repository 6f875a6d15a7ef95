//! Rotor Core
//!
//! Reconciliation engine for rotating build-service webhook secrets and
//! propagating them to GitHub hook registrations.
//!
//! This crate contains:
//! - Domain types: pipelines, repositories, hooks
//! - DTOs: raw records handed over by service clients
//! - Token extraction and the table of known delivery URL formats
//! - Catalog, hook discovery and the token correspondence map
//! - The rotation orchestrator and its per-pipeline state machine
//!
//! HTTP clients live in `rotor-client`; nothing here performs I/O except
//! through the traits in [`service`].

pub mod catalog;
pub mod correspondence;
pub mod discovery;
pub mod domain;
pub mod dto;
pub mod error;
pub mod orchestrator;
pub mod service;
pub mod token;

#[cfg(test)]
mod testing;

pub use catalog::PipelineCatalog;
pub use correspondence::CorrespondenceMap;
pub use error::{PartialPropagation, Result, RotorError};
pub use orchestrator::{Orchestrator, Reporter, RotationEvent, RotationOptions, RunSummary};
pub use service::{BuildService, Confirmation, HostingService, ServiceContext, ServiceError};
pub use token::{WebhookHosts, WebhookToken, extract_token};
