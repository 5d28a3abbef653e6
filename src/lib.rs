//! # bastion-audit
//!
//! Session-audit storage for a bastion host:
//! - **storage**: named storage descriptors over pluggable backends (local
//!   database, search engine, object stores, null sink), with health probes,
//!   exact counts, the storage tree and a deletion guard
//! - **relation**: bulk attach of assets, nodes and users to credential
//!   profiles with one change event per profile
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bastion_audit::config::ServiceConfig;
//! use bastion_audit::core::Scope;
//! use bastion_audit::storage::{
//!     BackendRegistry, DeletionGuard, DescriptorStore, FilterParams, StorageFamily,
//!     StorageService,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> bastion_audit::Result<()> {
//!     let config = ServiceConfig::default();
//!     let service = StorageService::new(
//!         Arc::new(DescriptorStore::with_system_defaults()?),
//!         Arc::new(BackendRegistry::with_builtin()),
//!         DeletionGuard::new(),
//!         &config.probe,
//!     );
//!     let tree = service
//!         .tree(&Scope::Root, StorageFamily::Command, &FilterParams::new())
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&tree)?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod monitoring;
pub mod relation;
pub mod storage;

#[cfg(feature = "python")]
pub mod python;

pub use core::error::{Error, Result};
