//! Pluggable audit storage.
//!
//! Named, typed storage descriptors backed by:
//! - the bastion's own database
//! - an Elasticsearch-compatible search engine
//! - S3-like object stores
//! - a null sink (logging disabled)
//!
//! Around them: health probes, exact counts, the storage tree and the
//! deletion policy.

pub mod backend;
pub mod backends;
pub mod config;
pub mod count;
pub mod descriptor;
pub mod filter;
pub mod guard;
pub mod probe;
pub mod record;
pub mod registry;
pub mod service;
pub mod store;
pub mod tree;
pub mod validity;

pub use backend::{ResultWindow, StorageBackend};
pub use count::CountStrategy;
pub use descriptor::{BackendDescriptor, BackendKind, BackendType, DescriptorId, StorageFamily};
pub use filter::{CommandFilter, FilterParams};
pub use guard::{DeleteOutcome, DeletionGuard, RefusalReason, StorageAssignments, UsageLookup};
pub use probe::{ConnectivityProbe, ConnectivityReport};
pub use record::CommandRecord;
pub use registry::BackendRegistry;
pub use service::StorageService;
pub use store::DescriptorStore;
pub use tree::{TreeBuilder, TreeNode};
pub use validity::ValidityChecker;
