//! Storage backend implementations.
//!
//! Four built-in backends:
//! - Local (the bastion's own database)
//! - Null (logging disabled)
//! - Elasticsearch-compatible search engine
//! - Object stores (S3 and friends)

pub mod elasticsearch;
pub mod local;
pub mod null;
pub mod object_store;

pub use elasticsearch::ElasticsearchBackend;
pub use local::LocalBackend;
pub use null::NullBackend;
pub use object_store::ObjectStoreBackend;
