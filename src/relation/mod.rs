//! Credential profile relations.
//!
//! Bulk attach of assets, nodes and users to credential profiles, with
//! change notification aggregated per profile.

pub mod aggregator;
pub mod event;
pub mod row;
pub mod service;
pub mod store;
pub mod subscriber;

pub use aggregator::RelationChangeAggregator;
pub use event::{ChangeAction, ChangeEvent};
pub use row::{ChildKind, ChildObject, CredentialProfile, NewRelation, RelationFamily, RelationRow};
pub use service::{AttachOutcome, RelationService};
pub use store::{RelationStore, RelationView};
pub use subscriber::{DispatchReport, Subscriber, SubscriberRegistry};
