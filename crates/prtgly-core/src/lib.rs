//! Reconciliation engine between the PRTG API and the `prtgly` CLI.
//!
//! This crate owns the domain model and the rule-driven configuration
//! logic:
//!
//! - **[`EntityStore`]**: In-process cache of groups, devices and sensors,
//!   partitioned by [`ContentType`], with dirty tracking. Populated from
//!   the network ([`Controller`]) or a bulk CSV file ([`import`]).
//!
//! - **[`Rule`]**: Declarative property rules loaded from YAML. Each rule
//!   carries typed [`MatchCriteria`] (exact / prefix / glob) and the single
//!   property it sets.
//!
//! - **[`ValueReconciler`]**: Computes a property's new value, merging
//!   list-typed properties with what the parent entity already supplies.
//!
//! - **[`ChangeSetBuilder`]**: Runs every rule over every entity, writes
//!   the intended values back into the store, and yields one
//!   [`Query`] per changed `(object, property)` pair.
//!
//! - **[`Session`]**: Orchestrates a single run: load, preview, apply
//!   through a [`RemoteClient`].

pub mod changeset;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod import;
pub mod model;
pub mod reconcile;
pub mod remote;
pub mod rules;
pub mod session;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use changeset::{ChangeSet, ChangeSetBuilder, PropertyChange, Query};
pub use config::{AuthCredentials, ControllerConfig, EngineConfig, TlsVerification};
pub use controller::Controller;
pub use error::CoreError;
pub use reconcile::ValueReconciler;
pub use remote::{RemoteClient, StatusReport};
pub use rules::{MatchCriteria, MatchKind, Rule, load_rules, parse_rules};
pub use session::{ApplyFailure, ApplyReport, RunState, Session, Source};
pub use store::{EntityStore, NotFoundError};

pub use model::{ContentSelector, ContentType, Entity, ObjectId, PropertySchema, PropertyValue};
