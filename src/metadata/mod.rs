//! # Metadata Registry
//!
//! Declarative annotations are recorded here, keyed by `(owner type, key)`, and read
//! back when the server resolves controllers and when the validator walks a model.
//!
//! ## Keys
//!
//! | Key | Payload | Declared by |
//! |-----|---------|-------------|
//! | `controller` | [`ControllerOptions`](crate::controller::ControllerOptions) | [`MetadataRegistry::controller`] |
//! | `endpoint:<member>:<VERB>` | [`EndpointOptions`](crate::controller::EndpointOptions) | [`ControllerRegistration::endpoint`] |
//! | `rule:<kind>:<field>` | [`Rule`](crate::rules::Rule) | [`ModelRegistration::rule`] |
//! | `nested:<field>` | nested model [`OwnerType`] | [`ModelRegistration::nested`] |
//!
//! ## Lifecycle
//!
//! Definitions happen at startup. A registry is either built explicitly and handed
//! to [`ApiServer::with_registry`](crate::server::ApiServer::with_registry), or
//! populated through [`register_global`] and read with [`global`]. Readers hold an
//! `Arc` snapshot, so request handling never takes a lock.

mod builder;
mod core;
mod global;

pub use builder::{ControllerRegistration, ModelRegistration};
pub use core::{MetadataEntry, MetadataKey, MetadataPayload, MetadataRegistry, OwnerType};
pub use global::{global, register_global};
