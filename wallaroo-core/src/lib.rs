//! Wallaroo Client Core Library
//!
//! Exposes the configuration resources of a Wallaroo service (broker users,
//! roles, queues) as local proxy objects kept in sync over HTTP:
//! - Revision pinning (branch / tag / commit)
//! - Connection configuration and URL building
//! - Per-kind attribute schemas and generated accessors
//! - Resource proxies with exists / refresh / create / update
//! - A factory and registry mapping kind names to resource types

#[macro_use]
mod macros;

pub mod config;
pub mod connection;
pub mod error;
pub mod factory;
pub mod proxy;
pub mod resources;
pub mod revision;
pub mod schema;

pub use config::ConnectionOptions;
pub use connection::Connection;
pub use error::{Error, Result};
pub use factory::{ResourceFactory, ResourceRegistry, resource_path};
pub use proxy::{ProxyState, Resource, ResourceProxy, commit_from_location};
pub use resources::User;
pub use revision::{RevisionKind, RevisionSelector};
pub use schema::{AttributeDecl, AttributeSchema};

#[doc(hidden)]
pub mod __private {
    pub use paste::paste;
    pub use serde_json;
}
