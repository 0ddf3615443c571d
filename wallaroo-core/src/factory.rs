//! Resource factory and kind registry
//!
//! Maps a kind name such as `user` to the schema of the type registered as
//! `User`, and builds proxies at `/<kind>s/<name>`.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::proxy::{Resource, ResourceProxy};
use crate::resources::User;
use crate::schema::{AttributeSchema, collection_for, type_name_for};

/// Resource kinds known to a connection, keyed by type name
#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    kinds: BTreeMap<String, &'static AttributeSchema>,
}

impl Default for ResourceRegistry {
    /// Registry holding the built-in kinds.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.insert(User::schema());
        registry
    }
}

impl ResourceRegistry {
    /// Registry with no kinds at all.
    pub fn empty() -> Self {
        Self {
            kinds: BTreeMap::new(),
        }
    }

    /// Register a resource type under the type name of its kind.
    pub fn register<T: Resource>(&mut self) -> Result<()> {
        self.register_schema(T::schema())
    }

    /// Register a schema. Registering the same schema again is a no-op;
    /// a different schema under an existing type name is rejected.
    pub fn register_schema(&mut self, schema: &'static AttributeSchema) -> Result<()> {
        let type_name = type_name_for(schema.kind());
        match self.kinds.get(&type_name) {
            Some(existing) if std::ptr::eq(*existing, schema) => Ok(()),
            Some(_) => Err(Error::Configuration(format!(
                "resource kind {} already registered",
                type_name
            ))),
            None => {
                self.kinds.insert(type_name, schema);
                Ok(())
            }
        }
    }

    fn insert(&mut self, schema: &'static AttributeSchema) {
        self.kinds.insert(type_name_for(schema.kind()), schema);
    }

    /// Schema registered for `kind` (`user`, `User` and `USER` all match).
    pub fn lookup(&self, kind: &str) -> Option<&'static AttributeSchema> {
        self.kinds.get(&type_name_for(kind)).copied()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        self.kinds.keys().map(|s| s.as_str()).collect()
    }
}

/// Builds proxies bound to a connection
pub struct ResourceFactory;

impl ResourceFactory {
    /// Proxy for `name` of the kind registered under `kind`.
    ///
    /// The `name` attribute is seeded when the kind declares one.
    pub fn make(connection: &Arc<Connection>, kind: &str, name: &str) -> Result<ResourceProxy> {
        let schema = connection.registry().lookup(kind).ok_or_else(|| {
            Error::Configuration(format!("unknown resource kind '{}'", kind))
        })?;
        Self::bind(connection, schema, kind, name)
    }

    /// Typed proxy for `name`, whether or not `T` is registered.
    pub fn make_typed<T: Resource>(connection: &Arc<Connection>, name: &str) -> Result<T> {
        let schema = T::schema();
        let proxy = Self::bind(connection, schema, schema.kind(), name)?;
        Ok(T::from_proxy(proxy))
    }

    fn bind(
        connection: &Arc<Connection>,
        schema: &'static AttributeSchema,
        kind: &str,
        name: &str,
    ) -> Result<ResourceProxy> {
        let mut proxy = ResourceProxy::new(resource_path(kind, name)?, connection.clone(), schema);
        if let Some(decl) = schema.get("name") {
            proxy.seed(decl.name, name.into());
        }
        Ok(proxy)
    }
}

/// `/<kind>s/<name>`, e.g. `/users/alice`.
pub fn resource_path(kind: &str, name: &str) -> Result<String> {
    if name.is_empty() || name.contains('/') {
        return Err(Error::Configuration(format!(
            "invalid resource name '{}' for kind {}",
            name, kind
        )));
    }
    Ok(format!("/{}/{}", collection_for(kind), name))
}
