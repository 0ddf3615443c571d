//! Resource proxies
//!
//! A [`ResourceProxy`] is a local handle on one remote resource. It keeps an
//! attribute cache, talks to the service through its [`Connection`], and
//! moves the connection's revision pin forward after successful writes.
//!
//! Concrete resource types wrap a proxy and implement [`Resource`]; the
//! [`resource!`](crate::resource) macro generates both plus typed accessors.

use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::Response;
use reqwest::header::LOCATION;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::connection::{Connection, remote_error};
use crate::error::{Error, Result};
use crate::schema::AttributeSchema;

lazy_static::lazy_static! {
    static ref COMMIT_PATTERN: regex::Regex = {
        regex::Regex::new(r"commit=([0-9a-f]+)").expect("commit pattern is valid")
    };
}

/// Extract the commit id from a `location` header such as
/// `/users/alice?commit=deadbeef`.
pub fn commit_from_location(location: &str) -> Option<&str> {
    COMMIT_PATTERN
        .captures(location)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Where a proxy's cache came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    /// Nothing fetched or assigned yet
    Unbound,
    /// Cache holds the last successful refresh
    Cached,
    /// Cache holds local assignments not yet written
    Dirty,
    /// Cache was last written to the service successfully
    Persisted,
}

/// Local handle on one remote resource.
#[derive(Debug, Clone)]
pub struct ResourceProxy {
    path: String,
    connection: Arc<Connection>,
    schema: &'static AttributeSchema,
    attributes: Map<String, Value>,
    url: Option<(u64, Url)>,
    state: ProxyState,
}

impl ResourceProxy {
    pub fn new(path: impl Into<String>, connection: Arc<Connection>, schema: &'static AttributeSchema) -> Self {
        Self {
            path: path.into(),
            connection,
            schema,
            attributes: Map::new(),
            url: None,
            state: ProxyState::Unbound,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn schema(&self) -> &'static AttributeSchema {
        self.schema
    }

    pub fn kind(&self) -> &'static str {
        self.schema.kind()
    }

    pub fn state(&self) -> ProxyState {
        self.state
    }

    /// The attribute cache.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Cached value of a declared attribute.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Assign a declared, writable attribute. Does not touch the network.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let schema = self.schema;
        let decl = schema.get(name).ok_or_else(|| Error::UnknownAttribute {
            kind: schema.kind(),
            name: name.to_string(),
        })?;
        if decl.read_only {
            return Err(Error::ReadOnlyAttribute {
                kind: schema.kind(),
                name: name.to_string(),
            });
        }
        self.store_declared(decl.name, value.into());
        Ok(self)
    }

    /// Remove an attribute from the cache.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        let old = self.attributes.remove(name);
        if old.is_some() {
            self.state = ProxyState::Dirty;
        }
        old
    }

    /// Store a value the caller already knows to be declared and writable.
    #[doc(hidden)]
    pub fn store_declared(&mut self, name: &'static str, value: Value) {
        debug_assert!(self.schema.contains(name), "{} is not declared", name);
        self.attributes.insert(name.to_string(), value);
        self.state = ProxyState::Dirty;
    }

    /// Prime the cache at construction without leaving the Unbound state.
    pub(crate) fn seed(&mut self, name: &'static str, value: Value) {
        self.attributes.insert(name.to_string(), value);
    }

    /// URL for the current revision pin, rebuilt whenever the pin moves.
    pub fn url(&mut self) -> Url {
        let generation = self.connection.revision_generation();
        if let Some((built_at, url)) = &self.url {
            if *built_at == generation {
                return url.clone();
            }
        }
        let (url, built_at) = self.connection.pinned_url(&self.path);
        self.url = Some((built_at, url.clone()));
        url
    }

    /// Existence probe: false only when the service answers 404.
    pub fn exists(&mut self) -> Result<bool> {
        let url = self.url();
        let response = self.connection.get(&url)?;
        Ok(response.status() != StatusCode::NOT_FOUND)
    }

    /// Replace the cache with the service's view of this resource.
    ///
    /// Only declared attributes are copied; declared attributes missing from
    /// the response end up unset. On any failure the cache is untouched.
    pub fn refresh(&mut self) -> Result<&mut Self> {
        let url = self.url();
        let response = self.connection.get(&url)?;
        if response.status() != StatusCode::OK {
            return Err(remote_error(response));
        }
        let record: Map<String, Value> = serde_json::from_str(&response.text()?)?;

        let mut fresh = Map::new();
        for name in self.schema.names() {
            match record.get(name) {
                Some(Value::Null) | None => {}
                Some(value) => {
                    fresh.insert(name.to_string(), value.clone());
                }
            }
        }
        self.attributes = fresh;
        self.state = ProxyState::Cached;
        Ok(self)
    }

    /// Write the whole cache to a resource that does not exist yet.
    pub fn create(&mut self) -> Result<&mut Self> {
        self.write()?;
        Ok(self)
    }

    /// Write the whole cache to an existing resource.
    pub fn update(&mut self) -> Result<&mut Self> {
        if self.state == ProxyState::Unbound {
            tracing::debug!("updating {} without a prior refresh or assignment", self.path);
        }
        self.write()?;
        Ok(self)
    }

    fn write(&mut self) -> Result<()> {
        let url = self.url();
        let response = self.connection.put_json(&url, &self.attributes)?;
        if !response.status().is_success() {
            return Err(remote_error(response));
        }
        self.follow_location(&response);
        self.url = None;
        self.state = ProxyState::Persisted;
        Ok(())
    }

    fn follow_location(&self, response: &Response) {
        let Some(location) = response.headers().get(LOCATION).and_then(|v| v.to_str().ok()) else {
            tracing::debug!("write to {} returned no location", self.path);
            return;
        };
        tracing::debug!("write to {} returned location {}", self.path, location);
        if let Some(commit) = commit_from_location(location) {
            self.connection.advance_revision(commit);
        }
    }
}

/// A resource type composed with the shared proxy engine.
///
/// Implementations are normally generated by [`resource!`](crate::resource).
pub trait Resource: Sized {
    /// Attribute declarations shared by every instance of this type.
    fn schema() -> &'static AttributeSchema;

    fn from_proxy(proxy: ResourceProxy) -> Self;

    fn proxy(&self) -> &ResourceProxy;

    fn proxy_mut(&mut self) -> &mut ResourceProxy;

    fn into_proxy(self) -> ResourceProxy;

    fn exists(&mut self) -> Result<bool> {
        self.proxy_mut().exists()
    }

    fn refresh(&mut self) -> Result<&mut Self> {
        self.proxy_mut().refresh()?;
        Ok(self)
    }

    fn create(&mut self) -> Result<&mut Self> {
        self.proxy_mut().create()?;
        Ok(self)
    }

    fn update(&mut self) -> Result<&mut Self> {
        self.proxy_mut().update()?;
        Ok(self)
    }

    /// Remove the resource from the service.
    ///
    /// The service contract defines no delete; types that know how to delete
    /// themselves override this.
    fn delete(&mut self) -> Result<()> {
        Err(Error::NotImplemented {
            kind: Self::schema().kind(),
            operation: "delete",
        })
    }
}

impl ResourceProxy {
    /// Turn an untyped proxy into the resource type it was made for.
    pub fn into_resource<T: Resource>(self) -> Result<T> {
        if !std::ptr::eq(self.schema, T::schema()) {
            return Err(Error::Configuration(format!(
                "proxy for kind {} cannot become kind {}",
                self.schema.kind(),
                T::schema().kind()
            )));
        }
        Ok(T::from_proxy(self))
    }
}
