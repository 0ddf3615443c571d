//! Connection to a Wallaroo service
//!
//! A connection carries the endpoint, the credentials, the registry of
//! resource kinds and the revision pin shared by every proxy created from it.

use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::ConnectionOptions;
use crate::error::{Error, Result};
use crate::factory::{ResourceFactory, ResourceRegistry};
use crate::proxy::{Resource, ResourceProxy};
use crate::revision::RevisionSelector;
use crate::schema::collection_for;

/// Revision pin plus a counter bumped whenever the pin moves.
#[derive(Debug)]
struct PinState {
    selector: RevisionSelector,
    generation: u64,
}

/// Session-scoped connection to a Wallaroo service.
///
/// Everything but the revision pin is fixed at construction. The pin sits
/// behind a lock so a connection can be shared, but a proxy's
/// read-pin / write / advance sequence is not atomic: concurrent writers on
/// one connection race on the pin. Use one connection per concurrent caller.
pub struct Connection {
    base_url: Url,
    host: String,
    port: u16,
    scheme: String,
    username: String,
    password: String,
    secret: Option<String>,
    pin: RwLock<PinState>,
    registry: ResourceRegistry,
    http: Client,
}

impl Connection {
    /// Connect with the built-in resource kinds.
    pub fn configure(options: ConnectionOptions) -> Result<Arc<Self>> {
        Self::with_registry(options, ResourceRegistry::default())
    }

    /// Connect with a caller-supplied registry of resource kinds.
    pub fn with_registry(options: ConnectionOptions, registry: ResourceRegistry) -> Result<Arc<Self>> {
        let scheme = options.scheme().to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(Error::Configuration(format!(
                "unsupported scheme '{}' (expected http or https)",
                scheme
            )));
        }
        let host = options.host().trim().to_string();
        if host.is_empty() {
            return Err(Error::Configuration("empty host".to_string()));
        }

        let base = format!("{}://{}:{}/", scheme, host, options.port());
        let base_url = Url::parse(&base)
            .map_err(|e| Error::Configuration(format!("invalid service address '{}': {}", base, e)))?;

        let selector = RevisionSelector::resolve(&options)?;
        tracing::debug!("connecting to {} pinned at {}", base_url, selector);

        Ok(Arc::new(Self {
            base_url,
            host,
            port: options.port(),
            scheme,
            username: options.username().to_string(),
            password: options.password().to_string(),
            secret: options.secret.clone(),
            pin: RwLock::new(PinState {
                selector,
                generation: 0,
            }),
            registry,
            http: Client::builder().build()?,
        }))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Snapshot of the current revision pin.
    pub fn revision(&self) -> RevisionSelector {
        self.pin.read().unwrap_or_else(PoisonError::into_inner).selector.clone()
    }

    /// Number of times the pin has moved since the connection was made.
    pub fn revision_generation(&self) -> u64 {
        self.pin.read().unwrap_or_else(PoisonError::into_inner).generation
    }

    /// Move the pin after a confirmed write. Returns whether it changed.
    pub(crate) fn advance_revision(&self, commit: &str) -> bool {
        let mut pin = self.pin.write().unwrap_or_else(PoisonError::into_inner);
        if pin.selector.advance(commit) {
            pin.generation += 1;
            tracing::info!("revision pin advanced to {}", pin.selector);
            true
        } else {
            tracing::debug!("revision pin {} left in place for commit {}", pin.selector, commit);
            false
        }
    }

    /// `scheme://host:port/path?<pin>` for the current pin.
    pub fn build_url(&self, path: &str) -> Url {
        self.pinned_url(path).0
    }

    /// Build a URL and report the pin generation it was built against.
    pub(crate) fn pinned_url(&self, path: &str) -> (Url, u64) {
        let pin = self.pin.read().unwrap_or_else(PoisonError::into_inner);
        let mut url = self.base_url.clone();
        url.set_path(path);
        url.set_query(Some(pin.selector.query_fragment().as_str()));
        (url, pin.generation)
    }

    /// Proxy for the resource `name` of kind `kind` (`user`, `broker_queue`).
    pub fn create_proxy(self: &Arc<Self>, kind: &str, name: &str) -> Result<ResourceProxy> {
        ResourceFactory::make(self, kind, name)
    }

    /// Typed proxy for the resource `name`.
    pub fn resource<T: Resource>(self: &Arc<Self>, name: &str) -> Result<T> {
        ResourceFactory::make_typed(self, name)
    }

    /// Every resource of `kind`, keyed by name, as the service reports it.
    pub fn list(&self, kind: &str) -> Result<Map<String, Value>> {
        if self.registry.lookup(kind).is_none() {
            return Err(Error::Configuration(format!("unknown resource kind '{}'", kind)));
        }
        let url = self.build_url(&format!("/{}", collection_for(kind)));
        let response = self.get(&url)?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(remote_error(response));
        }
        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) fn get(&self, url: &Url) -> Result<Response> {
        let response = self.http.get(url.clone()).send()?;
        tracing::debug!("GET {} -> {}", url, response.status());
        Ok(response)
    }

    pub(crate) fn put_json(&self, url: &Url, body: &Map<String, Value>) -> Result<Response> {
        let response = self.http.put(url.clone()).json(body).send()?;
        tracing::debug!("PUT {} -> {}", url, response.status());
        Ok(response)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("revision", &self.revision())
            .finish_non_exhaustive()
    }
}

/// Turn an unsuccessful response into `Error::Remote`.
pub(crate) fn remote_error(response: Response) -> Error {
    let status = response.status();
    let body = response.text().unwrap_or_default();
    Error::Remote { status, body }
}
