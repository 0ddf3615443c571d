//! Attribute declarations per resource kind
//!
//! A schema is built once when a resource type is defined and shared by all
//! of its instances. It decides which fields a refresh copies out of a
//! response and which attributes callers may assign.

/// A single declared attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDecl {
    pub name: &'static str,
    pub read_only: bool,
}

/// Ordered attribute declarations for one resource kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSchema {
    kind: &'static str,
    attributes: Vec<AttributeDecl>,
}

impl AttributeSchema {
    /// Start a schema for `kind`, the lowercase snake-case resource name
    /// (`user`, `broker_queue`).
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            attributes: Vec::new(),
        }
    }

    /// Declare an attribute.
    ///
    /// Declaring a name twice keeps its original position and takes the
    /// latest read-only flag.
    pub fn declare(mut self, name: &'static str, read_only: bool) -> Self {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.read_only = read_only,
            None => self.attributes.push(AttributeDecl { name, read_only }),
        }
        self
    }

    pub fn attribute(self, name: &'static str) -> Self {
        self.declare(name, false)
    }

    pub fn read_only(self, name: &'static str) -> Self {
        self.declare(name, true)
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Collection segment of resource paths, e.g. `users`.
    pub fn collection(&self) -> String {
        collection_for(self.kind)
    }

    pub fn get(&self, name: &str) -> Option<&AttributeDecl> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether `name` is declared read-only. Undeclared names also report
    /// `false`; check [`contains`](Self::contains) before treating the
    /// attribute as writable.
    pub fn is_read_only(&self, name: &str) -> bool {
        self.get(name).map(|a| a.read_only).unwrap_or(false)
    }

    /// Declared attribute names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.attributes.iter().map(|a| a.name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeDecl> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Plural collection name for a kind: lowercase plus `s`.
pub fn collection_for(kind: &str) -> String {
    format!("{}s", kind.to_lowercase())
}

/// Type name a kind is registered under: `broker_user` becomes `BrokerUser`.
pub fn type_name_for(kind: &str) -> String {
    let mut out = String::with_capacity(kind.len());
    let mut upper_next = true;
    for ch in kind.chars() {
        if ch == '_' && !out.is_empty() {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}
