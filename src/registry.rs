//! Capability bindings.
//!
//! Gateway and record classes are registered up front under their
//! fully-qualified names. Resolution is a lookup in this table, walking
//! namespaces from the most specific to the root.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::connection::Connection;
use crate::gateway::{GatewayBase, GatewayConstructor, TableGateway};
use crate::naming;
use crate::Result;

/// Capability a registered class provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// A table gateway.
    Table,
    /// A record (row) class.
    Record,
}

impl Capability {
    /// Class name a generic implementation of this capability uses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Table => "Table",
            Capability::Record => "Record",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Registered gateway constructors and record classes.
#[derive(Default, Clone)]
pub struct ClassRegistry {
    tables: HashMap<String, GatewayConstructor>,
    records: HashSet<String>,
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tables: Vec<&String> = self.tables.keys().collect();
        tables.sort();
        let mut records: Vec<&String> = self.records.iter().collect();
        records.sort();
        f.debug_struct("ClassRegistry")
            .field("tables", &tables)
            .field("records", &records)
            .finish()
    }
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table gateway class and its constructor.
    pub fn register_table<F>(&mut self, class: &str, constructor: F)
    where
        F: Fn(GatewayBase) -> Result<Arc<dyn TableGateway>> + Send + Sync + 'static,
    {
        debug!("Registering table class '{}'", class);
        self.tables.insert(class.to_string(), Arc::new(constructor));
    }

    /// Register a record class.
    pub fn register_record(&mut self, class: &str) {
        debug!("Registering record class '{}'", class);
        self.records.insert(class.to_string());
    }

    /// Remove a class of the given capability. Returns whether it existed.
    pub fn unregister(&mut self, capability: Capability, class: &str) -> bool {
        match capability {
            Capability::Table => self.tables.remove(class).is_some(),
            Capability::Record => self.records.remove(class),
        }
    }

    /// Check whether `class` is registered with `capability`.
    pub fn has(&self, capability: Capability, class: &str) -> bool {
        match capability {
            Capability::Table => self.tables.contains_key(class),
            Capability::Record => self.records.contains(class),
        }
    }

    /// Constructor for a registered table class.
    pub fn constructor(&self, class: &str) -> Option<GatewayConstructor> {
        self.tables.get(class).cloned()
    }

    /// Find the closest generic implementation of `capability` for `conn`.
    ///
    /// Strips the last segment of the connection's class path one level at
    /// a time and checks for `<level>.<Capability>` at each level, ending
    /// with the bare capability name in the root namespace. The most
    /// specific match wins.
    pub fn resolve_gateway_class(
        &self,
        capability: Capability,
        conn: &dyn Connection,
    ) -> Option<String> {
        let path = conn.class_path();
        let levels = naming::parent_namespace(path)
            .into_iter()
            .flat_map(naming::lineage)
            .chain(std::iter::once(""));

        for level in levels {
            let candidate = naming::qualify(level, capability.as_str());
            if self.has(capability, &candidate) {
                debug!(
                    "Resolved {} class '{}' for connection '{}'",
                    capability, candidate, path
                );
                return Some(candidate);
            }
        }

        None
    }
}
