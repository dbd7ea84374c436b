//! Connection capability and named connection management.
//!
//! A connection is an opaque handle to a data store supplied by a driver.
//! This crate only needs three things from it: the namespace its model
//! classes live in, its own class path (used to find capability bindings)
//! and whether a table exists.
//!
//! Connections are shared as [`ConnectionHandle`]s. Identity is the `Arc`
//! allocation: the same handle registered under two names is still one
//! connection, and two handles to equal-looking stores are two.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::naming;
use crate::{GatewayError, Result};

/// Upcast to [`Any`], implemented for every sized `'static` type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Capability every driver connection provides.
pub trait Connection: AsAny + Send + Sync {
    /// Returns the name of the database backend (e.g. "memory", "mysql").
    fn backend_name(&self) -> &'static str;

    /// Namespace that model classes for this connection live in,
    /// e.g. `app.models`.
    fn model_namespace(&self) -> &str;

    /// Fully-qualified class path of this connection,
    /// e.g. `drivers.mysql.Connection`.
    ///
    /// Capability lookups walk the namespaces of this path.
    fn class_path(&self) -> &str;

    /// Check if a table exists in the data store.
    fn table_exists(&self, table_name: &str) -> Result<bool>;
}

impl dyn Connection {
    /// Downcast to a driver's concrete connection type.
    pub fn downcast_ref<T: Connection + 'static>(&self) -> Option<&T> {
        AsAny::as_any(self).downcast_ref::<T>()
    }
}

/// Shared connection handle.
pub type ConnectionHandle = Arc<dyn Connection>;

/// Identity of a connection: the address of its shared allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(usize);

impl ConnectionId {
    /// Identity of `conn`.
    pub fn of(conn: &ConnectionHandle) -> Self {
        Self(Arc::as_ptr(conn) as *const () as usize)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn@{:#x}", self.0)
    }
}

/// Named connections, the default connection, and namespace bindings.
#[derive(Default)]
pub struct ConnectionManager {
    connections: HashMap<String, ConnectionHandle>,
    default: Option<String>,
    /// namespace -> connection name
    bindings: HashMap<String, String>,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.names())
            .field("default", &self.default)
            .field("bindings", &self.bindings)
            .finish()
    }
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under `name`, replacing any previous one.
    pub fn register(&mut self, name: &str, conn: ConnectionHandle) {
        info!(
            "Registering connection '{}' ({}, namespace '{}')",
            name,
            conn.backend_name(),
            conn.model_namespace()
        );
        self.connections.insert(name.to_string(), conn);
    }

    /// Register an existing connection under another name.
    pub fn alias(&mut self, alias: &str, target: &str) -> Result<()> {
        let conn = self.get(target)?;
        debug!("Aliasing connection '{}' as '{}'", target, alias);
        self.connections.insert(alias.to_string(), conn);
        Ok(())
    }

    /// Get a connection by name.
    pub fn get(&self, name: &str) -> Result<ConnectionHandle> {
        self.connections
            .get(name)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("connection '{name}'")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.connections.contains_key(name)
    }

    /// Registered connection names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.connections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Establish the default connection.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.contains(name) {
            return Err(GatewayError::NotFound(format!("connection '{name}'")));
        }
        info!("Default connection set to '{}'", name);
        self.default = Some(name.to_string());
        Ok(())
    }

    /// Name of the default connection, if one is established.
    pub fn default_name(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// The default connection.
    ///
    /// Fails with [`GatewayError::Configuration`] if none is established.
    pub fn default_connection(&self) -> Result<ConnectionHandle> {
        let name = self.default.as_deref().ok_or_else(|| {
            GatewayError::Configuration("no default connection has been set".to_string())
        })?;
        self.connections.get(name).cloned().ok_or_else(|| {
            GatewayError::Configuration(format!("default connection '{name}' is not registered"))
        })
    }

    /// Bind a class namespace to a named connection.
    pub fn bind_namespace(&mut self, namespace: &str, connection: &str) -> Result<()> {
        if !self.contains(connection) {
            return Err(GatewayError::NotFound(format!("connection '{connection}'")));
        }
        debug!("Binding namespace '{}' to connection '{}'", namespace, connection);
        self.bindings
            .insert(namespace.to_string(), connection.to_string());
        Ok(())
    }

    /// Resolve the connection for a calling context.
    ///
    /// Walks `class_path` and its ancestor namespaces, most specific first,
    /// and returns the connection bound to the first one that has a binding.
    /// Falls back to the default connection.
    pub fn resolve_connection(&self, class_path: Option<&str>) -> Result<ConnectionHandle> {
        if let Some(path) = class_path {
            for namespace in naming::lineage(path) {
                if let Some(name) = self.bindings.get(namespace) {
                    debug!("Resolved connection '{}' for '{}'", name, path);
                    return self.get(name);
                }
            }
        }
        self.default_connection()
    }
}
