//! Application context.
//!
//! [`AppContext`] owns everything resolution needs: named connections,
//! capability bindings, coercions and the gateway cache. Callers pass the
//! context around instead of reaching for global state.

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::connection::{ConnectionHandle, ConnectionManager};
use crate::drivers::DriverRegistry;
use crate::gateway::TableGateway;
use crate::registry::ClassRegistry;
use crate::resolver::TableResolver;
use crate::value::{Coercions, Value};
use crate::Result;

/// Connections, bindings and the gateway resolver for one application.
#[derive(Debug)]
pub struct AppContext {
    connections: ConnectionManager,
    resolver: TableResolver,
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(ClassRegistry::new(), Coercions::default())
    }
}

impl AppContext {
    pub fn new(classes: ClassRegistry, coercions: Coercions) -> Self {
        Self {
            connections: ConnectionManager::new(),
            resolver: TableResolver::new(classes, coercions),
        }
    }

    /// Build a context from configuration.
    ///
    /// Every configured connection is created through `drivers`, its
    /// driver's bindings are installed, and its aliases and namespace
    /// bindings are registered. Unknown drivers fail with
    /// [`GatewayError::Configuration`](crate::GatewayError::Configuration).
    pub fn from_config(config: &Config, drivers: &DriverRegistry) -> Result<Self> {
        config.validate()?;
        let mut classes = ClassRegistry::new();
        let mut connections = ConnectionManager::new();

        for (name, conn_config) in &config.connections {
            let conn = drivers.connect(conn_config)?;
            drivers.bind(&conn_config.driver, &mut classes)?;
            connections.register(name, conn);

            for alias in &conn_config.aliases {
                connections.alias(alias, name)?;
            }
            for namespace in &conn_config.namespaces {
                connections.bind_namespace(namespace, name)?;
            }
        }

        if let Some(default) = &config.default_connection {
            connections.set_default(default)?;
        }

        info!(
            "Application context ready with {} connection name(s)",
            connections.names().len()
        );

        Ok(Self {
            connections,
            resolver: TableResolver::new(classes, Coercions::default()),
        })
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    pub fn connections_mut(&mut self) -> &mut ConnectionManager {
        &mut self.connections
    }

    pub fn resolver(&self) -> &TableResolver {
        &self.resolver
    }

    pub fn classes(&self) -> &ClassRegistry {
        self.resolver.classes()
    }

    pub fn classes_mut(&mut self) -> &mut ClassRegistry {
        self.resolver.classes_mut()
    }

    /// Connection for an optional calling-context class path.
    pub fn resolve_connection(&self, class_path: Option<&str>) -> Result<ConnectionHandle> {
        self.connections.resolve_connection(class_path)
    }

    /// Gateway for `name` on `connection`, or on the connection resolved
    /// for `name` itself when none is given.
    pub fn factory(
        &self,
        name: &str,
        connection: Option<&ConnectionHandle>,
    ) -> Result<Arc<dyn TableGateway>> {
        match connection {
            Some(conn) => self.resolver.factory(name, conn),
            None => {
                let conn = self.resolve_connection(Some(name))?;
                self.resolver.factory(name, &conn)
            }
        }
    }

    /// Gateway for `name` on its resolved connection.
    pub fn table(&self, name: &str) -> Result<Arc<dyn TableGateway>> {
        self.factory(name, None)
    }

    /// Gateway for `name` on the connection registered as `connection`.
    pub fn table_on(&self, name: &str, connection: &str) -> Result<Arc<dyn TableGateway>> {
        let conn = self.connections.get(connection)?;
        self.resolver.factory(name, &conn)
    }

    /// Check whether the table for `name` exists on its resolved connection.
    pub fn has_table(&self, name: &str) -> Result<bool> {
        let conn = self.resolve_connection(Some(name))?;
        conn.table_exists(&TableResolver::table_name(name))
    }

    /// Coerce a raw value with this context's coercions.
    pub fn cast_value(&self, value: Value, tag: &str) -> Result<Value> {
        self.resolver.coercions().cast_value(value, tag)
    }
}
