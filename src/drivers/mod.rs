//! Driver dispatch.
//!
//! Drivers are looked up by the identifier in a connection's configuration
//! (`driver = "memory"`) and turn that configuration into a connection.

pub mod memory;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::ConnectionConfig;
use crate::connection::ConnectionHandle;
use crate::registry::ClassRegistry;
use crate::{GatewayError, Result};

/// Builds a connection from its configuration.
pub type ConnectFn = Arc<dyn Fn(&ConnectionConfig) -> Result<ConnectionHandle> + Send + Sync>;

/// Installs a driver's capability bindings.
pub type BindFn = fn(&mut ClassRegistry);

struct Driver {
    connect: ConnectFn,
    bind: Option<BindFn>,
}

/// Known drivers by identifier.
pub struct DriverRegistry {
    drivers: HashMap<String, Driver>,
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.identifiers())
            .finish()
    }
}

impl Default for DriverRegistry {
    /// Registry with the built-in `memory` driver.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(
            memory::DRIVER,
            memory::MemoryConnection::from_config,
            Some(memory::register_bindings),
        );
        registry
    }
}

impl DriverRegistry {
    pub fn empty() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Register a driver. `bind` installs its capability bindings when the
    /// driver is first used.
    pub fn register<F>(&mut self, identifier: &str, connect: F, bind: Option<BindFn>)
    where
        F: Fn(&ConnectionConfig) -> Result<ConnectionHandle> + Send + Sync + 'static,
    {
        self.drivers.insert(
            identifier.to_string(),
            Driver {
                connect: Arc::new(connect),
                bind,
            },
        );
    }

    /// Registered driver identifiers, sorted.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.drivers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Create a connection with the driver named in `config`.
    pub fn connect(&self, config: &ConnectionConfig) -> Result<ConnectionHandle> {
        let driver = self.driver(&config.driver)?;
        (*driver.connect)(config)
    }

    /// Install the bindings of the driver named `identifier`, if it has any.
    pub fn bind(&self, identifier: &str, classes: &mut ClassRegistry) -> Result<()> {
        if let Some(bind) = self.driver(identifier)?.bind {
            bind(classes);
        }
        Ok(())
    }

    fn driver(&self, identifier: &str) -> Result<&Driver> {
        self.drivers
            .get(identifier)
            .ok_or_else(|| GatewayError::Configuration(format!("unknown driver '{identifier}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Capability;

    #[test]
    fn test_default_has_memory() {
        let drivers = DriverRegistry::default();
        assert_eq!(drivers.identifiers(), vec!["memory"]);

        let conn = drivers.connect(&ConnectionConfig::new("memory")).unwrap();
        assert_eq!(conn.backend_name(), "memory");
    }

    #[test]
    fn test_unknown_driver() {
        let drivers = DriverRegistry::default();
        let result = drivers.connect(&ConnectionConfig::new("mysql"));
        assert!(matches!(result, Err(GatewayError::Configuration(_))));
    }

    #[test]
    fn test_bind_installs_classes() {
        let drivers = DriverRegistry::default();
        let mut classes = ClassRegistry::new();
        drivers.bind("memory", &mut classes).unwrap();

        assert!(classes.has(Capability::Table, memory::TABLE_CLASS));
        assert!(classes.has(Capability::Record, memory::RECORD_CLASS));
    }

    #[test]
    fn test_register_custom_driver() {
        let mut drivers = DriverRegistry::empty();
        drivers.register(
            "scratch",
            |config: &ConnectionConfig| {
                let conn: ConnectionHandle =
                    Arc::new(memory::MemoryConnection::new(config.model_namespace.clone()));
                Ok(conn)
            },
            None,
        );

        let mut classes = ClassRegistry::new();
        drivers.bind("scratch", &mut classes).unwrap();
        assert!(!classes.has(Capability::Table, memory::TABLE_CLASS));
        assert!(drivers.connect(&ConnectionConfig::new("scratch")).is_ok());
    }
}
