//! Table gateway resolution and caching.
//!
//! [`TableResolver::factory`] turns a table or record-class name into the
//! gateway instance for a connection. At most one gateway exists per
//! (connection identity, table name); it is replaced only when the gateway
//! class resolved for that pair changes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::connection::{ConnectionHandle, ConnectionId};
use crate::gateway::{GatewayBase, TableGateway};
use crate::naming;
use crate::registry::{Capability, ClassRegistry};
use crate::value::Coercions;
use crate::{GatewayError, Result};

type CacheKey = (ConnectionId, String);

/// Resolves and caches table gateways.
pub struct TableResolver {
    classes: ClassRegistry,
    coercions: Arc<Coercions>,
    cache: Mutex<HashMap<CacheKey, Arc<dyn TableGateway>>>,
}

impl std::fmt::Debug for TableResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableResolver")
            .field("classes", &self.classes)
            .field("cached", &self.cached_count())
            .finish()
    }
}

impl TableResolver {
    pub fn new(classes: ClassRegistry, coercions: Coercions) -> Self {
        Self {
            classes,
            coercions: Arc::new(coercions),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    /// Mutable access to the bindings. Cached gateways whose class no
    /// longer resolves the same way are replaced on their next lookup.
    pub fn classes_mut(&mut self) -> &mut ClassRegistry {
        &mut self.classes
    }

    pub fn coercions(&self) -> &Coercions {
        &self.coercions
    }

    /// Canonical table name for a table or record-class name.
    ///
    /// ```
    /// use tablegate::resolver::TableResolver;
    ///
    /// assert_eq!(TableResolver::table_name("app.models.UserAccount"), "user_account");
    /// assert_eq!(TableResolver::table_name("user_account"), "user_account");
    /// ```
    pub fn table_name(name: &str) -> String {
        naming::snake_case(naming::strip_namespace(name))
    }

    /// Gateway class for `table` on `conn`.
    ///
    /// `<model namespace>.<CamelCase(table)>Table` when registered,
    /// otherwise the closest generic `Table` for the connection.
    pub fn gateway_class(&self, table: &str, conn: &ConnectionHandle) -> Option<String> {
        let specific = naming::qualify(
            conn.model_namespace(),
            &format!("{}Table", naming::camel_case(table)),
        );
        if self.classes.has(Capability::Table, &specific) {
            return Some(specific);
        }
        self.classes
            .resolve_gateway_class(Capability::Table, conn.as_ref())
    }

    /// Record class for `table` on `conn`.
    ///
    /// `<model namespace>.<CamelCase(table)>` when registered, otherwise the
    /// closest generic `Record`, otherwise plain `Record`.
    pub fn record_class(&self, table: &str, conn: &ConnectionHandle) -> String {
        let specific = naming::qualify(conn.model_namespace(), &naming::camel_case(table));
        if self.classes.has(Capability::Record, &specific) {
            return specific;
        }
        self.classes
            .resolve_gateway_class(Capability::Record, conn.as_ref())
            .unwrap_or_else(|| Capability::Record.as_str().to_string())
    }

    /// Resolve the gateway for `name` on `conn`, creating it on first use.
    ///
    /// Fails with [`GatewayError::UnsupportedOperation`] when no gateway
    /// class can be determined. The cache is left untouched on failure.
    pub fn factory(&self, name: &str, conn: &ConnectionHandle) -> Result<Arc<dyn TableGateway>> {
        let table = Self::table_name(name);
        if table.is_empty() {
            return Err(GatewayError::UnsupportedOperation(format!(
                "'{name}' does not name a table"
            )));
        }

        let class = self.gateway_class(&table, conn).ok_or_else(|| {
            GatewayError::UnsupportedOperation(format!(
                "no table gateway for '{}' on {} connection '{}'",
                table,
                conn.backend_name(),
                conn.class_path()
            ))
        })?;

        let key = (ConnectionId::of(conn), table);
        if let Some(existing) = self.cached(&key, &class) {
            return Ok(existing);
        }

        let constructor = self.classes.constructor(&class).ok_or_else(|| {
            GatewayError::UnsupportedOperation(format!("no constructor registered for '{class}'"))
        })?;

        let record_class = self.record_class(&key.1, conn);
        let base = GatewayBase::new(
            Arc::clone(conn),
            key.1.clone(),
            class.clone(),
            record_class,
            Arc::clone(&self.coercions),
        );
        // Constructors may resolve other gateways, so the cache is not held here.
        let gateway = (*constructor)(base)?;

        let mut cache = self.lock_cache();
        if let Some(existing) = cache.get(&key) {
            if existing.class_name() == class {
                debug!("Gateway for '{}' created concurrently; keeping cached instance", key.1);
                return Ok(Arc::clone(existing));
            }
        }

        info!("Created gateway '{}' for table '{}' ({})", class, key.1, key.0);
        cache.insert(key, Arc::clone(&gateway));
        Ok(gateway)
    }

    fn cached(&self, key: &CacheKey, class: &str) -> Option<Arc<dyn TableGateway>> {
        let cache = self.lock_cache();
        let existing = cache.get(key)?;
        if existing.class_name() == class {
            debug!("Gateway cache hit for '{}' ({})", key.1, key.0);
            return Some(Arc::clone(existing));
        }
        warn!(
            "Gateway class for '{}' changed from '{}' to '{}'; replacing cached instance",
            key.1,
            existing.class_name(),
            class
        );
        None
    }

    /// Number of cached gateways.
    pub fn cached_count(&self) -> usize {
        self.lock_cache().len()
    }

    /// Drop every cached gateway.
    pub fn clear(&self) {
        let mut cache = self.lock_cache();
        debug!("Clearing {} cached gateways", cache.len());
        cache.clear();
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<CacheKey, Arc<dyn TableGateway>>> {
        // Every mutation is a single insert or clear, so a poisoned map is still consistent.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
