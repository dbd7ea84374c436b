//! In-memory driver.
//!
//! Keeps every table as a vector of records inside the connection. Useful
//! for tests and as the smallest complete example of a driver: a
//! [`MemoryConnection`], a [`MemoryTable`] gateway, and bindings for the
//! generic `drivers.memory.Table` and `drivers.memory.Record` classes.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::config::ConnectionConfig;
use crate::connection::{Connection, ConnectionHandle};
use crate::gateway::{FetchCriteria, GatewayBase, TableGateway};
use crate::record::Record;
use crate::registry::ClassRegistry;
use crate::value::{TypeTag, Value};
use crate::{GatewayError, Result};

/// Driver identifier used in configuration.
pub const DRIVER: &str = "memory";

/// Class path of [`MemoryConnection`].
pub const CONNECTION_CLASS: &str = "drivers.memory.Connection";

/// Generic gateway class for memory connections.
pub const TABLE_CLASS: &str = "drivers.memory.Table";

/// Generic record class for memory connections.
pub const RECORD_CLASS: &str = "drivers.memory.Record";

/// Identifier field used when a table declares none.
pub const DEFAULT_IDENTIFIER: &str = "id";

/// Column layout of an in-memory table.
#[derive(Debug, Clone)]
pub struct TableSchema {
    identifier: String,
    defaults: Vec<(String, Value)>,
    field_types: HashMap<String, TypeTag>,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            identifier: DEFAULT_IDENTIFIER.to_string(),
            defaults: Vec::new(),
            field_types: HashMap::new(),
        }
    }
}

impl TableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifier field (defaults to `id`).
    pub fn identifier(mut self, field: &str) -> Self {
        self.identifier = field.to_string();
        self
    }

    /// Add a default value for new records.
    pub fn default_value(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.defaults.push((field.to_string(), value.into()));
        self
    }

    /// Declare the type of a field.
    pub fn field(mut self, field: &str, tag: TypeTag) -> Self {
        self.field_types.insert(field.to_string(), tag);
        self
    }
}

#[derive(Debug, Default)]
struct TableData {
    schema: TableSchema,
    rows: Vec<Record>,
    next_id: i64,
}

type Tables = Arc<RwLock<HashMap<String, TableData>>>;

/// Connection to an in-process store.
#[derive(Debug)]
pub struct MemoryConnection {
    namespace: String,
    tables: Tables,
}

impl MemoryConnection {
    /// Create an empty store whose models live in `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            tables: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Build a connection from its configuration.
    ///
    /// Settings: `tables` (list of table names to create) and `identifier`
    /// (identifier field for those tables, default `id`).
    pub fn from_config(config: &ConnectionConfig) -> Result<ConnectionHandle> {
        let conn = Self::new(config.model_namespace.clone());
        let mut schema = TableSchema::new();
        if let Some(identifier) = config.setting_str("identifier") {
            schema = schema.identifier(identifier);
        }
        for table in config.setting_list("tables") {
            conn.create_table(&table, schema.clone())?;
        }
        Ok(Arc::new(conn))
    }

    /// Create (or replace) a table.
    pub fn create_table(&self, name: &str, schema: TableSchema) -> Result<()> {
        debug!("Creating memory table '{}'", name);
        let mut tables = write(&self.tables)?;
        tables.insert(
            name.to_string(),
            TableData {
                schema,
                rows: Vec::new(),
                next_id: 1,
            },
        );
        Ok(())
    }

    /// Builder-style [`create_table`](Self::create_table).
    pub fn with_table(self, name: &str, schema: TableSchema) -> Result<Self> {
        self.create_table(name, schema)?;
        Ok(self)
    }

    /// Number of rows in a table.
    pub fn row_count(&self, name: &str) -> Result<usize> {
        let tables = read(&self.tables)?;
        table(&tables, name).map(|t| t.rows.len())
    }
}

impl Connection for MemoryConnection {
    fn backend_name(&self) -> &'static str {
        DRIVER
    }

    fn model_namespace(&self) -> &str {
        &self.namespace
    }

    fn class_path(&self) -> &str {
        CONNECTION_CLASS
    }

    fn table_exists(&self, table_name: &str) -> Result<bool> {
        Ok(read(&self.tables)?.contains_key(table_name))
    }
}

/// Gateway over one in-memory table.
///
/// The identifier field is taken from the table schema the first time the
/// table exists and kept from then on; until then it is [`DEFAULT_IDENTIFIER`].
pub struct MemoryTable {
    base: GatewayBase,
    tables: Tables,
    identifier: OnceLock<String>,
}

impl MemoryTable {
    /// Constructor registered for memory gateway classes.
    pub fn create(base: GatewayBase) -> Result<Arc<dyn TableGateway>> {
        let conn = base
            .connection()
            .downcast_ref::<MemoryConnection>()
            .ok_or_else(|| {
                GatewayError::UnsupportedOperation(format!(
                    "memory gateway cannot run on a {} connection",
                    base.connection().backend_name()
                ))
            })?;
        let tables = Arc::clone(&conn.tables);

        Ok(Arc::new(Self {
            base,
            tables,
            identifier: OnceLock::new(),
        }))
    }

    fn schema(&self) -> Option<TableSchema> {
        read(&self.tables)
            .ok()?
            .get(self.base.name())
            .map(|t| t.schema.clone())
    }
}

impl TableGateway for MemoryTable {
    fn base(&self) -> &GatewayBase {
        &self.base
    }

    fn defaults(&self) -> Vec<(String, Value)> {
        self.schema().map(|s| s.defaults).unwrap_or_default()
    }

    fn field_types(&self) -> HashMap<String, TypeTag> {
        self.schema().map(|s| s.field_types).unwrap_or_default()
    }

    fn identifier(&self) -> &str {
        if let Some(identifier) = self.identifier.get() {
            return identifier;
        }
        match self.schema() {
            Some(schema) => self.identifier.get_or_init(|| schema.identifier).as_str(),
            None => DEFAULT_IDENTIFIER,
        }
    }

    fn fetch(&self, criteria: &FetchCriteria) -> Result<Option<Record>> {
        let identifier = self.identifier().to_string();
        let tables = read(&self.tables)?;
        let data = table(&tables, self.name())?;
        Ok(data
            .rows
            .iter()
            .find(|r| criteria.matches(r, &identifier))
            .cloned())
    }

    fn fetch_all(&self) -> Result<Vec<Record>> {
        let tables = read(&self.tables)?;
        Ok(table(&tables, self.name())?.rows.clone())
    }

    fn save(&self, record: &mut Record) -> Result<()> {
        let identifier = self.identifier().to_string();
        let mut tables = write(&self.tables)?;
        let data = tables
            .get_mut(self.base.name())
            .ok_or_else(|| GatewayError::NotFound(format!("table '{}'", self.base.name())))?;

        let assigned = record
            .get(&identifier)
            .filter(|id| !id.is_null())
            .cloned();
        let id = match assigned {
            Some(id) => id,
            None => {
                let id = Value::Int(data.next_id);
                if data.rows.iter().any(|r| r.get(&identifier) == Some(&id)) {
                    return Err(GatewayError::Driver(format!(
                        "no identifiers left in '{}'",
                        self.base.name()
                    )));
                }
                record.set(&identifier, id.clone());
                id
            }
        };
        if let Some(n) = id.as_i64() {
            data.next_id = data.next_id.max(n.saturating_add(1));
        }

        let existing = data
            .rows
            .iter_mut()
            .find(|r| r.get(&identifier) == Some(&id));
        match existing {
            Some(row) => *row = record.clone(),
            None => data.rows.push(record.clone()),
        }

        debug!("Saved {} = {} in '{}'", identifier, id, self.base.name());
        Ok(())
    }
}

/// Install the generic memory gateway and record classes.
pub fn register_bindings(registry: &mut ClassRegistry) {
    registry.register_table(TABLE_CLASS, MemoryTable::create);
    registry.register_record(RECORD_CLASS);
}

fn table<'a>(tables: &'a HashMap<String, TableData>, name: &str) -> Result<&'a TableData> {
    tables
        .get(name)
        .ok_or_else(|| GatewayError::NotFound(format!("table '{name}'")))
}

fn read(tables: &Tables) -> Result<RwLockReadGuard<'_, HashMap<String, TableData>>> {
    tables
        .read()
        .map_err(|_| GatewayError::Driver("memory store lock poisoned".to_string()))
}

fn write(tables: &Tables) -> Result<RwLockWriteGuard<'_, HashMap<String, TableData>>> {
    tables
        .write()
        .map_err(|_| GatewayError::Driver("memory store lock poisoned".to_string()))
}
