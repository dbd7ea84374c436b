//! Table gateway capability.
//!
//! A table gateway provides CRUD access to one logical table on one
//! connection. This crate supplies the shared state ([`GatewayBase`]) and
//! the provided methods; drivers supply `defaults`, `field_types`,
//! `identifier`, `fetch`, `fetch_all` and `save`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::connection::{ConnectionHandle, ConnectionId};
use crate::record::Record;
use crate::value::{Coercions, TypeTag, Value};
use crate::Result;

/// State every gateway carries, filled in by the resolver.
#[derive(Clone)]
pub struct GatewayBase {
    connection: ConnectionHandle,
    name: String,
    class_name: String,
    record_class: String,
    coercions: Arc<Coercions>,
}

impl fmt::Debug for GatewayBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayBase")
            .field("connection", &ConnectionId::of(&self.connection))
            .field("name", &self.name)
            .field("class_name", &self.class_name)
            .field("record_class", &self.record_class)
            .finish()
    }
}

impl GatewayBase {
    pub fn new(
        connection: ConnectionHandle,
        name: impl Into<String>,
        class_name: impl Into<String>,
        record_class: impl Into<String>,
        coercions: Arc<Coercions>,
    ) -> Self {
        Self {
            connection,
            name: name.into(),
            class_name: class_name.into(),
            record_class: record_class.into(),
            coercions,
        }
    }

    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn record_class(&self) -> &str {
        &self.record_class
    }

    pub fn coercions(&self) -> &Coercions {
        &self.coercions
    }
}

/// How to select a single record.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchCriteria {
    /// Match on the identifier field.
    Id(Value),
    /// Match records whose fields equal every given value.
    Filter(Vec<(String, Value)>),
}

impl FetchCriteria {
    /// Check whether `record` satisfies these criteria.
    pub fn matches(&self, record: &Record, identifier: &str) -> bool {
        match self {
            FetchCriteria::Id(id) => record.get(identifier) == Some(id),
            FetchCriteria::Filter(pairs) => pairs
                .iter()
                .all(|(field, value)| record.get(field) == Some(value)),
        }
    }
}

impl From<Value> for FetchCriteria {
    fn from(id: Value) -> Self {
        FetchCriteria::Id(id)
    }
}

impl From<i64> for FetchCriteria {
    fn from(id: i64) -> Self {
        FetchCriteria::Id(Value::Int(id))
    }
}

/// CRUD access to one table on one connection.
pub trait TableGateway: Send + Sync {
    /// Shared state set up by the resolver.
    fn base(&self) -> &GatewayBase;

    /// Default field values for new records.
    fn defaults(&self) -> Vec<(String, Value)>;

    /// Type tag for each field that needs coercion.
    fn field_types(&self) -> HashMap<String, TypeTag>;

    /// Name of the identifier field.
    fn identifier(&self) -> &str;

    /// Fetch the first record matching `criteria`.
    fn fetch(&self, criteria: &FetchCriteria) -> Result<Option<Record>>;

    /// Fetch every record in the table.
    fn fetch_all(&self) -> Result<Vec<Record>>;

    /// Insert or update `record`. Drivers may assign the identifier.
    fn save(&self, record: &mut Record) -> Result<()>;

    /// Connection this gateway is bound to.
    fn db(&self) -> &ConnectionHandle {
        self.base().connection()
    }

    /// Canonical table name.
    fn name(&self) -> &str {
        self.base().name()
    }

    /// Fully-qualified gateway class name this instance was resolved as.
    fn class_name(&self) -> &str {
        self.base().class_name()
    }

    /// Record class for the given row data.
    ///
    /// Gateways storing several record classes in one table override this;
    /// the default is the class resolved for the table.
    fn record_class(&self, _data: &[(String, Value)]) -> String {
        self.base().record_class().to_string()
    }

    /// Build a new record from `data`.
    ///
    /// Defaults fill in missing fields, then string values are coerced
    /// according to `field_types()`.
    fn new_record(&self, data: Vec<(String, Value)>) -> Result<Record> {
        let types = self.field_types();
        let coercions = self.base().coercions();
        let mut record = Record::new(self.record_class(&data));

        for (field, value) in self.defaults() {
            record.set(&field, value);
        }
        for (field, value) in data {
            let value = match types.get(&field) {
                Some(tag) => coercions.cast(value, tag)?,
                None => value,
            };
            record.set(&field, value);
        }

        Ok(record)
    }

    /// A ghost record holding only `id`, to be populated later.
    fn ghost(&self, id: Value) -> Record {
        Record::ghost(self.base().record_class(), self.identifier(), id)
    }
}

impl fmt::Debug for dyn TableGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableGateway")
            .field("name", &self.name())
            .field("class_name", &self.class_name())
            .finish()
    }
}

/// Constructor registered for a gateway class.
pub type GatewayConstructor =
    Arc<dyn Fn(GatewayBase) -> Result<Arc<dyn TableGateway>> + Send + Sync>;
