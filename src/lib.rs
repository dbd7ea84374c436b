//! tablegate - Table Gateway and Active Record contracts
//!
//! A base layer for object-relational mappings over pluggable database
//! drivers. Drivers provide connections and table gateways; this crate
//! resolves which gateway serves a table, caches one instance per
//! connection and table, and coerces raw field values.

pub mod config;
pub mod connection;
pub mod context;
pub mod drivers;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod naming;
pub mod record;
pub mod registry;
pub mod resolver;
pub mod value;

pub use config::{Config, ConnectionConfig, LoggingConfig};
pub use connection::{Connection, ConnectionHandle, ConnectionId, ConnectionManager};
pub use context::AppContext;
pub use drivers::memory::{MemoryConnection, MemoryTable, TableSchema};
pub use drivers::DriverRegistry;
pub use error::{GatewayError, Result};
pub use gateway::{FetchCriteria, GatewayBase, GatewayConstructor, TableGateway};
pub use naming::{camel_case, snake_case};
pub use record::Record;
pub use registry::{Capability, ClassRegistry};
pub use resolver::TableResolver;
pub use value::{Coercions, TypeTag, Value};
