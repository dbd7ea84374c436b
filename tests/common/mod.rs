//! Test helpers for integration tests.
//!
//! Provides a context over one in-memory connection plus a scripted
//! connection type whose class path can be chosen per test.

#![allow(dead_code)]

use std::sync::Arc;

use tablegate::drivers::memory;
use tablegate::{
    AppContext, ClassRegistry, Coercions, Connection, ConnectionHandle, MemoryConnection,
    TableSchema, TypeTag,
};

/// Connection whose namespace and class path are set by the test.
pub struct ScriptedConnection {
    pub namespace: String,
    pub class_path: String,
    pub tables: Vec<String>,
}

impl Connection for ScriptedConnection {
    fn backend_name(&self) -> &'static str {
        "scripted"
    }

    fn model_namespace(&self) -> &str {
        &self.namespace
    }

    fn class_path(&self) -> &str {
        &self.class_path
    }

    fn table_exists(&self, table_name: &str) -> tablegate::Result<bool> {
        Ok(self.tables.iter().any(|t| t == table_name))
    }
}

/// A scripted connection handle.
pub fn scripted(namespace: &str, class_path: &str) -> ConnectionHandle {
    Arc::new(ScriptedConnection {
        namespace: namespace.to_string(),
        class_path: class_path.to_string(),
        tables: vec![],
    })
}

/// Memory connection with a `user_account` table.
pub fn memory_store() -> ConnectionHandle {
    let conn = MemoryConnection::new("app.models")
        .with_table(
            "user_account",
            TableSchema::new()
                .default_value("active", true)
                .field("age", TypeTag::Integer)
                .field("roles", TypeTag::Array)
                .field("joined", TypeTag::Class("datetime".to_string())),
        )
        .expect("create table");
    Arc::new(conn)
}

/// Context with the memory bindings and `main` as default connection.
pub fn memory_context() -> AppContext {
    let mut classes = ClassRegistry::new();
    memory::register_bindings(&mut classes);

    let mut ctx = AppContext::new(classes, Coercions::default());
    ctx.connections_mut().register("main", memory_store());
    ctx.connections_mut()
        .set_default("main")
        .expect("set default");
    ctx
}
