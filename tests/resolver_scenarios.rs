//! End-to-end resolution scenarios.

mod common;

use std::sync::Arc;

use tablegate::drivers::memory;
use tablegate::{AppContext, Capability, ClassRegistry, Coercions, FetchCriteria, GatewayError, Value};

use common::{memory_context, scripted};

#[test]
fn test_user_account_scenario() {
    let ctx = memory_context();

    let first = ctx.table("UserAccount").unwrap();
    assert_eq!(first.name(), "user_account");
    // app.models.UserAccountTable is not registered, so the closest
    // generic gateway for the memory connection is used.
    assert_eq!(first.class_name(), memory::TABLE_CLASS);

    let second = ctx.table("UserAccount").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(ctx.resolver().cached_count(), 1);
}

#[test]
fn test_specific_gateway_class_wins() {
    let mut ctx = memory_context();
    ctx.classes_mut()
        .register_table("app.models.UserAccountTable", memory::MemoryTable::create);
    ctx.classes_mut().register_record("app.models.UserAccount");

    let gateway = ctx.table("app.models.UserAccount").unwrap();
    assert_eq!(gateway.class_name(), "app.models.UserAccountTable");
    assert_eq!(gateway.record_class(&[]), "app.models.UserAccount");
}

#[test]
fn test_reconfiguration_replaces_cached_gateway() {
    let mut ctx = memory_context();
    let generic = ctx.table("UserAccount").unwrap();

    ctx.classes_mut()
        .register_table("app.models.UserAccountTable", memory::MemoryTable::create);
    let specific = ctx.table("UserAccount").unwrap();
    assert!(!Arc::ptr_eq(&generic, &specific));

    ctx.classes_mut()
        .unregister(Capability::Table, "app.models.UserAccountTable");
    let back = ctx.table("UserAccount").unwrap();
    assert!(!Arc::ptr_eq(&specific, &back));
    assert_eq!(back.class_name(), memory::TABLE_CLASS);
    assert_eq!(ctx.resolver().cached_count(), 1);
}

#[test]
fn test_unresolvable_gateway_is_unsupported() {
    let mut ctx = AppContext::new(ClassRegistry::new(), Coercions::default());
    let conn = scripted("app.models", "vendor.rest.Connection");
    ctx.connections_mut().register("rest", conn.clone());
    ctx.connections_mut().set_default("rest").unwrap();

    assert_eq!(
        ctx.classes()
            .resolve_gateway_class(Capability::Table, conn.as_ref()),
        None
    );
    let err = ctx.table("UserAccount").unwrap_err();
    assert!(matches!(err, GatewayError::UnsupportedOperation(_)));
    assert_eq!(ctx.resolver().cached_count(), 0);
}

#[test]
fn test_ancestor_namespace_fallback() {
    let mut classes = ClassRegistry::new();
    classes.register_table("vendor.Table", memory::MemoryTable::create);
    let mut ctx = AppContext::new(classes, Coercions::default());
    let conn = scripted("app.models", "vendor.rest.v2.Connection");
    ctx.connections_mut().register("rest", conn.clone());

    assert_eq!(
        ctx.classes()
            .resolve_gateway_class(Capability::Table, conn.as_ref()),
        Some("vendor.Table".to_string())
    );

    // The memory gateway refuses to run on a foreign connection.
    let err = ctx.factory("UserAccount", Some(&conn)).unwrap_err();
    assert!(matches!(err, GatewayError::UnsupportedOperation(_)));
    assert_eq!(ctx.resolver().cached_count(), 0);
}

#[test]
fn test_active_record_round_trip() {
    let ctx = memory_context();
    let users = ctx.table("UserAccount").unwrap();

    let mut record = users
        .new_record(vec![
            ("name".to_string(), "dora".into()),
            ("age".to_string(), "27".into()),
            ("roles".to_string(), "admin,editor".into()),
            ("joined".to_string(), "2023-05-06 07:08:09".into()),
        ])
        .unwrap();
    users.save(&mut record).unwrap();

    let id = record.get(users.identifier()).cloned().unwrap();
    let fetched = users.fetch(&FetchCriteria::Id(id)).unwrap().unwrap();

    assert_eq!(fetched.class(), memory::RECORD_CLASS);
    assert_eq!(fetched.get("age"), Some(&Value::Int(27)));
    assert_eq!(fetched.get("active"), Some(&Value::Bool(true)));
    assert_eq!(
        fetched.get("roles"),
        Some(&Value::Array(vec!["admin".into(), "editor".into()]))
    );
    assert!(matches!(fetched.get("joined"), Some(Value::DateTime(_))));
}

#[test]
fn test_invalid_field_type_rejects_record() {
    let ctx = memory_context();
    let users = ctx.table("UserAccount").unwrap();

    let err = users
        .new_record(vec![("joined".to_string(), "last tuesday".into())])
        .unwrap_err();
    assert!(matches!(err, GatewayError::InvalidType(_)));
}

#[test]
fn test_gateways_share_table_state() {
    let ctx = memory_context();
    let writer = ctx.table("UserAccount").unwrap();
    let mut record = writer.ghost(Value::Int(5));
    writer.save(&mut record).unwrap();

    ctx.resolver().clear();
    let reader = ctx.table("user_account").unwrap();
    assert!(!Arc::ptr_eq(&writer, &reader));
    assert_eq!(reader.fetch_all().unwrap().len(), 1);
}
