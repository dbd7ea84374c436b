//! Record model for tablegate.
//!
//! A record is one row: the name of its record class plus field values in
//! insertion order. It has no identity beyond that.

use crate::value::Value;

/// One row produced by a table gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    class: String,
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Create an empty record of the given class.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            fields: Vec::new(),
        }
    }

    /// Create a ghost record: only the identifier field is populated.
    pub fn ghost(class: impl Into<String>, identifier: &str, id: Value) -> Self {
        Self::new(class).with(identifier, id)
    }

    /// Builder-style setter.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Fully-qualified record class name.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Get a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == field).map(|(_, v)| v)
    }

    /// Set a field value, keeping the original position of existing fields.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| k == field) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field.to_string(), value)),
        }
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        let pos = self.fields.iter().position(|(k, _)| k == field)?;
        Some(self.fields.remove(pos).1)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Field names in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Field name/value pairs in insertion order.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check if this record only carries its identifier.
    pub fn is_ghost(&self, identifier: &str) -> bool {
        self.fields.len() == 1 && self.contains(identifier)
    }
}
