//! Schema registry: record descriptors by name, typed dispatch for `Entity` types, row parsing.

mod descriptor;
pub use descriptor::*;

use crate::config::{validate_record, validate_relations};
use crate::error::{AppError, ConfigError};
use crate::executor::Row;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// A materialized row (or a record about to be written), keyed by field name.
pub type Record = Map<String, Value>;

/// A Rust type mapped to one table. Fields that a projection leaves out need `#[serde(default)]`.
pub trait Entity: Serialize + DeserializeOwned + 'static {
    fn descriptor() -> RecordDescriptor;
}

#[derive(Clone, Debug, Default)]
pub struct Schema {
    records: HashMap<String, Arc<RecordDescriptor>>,
    types: HashMap<TypeId, String>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor under its name. Relations may point at records registered later;
    /// call [`Schema::check`] once everything is in.
    pub fn insert(&mut self, descriptor: RecordDescriptor) -> Result<(), ConfigError> {
        validate_record(&descriptor)?;
        if self.records.contains_key(&descriptor.name) {
            return Err(ConfigError::DuplicateRecord(descriptor.name));
        }
        self.records.insert(descriptor.name.clone(), Arc::new(descriptor));
        Ok(())
    }

    pub fn register<T: Entity>(&mut self) -> Result<(), ConfigError> {
        let descriptor = T::descriptor();
        let name = descriptor.name.clone();
        self.insert(descriptor)?;
        self.types.insert(TypeId::of::<T>(), name);
        Ok(())
    }

    /// Validate relations across all registered records.
    pub fn check(&self) -> Result<(), ConfigError> {
        validate_relations(self.records.values().map(|r| r.as_ref()), |name| {
            self.records.get(name).map(|r| r.as_ref())
        })
    }

    /// Descriptor of a record type that is usable for SQL: registered and carrying table metadata.
    pub fn describe(&self, name: &str) -> Result<Arc<RecordDescriptor>, AppError> {
        let descriptor = self
            .records
            .get(name)
            .ok_or_else(|| AppError::Schema(format!("record {} is not registered", name)))?;
        descriptor.table_name()?;
        Ok(descriptor.clone())
    }

    pub fn describe_type<T: Entity>(&self) -> Result<Arc<RecordDescriptor>, AppError> {
        let name = self.types.get(&TypeId::of::<T>()).ok_or_else(|| {
            AppError::Schema(format!("type {} is not registered", std::any::type_name::<T>()))
        })?;
        self.describe(name)
    }

    pub fn records(&self) -> impl Iterator<Item = &RecordDescriptor> {
        self.records.values().map(|r| r.as_ref())
    }
}

/// Read each requested column from `row` by name into its bound field.
pub fn parse_row(columns: &[&ColumnDescriptor], row: &Row) -> Result<Record, AppError> {
    let mut record = Record::new();
    for column in columns {
        let value = row
            .get(&column.name)
            .ok_or_else(|| AppError::Schema(format!("result row has no column named {}", column.name)))?;
        record.insert(column.field.clone(), value.clone());
    }
    Ok(record)
}

/// Value of the field bound to `column`; absent fields read as null.
pub fn field_value(record: &Record, column: &ColumnDescriptor) -> Value {
    record.get(&column.field).cloned().unwrap_or(Value::Null)
}

pub fn to_record<T: Serialize>(instance: &T) -> Result<Record, AppError> {
    match serde_json::to_value(instance) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(AppError::Schema(format!(
            "record must serialize to an object, got {}",
            other
        ))),
        Err(e) => Err(AppError::Schema(format!("cannot serialize record: {}", e))),
    }
}

pub fn from_record<T: DeserializeOwned>(record: Record) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(record))
        .map_err(|e| AppError::Schema(format!("cannot map row into {}: {}", std::any::type_name::<T>(), e)))
}
