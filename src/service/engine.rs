//! Engine: runs one list/get/aggregate/insert/update/delete through the executor.
//!
//! Each call goes Build (verify, assemble SQL) → Execute → Materialize (rows, key or scalar)
//! → Expand (requested relations, recursively) → Return. Every method takes `&mut self`, so one
//! engine never has two calls in flight; use one engine per connection for concurrency.

use crate::config::Settings;
use crate::error::AppError;
use crate::executor::{Executor, Row};
use crate::query::{Expression, Function, Inclusion, Query};
use crate::schema::{
    field_value, from_record, parse_row, to_record, Access, Cardinality, ColumnDescriptor, Entity, Permission,
    Record, RecordDescriptor, Schema,
};
use crate::service::{ConstraintVerifier, RelationResolver};
use crate::sql::QueryBuilder;
use serde_json::Value;
use std::sync::Arc;

pub struct Engine<E> {
    executor: E,
    schema: Arc<Schema>,
    settings: Settings,
}

impl<E: Executor> Engine<E> {
    pub fn new(executor: E, schema: impl Into<Arc<Schema>>) -> Self {
        Self::with_settings(executor, schema, Settings::default())
    }

    pub fn with_settings(executor: E, schema: impl Into<Arc<Schema>>, settings: Settings) -> Self {
        Engine {
            executor,
            schema: schema.into(),
            settings,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    /// All rows matching `query`, with requested relations populated. Empty when nothing matches.
    pub fn list<T: Entity>(&mut self, query: &Query) -> Result<Vec<T>, AppError> {
        let record = self.schema.describe_type::<T>()?;
        self.fetch(&record, query, false, 0)?
            .into_iter()
            .map(from_record)
            .collect()
    }

    /// First row matching `query`, or `None`.
    pub fn get<T: Entity>(&mut self, query: &Query) -> Result<Option<T>, AppError> {
        let record = self.schema.describe_type::<T>()?;
        self.fetch(&record, query, true, 0)?
            .into_iter()
            .next()
            .map(from_record)
            .transpose()
    }

    /// Single scalar of `function` over the matching rows. `None` when `function` is unset
    /// (no SQL is issued) or the store returns NULL.
    pub fn aggregate<T: Entity>(&mut self, query: &Query, function: Option<Function>) -> Result<Option<Value>, AppError> {
        let record = self.schema.describe_type::<T>()?;
        self.aggregate_with(&record, query, function)
    }

    /// Insert `instance`; returns the generated primary key if the store produced one.
    /// `query.columns()` narrows the inserted columns.
    pub fn insert<T: Entity>(&mut self, instance: &T, query: &Query) -> Result<Option<i64>, AppError> {
        let record = self.schema.describe_type::<T>()?;
        self.insert_with(&record, &to_record(instance)?, query)
    }

    /// Update rows matching `query.expressions()`, or the instance's own row when there are none.
    pub fn update<T: Entity>(&mut self, instance: &T, query: &Query) -> Result<(), AppError> {
        let record = self.schema.describe_type::<T>()?;
        self.update_with(&record, &to_record(instance)?, query)
    }

    pub fn delete<T: Entity>(&mut self, instance: &T) -> Result<(), AppError> {
        let record = self.schema.describe_type::<T>()?;
        self.delete_instance(&record, &to_record(instance)?)
    }

    pub fn delete_by_key<T: Entity>(&mut self, key: impl Into<Value>) -> Result<(), AppError> {
        let record = self.schema.describe_type::<T>()?;
        self.delete_key(&record, key.into())
    }

    pub fn delete_where<T: Entity>(&mut self, query: &Query) -> Result<(), AppError> {
        let record = self.schema.describe_type::<T>()?;
        self.delete_matching(&record, query)
    }

    pub fn list_records(&mut self, record: &str, query: &Query) -> Result<Vec<Record>, AppError> {
        let record = self.schema.describe(record)?;
        self.fetch(&record, query, false, 0)
    }

    pub fn get_record(&mut self, record: &str, query: &Query) -> Result<Option<Record>, AppError> {
        let record = self.schema.describe(record)?;
        Ok(self.fetch(&record, query, true, 0)?.into_iter().next())
    }

    pub fn aggregate_records(
        &mut self,
        record: &str,
        query: &Query,
        function: Option<Function>,
    ) -> Result<Option<Value>, AppError> {
        let record = self.schema.describe(record)?;
        self.aggregate_with(&record, query, function)
    }

    pub fn insert_record(&mut self, record: &str, instance: &Record, query: &Query) -> Result<Option<i64>, AppError> {
        let record = self.schema.describe(record)?;
        self.insert_with(&record, instance, query)
    }

    pub fn update_record(&mut self, record: &str, instance: &Record, query: &Query) -> Result<(), AppError> {
        let record = self.schema.describe(record)?;
        self.update_with(&record, instance, query)
    }

    pub fn delete_record(&mut self, record: &str, instance: &Record) -> Result<(), AppError> {
        let record = self.schema.describe(record)?;
        self.delete_instance(&record, instance)
    }

    pub fn delete_record_by_key(&mut self, record: &str, key: Value) -> Result<(), AppError> {
        let record = self.schema.describe(record)?;
        self.delete_key(&record, key)
    }

    pub fn delete_records_where(&mut self, record: &str, query: &Query) -> Result<(), AppError> {
        let record = self.schema.describe(record)?;
        self.delete_matching(&record, query)
    }

    fn fetch(
        &mut self,
        record: &RecordDescriptor,
        query: &Query,
        first_only: bool,
        depth: usize,
    ) -> Result<Vec<Record>, AppError> {
        let table = record.table_name()?;
        let columns = record.columns_for(query.columns(), Access::Read)?;
        let projection = projection(query, &columns);
        let q = QueryBuilder::new(self.executor.dialect())
            .select(table, &projection)
            .filter(query.expressions())
            .order_by(query.sorts())
            .build();
        let rows: Vec<Row> = if first_only {
            self.executor.query_first(&q)?.into_iter().collect()
        } else {
            self.executor.query(&q)?
        };
        let mut records = rows
            .iter()
            .map(|row| parse_row(&columns, row))
            .collect::<Result<Vec<_>, _>>()?;
        if !records.is_empty() && !query.inclusions().is_empty() {
            self.expand(record, query.inclusions(), &mut records, depth)?;
        }
        Ok(records)
    }

    fn expand(
        &mut self,
        record: &RecordDescriptor,
        inclusions: &[Inclusion],
        records: &mut [Record],
        depth: usize,
    ) -> Result<(), AppError> {
        let bindings = RelationResolver::resolve(record, inclusions)?;
        if bindings.is_empty() {
            return Ok(());
        }
        if let Some(max) = self.settings.max_relation_depth {
            if depth >= max {
                return Err(AppError::Schema(format!(
                    "relation expansion from record {} exceeds the maximum depth of {}",
                    record.name, max
                )));
            }
        }
        let targets = bindings
            .iter()
            .map(|b| self.schema.describe(b.target()))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(record = %record.name, rows = records.len(), relations = bindings.len(), depth, "expanding relations");

        for row in records.iter_mut() {
            for (binding, target) in bindings.iter().zip(&targets) {
                let join_value = row.get(&binding.source_field).cloned().unwrap_or(Value::Null);
                let nested = binding.query_for(join_value);
                let value = match binding.cardinality() {
                    Cardinality::ToMany => Value::Array(
                        self.fetch(target, &nested, false, depth + 1)?
                            .into_iter()
                            .map(Value::Object)
                            .collect(),
                    ),
                    Cardinality::ToOne => self
                        .fetch(target, &nested, true, depth + 1)?
                        .into_iter()
                        .next()
                        .map_or(Value::Null, Value::Object),
                };
                row.insert(binding.target_field().to_string(), value);
            }
        }
        Ok(())
    }

    fn aggregate_with(
        &mut self,
        record: &RecordDescriptor,
        query: &Query,
        function: Option<Function>,
    ) -> Result<Option<Value>, AppError> {
        let Some(function) = function else {
            return Ok(None);
        };
        let table = record.table_name()?;
        let columns = record.columns_for(query.columns(), Access::Read)?;
        let projection = projection(query, &columns);
        let q = QueryBuilder::new(self.executor.dialect())
            .aggregate(table, &projection, function)
            .filter(query.expressions())
            .build();
        let row = self.executor.query_first(&q)?;
        Ok(row.and_then(|r| r.first().cloned()).filter(|v| !v.is_null()))
    }

    fn insert_with(
        &mut self,
        record: &RecordDescriptor,
        instance: &Record,
        query: &Query,
    ) -> Result<Option<i64>, AppError> {
        ConstraintVerifier::verify_permission(record, Permission::Insert)?;
        let table = record.table_name()?;
        let columns = record.columns_for(query.columns(), Access::Write)?;
        ConstraintVerifier::verify_non_nullable_insertion(&columns, &record.columns)?;
        ConstraintVerifier::verify_nullability(instance, &columns)?;
        ConstraintVerifier::verify_length(instance, &columns)?;

        for col in columns.iter().filter(|c| c.unique) {
            let value = field_value(instance, col);
            if value.is_null() {
                continue;
            }
            let lookup = Query::new().filter([Expression::eq(col.name.clone(), value.clone())]);
            if !self.fetch(record, &lookup, true, 0)?.is_empty() {
                return Err(AppError::Uniqueness(format!(
                    "the unique value {} of column {} already exists",
                    value, col.name
                )));
            }
        }

        let values = column_values(instance, &columns);
        let dialect = self.executor.dialect();
        let mut builder = QueryBuilder::new(dialect).insert(table, &values);
        if dialect.returns_generated_keys() {
            if let Some(primary) = record.columns.iter().find(|c| c.is_auto_primary()) {
                builder = builder.returning(&primary.name);
            }
        }
        let key = self.executor.insert(&builder.build())?;
        tracing::debug!(record = %record.name, key = ?key, "inserted");
        Ok(key)
    }

    fn update_with(&mut self, record: &RecordDescriptor, instance: &Record, query: &Query) -> Result<(), AppError> {
        ConstraintVerifier::verify_permission(record, Permission::Update)?;
        let table = record.table_name()?;
        let keys = if query.expressions().is_empty() {
            vec![primary_expression(record, instance)?]
        } else {
            query.expressions().to_vec()
        };
        let columns: Vec<&ColumnDescriptor> = record
            .columns_for(query.columns(), Access::Write)?
            .into_iter()
            .filter(|c| !c.primary)
            .collect();
        if columns.is_empty() {
            return Err(AppError::Schema(format!("record {} has no columns to update", record.name)));
        }
        ConstraintVerifier::verify_nullability(instance, &columns)?;
        ConstraintVerifier::verify_length(instance, &columns)?;

        let unique: Vec<&ColumnDescriptor> = columns.iter().copied().filter(|c| c.unique).collect();
        if !unique.is_empty() {
            let primary = record.primary_column()?;
            for col in unique {
                let value = field_value(instance, col);
                if value.is_null() {
                    continue;
                }
                let lookup = Query::new().filter([Expression::eq(col.name.clone(), value)]);
                for existing in self.fetch(record, &lookup, false, 0)? {
                    ConstraintVerifier::verify_uniqueness(instance, &existing, primary, col)?;
                }
            }
        }

        let values = column_values(instance, &columns);
        let q = QueryBuilder::new(self.executor.dialect())
            .update(table, &values)
            .filter(&keys)
            .build();
        let count = self.executor.execute(&q)?;
        tracing::debug!(record = %record.name, rows = count, "updated");
        Ok(())
    }

    fn delete_instance(&mut self, record: &RecordDescriptor, instance: &Record) -> Result<(), AppError> {
        ConstraintVerifier::verify_permission(record, Permission::Delete)?;
        let key = primary_expression(record, instance)?;
        self.run_delete(record, &[key])
    }

    fn delete_key(&mut self, record: &RecordDescriptor, key: Value) -> Result<(), AppError> {
        ConstraintVerifier::verify_permission(record, Permission::Delete)?;
        let primary = record.primary_column()?;
        if key.is_null() {
            return Err(AppError::Nullability(format!(
                "cannot delete from record {} by a null {}",
                record.name, primary.name
            )));
        }
        self.run_delete(record, &[Expression::eq(primary.name.clone(), key)])
    }

    fn delete_matching(&mut self, record: &RecordDescriptor, query: &Query) -> Result<(), AppError> {
        ConstraintVerifier::verify_permission(record, Permission::Delete)?;
        if query.expressions().is_empty() {
            return Err(AppError::Schema(format!(
                "refusing to delete from record {} without a filter",
                record.name
            )));
        }
        self.run_delete(record, query.expressions())
    }

    fn run_delete(&mut self, record: &RecordDescriptor, keys: &[Expression]) -> Result<(), AppError> {
        let table = record.table_name()?;
        let q = QueryBuilder::new(self.executor.dialect())
            .delete(table)
            .filter(keys)
            .build();
        let count = self.executor.execute(&q)?;
        tracing::debug!(record = %record.name, rows = count, "deleted");
        Ok(())
    }
}

/// Explicit column names when the caller projected, otherwise `*`.
fn projection<'a>(query: &Query, columns: &[&'a ColumnDescriptor]) -> Vec<&'a str> {
    if query.columns().is_empty() {
        Vec::new()
    } else {
        columns.iter().map(|c| c.name.as_str()).collect()
    }
}

fn column_values<'a>(instance: &Record, columns: &[&'a ColumnDescriptor]) -> Vec<(&'a str, Value)> {
    columns
        .iter()
        .map(|c| (c.name.as_str(), field_value(instance, c)))
        .collect()
}

/// `<primary> = <instance's key>`; the instance must carry a key value.
fn primary_expression(record: &RecordDescriptor, instance: &Record) -> Result<Expression, AppError> {
    let primary = record.primary_column()?;
    let value = field_value(instance, primary);
    if value.is_null() {
        return Err(AppError::Nullability(format!(
            "record {} has no value for primary column {}",
            record.name, primary.name
        )));
    }
    Ok(Expression::eq(primary.name.clone(), value))
}
