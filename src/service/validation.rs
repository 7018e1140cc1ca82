//! Write-side checks against column descriptors and record permissions. Run before any SQL.

use crate::error::AppError;
use crate::schema::{field_value, ColumnDescriptor, Permission, Record, RecordDescriptor};
use serde_json::Value;

pub struct ConstraintVerifier;

impl ConstraintVerifier {
    pub fn verify_permission(record: &RecordDescriptor, permission: Permission) -> Result<(), AppError> {
        if !record.allows(permission) {
            return Err(AppError::Permission(format!(
                "record {} does not have the {} permission",
                record.name, permission
            )));
        }
        Ok(())
    }

    /// Non-nullable columns must hold a value. Auto-generated primaries are exempt.
    pub fn verify_nullability(instance: &Record, columns: &[&ColumnDescriptor]) -> Result<(), AppError> {
        for col in columns {
            if col.nullable || col.is_auto_primary() {
                continue;
            }
            if field_value(instance, col).is_null() {
                return Err(AppError::Nullability(format!("field {} contains null value", col.field)));
            }
        }
        Ok(())
    }

    /// Stringified values must fit the column's max length; unbounded columns are exempt.
    pub fn verify_length(instance: &Record, columns: &[&ColumnDescriptor]) -> Result<(), AppError> {
        for col in columns {
            let Some(max) = col.max_length else { continue };
            let length = stringified_len(&field_value(instance, col));
            if length > max {
                return Err(AppError::Length(format!(
                    "the value length of field {} is {}, which is larger than its configured limit of {}",
                    col.field, length, max
                )));
            }
        }
        Ok(())
    }

    /// Every non-nullable, non-auto column must be among the inserted columns.
    pub fn verify_non_nullable_insertion(
        insert_columns: &[&ColumnDescriptor],
        all_columns: &[ColumnDescriptor],
    ) -> Result<(), AppError> {
        for col in all_columns {
            if col.nullable || col.is_auto_primary() {
                continue;
            }
            if !insert_columns.iter().any(|c| c.name == col.name) {
                return Err(AppError::Nullability(format!(
                    "non-nullable column {} is not marked for insertion",
                    col.name
                )));
            }
        }
        Ok(())
    }

    /// A row found by probing a unique value is only acceptable if it is the source row itself.
    pub fn verify_uniqueness(
        source: &Record,
        conflicting: &Record,
        primary: &ColumnDescriptor,
        unique: &ColumnDescriptor,
    ) -> Result<(), AppError> {
        let source_key = field_value(source, primary);
        let conflicting_key = field_value(conflicting, primary);
        if source_key.is_null() || source_key != conflicting_key {
            return Err(AppError::Uniqueness(format!(
                "the unique value {} of column {} already exists",
                field_value(conflicting, unique),
                unique.name
            )));
        }
        Ok(())
    }
}

fn stringified_len(v: &Value) -> usize {
    match v {
        Value::Null => 0,
        Value::String(s) => s.chars().count(),
        other => other.to_string().chars().count(),
    }
}
