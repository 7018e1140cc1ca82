//! Record, column and relation descriptors: the per-type metadata the engine works from.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Write operation a record type may allow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Insert,
    Update,
    Delete,
}

impl Permission {
    pub const ALL: [Permission; 3] = [Permission::Insert, Permission::Update, Permission::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Insert => "INSERT",
            Permission::Update => "UPDATE",
            Permission::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    ToOne,
    ToMany,
}

/// Whether a column set is wanted for reading or for writing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Record field bound to this column.
    pub field: String,
    pub nullable: bool,
    pub unique: bool,
    /// Maximum stringified length; `None` is unbounded.
    pub max_length: Option<usize>,
    pub scale: u32,
    pub primary: bool,
    /// Value generated by the store on insert. Only meaningful on the primary column.
    pub auto: bool,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        ColumnDescriptor {
            field: name.clone(),
            name,
            nullable: true,
            unique: false,
            max_length: None,
            scale: 0,
            primary: false,
            auto: false,
        }
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn max_length(mut self, length: usize) -> Self {
        self.max_length = Some(length);
        self
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Primary key generated by the store.
    pub fn auto(mut self) -> Self {
        self.primary = true;
        self.auto = true;
        self
    }

    /// Auto-generated primaries are exempt from not-null and insertion checks.
    pub fn is_auto_primary(&self) -> bool {
        self.primary && self.auto
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RelationDescriptor {
    /// Reference name callers include by; disambiguates several relations to one target.
    pub name: String,
    /// Record field receiving the related data.
    pub field: String,
    /// Column on this record holding the join value.
    pub source: String,
    /// Name of the related record type.
    pub target: String,
    /// Column on the related record matched against `source`.
    pub refer: String,
    pub cardinality: Cardinality,
}

impl RelationDescriptor {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        refer: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        let name = name.into();
        RelationDescriptor {
            field: name.clone(),
            name,
            source: source.into(),
            target: target.into(),
            refer: refer.into(),
            cardinality,
        }
    }

    pub fn to_one(
        name: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        refer: impl Into<String>,
    ) -> Self {
        Self::new(name, source, target, refer, Cardinality::ToOne)
    }

    pub fn to_many(
        name: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        refer: impl Into<String>,
    ) -> Self {
        Self::new(name, source, target, refer, Cardinality::ToMany)
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }
}

/// Everything the engine knows about one record type. Read-only once registered.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordDescriptor {
    pub name: String,
    pub table: Option<String>,
    pub permissions: Vec<Permission>,
    /// In declaration order; drives default projection and write column order.
    pub columns: Vec<ColumnDescriptor>,
    pub relations: Vec<RelationDescriptor>,
}

impl RecordDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        RecordDescriptor {
            name: name.into(),
            table: None,
            permissions: Permission::ALL.to_vec(),
            columns: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn permissions<I>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = Permission>,
    {
        self.permissions = permissions.into_iter().collect();
        self
    }

    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    pub fn relation(mut self, relation: RelationDescriptor) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn table_name(&self) -> Result<&str, AppError> {
        self.table
            .as_deref()
            .ok_or_else(|| AppError::Schema(format!("record {} has no table metadata", self.name)))
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    pub fn column_named(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_column(&self) -> Result<&ColumnDescriptor, AppError> {
        self.columns
            .iter()
            .find(|c| c.primary)
            .ok_or_else(|| AppError::Schema(format!("record {} does not have a primary column", self.name)))
    }

    /// Columns for an operation, in declaration order regardless of the order of `names`.
    /// Empty `names`: every column for reads, every non-auto column for writes.
    pub fn columns_for(&self, names: &[String], access: Access) -> Result<Vec<&ColumnDescriptor>, AppError> {
        if names.is_empty() {
            return Ok(self
                .columns
                .iter()
                .filter(|c| access == Access::Read || !c.is_auto_primary())
                .collect());
        }
        if let Some(missing) = names.iter().find(|n| self.column_named(n).is_none()) {
            return Err(AppError::Schema(format!(
                "record {} has no column named {}",
                self.name, missing
            )));
        }
        Ok(self
            .columns
            .iter()
            .filter(|c| names.iter().any(|n| *n == c.name))
            .collect())
    }
}
