//! Raw schema config types matching the JSON layout (`{ "records": [...] }`).

use crate::schema::{Cardinality, ColumnDescriptor, Permission, RecordDescriptor, RelationDescriptor};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    /// Record field bound to the column; defaults to the column name.
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    /// Maximum stringified length; omitted means unbounded.
    #[serde(default)]
    pub length: Option<usize>,
    #[serde(default)]
    pub scale: u32,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub auto: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelationConfig {
    pub name: String,
    #[serde(default)]
    pub field: Option<String>,
    pub source: String,
    pub target: String,
    pub refer: String,
    pub relation: Cardinality,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordConfig {
    pub name: String,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default = "default_permissions")]
    pub permissions: Vec<Permission>,
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub relations: Vec<RelationConfig>,
}

fn default_permissions() -> Vec<Permission> {
    Permission::ALL.to_vec()
}

/// All record configs in one struct for in-memory loading.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FullConfig {
    #[serde(default)]
    pub records: Vec<RecordConfig>,
}

impl From<&ColumnConfig> for ColumnDescriptor {
    fn from(c: &ColumnConfig) -> Self {
        ColumnDescriptor {
            name: c.name.clone(),
            field: c.field.clone().unwrap_or_else(|| c.name.clone()),
            nullable: c.nullable,
            unique: c.unique,
            max_length: c.length,
            scale: c.scale,
            primary: c.primary || c.auto,
            auto: c.auto,
        }
    }
}

impl From<&RelationConfig> for RelationDescriptor {
    fn from(r: &RelationConfig) -> Self {
        RelationDescriptor {
            name: r.name.clone(),
            field: r.field.clone().unwrap_or_else(|| r.name.clone()),
            source: r.source.clone(),
            target: r.target.clone(),
            refer: r.refer.clone(),
            cardinality: r.relation,
        }
    }
}

impl From<&RecordConfig> for RecordDescriptor {
    fn from(r: &RecordConfig) -> Self {
        RecordDescriptor {
            name: r.name.clone(),
            table: r.table.clone(),
            permissions: r.permissions.clone(),
            columns: r.columns.iter().map(ColumnDescriptor::from).collect(),
            relations: r.relations.iter().map(RelationDescriptor::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_follow_column_annotations() {
        let record: RecordConfig = serde_json::from_value(json!({
            "name": "user",
            "table": "user",
            "columns": [
                { "name": "id", "auto": true },
                { "name": "email", "nullable": false, "unique": true, "length": 255 },
                { "name": "display_name", "field": "displayName" }
            ]
        }))
        .unwrap();
        let descriptor = RecordDescriptor::from(&record);
        assert_eq!(descriptor.permissions, Permission::ALL.to_vec());
        assert!(descriptor.columns[0].is_auto_primary());
        assert_eq!(descriptor.columns[1].max_length, Some(255));
        assert!(!descriptor.columns[1].nullable);
        assert!(descriptor.columns[2].nullable);
        assert_eq!(descriptor.columns[2].field, "displayName");
    }

    #[test]
    fn relation_kinds_parse() {
        let relation: RelationConfig = serde_json::from_value(json!({
            "name": "orders", "source": "id", "target": "order", "refer": "user_id", "relation": "to_many"
        }))
        .unwrap();
        let descriptor = RelationDescriptor::from(&relation);
        assert_eq!(descriptor.cardinality, Cardinality::ToMany);
        assert_eq!(descriptor.field, "orders");
    }
}
