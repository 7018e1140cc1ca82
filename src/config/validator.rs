//! Descriptor validation: per-record consistency and cross-record relation integrity.

use crate::error::ConfigError;
use crate::schema::RecordDescriptor;
use std::collections::HashSet;

/// Checks that need only the record itself.
pub fn validate_record(record: &RecordDescriptor) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for c in &record.columns {
        if !names.insert(c.name.as_str()) {
            return Err(ConfigError::DuplicateColumn {
                record: record.name.clone(),
                column: c.name.clone(),
            });
        }
        if c.auto && !c.primary {
            return Err(ConfigError::InvalidAutoColumn {
                record: record.name.clone(),
                column: c.name.clone(),
            });
        }
    }
    if record.columns.iter().filter(|c| c.primary).count() > 1 {
        return Err(ConfigError::MultiplePrimary(record.name.clone()));
    }
    for rel in &record.relations {
        if !names.contains(rel.source.as_str()) {
            return Err(ConfigError::MissingReference {
                kind: "relation source column",
                id: format!("{}.{}", record.name, rel.source),
            });
        }
    }
    Ok(())
}

/// Every relation must point at a known record and an existing column on it.
pub fn validate_relations<'a, I, F>(records: I, lookup: F) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = &'a RecordDescriptor>,
    F: Fn(&str) -> Option<&'a RecordDescriptor>,
{
    for record in records {
        for rel in &record.relations {
            let target = lookup(&rel.target).ok_or_else(|| ConfigError::MissingReference {
                kind: "relation target",
                id: rel.target.clone(),
            })?;
            if target.column_named(&rel.refer).is_none() {
                return Err(ConfigError::MissingReference {
                    kind: "relation target column",
                    id: format!("{}.{}", target.name, rel.refer),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDescriptor, RelationDescriptor};

    fn order() -> RecordDescriptor {
        RecordDescriptor::new("order")
            .table("order")
            .column(ColumnDescriptor::new("id").primary())
            .column(ColumnDescriptor::new("user_id"))
            .relation(RelationDescriptor::to_one("user", "user_id", "user", "id"))
    }

    #[test]
    fn rejects_local_inconsistencies() {
        let two_primaries = order().column(ColumnDescriptor::new("code").primary());
        assert!(matches!(
            validate_record(&two_primaries),
            Err(ConfigError::MultiplePrimary(_))
        ));

        let duplicate = order().column(ColumnDescriptor::new("user_id"));
        assert!(matches!(
            validate_record(&duplicate),
            Err(ConfigError::DuplicateColumn { .. })
        ));

        let mut auto = ColumnDescriptor::new("seq");
        auto.auto = true;
        assert!(matches!(
            validate_record(&order().column(auto)),
            Err(ConfigError::InvalidAutoColumn { .. })
        ));

        let bad_source = order().relation(RelationDescriptor::to_one("x", "nope", "user", "id"));
        assert!(matches!(
            validate_record(&bad_source),
            Err(ConfigError::MissingReference { .. })
        ));

        assert!(validate_record(&order()).is_ok());
    }

    #[test]
    fn relations_need_target_and_column() {
        let order = order();
        let user = RecordDescriptor::new("user").column(ColumnDescriptor::new("id").auto());
        let records = [order.clone(), user.clone()];
        let lookup = |name: &str| records.iter().find(|r| r.name == name);
        assert!(validate_relations(records.iter(), lookup).is_ok());

        let only_order = [order];
        let lookup = |name: &str| only_order.iter().find(|r| r.name == name);
        assert!(validate_relations(only_order.iter(), lookup).is_err());

        let renamed = RecordDescriptor::new("user").column(ColumnDescriptor::new("uid").auto());
        let records = [only_order[0].clone(), renamed];
        let lookup = |name: &str| records.iter().find(|r| r.name == name);
        assert!(validate_relations(records.iter(), lookup).is_err());
    }
}
