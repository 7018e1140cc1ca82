//! Load schema config from JSON and resolve it into a validated [`Schema`].

use crate::config::FullConfig;
use crate::error::ConfigError;
use crate::schema::{RecordDescriptor, Schema};
use std::path::Path;

/// Build the schema registry from full config. Fails on the first invalid record or relation.
pub fn resolve(config: &FullConfig) -> Result<Schema, ConfigError> {
    let mut schema = Schema::new();
    for record in &config.records {
        schema.insert(RecordDescriptor::from(record))?;
    }
    schema.check()?;
    tracing::debug!(records = config.records.len(), "schema resolved");
    Ok(schema)
}

pub fn load_from_str(json: &str) -> Result<FullConfig, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

/// Read a JSON schema config file.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<FullConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    load_from_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOP: &str = r#"{
        "records": [
            {
                "name": "user",
                "table": "user",
                "columns": [
                    { "name": "id", "auto": true },
                    { "name": "email", "nullable": false, "unique": true }
                ],
                "relations": [
                    { "name": "orders", "source": "id", "target": "order", "refer": "user_id", "relation": "to_many" }
                ]
            },
            {
                "name": "order",
                "table": "order",
                "permissions": ["insert"],
                "columns": [
                    { "name": "id", "auto": true },
                    { "name": "user_id", "nullable": false }
                ],
                "relations": [
                    { "name": "user", "source": "user_id", "target": "user", "refer": "id", "relation": "to_one" }
                ]
            }
        ]
    }"#;

    #[test]
    fn resolves_mutually_related_records() {
        let schema = resolve(&load_from_str(SHOP).unwrap()).unwrap();
        let order = schema.describe("order").unwrap();
        assert_eq!(order.permissions.len(), 1);
        assert_eq!(order.relations[0].target, "user");
        assert_eq!(schema.records().count(), 2);
    }

    #[test]
    fn dangling_relation_fails() {
        let mut config = load_from_str(SHOP).unwrap();
        config.records.pop();
        assert!(matches!(resolve(&config), Err(ConfigError::MissingReference { .. })));
    }

    #[test]
    fn malformed_json_is_load_error() {
        assert!(matches!(load_from_str("{ records: "), Err(ConfigError::Load(_))));
        assert!(matches!(
            load_from_path("/nonexistent/schema.json"),
            Err(ConfigError::Load(_))
        ));
    }
}
