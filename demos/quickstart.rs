//! Quickstart: load a JSON schema, write a few rows into in-memory SQLite, read them back with
//! relations expanded.
//!
//! Run: `cargo run --example quickstart`. Set `RELMAP_SCHEMA` to use another schema file.

use relmap::{
    load_from_path, resolve, Engine, Expression, Function, Inclusion, Query, Record, Settings, Sort,
    SqliteExecutor,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

const TABLES: &str = r#"
    CREATE TABLE "user" (id INTEGER PRIMARY KEY AUTOINCREMENT, email TEXT NOT NULL UNIQUE, name TEXT);
    CREATE TABLE "order" (id INTEGER PRIMARY KEY AUTOINCREMENT, user_id INTEGER NOT NULL, total REAL NOT NULL);
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("relmap=info")),
        )
        .init();

    let schema_path = std::env::var("RELMAP_SCHEMA")
        .unwrap_or_else(|_| concat!(env!("CARGO_MANIFEST_DIR"), "/demos/schema.json").into());
    let schema = resolve(&load_from_path(&schema_path)?)?;

    let executor = SqliteExecutor::in_memory()?;
    executor.execute_batch(TABLES)?;
    let mut engine = Engine::with_settings(executor, schema, Settings::from_env());

    let ada = record(json!({ "email": "ada@example.com", "name": "Ada" }));
    let ada_id = engine.insert_record("user", &ada, &Query::new())?;
    tracing::info!(key = ?ada_id, "inserted user");

    for total in [12.5, 40.0, 7.25] {
        let order = record(json!({ "userId": ada_id, "total": total }));
        engine.insert_record("order", &order, &Query::new())?;
    }

    let users = engine.list_records(
        "user",
        &Query::new().include([Inclusion::new("orders").query(Query::new().sort_by([Sort::desc("total")]))]),
    )?;
    println!("{}", serde_json::to_string_pretty(&users)?);

    let spent = engine.aggregate_records(
        "order",
        &Query::new()
            .project(["total"])
            .filter([Expression::eq("user_id", ada_id)]),
        Some(Function::Sum),
    )?;
    tracing::info!(spent = ?spent, "total spent");

    let order = engine.get_record(
        "order",
        &Query::new()
            .sort_by([Sort::asc("id")])
            .include([Inclusion::new("owner")]),
    )?;
    println!("{}", serde_json::to_string_pretty(&order)?);
    Ok(())
}

fn record(value: serde_json::Value) -> Record {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Record::new(),
    }
}
