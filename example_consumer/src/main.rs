//! Example consumer: a separate Rust project that maps its own types with relmap.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Needs `DATABASE_URL` pointing at a Postgres database the user may create tables in.

use relmap::{
    ColumnDescriptor, Engine, Entity, Expression, Inclusion, PgExecutor, Query, RecordDescriptor,
    RelationDescriptor, Schema, Settings,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Author {
    id: Option<i64>,
    handle: String,
    posts: Vec<Post>,
}

impl Entity for Author {
    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::new("author")
            .table("author")
            .column(ColumnDescriptor::new("id").auto())
            .column(ColumnDescriptor::new("handle").not_null().unique().max_length(32))
            .relation(RelationDescriptor::to_many("posts", "id", "post", "author_id"))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Post {
    id: Option<i64>,
    #[serde(rename = "authorId")]
    author_id: i64,
    title: String,
}

impl Entity for Post {
    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::new("post")
            .table("post")
            .column(ColumnDescriptor::new("id").auto())
            .column(ColumnDescriptor::new("author_id").field("authorId").not_null())
            .column(ColumnDescriptor::new("title").not_null().max_length(120))
    }
}

const TABLES: &str = r#"
    CREATE TABLE IF NOT EXISTS author (id BIGSERIAL PRIMARY KEY, handle TEXT NOT NULL UNIQUE);
    CREATE TABLE IF NOT EXISTS post (id BIGSERIAL PRIMARY KEY, author_id BIGINT NOT NULL, title TEXT NOT NULL);
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("relmap=info")),
        )
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/relmap".into());
    let mut executor = PgExecutor::connect(&database_url)?;
    executor.execute_batch(TABLES)?;

    let mut schema = Schema::new();
    schema.register::<Author>()?;
    schema.register::<Post>()?;
    schema.check()?;
    let mut engine = Engine::with_settings(executor, schema, Settings::from_env());

    let handle = "grace";
    let author = match engine.get::<Author>(&Query::new().filter([Expression::eq("handle", handle)]))? {
        Some(existing) => existing,
        None => {
            let id = engine.insert(&Author { handle: handle.into(), ..Default::default() }, &Query::new())?;
            Author { id, handle: handle.into(), posts: Vec::new() }
        }
    };
    let author_id = author.id.ok_or("author has no key")?;

    engine.insert(
        &Post { author_id, title: "Notes on compilers".into(), ..Default::default() },
        &Query::new(),
    )?;

    let authors = engine.list::<Author>(
        &Query::new()
            .filter([Expression::eq("id", author_id)])
            .include([Inclusion::new("posts")]),
    )?;
    for a in &authors {
        tracing::info!(handle = %a.handle, posts = a.posts.len(), "author");
    }

    engine.into_executor().close()?;
    Ok(())
}
