//! Convert serde_json::Value to types that sqlx can bind.

use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::Database;

/// PostgreSQL `unknown` pseudo-type; lets the server infer the type of a NULL parameter.
const UNKNOWN_OID: u32 = 705;

/// A value that can be bound to a PostgreSQL query. Converts from serde_json::Value.
///
/// Strings that parse as a UUID bind as `uuid`, so filters and writes on uuid key columns work
/// without casts. Comparing such a string against a `text` column fails on the server with
/// `operator does not exist: text = uuid`; cast the column in that case (`col::uuid`) or store
/// UUIDs in uuid columns.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Uuid(uuid::Uuid),
    Json(Value),
}

impl From<&Value> for PgBindValue {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => PgBindValue::Null,
            Value::Bool(b) => PgBindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    PgBindValue::I64(i)
                } else if let Some(f) = n.as_f64() {
                    PgBindValue::F64(f)
                } else {
                    PgBindValue::Json(v.clone())
                }
            }
            Value::String(s) => match uuid::Uuid::parse_str(s) {
                Ok(u) => PgBindValue::Uuid(u),
                Err(_) => PgBindValue::String(s.clone()),
            },
            Value::Array(_) | Value::Object(_) => PgBindValue::Json(v.clone()),
        }
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            PgBindValue::Null => IsNull::Yes,
            PgBindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::String(s) => {
                let s_ref: &str = s.as_str();
                <&str as Encode<Postgres>>::encode_by_ref(&s_ref, buf)?
            }
            PgBindValue::Uuid(u) => <uuid::Uuid as Encode<Postgres>>::encode_by_ref(u, buf)?,
            PgBindValue::Json(v) => <serde_json::Value as Encode<Postgres>>::encode_by_ref(v, buf)?,
        })
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            PgBindValue::Null => PgTypeInfo::with_oid(Oid(UNKNOWN_OID)),
            PgBindValue::Bool(_) => <bool as sqlx::Type<Postgres>>::type_info(),
            PgBindValue::I64(_) => <i64 as sqlx::Type<Postgres>>::type_info(),
            PgBindValue::F64(_) => <f64 as sqlx::Type<Postgres>>::type_info(),
            PgBindValue::String(_) => <String as sqlx::Type<Postgres>>::type_info(),
            PgBindValue::Uuid(_) => <uuid::Uuid as sqlx::Type<Postgres>>::type_info(),
            PgBindValue::Json(_) => <serde_json::Value as sqlx::Type<Postgres>>::type_info(),
        })
    }
}

impl sqlx::Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_values_pick_bind_types() {
        assert_eq!(PgBindValue::from(&json!(null)), PgBindValue::Null);
        assert_eq!(PgBindValue::from(&json!(3)), PgBindValue::I64(3));
        assert_eq!(PgBindValue::from(&json!(1.5)), PgBindValue::F64(1.5));
        assert_eq!(PgBindValue::from(&json!("a@x.com")), PgBindValue::String("a@x.com".into()));
        assert!(matches!(
            PgBindValue::from(&json!("67e55044-10b1-426f-9247-bb680e5fe0c8")),
            PgBindValue::Uuid(_)
        ));
        assert!(matches!(PgBindValue::from(&json!({"a": 1})), PgBindValue::Json(_)));
    }

    #[test]
    fn only_well_formed_uuids_bind_as_uuid() {
        let bound = PgBindValue::from(&json!("67e55044-10b1-426f-9247-bb680e5fe0c8"));
        assert_eq!(
            bound.produces(),
            Some(<uuid::Uuid as sqlx::Type<Postgres>>::type_info())
        );
        let text = PgBindValue::from(&json!("67e55044-not-a-uuid"));
        assert_eq!(text, PgBindValue::String("67e55044-not-a-uuid".into()));
        assert_eq!(text.produces(), Some(<String as sqlx::Type<Postgres>>::type_info()));
    }
}
