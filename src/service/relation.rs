//! Matches requested inclusions against declared relations and prepares the nested fetch.

use crate::error::AppError;
use crate::query::{Expression, Inclusion, Query};
use crate::schema::{Cardinality, RecordDescriptor, RelationDescriptor};
use serde_json::Value;

/// One relation to populate: where the join value comes from, where the result goes,
/// and the query to run against the target (its first filter is the join predicate).
#[derive(Clone, Debug)]
pub struct RelationBinding<'a> {
    pub relation: &'a RelationDescriptor,
    /// Field on the source record holding the join value.
    pub source_field: String,
    query: Query,
}

impl RelationBinding<'_> {
    pub fn target(&self) -> &str {
        &self.relation.target
    }

    /// Field on the source record receiving the related data.
    pub fn target_field(&self) -> &str {
        &self.relation.field
    }

    pub fn cardinality(&self) -> Cardinality {
        self.relation.cardinality
    }

    /// Nested query with the join placeholder filled for one source row.
    pub fn query_for(&self, join_value: Value) -> Query {
        let mut query = self.query.clone();
        if let Some(first) = query.expressions_mut().first_mut() {
            first.value = join_value;
        }
        query
    }
}

pub struct RelationResolver;

impl RelationResolver {
    /// Bindings for every declared relation that a requested inclusion names. Unmatched relations
    /// and unmatched inclusions are skipped.
    pub fn resolve<'a>(
        record: &'a RecordDescriptor,
        inclusions: &[Inclusion],
    ) -> Result<Vec<RelationBinding<'a>>, AppError> {
        let mut bindings = Vec::new();
        for relation in &record.relations {
            let Some(inclusion) = inclusions.iter().find(|inc| matches(inc, relation)) else {
                continue;
            };
            let source = record.column_named(&relation.source).ok_or_else(|| {
                AppError::Schema(format!(
                    "relation {} on record {} uses unknown column {}",
                    relation.name, record.name, relation.source
                ))
            })?;
            let mut query = inclusion.query.clone();
            query.prepend_expression(Expression::eq(relation.refer.clone(), Value::Null));
            bindings.push(RelationBinding {
                relation,
                source_field: source.field.clone(),
                query,
            });
        }
        for inc in inclusions {
            if !record.relations.iter().any(|r| matches(inc, r)) {
                tracing::debug!(record = %record.name, inclusion = %inc.name, "inclusion matches no relation; ignored");
            }
        }
        Ok(bindings)
    }
}

fn matches(inclusion: &Inclusion, relation: &RelationDescriptor) -> bool {
    inclusion.name == relation.name
        && inclusion
            .target
            .as_deref()
            .map_or(true, |target| target == relation.target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Operator, Sort};
    use crate::schema::ColumnDescriptor;
    use serde_json::json;

    fn user() -> RecordDescriptor {
        RecordDescriptor::new("user")
            .table("user")
            .column(ColumnDescriptor::new("id").auto())
            .column(ColumnDescriptor::new("manager_id").field("managerId"))
            .relation(RelationDescriptor::to_many("orders", "id", "order", "user_id"))
            .relation(RelationDescriptor::to_one("manager", "manager_id", "user", "id"))
    }

    #[test]
    fn only_requested_relations_bind() {
        let user = user();
        let bindings = RelationResolver::resolve(
            &user,
            &[Inclusion::new("manager"), Inclusion::new("unknown")],
        )
        .unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].target(), "user");
        assert_eq!(bindings[0].source_field, "managerId");
        assert_eq!(bindings[0].target_field(), "manager");
        assert_eq!(bindings[0].cardinality(), Cardinality::ToOne);
    }

    #[test]
    fn target_must_match_when_given() {
        let user = user();
        let bindings =
            RelationResolver::resolve(&user, &[Inclusion::new("orders").target("invoice")]).unwrap();
        assert!(bindings.is_empty());
        let bindings =
            RelationResolver::resolve(&user, &[Inclusion::new("orders").target("order")]).unwrap();
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn join_predicate_goes_first_and_is_filled_per_row() {
        let user = user();
        let inclusion = Inclusion::new("orders").query(
            Query::new()
                .filter([Expression::new("total", Operator::Greater, 10)])
                .sort_by([Sort::desc("id")]),
        );
        let bindings = RelationResolver::resolve(&user, &[inclusion]).unwrap();
        let query = bindings[0].query_for(json!(7));
        assert_eq!(query.expressions().len(), 2);
        assert_eq!(query.expressions()[0], Expression::eq("user_id", 7));
        assert_eq!(query.expressions()[1].column, "total");
        assert_eq!(query.sorts().len(), 1);

        let other = bindings[0].query_for(json!(8));
        assert_eq!(other.expressions()[0].value, json!(8));
    }
}
