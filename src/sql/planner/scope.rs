use std::sync::Arc;

use crate::{
    catalog::defs::BaseRelationSchema,
    core::{ErrorKind, SQLError},
    sql::{expression::BoundAttribute, statement::AttributeName},
};

/// Scope keeps track of the relations visible to a query, in FROM order,
/// and resolves attribute names against them.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub relations: Vec<Arc<BaseRelationSchema>>,
}

impl Scope {
    pub fn new(relations: Vec<Arc<BaseRelationSchema>>) -> Self {
        Self { relations }
    }

    pub fn resolve_attribute(&self, name: &AttributeName) -> Result<BoundAttribute, SQLError> {
        match &name.relation {
            Some(relation_name) => {
                let relation = self
                    .relations
                    .iter()
                    .find(|relation| relation.name() == relation_name)
                    .ok_or_else(|| {
                        SQLError::new(
                            ErrorKind::UnresolvedRelation,
                            format!("relation {} of {} is not in FROM", relation_name, name),
                        )
                    })?;

                let position = relation.position(&name.attribute).ok_or_else(|| {
                    SQLError::new(
                        ErrorKind::UnknownAttribute,
                        format!("relation {} has no attribute {}", relation_name, name.attribute),
                    )
                })?;

                Ok(BoundAttribute::new(relation.clone(), position))
            }

            None => {
                let mut candidates = self
                    .relations
                    .iter()
                    .filter_map(|relation| {
                        relation
                            .position(&name.attribute)
                            .map(|position| BoundAttribute::new(relation.clone(), position))
                    })
                    .collect::<Vec<_>>();

                if candidates.len() > 1 {
                    return Err(SQLError::new(
                        ErrorKind::AmbiguousAttribute,
                        format!(
                            "attribute {} is ambiguous, candidates: {}",
                            name.attribute,
                            candidates
                                .iter()
                                .map(|c| c.qualified_name())
                                .collect::<Vec<_>>()
                                .join(", ")
                        ),
                    ));
                }

                candidates.pop().ok_or_else(|| {
                    SQLError::new(
                        ErrorKind::UnknownAttribute,
                        format!("no relation in FROM has attribute {}", name.attribute),
                    )
                })
            }
        }
    }

    /// Every attribute of every relation, FROM order then attribute order.
    pub fn expand_all(&self) -> Vec<BoundAttribute> {
        self.relations
            .iter()
            .flat_map(|relation| {
                (0..relation.attributes().len())
                    .map(move |position| BoundAttribute::new(relation.clone(), position))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::defs::Attribute, core::Type};

    fn scope() -> Scope {
        let r = BaseRelationSchema::new(
            "r",
            vec![Attribute::new("a", Type::Int), Attribute::new("b", Type::String)],
            Some(0),
        )
        .unwrap();
        let s = BaseRelationSchema::new(
            "s",
            vec![Attribute::new("b", Type::String), Attribute::new("c", Type::Int)],
            None,
        )
        .unwrap();
        Scope::new(vec![Arc::new(r), Arc::new(s)])
    }

    #[test]
    fn resolve_unqualified() {
        let bound = scope()
            .resolve_attribute(&AttributeName::unqualified("c"))
            .unwrap();
        assert_eq!(bound.relation().name(), "s");
        assert_eq!(bound.position(), 1);
    }

    #[test]
    fn unqualified_name_in_two_relations_is_ambiguous() {
        let err = scope()
            .resolve_attribute(&AttributeName::unqualified("b"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AmbiguousAttribute);

        let bound = scope()
            .resolve_attribute(&AttributeName::qualified("s", "b"))
            .unwrap();
        assert_eq!(bound.qualified_name(), "s.b");
    }

    #[test]
    fn resolution_errors() {
        let scope = scope();
        let err = scope
            .resolve_attribute(&AttributeName::unqualified("zzz"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownAttribute);

        let err = scope
            .resolve_attribute(&AttributeName::qualified("t", "a"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnresolvedRelation);

        let err = scope
            .resolve_attribute(&AttributeName::qualified("r", "c"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownAttribute);
    }

    #[test]
    fn expand_all_follows_from_order() {
        let names = scope()
            .expand_all()
            .iter()
            .map(|a| a.qualified_name())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["r.a", "r.b", "s.b", "s.c"]);
    }
}
