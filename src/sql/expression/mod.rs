use std::{fmt::Display, sync::Arc};

use enum_as_inner::EnumAsInner;

use crate::{
    catalog::defs::BaseRelationSchema,
    core::{Datum, ErrorKind, Row, SQLError, Type},
};

/// An attribute resolved to a position of a specific relation.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundAttribute {
    relation: Arc<BaseRelationSchema>,
    position: usize,
}

impl BoundAttribute {
    pub fn new(relation: Arc<BaseRelationSchema>, position: usize) -> Self {
        Self { relation, position }
    }

    pub fn relation(&self) -> &Arc<BaseRelationSchema> {
        &self.relation
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn data_type(&self) -> Type {
        self.relation.attributes()[self.position].data_type
    }

    pub fn qualified_name(&self) -> String {
        self.relation.qualified_name(self.position)
    }

    fn evaluate(&self, row: &Row) -> Result<Datum, SQLError> {
        let tuple = row.base_tuple(&self.relation).ok_or_else(|| {
            SQLError::new(
                ErrorKind::RuntimeError,
                format!(
                    "row {} carries nothing of relation {}",
                    row,
                    self.relation.name()
                ),
            )
        })?;

        tuple.get(self.position).cloned().ok_or_else(|| {
            SQLError::new(
                ErrorKind::RuntimeError,
                format!("no value at position {} of {}", self.position, tuple),
            )
        })
    }
}

/// Operand of a predicate or an entry of a select list.
#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum Variable {
    Constant(Datum),
    Attribute(BoundAttribute),
}

impl Variable {
    /// Value of this variable in the given row. Composite rows are searched
    /// for the contributing row of the bound relation.
    pub fn evaluate(&self, row: &Row) -> Result<Datum, SQLError> {
        match self {
            Variable::Constant(datum) => Ok(datum.clone()),
            Variable::Attribute(attribute) => attribute.evaluate(row),
        }
    }

    pub fn data_type(&self) -> Type {
        match self {
            Variable::Constant(datum) => datum.typ(),
            Variable::Attribute(attribute) => attribute.data_type(),
        }
    }

    pub fn relation(&self) -> Option<&Arc<BaseRelationSchema>> {
        self.as_attribute().map(BoundAttribute::relation)
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variable::Constant(Datum::String(s)) => write!(f, "'{}'", s),
            Variable::Constant(datum) => write!(f, "{}", datum),
            Variable::Attribute(attribute) => write!(f, "{}", attribute.qualified_name()),
        }
    }
}

/// Where a predicate can be evaluated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PredicateKind<'a> {
    /// References attributes of a single relation.
    Scan(&'a Arc<BaseRelationSchema>),
    /// References two distinct relations.
    Join {
        left: &'a Arc<BaseRelationSchema>,
        right: &'a Arc<BaseRelationSchema>,
    },
    /// Compares two constants.
    Constant,
}

/// Equality between two variables. Immutable once bound: reorienting a join
/// predicate yields a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    left: Variable,
    right: Variable,
}

impl Predicate {
    pub fn new(left: Variable, right: Variable) -> Self {
        Self { left, right }
    }

    pub fn left(&self) -> &Variable {
        &self.left
    }

    pub fn right(&self) -> &Variable {
        &self.right
    }

    pub fn kind(&self) -> PredicateKind<'_> {
        match (self.left.relation(), self.right.relation()) {
            (Some(left), Some(right)) if left != right => PredicateKind::Join { left, right },
            (Some(relation), _) | (None, Some(relation)) => PredicateKind::Scan(relation),
            (None, None) => PredicateKind::Constant,
        }
    }

    pub fn is_join_predicate(&self) -> bool {
        matches!(self.kind(), PredicateKind::Join { .. })
    }

    /// True when this is a scan predicate over `relation`.
    pub fn is_scan_predicate_for(&self, relation: &BaseRelationSchema) -> bool {
        matches!(self.kind(), PredicateKind::Scan(r) if r.as_ref() == relation)
    }

    pub fn left_relation(&self) -> Option<&Arc<BaseRelationSchema>> {
        self.left.relation()
    }

    pub fn right_relation(&self) -> Option<&Arc<BaseRelationSchema>> {
        self.right.relation()
    }

    /// Same predicate with its operands exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            left: self.right.clone(),
            right: self.left.clone(),
        }
    }

    /// Check the predicate against one row, which must carry every
    /// referenced relation.
    pub fn evaluate(&self, row: &Row) -> Result<bool, SQLError> {
        Ok(self.left.evaluate(row)? == self.right.evaluate(row)?)
    }

    /// Check the predicate with its left operand read from `left` and its
    /// right operand read from `right`.
    pub fn evaluate_join(&self, left: &Row, right: &Row) -> Result<bool, SQLError> {
        Ok(self.left.evaluate(left)? == self.right.evaluate(right)?)
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.left, self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::defs::Attribute,
        core::{BaseTuple, CompositeTuple, ProjectedTuple},
    };

    fn relation(name: &str, attributes: &[(&str, Type)]) -> Arc<BaseRelationSchema> {
        Arc::new(
            BaseRelationSchema::new(
                name,
                attributes
                    .iter()
                    .map(|(name, typ)| Attribute::new(*name, *typ))
                    .collect(),
                None,
            )
            .unwrap(),
        )
    }

    fn attr(relation: &Arc<BaseRelationSchema>, name: &str) -> Variable {
        Variable::Attribute(BoundAttribute::new(
            relation.clone(),
            relation.position(name).unwrap(),
        ))
    }

    fn base(relation: &Arc<BaseRelationSchema>, values: Vec<Datum>) -> Row {
        Row::Base(BaseTuple::new(relation.clone(), values).unwrap())
    }

    #[test]
    fn classify_predicates() {
        let r = relation("r", &[("a", Type::Int), ("b", Type::String)]);
        let s = relation("s", &[("c", Type::Int)]);

        let join = Predicate::new(attr(&r, "a"), attr(&s, "c"));
        assert!(join.is_join_predicate());
        assert!(!join.is_scan_predicate_for(&r));

        let scan = Predicate::new(Variable::Constant(Datum::Int(1)), attr(&r, "a"));
        assert!(!scan.is_join_predicate());
        assert!(scan.is_scan_predicate_for(&r));
        assert!(!scan.is_scan_predicate_for(&s));

        let same_relation = Predicate::new(attr(&r, "a"), attr(&r, "b"));
        assert_eq!(same_relation.kind(), PredicateKind::Scan(&r));

        let constant = Predicate::new(
            Variable::Constant(Datum::Int(1)),
            Variable::Constant(Datum::Int(1)),
        );
        assert_eq!(constant.kind(), PredicateKind::Constant);
    }

    #[test]
    fn swapped_exchanges_operands() {
        let r = relation("r", &[("a", Type::Int)]);
        let s = relation("s", &[("c", Type::Int)]);
        let p = Predicate::new(attr(&r, "a"), attr(&s, "c"));
        let q = p.swapped();

        assert_eq!(q.left_relation(), Some(&s));
        assert_eq!(q.right_relation(), Some(&r));
        assert_eq!(q.to_string(), "s.c = r.a");
        assert_eq!(p.to_string(), "r.a = s.c");
    }

    #[test]
    fn evaluate_over_base_and_composite_rows() {
        let r = relation("r", &[("a", Type::Int), ("b", Type::String)]);
        let s = relation("s", &[("c", Type::Int)]);
        let r_row = base(&r, vec![Datum::Int(7), Datum::String("x".into())]);
        let s_row = base(&s, vec![Datum::Int(7)]);

        let scan = Predicate::new(attr(&r, "b"), Variable::Constant(Datum::String("x".into())));
        assert!(scan.evaluate(&r_row).unwrap());

        let join = Predicate::new(attr(&r, "a"), attr(&s, "c"));
        assert!(join.evaluate_join(&r_row, &s_row).unwrap());

        let combined = Row::Composite(CompositeTuple::combine(r_row, s_row).unwrap());
        assert!(join.evaluate(&combined).unwrap());
        assert_eq!(attr(&s, "c").evaluate(&combined).unwrap(), Datum::Int(7));
    }

    #[test]
    fn values_of_different_types_never_match() {
        let r = relation("r", &[("a", Type::Int), ("b", Type::String)]);
        let row = base(&r, vec![Datum::Int(1), Datum::String("1".into())]);
        let p = Predicate::new(attr(&r, "a"), attr(&r, "b"));
        assert!(!p.evaluate(&row).unwrap());
    }

    #[test]
    fn missing_relation_is_a_runtime_error() {
        let r = relation("r", &[("a", Type::Int)]);
        let s = relation("s", &[("c", Type::Int)]);
        let row = base(&r, vec![Datum::Int(1)]);

        let err = attr(&s, "c").evaluate(&row).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RuntimeError);

        let projected = Row::Projected(ProjectedTuple::new(vec![Datum::Int(1)]));
        let err = attr(&r, "a").evaluate(&projected).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RuntimeError);
    }
}
