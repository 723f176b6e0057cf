//! Structured requests handed from the front end to the binder.

use std::fmt::Display;

use crate::{catalog::defs::Attribute, core::Datum};

/// Attribute reference as written by the user, possibly without its
/// relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeName {
    pub relation: Option<String>,
    pub attribute: String,
}

impl AttributeName {
    pub fn qualified(relation: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            relation: Some(relation.into()),
            attribute: attribute.into(),
        }
    }

    pub fn unqualified(attribute: impl Into<String>) -> Self {
        Self {
            relation: None,
            attribute: attribute.into(),
        }
    }
}

impl Display for AttributeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.relation {
            Some(relation) => write!(f, "{}.{}", relation, self.attribute),
            None => write!(f, "{}", self.attribute),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Constant(Datum),
    Attribute(AttributeName),
}

/// `left = right`, unbound.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub left: Operand,
    pub right: Operand,
}

impl Comparison {
    pub fn new(left: Operand, right: Operand) -> Self {
        Self { left, right }
    }

    /// Shorthand for an attribute-to-attribute equality.
    pub fn attributes(left: AttributeName, right: AttributeName) -> Self {
        Self::new(Operand::Attribute(left), Operand::Attribute(right))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectRequest {
    pub from: Vec<String>,
    pub predicates: Vec<Comparison>,
    /// Empty means every attribute of every relation.
    pub select: Vec<AttributeName>,
    pub distinct: bool,
    pub order_by: Option<Vec<AttributeName>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableRequest {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub primary_key: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertRequest {
    pub relation: String,
    pub rows: Vec<Vec<Datum>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTableRequest),
    DropTable(String),
    Insert(InsertRequest),
    Select(SelectRequest),
    ShowTables,
    Explain(SelectRequest),
}
