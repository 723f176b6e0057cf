use std::fmt::Display;

use sqlparser::ast::DataType;

use super::{ErrorKind, SQLError};

/// Attribute type of a base relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    String,
}

impl Type {
    /// Tag written to the catalog for this type.
    pub fn tag(&self) -> u8 {
        match self {
            Type::Int => 1,
            Type::String => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self, SQLError> {
        match tag {
            1 => Ok(Type::Int),
            2 => Ok(Type::String),
            _ => Err(SQLError::new(
                ErrorKind::StorageFault,
                format!("unknown type tag in catalog record: {}", tag),
            )),
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "INTEGER"),
            Type::String => write!(f, "STRING"),
        }
    }
}

impl TryFrom<&DataType> for Type {
    type Error = SQLError;

    fn try_from(value: &DataType) -> Result<Self, Self::Error> {
        match value {
            DataType::Int(_)
            | DataType::Integer(_)
            | DataType::BigInt(_)
            | DataType::SmallInt(_)
            | DataType::TinyInt(_) => Ok(Type::Int),

            DataType::Varchar(_) | DataType::Char(_) | DataType::Text | DataType::String => {
                Ok(Type::String)
            }

            _ => Err(SQLError::new(
                ErrorKind::ParseError,
                format!("Unknown data type: {:?}", value),
            )),
        }
    }
}
