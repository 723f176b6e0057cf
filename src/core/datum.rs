use std::fmt::Display;

use enum_as_inner::EnumAsInner;
use sqlparser::ast;

use super::{ErrorKind, SQLError, Type};

/// A single datum value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumAsInner)]
pub enum Datum {
    Int(i64),
    String(String),
}

impl Display for Datum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Datum::Int(v) => write!(f, "{}", v),
            Datum::String(v) => write!(f, "{}", v),
        }
    }
}

impl TryFrom<&ast::Value> for Datum {
    type Error = SQLError;

    fn try_from(value: &ast::Value) -> Result<Self, Self::Error> {
        match value {
            ast::Value::Number(v, _) => {
                Ok(Datum::Int(v.parse().map_err(|e| {
                    SQLError::new(ErrorKind::ParseError, format!("{}: {}", v, e))
                })?))
            }
            ast::Value::SingleQuotedString(v) => Ok(Datum::String(v.to_string())),
            _ => Err(SQLError::new(
                ErrorKind::ParseError,
                format!("unsupported literal: {}", value),
            )),
        }
    }
}

impl Datum {
    pub fn typ(&self) -> Type {
        match self {
            Datum::Int(_) => Type::Int,
            Datum::String(_) => Type::String,
        }
    }
}
