use std::{fmt::Display, sync::Arc};

use enum_as_inner::EnumAsInner;

use super::{
    codec::{Decoder, Encoder},
    Datum, ErrorKind, SQLError,
};
use crate::catalog::defs::BaseRelationSchema;

/// A row of a base relation, as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseTuple {
    schema: Arc<BaseRelationSchema>,
    values: Vec<Datum>,
}

impl BaseTuple {
    /// Build a row, checking arity and types against the schema.
    pub fn new(schema: Arc<BaseRelationSchema>, values: Vec<Datum>) -> Result<Self, SQLError> {
        schema.check_values(&values)?;
        Ok(Self { schema, values })
    }

    pub fn schema(&self) -> &Arc<BaseRelationSchema> {
        &self.schema
    }

    pub fn values(&self) -> &[Datum] {
        &self.values
    }

    pub fn get(&self, position: usize) -> Option<&Datum> {
        self.values.get(position)
    }

    pub fn primary_key(&self) -> Option<&Datum> {
        self.schema
            .primary_key()
            .and_then(|position| self.values.get(position))
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut encoder = Encoder::new();
        for value in self.values.iter() {
            encoder.write_datum(value);
        }
        encoder.finish()
    }

    pub fn decode(schema: &Arc<BaseRelationSchema>, bytes: &[u8]) -> Result<Self, SQLError> {
        let mut decoder = Decoder::new(bytes);
        let values = schema
            .attributes()
            .iter()
            .map(|attribute| decoder.read_datum(attribute.data_type))
            .collect::<Result<Vec<_>, _>>()?;
        decoder.finish()?;

        Ok(Self {
            schema: schema.clone(),
            values,
        })
    }
}

impl Display for BaseTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let result = self
            .values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        write!(f, "{}[{}]", self.schema.name(), result)
    }
}

/// Row produced by a join: the contributing base rows, looked up by the
/// schema they came from. Never holds two rows of the same schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompositeTuple {
    tuples: Vec<BaseTuple>,
}

impl CompositeTuple {
    /// Concatenate two rows, flattening nested composites.
    pub fn combine(left: Row, right: Row) -> Result<Self, SQLError> {
        let mut combined = CompositeTuple::default();
        for tuple in left
            .into_base_tuples()?
            .into_iter()
            .chain(right.into_base_tuples()?)
        {
            combined.push(tuple)?;
        }
        Ok(combined)
    }

    fn push(&mut self, tuple: BaseTuple) -> Result<(), SQLError> {
        if self.base_tuple(tuple.schema()).is_some() {
            return Err(SQLError::new(
                ErrorKind::RuntimeError,
                format!(
                    "composite row already holds a row of relation {}",
                    tuple.schema().name()
                ),
            ));
        }
        self.tuples.push(tuple);
        Ok(())
    }

    pub fn base_tuple(&self, schema: &BaseRelationSchema) -> Option<&BaseTuple> {
        self.tuples
            .iter()
            .find(|tuple| tuple.schema().as_ref() == schema)
    }

    pub fn tuples(&self) -> &[BaseTuple] {
        &self.tuples
    }
}

impl Display for CompositeTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let result = self
            .tuples
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" ");

        write!(f, "{}", result)
    }
}

/// Flat output row of a projection. Values can only be read back by
/// position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ProjectedTuple {
    pub values: Vec<Datum>,
}

impl ProjectedTuple {
    pub fn new(values: Vec<Datum>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&Datum> {
        self.values.get(index)
    }
}

impl Display for ProjectedTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let result = self
            .values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("\t");

        write!(f, "{}", result)
    }
}

/// Any row flowing between operators.
#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum Row {
    Base(BaseTuple),
    Composite(CompositeTuple),
    Projected(ProjectedTuple),
}

impl Row {
    /// Find the contributing row of `schema`, if this row carries one.
    pub fn base_tuple(&self, schema: &BaseRelationSchema) -> Option<&BaseTuple> {
        match self {
            Row::Base(tuple) if tuple.schema().as_ref() == schema => Some(tuple),
            Row::Base(_) => None,
            Row::Composite(tuple) => tuple.base_tuple(schema),
            Row::Projected(_) => None,
        }
    }

    fn into_base_tuples(self) -> Result<Vec<BaseTuple>, SQLError> {
        match self {
            Row::Base(tuple) => Ok(vec![tuple]),
            Row::Composite(tuple) => Ok(tuple.tuples),
            Row::Projected(_) => Err(SQLError::new(
                ErrorKind::RuntimeError,
                "projected rows cannot be joined",
            )),
        }
    }
}

impl Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Row::Base(t) => write!(f, "{}", t),
            Row::Composite(t) => write!(f, "{}", t),
            Row::Projected(t) => write!(f, "{}", t),
        }
    }
}
