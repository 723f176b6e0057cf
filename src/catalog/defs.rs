use std::collections::HashSet;

use crate::core::{
    codec::{Decoder, Encoder},
    Datum, ErrorKind, SQLError, Type,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub data_type: Type,
}

impl Attribute {
    pub fn new(name: impl Into<String>, data_type: Type) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered attribute list. The length is fixed once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationSchema {
    attributes: Vec<Attribute>,
}

impl RelationSchema {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|attr| attr.name == name)
    }
}

/// Schema of a stored relation. The catalog hands out exactly one shared
/// instance per relation name.
#[derive(Clone, Debug)]
pub struct BaseRelationSchema {
    name: String,
    schema: RelationSchema,
    primary_key: Option<usize>,
}

impl PartialEq for BaseRelationSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for BaseRelationSchema {}

impl BaseRelationSchema {
    pub fn new(
        name: impl Into<String>,
        attributes: Vec<Attribute>,
        primary_key: Option<usize>,
    ) -> Result<Self, SQLError> {
        let name = name.into();

        if attributes.is_empty() {
            return Err(SQLError::new(
                ErrorKind::InvalidDefinition,
                format!("relation {} has no attributes", name),
            ));
        }

        let mut seen = HashSet::new();
        for attr in attributes.iter() {
            if !seen.insert(attr.name.as_str()) {
                return Err(SQLError::new(
                    ErrorKind::InvalidDefinition,
                    format!("duplicate attribute {} in relation {}", attr.name, name),
                ));
            }
        }

        if let Some(position) = primary_key {
            if position >= attributes.len() {
                return Err(SQLError::new(
                    ErrorKind::InvalidDefinition,
                    format!(
                        "primary key position {} out of range for relation {}",
                        position, name
                    ),
                ));
            }
        }

        Ok(Self {
            name,
            schema: RelationSchema::new(attributes),
            primary_key,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &RelationSchema {
        &self.schema
    }

    pub fn attributes(&self) -> &[Attribute] {
        self.schema.attributes()
    }

    pub fn primary_key(&self) -> Option<usize> {
        self.primary_key
    }

    pub fn position(&self, attribute_name: &str) -> Option<usize> {
        self.schema.position(attribute_name)
    }

    pub fn has_attribute(&self, attribute_name: &str) -> bool {
        self.position(attribute_name).is_some()
    }

    /// `relation.attribute` form of the attribute at `position`.
    pub fn qualified_name(&self, position: usize) -> String {
        format!("{}.{}", self.name, self.schema.attributes[position].name)
    }

    /// Is the list of values type-consistent with the schema?
    pub fn check_values(&self, values: &[Datum]) -> Result<(), SQLError> {
        if values.len() != self.schema.len() {
            return Err(SQLError::new(
                ErrorKind::TypeMismatch,
                format!(
                    "relation {} expects {} values, got {}",
                    self.name,
                    self.schema.len(),
                    values.len()
                ),
            ));
        }

        for (i, (value, attr)) in values.iter().zip(self.attributes()).enumerate() {
            if value.typ() != attr.data_type {
                return Err(SQLError::new(
                    ErrorKind::TypeMismatch,
                    format!(
                        "at position {} expecting {}, but got {}",
                        i,
                        attr.data_type,
                        value.typ()
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Catalog record: name, attribute count, primary key position (-1 for
    /// none), then each attribute's name and type tag.
    pub fn encode(&self) -> Vec<u8> {
        let mut encoder = Encoder::new();
        encoder.write_string(&self.name);
        encoder.write_u32(self.schema.len() as u32);
        encoder.write_i32(self.primary_key.map_or(-1, |pos| pos as i32));
        for attr in self.attributes() {
            encoder.write_string(&attr.name);
            encoder.write_u8(attr.data_type.tag());
        }
        encoder.finish()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SQLError> {
        let mut decoder = Decoder::new(bytes);
        let name = decoder.read_string()?;
        let count = decoder.read_u32()?;
        let primary_key = match decoder.read_i32()? {
            -1 => None,
            pos if pos >= 0 => Some(pos as usize),
            pos => {
                return Err(SQLError::new(
                    ErrorKind::StorageFault,
                    format!("invalid primary key position {} for {}", pos, name),
                ))
            }
        };

        let attributes = (0..count)
            .map(|_| {
                let attr_name = decoder.read_string()?;
                let data_type = Type::from_tag(decoder.read_u8()?)?;
                Ok(Attribute::new(attr_name, data_type))
            })
            .collect::<Result<Vec<_>, SQLError>>()?;
        decoder.finish()?;

        Self::new(name, attributes, primary_key)
            .map_err(|e| SQLError::new(ErrorKind::StorageFault, e.message))
    }
}
