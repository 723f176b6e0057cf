use std::{error::Error, fmt::Display};

#[derive(Clone, Debug)]
pub struct SQLError {
    pub kind: ErrorKind,
    pub message: String,
}

#[allow(clippy::enum_variant_names)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    ParseError,

    // Schema errors
    RelationExists,
    RelationNotFound,
    AmbiguousAttribute,
    UnknownAttribute,
    UnresolvedRelation,
    TypeMismatch,
    InvalidDefinition,

    // Plan errors
    MalformedQuery,
    CycleDetected,
    CartesianProduct,
    NotImplemented,

    /// The storage collaborator failed. Nothing can be rolled back.
    StorageFault,
    /// An internal invariant was violated during execution.
    RuntimeError,
}

impl ErrorKind {
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::RelationExists
                | ErrorKind::RelationNotFound
                | ErrorKind::AmbiguousAttribute
                | ErrorKind::UnknownAttribute
                | ErrorKind::UnresolvedRelation
                | ErrorKind::TypeMismatch
                | ErrorKind::InvalidDefinition
        )
    }

    pub fn is_plan_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::MalformedQuery
                | ErrorKind::CycleDetected
                | ErrorKind::CartesianProduct
                | ErrorKind::NotImplemented
        )
    }
}

impl Error for SQLError {}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ParseError => write!(f, "Parse Error"),
            ErrorKind::RelationExists => write!(f, "Schema Error (relation exists)"),
            ErrorKind::RelationNotFound => write!(f, "Schema Error (relation not found)"),
            ErrorKind::AmbiguousAttribute => write!(f, "Schema Error (ambiguous attribute)"),
            ErrorKind::UnknownAttribute => write!(f, "Schema Error (unknown attribute)"),
            ErrorKind::UnresolvedRelation => write!(f, "Schema Error (unresolved relation)"),
            ErrorKind::TypeMismatch => write!(f, "Schema Error (type mismatch)"),
            ErrorKind::InvalidDefinition => write!(f, "Schema Error (invalid definition)"),
            ErrorKind::MalformedQuery => write!(f, "Plan Error (malformed query)"),
            ErrorKind::CycleDetected => write!(f, "Plan Error (cycle)"),
            ErrorKind::CartesianProduct => write!(f, "Plan Error (cartesian product)"),
            ErrorKind::NotImplemented => write!(f, "Plan Error (not implemented)"),
            ErrorKind::StorageFault => write!(f, "Storage Fault"),
            ErrorKind::RuntimeError => write!(f, "Runtime Error"),
        }
    }
}

impl Display for SQLError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl SQLError {
    pub fn new(kind: ErrorKind, message: impl AsRef<str>) -> Self {
        Self {
            kind,
            message: message.as_ref().to_string(),
        }
    }

    /// Storage faults leave the database in an unknown state, the caller
    /// decides whether to keep going.
    pub fn is_fatal(&self) -> bool {
        self.kind == ErrorKind::StorageFault
    }
}
