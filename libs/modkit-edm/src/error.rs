/// Errors raised while building an [`crate::EdmModel`] from schema definitions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EdmError {
    #[error("duplicate schema element '{0}'")]
    Duplicate(String),

    #[error("unknown type '{type_name}' referenced by '{referenced_by}'")]
    UnknownType {
        type_name: String,
        referenced_by: String,
    },

    #[error("inheritance cycle detected at type '{0}'")]
    InheritanceCycle(String),

    #[error("invalid base type for '{type_name}': {reason}")]
    InvalidBaseType { type_name: String, reason: String },

    #[error("invalid key on entity type '{type_name}': {reason}")]
    InvalidKey { type_name: String, reason: String },

    #[error("'{name}' must reference an entity type, got '{type_name}'")]
    NotAnEntityType { name: String, type_name: String },

    #[error("invalid operation '{operation}': {reason}")]
    InvalidOperation { operation: String, reason: String },

    #[error("invalid enum type '{type_name}': {reason}")]
    InvalidEnum { type_name: String, reason: String },
}

/// Errors raised by URI literal conversion.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LiteralError {
    #[error("'{literal}' is not a valid {expected} literal")]
    Invalid { literal: String, expected: String },

    #[error("null is not allowed for non-nullable type {expected}")]
    NullNotAllowed { expected: String },

    #[error("literals of type {expected} cannot appear in a URL")]
    Unsupported { expected: String },
}
