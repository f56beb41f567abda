use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypeResolutionError {
    #[error("Type not found: {0}")]
    TypeNotFound(String),
    #[error("Duplicate type definition: {0}")]
    DuplicateType(String),
    #[error("Generic index {index} out of bounds (length {length})")]
    GenericIndexOutOfBounds { index: usize, length: usize },
    #[error("{definition} expects {expected} generic arguments, got {actual}")]
    ArityMismatch {
        definition: String,
        expected: usize,
        actual: usize,
    },
    #[error("{0} cannot be used as a base class")]
    InvalidBaseType(String),
    #[error("{0} is not an interface")]
    NotAnInterface(String),
    #[error("Duplicate generic parameter {parameter} on {definition}")]
    DuplicateGenericParameter {
        definition: String,
        parameter: String,
    },
    #[error("Cannot bind generic parameters {parameters:?} of {definition} from {target}")]
    UnboundGenericParameters {
        definition: String,
        target: String,
        parameters: Vec<String>,
    },
    #[error("{definition} does not produce {target}")]
    IncompatibleGenericTarget { definition: String, target: String },
    #[error("Could not parse type name {input:?}: {message}")]
    Parse { input: String, message: String },
}
