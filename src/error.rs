use rezolve_types::{error::TypeResolutionError, ConcreteType};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RezolveError {
    #[error("Registration failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Compilation failed: {0}")]
    Compile(#[from] CompileError),

    #[error("Resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Type resolution failed: {0}")]
    TypeResolution(#[from] TypeResolutionError),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistrationError {
    #[error("Target of type {target} does not support {service}")]
    UnsupportedType {
        target: ConcreteType,
        service: ConcreteType,
    },
    #[error("Cannot register non-generic target {target} against open generic {service}")]
    NotGenericTypeDefinition {
        target: ConcreteType,
        service: ConcreteType,
    },
    #[error("Decorator {decorator} is already applied to {service}")]
    DuplicateDecorator {
        decorator: ConcreteType,
        service: ConcreteType,
    },
    #[error(transparent)]
    TypeResolution(#[from] TypeResolutionError),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    #[error(transparent)]
    TypeResolution(#[from] TypeResolutionError),

    #[error("Cyclic dependency while compiling {requested}: {}", format_path(.path))]
    CyclicDependency {
        path: Vec<ConcreteType>,
        requested: ConcreteType,
    },

    #[error("Compilation of {requested} exceeded the maximum depth of {depth}")]
    MaxDepthExceeded {
        depth: usize,
        requested: ConcreteType,
    },

    #[error("{0} cannot be constructed")]
    NotConstructible(ConcreteType),

    #[error("{ty} has no constructor at index {index}")]
    NoSuchConstructor { ty: ConcreteType, index: usize },

    #[error("More than one constructor of {0} can be satisfied")]
    AmbiguousConstructor(ConcreteType),

    #[error("Decorator {decorator} has no constructor parameter of type {service}")]
    DecoratorParameterMissing {
        decorator: ConcreteType,
        service: ConcreteType,
    },
}

fn format_path(path: &[ConcreteType]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Could not resolve type {0}")]
    Unresolved(ConcreteType),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("{0} is scoped and must be resolved within a scope")]
    ScopeRequired(ConcreteType),

    #[error("Scope has been disposed")]
    ScopeDisposed,

    #[error("Singleton {0} was requested again while it was being created")]
    ReentrantSingleton(ConcreteType),

    #[error("Delegate failed: {0}")]
    Delegate(String),
}

impl From<TypeResolutionError> for ResolveError {
    fn from(e: TypeResolutionError) -> Self {
        ResolveError::Compile(CompileError::TypeResolution(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rezolve_types::TypeBuilder;

    #[test]
    fn test_cycle_message_lists_path() {
        let a: ConcreteType = TypeBuilder::class("A").build().unwrap().into();
        let b: ConcreteType = TypeBuilder::class("B").build().unwrap().into();
        let err = CompileError::CyclicDependency {
            path: vec![a.clone(), b, a.clone()],
            requested: a,
        };
        assert_eq!(
            err.to_string(),
            "Cyclic dependency while compiling A: A -> B -> A"
        );
        let wrapped: RezolveError = ResolveError::from(err).into();
        assert!(matches!(wrapped, RezolveError::Resolve(ResolveError::Compile(_))));
    }
}
