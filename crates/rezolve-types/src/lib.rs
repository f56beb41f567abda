//! # rezolve-types
//!
//! Descriptor model of the types a container registers and resolves.
//! This crate provides the type handles, generic binding and the candidate
//! search used by the target registry.
//!
//! ## Core Types
//!
//! - **[`TypeDescription`]**: Handle to a type definition (identity is the handle).
//! - **[`ConcreteType`]**: A type with concrete generic arguments, or an open generic definition.
//! - **[`GenericLookup`]**: Generic arguments used to make signatures concrete.
//! - **[`TypeCandidates`](candidates::TypeCandidates)**: Ordered lookup types for a request.
//! - **[`is_assignable`](comparer::is_assignable)**: Assignability including variance.
use std::{
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
    sync::{Arc, LazyLock},
};

pub mod builder;
pub mod candidates;
pub mod comparer;
pub mod error;
pub mod generics;
pub mod loader;

pub use builder::TypeBuilder;
pub use generics::{ConcreteType, GenericLookup, TypeSig};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Variance {
    #[default]
    Invariant,
    Covariant,
    Contravariant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    AbstractClass,
    Interface,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenericParameter {
    pub name: String,
    pub variance: Variance,
}

#[derive(Clone, Debug)]
pub struct ParameterDefinition {
    pub name: String,
    pub ty: TypeSig,
    /// Optional parameters receive `null` when nothing is registered for them.
    pub optional: bool,
}

impl ParameterDefinition {
    pub fn new(name: impl Into<String>, ty: TypeSig) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>, ty: TypeSig) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: true,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConstructorDefinition {
    pub parameters: Vec<ParameterDefinition>,
}

impl ConstructorDefinition {
    pub const EMPTY: Self = Self {
        parameters: Vec::new(),
    };
}

#[derive(Debug)]
pub struct TypeDefinition {
    pub name: String,
    pub kind: TypeKind,
    pub generic_parameters: Vec<GenericParameter>,
    pub extends: Option<TypeSig>,
    pub implements: Vec<TypeSig>,
    pub constructors: Vec<ConstructorDefinition>,
    pub disposable: bool,
    /// When false, candidate search never expands this type's variant parameters.
    pub variance_search: bool,
}

static OBJECT: LazyLock<TypeDescription> = LazyLock::new(|| {
    TypeDescription::from_definition(TypeDefinition {
        name: "object".to_string(),
        kind: TypeKind::Class,
        generic_parameters: vec![],
        extends: None,
        implements: vec![],
        constructors: vec![],
        disposable: false,
        variance_search: true,
    })
});

static ENUMERABLE: LazyLock<TypeDescription> = LazyLock::new(|| {
    TypeDescription::from_definition(TypeDefinition {
        name: "IEnumerable".to_string(),
        kind: TypeKind::Interface,
        generic_parameters: vec![GenericParameter {
            name: "T".to_string(),
            variance: Variance::Covariant,
        }],
        extends: None,
        implements: vec![],
        constructors: vec![],
        disposable: false,
        variance_search: true,
    })
});

#[derive(Clone)]
pub struct TypeDescription(Arc<TypeDefinition>);

impl TypeDescription {
    pub(crate) fn from_definition(definition: TypeDefinition) -> Self {
        Self(Arc::new(definition))
    }

    /// The top type every class extends and every interface converts to.
    pub fn object() -> Self {
        OBJECT.clone()
    }

    /// The builtin `IEnumerable<out T>` used for collection injection.
    pub fn enumerable() -> Self {
        ENUMERABLE.clone()
    }

    pub fn definition(&self) -> &TypeDefinition {
        &self.0
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn arity(&self) -> usize {
        self.0.generic_parameters.len()
    }

    pub fn is_generic_definition(&self) -> bool {
        self.arity() > 0
    }

    pub fn is_interface(&self) -> bool {
        self.0.kind == TypeKind::Interface
    }

    pub fn is_constructible(&self) -> bool {
        self.0.kind == TypeKind::Class
    }

    pub fn is_object(&self) -> bool {
        *self == *OBJECT
    }

    pub fn is_disposable(&self) -> bool {
        self.0.disposable
    }

    pub fn variance_of(&self, index: usize) -> Variance {
        self.0
            .generic_parameters
            .get(index)
            .map(|p| p.variance)
            .unwrap_or_default()
    }

    pub fn instantiate(
        &self,
        arguments: impl IntoIterator<Item = ConcreteType>,
    ) -> Result<ConcreteType, error::TypeResolutionError> {
        ConcreteType::new(self.clone(), arguments.into_iter().collect())
    }

    /// The signature of this definition applied to its own generic parameters.
    pub fn own_signature(&self) -> TypeSig {
        TypeSig::generic(self.clone(), (0..self.arity()).map(TypeSig::Generic).collect())
    }

    /// Every base class and interface signature reachable from this
    /// definition, expressed in terms of this definition's generic parameters.
    /// Base classes come first, in chain order.
    pub fn ancestor_signatures(&self) -> Vec<TypeSig> {
        let own: Vec<_> = (0..self.arity()).map(TypeSig::Generic).collect();
        let mut bases = vec![];
        let mut interfaces = vec![];
        collect_ancestors(self, &own, &mut bases, &mut interfaces);
        bases.extend(interfaces);
        bases
    }
}

fn collect_ancestors(
    definition: &TypeDescription,
    arguments: &[TypeSig],
    bases: &mut Vec<TypeSig>,
    interfaces: &mut Vec<TypeSig>,
) {
    if let Some(extends) = &definition.definition().extends {
        let sig = extends.substitute(arguments);
        if !bases.contains(&sig) {
            bases.push(sig.clone());
            if let TypeSig::Type {
                definition,
                arguments,
            } = &sig
            {
                if arguments.len() == definition.arity() {
                    collect_ancestors(definition, arguments, bases, interfaces);
                }
            }
        }
    }
    for implemented in &definition.definition().implements {
        let sig = implemented.substitute(arguments);
        if !interfaces.contains(&sig) {
            interfaces.push(sig.clone());
            if let TypeSig::Type {
                definition,
                arguments,
            } = &sig
            {
                if arguments.len() == definition.arity() {
                    collect_ancestors(definition, arguments, bases, interfaces);
                }
            }
        }
    }
}

impl Debug for TypeDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Display for TypeDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl PartialEq for TypeDescription {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TypeDescription {}

impl Hash for TypeDescription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}
