use crate::{
    error::TypeResolutionError, ConstructorDefinition, GenericParameter, ParameterDefinition,
    TypeDefinition, TypeDescription, TypeKind, TypeSig, Variance,
};
use std::collections::HashSet;

/// Incrementally describes a type definition.
///
/// ```ignore
/// let repository = TypeBuilder::class("Repository")
///     .param("T")
///     .implements(TypeSig::generic(irepository, vec![TypeSig::Generic(0)]))
///     .build()?;
/// ```
#[derive(Debug)]
pub struct TypeBuilder {
    definition: TypeDefinition,
}

impl TypeBuilder {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            definition: TypeDefinition {
                name: name.into(),
                kind,
                generic_parameters: vec![],
                extends: None,
                implements: vec![],
                constructors: vec![],
                disposable: false,
                variance_search: true,
            },
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::AbstractClass)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    fn generic_parameter(mut self, name: impl Into<String>, variance: Variance) -> Self {
        self.definition.generic_parameters.push(GenericParameter {
            name: name.into(),
            variance,
        });
        self
    }

    pub fn param(self, name: impl Into<String>) -> Self {
        self.generic_parameter(name, Variance::Invariant)
    }

    /// Adds an `out` parameter.
    pub fn covariant(self, name: impl Into<String>) -> Self {
        self.generic_parameter(name, Variance::Covariant)
    }

    /// Adds an `in` parameter.
    pub fn contravariant(self, name: impl Into<String>) -> Self {
        self.generic_parameter(name, Variance::Contravariant)
    }

    pub fn extends(mut self, base: TypeSig) -> Self {
        self.definition.extends = Some(base);
        self
    }

    pub fn implements(mut self, interface: TypeSig) -> Self {
        self.definition.implements.push(interface);
        self
    }

    pub fn constructor(mut self, parameters: Vec<ParameterDefinition>) -> Self {
        self.definition
            .constructors
            .push(ConstructorDefinition { parameters });
        self
    }

    pub fn disposable(mut self) -> Self {
        self.definition.disposable = true;
        self
    }

    pub fn without_variance_search(mut self) -> Self {
        self.definition.variance_search = false;
        self
    }

    pub fn build(self) -> Result<TypeDescription, TypeResolutionError> {
        let def = &self.definition;
        let arity = def.generic_parameters.len();

        let mut seen = HashSet::new();
        for p in &def.generic_parameters {
            if !seen.insert(p.name.as_str()) {
                return Err(TypeResolutionError::DuplicateGenericParameter {
                    definition: def.name.clone(),
                    parameter: p.name.clone(),
                });
            }
        }

        if let Some(base) = &def.extends {
            base.validate(arity)?;
            match base.definition() {
                Some(d) if !d.is_interface() => {}
                _ => return Err(TypeResolutionError::InvalidBaseType(format!("{base:?}"))),
            }
            if def.kind == TypeKind::Interface {
                return Err(TypeResolutionError::InvalidBaseType(format!("{base:?}")));
            }
        }

        for interface in &def.implements {
            interface.validate(arity)?;
            match interface.definition() {
                Some(d) if d.is_interface() => {}
                Some(d) => return Err(TypeResolutionError::NotAnInterface(d.name().to_string())),
                None => return Err(TypeResolutionError::NotAnInterface(format!("{interface:?}"))),
            }
        }

        for ctor in &def.constructors {
            for p in &ctor.parameters {
                p.ty.validate(arity)?;
            }
        }

        Ok(TypeDescription::from_definition(self.definition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_duplicate_parameters() {
        let err = TypeBuilder::class("Pair").param("T").param("T").build().unwrap_err();
        assert_eq!(
            err,
            TypeResolutionError::DuplicateGenericParameter {
                definition: "Pair".to_string(),
                parameter: "T".to_string(),
            }
        );
    }

    #[test]
    fn test_rejects_out_of_range_parameter() {
        let list = TypeBuilder::class("List").param("T").build().unwrap();
        let err = TypeBuilder::class("Bad")
            .extends(TypeSig::generic(list, vec![TypeSig::Generic(1)]))
            .param("T")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            TypeResolutionError::GenericIndexOutOfBounds {
                index: 1,
                length: 1
            }
        );
    }

    #[test]
    fn test_base_and_interface_kinds() {
        let marker = TypeBuilder::interface("IMarker").build().unwrap();
        let class = TypeBuilder::class("Thing").build().unwrap();

        assert!(matches!(
            TypeBuilder::class("A").extends(TypeSig::of(&marker)).build(),
            Err(TypeResolutionError::InvalidBaseType(_))
        ));
        assert!(matches!(
            TypeBuilder::class("B").implements(TypeSig::of(&class)).build(),
            Err(TypeResolutionError::NotAnInterface(name)) if name == "Thing"
        ));
        assert!(TypeBuilder::class("C")
            .extends(TypeSig::of(&class))
            .implements(TypeSig::of(&marker))
            .build()
            .is_ok());
    }

    #[test]
    fn test_variance_and_flags() {
        let handler = TypeBuilder::interface("IHandler")
            .contravariant("T")
            .without_variance_search()
            .build()
            .unwrap();
        assert_eq!(handler.variance_of(0), Variance::Contravariant);
        assert!(!handler.definition().variance_search);
        assert!(!handler.is_constructible());

        let res = TypeBuilder::class("Resource").disposable().build().unwrap();
        assert!(res.is_disposable());
        assert!(res.is_constructible());
    }
}
