use crate::{error::TypeResolutionError, TypeDescription};
use std::{
    fmt::{Debug, Display, Formatter},
    sync::Arc,
};

/// A type as written inside a definition: either a (possibly generic) type
/// applied to signatures, or a generic parameter of the enclosing definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeSig {
    Type {
        definition: TypeDescription,
        arguments: Vec<TypeSig>,
    },
    Generic(usize),
}

impl TypeSig {
    pub fn of(definition: &TypeDescription) -> Self {
        TypeSig::Type {
            definition: definition.clone(),
            arguments: vec![],
        }
    }

    pub fn generic(definition: TypeDescription, arguments: Vec<TypeSig>) -> Self {
        TypeSig::Type {
            definition,
            arguments,
        }
    }

    pub fn definition(&self) -> Option<&TypeDescription> {
        match self {
            TypeSig::Type { definition, .. } => Some(definition),
            TypeSig::Generic(_) => None,
        }
    }

    /// Replaces generic parameter `!i` with `arguments[i]`. Out of range
    /// parameters are left untouched.
    pub fn substitute(&self, arguments: &[TypeSig]) -> TypeSig {
        match self {
            TypeSig::Generic(i) => arguments.get(*i).cloned().unwrap_or(TypeSig::Generic(*i)),
            TypeSig::Type {
                definition,
                arguments: inner,
            } => TypeSig::Type {
                definition: definition.clone(),
                arguments: inner.iter().map(|a| a.substitute(arguments)).collect(),
            },
        }
    }

    pub(crate) fn validate(&self, arity: usize) -> Result<(), TypeResolutionError> {
        match self {
            TypeSig::Generic(index) if *index >= arity => {
                Err(TypeResolutionError::GenericIndexOutOfBounds {
                    index: *index,
                    length: arity,
                })
            }
            TypeSig::Generic(_) => Ok(()),
            TypeSig::Type {
                definition,
                arguments,
            } => {
                if !arguments.is_empty() && arguments.len() != definition.arity() {
                    return Err(TypeResolutionError::ArityMismatch {
                        definition: definition.name().to_string(),
                        expected: definition.arity(),
                        actual: arguments.len(),
                    });
                }
                arguments.iter().try_for_each(|a| a.validate(arity))
            }
        }
    }
}

impl From<&ConcreteType> for TypeSig {
    fn from(ty: &ConcreteType) -> Self {
        TypeSig::Type {
            definition: ty.definition().clone(),
            arguments: ty.arguments().iter().map(TypeSig::from).collect(),
        }
    }
}

#[derive(PartialEq, Eq, Hash)]
struct ConcreteInner {
    definition: TypeDescription,
    arguments: Vec<ConcreteType>,
}

/// A type with concrete generic arguments. A generic definition without
/// arguments denotes the open generic definition itself (`G<>`).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ConcreteType(Arc<ConcreteInner>);

impl ConcreteType {
    pub fn new(
        definition: TypeDescription,
        arguments: Vec<ConcreteType>,
    ) -> Result<Self, TypeResolutionError> {
        if !arguments.is_empty() && arguments.len() != definition.arity() {
            return Err(TypeResolutionError::ArityMismatch {
                definition: definition.name().to_string(),
                expected: definition.arity(),
                actual: arguments.len(),
            });
        }
        Ok(Self::new_unchecked(definition, arguments))
    }

    fn new_unchecked(definition: TypeDescription, arguments: Vec<ConcreteType>) -> Self {
        Self(Arc::new(ConcreteInner {
            definition,
            arguments,
        }))
    }

    pub fn object() -> Self {
        Self::new_unchecked(TypeDescription::object(), vec![])
    }

    pub fn enumerable_of(element: ConcreteType) -> Self {
        Self::new_unchecked(TypeDescription::enumerable(), vec![element])
    }

    pub fn definition(&self) -> &TypeDescription {
        &self.0.definition
    }

    pub fn arguments(&self) -> &[ConcreteType] {
        &self.0.arguments
    }

    pub fn is_object(&self) -> bool {
        self.definition().is_object()
    }

    pub fn is_generic_definition(&self) -> bool {
        self.definition().is_generic_definition() && self.arguments().is_empty()
    }

    pub fn is_closed_generic(&self) -> bool {
        !self.arguments().is_empty()
    }

    /// True for open definitions and for closed types with an open argument
    /// anywhere inside, e.g. `G<List<>>`.
    pub fn contains_open(&self) -> bool {
        self.is_generic_definition() || self.arguments().iter().any(|a| a.contains_open())
    }

    pub fn generic_definition(&self) -> ConcreteType {
        if self.is_closed_generic() {
            Self::new_unchecked(self.definition().clone(), vec![])
        } else {
            self.clone()
        }
    }

    /// The same definition applied to `arguments`; the caller keeps the arity.
    pub fn with_arguments(&self, arguments: Vec<ConcreteType>) -> ConcreteType {
        debug_assert_eq!(arguments.len(), self.definition().arity());
        Self::new_unchecked(self.definition().clone(), arguments)
    }

    pub fn lookup(&self) -> GenericLookup {
        GenericLookup::new(self.arguments().to_vec())
    }

    /// The direct base class. Classes without an explicit base extend
    /// `object`; interfaces and `object` itself have none.
    pub fn base_type(&self) -> Option<ConcreteType> {
        if self.is_object() || self.definition().is_interface() {
            return None;
        }
        match &self.definition().definition().extends {
            // signatures are validated against the definition's arity when built
            Some(sig) => self.lookup().make_concrete(sig).ok(),
            None => Some(ConcreteType::object()),
        }
    }

    /// The base class chain, nearest first, ending with `object`.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            current: self.base_type(),
        }
    }

    /// Every interface implemented by this type, its bases, or other
    /// interfaces, in declaration order without duplicates.
    pub fn interfaces(&self) -> Vec<ConcreteType> {
        let lookup = self.lookup();
        let mut out: Vec<ConcreteType> = vec![];
        let add = |t: ConcreteType, out: &mut Vec<ConcreteType>| {
            if !out.contains(&t) {
                out.push(t);
            }
        };
        for sig in &self.definition().definition().implements {
            if let Ok(interface) = lookup.make_concrete(sig) {
                let nested = interface.interfaces();
                add(interface, &mut out);
                for n in nested {
                    add(n, &mut out);
                }
            }
        }
        if let Some(base) = self.base_type() {
            for n in base.interfaces() {
                add(n, &mut out);
            }
        }
        out
    }

    /// Base classes (without `object`), then interfaces, then `object` last.
    pub fn bases_and_interfaces(&self) -> Vec<ConcreteType> {
        let mut out: Vec<ConcreteType> = self.ancestors().filter(|a| !a.is_object()).collect();
        out.extend(self.interfaces());
        if !self.is_object() {
            out.push(ConcreteType::object());
        }
        out
    }

    pub fn is_assignable_to(&self, other: &ConcreteType) -> bool {
        crate::comparer::is_assignable(self, other)
    }
}

pub struct Ancestors {
    current: Option<ConcreteType>,
}

impl Iterator for Ancestors {
    type Item = ConcreteType;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;
        self.current = current.base_type();
        Some(current)
    }
}

impl From<TypeDescription> for ConcreteType {
    fn from(definition: TypeDescription) -> Self {
        Self::new_unchecked(definition, vec![])
    }
}

impl From<&TypeDescription> for ConcreteType {
    fn from(definition: &TypeDescription) -> Self {
        Self::new_unchecked(definition.clone(), vec![])
    }
}

impl Display for ConcreteType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.definition().name())?;
        let arity = self.definition().arity();
        if arity == 0 {
            return Ok(());
        }
        if self.arguments().is_empty() {
            return write!(f, "<{}>", ",".repeat(arity - 1));
        }
        write!(f, "<")?;
        for (i, a) in self.arguments().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", a)?;
        }
        write!(f, ">")
    }
}

impl Debug for ConcreteType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct GenericLookup {
    pub type_generics: Arc<[ConcreteType]>,
}

impl GenericLookup {
    pub fn new(type_generics: Vec<ConcreteType>) -> Self {
        Self {
            type_generics: type_generics.into(),
        }
    }

    pub fn make_concrete(&self, t: &TypeSig) -> Result<ConcreteType, TypeResolutionError> {
        match t {
            TypeSig::Generic(i) => self.type_generics.get(*i).cloned().ok_or(
                TypeResolutionError::GenericIndexOutOfBounds {
                    index: *i,
                    length: self.type_generics.len(),
                },
            ),
            TypeSig::Type {
                definition,
                arguments,
            } => {
                let arguments = arguments
                    .iter()
                    .map(|a| self.make_concrete(a))
                    .collect::<Result<Vec<_>, _>>()?;
                ConcreteType::new(definition.clone(), arguments)
            }
        }
    }

    /// Closes `definition` over these generic arguments.
    pub fn instantiate(
        &self,
        definition: &TypeDescription,
    ) -> Result<ConcreteType, TypeResolutionError> {
        ConcreteType::new(definition.clone(), self.type_generics.to_vec())
    }

    /// Works out the generic arguments `definition` needs so that it (or one
    /// of its bases or interfaces) becomes `target`.
    ///
    /// ```ignore
    /// // class Repository<T> : IRepository<T>
    /// let lookup = GenericLookup::infer(&repository, &repository_of_int)?;
    /// assert_eq!(lookup.instantiate(&repository)?.to_string(), "Repository<int>");
    /// ```
    pub fn infer(
        definition: &TypeDescription,
        target: &ConcreteType,
    ) -> Result<GenericLookup, TypeResolutionError> {
        let arity = definition.arity();
        let unbound_names = |bindings: &[Option<ConcreteType>]| -> Vec<String> {
            definition
                .definition()
                .generic_parameters
                .iter()
                .zip(bindings)
                .filter(|(_, b)| b.is_none())
                .map(|(p, _)| p.name.clone())
                .collect()
        };

        if target.contains_open() {
            return Err(TypeResolutionError::UnboundGenericParameters {
                definition: definition.name().to_string(),
                target: target.to_string(),
                parameters: unbound_names(&vec![None; arity]),
            });
        }

        let mut unbound = None;
        let signatures = std::iter::once(definition.own_signature())
            .chain(definition.ancestor_signatures())
            .filter(|sig| sig.definition() == Some(target.definition()));
        for sig in signatures {
            let mut bindings = vec![None; arity];
            if !unify(&sig, target, &mut bindings) {
                continue;
            }
            if bindings.iter().all(Option::is_some) {
                return Ok(GenericLookup::new(bindings.into_iter().flatten().collect()));
            }
            unbound.get_or_insert_with(|| unbound_names(&bindings));
        }

        match unbound {
            Some(parameters) => Err(TypeResolutionError::UnboundGenericParameters {
                definition: definition.name().to_string(),
                target: target.to_string(),
                parameters,
            }),
            None => Err(TypeResolutionError::IncompatibleGenericTarget {
                definition: definition.name().to_string(),
                target: target.to_string(),
            }),
        }
    }
}

fn unify(sig: &TypeSig, concrete: &ConcreteType, bindings: &mut [Option<ConcreteType>]) -> bool {
    match sig {
        TypeSig::Generic(i) => match bindings.get_mut(*i) {
            Some(Some(bound)) => bound == concrete,
            Some(slot) => {
                *slot = Some(concrete.clone());
                true
            }
            None => false,
        },
        TypeSig::Type {
            definition,
            arguments,
        } => {
            definition == concrete.definition()
                && arguments.len() == concrete.arguments().len()
                && arguments
                    .iter()
                    .zip(concrete.arguments())
                    .all(|(s, c)| unify(s, c, bindings))
        }
    }
}

impl Debug for GenericLookup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        struct GenericIndexFormatter(usize);
        impl Debug for GenericIndexFormatter {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "T{}", self.0)
            }
        }

        f.debug_map()
            .entries(
                self.type_generics
                    .iter()
                    .enumerate()
                    .map(|(i, t)| (GenericIndexFormatter(i), t)),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeBuilder;

    fn int() -> TypeDescription {
        TypeBuilder::class("int").build().unwrap()
    }

    #[test]
    fn test_display_open_and_closed() {
        let map = TypeBuilder::interface("IMap").param("K").param("V").build().unwrap();
        let int = int();
        assert_eq!(ConcreteType::from(&map).to_string(), "IMap<,>");
        let closed = map
            .instantiate([ConcreteType::from(&int), ConcreteType::object()])
            .unwrap();
        assert_eq!(closed.to_string(), "IMap<int, object>");
        assert!(closed.is_closed_generic());
        assert!(!closed.contains_open());
    }

    #[test]
    fn test_arity_is_checked() {
        let list = TypeBuilder::class("List").param("T").build().unwrap();
        let err = list
            .instantiate([ConcreteType::object(), ConcreteType::object()])
            .unwrap_err();
        assert!(matches!(err, TypeResolutionError::ArityMismatch { expected: 1, actual: 2, .. }));
    }

    #[test]
    fn test_infer_through_interface() {
        let int = ConcreteType::from(&int());
        let repo = TypeBuilder::interface("IRepository").param("T").build().unwrap();
        let list = TypeBuilder::class("List").param("T").build().unwrap();
        // class ListRepository<T> : IRepository<List<T>>
        let list_repo = TypeBuilder::class("ListRepository")
            .param("T")
            .implements(TypeSig::generic(
                repo.clone(),
                vec![TypeSig::generic(list.clone(), vec![TypeSig::Generic(0)])],
            ))
            .build()
            .unwrap();

        let target = repo
            .instantiate([list.instantiate([int.clone()]).unwrap()])
            .unwrap();
        let lookup = GenericLookup::infer(&list_repo, &target).unwrap();
        assert_eq!(
            lookup.instantiate(&list_repo).unwrap().to_string(),
            "ListRepository<int>"
        );

        let mismatch = repo.instantiate([int]).unwrap();
        assert!(matches!(
            GenericLookup::infer(&list_repo, &mismatch),
            Err(TypeResolutionError::IncompatibleGenericTarget { .. })
        ));
    }

    #[test]
    fn test_infer_reports_unbound_parameters() {
        let int = ConcreteType::from(&int());
        let service = TypeBuilder::interface("IService").param("T").build().unwrap();
        // class Pair<A, B> : IService<A>, B cannot be inferred
        let pair = TypeBuilder::class("Pair")
            .param("A")
            .param("B")
            .implements(TypeSig::generic(service.clone(), vec![TypeSig::Generic(0)]))
            .build()
            .unwrap();

        let err = GenericLookup::infer(&pair, &service.instantiate([int]).unwrap()).unwrap_err();
        match err {
            TypeResolutionError::UnboundGenericParameters { parameters, .. } => {
                assert_eq!(parameters, vec!["B".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_bases_and_interfaces_end_with_object() {
        let marker = TypeBuilder::interface("IMarker").build().unwrap();
        let base = TypeBuilder::class("Base")
            .implements(TypeSig::of(&marker))
            .build()
            .unwrap();
        let derived = TypeBuilder::class("Derived")
            .extends(TypeSig::of(&base))
            .build()
            .unwrap();

        let names: Vec<_> = ConcreteType::from(&derived)
            .bases_and_interfaces()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, vec!["Base", "IMarker", "object"]);
    }
}
