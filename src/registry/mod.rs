//! Registration and lookup of targets.
//!
//! Targets are stored per type definition. Non-generic types keep a flat
//! list; generic definitions keep the targets registered against the open
//! definition apart from those registered against each instantiation.
//! Decorators wrap a definition's node so that decoration is applied each
//! time a target is fetched through it.
//!
//! A lookup expands the requested type into its candidates (see
//! [`TypeCandidates`]) and looks them up in order.
use crate::{
    compiler::TargetSource,
    error::RegistrationError,
    metrics::CacheStat,
    options::RegistryOptions,
    targets::Target,
};
use dashmap::DashMap;
use rezolve_types::{
    candidates::{CandidateOptions, KnownTypes, TypeCandidates},
    ConcreteType, GenericLookup, TypeDescription,
};
use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicU64, Ordering},
};
use tracing::{debug, trace};

mod decorating;
mod generic;
mod known_types;
mod list;

pub use decorating::DecoratingTargetContainer;
pub use generic::GenericTargetContainer;
pub use known_types::KnownTypeIndex;
pub use list::TargetList;

pub enum RegistryNode {
    Targets(TargetList),
    Generic(GenericTargetContainer),
    Decorated(DecoratingTargetContainer),
}

impl RegistryNode {
    fn for_definition(definition: &TypeDescription) -> Self {
        if definition.is_generic_definition() {
            RegistryNode::Generic(GenericTargetContainer::default())
        } else {
            RegistryNode::Targets(TargetList::default())
        }
    }

    fn register(&mut self, target: Target, service: &ConcreteType, allow_multiple: bool) {
        match self {
            RegistryNode::Targets(list) => list.register(target, allow_multiple),
            RegistryNode::Generic(generic) => generic.register(target, service, allow_multiple),
            RegistryNode::Decorated(decorated) => {
                decorated
                    .inner_mut()
                    .register(target, service, allow_multiple)
            }
        }
    }

    /// The target registered exactly for `candidate`, looked up on behalf
    /// of `requested`.
    pub fn fetch(&self, candidate: &ConcreteType, requested: &ConcreteType) -> Option<Target> {
        match self {
            RegistryNode::Targets(list) => list.fetch(),
            RegistryNode::Generic(generic) => generic.fetch(candidate),
            RegistryNode::Decorated(decorated) => decorated.fetch(candidate, requested),
        }
    }

    pub fn fetch_all(&self, candidate: &ConcreteType, requested: &ConcreteType) -> Vec<Target> {
        match self {
            RegistryNode::Targets(list) => list.fetch_all(),
            RegistryNode::Generic(generic) => generic.fetch_all(candidate),
            RegistryNode::Decorated(decorated) => decorated.fetch_all(candidate, requested),
        }
    }
}

/// Targets keyed by the type definition they were registered against.
///
/// Registration needs `&mut self`; once handed to a
/// [`Container`](crate::Container) the registry is only read.
#[derive(Default)]
pub struct TargetRegistry {
    options: RegistryOptions,
    nodes: HashMap<TypeDescription, RegistryNode>,
    known_types: KnownTypeIndex,
    fetch_cache: DashMap<ConcreteType, Option<Target>>,
    fetch_hits: AtomicU64,
    fetch_misses: AtomicU64,
}

impl TargetRegistry {
    pub fn new(options: RegistryOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// The types looked up for `ty`, in order.
    pub fn candidates(&self, ty: &ConcreteType) -> TypeCandidates<'_> {
        let options = CandidateOptions {
            contravariance: self.options.enable_contravariance,
            covariance: self.options.enable_covariance,
        };
        TypeCandidates::new(ty.clone(), options, self)
    }

    /// Registers `target` for `service`, or for its declared type.
    pub fn register(
        &mut self,
        target: Target,
        service: Option<ConcreteType>,
    ) -> Result<(), RegistrationError> {
        let declared = target.declared_type();
        let service = service.unwrap_or_else(|| declared.clone());

        if service.is_generic_definition() && !declared.is_generic_definition() {
            return Err(RegistrationError::NotGenericTypeDefinition {
                target: declared,
                service,
            });
        }
        if !target.supports_type(&service) {
            return Err(RegistrationError::UnsupportedType {
                target: declared,
                service,
            });
        }

        debug!(target_id = %target.id(), service = %service, "Registering target");
        self.known_types.add(&service);
        self.known_types.add(&declared);
        self.nodes
            .entry(service.definition().clone())
            .or_insert_with(|| RegistryNode::for_definition(service.definition()))
            .register(target, &service, self.options.allow_multiple);
        self.fetch_cache.clear();
        Ok(())
    }

    /// Decorates every target fetched for `service` with a `decorator`
    /// instance constructed around it.
    pub fn register_decorator(
        &mut self,
        decorator: TypeDescription,
        service: ConcreteType,
    ) -> Result<(), RegistrationError> {
        let compatible = decorator.is_constructible()
            && if decorator.is_generic_definition() {
                if service.is_generic_definition() {
                    ConcreteType::from(&decorator).is_assignable_to(&service)
                } else {
                    GenericLookup::infer(&decorator, &service).is_ok()
                }
            } else {
                ConcreteType::from(&decorator).is_assignable_to(&service)
            };
        if !compatible {
            return Err(RegistrationError::UnsupportedType {
                target: ConcreteType::from(&decorator),
                service,
            });
        }

        let definition = service.definition().clone();
        let node = self
            .nodes
            .remove(&definition)
            .unwrap_or_else(|| RegistryNode::for_definition(&definition));
        let duplicate =
            matches!(&node, RegistryNode::Decorated(d) if d.decorates(&decorator, &service));
        if duplicate {
            self.nodes.insert(definition, node);
            return Err(RegistrationError::DuplicateDecorator {
                decorator: ConcreteType::from(&decorator),
                service,
            });
        }

        debug!(decorator = %decorator, service = %service, "Registering decorator");
        self.nodes.insert(
            definition,
            RegistryNode::Decorated(DecoratingTargetContainer::new(decorator, service, node)),
        );
        self.fetch_cache.clear();
        Ok(())
    }

    /// The best target for `ty`, or `None` when nothing can produce it.
    pub fn fetch(&self, ty: &ConcreteType) -> Option<Target> {
        if let Some(hit) = self.fetch_cache.get(ty) {
            self.fetch_hits.fetch_add(1, Ordering::Relaxed);
            return hit.value().clone();
        }
        self.fetch_misses.fetch_add(1, Ordering::Relaxed);

        let found = self.fetch_uncached(ty);
        trace!(requested = %ty, found = ?found, "Fetched target");
        self.fetch_cache.insert(ty.clone(), found.clone());
        found
    }

    fn fetch_uncached(&self, ty: &ConcreteType) -> Option<Target> {
        for candidate in self.candidates(ty) {
            let Some(node) = self.nodes.get(candidate.ty.definition()) else {
                continue;
            };
            if let Some(target) = node.fetch(&candidate.ty, ty) {
                return Some(if candidate.variant {
                    Target::change_type(target, candidate.ty, ty.clone())
                } else {
                    target
                });
            }
        }

        if self.options.enable_enumerable_injection
            && ty.definition() == &TypeDescription::enumerable()
            && ty.is_closed_generic()
        {
            let element = ty.arguments()[0].clone();
            let targets = self.fetch_all(&element);
            return Some(Target::enumerable(element, targets));
        }
        None
    }

    /// Every target that can produce `ty`, in registration order.
    pub fn fetch_all(&self, ty: &ConcreteType) -> Vec<Target> {
        let open = ty.is_closed_generic().then(|| ty.generic_definition());
        let mut found = vec![];
        for candidate in self.candidates(ty) {
            if Some(&candidate.ty) == open.as_ref() {
                continue;
            }
            let Some(node) = self.nodes.get(candidate.ty.definition()) else {
                continue;
            };
            let hits = node.fetch_all(&candidate.ty, ty);
            if hits.is_empty() {
                continue;
            }
            found.extend(hits.into_iter().map(|t| {
                if candidate.variant {
                    Target::change_type(t, candidate.ty.clone(), ty.clone())
                } else {
                    t
                }
            }));
            if !self.options.fetch_all_match_all_generic_targets {
                break;
            }
        }

        if let Some(open) = &open {
            if let Some(node) = self.nodes.get(open.definition()) {
                found.extend(node.fetch_all(open, ty));
            }
        }

        let mut seen = HashSet::new();
        found.retain(|t| seen.insert(t.id()));
        found
    }

    pub fn fetch_stat(&self) -> CacheStat {
        CacheStat::new(
            self.fetch_hits.load(Ordering::Relaxed),
            self.fetch_misses.load(Ordering::Relaxed),
            self.fetch_cache.len(),
        )
    }
}

impl KnownTypes for TargetRegistry {
    fn derived_types(&self, ty: &ConcreteType) -> Vec<ConcreteType> {
        self.known_types.derived_of(ty)
    }
}

impl TargetSource for TargetRegistry {
    fn fetch(&self, ty: &ConcreteType) -> Option<Target> {
        TargetRegistry::fetch(self, ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{targets::TargetKind, value::Value};
    use rezolve_types::{ParameterDefinition, TypeBuilder, TypeSig};

    struct Fixture {
        repo: TypeDescription,
        repository: TypeDescription,
        int: ConcreteType,
        string: ConcreteType,
    }

    fn fixture() -> Fixture {
        let repo = TypeBuilder::interface("IRepository").param("T").build().unwrap();
        let repository = TypeBuilder::class("Repository")
            .param("T")
            .implements(TypeSig::generic(repo.clone(), vec![TypeSig::Generic(0)]))
            .build()
            .unwrap();
        Fixture {
            repo,
            repository,
            int: TypeBuilder::class("int").build().unwrap().into(),
            string: TypeBuilder::class("string").build().unwrap().into(),
        }
    }

    #[test]
    fn test_closed_registration_beats_open() {
        let f = fixture();
        let mut registry = TargetRegistry::default();
        let open = Target::for_type(&f.repository);
        let closed_service = f.repo.instantiate([f.int.clone()]).unwrap();
        let closed = Target::constructor(f.repository.instantiate([f.int.clone()]).unwrap());
        registry
            .register(open.clone(), Some(ConcreteType::from(&f.repo)))
            .unwrap();
        registry
            .register(closed.clone(), Some(closed_service.clone()))
            .unwrap();

        assert_eq!(registry.fetch(&closed_service), Some(closed));
        let string_repo = f.repo.instantiate([f.string.clone()]).unwrap();
        assert_eq!(registry.fetch(&string_repo), Some(open));
    }

    #[test]
    fn test_registration_errors() {
        let f = fixture();
        let mut registry = TargetRegistry::default();
        let object = Target::object(Value::Int(1), f.int.clone());

        assert!(matches!(
            registry.register(object.clone(), Some(ConcreteType::from(&f.repo))),
            Err(RegistrationError::NotGenericTypeDefinition { .. })
        ));
        assert!(matches!(
            registry.register(object, Some(f.string.clone())),
            Err(RegistrationError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_fetch_all_and_allow_multiple() {
        let f = fixture();
        let first = Target::object(Value::Int(1), f.int.clone());
        let second = Target::object(Value::Int(2), f.int.clone());

        let mut registry = TargetRegistry::default();
        registry.register(first.clone(), None).unwrap();
        registry.register(second.clone(), None).unwrap();
        assert_eq!(registry.fetch(&f.int), Some(second.clone()));
        assert_eq!(registry.fetch_all(&f.int), vec![first, second.clone()]);

        let mut single = TargetRegistry::new(RegistryOptions {
            allow_multiple: false,
            ..RegistryOptions::default()
        });
        single
            .register(Target::object(Value::Int(1), f.int.clone()), None)
            .unwrap();
        single.register(second.clone(), None).unwrap();
        assert_eq!(single.fetch_all(&f.int), vec![second]);
    }

    #[test]
    fn test_fetch_all_appends_open_targets() {
        let f = fixture();
        let int_repo = f.repo.instantiate([f.int.clone()]).unwrap();
        let open = Target::for_type(&f.repository);
        let closed = Target::constructor(f.repository.instantiate([f.int.clone()]).unwrap());

        let mut registry = TargetRegistry::default();
        registry
            .register(open.clone(), Some(ConcreteType::from(&f.repo)))
            .unwrap();
        registry.register(closed.clone(), Some(int_repo.clone())).unwrap();
        assert_eq!(registry.fetch_all(&int_repo), vec![closed, open]);
    }

    #[test]
    fn test_fetch_all_match_all_generic_targets() {
        let base = TypeBuilder::class("Base").build().unwrap();
        let derived = TypeBuilder::class("Derived")
            .extends(TypeSig::of(&base))
            .build()
            .unwrap();
        let sink = TypeBuilder::interface("ISink")
            .contravariant("T")
            .build()
            .unwrap();
        let sink_impl = TypeBuilder::class("Sink")
            .param("T")
            .implements(TypeSig::generic(sink.clone(), vec![TypeSig::Generic(0)]))
            .build()
            .unwrap();
        let sink_derived = sink.instantiate([ConcreteType::from(&derived)]).unwrap();
        let sink_base = sink.instantiate([ConcreteType::from(&base)]).unwrap();

        let for_derived = Target::object(Value::Int(1), sink_derived.clone());
        let for_base = Target::object(Value::Int(2), sink_base.clone());
        let open = Target::for_type(&sink_impl);
        let register = |registry: &mut TargetRegistry| {
            registry.register(for_derived.clone(), None).unwrap();
            registry.register(for_base.clone(), None).unwrap();
            registry
                .register(open.clone(), Some(ConcreteType::from(&sink)))
                .unwrap();
        };

        let mut registry = TargetRegistry::default();
        register(&mut registry);
        assert_eq!(
            registry.fetch_all(&sink_derived),
            vec![for_derived.clone(), open.clone()]
        );

        let mut registry = TargetRegistry::new(RegistryOptions {
            fetch_all_match_all_generic_targets: true,
            ..RegistryOptions::default()
        });
        register(&mut registry);
        let found = registry.fetch_all(&sink_derived);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0], for_derived);
        match found[1].kind() {
            TargetKind::ChangeTypeTarget(changed) => {
                assert_eq!(changed.inner(), &for_base);
                assert_eq!(changed.matched(), &sink_base);
            }
            other => panic!("expected a change type target, got {}", other.name()),
        }
        assert!(found[1].supports_type(&sink_derived));
        assert_eq!(found[2], open);
    }

    #[test]
    fn test_fetch_is_memoized_until_registration() {
        let f = fixture();
        let mut registry = TargetRegistry::default();
        assert_eq!(registry.fetch(&f.int), None);
        assert_eq!(registry.fetch(&f.int), None);
        let stat = registry.fetch_stat();
        assert_eq!((stat.hits, stat.misses), (1, 1));

        let target = Target::object(Value::Int(1), f.int.clone());
        registry.register(target.clone(), None).unwrap();
        assert_eq!(registry.fetch(&f.int), Some(target));
    }

    #[test]
    fn test_duplicate_decorator_rejected() {
        let f = fixture();
        let caching = TypeBuilder::class("CachingRepository")
            .param("T")
            .implements(TypeSig::generic(f.repo.clone(), vec![TypeSig::Generic(0)]))
            .constructor(vec![ParameterDefinition::new(
                "inner",
                TypeSig::generic(f.repo.clone(), vec![TypeSig::Generic(0)]),
            )])
            .build()
            .unwrap();
        let service = ConcreteType::from(&f.repo);

        let mut registry = TargetRegistry::default();
        registry
            .register(Target::for_type(&f.repository), Some(service.clone()))
            .unwrap();
        registry
            .register_decorator(caching.clone(), service.clone())
            .unwrap();
        assert!(matches!(
            registry.register_decorator(caching, service.clone()),
            Err(RegistrationError::DuplicateDecorator { .. })
        ));
        assert!(matches!(
            registry.register_decorator(f.repo.clone(), service),
            Err(RegistrationError::UnsupportedType { .. })
        ));

        let fetched = registry
            .fetch(&f.repo.instantiate([f.int.clone()]).unwrap())
            .unwrap();
        assert_eq!(fetched.kind().name(), "decorator");
    }

    #[test]
    fn test_enumerable_injection() {
        let f = fixture();
        let mut registry = TargetRegistry::default();
        let enumerable = ConcreteType::enumerable_of(f.int.clone());
        let empty = registry.fetch(&enumerable).unwrap();
        assert!(empty.use_fallback());

        registry
            .register(Target::object(Value::Int(1), f.int.clone()), None)
            .unwrap();
        let target = registry.fetch(&enumerable).unwrap();
        assert!(!target.use_fallback());
        assert_eq!(target.kind().name(), "enumerable");
    }
}
