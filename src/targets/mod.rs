//! Recipes for producing instances.
//!
//! Every target declares the type it produces, which requested types it can
//! satisfy, and how it lowers into a [`Factory`]. [`Target`] is the shared,
//! immutable handle the registry stores.
use crate::{compiler::CompileContext, error::CompileError, resolve::Factory, value::Value};
use enum_dispatch::enum_dispatch;
use rezolve_types::{ConcreteType, TypeDescription};
use std::{
    fmt::{Debug, Display, Formatter},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

mod change_type;
mod constructor;
mod decorator;
mod delegate;
mod enumerable;
mod lifetime;
mod object;
mod rezolved;
mod unresolved;

pub use change_type::ChangeTypeTarget;
pub use constructor::{ConstructorTarget, GenericConstructorTarget};
pub use decorator::DecoratorTarget;
pub use delegate::{DelegateFn, DelegateTarget};
pub use enumerable::EnumerableTarget;
pub use lifetime::{ScopedTarget, SingletonTarget};
pub use object::ObjectTarget;
pub use rezolved::RezolvedTarget;
pub use unresolved::UnresolvedTarget;

pub(crate) use constructor::compile_construction;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u64);

impl TargetId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for TargetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[enum_dispatch]
pub trait TargetBehavior {
    /// The canonical type this target produces.
    fn declared_type(&self) -> ConcreteType;

    fn supports_type(&self, ty: &ConcreteType) -> bool;

    /// Placeholder targets give way to a real match found elsewhere.
    fn use_fallback(&self) -> bool {
        false
    }

    fn compile(&self, context: &CompileContext) -> Result<Factory, CompileError>;
}

#[enum_dispatch(TargetBehavior)]
pub enum TargetKind {
    ConstructorTarget,
    GenericConstructorTarget,
    DecoratorTarget,
    DelegateTarget,
    RezolvedTarget,
    ObjectTarget,
    SingletonTarget,
    ScopedTarget,
    EnumerableTarget,
    ChangeTypeTarget,
    UnresolvedTarget,
}

impl TargetKind {
    pub fn name(&self) -> &'static str {
        match self {
            TargetKind::ConstructorTarget(_) => "constructor",
            TargetKind::GenericConstructorTarget(_) => "generic constructor",
            TargetKind::DecoratorTarget(_) => "decorator",
            TargetKind::DelegateTarget(_) => "delegate",
            TargetKind::RezolvedTarget(_) => "rezolved",
            TargetKind::ObjectTarget(_) => "object",
            TargetKind::SingletonTarget(_) => "singleton",
            TargetKind::ScopedTarget(_) => "scoped",
            TargetKind::EnumerableTarget(_) => "enumerable",
            TargetKind::ChangeTypeTarget(_) => "change type",
            TargetKind::UnresolvedTarget(_) => "unresolved",
        }
    }
}

struct TargetNode {
    id: TargetId,
    kind: TargetKind,
}

/// Shared handle to an immutable target.
#[derive(Clone)]
pub struct Target(Arc<TargetNode>);

impl Target {
    pub fn new(kind: impl Into<TargetKind>) -> Self {
        Self(Arc::new(TargetNode {
            id: TargetId::next(),
            kind: kind.into(),
        }))
    }

    pub fn id(&self) -> TargetId {
        self.0.id
    }

    pub fn kind(&self) -> &TargetKind {
        &self.0.kind
    }

    pub fn declared_type(&self) -> ConcreteType {
        self.0.kind.declared_type()
    }

    pub fn supports_type(&self, ty: &ConcreteType) -> bool {
        self.0.kind.supports_type(ty)
    }

    pub fn use_fallback(&self) -> bool {
        self.0.kind.use_fallback()
    }

    pub fn compile(&self, context: &CompileContext) -> Result<Factory, CompileError> {
        self.0.kind.compile(context)
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self.0.kind, TargetKind::UnresolvedTarget(_))
    }

    /// Builds `ty` with its best matching constructor.
    pub fn constructor(ty: ConcreteType) -> Self {
        Self::new(ConstructorTarget::new(ty, None))
    }

    /// Builds `ty` with the constructor at `index`.
    pub fn constructor_at(ty: ConcreteType, index: usize) -> Self {
        Self::new(ConstructorTarget::new(ty, Some(index)))
    }

    /// A constructor target for `ty`, or a generic constructor target when
    /// `ty` is an open generic definition.
    pub fn for_type(ty: impl Into<ConcreteType>) -> Self {
        let ty = ty.into();
        if ty.is_generic_definition() {
            Self::generic_constructor(ty.definition().clone())
        } else {
            Self::constructor(ty)
        }
    }

    pub fn generic_constructor(definition: TypeDescription) -> Self {
        Self::new(GenericConstructorTarget::new(definition))
    }

    pub fn object(value: Value, declared: ConcreteType) -> Self {
        Self::new(ObjectTarget::new(value, declared))
    }

    pub fn delegate(
        declared: ConcreteType,
        parameters: Vec<ConcreteType>,
        func: impl Fn(&[Value]) -> Result<Value, crate::error::ResolveError> + Send + Sync + 'static,
    ) -> Self {
        Self::new(DelegateTarget::new(declared, parameters, Arc::new(func)))
    }

    pub fn singleton(inner: Target) -> Self {
        Self::new(SingletonTarget::new(inner))
    }

    pub fn scoped(inner: Target) -> Self {
        Self::new(ScopedTarget::new(inner))
    }

    pub fn rezolved(ty: ConcreteType) -> Self {
        Self::new(RezolvedTarget::new(ty, None))
    }

    pub fn rezolved_with_fallback(ty: ConcreteType, fallback: Target) -> Self {
        Self::new(RezolvedTarget::new(ty, Some(fallback)))
    }

    pub fn enumerable(element_type: ConcreteType, targets: Vec<Target>) -> Self {
        Self::new(EnumerableTarget::new(element_type, targets))
    }

    pub fn decorator(decorator: TypeDescription, inner: Target, service: ConcreteType) -> Self {
        Self::new(DecoratorTarget::new(decorator, inner, service))
    }

    pub fn change_type(inner: Target, matched: ConcreteType, requested: ConcreteType) -> Self {
        Self::new(ChangeTypeTarget::new(inner, matched, requested))
    }

    pub fn unresolved(ty: ConcreteType) -> Self {
        Self::new(UnresolvedTarget::new(ty))
    }
}

impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Target {}

impl Debug for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}({})",
            self.id(),
            self.kind().name(),
            self.declared_type()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rezolve_types::{TypeBuilder, TypeSig};

    #[test]
    fn test_ids_are_unique() {
        let a = Target::object(Value::Null, ConcreteType::object());
        let b = Target::object(Value::Null, ConcreteType::object());
        assert_ne!(a.id(), b.id());
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_for_type_picks_generic_constructor() {
        let list = TypeBuilder::class("List").param("T").build().unwrap();
        let item = TypeBuilder::class("Item").build().unwrap();
        assert_eq!(Target::for_type(&list).kind().name(), "generic constructor");
        assert_eq!(Target::for_type(&item).kind().name(), "constructor");
        assert!(Target::unresolved(ConcreteType::from(&item)).is_unresolved());
    }

    #[test]
    fn test_supports_base_types() {
        let marker = TypeBuilder::interface("IMarker").build().unwrap();
        let item = TypeBuilder::class("Item")
            .implements(TypeSig::of(&marker))
            .build()
            .unwrap();
        let target = Target::for_type(&item);
        assert!(target.supports_type(&ConcreteType::from(&marker)));
        assert!(target.supports_type(&ConcreteType::object()));
        assert!(!Target::for_type(&marker).supports_type(&ConcreteType::from(&item)));
    }

    #[test]
    fn test_change_type_supports_only_assignable_types() {
        let animal = TypeBuilder::class("Animal").build().unwrap();
        let dog = TypeBuilder::class("Dog")
            .extends(TypeSig::of(&animal))
            .build()
            .unwrap();
        let handler = TypeBuilder::interface("IHandler")
            .contravariant("T")
            .build()
            .unwrap();
        let list = TypeBuilder::class("List").param("T").build().unwrap();
        let handler_animal = handler.instantiate([ConcreteType::from(&animal)]).unwrap();
        let handler_dog = handler.instantiate([ConcreteType::from(&dog)]).unwrap();

        let inner = Target::object(Value::Int(1), handler_animal.clone());
        let target =
            Target::change_type(inner.clone(), handler_animal.clone(), handler_dog.clone());
        assert!(target.supports_type(&handler_dog));

        let list_animal = list.instantiate([handler_animal]).unwrap();
        let list_dog = list.instantiate([handler_dog]).unwrap();
        let mismatched = Target::change_type(inner, list_animal, list_dog.clone());
        assert!(!mismatched.supports_type(&list_dog));
    }
}
