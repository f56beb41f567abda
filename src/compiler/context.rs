use super::{Compiler, TargetSource};
use crate::{
    container::ContainerId,
    error::CompileError,
    resolve::{ActiveContainer, Factory},
    targets::{Target, TargetId},
};
use rezolve_types::ConcreteType;
use std::{
    any::{Any, TypeId},
    borrow::Cow,
    cell::RefCell,
    collections::HashMap,
    rc::Rc,
    sync::Arc,
};

/// Key of a value shared by every target compiled in one compilation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SharedKey {
    pub target_type: ConcreteType,
    pub name: Cow<'static, str>,
    pub requested_by: Option<ConcreteType>,
}

impl SharedKey {
    pub fn new(target_type: ConcreteType, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            target_type,
            name: name.into(),
            requested_by: None,
        }
    }

    pub fn requested_by(mut self, ty: ConcreteType) -> Self {
        self.requested_by = Some(ty);
        self
    }
}

/// Call-time test of whether the active container is the one a factory was
/// compiled for.
pub type ContainerCheck = Arc<dyn Fn(&dyn ActiveContainer) -> bool + Send + Sync>;

#[derive(Default)]
struct CompileState {
    compiling: Vec<(TargetId, ConcreteType)>,
    shared: HashMap<(SharedKey, TypeId), Box<dyn Any>>,
    compiled: HashMap<(TargetId, ConcreteType, bool), Factory>,
}

/// State of one compilation. Children share the cycle stack, the shared
/// values and the compiled memo with the context they were created from.
pub struct CompileContext<'c> {
    compiler: &'c Compiler,
    source: &'c dyn TargetSource,
    container_id: ContainerId,
    requested_type: ConcreteType,
    suppress_scope_tracking: bool,
    state: Rc<RefCell<CompileState>>,
}

impl<'c> CompileContext<'c> {
    pub fn new(
        compiler: &'c Compiler,
        source: &'c dyn TargetSource,
        container_id: ContainerId,
        requested_type: ConcreteType,
    ) -> Self {
        Self {
            compiler,
            source,
            container_id,
            requested_type,
            suppress_scope_tracking: false,
            state: Rc::new(RefCell::new(CompileState::default())),
        }
    }

    pub fn child(&self, requested_type: ConcreteType) -> CompileContext<'c> {
        CompileContext {
            compiler: self.compiler,
            source: self.source,
            container_id: self.container_id,
            requested_type,
            suppress_scope_tracking: self.suppress_scope_tracking,
            state: self.state.clone(),
        }
    }

    pub fn suppressing_scope_tracking(&self) -> CompileContext<'c> {
        let mut child = self.child(self.requested_type.clone());
        child.suppress_scope_tracking = true;
        child
    }

    pub fn requested_type(&self) -> &ConcreteType {
        &self.requested_type
    }

    pub fn container_id(&self) -> ContainerId {
        self.container_id
    }

    pub fn suppress_scope_tracking(&self) -> bool {
        self.suppress_scope_tracking
    }

    pub fn fetch(&self, ty: &ConcreteType) -> Option<Target> {
        self.source.fetch(ty)
    }

    /// Compiles a nested target for `requested`.
    pub fn compile(&self, target: &Target, requested: &ConcreteType) -> Result<Factory, CompileError> {
        self.compiler.compile(target, &self.child(requested.clone()))
    }

    /// Like [`compile`](Self::compile), with scope tracking suppressed for
    /// the nested target and everything it compiles.
    pub fn compile_untracked(
        &self,
        target: &Target,
        requested: &ConcreteType,
    ) -> Result<Factory, CompileError> {
        let mut child = self.child(requested.clone());
        child.suppress_scope_tracking = true;
        self.compiler.compile(target, &child)
    }

    pub fn get_or_add_shared<T: Clone + 'static>(&self, key: SharedKey, create: impl FnOnce() -> T) -> T {
        let slot = (key, TypeId::of::<T>());
        if let Some(existing) = self
            .state
            .borrow()
            .shared
            .get(&slot)
            .and_then(|v| v.downcast_ref::<T>())
        {
            return existing.clone();
        }
        let value = create();
        self.state
            .borrow_mut()
            .shared
            .insert(slot, Box::new(value.clone()));
        value
    }

    pub fn same_container_check(&self) -> ContainerCheck {
        let id = self.container_id;
        self.get_or_add_shared(
            SharedKey::new(ConcreteType::object(), "IsSameContainer"),
            || -> ContainerCheck { Arc::new(move |c: &dyn ActiveContainer| c.container_id() == id) },
        )
    }

    pub(crate) fn is_compiling(&self, id: TargetId, ty: &ConcreteType) -> bool {
        self.state
            .borrow()
            .compiling
            .iter()
            .any(|(i, t)| *i == id && t == ty)
    }

    pub(crate) fn depth(&self) -> usize {
        self.state.borrow().compiling.len()
    }

    /// Requested types of the targets in progress, outermost first.
    pub(crate) fn compiling_path(&self) -> Vec<ConcreteType> {
        let state = self.state.borrow();
        let mut path: Vec<ConcreteType> = vec![];
        for (_, ty) in &state.compiling {
            if path.last() != Some(ty) {
                path.push(ty.clone());
            }
        }
        path
    }

    pub(crate) fn push(&self, id: TargetId) {
        self.state
            .borrow_mut()
            .compiling
            .push((id, self.requested_type.clone()));
    }

    pub(crate) fn pop(&self) {
        self.state.borrow_mut().compiling.pop();
    }

    pub(crate) fn compiled(&self, id: TargetId) -> Option<Factory> {
        self.state
            .borrow()
            .compiled
            .get(&(id, self.requested_type.clone(), self.suppress_scope_tracking))
            .cloned()
    }

    pub(crate) fn memoize(&self, id: TargetId, factory: Factory) {
        self.state.borrow_mut().compiled.insert(
            (id, self.requested_type.clone(), self.suppress_scope_tracking),
            factory,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{registry::TargetRegistry, value::Value};

    #[test]
    fn test_shared_values_are_per_compilation() {
        let compiler = Compiler::new(16);
        let registry = TargetRegistry::default();
        let ctx = CompileContext::new(&compiler, &registry, ContainerId::next(), ConcreteType::object());
        let child = ctx.child(ConcreteType::object());

        let key = SharedKey::new(ConcreteType::object(), "counter");
        assert_eq!(ctx.get_or_add_shared(key.clone(), || 1u32), 1);
        assert_eq!(child.get_or_add_shared(key.clone(), || 2u32), 1);
        // a different stored type is a different slot
        assert_eq!(child.get_or_add_shared(key, || Value::Int(3)).as_int(), Some(3));

        let other = CompileContext::new(&compiler, &registry, ContainerId::next(), ConcreteType::object());
        let k = SharedKey::new(ConcreteType::object(), "counter");
        assert_eq!(other.get_or_add_shared(k, || 5u32), 5);
    }

    #[test]
    fn test_suppression_is_inherited() {
        let compiler = Compiler::new(16);
        let registry = TargetRegistry::default();
        let ctx = CompileContext::new(&compiler, &registry, ContainerId::next(), ConcreteType::object());
        assert!(!ctx.suppress_scope_tracking());
        let suppressed = ctx.suppressing_scope_tracking();
        assert!(suppressed.suppress_scope_tracking());
        assert!(suppressed.child(ConcreteType::object()).suppress_scope_tracking());
    }

    #[test]
    fn test_same_container_check_is_shared() {
        let compiler = Compiler::new(16);
        let registry = TargetRegistry::default();
        let ctx = CompileContext::new(&compiler, &registry, ContainerId::next(), ConcreteType::object());
        let a = ctx.same_container_check();
        let b = ctx.child(ConcreteType::object()).same_container_check();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
