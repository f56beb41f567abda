use super::{Target, TargetBehavior};
use crate::{
    compiler::CompileContext,
    error::{CompileError, ResolveError},
    resolve::{factory, Factory},
    value::Value,
};
use dashmap::DashMap;
use parking_lot::ReentrantMutex;
use rezolve_types::ConcreteType;
use std::{
    cell::RefCell,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

#[derive(Default)]
enum SingletonState {
    #[default]
    Empty,
    Creating,
    Created(Value),
}

/// Other threads wait on the lock while an instance is created; the creating
/// thread re-entering its own cell sees `Creating` and fails.
type SingletonCell = Arc<ReentrantMutex<RefCell<SingletonState>>>;

/// One instance per closed type for as long as the target lives. The
/// instance is tracked by the outermost scope it was first created in.
pub struct SingletonTarget {
    inner: Target,
    instances: Arc<DashMap<ConcreteType, SingletonCell>>,
}

impl SingletonTarget {
    pub fn new(inner: Target) -> Self {
        Self {
            inner,
            instances: Arc::new(DashMap::new()),
        }
    }
}

impl TargetBehavior for SingletonTarget {
    fn declared_type(&self) -> ConcreteType {
        self.inner.declared_type()
    }

    fn supports_type(&self, ty: &ConcreteType) -> bool {
        self.inner.supports_type(ty)
    }

    fn compile(&self, context: &CompileContext) -> Result<Factory, CompileError> {
        let requested = context.requested_type().clone();
        let inner = context.compile_untracked(&self.inner, &requested)?;
        let instances = self.instances.clone();
        let track = !context.suppress_scope_tracking();
        Ok(factory(move |rc| {
            let cell = instances.entry(requested.clone()).or_default().clone();
            let slot = cell.lock();
            match &*slot.borrow() {
                SingletonState::Created(existing) => return Ok(existing.clone()),
                SingletonState::Creating => {
                    return Err(ResolveError::ReentrantSingleton(requested.clone()))
                }
                SingletonState::Empty => {}
            }
            *slot.borrow_mut() = SingletonState::Creating;
            let value = match inner(rc) {
                Ok(value) => value,
                Err(e) => {
                    *slot.borrow_mut() = SingletonState::Empty;
                    return Err(e);
                }
            };
            if track {
                if let Some(scope) = rc.scope() {
                    scope.root().track(&value);
                }
            }
            *slot.borrow_mut() = SingletonState::Created(value.clone());
            Ok(value)
        }))
    }
}

/// One instance per [`ContainerScope`](crate::scope::ContainerScope).
pub struct ScopedTarget {
    inner: Target,
    slot: u64,
}

impl ScopedTarget {
    pub fn new(inner: Target) -> Self {
        static NEXT_SLOT: AtomicU64 = AtomicU64::new(0);
        Self {
            inner,
            slot: NEXT_SLOT.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl TargetBehavior for ScopedTarget {
    fn declared_type(&self) -> ConcreteType {
        self.inner.declared_type()
    }

    fn supports_type(&self, ty: &ConcreteType) -> bool {
        self.inner.supports_type(ty)
    }

    fn compile(&self, context: &CompileContext) -> Result<Factory, CompileError> {
        let requested = context.requested_type().clone();
        let inner = context.compile_untracked(&self.inner, &requested)?;
        let slot = self.slot;
        let track = !context.suppress_scope_tracking();
        Ok(factory(move |rc| {
            let scope = rc
                .scope()
                .ok_or_else(|| ResolveError::ScopeRequired(requested.clone()))?;
            scope.get_or_create(slot, &requested, || inner(rc), track)
        }))
    }
}
