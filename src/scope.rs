use crate::{error::ResolveError, value::Value};
use parking_lot::Mutex;
use rezolve_types::ConcreteType;
use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tracing::debug;

/// Lifetime boundary for resolved instances.
///
/// A scope tracks the disposable instances created inside it and owns one
/// instance per scoped registration. Child scopes keep their parent alive;
/// instances that must outlive any child (singletons) are tracked by the
/// outermost scope.
pub struct ContainerScope {
    parent: Option<Arc<ContainerScope>>,
    tracked: Mutex<Vec<Value>>,
    scoped: Mutex<HashMap<(u64, ConcreteType), Value>>,
    disposed: AtomicBool,
}

impl Default for ContainerScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerScope {
    pub fn new() -> Self {
        Self {
            parent: None,
            tracked: Mutex::new(vec![]),
            scoped: Mutex::new(HashMap::new()),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn child(self: &Arc<Self>) -> Arc<ContainerScope> {
        Arc::new(Self {
            parent: Some(self.clone()),
            tracked: Mutex::new(vec![]),
            scoped: Mutex::new(HashMap::new()),
            disposed: AtomicBool::new(false),
        })
    }

    pub fn parent(&self) -> Option<&ContainerScope> {
        self.parent.as_deref()
    }

    /// The outermost scope of this chain.
    pub fn root(&self) -> &ContainerScope {
        let mut current = self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Takes ownership of `value` if it needs disposing.
    pub fn track(&self, value: &Value) {
        if value.is_disposable() {
            self.tracked.lock().push(value.clone());
        }
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.lock().len()
    }

    /// The instance stored under `(slot, ty)`, creating it on first use.
    pub fn get_or_create(
        &self,
        slot: u64,
        ty: &ConcreteType,
        create: impl FnOnce() -> Result<Value, ResolveError>,
        track: bool,
    ) -> Result<Value, ResolveError> {
        if self.is_disposed() {
            return Err(ResolveError::ScopeDisposed);
        }
        let key = (slot, ty.clone());
        if let Some(existing) = self.scoped.lock().get(&key) {
            return Ok(existing.clone());
        }
        // created unlocked, the factory may need other instances of this scope
        let value = create()?;
        match self.scoped.lock().entry(key) {
            Entry::Occupied(e) => Ok(e.get().clone()),
            Entry::Vacant(e) => {
                if track {
                    self.track(&value);
                }
                Ok(e.insert(value).clone())
            }
        }
    }

    /// Disposes tracked instances, most recent first. Only the first call
    /// has any effect.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let tracked = std::mem::take(&mut *self.tracked.lock());
        debug!(count = tracked.len(), "Disposing scope");
        for value in tracked.iter().rev() {
            if let Some(o) = value.as_object() {
                o.dispose();
            }
        }
        self.scoped.lock().clear();
    }
}

impl Drop for ContainerScope {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rezolve_types::TypeBuilder;

    fn disposable() -> ConcreteType {
        TypeBuilder::class("Handle").disposable().build().unwrap().into()
    }

    #[test]
    fn test_dispose_in_reverse_order_once() {
        let ty = disposable();
        let scope = ContainerScope::new();
        let first = Value::object(ty.clone(), vec![]);
        let second = Value::object(ty, vec![]);
        scope.track(&first);
        scope.track(&second);
        scope.track(&Value::Int(3));
        assert_eq!(scope.tracked_count(), 2);

        scope.dispose();
        assert!(first.as_object().unwrap().is_disposed());
        assert!(second.as_object().unwrap().is_disposed());
        assert!(scope.is_disposed());
        scope.dispose();
        assert_eq!(scope.tracked_count(), 0);
    }

    #[test]
    fn test_scoped_slot_created_once() {
        let ty = disposable();
        let scope = ContainerScope::new();
        let a = scope
            .get_or_create(1, &ty, || Ok(Value::object(ty.clone(), vec![])), true)
            .unwrap();
        let b = scope
            .get_or_create(1, &ty, || Ok(Value::Null), true)
            .unwrap();
        assert!(a.same_instance(&b));
        assert_eq!(scope.tracked_count(), 1);
    }

    #[test]
    fn test_child_root() {
        let root = Arc::new(ContainerScope::new());
        let child = root.child();
        let grandchild = child.child();
        assert!(std::ptr::eq(grandchild.root(), &*root));
        assert!(std::ptr::eq(root.root(), &*root));

        root.dispose();
        assert_eq!(
            root.get_or_create(0, &disposable(), || Ok(Value::Null), false)
                .unwrap_err(),
            ResolveError::ScopeDisposed
        );
    }
}
