use crate::{container::ContainerId, error::ResolveError, scope::ContainerScope, value::Value};
use rezolve_types::ConcreteType;
use std::sync::Arc;

/// A compiled target: produces an instance for the context it is invoked in.
pub type Factory = Arc<dyn Fn(&ResolveContext<'_>) -> Result<Value, ResolveError> + Send + Sync>;

pub fn factory<F>(f: F) -> Factory
where
    F: Fn(&ResolveContext<'_>) -> Result<Value, ResolveError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The container a factory is currently running in, as seen by deferred
/// lookups.
pub trait ActiveContainer: Send + Sync {
    fn container_id(&self) -> ContainerId;
    fn can_resolve(&self, ty: &ConcreteType) -> bool;
    fn resolve_with(&self, ty: &ConcreteType, context: &ResolveContext<'_>)
        -> Result<Value, ResolveError>;
}

pub struct ResolveContext<'a> {
    container: &'a dyn ActiveContainer,
    scope: Option<&'a ContainerScope>,
    requested_type: ConcreteType,
}

impl<'a> ResolveContext<'a> {
    pub fn new(
        container: &'a dyn ActiveContainer,
        scope: Option<&'a ContainerScope>,
        requested_type: ConcreteType,
    ) -> Self {
        Self {
            container,
            scope,
            requested_type,
        }
    }

    pub fn container(&self) -> &'a dyn ActiveContainer {
        self.container
    }

    pub fn scope(&self) -> Option<&'a ContainerScope> {
        self.scope
    }

    pub fn requested_type(&self) -> &ConcreteType {
        &self.requested_type
    }

    /// The same container and scope, asking for another type.
    pub fn for_type(&self, requested_type: ConcreteType) -> Self {
        Self {
            container: self.container,
            scope: self.scope,
            requested_type,
        }
    }
}

/// A cached factory for one requested type.
pub struct ResolvedFactory {
    pub requested_type: ConcreteType,
    factory: Factory,
    unresolved: bool,
}

impl ResolvedFactory {
    pub fn new(requested_type: ConcreteType, factory: Factory) -> Self {
        Self {
            requested_type,
            factory,
            unresolved: false,
        }
    }

    pub fn unresolved(requested_type: ConcreteType) -> Self {
        Self {
            factory: unresolved_factory(requested_type.clone()),
            requested_type,
            unresolved: true,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        self.unresolved
    }

    pub fn invoke(&self, context: &ResolveContext<'_>) -> Result<Value, ResolveError> {
        (self.factory)(context)
    }
}

pub fn unresolved_factory(ty: ConcreteType) -> Factory {
    factory(move |_| Err(ResolveError::Unresolved(ty.clone())))
}
