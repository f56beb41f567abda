use crate::{
    compiler::{CompileContext, Compiler, TargetSource},
    error::{CompileError, ResolveError},
    metrics::{CacheStats, ResolutionMetrics},
    options::ContainerOptions,
    registry::TargetRegistry,
    resolve::{ActiveContainer, ResolveContext, ResolvedFactory},
    scope::ContainerScope,
    targets::Target,
    value::Value,
};
use dashmap::DashMap;
use rezolve_types::ConcreteType;
use std::{
    fmt::{Display, Formatter},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContainerId(u64);

impl ContainerId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for ContainerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

/// Resolves instances from a frozen registry, caching one compiled factory
/// per requested type.
///
/// An overriding container looks up its own registry first and falls back to
/// its parent. Targets taken from the parent are compiled here, so their
/// dependencies are looked up through this container.
pub struct Container {
    id: ContainerId,
    registry: Arc<TargetRegistry>,
    parent: Option<Arc<Container>>,
    cache: DashMap<ConcreteType, Arc<ResolvedFactory>>,
    compiler: Compiler,
    metrics: ResolutionMetrics,
}

impl Container {
    pub fn new(registry: impl Into<Arc<TargetRegistry>>) -> Self {
        Self::with_options(registry, ContainerOptions::default())
    }

    pub fn with_options(registry: impl Into<Arc<TargetRegistry>>, options: ContainerOptions) -> Self {
        Self {
            id: ContainerId::next(),
            registry: registry.into(),
            parent: None,
            cache: DashMap::new(),
            compiler: Compiler::new(options.max_compile_depth),
            metrics: ResolutionMetrics::new(),
        }
    }

    pub fn overriding(parent: Arc<Container>, registry: impl Into<Arc<TargetRegistry>>) -> Self {
        let max_depth = parent.compiler.max_depth();
        Self {
            parent: Some(parent),
            ..Self::with_options(
                registry,
                ContainerOptions {
                    max_compile_depth: max_depth,
                },
            )
        }
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    pub fn parent(&self) -> Option<&Arc<Container>> {
        self.parent.as_ref()
    }

    /// The target this container would compile for `ty`.
    pub fn fetch(&self, ty: &ConcreteType) -> Option<Target> {
        let parent = || self.parent.as_ref().and_then(|p| p.fetch(ty));
        match self.registry.fetch(ty) {
            Some(own) if own.use_fallback() => {
                Some(parent().filter(|t| !t.is_unresolved()).unwrap_or(own))
            }
            Some(own) => Some(own),
            None => parent(),
        }
    }

    /// Like [`fetch`](Self::fetch), with the unresolved marker in place of `None`.
    pub fn fetch_target(&self, ty: &ConcreteType) -> Target {
        self.fetch(ty)
            .unwrap_or_else(|| Target::unresolved(ty.clone()))
    }

    /// The cached factory for `ty`, compiling it on first request.
    pub fn factory(&self, ty: &ConcreteType) -> Result<Arc<ResolvedFactory>, CompileError> {
        if let Some(cached) = self.cache.get(ty) {
            self.metrics.record_factory_cache_hit();
            return Ok(cached.value().clone());
        }
        self.metrics.record_factory_cache_miss();
        debug!(container = %self.id, requested = %ty, "Factory cache miss");

        let target = self.fetch_target(ty);
        let resolved = if target.is_unresolved() {
            ResolvedFactory::unresolved(ty.clone())
        } else {
            let context = CompileContext::new(&self.compiler, self, self.id, ty.clone());
            let factory = self.compiler.compile(&target, &context)?;
            ResolvedFactory::new(ty.clone(), factory)
        };

        // concurrent first requests may both compile; the first insert wins
        Ok(self
            .cache
            .entry(ty.clone())
            .or_insert_with(|| Arc::new(resolved))
            .value()
            .clone())
    }

    pub fn resolve(&self, ty: &ConcreteType) -> Result<Value, ResolveError> {
        self.factory(ty)?
            .invoke(&ResolveContext::new(self, None, ty.clone()))
    }

    pub fn resolve_in(&self, ty: &ConcreteType, scope: &ContainerScope) -> Result<Value, ResolveError> {
        if scope.is_disposed() {
            return Err(ResolveError::ScopeDisposed);
        }
        self.factory(ty)?
            .invoke(&ResolveContext::new(self, Some(scope), ty.clone()))
    }

    /// `Ok(None)` when nothing is registered for `ty`.
    pub fn try_resolve(&self, ty: &ConcreteType) -> Result<Option<Value>, ResolveError> {
        let factory = self.factory(ty)?;
        if factory.is_unresolved() {
            return Ok(None);
        }
        factory
            .invoke(&ResolveContext::new(self, None, ty.clone()))
            .map(Some)
    }

    pub fn can_resolve(&self, ty: &ConcreteType) -> bool {
        if let Some(cached) = self.cache.get(ty) {
            return !cached.is_unresolved();
        }
        self.fetch(ty).is_some_and(|t| !t.is_unresolved())
    }

    pub fn create_scope(&self) -> Arc<ContainerScope> {
        Arc::new(ContainerScope::new())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.metrics.cache_statistics(
            self.cache.len(),
            self.registry.fetch_stat(),
            self.compiler.compilations(),
        )
    }
}

impl TargetSource for Container {
    fn fetch(&self, ty: &ConcreteType) -> Option<Target> {
        Container::fetch(self, ty)
    }
}

impl ActiveContainer for Container {
    fn container_id(&self) -> ContainerId {
        self.id
    }

    fn can_resolve(&self, ty: &ConcreteType) -> bool {
        Container::can_resolve(self, ty)
    }

    fn resolve_with(
        &self,
        ty: &ConcreteType,
        context: &ResolveContext<'_>,
    ) -> Result<Value, ResolveError> {
        self.factory(ty)?
            .invoke(&ResolveContext::new(self, context.scope(), ty.clone()))
    }
}
