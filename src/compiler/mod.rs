//! Lowering of targets into factories.
//!
//! A compilation starts from one requested type and walks the target graph
//! through [`CompileContext`]. Each target is compiled at most once per
//! requested type, and re-entering a target that is still being compiled for
//! the same type is reported as a cyclic dependency.
use crate::{error::CompileError, resolve::Factory, targets::Target};
use rezolve_types::ConcreteType;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{trace, warn};

mod context;

pub use context::{CompileContext, ContainerCheck, SharedKey};

/// Where a compilation looks up the targets of the types it depends on.
pub trait TargetSource {
    fn fetch(&self, ty: &ConcreteType) -> Option<Target>;
}

#[derive(Debug)]
pub struct Compiler {
    max_depth: usize,
    compilations: AtomicU64,
}

impl Compiler {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            compilations: AtomicU64::new(0),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of targets compiled so far, memo hits excluded.
    pub fn compilations(&self) -> u64 {
        self.compilations.load(Ordering::Relaxed)
    }

    pub fn compile(&self, target: &Target, context: &CompileContext<'_>) -> Result<Factory, CompileError> {
        if let Some(factory) = context.compiled(target.id()) {
            return Ok(factory);
        }

        let requested = context.requested_type();
        if context.is_compiling(target.id(), requested) {
            let mut path = context.compiling_path();
            if path.last() != Some(requested) || path.len() == 1 {
                path.push(requested.clone());
            }
            warn!(
                node = ?target,
                requested = %requested,
                "Cyclic dependency detected"
            );
            return Err(CompileError::CyclicDependency {
                path,
                requested: requested.clone(),
            });
        }

        let depth = context.depth();
        if depth >= self.max_depth {
            return Err(CompileError::MaxDepthExceeded {
                depth,
                requested: requested.clone(),
            });
        }

        trace!(node = ?target, requested = %requested, depth, "Compiling target");
        context.push(target.id());
        let result = target.compile(context);
        context.pop();

        let factory = result?;
        self.compilations.fetch_add(1, Ordering::Relaxed);
        context.memoize(target.id(), factory.clone());
        Ok(factory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        container::ContainerId,
        registry::TargetRegistry,
        resolve::ResolveContext,
        value::Value,
        Container,
    };
    use std::sync::Arc;

    #[test]
    fn test_memoized_per_requested_type() {
        let compiler = Compiler::new(8);
        let registry = TargetRegistry::default();
        let ctx = CompileContext::new(&compiler, &registry, ContainerId::next(), ConcreteType::object());
        let target = Target::object(Value::Int(7), ConcreteType::object());

        let first = compiler.compile(&target, &ctx).unwrap();
        let second = compiler.compile(&target, &ctx).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(compiler.compilations(), 1);

        let container = Container::new(TargetRegistry::default());
        let rc = ResolveContext::new(&container, None, ConcreteType::object());
        assert_eq!(first(&rc).unwrap().as_int(), Some(7));
    }

    #[test]
    fn test_depth_limit() {
        let compiler = Compiler::new(0);
        let registry = TargetRegistry::default();
        let ctx = CompileContext::new(&compiler, &registry, ContainerId::next(), ConcreteType::object());
        let target = Target::object(Value::Null, ConcreteType::object());
        assert!(matches!(
            compiler.compile(&target, &ctx),
            Err(CompileError::MaxDepthExceeded { depth: 0, .. })
        ));
    }
}
