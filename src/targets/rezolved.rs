use super::{Target, TargetBehavior};
use crate::{
    compiler::CompileContext,
    error::CompileError,
    resolve::{factory, unresolved_factory, Factory},
};
use rezolve_types::ConcreteType;
use tracing::trace;

/// Deferred lookup of a type.
///
/// At compile time the type is looked up through the compiling container. A
/// real match is compiled inline. Otherwise the emitted factory asks the
/// container it is invoked in, when that is a different container able to
/// resolve the type, and falls back to the explicit fallback, the
/// placeholder that was found, or failure.
pub struct RezolvedTarget {
    ty: ConcreteType,
    fallback: Option<Target>,
}

impl RezolvedTarget {
    pub fn new(ty: ConcreteType, fallback: Option<Target>) -> Self {
        Self { ty, fallback }
    }
}

impl TargetBehavior for RezolvedTarget {
    fn declared_type(&self) -> ConcreteType {
        self.ty.clone()
    }

    fn supports_type(&self, ty: &ConcreteType) -> bool {
        self.ty.is_assignable_to(ty)
    }

    fn compile(&self, context: &CompileContext) -> Result<Factory, CompileError> {
        let found = context.fetch(&self.ty);
        if let Some(target) = &found {
            if !target.use_fallback() {
                return context.compile(target, &self.ty);
            }
        }

        trace!(requested = %self.ty, found = ?found, "Deferring lookup to call time");
        let fallback = match (&self.fallback, &found) {
            (Some(fallback), _) => context.compile(fallback, &self.ty)?,
            (None, Some(placeholder)) => context.compile(placeholder, &self.ty)?,
            (None, None) => unresolved_factory(self.ty.clone()),
        };

        let is_same_container = context.same_container_check();
        let ty = self.ty.clone();
        Ok(factory(move |rc| {
            let active = rc.container();
            if !is_same_container(active) && active.can_resolve(&ty) {
                return active.resolve_with(&ty, rc);
            }
            fallback(&rc.for_type(ty.clone()))
        }))
    }
}
