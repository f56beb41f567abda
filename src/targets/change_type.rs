use super::{Target, TargetBehavior};
use crate::{compiler::CompileContext, error::CompileError, resolve::Factory};
use rezolve_types::ConcreteType;

/// A target found through a variant candidate. The inner target is compiled
/// for the candidate it was registered under; its instances are returned for
/// the requested type.
pub struct ChangeTypeTarget {
    inner: Target,
    matched: ConcreteType,
    requested: ConcreteType,
}

impl ChangeTypeTarget {
    pub fn new(inner: Target, matched: ConcreteType, requested: ConcreteType) -> Self {
        Self {
            inner,
            matched,
            requested,
        }
    }

    pub fn inner(&self) -> &Target {
        &self.inner
    }

    pub fn matched(&self) -> &ConcreteType {
        &self.matched
    }
}

impl TargetBehavior for ChangeTypeTarget {
    fn declared_type(&self) -> ConcreteType {
        self.requested.clone()
    }

    fn supports_type(&self, ty: &ConcreteType) -> bool {
        self.matched.is_assignable_to(ty)
    }

    fn use_fallback(&self) -> bool {
        self.inner.use_fallback()
    }

    fn compile(&self, context: &CompileContext) -> Result<Factory, CompileError> {
        context.compile(&self.inner, &self.matched)
    }
}
