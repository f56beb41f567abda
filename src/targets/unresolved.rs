use super::TargetBehavior;
use crate::{
    compiler::CompileContext,
    error::CompileError,
    resolve::{unresolved_factory, Factory},
};
use rezolve_types::ConcreteType;

/// Marks a type nothing is registered for. Its factory always fails.
pub struct UnresolvedTarget {
    ty: ConcreteType,
}

impl UnresolvedTarget {
    pub fn new(ty: ConcreteType) -> Self {
        Self { ty }
    }
}

impl TargetBehavior for UnresolvedTarget {
    fn declared_type(&self) -> ConcreteType {
        self.ty.clone()
    }

    fn supports_type(&self, ty: &ConcreteType) -> bool {
        *ty == self.ty
    }

    fn use_fallback(&self) -> bool {
        true
    }

    fn compile(&self, _context: &CompileContext) -> Result<Factory, CompileError> {
        Ok(unresolved_factory(self.ty.clone()))
    }
}
