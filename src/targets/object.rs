use super::TargetBehavior;
use crate::{
    compiler::CompileContext,
    error::CompileError,
    resolve::{factory, Factory},
    value::Value,
};
use rezolve_types::ConcreteType;

/// A constant value, returned as is on every resolution.
pub struct ObjectTarget {
    value: Value,
    declared: ConcreteType,
}

impl ObjectTarget {
    pub fn new(value: Value, declared: ConcreteType) -> Self {
        Self { value, declared }
    }
}

impl TargetBehavior for ObjectTarget {
    fn declared_type(&self) -> ConcreteType {
        self.declared.clone()
    }

    fn supports_type(&self, ty: &ConcreteType) -> bool {
        self.declared.is_assignable_to(ty)
    }

    fn compile(&self, _context: &CompileContext) -> Result<Factory, CompileError> {
        let value = self.value.clone();
        Ok(factory(move |_| Ok(value.clone())))
    }
}
