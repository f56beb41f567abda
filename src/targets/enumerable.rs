use super::{Target, TargetBehavior};
use crate::{
    compiler::CompileContext,
    error::CompileError,
    resolve::{factory, Factory},
    value::Value,
};
use rezolve_types::ConcreteType;
use std::sync::Arc;

/// `IEnumerable<T>` over every target registered for `T`, in registration
/// order. An empty enumerable is only a placeholder.
pub struct EnumerableTarget {
    element_type: ConcreteType,
    targets: Vec<Target>,
}

impl EnumerableTarget {
    pub fn new(element_type: ConcreteType, targets: Vec<Target>) -> Self {
        Self {
            element_type,
            targets,
        }
    }
}

impl TargetBehavior for EnumerableTarget {
    fn declared_type(&self) -> ConcreteType {
        ConcreteType::enumerable_of(self.element_type.clone())
    }

    fn supports_type(&self, ty: &ConcreteType) -> bool {
        self.declared_type().is_assignable_to(ty)
    }

    fn use_fallback(&self) -> bool {
        self.targets.is_empty()
    }

    fn compile(&self, context: &CompileContext) -> Result<Factory, CompileError> {
        let elements = self
            .targets
            .iter()
            .map(|t| context.compile(t, &self.element_type))
            .collect::<Result<Vec<_>, _>>()?;
        let element_type = self.element_type.clone();
        Ok(factory(move |rc| {
            let element_context = rc.for_type(element_type.clone());
            let values = elements
                .iter()
                .map(|f| f(&element_context))
                .collect::<Result<Vec<Value>, _>>()?;
            Ok(Value::Sequence(Arc::from(values)))
        }))
    }
}
