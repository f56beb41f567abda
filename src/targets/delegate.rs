use super::{Target, TargetBehavior};
use crate::{
    compiler::CompileContext,
    error::{CompileError, ResolveError},
    resolve::{factory, Factory},
    value::Value,
};
use rezolve_types::ConcreteType;
use std::sync::Arc;

pub type DelegateFn = Arc<dyn Fn(&[Value]) -> Result<Value, ResolveError> + Send + Sync>;

/// Calls a user function with an instance of each parameter type.
pub struct DelegateTarget {
    declared: ConcreteType,
    parameters: Vec<ConcreteType>,
    func: DelegateFn,
}

impl DelegateTarget {
    pub fn new(declared: ConcreteType, parameters: Vec<ConcreteType>, func: DelegateFn) -> Self {
        Self {
            declared,
            parameters,
            func,
        }
    }
}

impl TargetBehavior for DelegateTarget {
    fn declared_type(&self) -> ConcreteType {
        self.declared.clone()
    }

    fn supports_type(&self, ty: &ConcreteType) -> bool {
        self.declared.is_assignable_to(ty)
    }

    fn compile(&self, context: &CompileContext) -> Result<Factory, CompileError> {
        let arguments = self
            .parameters
            .iter()
            .map(|p| -> Result<(ConcreteType, Factory), CompileError> {
                let f = context.compile(&Target::rezolved(p.clone()), p)?;
                Ok((p.clone(), f))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let func = self.func.clone();
        let track = !context.suppress_scope_tracking();
        Ok(factory(move |rc| {
            let values = arguments
                .iter()
                .map(|(ty, f)| f(&rc.for_type(ty.clone())))
                .collect::<Result<Vec<_>, _>>()?;
            let value = func(values.as_slice())?;
            if track {
                if let Some(scope) = rc.scope() {
                    scope.track(&value);
                }
            }
            Ok(value)
        }))
    }
}
