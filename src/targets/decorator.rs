use super::{compile_construction, Target, TargetBehavior};
use crate::{compiler::CompileContext, error::CompileError, resolve::Factory};
use rezolve_types::{ConcreteType, GenericLookup, TypeDescription};

/// Constructs `decorator`, handing the instance of the decorated target to
/// its constructor parameter of the service type.
pub struct DecoratorTarget {
    decorator: TypeDescription,
    inner: Target,
    service: ConcreteType,
}

impl DecoratorTarget {
    pub fn new(decorator: TypeDescription, inner: Target, service: ConcreteType) -> Self {
        Self {
            decorator,
            inner,
            service,
        }
    }
}

impl TargetBehavior for DecoratorTarget {
    fn declared_type(&self) -> ConcreteType {
        self.service.clone()
    }

    fn supports_type(&self, ty: &ConcreteType) -> bool {
        self.inner.supports_type(ty)
    }

    fn use_fallback(&self) -> bool {
        self.inner.use_fallback()
    }

    fn compile(&self, context: &CompileContext) -> Result<Factory, CompileError> {
        let requested = context.requested_type().clone();
        let decorator = if self.decorator.is_generic_definition() {
            GenericLookup::infer(&self.decorator, &requested)?.instantiate(&self.decorator)?
        } else {
            ConcreteType::from(&self.decorator)
        };
        let inner = context.compile_untracked(&self.inner, &requested)?;
        compile_construction(&decorator, None, context, Some((&requested, inner)))
    }
}
