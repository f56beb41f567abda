use super::RegistryNode;
use crate::targets::Target;
use rezolve_types::{ConcreteType, TypeDescription};

/// Wraps every target fetched from the inner node for the decorated service
/// in a decorator. Nesting these nodes applies decorators in registration
/// order, the last registered outermost.
pub struct DecoratingTargetContainer {
    decorator: TypeDescription,
    service: ConcreteType,
    inner: Box<RegistryNode>,
}

impl DecoratingTargetContainer {
    pub fn new(decorator: TypeDescription, service: ConcreteType, inner: RegistryNode) -> Self {
        Self {
            decorator,
            service,
            inner: Box::new(inner),
        }
    }

    pub fn inner_mut(&mut self) -> &mut RegistryNode {
        &mut self.inner
    }

    /// Whether this node, or one it wraps, applies `decorator` to `service`.
    pub fn decorates(&self, decorator: &TypeDescription, service: &ConcreteType) -> bool {
        (self.decorator == *decorator && self.service == *service)
            || matches!(&*self.inner, RegistryNode::Decorated(d) if d.decorates(decorator, service))
    }

    fn applies_to(&self, ty: &ConcreteType) -> bool {
        if self.service.is_generic_definition() {
            ty.definition() == self.service.definition()
        } else {
            *ty == self.service
        }
    }

    fn wrap(&self, target: Target, candidate: &ConcreteType, requested: &ConcreteType) -> Target {
        if self.applies_to(candidate) || self.applies_to(requested) {
            Target::decorator(self.decorator.clone(), target, candidate.clone())
        } else {
            target
        }
    }

    pub fn fetch(&self, candidate: &ConcreteType, requested: &ConcreteType) -> Option<Target> {
        self.inner
            .fetch(candidate, requested)
            .map(|t| self.wrap(t, candidate, requested))
    }

    pub fn fetch_all(&self, candidate: &ConcreteType, requested: &ConcreteType) -> Vec<Target> {
        self.inner
            .fetch_all(candidate, requested)
            .into_iter()
            .map(|t| self.wrap(t, candidate, requested))
            .collect()
    }
}
