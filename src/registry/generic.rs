use super::list::TargetList;
use crate::targets::Target;
use rezolve_types::ConcreteType;
use std::collections::HashMap;

/// Targets of one generic type definition: those registered against the
/// open definition, and those registered against each closed or partially
/// open instantiation.
#[derive(Default)]
pub struct GenericTargetContainer {
    open: TargetList,
    closed: HashMap<ConcreteType, TargetList>,
}

impl GenericTargetContainer {
    pub fn register(&mut self, target: Target, service: &ConcreteType, allow_multiple: bool) {
        if service.is_generic_definition() {
            self.open.register(target, allow_multiple);
        } else {
            self.closed
                .entry(service.clone())
                .or_default()
                .register(target, allow_multiple);
        }
    }

    fn list(&self, ty: &ConcreteType) -> Option<&TargetList> {
        if ty.is_generic_definition() {
            Some(&self.open)
        } else {
            self.closed.get(ty)
        }
    }

    pub fn fetch(&self, ty: &ConcreteType) -> Option<Target> {
        self.list(ty).and_then(TargetList::fetch)
    }

    pub fn fetch_all(&self, ty: &ConcreteType) -> Vec<Target> {
        self.list(ty).map(TargetList::fetch_all).unwrap_or_default()
    }
}
