use rezolve_types::ConcreteType;
use std::collections::HashSet;

/// Every concrete type the registry has seen, in first-seen order.
#[derive(Default)]
pub struct KnownTypeIndex {
    types: Vec<ConcreteType>,
    seen: HashSet<ConcreteType>,
}

impl KnownTypeIndex {
    /// Adds `ty` and, recursively, its generic arguments. Open types are
    /// skipped.
    pub fn add(&mut self, ty: &ConcreteType) {
        if ty.contains_open() || ty.is_object() {
            return;
        }
        for argument in ty.arguments() {
            self.add(argument);
        }
        if self.seen.insert(ty.clone()) {
            self.types.push(ty.clone());
        }
    }

    /// Known types assignable to `ty`, other than `ty`.
    pub fn derived_of(&self, ty: &ConcreteType) -> Vec<ConcreteType> {
        self.types
            .iter()
            .filter(|t| *t != ty && t.is_assignable_to(ty))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rezolve_types::{TypeBuilder, TypeSig};

    #[test]
    fn test_arguments_are_indexed() {
        let animal = TypeBuilder::class("Animal").build().unwrap();
        let dog = TypeBuilder::class("Dog")
            .extends(TypeSig::of(&animal))
            .build()
            .unwrap();
        let list = TypeBuilder::class("List").param("T").build().unwrap();

        let mut index = KnownTypeIndex::default();
        index.add(&list.instantiate([ConcreteType::from(&dog)]).unwrap());
        index.add(&ConcreteType::from(&list));
        index.add(&ConcreteType::from(&dog));
        assert_eq!(
            index.derived_of(&ConcreteType::object()),
            vec![
                ConcreteType::from(&dog),
                list.instantiate([ConcreteType::from(&dog)]).unwrap(),
            ]
        );

        let derived = index.derived_of(&ConcreteType::from(&animal));
        assert_eq!(derived, vec![ConcreteType::from(&dog)]);
    }
}
