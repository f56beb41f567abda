use crate::targets::Target;

/// Targets registered for one exact type, in registration order.
#[derive(Default)]
pub struct TargetList {
    targets: Vec<Target>,
}

impl TargetList {
    pub fn register(&mut self, target: Target, allow_multiple: bool) {
        if !allow_multiple {
            self.targets.clear();
        }
        self.targets.push(target);
    }

    /// The most recently registered target.
    pub fn fetch(&self) -> Option<Target> {
        self.targets.last().cloned()
    }

    pub fn fetch_all(&self) -> Vec<Target> {
        self.targets.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use rezolve_types::ConcreteType;

    fn target(i: i64) -> Target {
        Target::object(Value::Int(i), ConcreteType::object())
    }

    #[test]
    fn test_latest_wins() {
        let mut list = TargetList::default();
        let (a, b) = (target(1), target(2));
        list.register(a.clone(), true);
        list.register(b.clone(), true);
        assert_eq!(list.fetch(), Some(b.clone()));
        assert_eq!(list.fetch_all(), vec![a, b]);
    }

    #[test]
    fn test_single_registration_replaces() {
        let mut list = TargetList::default();
        list.register(target(1), false);
        let b = target(2);
        list.register(b.clone(), false);
        assert_eq!(list.fetch_all(), vec![b.clone()]);
        assert_eq!(list.fetch(), Some(b));
    }
}
