use crate::{ConcreteType, Variance};

/// Whether a value of type `from` can be used where `to` is expected.
pub fn is_assignable(from: &ConcreteType, to: &ConcreteType) -> bool {
    if from == to || to.is_object() {
        return true;
    }

    if to.is_generic_definition() {
        return from.definition() == to.definition()
            || from
                .definition()
                .ancestor_signatures()
                .iter()
                .any(|sig| sig.definition() == Some(to.definition()));
    }

    std::iter::once(from.clone())
        .chain(from.ancestors())
        .chain(from.interfaces())
        .any(|candidate| candidate == *to || variance_compatible(&candidate, to))
}

fn variance_compatible(from: &ConcreteType, to: &ConcreteType) -> bool {
    if from.definition() != to.definition()
        || !from.is_closed_generic()
        || from.arguments().len() != to.arguments().len()
    {
        return false;
    }
    let definition = from.definition();
    from.arguments()
        .iter()
        .zip(to.arguments())
        .enumerate()
        .all(|(i, (f, t))| match definition.variance_of(i) {
            Variance::Invariant => f == t,
            Variance::Covariant => is_assignable(f, t),
            Variance::Contravariant => is_assignable(t, f),
        })
}
