//! Expansion of a requested type into the ordered list of types a registry
//! looks up for it.
//!
//! The first candidate is always the requested type. For a closed generic the
//! remaining candidates are every combination of per-argument alternatives,
//! followed by the open generic definition. Arguments in variant positions
//! contribute their bases and interfaces (or known derived types, depending
//! on how many contravariant positions enclose them), with `object` last.
use crate::{ConcreteType, TypeDescription, Variance};
use std::collections::HashSet;

/// Source of the types that can stand in for a base type when a variance
/// search has to look downwards.
pub trait KnownTypes {
    /// Known types assignable to `ty`, excluding `ty` itself, most relevant first.
    fn derived_types(&self, ty: &ConcreteType) -> Vec<ConcreteType>;
}

impl KnownTypes for () {
    fn derived_types(&self, _ty: &ConcreteType) -> Vec<ConcreteType> {
        vec![]
    }
}

impl KnownTypes for Vec<ConcreteType> {
    fn derived_types(&self, ty: &ConcreteType) -> Vec<ConcreteType> {
        self.iter()
            .filter(|t| *t != ty && t.is_assignable_to(ty))
            .cloned()
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CandidateOptions {
    pub contravariance: bool,
    pub covariance: bool,
}

impl Default for CandidateOptions {
    fn default() -> Self {
        Self {
            contravariance: true,
            covariance: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeCandidate {
    pub ty: ConcreteType,
    /// Reached through a variance expansion rather than exact generic matching.
    pub variant: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchDirection {
    BasesAndInterfaces,
    DerivedOnly,
}

/// Direction of the search for an argument enclosed by `contravariant_count`
/// contravariant positions. Two contravariant positions cancel out.
pub fn search_direction(contravariant_count: usize) -> SearchDirection {
    if contravariant_count == 0 || contravariant_count % 2 == 1 {
        SearchDirection::BasesAndInterfaces
    } else {
        SearchDirection::DerivedOnly
    }
}

enum Stage {
    Exact,
    Expand,
    Permutations(Permutations),
    Open,
    Done,
}

pub struct TypeCandidates<'k> {
    requested: ConcreteType,
    generator: Generator<'k>,
    stage: Stage,
    seen: HashSet<ConcreteType>,
}

impl<'k> TypeCandidates<'k> {
    pub fn new(
        requested: ConcreteType,
        options: CandidateOptions,
        known: &'k dyn KnownTypes,
    ) -> Self {
        Self {
            requested,
            generator: Generator { options, known },
            stage: Stage::Exact,
            seen: HashSet::new(),
        }
    }
}

impl Iterator for TypeCandidates<'_> {
    type Item = TypeCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.stage {
                Stage::Exact => {
                    self.stage = Stage::Expand;
                    self.seen.insert(self.requested.clone());
                    return Some(TypeCandidate {
                        ty: self.requested.clone(),
                        variant: false,
                    });
                }
                Stage::Expand => {
                    self.stage = if self.requested.is_closed_generic() {
                        Stage::Permutations(self.generator.permutations(&self.requested, 0))
                    } else {
                        Stage::Done
                    };
                }
                Stage::Permutations(permutations) => match permutations.next() {
                    Some(candidate) => {
                        if self.seen.insert(candidate.ty.clone()) {
                            return Some(candidate);
                        }
                    }
                    None => self.stage = Stage::Open,
                },
                Stage::Open => {
                    self.stage = Stage::Done;
                    let open = self.requested.generic_definition();
                    if self.seen.insert(open.clone()) {
                        return Some(TypeCandidate {
                            ty: open,
                            variant: false,
                        });
                    }
                }
                Stage::Done => return None,
            }
        }
    }
}

/// Cartesian product of per-argument alternatives, produced one combination
/// at a time with the last argument varying fastest.
struct Permutations {
    ty: ConcreteType,
    per_argument: Vec<Vec<TypeCandidate>>,
    indices: Vec<usize>,
    exhausted: bool,
}

impl Permutations {
    fn new(ty: ConcreteType, per_argument: Vec<Vec<TypeCandidate>>) -> Self {
        let exhausted = per_argument.is_empty() || per_argument.iter().any(|list| list.is_empty());
        Self {
            ty,
            indices: vec![0; per_argument.len()],
            per_argument,
            exhausted,
        }
    }
}

impl Iterator for Permutations {
    type Item = TypeCandidate;

    fn next(&mut self) -> Option<TypeCandidate> {
        if self.exhausted {
            return None;
        }
        let chosen: Vec<&TypeCandidate> = self
            .indices
            .iter()
            .zip(&self.per_argument)
            .map(|(&i, list)| &list[i])
            .collect();
        let candidate = TypeCandidate {
            ty: self
                .ty
                .with_arguments(chosen.iter().map(|c| c.ty.clone()).collect()),
            variant: chosen.iter().any(|c| c.variant),
        };

        self.exhausted = true;
        for position in (0..self.indices.len()).rev() {
            self.indices[position] += 1;
            if self.indices[position] < self.per_argument[position].len() {
                self.exhausted = false;
                break;
            }
            self.indices[position] = 0;
        }
        Some(candidate)
    }
}

struct Generator<'k> {
    options: CandidateOptions,
    known: &'k dyn KnownTypes,
}

fn push_unique(list: &mut Vec<TypeCandidate>, seen: &mut HashSet<ConcreteType>, c: TypeCandidate) {
    if seen.insert(c.ty.clone()) {
        list.push(c);
    }
}

impl Generator<'_> {
    fn permutations(&self, ty: &ConcreteType, depth: usize) -> Permutations {
        let per_argument = ty
            .arguments()
            .iter()
            .enumerate()
            .map(|(i, arg)| self.argument_candidates(ty.definition(), i, arg, depth))
            .collect();
        Permutations::new(ty.clone(), per_argument)
    }

    /// `ty` first, then the generic permutations of `ty`, then its open definition.
    fn own_candidates(&self, ty: &ConcreteType, depth: usize) -> Vec<TypeCandidate> {
        let mut out = vec![TypeCandidate {
            ty: ty.clone(),
            variant: false,
        }];
        if !ty.is_closed_generic() {
            return out;
        }
        let mut seen = HashSet::from([ty.clone()]);
        for candidate in self.permutations(ty, depth) {
            push_unique(&mut out, &mut seen, candidate);
        }
        push_unique(
            &mut out,
            &mut seen,
            TypeCandidate {
                ty: ty.generic_definition(),
                variant: false,
            },
        );
        out
    }

    fn argument_candidates(
        &self,
        definition: &TypeDescription,
        index: usize,
        arg: &ConcreteType,
        depth: usize,
    ) -> Vec<TypeCandidate> {
        let variance = definition.variance_of(index);
        let nested = match variance {
            Variance::Contravariant => depth + 1,
            _ => depth,
        };

        // an invariant position only accepts the argument's exact and open forms
        let mut seen = HashSet::new();
        let mut out = vec![];
        for c in self.own_candidates(arg, nested) {
            if c.variant && variance == Variance::Invariant {
                continue;
            }
            push_unique(&mut out, &mut seen, c);
        }

        let searchable = definition.definition().variance_search && !arg.contains_open();
        let direction = match variance {
            Variance::Contravariant if searchable && self.options.contravariance => {
                Some(search_direction(nested))
            }
            Variance::Covariant if searchable && self.options.covariance => {
                Some(if depth % 2 == 0 {
                    SearchDirection::DerivedOnly
                } else {
                    SearchDirection::BasesAndInterfaces
                })
            }
            _ => None,
        };

        let variant = |c: TypeCandidate| TypeCandidate {
            ty: c.ty,
            variant: true,
        };
        match direction {
            Some(SearchDirection::BasesAndInterfaces) => {
                for base in arg.bases_and_interfaces() {
                    if base.is_object() {
                        continue;
                    }
                    for c in self.own_candidates(&base, nested) {
                        push_unique(&mut out, &mut seen, variant(c));
                    }
                }
                push_unique(
                    &mut out,
                    &mut seen,
                    TypeCandidate {
                        ty: ConcreteType::object(),
                        variant: true,
                    },
                );
            }
            Some(SearchDirection::DerivedOnly) => {
                for derived in self.known.derived_types(arg) {
                    for c in self.own_candidates(&derived, nested) {
                        push_unique(&mut out, &mut seen, variant(c));
                    }
                }
            }
            None => {}
        }
        out
    }
}
