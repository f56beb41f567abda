use super::{Target, TargetBehavior};
use crate::{
    compiler::CompileContext,
    error::CompileError,
    resolve::{factory, Factory},
    value::Value,
};
use rezolve_types::{error::TypeResolutionError, ConcreteType, GenericLookup, TypeDescription};
use std::sync::Arc;

/// Direct construction of a non-generic or closed generic class.
pub struct ConstructorTarget {
    ty: ConcreteType,
    constructor: Option<usize>,
}

impl ConstructorTarget {
    pub fn new(ty: ConcreteType, constructor: Option<usize>) -> Self {
        Self { ty, constructor }
    }
}

impl TargetBehavior for ConstructorTarget {
    fn declared_type(&self) -> ConcreteType {
        self.ty.clone()
    }

    fn supports_type(&self, ty: &ConcreteType) -> bool {
        self.ty.is_assignable_to(ty)
    }

    fn compile(&self, context: &CompileContext) -> Result<Factory, CompileError> {
        compile_construction(&self.ty, self.constructor, context, None)
    }
}

/// Construction of an open generic class, closed over the arguments the
/// requested type implies.
pub struct GenericConstructorTarget {
    definition: TypeDescription,
}

impl GenericConstructorTarget {
    pub fn new(definition: TypeDescription) -> Self {
        Self { definition }
    }
}

impl TargetBehavior for GenericConstructorTarget {
    fn declared_type(&self) -> ConcreteType {
        ConcreteType::from(&self.definition)
    }

    fn supports_type(&self, ty: &ConcreteType) -> bool {
        if ty.is_generic_definition() {
            self.declared_type().is_assignable_to(ty)
        } else {
            GenericLookup::infer(&self.definition, ty).is_ok()
        }
    }

    fn compile(&self, context: &CompileContext) -> Result<Factory, CompileError> {
        let lookup = GenericLookup::infer(&self.definition, context.requested_type())?;
        let ty = lookup.instantiate(&self.definition)?;
        compile_construction(&ty, None, context, None)
    }
}

struct Parameter {
    name: Arc<str>,
    ty: ConcreteType,
    optional: bool,
}

fn constructors_of(ty: &ConcreteType) -> Result<Vec<Vec<Parameter>>, TypeResolutionError> {
    let lookup = ty.lookup();
    ty.definition()
        .definition()
        .constructors
        .iter()
        .map(|c| {
            c.parameters
                .iter()
                .map(|p| -> Result<Parameter, TypeResolutionError> {
                    Ok(Parameter {
                        name: p.name.as_str().into(),
                        ty: lookup.make_concrete(&p.ty)?,
                        optional: p.optional,
                    })
                })
                .collect()
        })
        .collect()
}

fn select_constructor(
    ty: &ConcreteType,
    mut constructors: Vec<Vec<Parameter>>,
    explicit: Option<usize>,
    context: &CompileContext,
    bound: Option<&ConcreteType>,
) -> Result<Vec<Parameter>, CompileError> {
    if let Some(index) = explicit {
        if index >= constructors.len() {
            return Err(CompileError::NoSuchConstructor {
                ty: ty.clone(),
                index,
            });
        }
        return Ok(constructors.swap_remove(index));
    }
    match constructors.len() {
        0 => return Ok(vec![]),
        1 => return Ok(constructors.swap_remove(0)),
        _ => {}
    }

    let satisfiable = |params: &Vec<Parameter>| {
        params.iter().all(|p| {
            p.optional || Some(&p.ty) == bound || context.fetch(&p.ty).is_some()
        })
    };
    let best = constructors
        .iter()
        .enumerate()
        .filter(|(_, c)| satisfiable(*c))
        .map(|(i, c)| (i, c.len()))
        .collect::<Vec<_>>();

    let index = match best.iter().map(|(_, len)| *len).max() {
        Some(greediest) => {
            let mut matching = best.iter().filter(|(_, len)| *len == greediest);
            let first = matching.next().map(|(i, _)| *i);
            if matching.next().is_some() {
                return Err(CompileError::AmbiguousConstructor(ty.clone()));
            }
            first
        }
        // nothing can be satisfied, take the greediest and let its
        // parameters fail at call time
        None => constructors
            .iter()
            .enumerate()
            .max_by_key(|(i, c)| (c.len(), std::cmp::Reverse(*i)))
            .map(|(i, _)| i),
    };
    Ok(index.map(|i| constructors.swap_remove(i)).unwrap_or_default())
}

/// Compiles construction of `ty`. With `bound`, the first parameter of the
/// bound type receives the given factory instead of a lookup.
pub(crate) fn compile_construction(
    ty: &ConcreteType,
    explicit: Option<usize>,
    context: &CompileContext,
    bound: Option<(&ConcreteType, Factory)>,
) -> Result<Factory, CompileError> {
    if !ty.definition().is_constructible() || ty.contains_open() {
        return Err(CompileError::NotConstructible(ty.clone()));
    }

    let constructors = constructors_of(ty)?;
    let parameters = select_constructor(
        ty,
        constructors,
        explicit,
        context,
        bound.as_ref().map(|(t, _)| *t),
    )?;

    let mut bound = bound;
    let mut compiled: Vec<(Arc<str>, ConcreteType, Factory)> = Vec::with_capacity(parameters.len());
    for p in parameters {
        let f = match bound.take() {
            Some((service, inner)) if *service == p.ty => inner,
            other => {
                bound = other;
                let target = if p.optional {
                    Target::rezolved_with_fallback(
                        p.ty.clone(),
                        Target::object(Value::Null, p.ty.clone()),
                    )
                } else {
                    Target::rezolved(p.ty.clone())
                };
                context.compile(&target, &p.ty)?
            }
        };
        compiled.push((p.name, p.ty, f));
    }
    if let Some((service, _)) = bound {
        return Err(CompileError::DecoratorParameterMissing {
            decorator: ty.clone(),
            service: service.clone(),
        });
    }

    let track = !context.suppress_scope_tracking();
    let ty = ty.clone();
    Ok(factory(move |rc| {
        let mut fields = Vec::with_capacity(compiled.len());
        for (name, param_ty, f) in &compiled {
            fields.push((name.clone(), f(&rc.for_type(param_ty.clone()))?));
        }
        let value = Value::object(ty.clone(), fields);
        if track {
            if let Some(scope) = rc.scope() {
                scope.track(&value);
            }
        }
        Ok(value)
    }))
}
