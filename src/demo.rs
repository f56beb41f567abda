//! A small registry of services used by the `rezolve` binary.
use crate::{
    error::{ResolveError, RezolveError},
    options::RegistryOptions,
    registry::TargetRegistry,
    targets::Target,
    value::Value,
};
use rezolve_types::{loader::TypeLoader, ConcreteType, ParameterDefinition, TypeBuilder, TypeSig};

pub struct Demo {
    pub loader: TypeLoader,
    pub registry: TargetRegistry,
}

pub fn demo(options: RegistryOptions) -> Result<Demo, RezolveError> {
    let loader = TypeLoader::new();
    let string = loader.get("string")?;

    let ibar = loader.define(TypeBuilder::interface("IBar"))?;
    let bar = loader.define(TypeBuilder::class("Bar").implements(TypeSig::of(&ibar)))?;
    let ifoo = loader.define(TypeBuilder::interface("IFoo"))?;
    let foo = loader.define(
        TypeBuilder::class("Foo")
            .implements(TypeSig::of(&ifoo))
            .constructor(vec![ParameterDefinition::new("bar", TypeSig::of(&ibar))]),
    )?;

    let animal = loader.define(TypeBuilder::class("Animal"))?;
    let dog = loader.define(TypeBuilder::class("Dog").extends(TypeSig::of(&animal)))?;
    let handler = loader.define(TypeBuilder::interface("IHandler").contravariant("T"))?;
    let animal_handler = loader.define(
        TypeBuilder::class("AnimalHandler")
            .implements(TypeSig::generic(handler.clone(), vec![TypeSig::of(&animal)])),
    )?;

    let repo = loader.define(TypeBuilder::interface("IRepository").param("T"))?;
    let repo_of_t = TypeSig::generic(repo.clone(), vec![TypeSig::Generic(0)]);
    let repository = loader.define(
        TypeBuilder::class("Repository")
            .param("T")
            .implements(repo_of_t.clone()),
    )?;
    let caching = loader.define(
        TypeBuilder::class("CachingRepository")
            .param("T")
            .implements(repo_of_t.clone())
            .constructor(vec![ParameterDefinition::new("inner", repo_of_t)]),
    )?;

    let iclock = loader.define(TypeBuilder::interface("IClock"))?;
    let clock = loader.define(
        TypeBuilder::class("SystemClock")
            .implements(TypeSig::of(&iclock))
            .disposable(),
    )?;
    let request_log = loader.define(TypeBuilder::class("RequestLog").disposable())?;

    let plugin = loader.define(TypeBuilder::interface("IPlugin"))?;
    let plugins = ["AuditPlugin", "MetricsPlugin"]
        .into_iter()
        .map(|name| loader.define(TypeBuilder::class(name).implements(TypeSig::of(&plugin))))
        .collect::<Result<Vec<_>, _>>()?;

    let mut registry = TargetRegistry::new(options);
    registry.register(Target::for_type(&bar), Some(ibar.into()))?;
    registry.register(Target::for_type(&foo), Some(ifoo.into()))?;
    registry.register(Target::for_type(&dog), None)?;
    registry.register(
        Target::for_type(&animal_handler),
        Some(handler.instantiate([animal.into()])?),
    )?;
    registry.register(Target::for_type(&repository), Some(repo.clone().into()))?;
    registry.register_decorator(caching, repo.into())?;
    registry.register(Target::singleton(Target::for_type(&clock)), Some(iclock.clone().into()))?;
    registry.register(Target::scoped(Target::for_type(&request_log)), None)?;
    for p in &plugins {
        registry.register(Target::for_type(p), Some(plugin.clone().into()))?;
    }
    registry.register(
        Target::delegate(
            ConcreteType::from(&string),
            vec![ConcreteType::from(&iclock)],
            |args: &[Value]| match args.first().and_then(Value::as_object) {
                Some(clock) => Ok(Value::String(
                    format!("hello from {}", clock.ty()).into(),
                )),
                None => Err(ResolveError::Delegate("clock unavailable".to_string())),
            },
        ),
        None,
    )?;

    Ok(Demo { loader, registry })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Container;

    #[test]
    fn test_demo_resolves() {
        let Demo { loader, registry } = demo(RegistryOptions::default()).unwrap();
        let container = Container::new(registry);

        let foo = container.resolve(&loader.parse("IFoo").unwrap()).unwrap();
        let foo = foo.as_object().unwrap();
        assert_eq!(foo.ty().to_string(), "Foo");
        assert_eq!(
            foo.field("bar").unwrap().as_object().unwrap().ty().to_string(),
            "Bar"
        );

        let repo = container
            .resolve(&loader.parse("IRepository<int>").unwrap())
            .unwrap();
        assert_eq!(repo.as_object().unwrap().ty().to_string(), "CachingRepository<int>");

        let greeting = container.resolve(&loader.parse("string").unwrap()).unwrap();
        assert_eq!(greeting.as_str(), Some("hello from SystemClock"));

        let plugins = container
            .resolve(&loader.parse("IEnumerable<IPlugin>").unwrap())
            .unwrap();
        assert_eq!(plugins.as_sequence().unwrap().len(), 2);
    }
}
