use crate::{error::TypeResolutionError, ConcreteType, TypeBuilder, TypeDescription};
use dashmap::DashMap;
use tracing::debug;

/// Named table of type definitions with the builtins preloaded.
pub struct TypeLoader {
    types: DashMap<String, TypeDescription>,
}

impl Default for TypeLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeLoader {
    pub fn new() -> Self {
        let types = DashMap::new();
        for builtin in [TypeDescription::object(), TypeDescription::enumerable()] {
            types.insert(builtin.name().to_string(), builtin);
        }
        let loader = Self { types };
        for primitive in ["int", "string", "bool"] {
            // names are distinct, so registration cannot fail
            if let Ok(td) = TypeBuilder::class(primitive).build() {
                loader.types.insert(primitive.to_string(), td);
            }
        }
        loader
    }

    pub fn define(&self, builder: TypeBuilder) -> Result<TypeDescription, TypeResolutionError> {
        let td = builder.build()?;
        self.register(td.clone())?;
        Ok(td)
    }

    pub fn register(&self, td: TypeDescription) -> Result<(), TypeResolutionError> {
        use dashmap::mapref::entry::Entry;
        match self.types.entry(td.name().to_string()) {
            Entry::Occupied(_) => Err(TypeResolutionError::DuplicateType(td.name().to_string())),
            Entry::Vacant(v) => {
                debug!(type_name = td.name(), "Registered type definition");
                v.insert(td);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Result<TypeDescription, TypeResolutionError> {
        self.types
            .get(name)
            .map(|t| t.value().clone())
            .ok_or_else(|| TypeResolutionError::TypeNotFound(name.to_string()))
    }

    /// Every loaded definition, sorted by name.
    pub fn definitions(&self) -> Vec<TypeDescription> {
        let mut all: Vec<_> = self.types.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    /// Parses names like `IHandler<Dog>`, `IMap<string, List<int>>`, or the
    /// open definitions `IRepository<>` and `IMap<,>`.
    pub fn parse(&self, input: &str) -> Result<ConcreteType, TypeResolutionError> {
        let mut parser = Parser {
            loader: self,
            input,
            position: 0,
        };
        let ty = parser.parse_type()?;
        parser.skip_whitespace();
        if parser.position != input.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(ty)
    }
}

struct Parser<'a> {
    loader: &'a TypeLoader,
    input: &'a str,
    position: usize,
}

impl Parser<'_> {
    fn error(&self, message: &str) -> TypeResolutionError {
        TypeResolutionError::Parse {
            input: self.input.to_string(),
            message: format!("{} at offset {}", message, self.position),
        }
    }

    fn rest(&self) -> &str {
        &self.input[self.position..]
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.position = self.input.len() - trimmed.len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_whitespace();
        if self.rest().starts_with(c) {
            self.position += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn identifier(&mut self) -> Result<&str, TypeResolutionError> {
        self.skip_whitespace();
        let start = self.position;
        let len = self
            .rest()
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(self.rest().len());
        if len == 0 {
            return Err(self.error("expected a type name"));
        }
        self.position += len;
        Ok(&self.input[start..start + len])
    }

    fn parse_type(&mut self) -> Result<ConcreteType, TypeResolutionError> {
        let name = self.identifier()?.to_string();
        let definition = self.loader.get(&name)?;
        if !self.eat('<') {
            if definition.arity() > 0 {
                return Err(TypeResolutionError::ArityMismatch {
                    definition: name,
                    expected: definition.arity(),
                    actual: 0,
                });
            }
            return ConcreteType::new(definition, vec![]);
        }

        // `G<>` and `G<,>` name the open definition
        let mut commas = 0;
        loop {
            if self.eat('>') {
                if commas + 1 != definition.arity() {
                    return Err(TypeResolutionError::ArityMismatch {
                        definition: name,
                        expected: definition.arity(),
                        actual: commas + 1,
                    });
                }
                return ConcreteType::new(definition, vec![]);
            }
            if self.eat(',') {
                commas += 1;
                continue;
            }
            if commas > 0 {
                return Err(self.error("expected ',' or '>'"));
            }
            break;
        }

        let mut arguments = vec![self.parse_type()?];
        while self.eat(',') {
            arguments.push(self.parse_type()?);
        }
        if !self.eat('>') {
            return Err(self.error("expected '>'"));
        }
        ConcreteType::new(definition, arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> TypeLoader {
        let loader = TypeLoader::new();
        loader
            .define(TypeBuilder::interface("IMap").param("K").param("V"))
            .unwrap();
        loader
            .define(TypeBuilder::class("List").param("T"))
            .unwrap();
        loader
    }

    #[test]
    fn test_parse_closed_and_open() {
        let loader = loader();
        assert_eq!(loader.parse("int").unwrap().to_string(), "int");
        assert_eq!(
            loader.parse("IMap< string , List<int> >").unwrap().to_string(),
            "IMap<string, List<int>>"
        );
        assert!(loader.parse("IMap<,>").unwrap().is_generic_definition());
        assert!(loader.parse("List<>").unwrap().is_generic_definition());
        assert_eq!(
            loader.parse("IEnumerable<List<>>").unwrap().to_string(),
            "IEnumerable<List<>>"
        );
    }

    #[test]
    fn test_parse_errors() {
        let loader = loader();
        assert_eq!(
            loader.parse("Missing").unwrap_err(),
            TypeResolutionError::TypeNotFound("Missing".to_string())
        );
        assert!(matches!(
            loader.parse("IMap<>"),
            Err(TypeResolutionError::ArityMismatch { expected: 2, actual: 1, .. })
        ));
        assert_eq!(
            loader.parse("List").unwrap_err(),
            TypeResolutionError::ArityMismatch {
                definition: "List".to_string(),
                expected: 1,
                actual: 0,
            }
        );
        assert!(matches!(
            loader.parse("IMap<string, List>"),
            Err(TypeResolutionError::ArityMismatch { expected: 1, actual: 0, .. })
        ));
        assert!(matches!(
            loader.parse("List<int, int>"),
            Err(TypeResolutionError::ArityMismatch { .. })
        ));
        assert!(matches!(
            loader.parse("List<int"),
            Err(TypeResolutionError::Parse { .. })
        ));
        assert!(matches!(
            loader.parse("int int"),
            Err(TypeResolutionError::Parse { .. })
        ));
    }

    #[test]
    fn test_duplicate_definitions_rejected() {
        let loader = loader();
        assert_eq!(
            loader.define(TypeBuilder::class("List")).unwrap_err(),
            TypeResolutionError::DuplicateType("List".to_string())
        );
        assert!(loader.get("object").unwrap().is_object());
    }
}
