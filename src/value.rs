use rezolve_types::ConcreteType;
use std::{
    any::Any,
    fmt::{Debug, Formatter},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

/// An instance produced by a factory.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    String(Arc<str>),
    Object(ObjectRef),
    Sequence(Arc<[Value]>),
    Native(Arc<dyn Any + Send + Sync>),
}

impl Value {
    pub fn object(ty: ConcreteType, fields: Vec<(Arc<str>, Value)>) -> Self {
        Value::Object(ObjectRef::new(ty, fields))
    }

    pub fn native<T: Any + Send + Sync>(value: T) -> Self {
        Value::Native(Arc::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn downcast_native<T: Any + Send + Sync>(&self) -> Option<&T> {
        match self {
            Value::Native(n) => n.downcast_ref(),
            _ => None,
        }
    }

    /// Reference identity for shared values, equality for scalars.
    pub fn same_instance(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::String(a), Value::String(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Sequence(a), Value::Sequence(b)) => Arc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn is_disposable(&self) -> bool {
        self.as_object()
            .is_some_and(|o| o.ty().definition().is_disposable())
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Object(o) => write!(f, "{o:?}"),
            Value::Sequence(s) => f.debug_list().entries(s.iter()).finish(),
            Value::Native(_) => write!(f, "<native>"),
        }
    }
}

struct Object {
    ty: ConcreteType,
    fields: Vec<(Arc<str>, Value)>,
    disposed: AtomicBool,
}

/// A shared constructed object: its type and the constructor arguments it
/// was created with, by parameter name.
#[derive(Clone)]
pub struct ObjectRef(Arc<Object>);

impl ObjectRef {
    pub fn new(ty: ConcreteType, fields: Vec<(Arc<str>, Value)>) -> Self {
        Self(Arc::new(Object {
            ty,
            fields,
            disposed: AtomicBool::new(false),
        }))
    }

    pub fn ty(&self) -> &ConcreteType {
        &self.0.ty
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0
            .fields
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| v)
    }

    pub fn fields(&self) -> &[(Arc<str>, Value)] {
        &self.0.fields
    }

    pub fn is_disposed(&self) -> bool {
        self.0.disposed.load(Ordering::Acquire)
    }

    /// Marks the object disposed. Returns false if it already was.
    pub fn dispose(&self) -> bool {
        !self.0.disposed.swap(true, Ordering::AcqRel)
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for ObjectRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct(self.ty().definition().name());
        for (name, value) in self.fields() {
            s.field(name, value);
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rezolve_types::TypeBuilder;

    #[test]
    fn test_object_identity_and_disposal() {
        let ty: ConcreteType = TypeBuilder::class("Conn").disposable().build().unwrap().into();
        let a = Value::object(ty.clone(), vec![("port".into(), Value::Int(80))]);
        let b = Value::object(ty, vec![]);

        assert!(a.same_instance(&a.clone()));
        assert!(!a.same_instance(&b));
        assert!(a.is_disposable());

        let o = a.as_object().unwrap();
        assert_eq!(o.field("port").and_then(Value::as_int), Some(80));
        assert!(o.dispose());
        assert!(!o.dispose());
        assert!(o.is_disposed());
    }

    #[test]
    fn test_native_downcast() {
        let v = Value::native(42u32);
        assert_eq!(v.downcast_native::<u32>(), Some(&42));
        assert_eq!(v.downcast_native::<i64>(), None);
    }
}
