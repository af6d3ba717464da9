use std::fmt;
use std::rc::Rc;

use crate::vm::native::Function;
use crate::vm::object::ObjectRef;

#[derive(Debug, Clone)]
pub enum Value {
    // absence of a value, also what a missing property reads as
    Undefined,
    // 'pointer' to nothing
    Null,
    // primitives
    Bool(bool),
    Number(f64),
    Str(String),
    // objects, including class objects and prototypes
    Ref(ObjectRef),
    // native callables (methods, getters, setters)
    Function(Function),
}

impl Value {
    /// Converts the result of a computed field name into the key it is stored under.
    pub fn to_property_key(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        if let Value::Ref(o) = self {
            Some(o)
        } else {
            None
        }
    }

    // panics if not correct type
    pub fn into_number(self) -> f64 {
        if let Value::Number(v) = self {
            v
        } else {
            panic!("{:?} is not a Number", self);
        }
    }

    pub fn into_str(self) -> String {
        if let Value::Str(v) = self {
            v
        } else {
            panic!("{:?} is not a String", self);
        }
    }

    pub fn into_object(self) -> ObjectRef {
        if let Value::Ref(v) = self {
            v
        } else {
            panic!("{:?} is not an object", self);
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) if n.is_nan() => write!(f, "NaN"),
            Value::Number(n) if n.is_infinite() => {
                write!(f, "{}Infinity", if *n < 0.0 { "-" } else { "" })
            }
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
            Value::Ref(_) => write!(f, "[object Object]"),
            Value::Function(func) => write!(f, "function {}", func.name()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Ref(o)
    }
}
