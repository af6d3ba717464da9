use std::rc::Rc;

use anyhow::Error;

use crate::value::Value;
use crate::vm::native::Function;
use crate::vm::Vm;

/// A deferred field initializer. Invoked once per installation with the receiver as `this`.
pub type Thunk = Rc<dyn Fn(&mut Vm, &Value) -> Result<Value, Error>>;

/// A computed property name, evaluated once while the class is being defined.
pub type ComputedName = Rc<dyn Fn(&mut Vm) -> Result<Value, Error>>;

/// A user constructor body. `this` is reached through `Vm::this`, the parent
/// constructor through `Vm::super_call`.
pub type ConstructorBody = Rc<dyn Fn(&mut Vm, Vec<Value>) -> Result<(), Error>>;

pub fn thunk(code: impl Fn(&mut Vm, &Value) -> Result<Value, Error> + 'static) -> Thunk {
    Rc::new(code)
}

pub fn computed(code: impl Fn(&mut Vm) -> Result<Value, Error> + 'static) -> ComputedName {
    Rc::new(code)
}

#[derive(Clone)]
pub enum PropertyName {
    Literal(String),
    Computed(ComputedName),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Getter,
    Setter,
}

#[derive(Clone)]
pub enum ClassElement {
    Method {
        name: String,
        kind: MethodKind,
        is_static: bool,
        function: Function,
    },
    Field {
        name: PropertyName,
        is_static: bool,
        initializer: Option<Thunk>,
    },
}

/// A parsed class body, elements in source order.
#[derive(Clone, Default)]
pub struct ClassDef {
    pub(crate) name: Option<String>,
    pub(crate) heritage: Option<Value>,
    pub(crate) constructor: Option<ConstructorBody>,
    pub(crate) elements: Vec<ClassElement>,
}

impl ClassDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// the value of the `extends` clause
    pub fn extends(mut self, heritage: Value) -> Self {
        self.heritage = Some(heritage);
        self
    }

    pub fn constructor(mut self, body: impl Fn(&mut Vm, Vec<Value>) -> Result<(), Error> + 'static) -> Self {
        self.constructor = Some(Rc::new(body));
        self
    }

    pub fn element(mut self, element: ClassElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn field(self, name: &str, initializer: Option<Thunk>) -> Self {
        self.element(ClassElement::Field {
            name: PropertyName::Literal(name.into()),
            is_static: false,
            initializer,
        })
    }

    pub fn computed_field(self, name: ComputedName, initializer: Option<Thunk>) -> Self {
        self.element(ClassElement::Field {
            name: PropertyName::Computed(name),
            is_static: false,
            initializer,
        })
    }

    pub fn static_field(self, name: &str, initializer: Option<Thunk>) -> Self {
        self.element(ClassElement::Field {
            name: PropertyName::Literal(name.into()),
            is_static: true,
            initializer,
        })
    }

    pub fn static_computed_field(self, name: ComputedName, initializer: Option<Thunk>) -> Self {
        self.element(ClassElement::Field {
            name: PropertyName::Computed(name),
            is_static: true,
            initializer,
        })
    }

    pub fn method(self, function: Function) -> Self {
        self.method_element(function, MethodKind::Method, false)
    }

    pub fn static_method(self, function: Function) -> Self {
        self.method_element(function, MethodKind::Method, true)
    }

    pub fn getter(self, function: Function) -> Self {
        self.method_element(function, MethodKind::Getter, false)
    }

    pub fn setter(self, function: Function) -> Self {
        self.method_element(function, MethodKind::Setter, false)
    }

    fn method_element(self, function: Function, kind: MethodKind, is_static: bool) -> Self {
        self.element(ClassElement::Method {
            name: function.name().to_owned(),
            kind,
            is_static,
            function,
        })
    }
}
