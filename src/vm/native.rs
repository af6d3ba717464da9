use std::fmt;
use std::rc::Rc;

use anyhow::Error;
use log::debug;

use crate::value::Value;
use crate::vm::Vm;

pub type NativeCode = dyn Fn(&mut Vm, &Value, Vec<Value>) -> Result<Value, Error>;

/// A callable used for methods and accessors. `this` is passed explicitly.
#[derive(Clone)]
pub struct Function {
    name: String,
    code: Rc<NativeCode>,
}

impl Function {
    pub fn new(
        name: &str,
        code: impl Fn(&mut Vm, &Value, Vec<Value>) -> Result<Value, Error> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            code: Rc::new(code),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.code, &other.code)
    }

    pub(crate) fn invoke(&self, vm: &mut Vm, this: &Value, args: Vec<Value>) -> Result<Value, Error> {
        debug!("native {}", self.name);
        (self.code)(vm, this, args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function {{name: {}}}", self.name)
    }
}
