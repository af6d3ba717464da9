use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use anyhow::{anyhow, Error};
use log::debug;
use rand::random;

use crate::class::ClassId;
use crate::error::ClassError;
use crate::value::Value;
use crate::vm::native::Function;
use crate::vm::Vm;

pub type ObjectRef = Rc<RefCell<Object>>;

/// What an object stands for, as far as construction is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Ordinary,
    /// an instance constructed for the given (new-target) class
    Instance(ClassId),
    /// the class object of the given class
    Class(ClassId),
}

#[derive(Debug, Clone)]
pub enum Property {
    Data {
        value: Value,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    Accessor {
        get: Option<Function>,
        set: Option<Function>,
        enumerable: bool,
        configurable: bool,
    },
}

impl Property {
    /// writable, enumerable and configurable; the shape every installed field gets
    pub fn data(value: Value) -> Self {
        Property::Data {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// like `data`, but hidden from enumeration
    pub fn method(value: Value) -> Self {
        Property::Data {
            value,
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Property::Data { value, .. } => Some(value),
            Property::Accessor { .. } => None,
        }
    }

    pub fn is_configurable(&self) -> bool {
        match self {
            Property::Data { configurable, .. } | Property::Accessor { configurable, .. } => *configurable,
        }
    }

    pub fn is_enumerable(&self) -> bool {
        match self {
            Property::Data { enumerable, .. } | Property::Accessor { enumerable, .. } => *enumerable,
        }
    }

    pub fn is_writable(&self) -> bool {
        matches!(self, Property::Data { writable: true, .. })
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self, Property::Accessor { .. })
    }
}

pub struct Object {
    /// unique id for instance
    pub id: u32,
    pub kind: ObjectKind,
    pub prototype: Option<ObjectRef>,
    // keys in insertion order, values in `properties`
    keys: Vec<String>,
    properties: HashMap<String, Property>,
    extensible: bool,
}

impl Object {
    pub fn new(kind: ObjectKind, prototype: Option<ObjectRef>) -> Self {
        Self {
            id: random(),
            kind,
            prototype,
            keys: vec![],
            properties: HashMap::new(),
            extensible: true,
        }
    }

    pub fn new_ref(kind: ObjectKind, prototype: Option<ObjectRef>) -> ObjectRef {
        Rc::new(RefCell::new(Object::new(kind, prototype)))
    }

    pub fn get_own_property(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    pub fn has_own_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// own property names in the order they were first defined
    pub fn own_keys(&self) -> &[String] {
        &self.keys
    }

    /// Defines or redefines an own property.
    /// Fails when the existing property is not configurable, or when a new key
    /// is added to an object that is not extensible.
    pub fn define_own_property(&mut self, key: &str, property: Property) -> Result<(), Error> {
        match self.properties.get(key) {
            Some(existing) if !existing.is_configurable() => {
                return Err(anyhow!(ClassError::Type(format!(
                    "Cannot redefine property: {}",
                    key
                ))));
            }
            Some(_) => {}
            None => {
                if !self.extensible {
                    return Err(anyhow!(ClassError::Type(format!(
                        "Cannot define property {}, object is not extensible",
                        key
                    ))));
                }
                self.keys.push(key.into());
            }
        }
        debug!("define {}.{}", self.id, key);
        self.properties.insert(key.into(), property);
        Ok(())
    }

    pub fn delete(&mut self, key: &str) -> bool {
        match self.properties.get(key) {
            Some(p) if !p.is_configurable() => false,
            Some(_) => {
                self.properties.remove(key);
                self.keys.retain(|k| k != key);
                true
            }
            None => true,
        }
    }

    pub fn prevent_extensions(&mut self) {
        self.extensible = false;
    }

    pub fn is_extensible(&self) -> bool {
        self.extensible
    }
}

impl fmt::Debug for Object {
    // prototypes and class objects refer to each other, so never print the chain
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object {{id: {}, kind: {:?}, keys: {:?}}}", self.id, self.kind, self.keys)
    }
}

/// Reads `key`, walking the prototype chain. Getters are called with `receiver` as `this`.
pub fn get(vm: &mut Vm, object: &ObjectRef, key: &str, receiver: &Value) -> Result<Value, Error> {
    let mut current = Some(object.clone());
    while let Some(o) = current {
        let property = o.borrow().get_own_property(key).cloned();
        match property {
            Some(Property::Data { value, .. }) => return Ok(value),
            Some(Property::Accessor { get: Some(getter), .. }) => {
                return getter.invoke(vm, receiver, vec![]);
            }
            Some(Property::Accessor { get: None, .. }) => return Ok(Value::Undefined),
            None => current = o.borrow().prototype.clone(),
        }
    }
    Ok(Value::Undefined)
}

/// Ordinary assignment `receiver.key = value`: setters found on the chain are called,
/// otherwise the value lands as an own data property on the receiver.
pub fn set(vm: &mut Vm, receiver: &ObjectRef, key: &str, value: Value) -> Result<(), Error> {
    let mut current = Some(receiver.clone());
    while let Some(o) = current {
        let property = o.borrow().get_own_property(key).cloned();
        match property {
            Some(Property::Accessor { set: Some(setter), .. }) => {
                setter.invoke(vm, &Value::Ref(receiver.clone()), vec![value])?;
                return Ok(());
            }
            Some(Property::Accessor { set: None, .. }) => {
                return Err(anyhow!(ClassError::Type(format!(
                    "Cannot set property {} which has only a getter",
                    key
                ))));
            }
            Some(Property::Data { writable: false, .. }) => {
                return Err(anyhow!(ClassError::Type(format!(
                    "Cannot assign to read only property '{}'",
                    key
                ))));
            }
            Some(Property::Data { .. }) => break,
            None => current = o.borrow().prototype.clone(),
        }
    }

    let mut target = receiver.borrow_mut();
    let updated = match target.get_own_property(key) {
        Some(Property::Data { writable, enumerable, configurable, .. }) => Property::Data {
            value,
            writable: *writable,
            enumerable: *enumerable,
            configurable: *configurable,
        },
        _ => Property::data(value),
    };
    target.define_own_property(key, updated)
}

/// Installs `key` as a writable, enumerable, configurable data property, overwriting
/// whatever own property was there.
pub fn create_data_property_or_throw(object: &ObjectRef, key: &str, value: Value) -> Result<(), Error> {
    object.borrow_mut().define_own_property(key, Property::data(value))
}
