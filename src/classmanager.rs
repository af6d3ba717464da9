use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{anyhow, Context, Error};
use log::{debug, info};
use once_cell::sync::Lazy;

use crate::class::{Class, ClassId, ConstructorKind, FieldRecord};
use crate::classdef::{ClassDef, ClassElement, MethodKind, PropertyName};
use crate::error::ClassError;
use crate::value::Value;
use crate::vm::fields;
use crate::vm::native::Function;
use crate::vm::object::{Object, ObjectKind, ObjectRef, Property};
use crate::vm::Vm;

static RESERVED_FIELD_NAMES: Lazy<Vec<&str>> = Lazy::new(|| vec!["constructor"]);
static RESERVED_STATIC_FIELD_NAMES: Lazy<Vec<&str>> = Lazy::new(|| vec!["constructor", "prototype"]);

/// Registry of defined classes, keyed by id and by name.
pub struct ClassManager {
    // sequence for passing new classIds
    current_id: ClassId,
    classes: HashMap<ClassId, Class>,
    names: HashMap<String, ClassId>,
}

impl ClassManager {
    pub fn new() -> Self {
        Self {
            current_id: 0,
            classes: HashMap::new(),
            names: HashMap::new(),
        }
    }

    pub fn get(&self, id: ClassId) -> Result<&Class, Error> {
        self.classes
            .get(&id)
            .ok_or_else(|| anyhow!(ClassError::Semantic(format!("Class {} not found", id))))
    }

    pub fn get_mut(&mut self, id: ClassId) -> Result<&mut Class, Error> {
        self.classes.get_mut(&id).ok_or_else(|| anyhow!("Class {} not found", id))
    }

    pub fn get_classid(&self, name: &str) -> Option<ClassId> {
        self.names.get(name).copied()
    }

    pub fn contains(&self, id: ClassId) -> bool {
        self.classes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    fn next_id(&mut self) -> ClassId {
        self.current_id += 1;
        self.current_id
    }

    /// returns the id the name pointed at before, if any
    fn register(&mut self, class: Class) -> Option<ClassId> {
        let shadowed = class
            .name
            .as_ref()
            .and_then(|name| self.names.insert(name.clone(), class.id));
        self.classes.insert(class.id, class);
        shadowed
    }

    /// Undoes `register` for a definition that failed. The name goes back to the class
    /// it shadowed. The class itself stays as long as a subclass defined meanwhile
    /// still names it as parent.
    fn unregister(&mut self, id: ClassId, shadowed: Option<ClassId>) {
        let name = self.classes.get(&id).and_then(|c| c.name.clone());
        if let Some(name) = name {
            if self.names.get(&name) == Some(&id) {
                match shadowed {
                    Some(previous) => self.names.insert(name, previous),
                    None => self.names.remove(&name),
                };
            }
        }
        if !self.classes.values().any(|c| c.parent == Some(id)) {
            self.classes.remove(&id);
        } else {
            debug!("class {} kept, a subclass depends on it", id);
        }
    }
}

impl Default for ClassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluates a class definition.
///
/// Elements are walked in source order: methods and accessors are installed on the
/// prototype (or the class object when static), fields become `FieldRecord`s with
/// computed names evaluated right here, exactly once. Static fields then run once,
/// in order, against the class object. The class is only observable after all of
/// that succeeded; on failure nothing stays registered.
pub(crate) fn define_class(vm: &mut Vm, classdef: ClassDef) -> Result<ClassId, Error> {
    let ClassDef {
        name,
        heritage,
        constructor,
        elements,
    } = classdef;
    let display_name = name.clone().unwrap_or_else(|| "<anonymous>".into());
    info!("define class {}", display_name);

    check_reserved_names(&display_name, &elements)?;
    let parent = resolve_heritage(vm, &display_name, heritage)?;

    let (parent_prototype, parent_class_object) = match parent {
        Some(parent_id) => {
            let parent_class = vm.class_manager.get(parent_id)?;
            (Some(parent_class.prototype.clone()), Some(parent_class.class_object.clone()))
        }
        None => (None, None),
    };

    let id = vm.class_manager.next_id();
    let prototype = Object::new_ref(ObjectKind::Ordinary, parent_prototype);
    let class_object = Object::new_ref(ObjectKind::Class(id), parent_class_object);
    {
        let mut c = class_object.borrow_mut();
        c.define_own_property(
            "prototype",
            Property::Data {
                value: Value::Ref(prototype.clone()),
                writable: false,
                enumerable: false,
                configurable: false,
            },
        )?;
        if let Some(name) = &name {
            c.define_own_property(
                "name",
                Property::Data {
                    value: Value::from(name.as_str()),
                    writable: false,
                    enumerable: false,
                    configurable: true,
                },
            )?;
        }
    }

    let mut instance_fields = vec![];
    let mut static_fields = vec![];
    for element in elements {
        match element {
            ClassElement::Method {
                name: method_name,
                kind,
                is_static,
                function,
            } => {
                let home = if is_static { &class_object } else { &prototype };
                define_method(home, &method_name, kind, function)?;
            }
            ClassElement::Field {
                name: field_name,
                is_static,
                initializer,
            } => {
                let key = match field_name {
                    PropertyName::Literal(key) => key,
                    PropertyName::Computed(expression) => expression(vm)
                        .with_context(|| {
                            ClassError::Definition(format!(
                                "computed field name in class {} could not be evaluated",
                                display_name
                            ))
                        })?
                        .to_property_key(),
                };
                debug!("{}: collect {}field {}", display_name, if is_static { "static " } else { "" }, key);
                let record = FieldRecord::new(key, initializer);
                if is_static {
                    static_fields.push(record);
                } else {
                    instance_fields.push(record);
                }
            }
        }
    }

    let kind = if parent.is_some() {
        ConstructorKind::Derived
    } else {
        ConstructorKind::Base
    };
    let shadowed = vm.class_manager.register(Class {
        id,
        name,
        parent,
        kind,
        prototype,
        class_object: class_object.clone(),
        constructor,
        instance_fields: Rc::new(instance_fields),
        static_fields: static_fields.clone(),
    });

    for record in &static_fields {
        if let Err(e) = fields::define_field(vm, &class_object, record) {
            vm.class_manager.unregister(id, shadowed);
            return Err(e.context(ClassError::Definition(format!(
                "static field {} of class {} could not be initialized",
                record.name(),
                display_name
            ))));
        }
    }

    debug!("new class {} -> {}", display_name, id);
    Ok(id)
}

fn check_reserved_names(class_name: &str, elements: &[ClassElement]) -> Result<(), Error> {
    for element in elements {
        if let ClassElement::Field {
            name: PropertyName::Literal(name),
            is_static,
            ..
        } = element
        {
            let reserved = if *is_static {
                RESERVED_STATIC_FIELD_NAMES.as_slice()
            } else {
                RESERVED_FIELD_NAMES.as_slice()
            };
            if reserved.contains(&name.as_str()) {
                return Err(anyhow!(ClassError::Semantic(format!(
                    "Classes may not have a {}field named '{}' (class {})",
                    if *is_static { "static " } else { "" },
                    name,
                    class_name
                ))));
            }
        }
    }
    Ok(())
}

fn resolve_heritage(vm: &Vm, class_name: &str, heritage: Option<Value>) -> Result<Option<ClassId>, Error> {
    let heritage = match heritage {
        Some(h) => h,
        None => return Ok(None),
    };
    if let Value::Ref(object) = &heritage {
        if let ObjectKind::Class(parent_id) = object.borrow().kind {
            if vm.class_manager.contains(parent_id) {
                return Ok(Some(parent_id));
            }
        }
    }
    Err(anyhow!(ClassError::Semantic(format!(
        "Class extends value {} is not a constructor (class {})",
        heritage, class_name
    ))))
}

fn define_method(home: &ObjectRef, name: &str, kind: MethodKind, function: Function) -> Result<(), Error> {
    let mut home = home.borrow_mut();
    let property = match kind {
        MethodKind::Method => Property::method(Value::Function(function)),
        MethodKind::Getter | MethodKind::Setter => {
            // a getter and setter of the same name share one accessor property
            let (mut get, mut set) = match home.get_own_property(name) {
                Some(Property::Accessor { get, set, .. }) => (get.clone(), set.clone()),
                _ => (None, None),
            };
            if kind == MethodKind::Getter {
                get = Some(function);
            } else {
                set = Some(function);
            }
            Property::Accessor {
                get,
                set,
                enumerable: false,
                configurable: true,
            }
        }
    };
    home.define_own_property(name, property)
}
