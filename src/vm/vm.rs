use std::io::Write;
use std::rc::Rc;

use anyhow::{anyhow, Error};
use log::{debug, info};

use crate::class::{Class, ClassId, ConstructorKind};
use crate::classdef::{ClassDef, Thunk};
use crate::classmanager::{self, ClassManager};
use crate::config::Config;
use crate::error::ClassError;
use crate::value::Value;
use crate::vm::fields;
use crate::vm::object::{self, Object, ObjectKind, ObjectRef};
use crate::vm::stack::{ConstructionPhase, StackFrame};

/// The single-threaded evaluator: owns the defined classes and the stack of
/// constructions in progress.
pub struct Vm {
    pub(crate) class_manager: ClassManager,
    pub(crate) stackframes: Vec<StackFrame>,
    config: Config,
}

impl Vm {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mut logger = env_logger::Builder::from_default_env();
        logger.format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()));
        if let Some(filter) = &config.log_filter {
            logger.parse_filters(filter);
        }
        // a logger may already be installed by an earlier Vm
        let _ = logger.try_init();

        Self {
            class_manager: ClassManager::new(),
            stackframes: vec![],
            config,
        }
    }

    pub fn define_class(&mut self, classdef: ClassDef) -> Result<ClassId, Error> {
        classmanager::define_class(self, classdef)
    }

    pub fn class(&self, id: ClassId) -> Option<&Class> {
        self.class_manager.get(id).ok()
    }

    pub fn get_classid(&self, name: &str) -> Option<ClassId> {
        self.class_manager.get_classid(name)
    }

    pub fn class_count(&self) -> usize {
        self.class_manager.len()
    }

    /// the class object, usable as an `extends` value
    pub fn class_object(&self, id: ClassId) -> Result<Value, Error> {
        Ok(Value::Ref(self.class_manager.get(id)?.class_object.clone()))
    }

    pub fn prototype(&self, id: ClassId) -> Result<ObjectRef, Error> {
        Ok(self.class_manager.get(id)?.prototype.clone())
    }

    /// Rewrites the initializer of a declared instance field before it runs.
    pub fn replace_field_initializer(
        &mut self,
        id: ClassId,
        field_name: &str,
        initializer: Option<Thunk>,
    ) -> Result<(), Error> {
        info!("replace initializer of field {} on class {}", field_name, id);
        self.class_manager.get_mut(id)?.replace_initializer(field_name, initializer)
    }

    /// `new C(...args)`
    pub fn construct(&mut self, id: ClassId, args: Vec<Value>) -> Result<ObjectRef, Error> {
        info!("construct {}", self.class_manager.get(id)?.display_name());
        self.construct_with_target(id, id, args)
    }

    /// `new callee(...args)` where the callee is a class object
    pub fn construct_value(&mut self, callee: &Value, args: Vec<Value>) -> Result<ObjectRef, Error> {
        let id = match callee {
            Value::Ref(o) => match o.borrow().kind {
                ObjectKind::Class(id) => Some(id),
                _ => None,
            },
            _ => None,
        };
        match id {
            Some(id) => self.construct(id, args),
            None => Err(anyhow!(ClassError::Type(format!("{} is not a constructor", callee)))),
        }
    }

    /// `super(...args)` inside the running derived constructor.
    ///
    /// Constructs through the parent with the same new-target, binds `this`, then
    /// installs this class's own fields before handing `this` back to the body.
    pub fn super_call(&mut self, args: Vec<Value>) -> Result<Value, Error> {
        let (class_id, new_target) = {
            let frame = self.current_frame()?;
            (frame.class_id, frame.new_target)
        };
        let parent = self
            .class_manager
            .get(class_id)?
            .parent
            .ok_or_else(|| anyhow!(ClassError::Semantic("'super' keyword unexpected here".into())))?;
        debug!("super call from class {} to {}", class_id, parent);

        let this = self.construct_with_target(parent, new_target, args)?;
        self.current_frame_mut()?.bind_this(this.clone(), ConstructionPhase::ThisBound)?;
        fields::initialize_instance_fields(self, &this, class_id)?;
        self.current_frame_mut()?.enter(ConstructionPhase::FieldsInstalled);
        self.current_frame_mut()?.enter(ConstructionPhase::Body);
        Ok(Value::Ref(this))
    }

    /// `this` of the running constructor
    pub fn this(&self) -> Result<Value, Error> {
        self.current_frame()?.this.clone().map(Value::Ref).ok_or_else(|| {
            anyhow!(ClassError::Reference(
                "Must call super constructor in derived class before accessing 'this'".into()
            ))
        })
    }

    /// phase of the innermost construction, if any is running
    pub fn current_phase(&self) -> Option<ConstructionPhase> {
        self.stackframes.last().map(|f| f.phase)
    }

    pub fn get(&mut self, target: &Value, key: &str) -> Result<Value, Error> {
        match target {
            Value::Ref(o) => object::get(self, o, key, target),
            Value::Undefined | Value::Null => Err(anyhow!(ClassError::Type(format!(
                "Cannot read properties of {} (reading '{}')",
                target, key
            )))),
            _ => Ok(Value::Undefined),
        }
    }

    pub fn set(&mut self, target: &Value, key: &str, value: Value) -> Result<(), Error> {
        match target {
            Value::Ref(o) => object::set(self, o, key, value),
            _ => Err(anyhow!(ClassError::Type(format!(
                "Cannot set property '{}' of {}",
                key, target
            )))),
        }
    }

    pub fn call(&mut self, function: &Value, this: &Value, args: Vec<Value>) -> Result<Value, Error> {
        match function {
            Value::Function(f) => f.invoke(self, this, args),
            _ => Err(anyhow!(ClassError::Type(format!("{} is not a function", function)))),
        }
    }

    /// `receiver.name(...args)`
    pub fn invoke(&mut self, receiver: &Value, name: &str, args: Vec<Value>) -> Result<Value, Error> {
        let function = self.get(receiver, name)?;
        self.call(&function, receiver, args)
    }

    /// an exception raised by user code
    pub fn throw(value: impl Into<Value>) -> Error {
        anyhow!(ClassError::Thrown(value.into().to_string()))
    }

    /// `value instanceof C`
    pub fn instance_of(&self, value: &Value, id: ClassId) -> Result<bool, Error> {
        let prototype = self.prototype(id)?;
        let mut current = match value {
            Value::Ref(o) => o.borrow().prototype.clone(),
            _ => return Ok(false),
        };
        while let Some(o) = current {
            if Rc::ptr_eq(&o, &prototype) {
                return Ok(true);
            }
            current = o.borrow().prototype.clone();
        }
        Ok(false)
    }

    fn construct_with_target(&mut self, id: ClassId, new_target: ClassId, args: Vec<Value>) -> Result<ObjectRef, Error> {
        if self.stackframes.len() >= self.config.max_construct_depth {
            return Err(anyhow!(ClassError::Construction(format!(
                "Maximum construction depth of {} exceeded",
                self.config.max_construct_depth
            ))));
        }
        self.stackframes.push(StackFrame::new(id, new_target));
        let result = self.run_constructor(id, new_target, args);
        let frame = self
            .stackframes
            .pop()
            .ok_or_else(|| anyhow!("construction frame lost"))?;
        result?;
        frame.this.ok_or_else(|| {
            anyhow!(ClassError::Reference(
                "Must call super constructor in derived class before returning from derived constructor".into()
            ))
        })
    }

    fn run_constructor(&mut self, id: ClassId, new_target: ClassId, args: Vec<Value>) -> Result<(), Error> {
        let (kind, constructor) = {
            let class = self.class_manager.get(id)?;
            (class.kind, class.constructor.clone())
        };
        if kind == ConstructorKind::Base {
            let this = self.allocate(new_target)?;
            self.current_frame_mut()?.bind_this(this.clone(), ConstructionPhase::Allocated)?;
            fields::initialize_instance_fields(self, &this, id)?;
            self.current_frame_mut()?.enter(ConstructionPhase::FieldsInstalled);
            self.current_frame_mut()?.enter(ConstructionPhase::Body);
        }
        match (constructor, kind) {
            (Some(body), _) => body(self, args),
            (None, ConstructorKind::Base) => Ok(()),
            // default derived constructor forwards its arguments
            (None, ConstructorKind::Derived) => self.super_call(args).map(|_| ()),
        }
    }

    fn allocate(&self, new_target: ClassId) -> Result<ObjectRef, Error> {
        let prototype = self.prototype(new_target)?;
        let this = Object::new_ref(ObjectKind::Instance(new_target), Some(prototype));
        debug!("allocate {} for class {}", this.borrow().id, new_target);
        Ok(this)
    }

    fn current_frame(&self) -> Result<&StackFrame, Error> {
        self.stackframes
            .last()
            .ok_or_else(|| anyhow!(ClassError::Semantic("not inside a constructor".into())))
    }

    fn current_frame_mut(&mut self) -> Result<&mut StackFrame, Error> {
        self.stackframes
            .last_mut()
            .ok_or_else(|| anyhow!(ClassError::Semantic("not inside a constructor".into())))
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
