use std::fmt;
use std::rc::Rc;

use anyhow::{anyhow, Error};

use crate::classdef::{ConstructorBody, Thunk};
use crate::vm::object::ObjectRef;

pub type ClassId = u32;

/// Fixed at definition time by the presence of an `extends` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructorKind {
    Base,
    Derived,
}

/// One declared field: its resolved name and its deferred initializer, if any.
#[derive(Clone)]
pub struct FieldRecord {
    name: String,
    initializer: Option<Thunk>,
}

impl FieldRecord {
    pub fn new(name: String, initializer: Option<Thunk>) -> Self {
        Self { name, initializer }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_initializer(&self) -> bool {
        self.initializer.is_some()
    }

    pub fn initializer(&self) -> Option<&Thunk> {
        self.initializer.as_ref()
    }
}

impl fmt::Debug for FieldRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldRecord {{name: {}, has_initializer: {}}}", self.name, self.has_initializer())
    }
}

/// the runtime class, as produced by the collector
pub struct Class {
    pub id: ClassId,
    pub name: Option<String>,
    pub parent: Option<ClassId>,
    pub kind: ConstructorKind,
    /// what instances link to
    pub prototype: ObjectRef,
    /// the object static fields and static methods live on
    pub class_object: ObjectRef,
    pub(crate) constructor: Option<ConstructorBody>,
    // shared with constructions in progress; replacing a thunk copies the list
    pub(crate) instance_fields: Rc<Vec<FieldRecord>>,
    pub(crate) static_fields: Vec<FieldRecord>,
}

impl Class {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }

    /// instance fields, in declaration order
    pub fn instance_fields(&self) -> &[FieldRecord] {
        &self.instance_fields
    }

    /// static fields, in declaration order; these have already run
    pub fn static_fields(&self) -> &[FieldRecord] {
        &self.static_fields
    }

    pub(crate) fn field_snapshot(&self) -> Rc<Vec<FieldRecord>> {
        self.instance_fields.clone()
    }

    /// Swaps the initializer of every instance field called `name`. Declaration
    /// order is untouched and constructions already running keep the old thunk.
    pub(crate) fn replace_initializer(&mut self, name: &str, initializer: Option<Thunk>) -> Result<(), Error> {
        if !self.instance_fields.iter().any(|f| f.name == name) {
            return Err(anyhow!("Field {} not declared on class {}", name, self.display_name()));
        }
        for record in Rc::make_mut(&mut self.instance_fields).iter_mut() {
            if record.name == name {
                *record = FieldRecord::new(record.name.clone(), initializer.clone());
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Class {{id: {}, name: {}, parent: {:?}, kind: {:?}, instance_fields: {:?}, static_fields: {:?}}}",
            self.id,
            self.display_name(),
            self.parent,
            self.kind,
            self.instance_fields,
            self.static_fields
        )
    }
}
