use anyhow::{anyhow, Error};
use log::debug;

use crate::class::ClassId;
use crate::error::ClassError;
use crate::vm::object::ObjectRef;

/// Where a construction frame currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructionPhase {
    /// derived constructor running, `this` not bound yet
    AwaitingSuper,
    /// base class allocated `this`
    Allocated,
    /// the super call returned and `this` is bound
    ThisBound,
    /// this class's own fields are on `this`
    FieldsInstalled,
    /// constructor body runs (or resumes after the super call)
    Body,
}

/// One `new` in progress; frames nest along the super-call chain.
#[derive(Debug)]
pub struct StackFrame {
    pub(crate) class_id: ClassId,
    pub(crate) new_target: ClassId,
    pub(crate) this: Option<ObjectRef>,
    pub(crate) phase: ConstructionPhase,
}

impl StackFrame {
    pub(crate) fn new(class_id: ClassId, new_target: ClassId) -> Self {
        Self {
            class_id,
            new_target,
            this: None,
            phase: ConstructionPhase::AwaitingSuper,
        }
    }

    pub(crate) fn bind_this(&mut self, this: ObjectRef, phase: ConstructionPhase) -> Result<(), Error> {
        if self.this.is_some() {
            return Err(anyhow!(ClassError::Reference(
                "Super constructor may only be called once".into()
            )));
        }
        self.this = Some(this);
        self.enter(phase);
        Ok(())
    }

    pub(crate) fn enter(&mut self, phase: ConstructionPhase) {
        debug!("class {}: {:?} -> {:?}", self.class_id, self.phase, phase);
        self.phase = phase;
    }
}
