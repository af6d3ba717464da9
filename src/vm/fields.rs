use anyhow::{Context, Error};
use log::debug;

use crate::class::{ClassId, FieldRecord};
use crate::error::ClassError;
use crate::value::Value;
use crate::vm::object::{self, ObjectRef};
use crate::vm::Vm;

/// Installs the instance fields declared by `class_id` (not its ancestors) onto `this`,
/// in declaration order.
///
/// Runs at the two construction hooks: right after a base class allocated `this`, and
/// right after a super call bound `this` in a derived class. A failing field stops the
/// loop; fields installed before it stay on the object.
pub(crate) fn initialize_instance_fields(vm: &mut Vm, this: &ObjectRef, class_id: ClassId) -> Result<(), Error> {
    let (records, class_name) = {
        let class = vm.class_manager.get(class_id)?;
        (class.field_snapshot(), class.display_name().to_owned())
    };
    debug!("{}: install {} field(s) on {}", class_name, records.len(), this.borrow().id);
    for record in records.iter() {
        define_field(vm, this, record).with_context(|| {
            ClassError::Construction(format!(
                "field {} of class {} could not be installed",
                record.name(),
                class_name
            ))
        })?;
    }
    Ok(())
}

/// Installs one field onto `target`.
///
/// With an initializer the thunk runs with `target` as `this` and its result overwrites
/// any own property of that name. Without one, the current value is read through the
/// prototype chain and copied into an own property.
pub(crate) fn define_field(vm: &mut Vm, target: &ObjectRef, record: &FieldRecord) -> Result<(), Error> {
    let receiver = Value::Ref(target.clone());
    let value = match record.initializer() {
        Some(initializer) => initializer(vm, &receiver)?,
        None => object::get(vm, target, record.name(), &receiver)?,
    };
    debug!("field {} = {}", record.name(), value);
    object::create_data_property_or_throw(target, record.name(), value)
}
