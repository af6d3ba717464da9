use std::process::exit;

use anyhow::Error;
use log::error;

use class_fields::classdef::{thunk, ClassDef};
use class_fields::config::Config;
use class_fields::value::Value;
use class_fields::vm::native::Function;
use class_fields::vm::Vm;

fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            exit(2);
        }
    };
    let mut vm = Vm::with_config(config);
    if let Err(e) = run(&mut vm) {
        error!("{:#}", e);
        eprintln!("{:#}", e);
        exit(1);
    }
}

// class Point { x = 1; y = this.x + 1; static origin = "0,0"; }
// class Point3 extends Point { z; constructor() { super(); this.label = ... } }
fn run(vm: &mut Vm) -> Result<(), Error> {
    let point = vm.define_class(
        ClassDef::new("Point")
            .field("x", Some(thunk(|_, _| Ok(1.into()))))
            .field(
                "y",
                Some(thunk(|vm, this| {
                    let x = vm.get(this, "x")?.into_number();
                    Ok((x + 1.0).into())
                })),
            )
            .static_field("origin", Some(thunk(|_, _| Ok("0,0".into())))),
    )?;

    let point_class = vm.class_object(point)?;
    let point3 = vm.define_class(
        ClassDef::new("Point3")
            .extends(point_class.clone())
            .getter(Function::new("z", |_, _, _| Ok(Value::from(3))))
            .field("z", None)
            .constructor(|vm, args| {
                let this = vm.super_call(args)?;
                let label = format!(
                    "({}, {}, {})",
                    vm.get(&this, "x")?,
                    vm.get(&this, "y")?,
                    vm.get(&this, "z")?
                );
                vm.set(&this, "label", label.into())
            }),
    )?;

    let origin = vm.get(&point_class, "origin")?;
    println!("Point.origin = {}", origin);

    let instance = vm.construct(point3, vec![])?;
    let instance_value = Value::Ref(instance.clone());
    let keys = instance.borrow().own_keys().to_vec();
    for key in keys {
        println!("{} = {}", key, vm.get(&instance_value, &key)?);
    }
    Ok(())
}
