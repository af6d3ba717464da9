mod test {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use class_fields::classdef::{computed, thunk, ClassDef, Thunk};
    use class_fields::error::ClassError;
    use class_fields::value::Value;
    use class_fields::vm::native::Function;
    use class_fields::vm::object::{ObjectRef, Property};
    use class_fields::vm::Vm;

    type Log = Rc<RefCell<Vec<String>>>;

    fn logged(log: &Log, entry: &str, value: Value) -> Thunk {
        let log = log.clone();
        let entry = entry.to_owned();
        thunk(move |_, _| {
            log.borrow_mut().push(entry.clone());
            Ok(value.clone())
        })
    }

    fn keys(o: &ObjectRef) -> Vec<String> {
        o.borrow().own_keys().to_vec()
    }

    fn own(o: &ObjectRef, key: &str) -> Value {
        o.borrow().get_own_property(key).and_then(|p| p.value().cloned()).unwrap()
    }

    #[test]
    fn base_fields_install_in_order_before_constructor_body() {
        let mut vm = Vm::new();
        let log: Log = Rc::new(RefCell::new(vec![]));
        let body_log = log.clone();
        let id = vm
            .define_class(
                ClassDef::new("A")
                    .field("f1", Some(logged(&log, "f1", 1.into())))
                    .field("f2", None)
                    .field("f3", Some(logged(&log, "f3", 3.into())))
                    .constructor(move |vm, _| {
                        let this = vm.this()?;
                        let seen = keys(this.as_object().unwrap()).join(",");
                        body_log.borrow_mut().push(format!("body sees {}", seen));
                        vm.set(&this, "f1", 10.into())
                    }),
            )
            .unwrap();

        let instance = vm.construct(id, vec![]).unwrap();

        assert_eq!(vec!["f1", "f3", "body sees f1,f2,f3"], *log.borrow());
        assert_eq!(vec!["f1", "f2", "f3"], keys(&instance));
        for key in ["f1", "f2", "f3"] {
            let o = instance.borrow();
            let p = o.get_own_property(key).unwrap();
            assert!(p.is_writable());
            assert!(p.is_enumerable());
            assert!(p.is_configurable());
            assert!(!p.is_accessor());
        }
        assert_eq!(Value::from(10), own(&instance, "f1"));
        assert_eq!(Value::Undefined, own(&instance, "f2"));
        assert_eq!(Value::from(3), own(&instance, "f3"));
    }

    #[test]
    fn initializers_see_earlier_fields_and_methods() {
        let mut vm = Vm::new();
        let id = vm
            .define_class(
                ClassDef::new("Calc")
                    .method(Function::new("double", |_, _, args| {
                        let n = args[0].clone().into_number();
                        Ok((n * 2.0).into())
                    }))
                    .field("a", Some(thunk(|_, _| Ok(21.into()))))
                    .field(
                        "b",
                        Some(thunk(|vm, this| {
                            let a = vm.get(this, "a")?;
                            vm.invoke(this, "double", vec![a])
                        })),
                    )
                    .field("c", Some(thunk(|vm, this| vm.get(this, "d"))))
                    .field("d", Some(thunk(|_, _| Ok(1.into())))),
            )
            .unwrap();

        let instance = vm.construct(id, vec![]).unwrap();
        assert_eq!(Value::from(42), own(&instance, "b"));
        // d was not installed yet when c ran
        assert_eq!(Value::Undefined, own(&instance, "c"));
        assert_eq!(Value::from(1), own(&instance, "d"));
    }

    #[test]
    fn each_instance_runs_initializers_again() {
        let mut vm = Vm::new();
        let counter = Rc::new(Cell::new(0));
        let c = counter.clone();
        let id = vm
            .define_class(ClassDef::new("Counter").field(
                "n",
                Some(thunk(move |_, _| {
                    c.set(c.get() + 1);
                    Ok(c.get().into())
                })),
            ))
            .unwrap();

        let first = vm.construct(id, vec![]).unwrap();
        let second = vm.construct(id, vec![]).unwrap();
        assert_eq!(Value::from(1), own(&first, "n"));
        assert_eq!(Value::from(2), own(&second, "n"));
        assert_eq!(2, counter.get());
    }

    #[test]
    fn field_without_initializer_copies_prototype_getter_value() {
        let mut vm = Vm::new();
        let id = vm
            .define_class(
                ClassDef::new("C")
                    .getter(Function::new("x", |_, _, _| Ok("from prototype".into())))
                    .field("x", None),
            )
            .unwrap();

        let instance = vm.construct(id, vec![]).unwrap();
        {
            let o = instance.borrow();
            let p = o.get_own_property("x").unwrap();
            assert!(!p.is_accessor());
            assert_eq!(Some(&Value::from("from prototype")), p.value());
        }

        let prototype = vm.prototype(id).unwrap();
        prototype
            .borrow_mut()
            .define_own_property(
                "x",
                Property::Accessor {
                    get: Some(Function::new("x", |_, _, _| Ok("changed".into()))),
                    set: None,
                    enumerable: false,
                    configurable: true,
                },
            )
            .unwrap();

        let instance_value = Value::Ref(instance.clone());
        assert_eq!(Value::from("from prototype"), vm.get(&instance_value, "x").unwrap());
        let later = vm.construct(id, vec![]).unwrap();
        assert_eq!(Value::from("changed"), own(&later, "x"));
    }

    #[test]
    fn getter_read_by_uninitialized_field_sees_the_instance() {
        let mut vm = Vm::new();
        let id = vm
            .define_class(
                ClassDef::new("C")
                    .field("base", Some(thunk(|_, _| Ok(5.into()))))
                    .getter(Function::new("twice", |vm, this, _| {
                        let base = vm.get(this, "base")?.into_number();
                        Ok((base * 2.0).into())
                    }))
                    .field("twice", None),
            )
            .unwrap();

        let instance = vm.construct(id, vec![]).unwrap();
        assert_eq!(Value::from(10), own(&instance, "twice"));
    }

    #[test]
    fn uninitialized_field_keeps_ancestor_value() {
        let mut vm = Vm::new();
        let base = vm
            .define_class(ClassDef::new("Base").field("x", Some(thunk(|_, _| Ok(1.into())))))
            .unwrap();
        let base_class = vm.class_object(base).unwrap();
        let derived = vm
            .define_class(ClassDef::new("Derived").extends(base_class).field("x", None))
            .unwrap();

        let instance = vm.construct(derived, vec![]).unwrap();
        assert_eq!(Value::from(1), own(&instance, "x"));
        assert_eq!(vec!["x"], keys(&instance));
    }

    #[test]
    fn initialized_field_overwrites_ancestor_value() {
        let mut vm = Vm::new();
        let base = vm
            .define_class(ClassDef::new("Base").field("x", Some(thunk(|_, _| Ok(1.into())))))
            .unwrap();
        let base_class = vm.class_object(base).unwrap();
        let derived = vm
            .define_class(
                ClassDef::new("Derived")
                    .extends(base_class)
                    .field("x", Some(thunk(|vm, this| {
                        let x = vm.get(this, "x")?.into_number();
                        Ok((x + 1.0).into())
                    }))),
            )
            .unwrap();

        let instance = vm.construct(derived, vec![]).unwrap();
        assert_eq!(Value::from(2), own(&instance, "x"));
    }

    #[test]
    fn computed_name_is_evaluated_once() {
        let mut vm = Vm::new();
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let id = vm
            .define_class(
                ClassDef::new("C")
                    .computed_field(
                        computed(move |_| {
                            c.set(c.get() + 1);
                            Ok(format!("key{}", c.get()).into())
                        }),
                        Some(thunk(|_, _| Ok(true.into()))),
                    )
                    .computed_field(computed(|_| Ok(7.into())), None),
            )
            .unwrap();
        assert_eq!(1, calls.get());

        for _ in 0..3 {
            let instance = vm.construct(id, vec![]).unwrap();
            assert_eq!(vec!["key1", "7"], keys(&instance));
            assert_eq!(Value::from(true), own(&instance, "key1"));
        }
        assert_eq!(1, calls.get());
    }

    #[test]
    fn failing_initializer_keeps_earlier_fields_and_skips_the_rest() {
        let mut vm = Vm::new();
        let seen: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));
        let body_ran = Rc::new(Cell::new(false));
        let s = seen.clone();
        let b = body_ran.clone();
        let id = vm
            .define_class(
                ClassDef::new("Broken")
                    .field(
                        "a",
                        Some(thunk(move |_, this| {
                            *s.borrow_mut() = Some(this.clone());
                            Ok(1.into())
                        })),
                    )
                    .field("b", Some(thunk(|_, _| Err(Vm::throw("boom")))))
                    .field("c", Some(thunk(|_, _| Ok(3.into()))))
                    .constructor(move |_, _| {
                        b.set(true);
                        Ok(())
                    }),
            )
            .unwrap();

        let err = vm.construct(id, vec![]).unwrap_err();
        assert!(matches!(err.downcast_ref::<ClassError>(), Some(ClassError::Construction(_))));
        assert_eq!(
            Some(&ClassError::Thrown("boom".into())),
            err.root_cause().downcast_ref::<ClassError>()
        );

        let partial = seen.borrow().clone().unwrap().into_object();
        assert_eq!(vec!["a"], keys(&partial));
        assert!(!body_ran.get());
        assert_eq!(None, vm.current_phase());
    }

    #[test]
    fn define_failure_on_non_extensible_instance_is_a_construction_error() {
        let mut vm = Vm::new();
        let base = vm
            .define_class(ClassDef::new("Sealed").constructor(|vm, _| {
                let this = vm.this()?;
                this.as_object().unwrap().borrow_mut().prevent_extensions();
                Ok(())
            }))
            .unwrap();
        let base_class = vm.class_object(base).unwrap();
        let derived = vm
            .define_class(
                ClassDef::new("Child")
                    .extends(base_class)
                    .field("extra", Some(thunk(|_, _| Ok(1.into())))),
            )
            .unwrap();

        let err = vm.construct(derived, vec![]).unwrap_err();
        assert!(matches!(err.downcast_ref::<ClassError>(), Some(ClassError::Construction(_))));
        assert!(ClassError::find(&err, |e| matches!(e, ClassError::Type(_))).is_some());
    }

    #[test]
    fn define_failure_on_non_configurable_property() {
        let mut vm = Vm::new();
        let base = vm
            .define_class(ClassDef::new("Locked").constructor(|vm, _| {
                let this = vm.this()?;
                this.as_object().unwrap().borrow_mut().define_own_property(
                    "locked",
                    Property::Data { value: 1.into(), writable: true, enumerable: true, configurable: false },
                )?;
                Ok(())
            }))
            .unwrap();
        let base_class = vm.class_object(base).unwrap();
        let derived = vm
            .define_class(
                ClassDef::new("Child")
                    .extends(base_class)
                    .field("locked", Some(thunk(|_, _| Ok(2.into())))),
            )
            .unwrap();

        let err = vm.construct(derived, vec![]).unwrap_err();
        assert!(matches!(err.downcast_ref::<ClassError>(), Some(ClassError::Construction(_))));
    }
}
