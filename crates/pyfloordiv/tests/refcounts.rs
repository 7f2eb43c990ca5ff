//! Reference-count discipline of floor division.
//!
//! Operands are borrowed: the callee never releases them. Results are new
//! references, and every intermediate object is released on every path.

use num_bigint::BigInt;
use pretty_assertions::assert_eq;
use pyfloordiv::{
    Coercion, ExcType, Object, Runtime, RuntimeConfig, SimpleException, TypeBuilder, Value,
    floordiv::{legacy, modern},
};

fn long(rt: &mut Runtime, i: i64) -> Value {
    rt.alloc(&Object::Long(BigInt::from(i))).unwrap()
}

/// Heap operands keep their count across fast paths, slot paths and failures.
#[test]
fn operands_are_borrowed() {
    let mut rt = Runtime::new(RuntimeConfig::legacy());
    let (a, b) = (long(&mut rt, 100), long(&mut rt, 7));

    let v = legacy::object_long_long(&mut rt, &a, &b).unwrap();
    assert_eq!(rt.refcount(&v), Some(1), "result is a fresh reference");
    rt.drop_value(v);
    let v = legacy::object_object(&mut rt, &a, &Value::Float(3.0)).unwrap();
    rt.drop_value(v);
    assert!(legacy::object_object(&mut rt, &a, &Value::None).is_err());
    assert_eq!(legacy::nbool_long_long(&mut rt, &a, &b).as_bool(), Some(true));

    assert_eq!((rt.refcount(&a), rt.refcount(&b)), (Some(1), Some(1)));
    rt.drop_value(a);
    rt.drop_value(b);
    assert_eq!(rt.heap_stats().live_objects, 0);
}

/// A slot returning its own operand hands back a new reference to it.
#[test]
fn slot_returning_operand_adds_a_reference() {
    let mut rt = Runtime::new(RuntimeConfig::modern());
    let identity = TypeBuilder::new("Identity")
        .base(&rt.builtins().object.clone())
        .floor_divide(|rt, lhs, _| Ok(rt.clone_value(lhs)))
        .build();
    let x = rt.new_instance(&identity, Value::None).unwrap();

    let v = modern::object_object(&mut rt, &x, &Value::Int(1)).unwrap();
    assert_eq!(v.ref_id(), x.ref_id());
    assert_eq!(rt.refcount(&x), Some(2));
    rt.drop_value(v);
    assert_eq!(rt.refcount(&x), Some(1));
    rt.drop_value(x);
}

/// Coerced pairs are released after success, a declined slot, and an error.
#[test]
fn coerced_pairs_are_released_on_every_path() {
    let mut rt = Runtime::new(RuntimeConfig::legacy());
    let wrapper = TypeBuilder::new("Wrapper")
        .base(&rt.builtins().object.clone())
        .classic()
        .coerce(|rt, own, other| Ok(Coercion::Coerced(rt.clone_value(own), rt.clone_value(other))))
        .floor_divide(|rt, _, rhs| match rt.to_object(rhs) {
            Object::Int(0) => Err(SimpleException::new_msg(ExcType::ZeroDivisionError, "wrapped").into()),
            Object::Int(1) => Ok(Value::NotImplemented),
            _ => rt.new_long(BigInt::from(5)),
        })
        .build();
    let x = rt.new_instance(&wrapper, Value::None).unwrap();

    // Wrapper is classic: its slot is only reached through its own coercion
    for divisor in [2, 1, 0] {
        let result = legacy::object_object(&mut rt, &x, &Value::Int(divisor));
        match divisor {
            2 => {
                let v = result.unwrap();
                assert_eq!(rt.repr(&v), "5L");
                rt.drop_value(v);
            }
            1 => assert_eq!(result.unwrap_err().exc_type(), ExcType::TypeError),
            _ => assert_eq!(result.unwrap_err().message(), Some("wrapped")),
        }
        assert_eq!(rt.refcount(&x), Some(1), "divisor {divisor}");
        assert_eq!(rt.heap_stats().live_objects, 1, "divisor {divisor}");
    }
    rt.drop_value(x);
}

/// Long payloads of builtin-subclass instances die with the instance.
#[test]
fn instance_payloads_are_released() {
    let mut rt = Runtime::new(RuntimeConfig::legacy());
    let sub = TypeBuilder::new("MyLong").base(&rt.builtins().long.clone()).build();
    let payload = long(&mut rt, 1 << 40);
    let x = rt.new_instance(&sub, payload).unwrap();
    let v = legacy::object_object(&mut rt, &x, &Value::Int(1 << 20)).unwrap();
    assert_eq!(rt.repr(&v), "1048576L");
    assert_eq!(rt.heap_stats().objects_by_type.get("Long"), Some(&2));
    rt.drop_value(v);
    rt.drop_value(x);
    assert_eq!(rt.heap_stats().live_objects, 0);
}
