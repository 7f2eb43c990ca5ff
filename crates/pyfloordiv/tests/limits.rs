//! Resource limits and configuration.

use num_bigint::BigInt;
use pretty_assertions::assert_eq;
use pyfloordiv::{
    ExcType, Level, NBool, Object, ResourceLimits, RunError, Runtime, RuntimeConfig, TypeBuilder, Value,
    floordiv::{legacy, modern},
};

// =============================================================================
// 1. Allocation and memory limits
// =============================================================================

/// A result allocation beyond the limit is an uncatchable MemoryError.
#[test]
fn allocation_limit_stops_result_allocation() {
    let config = RuntimeConfig::legacy().with_limits(ResourceLimits::new().max_allocations(2));
    let mut rt = Runtime::new(config);
    let a = rt.alloc(&Object::Long(BigInt::from(10))).unwrap();
    let b = rt.alloc(&Object::Long(BigInt::from(3))).unwrap();

    let err = legacy::object_long_long(&mut rt, &a, &b).unwrap_err();
    assert!(matches!(err, RunError::UncatchableExc(_)));
    assert_eq!(err.exc_type(), ExcType::MemoryError);
    assert!(!err.is_catchable_as(ExcType::BaseException));

    // native results need no allocation
    let v = legacy::object_int_int(&mut rt, &Value::Int(10), &Value::Int(3)).unwrap();
    assert!(matches!(v, Value::Int(3)));
    rt.drop_value(a);
    rt.drop_value(b);
}

/// Both variants of a long floor division fail together when the result cannot be allocated.
#[test]
fn bool_variant_charges_long_results() {
    let config = RuntimeConfig::legacy().with_limits(ResourceLimits::new().max_allocations(2));
    let mut rt = Runtime::new(config);
    let a = rt.alloc(&Object::Long(BigInt::from(10))).unwrap();
    let b = rt.alloc(&Object::Long(BigInt::from(3))).unwrap();

    let object_err = legacy::object_long_long(&mut rt, &a, &b).unwrap_err();
    assert_eq!(legacy::nbool_long_long(&mut rt, &a, &b), NBool::Exception);
    let pending = rt.take_pending().unwrap();
    assert_eq!(pending.exc_type(), ExcType::MemoryError);
    assert_eq!(pending.to_string(), object_err.to_string());
    assert_eq!(pending.to_string(), "MemoryError: allocation limit exceeded: 3 > 2");

    // the escalated int // int result is a long too
    let (min, minus_one) = (Value::Int(i64::MIN), Value::Int(-1));
    assert!(legacy::object_int_int(&mut rt, &min, &minus_one).is_err());
    assert_eq!(legacy::nbool_int_int(&mut rt, &min, &minus_one), NBool::Exception);
    assert_eq!(rt.take_pending().map(|e| e.exc_type()), Some(ExcType::MemoryError));

    // native and float results stay unboxed
    assert_eq!(legacy::nbool_int_int(&mut rt, &Value::Int(10), &Value::Int(3)), NBool::True);
    assert_eq!(legacy::nbool_float_float(&mut rt, &Value::Float(1.0), &Value::Float(3.0)), NBool::False);
    assert!(rt.take_pending().is_none());

    rt.drop_value(a);
    rt.drop_value(b);
    assert_eq!(rt.heap_stats().live_objects, 0);
}

/// Without limits the bool variant releases the boxed long result.
#[test]
fn bool_variant_releases_long_results() {
    let mut rt = Runtime::new(RuntimeConfig::legacy());
    let a = rt.alloc(&Object::Long(BigInt::from(1) << 100usize)).unwrap();
    let b = rt.alloc(&Object::Long(BigInt::from(-3))).unwrap();
    assert_eq!(legacy::nbool_long_long(&mut rt, &a, &b), NBool::True);
    assert_eq!(legacy::nbool_long_long(&mut rt, &b, &a), NBool::True);
    rt.drop_value(a);
    rt.drop_value(b);
    assert_eq!(rt.heap_stats().live_objects, 0);
}

/// The bool variant reports the limit as a pending failure.
#[test]
fn memory_limit_in_bool_variant() {
    let config = RuntimeConfig::modern().with_limits(ResourceLimits::new().max_memory(64));
    let mut rt = Runtime::new(config);
    let sub = TypeBuilder::new("Greedy")
        .base(&rt.builtins().object.clone())
        .floor_divide(|rt, _, _| rt.new_long(BigInt::from(1) << 4096usize))
        .build();
    let result = match rt.new_instance(&sub, Value::None) {
        Ok(g) => {
            let r = modern::nbool_object_object(&mut rt, &g, &Value::Int(1));
            rt.drop_value(g);
            r
        }
        Err(err) => panic!("instance should fit the limit: {err}"),
    };
    assert_eq!(result, NBool::Exception);
    assert_eq!(rt.take_pending().map(|e| e.exc_type()), Some(ExcType::MemoryError));
}

// =============================================================================
// 2. Recursion
// =============================================================================

/// A slot that re-enters dispatch forever hits the recursion limit.
#[test]
fn reentrant_dispatch_is_bounded() {
    let config = RuntimeConfig::modern().with_limits(ResourceLimits::new().max_recursion_depth(50));
    let mut rt = Runtime::new(config);
    let forever = TypeBuilder::new("Forever")
        .base(&rt.builtins().object.clone())
        .floor_divide(|rt, lhs, rhs| modern::object_object(rt, lhs, rhs))
        .build();
    let x = rt.new_instance(&forever, Value::None).unwrap();

    let err = modern::object_object(&mut rt, &x, &Value::Int(1)).unwrap_err();
    assert_eq!(err.exc_type(), ExcType::RecursionError);
    assert!(err.is_catchable_as(ExcType::Exception));

    // depth unwinds completely after the failure
    let v = modern::object_object(&mut rt, &Value::Int(9), &Value::Int(2)).unwrap();
    assert!(matches!(v, Value::Int(4)));
    rt.drop_value(x);
    assert_eq!(rt.heap_stats().live_objects, 0);
}

// =============================================================================
// 3. Configuration
// =============================================================================

#[test]
fn runtime_from_json_config() {
    let config = RuntimeConfig::from_json(r#"{"level": "legacy", "heap_capacity": 8}"#).unwrap();
    assert_eq!(config.level, Level::Legacy);
    let mut rt = Runtime::new(config);
    assert_eq!(rt.builtins().int.as_ref().map(|t| t.name().to_owned()), Some("int".to_owned()));
    let v = legacy::object_object(&mut rt, &Value::Int(-1), &Value::Int(3)).unwrap();
    assert_eq!(rt.repr(&v), "-1");
}

#[test]
fn malformed_config_is_rejected() {
    let err = RuntimeConfig::from_json("{\"limits\": 3}").unwrap_err();
    assert_eq!(err.exc_type(), ExcType::ValueError);
    assert!(err.message().is_some_and(|m| m.starts_with("invalid runtime config")));
}
