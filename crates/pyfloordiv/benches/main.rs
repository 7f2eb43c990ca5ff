// Use codspeed-criterion-compat when running on CodSpeed (CI), real criterion otherwise (for flamegraphs)
#[cfg(codspeed)]
use codspeed_criterion_compat::{Bencher, Criterion, black_box, criterion_group, criterion_main};
#[cfg(not(codspeed))]
use criterion::{Bencher, Criterion, black_box, criterion_group, criterion_main};
use num_bigint::BigInt;
use pyfloordiv::{NBool, Object, RunResult, Runtime, RuntimeConfig, TypeBuilder, Value, floordiv::legacy};

type ObjectFn = fn(&mut Runtime, &Value, &Value) -> RunResult<Value>;

/// Times one entry point on a fixed operand pair, releasing each result.
///
/// The first result is checked against `expected` so a broken path fails
/// loudly instead of timing an error.
fn run_floordiv(bench: &mut Bencher, f: ObjectFn, lhs: &Object, rhs: &Object, expected: &str) {
    let mut rt = Runtime::new(RuntimeConfig::legacy());
    let (a, b) = (rt.alloc(lhs).unwrap(), rt.alloc(rhs).unwrap());
    let first = f(&mut rt, &a, &b).unwrap();
    assert_eq!(rt.repr(&first), expected);
    rt.drop_value(first);

    bench.iter(|| {
        let v = f(&mut rt, black_box(&a), black_box(&b)).unwrap();
        rt.drop_value(black_box(v));
    });
}

/// Times a division answered by a user type's slot.
fn run_user_slot(bench: &mut Bencher) {
    let mut rt = Runtime::new(RuntimeConfig::legacy());
    let halver = TypeBuilder::new("Halver")
        .base(&rt.builtins().object.clone())
        .floor_divide(|_, _, _| Ok(Value::Int(2)))
        .build();
    let h = rt.new_instance(&halver, Value::None).unwrap();

    bench.iter(|| {
        let v = legacy::object_object(&mut rt, black_box(&h), black_box(&Value::Int(3))).unwrap();
        black_box(v);
    });
}

fn run_nbool(bench: &mut Bencher) {
    let mut rt = Runtime::new(RuntimeConfig::legacy());
    let (a, b) = (
        rt.alloc(&Object::Long(BigInt::from(1) << 100usize)).unwrap(),
        rt.alloc(&Object::Long(BigInt::from(7))).unwrap(),
    );
    assert_eq!(legacy::nbool_long_long(&mut rt, &a, &b), NBool::True);

    bench.iter(|| black_box(legacy::nbool_long_long(&mut rt, black_box(&a), black_box(&b))));
}

/// Configures the floor-division benchmark group.
///
/// Each `__fast` benchmark has a twin that computes the same value through the
/// untyped entry point. Exact legacy ints are still inlined there (`__object`);
/// longs and floats go through their type slots (`__slots`).
fn criterion_benchmark(c: &mut Criterion) {
    let (seven, two) = (Object::Int(-7), Object::Int(2));
    c.bench_function("int_int__fast", |b| {
        run_floordiv(b, legacy::object_int_int, &seven, &two, "-4");
    });
    c.bench_function("int_int__object", |b| {
        run_floordiv(b, legacy::object_object, &seven, &two, "-4");
    });

    let (x, y) = (Object::Float(-7.5), Object::Float(2.0));
    c.bench_function("float_float__fast", |b| {
        run_floordiv(b, legacy::object_float_float, &x, &y, "-4.0");
    });
    c.bench_function("float_float__slots", |b| {
        run_floordiv(b, legacy::object_object, &x, &y, "-4.0");
    });

    let (big, small) = (Object::Long(BigInt::from(1) << 100usize), Object::Long(BigInt::from(-3)));
    c.bench_function("long_long__fast", |b| {
        run_floordiv(
            b,
            legacy::object_long_long,
            &big,
            &small,
            "-422550200076076467165567735126L",
        );
    });
    c.bench_function("long_long__slots", |b| {
        run_floordiv(
            b,
            legacy::object_object,
            &big,
            &small,
            "-422550200076076467165567735126L",
        );
    });

    c.bench_function("int_float__slots", |b| {
        run_floordiv(b, legacy::object_int_float, &seven, &y, "-4.0");
    });
    c.bench_function("user_slot", run_user_slot);
    c.bench_function("nbool_long_long", run_nbool);
}

criterion_group!(benches, criterion_benchmark);

criterion_main!(benches);
