use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::{
    config::RuntimeConfig,
    exception::{ExcType, RunError, RunResult, SimpleException},
    floordiv::BuiltinKind,
    heap::{ContainsHeap, Heap, HeapData, HeapStats, Instance},
    level::Level,
    object::Object,
    resource::{ResourceTracker, RuntimeTracker},
    tracer::{DispatchTracer, NoopTracer},
    types::{Builtins, LongInt, TypeObject},
    value::Value,
};

/// The host object runtime floor division runs against.
///
/// Owns the heap, the builtin types of one language level, the installed
/// tracer and the pending-failure slot used by the three-state bool variants.
#[derive(Debug)]
pub struct Runtime {
    heap: Heap<RuntimeTracker>,
    builtins: Builtins,
    config: RuntimeConfig,
    tracer: Box<dyn DispatchTracer>,
    pending: Option<RunError>,
    depth: usize,
}

impl Runtime {
    #[must_use]
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_tracer(config, NoopTracer)
    }

    #[must_use]
    pub fn with_tracer(config: RuntimeConfig, tracer: impl DispatchTracer) -> Self {
        let tracker = RuntimeTracker::from_limits(&config.limits);
        Self {
            heap: Heap::new(config.heap_capacity, tracker),
            builtins: Builtins::new(config.level),
            config,
            tracer: Box::new(tracer),
            pending: None,
            depth: 0,
        }
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.config.level
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[must_use]
    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub(crate) fn heap(&self) -> &Heap<RuntimeTracker> {
        &self.heap
    }

    /// Snapshot of live heap objects, for leak checks.
    #[must_use]
    pub fn heap_stats(&self) -> HeapStats {
        self.heap.stats()
    }

    /// Reference count of a heap value; `None` for immediates.
    #[must_use]
    pub fn refcount(&self, value: &Value) -> Option<usize> {
        value.ref_id().map(|id| self.heap.get_refcount(id))
    }

    // ========================================================================
    // Tracing
    // ========================================================================

    /// Returns the installed tracer if it is a `T`.
    #[must_use]
    pub fn tracer<T: DispatchTracer>(&self) -> Option<&T> {
        let tracer: &dyn std::any::Any = self.tracer.as_ref();
        tracer.downcast_ref::<T>()
    }

    pub fn tracer_mut(&mut self) -> &mut dyn DispatchTracer {
        self.tracer.as_mut()
    }

    /// Installs a new tracer, returning the previous one.
    pub fn set_tracer(&mut self, tracer: impl DispatchTracer) -> Box<dyn DispatchTracer> {
        std::mem::replace(&mut self.tracer, Box::new(tracer))
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Creates a native integer: the legacy `int`, or a small modern `int`.
    #[must_use]
    pub fn new_int(&self, i: i64) -> Value {
        Value::Int(i)
    }

    /// Creates an arbitrary-precision integer.
    pub fn new_long(&mut self, bi: BigInt) -> RunResult<Value> {
        Ok(LongInt::new(bi).into_value(self.level(), &mut self.heap)?)
    }

    /// Creates an instance of a user type.
    ///
    /// `payload` is the builtin value of instances of builtin-number subclasses;
    /// pass `Value::None` otherwise. Ownership of `payload` moves into the instance.
    pub fn new_instance(&mut self, class: &Rc<TypeObject>, payload: Value) -> RunResult<Value> {
        let id = self
            .heap
            .allocate(HeapData::Instance(Instance::new(Rc::clone(class), payload)))?;
        Ok(Value::Ref(id))
    }

    #[must_use]
    pub fn clone_value(&mut self, value: &Value) -> Value {
        value.clone_with_heap(&mut self.heap)
    }

    pub fn drop_value(&mut self, value: Value) {
        value.drop_with_heap(&mut self.heap);
    }

    /// Runtime type of a value.
    #[must_use]
    pub fn type_of(&self, value: &Value) -> Rc<TypeObject> {
        let b = &self.builtins;
        let ty = match value {
            Value::None => &b.none_type,
            Value::NotImplemented => &b.not_implemented_type,
            Value::Bool(_) => &b.bool,
            Value::Int(_) => b.int.as_ref().unwrap_or(&b.long),
            Value::Float(_) => &b.float,
            Value::Ref(id) => match self.heap.get(*id) {
                HeapData::Long(_) => &b.long,
                HeapData::Instance(inst) => inst.class(),
            },
        };
        Rc::clone(ty)
    }

    /// Whether `value`'s type is exactly the builtin `kind`, subclasses excluded.
    #[must_use]
    pub fn is_exact(&self, value: &Value, kind: BuiltinKind) -> bool {
        match kind {
            BuiltinKind::Int => self.level().has_native_int() && matches!(value, Value::Int(_)),
            BuiltinKind::Long => match value {
                Value::Int(_) => !self.level().has_native_int(),
                Value::Ref(id) => matches!(self.heap.get(*id), HeapData::Long(_)),
                _ => false,
            },
            BuiltinKind::Float => matches!(value, Value::Float(_)),
        }
    }

    /// Whether a type takes part in the coercion-free number protocol.
    ///
    /// Every type does under the modern level.
    #[must_use]
    pub fn is_new_style_number(&self, ty: &TypeObject) -> bool {
        self.level() == Level::Modern || ty.is_new_style_number()
    }

    /// Python truth value of `value`, via its type's truth slot.
    pub fn is_true(&mut self, value: &Value) -> RunResult<bool> {
        let truth = self.type_of(value).truth().cloned();
        match truth {
            Some(slot) => slot.truth(self, value),
            None => Ok(true),
        }
    }

    // ========================================================================
    // Pending failure
    // ========================================================================

    /// Records a failure for a caller that only receives `NBool::Exception`.
    ///
    /// Replaces any failure already pending.
    pub fn set_pending(&mut self, err: RunError) {
        self.pending = Some(err);
    }

    pub fn take_pending(&mut self) -> Option<RunError> {
        self.pending.take()
    }

    #[must_use]
    pub fn pending(&self) -> Option<&RunError> {
        self.pending.as_ref()
    }

    // ========================================================================
    // Dispatch depth
    // ========================================================================

    /// Enters one level of (possibly re-entrant) dispatch. Returns the new depth.
    pub(crate) fn enter_dispatch(&mut self) -> RunResult<usize> {
        self.heap.tracker().check_recursion_depth(self.depth)?;
        self.depth += 1;
        Ok(self.depth)
    }

    pub(crate) fn leave_dispatch(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // ========================================================================
    // Conversion
    // ========================================================================

    /// Brings an [`Object`] into the runtime as a new reference.
    ///
    /// `Object::Long` stays a `long` under the legacy level even when it fits
    /// 64 bits. Instances cannot be rebuilt from their type name.
    pub fn alloc(&mut self, object: &Object) -> RunResult<Value> {
        match object {
            Object::None => Ok(Value::None),
            Object::NotImplemented => Ok(Value::NotImplemented),
            Object::Bool(b) => Ok(Value::Bool(*b)),
            Object::Int(i) => Ok(self.new_int(*i)),
            Object::Long(bi) => self.new_long(bi.clone()),
            Object::Float(f) => Ok(Value::Float(*f)),
            Object::Instance { type_name } => Err(SimpleException::new_msg(
                ExcType::TypeError,
                format!("cannot create '{type_name}' instances from an Object"),
            )
            .into()),
        }
    }

    /// Reads a value back out of the runtime.
    ///
    /// Instances of builtin-number subclasses report their type name only.
    #[must_use]
    pub fn to_object(&self, value: &Value) -> Object {
        match value {
            Value::None => Object::None,
            Value::NotImplemented => Object::NotImplemented,
            Value::Bool(b) => Object::Bool(*b),
            Value::Int(i) => Object::Int(*i),
            Value::Float(f) => Object::Float(*f),
            Value::Ref(id) => match self.heap.get(*id) {
                HeapData::Long(li) => match (self.level(), li.inner().to_i64()) {
                    (Level::Modern, Some(i)) => Object::Int(i),
                    _ => Object::Long(li.inner().clone()),
                },
                HeapData::Instance(inst) => Object::Instance {
                    type_name: inst.class().name().to_owned(),
                },
            },
        }
    }

    /// Python `repr()` of a value.
    #[must_use]
    pub fn repr(&self, value: &Value) -> String {
        self.to_object(value).repr(self.level())
    }
}

impl ContainsHeap<RuntimeTracker> for Runtime {
    #[inline]
    fn heap_mut(&mut self) -> &mut Heap<RuntimeTracker> {
        &mut self.heap
    }
}
