#![doc = include_str!("../../../README.md")]

// first to make sure macros are available to the rest of the crate
mod heap;

mod config;
mod exception;
pub mod floordiv;
mod level;
mod object;
mod resource;
mod runtime;
pub mod tracer;
mod types;
mod value;

pub use crate::{
    config::{DEFAULT_HEAP_CAPACITY, RuntimeConfig},
    exception::{ExcType, RunError, RunResult, SimpleException},
    floordiv::{NBool, floordiv_to_bool, floordiv_to_object, try_floordiv_to_bool},
    heap::{HeapId, HeapStats},
    level::{LanguageLevel, Legacy, Level, Modern},
    object::Object,
    resource::{
        DEFAULT_MAX_RECURSION_DEPTH, LimitedTracker, NoLimitTracker, ResourceError, ResourceLimits, ResourceTracker,
        RuntimeTracker,
    },
    runtime::Runtime,
    tracer::{DispatchTracer, NoopTracer, ProfilingReport, ProfilingTracer, RecordingTracer, StderrTracer, TraceEvent},
    types::{Builtins, CoerceSlot, Coercion, FloorDivideSlot, LongInt, TruthSlot, TypeBuilder, TypeObject},
    value::Value,
};
