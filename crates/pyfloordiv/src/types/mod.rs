pub mod builtins;
pub mod long_int;
pub mod type_object;

pub use builtins::Builtins;
pub use long_int::LongInt;
pub use type_object::{CoerceSlot, Coercion, FloorDivideSlot, TruthSlot, TypeBuilder, TypeObject};
