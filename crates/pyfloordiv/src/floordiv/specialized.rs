//! Named instantiations, one per operand-shape pair.
//!
//! `object_<lhs>_<rhs>` returns the result as a new reference and
//! `nbool_<lhs>_<rhs>` its truth value. `int` names the legacy native integer
//! and only exists in [`legacy`]; `long` is the arbitrary-precision integer
//! of either level and `object` an operand of unknown type.

use crate::{
    exception::RunResult,
    floordiv::{
        NBool, floordiv_to_bool, floordiv_to_object,
        shape::{FloatShape, IntShape, LongShape, ObjectShape},
    },
    runtime::Runtime,
    value::Value,
};

macro_rules! shape {
    (int) => {
        IntShape
    };
    (long) => {
        LongShape
    };
    (float) => {
        FloatShape
    };
    (object) => {
        ObjectShape
    };
}

macro_rules! instantiate {
    ($level:ty; $( ($lhs:ident, $rhs:ident) => $object:ident, $nbool:ident; )*) => {
        $(
            #[doc = concat!("`", stringify!($lhs), " // ", stringify!($rhs), "` as a new reference.")]
            #[inline]
            pub fn $object(rt: &mut Runtime, lhs: &Value, rhs: &Value) -> RunResult<Value> {
                floordiv_to_object::<$level, shape!($lhs), shape!($rhs)>(rt, lhs, rhs)
            }

            #[doc = concat!("Truth value of `", stringify!($lhs), " // ", stringify!($rhs), "`.")]
            #[inline]
            pub fn $nbool(rt: &mut Runtime, lhs: &Value, rhs: &Value) -> NBool {
                floordiv_to_bool::<$level, shape!($lhs), shape!($rhs)>(rt, lhs, rhs)
            }
        )*
    };
}

/// Entry points for a runtime configured with [`Level::Legacy`](crate::Level::Legacy).
pub mod legacy {
    use super::*;
    use crate::level::Legacy;

    instantiate! { Legacy;
        (int, int) => object_int_int, nbool_int_int;
        (int, long) => object_int_long, nbool_int_long;
        (int, float) => object_int_float, nbool_int_float;
        (int, object) => object_int_object, nbool_int_object;
        (long, int) => object_long_int, nbool_long_int;
        (long, long) => object_long_long, nbool_long_long;
        (long, float) => object_long_float, nbool_long_float;
        (long, object) => object_long_object, nbool_long_object;
        (float, int) => object_float_int, nbool_float_int;
        (float, long) => object_float_long, nbool_float_long;
        (float, float) => object_float_float, nbool_float_float;
        (float, object) => object_float_object, nbool_float_object;
        (object, int) => object_object_int, nbool_object_int;
        (object, long) => object_object_long, nbool_object_long;
        (object, float) => object_object_float, nbool_object_float;
        (object, object) => object_object, nbool_object_object;
    }
}

/// Entry points for a runtime configured with [`Level::Modern`](crate::Level::Modern).
pub mod modern {
    use super::*;
    use crate::level::Modern;

    instantiate! { Modern;
        (long, long) => object_long_long, nbool_long_long;
        (long, float) => object_long_float, nbool_long_float;
        (long, object) => object_long_object, nbool_long_object;
        (float, long) => object_float_long, nbool_float_long;
        (float, float) => object_float_float, nbool_float_float;
        (float, object) => object_float_object, nbool_float_object;
        (object, long) => object_object_long, nbool_object_long;
        (object, float) => object_object_float, nbool_object_float;
        (object, object) => object_object, nbool_object_object;
    }
}
