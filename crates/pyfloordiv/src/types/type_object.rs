//! Type descriptors and their number-protocol slots.
//!
//! A [`TypeObject`] is immutable once built and shared through `Rc`. Slots are
//! trait objects so arbitrary user types can take part in floor division; a type
//! that does not override a slot shares its base type's `Rc`, which is what
//! dispatch relies on when it compares the two operands' slots for identity.

use std::{fmt, ptr, rc::Rc};

use crate::{exception::RunResult, runtime::Runtime, value::Value};

/// The `nb_floor_divide` slot.
///
/// Returns a new reference, `Value::NotImplemented` to decline the operand pair,
/// or an error which dispatch propagates unchanged.
pub trait FloorDivideSlot {
    fn floor_divide(&self, rt: &mut Runtime, lhs: &Value, rhs: &Value) -> RunResult<Value>;
}

impl<F> FloorDivideSlot for F
where
    F: Fn(&mut Runtime, &Value, &Value) -> RunResult<Value>,
{
    #[inline]
    fn floor_divide(&self, rt: &mut Runtime, lhs: &Value, rhs: &Value) -> RunResult<Value> {
        self(rt, lhs, rhs)
    }
}

/// Outcome of a legacy coercion slot.
#[derive(Debug)]
pub enum Coercion {
    /// Both operands converted to a common type, as new references `(own, other)`.
    Coerced(Value, Value),
    /// The slot does not know how to coerce this pair.
    Declined,
}

/// The legacy `nb_coerce` slot.
///
/// Called with the slot owner's operand first.
pub trait CoerceSlot {
    fn coerce(&self, rt: &mut Runtime, own: &Value, other: &Value) -> RunResult<Coercion>;
}

impl<F> CoerceSlot for F
where
    F: Fn(&mut Runtime, &Value, &Value) -> RunResult<Coercion>,
{
    #[inline]
    fn coerce(&self, rt: &mut Runtime, own: &Value, other: &Value) -> RunResult<Coercion> {
        self(rt, own, other)
    }
}

/// Truth-value protocol (`nb_bool` / `nb_nonzero`).
pub trait TruthSlot {
    fn truth(&self, rt: &mut Runtime, value: &Value) -> RunResult<bool>;
}

impl<F> TruthSlot for F
where
    F: Fn(&mut Runtime, &Value) -> RunResult<bool>,
{
    #[inline]
    fn truth(&self, rt: &mut Runtime, value: &Value) -> RunResult<bool> {
        self(rt, value)
    }
}

/// Number-protocol slots of a type.
#[derive(Clone, Default)]
pub struct NumberMethods {
    pub floor_divide: Option<Rc<dyn FloorDivideSlot>>,
    pub coerce: Option<Rc<dyn CoerceSlot>>,
    pub truth: Option<Rc<dyn TruthSlot>>,
}

/// A runtime type descriptor.
pub struct TypeObject {
    name: String,
    base: Option<Rc<TypeObject>>,
    new_style_number: bool,
    number: NumberMethods,
}

impl TypeObject {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn base(&self) -> Option<&Rc<Self>> {
        self.base.as_ref()
    }

    /// Whether the type takes part in the slot-based number protocol without
    /// coercion. Only meaningful under the legacy level.
    #[must_use]
    pub fn is_new_style_number(&self) -> bool {
        self.new_style_number
    }

    #[must_use]
    pub fn floor_divide(&self) -> Option<&Rc<dyn FloorDivideSlot>> {
        self.number.floor_divide.as_ref()
    }

    #[must_use]
    pub fn coerce(&self) -> Option<&Rc<dyn CoerceSlot>> {
        self.number.coerce.as_ref()
    }

    #[must_use]
    pub fn truth(&self) -> Option<&Rc<dyn TruthSlot>> {
        self.number.truth.as_ref()
    }

    /// Iterates the type followed by its bases, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |t| t.base.as_deref())
    }

    /// Reflexive subtype check by walking the base chain.
    #[must_use]
    pub fn is_subtype_of(&self, other: &Self) -> bool {
        self.ancestors().any(|t| ptr::eq(t, other))
    }
}

impl fmt::Debug for TypeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeObject")
            .field("name", &self.name)
            .field("base", &self.base.as_ref().map(|b| b.name()))
            .field("new_style_number", &self.new_style_number)
            .field("floor_divide", &self.number.floor_divide.is_some())
            .field("coerce", &self.number.coerce.is_some())
            .field("truth", &self.number.truth.is_some())
            .finish()
    }
}

/// Builds a [`TypeObject`].
///
/// Slots not set explicitly are inherited from the base type by sharing its `Rc`.
///
/// ```
/// use pyfloordiv::{Runtime, RuntimeConfig, TypeBuilder, Value};
///
/// let rt = Runtime::new(RuntimeConfig::modern());
/// let meters = TypeBuilder::new("Meters")
///     .base(&rt.builtins().object)
///     .floor_divide(|_rt, _lhs, _rhs| Ok(Value::NotImplemented))
///     .build();
/// assert!(meters.floor_divide().is_some());
/// assert!(meters.is_subtype_of(&rt.builtins().object));
/// ```
#[must_use]
pub struct TypeBuilder {
    name: String,
    base: Option<Rc<TypeObject>>,
    new_style_number: bool,
    number: NumberMethods,
}

impl TypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            new_style_number: true,
            number: NumberMethods::default(),
        }
    }

    pub fn base(mut self, base: &Rc<TypeObject>) -> Self {
        self.base = Some(Rc::clone(base));
        self
    }

    /// Marks the type as a classic (pre-coercion-free) number type.
    pub fn classic(mut self) -> Self {
        self.new_style_number = false;
        self
    }

    pub fn floor_divide(self, slot: impl Fn(&mut Runtime, &Value, &Value) -> RunResult<Value> + 'static) -> Self {
        self.floor_divide_slot(Rc::new(slot))
    }

    /// Installs an existing slot, keeping its identity.
    pub fn floor_divide_slot(mut self, slot: Rc<dyn FloorDivideSlot>) -> Self {
        self.number.floor_divide = Some(slot);
        self
    }

    pub fn coerce(mut self, slot: impl Fn(&mut Runtime, &Value, &Value) -> RunResult<Coercion> + 'static) -> Self {
        self.number.coerce = Some(Rc::new(slot));
        self
    }

    pub fn truth(mut self, slot: impl Fn(&mut Runtime, &Value) -> RunResult<bool> + 'static) -> Self {
        self.number.truth = Some(Rc::new(slot));
        self
    }

    #[must_use]
    pub fn build(self) -> Rc<TypeObject> {
        let Self {
            name,
            base,
            new_style_number,
            mut number,
        } = self;
        if let Some(base) = &base {
            number.floor_divide = number.floor_divide.or_else(|| base.number.floor_divide.clone());
            number.coerce = number.coerce.or_else(|| base.number.coerce.clone());
            number.truth = number.truth.or_else(|| base.number.truth.clone());
        }
        Rc::new(TypeObject {
            name,
            base,
            new_style_number,
            number,
        })
    }
}
