use std::fmt;

use serde::{Deserialize, Serialize};

use crate::exception::{ExcType, RunError, SimpleException};

/// Nesting allowed for dispatch re-entered from slots when no limit is configured.
///
/// Same as CPython's default recursion limit.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 1000;

/// A limit that refused an allocation or a nested dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// `count` would be the allocation number past `limit`.
    Allocation { limit: usize, count: usize },
    /// `used` bytes would exceed `limit`.
    Memory { limit: usize, used: usize },
    /// Entering `depth` would exceed `limit`.
    Recursion { limit: usize, depth: usize },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocation { limit, count } => write!(f, "allocation limit exceeded: {count} > {limit}"),
            Self::Memory { limit, used } => write!(f, "memory limit exceeded: {used} bytes > {limit} bytes"),
            Self::Recursion { .. } => f.write_str("maximum recursion depth exceeded"),
        }
    }
}

impl std::error::Error for ResourceError {}

impl ResourceError {
    /// `MemoryError` for the heap limits, `RecursionError` for depth.
    #[must_use]
    pub fn into_exception(self) -> SimpleException {
        let exc_type = if matches!(self, Self::Recursion { .. }) {
            ExcType::RecursionError
        } else {
            ExcType::MemoryError
        };
        SimpleException::new_msg(exc_type, self)
    }
}

/// Heap limits are uncatchable so a user slot cannot swallow them; recursion stays catchable.
impl From<ResourceError> for RunError {
    fn from(err: ResourceError) -> Self {
        let recursion = matches!(err, ResourceError::Recursion { .. });
        let exc = Box::new(err.into_exception());
        if recursion { Self::Exc(exc) } else { Self::UncatchableExc(exc) }
    }
}

/// Limits applied to one runtime. `None` leaves that resource unbounded.
///
/// ```
/// use pyfloordiv::ResourceLimits;
///
/// let limits = ResourceLimits::new().max_memory(1 << 20).max_recursion_depth(64);
/// assert_eq!(limits.max_allocations, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    /// Heap objects that may be created over the runtime's life.
    pub max_allocations: Option<usize>,
    /// Estimated bytes of live heap objects.
    pub max_memory: Option<usize>,
    /// Dispatch nesting; [`DEFAULT_MAX_RECURSION_DEPTH`] when unset.
    pub max_recursion_depth: Option<usize>,
}

impl ResourceLimits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn max_allocations(self, limit: usize) -> Self {
        Self {
            max_allocations: Some(limit),
            ..self
        }
    }

    #[must_use]
    pub fn max_memory(self, limit: usize) -> Self {
        Self {
            max_memory: Some(limit),
            ..self
        }
    }

    #[must_use]
    pub fn max_recursion_depth(self, limit: usize) -> Self {
        Self {
            max_recursion_depth: Some(limit),
            ..self
        }
    }

    fn recursion_depth(&self) -> usize {
        self.max_recursion_depth.unwrap_or(DEFAULT_MAX_RECURSION_DEPTH)
    }

    /// Whether the heap needs accounting at all.
    fn bounds_heap(&self) -> bool {
        self.max_allocations.is_some() || self.max_memory.is_some()
    }
}

/// Accounting hooks the heap and dispatch call into.
///
/// Sizes are passed lazily so trackers that do not count memory never compute them.
pub trait ResourceTracker: fmt::Debug {
    /// Approves or refuses the next allocation.
    fn on_allocate(&mut self, get_size: impl FnOnce() -> usize) -> Result<(), ResourceError>;

    fn on_free(&mut self, get_size: impl FnOnce() -> usize);

    /// Checks that one more dispatch level may be entered on top of `current_depth`.
    fn check_recursion_depth(&self, current_depth: usize) -> Result<(), ResourceError>;

    fn allocation_count(&self) -> Option<usize> {
        None
    }

    fn current_memory_bytes(&self) -> Option<usize> {
        None
    }
}

/// Tracker without heap limits. Only the recursion depth is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoLimitTracker {
    max_recursion_depth: usize,
}

impl NoLimitTracker {
    #[must_use]
    pub const fn new() -> Self {
        Self::with_recursion_depth(DEFAULT_MAX_RECURSION_DEPTH)
    }

    #[must_use]
    pub const fn with_recursion_depth(max_recursion_depth: usize) -> Self {
        Self { max_recursion_depth }
    }
}

impl Default for NoLimitTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceTracker for NoLimitTracker {
    #[inline]
    fn on_allocate(&mut self, _get_size: impl FnOnce() -> usize) -> Result<(), ResourceError> {
        Ok(())
    }

    #[inline]
    fn on_free(&mut self, _get_size: impl FnOnce() -> usize) {}

    #[inline]
    fn check_recursion_depth(&self, current_depth: usize) -> Result<(), ResourceError> {
        check_depth(self.max_recursion_depth, current_depth)
    }
}

/// Tracker that counts allocations and live bytes against [`ResourceLimits`].
#[derive(Debug, Clone)]
pub struct LimitedTracker {
    limits: ResourceLimits,
    allocations: usize,
    live_bytes: usize,
}

impl LimitedTracker {
    #[must_use]
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            allocations: 0,
            live_bytes: 0,
        }
    }

    #[must_use]
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }
}

impl ResourceTracker for LimitedTracker {
    fn on_allocate(&mut self, get_size: impl FnOnce() -> usize) -> Result<(), ResourceError> {
        let count = self.allocations + 1;
        if let Some(limit) = self.limits.max_allocations.filter(|&limit| count > limit) {
            return Err(ResourceError::Allocation { limit, count });
        }
        let used = self.live_bytes + get_size();
        if let Some(limit) = self.limits.max_memory.filter(|&limit| used > limit) {
            return Err(ResourceError::Memory { limit, used });
        }
        self.allocations = count;
        self.live_bytes = used;
        Ok(())
    }

    fn on_free(&mut self, get_size: impl FnOnce() -> usize) {
        self.live_bytes = self.live_bytes.saturating_sub(get_size());
    }

    fn check_recursion_depth(&self, current_depth: usize) -> Result<(), ResourceError> {
        check_depth(self.limits.recursion_depth(), current_depth)
    }

    fn allocation_count(&self) -> Option<usize> {
        Some(self.allocations)
    }

    fn current_memory_bytes(&self) -> Option<usize> {
        Some(self.live_bytes)
    }
}

/// The tracker a [`Runtime`](crate::Runtime) owns, picked from its configured limits.
#[derive(Debug, Clone)]
pub enum RuntimeTracker {
    Unlimited(NoLimitTracker),
    Limited(LimitedTracker),
}

impl RuntimeTracker {
    /// Skips heap accounting unless an allocation or memory limit is set.
    #[must_use]
    pub fn from_limits(limits: &ResourceLimits) -> Self {
        if limits.bounds_heap() {
            Self::Limited(LimitedTracker::new(limits.clone()))
        } else {
            Self::Unlimited(NoLimitTracker::with_recursion_depth(limits.recursion_depth()))
        }
    }
}

/// Forwards a tracker call to the selected variant.
macro_rules! forward {
    ($self:ident, $tracker:ident => $call:expr) => {
        match $self {
            Self::Unlimited($tracker) => $call,
            Self::Limited($tracker) => $call,
        }
    };
}

impl ResourceTracker for RuntimeTracker {
    #[inline]
    fn on_allocate(&mut self, get_size: impl FnOnce() -> usize) -> Result<(), ResourceError> {
        forward!(self, t => t.on_allocate(get_size))
    }

    #[inline]
    fn on_free(&mut self, get_size: impl FnOnce() -> usize) {
        forward!(self, t => t.on_free(get_size));
    }

    #[inline]
    fn check_recursion_depth(&self, current_depth: usize) -> Result<(), ResourceError> {
        forward!(self, t => t.check_recursion_depth(current_depth))
    }

    fn allocation_count(&self) -> Option<usize> {
        forward!(self, t => t.allocation_count())
    }

    fn current_memory_bytes(&self) -> Option<usize> {
        forward!(self, t => t.current_memory_bytes())
    }
}

#[inline]
fn check_depth(limit: usize, current_depth: usize) -> Result<(), ResourceError> {
    if current_depth < limit {
        Ok(())
    } else {
        Err(ResourceError::Recursion {
            limit,
            depth: current_depth + 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limited_tracker_rejects_past_allocation_limit() {
        let mut tracker = LimitedTracker::new(ResourceLimits::new().max_allocations(2));
        assert!(tracker.on_allocate(|| 8).is_ok());
        assert!(tracker.on_allocate(|| 8).is_ok());
        assert_eq!(
            tracker.on_allocate(|| 8),
            Err(ResourceError::Allocation { limit: 2, count: 3 })
        );
        assert_eq!(tracker.allocation_count(), Some(2));
    }

    #[test]
    fn limited_tracker_releases_memory_on_free() {
        let mut tracker = LimitedTracker::new(ResourceLimits::new().max_memory(100));
        tracker.on_allocate(|| 60).unwrap();
        assert_eq!(
            tracker.on_allocate(|| 60),
            Err(ResourceError::Memory { limit: 100, used: 120 })
        );
        tracker.on_free(|| 60);
        assert!(tracker.on_allocate(|| 60).is_ok());
        assert_eq!(tracker.current_memory_bytes(), Some(60));
    }

    #[test]
    fn depth_limit_is_exclusive() {
        let tracker = NoLimitTracker::with_recursion_depth(3);
        assert!(tracker.check_recursion_depth(2).is_ok());
        assert_eq!(
            tracker.check_recursion_depth(3),
            Err(ResourceError::Recursion { limit: 3, depth: 4 })
        );
    }

    #[test]
    fn recursion_error_is_catchable_memory_error_is_not() {
        let recursion: RunError = ResourceError::Recursion { limit: 3, depth: 4 }.into();
        assert!(recursion.is_catchable_as(ExcType::RuntimeError));
        let memory: RunError = ResourceError::Memory { limit: 1, used: 2 }.into();
        assert_eq!(memory.exc_type(), ExcType::MemoryError);
        assert!(!memory.is_catchable_as(ExcType::Exception));
    }

    #[test]
    fn runtime_tracker_selection() {
        assert!(matches!(
            RuntimeTracker::from_limits(&ResourceLimits::new().max_recursion_depth(5)),
            RuntimeTracker::Unlimited(_)
        ));
        assert!(matches!(
            RuntimeTracker::from_limits(&ResourceLimits::new().max_memory(5)),
            RuntimeTracker::Limited(_)
        ));
    }
}
