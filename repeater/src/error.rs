use thiserror::Error;

/// Errors returned by [`crate::ItemsRepeater`] operations a host can misuse.
///
/// Violations that would corrupt index bookkeeping (re-entrant layout, a layout recycling an
/// element it does not hold, illegal ownership transitions) are not represented here: they panic.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RepeaterError {
    #[error("the maximum cache length must be a finite value >= 0 (got {0})")]
    InvalidCacheLength(f64),
    #[error("the cache buffer inflation must be a finite value > 0 (got {0})")]
    InvalidCacheBufferInflation(f64),
    #[error("the viewport shift tolerance must be a finite value >= 0 (got {0})")]
    InvalidViewportShiftTolerance(f64),
    #[error("an element must be realized to be pinned or unpinned")]
    PinUnrealized,
    #[error("unpin was called more often than pin")]
    UnbalancedUnpin,
    #[error("index {index} is out of bounds (count {count})")]
    IndexOutOfBounds { index: usize, count: usize },
    #[error("cannot make an anchor when there is no attached layout")]
    NoLayout,
    #[error("element is not a child of this repeater")]
    NotAChild,
    #[error("invalid collection change: {0}")]
    InvalidCollectionChange(&'static str),
}
