use thiserror::Error;

/// Errors surfaced by treap engine operations.
///
/// None of these leave the tree partially mutated: a failing call rejects
/// exactly itself and the prior state stays intact.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum TreapError {
    /// Priorities must lie strictly between 0 and 1; both bounds are
    /// excluded.
    #[error("priority {0} is outside the open interval (0, 1)")]
    InvalidPriority(f64),
}
