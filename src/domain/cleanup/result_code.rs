//! Terminal result reported by a pending unit.

use super::FailureMask;

/// Outcome a subscriber reports when its pending cleanup finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Success,
    Failure(FailureMask),
}

impl ResultCode {
    /// Creates a failure result, mapping an empty mask to `UNCATEGORIZED`.
    pub fn failure(mask: FailureMask) -> Self {
        if mask.is_empty() {
            ResultCode::Failure(FailureMask::UNCATEGORIZED)
        } else {
            ResultCode::Failure(mask)
        }
    }

    /// Returns true for failures.
    pub fn is_failure(&self) -> bool {
        matches!(self, ResultCode::Failure(_))
    }

    /// Bits this result contributes to the cycle's failure mask.
    ///
    /// A failure always contributes at least one bit, even when it was
    /// constructed directly with an empty mask.
    pub fn contribution(&self) -> FailureMask {
        match self {
            ResultCode::Success => FailureMask::empty(),
            ResultCode::Failure(mask) if mask.is_empty() => FailureMask::UNCATEGORIZED,
            ResultCode::Failure(mask) => *mask,
        }
    }
}

impl<E> From<Result<(), E>> for ResultCode
where
    E: Into<FailureMask>,
{
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => ResultCode::Success,
            Err(e) => ResultCode::failure(e.into()),
        }
    }
}
