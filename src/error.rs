use thiserror::Error;

/// An error raised while building the effector model or allocating a command batch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A matrix did not have the number of rows the operation requires.
    #[error("shape mismatch: expected {expected} rows, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    /// The effector layout table is malformed.
    #[error("invalid effector layout: {0}")]
    InvalidLayout(String),

    /// The layout table describes a different number of effectors than requested.
    #[error("expected {expected} effectors, layout describes {found}")]
    EffectorCount { expected: usize, found: usize },

    /// The spin-axis component of an effector vanished, so its tilt angles are undefined.
    ///
    /// `step` is the column index within the rejected batch, the same index the hold
    /// policy records in `EffectorSeries::degenerate`.
    #[error("degenerate solution for effector {effector} at step {step}: spin component is zero")]
    DegenerateSolution { effector: usize, step: usize },

    /// The singular value decomposition could not produce a pseudo-inverse.
    #[error("pseudo-inverse failed: {0}")]
    PseudoInverse(&'static str),
}

impl Error {
    pub fn invalid_layout(reason: impl Into<String>) -> Self {
        Self::InvalidLayout(reason.into())
    }

    pub(crate) fn check_rows(expected: usize, found: usize) -> Result<()> {
        if expected == found {
            Ok(())
        } else {
            Err(Self::ShapeMismatch { expected, found })
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
