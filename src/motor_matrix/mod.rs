//! Linear model from per-effector thrust vectors to the net vehicle wrench.

mod layout;
pub use layout::{Coefficients, Layout, Sign, Term, EFFECTOR_COMPONENTS, WRENCH_AXES};

use crate::{config::PhysicalConstants, Error, Result};
use core::ops::Range;
use nalgebra::{DMatrix, DVector, RealField};

/// Fixed `6 x 3E` effectiveness matrix of the vehicle.
///
/// Rows are force x/y/z then moment x/y/z; effector `k` occupies columns `3k..3k + 3`
/// as (in-plane x, in-plane y, spin axis).
#[derive(Clone, Debug, PartialEq)]
pub struct EffectorModel<T: RealField> {
    matrix: DMatrix<T>,
    effectors: usize,
}

impl<T: RealField + Copy> EffectorModel<T> {
    /// Build the model by resolving every layout term against the physical constants.
    ///
    /// ```
    /// use overactuated::{config::PhysicalConstants, motor_matrix::{EffectorModel, Layout}};
    ///
    /// let model = EffectorModel::<f64>::new(&PhysicalConstants::default(), &Layout::reference());
    /// assert_eq!(model.matrix().shape(), (6, 12));
    /// assert_eq!(model.matrix()[(0, 0)], 1.6e-6);
    /// ```
    pub fn new(constants: &PhysicalConstants<T>, layout: &Layout) -> Self {
        let coefficients = constants.coefficients();
        let matrix = DMatrix::from_fn(WRENCH_AXES, layout.columns(), |row, col| {
            layout.term(row, col).value(&coefficients)
        });

        log::debug!(
            "built effector model for {} effectors ({}x{})",
            layout.effectors(),
            matrix.nrows(),
            matrix.ncols()
        );

        Self {
            matrix,
            effectors: layout.effectors(),
        }
    }

    /// Build the model, failing if the layout does not describe `expected_effectors` effectors.
    pub fn with_effectors(
        constants: &PhysicalConstants<T>,
        layout: &Layout,
        expected_effectors: usize,
    ) -> Result<Self> {
        if layout.effectors() != expected_effectors {
            return Err(Error::EffectorCount {
                expected: expected_effectors,
                found: layout.effectors(),
            });
        }
        Ok(Self::new(constants, layout))
    }

    /// The quad tilt-rotor with its reference constants.
    pub fn reference() -> Self {
        Self::new(&PhysicalConstants::default(), &Layout::reference())
    }

    pub fn matrix(&self) -> &DMatrix<T> {
        &self.matrix
    }

    pub fn effectors(&self) -> usize {
        self.effectors
    }

    /// Columns (and solution rows) owned by effector `k`.
    pub fn effector_columns(&self, k: usize) -> Range<usize> {
        let start = k * EFFECTOR_COMPONENTS;
        start..start + EFFECTOR_COMPONENTS
    }

    /// Net wrench produced by the thrust components `x`.
    pub fn wrench(&self, x: &DVector<T>) -> Result<DVector<T>> {
        Error::check_rows(self.matrix.ncols(), x.nrows())?;
        Ok(&self.matrix * x)
    }
}

#[cfg(test)]
mod tests {
    use super::{EffectorModel, Layout};
    use crate::{config::PhysicalConstants, Error};
    use nalgebra::DVector;

    #[test]
    fn reference_entries() {
        let model = EffectorModel::<f64>::reference();
        let m = model.matrix();
        let mu = 1.6e-6;
        let km = 2.58e-8;
        let lever = 0.707106781 * 0.16 * 1.6e-6;

        assert_eq!(m.shape(), (6, 12));
        assert_eq!(model.effectors(), 4);

        // Force rows alternate sign between opposite effectors
        assert_eq!(m[(0, 0)], mu);
        assert_eq!(m[(0, 3)], -mu);
        assert_eq!(m[(1, 1)], -mu);
        assert_eq!(m[(1, 4)], mu);
        assert_eq!(m[(2, 2)], mu);
        assert_eq!(m[(2, 11)], -mu);

        assert_eq!(m[(3, 0)], -km);
        assert_eq!(m[(3, 2)], lever);
        assert_eq!(m[(3, 5)], -lever);
        assert_eq!(m[(4, 9)], km);
        assert_eq!(m[(4, 11)], lever);
        assert_eq!(m[(5, 0)], -lever);
        assert_eq!(m[(5, 7)], lever);
        assert_eq!(m[(5, 8)], -km);

        // In-plane y never produces a roll or pitch moment
        for k in 0..4 {
            assert_eq!(m[(3, 3 * k + 1)], 0.);
            assert_eq!(m[(4, 3 * k + 1)], 0.);
        }
    }

    #[test]
    fn effector_count_mismatch() {
        let result = EffectorModel::<f64>::with_effectors(
            &PhysicalConstants::default(),
            &Layout::reference(),
            6,
        );
        assert_eq!(
            result.unwrap_err(),
            Error::EffectorCount {
                expected: 6,
                found: 4
            }
        );
    }

    #[test]
    fn effector_columns() {
        let model = EffectorModel::<f64>::reference();
        assert_eq!(model.effector_columns(0), 0..3);
        assert_eq!(model.effector_columns(3), 9..12);
    }

    #[test]
    fn forward_wrench() {
        let model = EffectorModel::<f64>::reference();
        let mut x = DVector::zeros(12);
        x[2] = 1.;
        let wrench = model.wrench(&x).unwrap();
        assert_eq!(wrench, model.matrix().column(2).into_owned());

        assert!(matches!(
            model.wrench(&DVector::zeros(6)),
            Err(Error::ShapeMismatch {
                expected: 12,
                found: 6
            })
        ));
    }
}
