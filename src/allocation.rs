//! Pseudo-inverse allocation of wrench commands onto effector thrust vectors.

use crate::{motor_matrix::EffectorModel, Error, Result};
use nalgebra::{DMatrix, DVector, RealField, Vector6, SVD};

/// Moore-Penrose pseudo-inverse of `m`.
///
/// Singular values at or below `rcond` times the largest singular value are treated as zero,
/// so a rank deficient `m` gets no contribution along its null space.
/// An empty or all zero `m` has an all zero pseudo-inverse.
pub fn pseudo_inverse<T: RealField + Copy>(m: &DMatrix<T>, rcond: T) -> Result<DMatrix<T>> {
    let scale = if m.is_empty() { T::zero() } else { m.amax() };
    if scale == T::zero() {
        return Ok(DMatrix::zeros(m.ncols(), m.nrows()));
    }

    // The SVD convergence test is partly absolute, so decompose at unit scale
    let svd = SVD::new(m.unscale(scale), true, true);
    let eps = svd.singular_values.max() * rcond;
    let inverse = svd.pseudo_inverse(eps).map_err(Error::PseudoInverse)?;
    Ok(inverse.unscale(scale))
}

/// Solve `m * x = w` in the least-squares sense for every column of `w` at once.
///
/// ```
/// use nalgebra::DMatrix;
/// use overactuated::allocation::solve;
///
/// let m = DMatrix::<f64>::from_row_slice(1, 2, &[1.0, 1.0]);
/// let w = DMatrix::<f64>::from_row_slice(1, 3, &[2.0, 4.0, -2.0]);
/// let x = solve(&m, &w, 1e-15).unwrap();
///
/// assert_eq!(x.shape(), (2, 3));
/// assert!((x[(0, 1)] - 2.0).abs() < 1e-12);
/// assert!((x[(1, 1)] - 2.0).abs() < 1e-12);
/// ```
pub fn solve<T: RealField + Copy>(m: &DMatrix<T>, w: &DMatrix<T>, rcond: T) -> Result<DMatrix<T>> {
    Error::check_rows(m.nrows(), w.nrows())?;
    Ok(pseudo_inverse(m, rcond)? * w)
}

/// Allocator for a fixed effector model.
///
/// The pseudo-inverse is computed once on construction and reused for every batch.
#[derive(Clone, Debug)]
pub struct Allocator<T: RealField> {
    inverse: DMatrix<T>,
}

impl<T: RealField + Copy> Allocator<T> {
    pub fn new(model: &EffectorModel<T>, rcond: T) -> Result<Self> {
        let inverse = pseudo_inverse(model.matrix(), rcond)?;
        log::debug!(
            "computed {}x{} allocation matrix",
            inverse.nrows(),
            inverse.ncols()
        );
        Ok(Self { inverse })
    }

    /// The `3E x 6` pseudo-inverse of the effector model.
    pub fn inverse(&self) -> &DMatrix<T> {
        &self.inverse
    }

    /// Solve a `6 x T` batch of wrench commands into a `3E x T` batch of thrust components.
    pub fn solve(&self, commands: &DMatrix<T>) -> Result<DMatrix<T>> {
        Error::check_rows(self.inverse.ncols(), commands.nrows())?;
        log::debug!("allocating {} wrench commands", commands.ncols());
        Ok(&self.inverse * commands)
    }

    /// Solve a single wrench command.
    pub fn solve_column(&self, wrench: &Vector6<T>) -> Result<DVector<T>> {
        Error::check_rows(self.inverse.ncols(), wrench.nrows())?;
        Ok(&self.inverse * wrench)
    }
}

#[cfg(test)]
mod tests {
    use super::{pseudo_inverse, solve, Allocator};
    use crate::{motor_matrix::EffectorModel, Error};
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, Vector6};

    #[test]
    fn shape_mismatch() {
        let model = EffectorModel::<f64>::reference();
        let w = DMatrix::zeros(5, 4);
        assert_eq!(
            solve(model.matrix(), &w, 1e-15).unwrap_err(),
            Error::ShapeMismatch {
                expected: 6,
                found: 5
            }
        );

        let allocator = Allocator::new(&model, 1e-15).unwrap();
        assert!(matches!(
            allocator.solve(&w),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn reference_reconstruction() {
        let model = EffectorModel::<f64>::reference();
        let allocator = Allocator::new(&model, 1e-15).unwrap();
        let wrench = Vector6::new(0.1, 0.1, -0.9, 0.2, 0.3, 0.1);

        let x = allocator.solve_column(&wrench).unwrap();
        assert_eq!(x.nrows(), 12);

        let reconstructed = model.wrench(&x).unwrap();
        for axis in 0..6 {
            assert_relative_eq!(reconstructed[axis], wrench[axis], epsilon = 1e-9);
        }
    }

    #[test]
    fn batch_matches_single_column() {
        let model = EffectorModel::<f64>::reference();
        let allocator = Allocator::new(&model, 1e-15).unwrap();
        let wrench = Vector6::new(0.12, 0.08, -0.9, 0.2, 0.3, 0.1);
        let batch = DMatrix::from_fn(6, 2, |axis, step| wrench[axis] / (step + 1) as f64);

        let x = allocator.solve(&batch).unwrap();
        let single = allocator.solve_column(&wrench).unwrap();
        assert_eq!(x.shape(), (12, 2));
        for row in 0..12 {
            assert_relative_eq!(x[(row, 0)], single[row], epsilon = 1e-6, max_relative = 1e-10);
            assert_relative_eq!(
                x[(row, 1)],
                0.5 * single[row],
                epsilon = 1e-6,
                max_relative = 1e-10
            );
        }
    }

    #[test]
    fn rank_deficient_null_space() {
        // Second column duplicates the first; the minimum norm solution splits evenly.
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        let inverse = pseudo_inverse(&m, 1e-15).unwrap();
        for value in inverse.iter() {
            assert_relative_eq!(*value, 0.25, epsilon = 1e-12);
        }

        // Zero matrix has an all zero pseudo-inverse
        let zero = DMatrix::<f64>::zeros(6, 3);
        let inverse = pseudo_inverse(&zero, 1e-15).unwrap();
        assert_eq!(inverse.shape(), (3, 6));
        assert!(inverse.iter().all(|v| *v == 0.));
    }

    #[test]
    fn empty_model() {
        let m = DMatrix::<f64>::zeros(6, 0);
        let w = DMatrix::from_element(6, 3, 0.5);

        let x = solve(&m, &w, 1e-15).unwrap();
        assert_eq!(x.shape(), (0, 3));

        let inverse = pseudo_inverse(&DMatrix::<f64>::zeros(0, 0), 1e-15).unwrap();
        assert_eq!(inverse.shape(), (0, 0));
    }

    #[test]
    fn small_scale_model_is_exact() {
        // Reference entries are around 1e-6 to 1e-9
        let model = EffectorModel::<f64>::reference();
        let inverse = pseudo_inverse(model.matrix(), 1e-15).unwrap();
        let identity = model.matrix() * &inverse;

        assert_relative_eq!(identity, DMatrix::identity(6, 6), epsilon = 1e-12);
    }

    #[test]
    fn scale_invariant() {
        let model = EffectorModel::<f64>::reference();
        let inverse = pseudo_inverse(model.matrix(), 1e-15).unwrap();
        let scaled = pseudo_inverse(&(model.matrix() * 1e6), 1e-15).unwrap() * 1e6;

        assert_relative_eq!(inverse, scaled, epsilon = 1e-3, max_relative = 1e-9);
    }
}
