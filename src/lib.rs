//! # overactuated
//! Control allocation for multicopters with tilting rotors.
//!
//! # Pipeline
//! [`EffectorModel`] is the fixed linear map from each rotor's thrust vector to the
//! net wrench (force and moment) on the vehicle, built from a [`Layout`] sign table.
//!
//! [`allocation`] inverts that map with a Moore-Penrose pseudo-inverse
//! (see [`Allocator`] for a cached inverse of a fixed model).
//!
//! [`kinematics`] turns solved thrust vectors into rotor spin rate and two smoothed
//! tilt angles per rotor (see [`KinematicsExtractor`]).
//!
//! [`OveractuatedMotors`] runs the whole pipeline on a batch of wrench commands or on
//! a single step of attitude controller inputs ([`PilotInput`](wrench::PilotInput)).

pub mod allocation;
pub use allocation::Allocator;

pub mod config;
pub use config::{AllocationConfig, DegeneratePolicy, PhysicalConstants};

mod error;
pub use error::{Error, Result};

pub mod filter;

pub mod kinematics;
pub use kinematics::{Kinematics, KinematicsExtractor};

pub mod motor_matrix;
pub use motor_matrix::{EffectorModel, Layout};

mod motors;
pub use motors::OveractuatedMotors;

pub mod wrench;

/// Constrain `amt` to `low..=high`, mapping NaN to the middle of the range.
pub(crate) fn constrain<T: nalgebra::RealField + Copy>(amt: T, low: T, high: T) -> T {
    if amt < low {
        return low;
    }

    if amt > high {
        return high;
    }

    // Infinities are caught above, only NaN is left
    if !amt.is_finite() {
        log::warn!("constraining NaN");
        return (low + high) / nalgebra::convert(2.0);
    }

    amt
}

#[cfg(test)]
mod tests {
    use super::constrain;

    #[test]
    fn constrain_range() {
        assert_eq!(constrain(1.5_f64, 0., 1.), 1.);
        assert_eq!(constrain(-0.5_f64, 0., 1.), 0.);
        assert_eq!(constrain(0.25_f64, 0., 1.), 0.25);
        assert_eq!(constrain(f64::NAN, 0., 1.), 0.5);
    }
}
