use crate::motor_matrix::{Coefficients, Layout};
use nalgebra::{convert, RealField};

/// Physical constants of the vehicle that scale the effector layout.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhysicalConstants<T> {
    /// Thrust coupling coefficient of a rotor.
    pub coupling: T,
    /// Rotor drag torque coefficient.
    pub torque: T,
    /// Distance from the vehicle center to each rotor (m).
    pub arm_length: T,
    /// Projection of the arm onto the body axes, √2⁄2 for an X frame.
    pub balance: T,
}

impl<T: RealField + Copy> Default for PhysicalConstants<T> {
    fn default() -> Self {
        Self {
            coupling: convert(1.6e-6),
            torque: convert(2.58e-8),
            arm_length: convert(0.16),
            balance: convert(0.707106781),
        }
    }
}

impl<T: RealField + Copy> PhysicalConstants<T> {
    pub fn coefficients(&self) -> Coefficients<T> {
        Coefficients {
            coupling: self.coupling,
            torque: self.torque,
            lever: self.balance * self.arm_length * self.coupling,
        }
    }
}

/// What the kinematics extractor does with a sample whose spin component vanished.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DegeneratePolicy {
    /// Skip the filter update, repeat the previous angles and flag the step.
    #[default]
    Hold,
    /// Fail the whole batch with [`Error::DegenerateSolution`](crate::Error::DegenerateSolution).
    Reject,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllocationConfig<T> {
    pub constants: PhysicalConstants<T>,

    pub layout: Layout,

    /// Low pass filter gain applied to the tilt angles, 0 ~ 1
    pub filter_gain: T,

    /// Spin components with a magnitude at or below this are degenerate
    pub min_spin: T,

    /// Angular velocity that maps to full throttle
    pub max_angular_velocity: T,

    /// Singular values below `rcond * largest` are dropped from the pseudo-inverse
    pub rcond: T,

    pub degenerate_policy: DegeneratePolicy,
}

impl<T: RealField + Copy> Default for AllocationConfig<T> {
    fn default() -> Self {
        Self::new(PhysicalConstants::default(), Layout::reference())
    }
}

impl<T: RealField + Copy> AllocationConfig<T> {
    pub fn new(constants: PhysicalConstants<T>, layout: Layout) -> Self {
        Self {
            constants,
            layout,
            filter_gain: convert(0.1),
            min_spin: convert(1e-9),
            max_angular_velocity: convert(15000.),
            rcond: convert(1e-15),
            degenerate_policy: DegeneratePolicy::Hold,
        }
    }

    pub fn with_filter_gain(mut self, filter_gain: T) -> Self {
        self.filter_gain = filter_gain;
        self
    }

    pub fn with_degenerate_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.degenerate_policy = policy;
        self
    }
}
