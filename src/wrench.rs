//! Wrench commands and their construction from attitude controller inputs.

use nalgebra::{DMatrix, Matrix3, RealField, Vector3, Vector6};

/// Force x/y/z followed by moment x/y/z.
pub type Wrench<T> = Vector6<T>;

pub const FORWARD: usize = 0;
pub const RIGHT: usize = 1;
pub const THROTTLE: usize = 2;
pub const ROLL: usize = 3;
pub const PITCH: usize = 4;
pub const YAW: usize = 5;

/// Stack wrench commands as the columns of a `6 x T` batch, in time order.
pub fn commands<T: RealField + Copy>(wrenches: &[Wrench<T>]) -> DMatrix<T> {
    DMatrix::from_fn(6, wrenches.len(), |axis, step| wrenches[step][axis])
}

/// Flags set when an input had to be constrained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Limit {
    pub roll: bool,
    pub pitch: bool,
    pub yaw: bool,
    pub throttle_lower: bool,
    pub throttle_upper: bool,
}

/// Inputs from the attitude and position controllers for one output step.
#[derive(Clone, Copy, Debug)]
pub struct PilotInput<T> {
    /// Roll, pitch and yaw control in -1 ~ +1
    pub control: Vector3<T>,
    /// Roll, pitch and yaw feed forward in -1 ~ +1
    pub feed_forward: Vector3<T>,
    /// Throttle in 0 ~ 1
    pub throttle: T,
    /// Forward input in -1 ~ +1, in the frame of a level copter
    pub forward: T,
    /// Lateral input in -1 ~ +1, in the frame of a level copter
    pub lateral: T,
    /// Body roll offset from the thrust frame (rad)
    pub roll_offset: T,
    /// Body pitch offset from the thrust frame (rad)
    pub pitch_offset: T,
    /// Battery voltage and air pressure compensation
    pub compensation_gain: T,
}

impl<T: RealField + Copy> Default for PilotInput<T> {
    fn default() -> Self {
        Self {
            control: Vector3::zeros(),
            feed_forward: Vector3::zeros(),
            throttle: T::zero(),
            forward: T::zero(),
            lateral: T::zero(),
            roll_offset: T::zero(),
            pitch_offset: T::zero(),
            compensation_gain: T::one(),
        }
    }
}

impl<T: RealField + Copy> PilotInput<T> {
    /// Convert the controller inputs into a body frame wrench command.
    ///
    /// Horizontal thrust is scaled by throttle so lean angle stays proportional to
    /// acceleration, as on a conventional copter.
    ///
    /// ```
    /// use overactuated::wrench::PilotInput;
    ///
    /// let input = PilotInput { throttle: 0.5, forward: 0.2, ..PilotInput::<f64>::default() };
    /// let (wrench, limit) = input.wrench();
    ///
    /// assert_eq!(wrench[0], 0.1);
    /// assert_eq!(wrench[2], 0.5);
    /// assert!(!limit.throttle_upper);
    /// ```
    pub fn wrench(&self) -> (Wrench<T>, Limit) {
        let mut limit = Limit::default();

        let rpy_thrust = (self.control + self.feed_forward) * self.compensation_gain;
        let mut throttle_thrust = self.throttle * self.compensation_gain;

        let forward_thrust = self.forward * throttle_thrust;
        let lateral_thrust = self.lateral * throttle_thrust;

        // Downward thrust is possible but breaks assumptions further up the control stack
        if throttle_thrust <= T::zero() {
            throttle_thrust = T::zero();
            limit.throttle_lower = true;
        }
        if throttle_thrust >= T::one() {
            throttle_thrust = T::one();
            limit.throttle_upper = true;
        }

        let thrust = euler_312(self.roll_offset, self.pitch_offset)
            * Vector3::new(forward_thrust, lateral_thrust, throttle_thrust);

        let wrench = Wrench::new(
            thrust.x,
            thrust.y,
            thrust.z,
            rpy_thrust.x,
            rpy_thrust.y,
            rpy_thrust.z,
        );

        log::trace!("pilot input -> wrench {:?}", wrench.as_slice());
        (wrench, limit)
    }
}

/// Rotation for a 3-1-2 Euler sequence with zero yaw.
fn euler_312<T: RealField + Copy>(roll: T, pitch: T) -> Matrix3<T> {
    let (s1, c1) = roll.sin_cos();
    let (s2, c2) = pitch.sin_cos();

    Matrix3::new(
        c2,
        T::zero(),
        s2,
        s1 * s2,
        c1,
        -c2 * s1,
        -c1 * s2,
        s1,
        c1 * c2,
    )
}
