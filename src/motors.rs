use crate::{
    allocation::Allocator,
    config::AllocationConfig,
    kinematics::{EffectorSample, Kinematics, KinematicsExtractor},
    motor_matrix::EffectorModel,
    wrench::{Limit, PilotInput},
    Result,
};
use nalgebra::{DMatrix, RealField};

/// Control allocation for an over-actuated multicopter with tilting rotors.
///
/// Owns the effector model, its cached pseudo-inverse and the tilt filters.
///
/// ```
/// use overactuated::{wrench::{commands, Wrench}, OveractuatedMotors};
///
/// let mut motors = OveractuatedMotors::<f64>::reference().unwrap();
/// let hover = Wrench::new(0.1, 0.1, -0.9, 0.2, 0.3, 0.1);
/// let kinematics = motors.output(&commands(&[hover; 5])).unwrap();
///
/// assert_eq!(kinematics.steps(), 5);
/// assert_eq!(kinematics.effectors.len(), 4);
/// ```
#[derive(Clone, Debug)]
pub struct OveractuatedMotors<T: RealField> {
    model: EffectorModel<T>,
    allocator: Allocator<T>,
    extractor: KinematicsExtractor<T>,
}

impl<T: RealField + Copy> OveractuatedMotors<T> {
    pub fn new(config: &AllocationConfig<T>) -> Result<Self> {
        let model = EffectorModel::new(&config.constants, &config.layout);
        let allocator = Allocator::new(&model, config.rcond)?;
        let extractor = KinematicsExtractor::new(model.effectors(), config);

        Ok(Self {
            model,
            allocator,
            extractor,
        })
    }

    /// The quad tilt-rotor with its reference configuration.
    pub fn reference() -> Result<Self> {
        Self::new(&AllocationConfig::default())
    }

    pub fn model(&self) -> &EffectorModel<T> {
        &self.model
    }

    pub fn allocator(&self) -> &Allocator<T> {
        &self.allocator
    }

    pub fn extractor(&self) -> &KinematicsExtractor<T> {
        &self.extractor
    }

    /// Allocate a `6 x T` batch of wrench commands, in time order.
    pub fn output(&mut self, commands: &DMatrix<T>) -> Result<Kinematics<T>> {
        let solution = self.allocator.solve(commands)?;
        self.extractor.extract(&solution)
    }

    /// Allocate a single step from the attitude controller inputs.
    pub fn output_pilot(
        &mut self,
        input: &PilotInput<T>,
    ) -> Result<(Vec<EffectorSample<T>>, Limit)> {
        let (wrench, limit) = input.wrench();
        let solution = self.allocator.solve_column(&wrench)?;
        let samples = self.extractor.step(&solution)?;
        Ok((samples, limit))
    }

    /// Clear the tilt filters, e.g. after disarming.
    pub fn reset(&mut self) {
        self.extractor.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::OveractuatedMotors;
    use crate::{
        config::AllocationConfig,
        wrench::{commands, PilotInput, Wrench},
        Error,
    };
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, Vector3};

    #[test]
    fn batches_continue_filter_state() {
        let mut motors = OveractuatedMotors::<f64>::reference().unwrap();
        let a = Wrench::new(0.1, 0.1, -0.9, 0.2, 0.3, 0.1);
        let b = Wrench::new(0.12, 0.09, -0.9, 0.2, 0.3, 0.1);

        let joined = motors.output(&commands(&[a, b])).unwrap();

        motors.reset();
        motors.output(&commands(&[a])).unwrap();
        let split = motors.output(&commands(&[b])).unwrap();

        for k in 0..4 {
            assert_relative_eq!(
                joined.effector(k).unwrap().alpha[1].unwrap(),
                split.effector(k).unwrap().alpha[0].unwrap(),
                epsilon = 1e-9
            );
        }
        assert_eq!(motors.extractor().steps(), 2);
    }

    #[test]
    fn wrong_command_rows() {
        let mut motors = OveractuatedMotors::<f64>::reference().unwrap();
        assert_eq!(
            motors.output(&DMatrix::zeros(3, 2)).unwrap_err(),
            Error::ShapeMismatch {
                expected: 6,
                found: 3
            }
        );
    }

    #[test]
    fn pilot_step() {
        let mut motors = OveractuatedMotors::new(&AllocationConfig::<f64>::default()).unwrap();
        let input = PilotInput {
            control: Vector3::new(0.1, -0.05, 0.02),
            throttle: 0.6,
            forward: 0.1,
            ..PilotInput::default()
        };

        let (samples, limit) = motors.output_pilot(&input).unwrap();
        assert_eq!(samples.len(), 4);
        assert!(!limit.throttle_lower && !limit.throttle_upper);
        for sample in samples {
            assert!(sample.angular_velocity > 0.);
            assert!((0. ..=1.).contains(&sample.throttle));
            let alpha = sample.alpha.unwrap();
            assert!((0. ..180.).contains(&alpha));
        }
    }
}
