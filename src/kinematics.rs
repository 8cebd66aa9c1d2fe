//! Spin rate and smoothed tilt angles of each effector from solved thrust vectors.

use crate::{
    config::{AllocationConfig, DegeneratePolicy},
    constrain,
    filter::FilterBank,
    motor_matrix::EFFECTOR_COMPONENTS,
    Error, Result,
};
use nalgebra::{convert, DMatrix, DVector, RealField};

/// Wrap a thrust component ratio into `[0, π)` and convert it to degrees.
///
/// ```
/// use overactuated::kinematics::normalize_angle;
///
/// assert_eq!(normalize_angle(0.0_f64), 0.0);
/// assert!((normalize_angle(-0.5_f64) - 151.35211).abs() < 1e-4);
/// ```
pub fn normalize_angle<T: RealField + Copy>(ratio: T) -> T {
    let pi = T::pi();
    let half_turn: T = convert(180.0);

    let mut wrapped = ratio % pi;
    if wrapped < T::zero() {
        wrapped += pi;
    }

    // A tiny negative remainder plus π can round up to a full half turn
    let degrees = wrapped * (half_turn / pi);
    if degrees >= half_turn {
        degrees - half_turn
    } else {
        degrees
    }
}

/// Output of one effector for one time step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectorSample<T> {
    /// Spin rate magnitude, the square root of the absolute spin component
    pub angular_velocity: T,
    /// Spin rate normalized to the motor range, 0 ~ 1
    pub throttle: T,
    /// Smoothed pitch-like tilt in degrees, `None` until a valid sample has been seen
    pub alpha: Option<T>,
    /// Smoothed roll-like tilt in degrees, `None` until a valid sample has been seen
    pub beta: Option<T>,
    /// The spin component vanished and the angles were held
    pub degenerate: bool,
}

/// Time series of one effector over a batch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectorSeries<T> {
    pub angular_velocity: Vec<T>,
    pub throttle: Vec<T>,
    pub alpha: Vec<Option<T>>,
    pub beta: Vec<Option<T>>,
    /// Batch steps whose angles were held because the spin component vanished
    pub degenerate: Vec<usize>,
}

impl<T: Copy> EffectorSeries<T> {
    fn with_capacity(steps: usize) -> Self {
        Self {
            angular_velocity: Vec::with_capacity(steps),
            throttle: Vec::with_capacity(steps),
            alpha: Vec::with_capacity(steps),
            beta: Vec::with_capacity(steps),
            degenerate: Vec::new(),
        }
    }

    fn push(&mut self, step: usize, sample: &EffectorSample<T>) {
        self.angular_velocity.push(sample.angular_velocity);
        self.throttle.push(sample.throttle);
        self.alpha.push(sample.alpha);
        self.beta.push(sample.beta);
        if sample.degenerate {
            self.degenerate.push(step);
        }
    }

    pub fn len(&self) -> usize {
        self.angular_velocity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angular_velocity.is_empty()
    }

    /// The sample recorded at batch step `step`.
    pub fn sample(&self, step: usize) -> Option<EffectorSample<T>> {
        Some(EffectorSample {
            angular_velocity: *self.angular_velocity.get(step)?,
            throttle: *self.throttle.get(step)?,
            alpha: *self.alpha.get(step)?,
            beta: *self.beta.get(step)?,
            degenerate: self.degenerate.contains(&step),
        })
    }
}

/// Per effector output series of a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct Kinematics<T> {
    pub effectors: Vec<EffectorSeries<T>>,
}

impl<T: Copy> Kinematics<T> {
    pub fn effector(&self, k: usize) -> Option<&EffectorSeries<T>> {
        self.effectors.get(k)
    }

    pub fn steps(&self) -> usize {
        self.effectors.first().map_or(0, EffectorSeries::len)
    }

    /// Returns `true` if any effector held its angles during the batch.
    pub fn has_degenerate(&self) -> bool {
        self.effectors.iter().any(|series| !series.degenerate.is_empty())
    }
}

struct Raw<T> {
    angular_velocity: T,
    alpha: T,
    beta: T,
    degenerate: bool,
}

/// Stateful extractor of effector kinematics.
///
/// Each effector owns an independent pair of tilt filters that persists for the
/// lifetime of the extractor, so batches must be fed in time order.
#[derive(Clone, Debug)]
pub struct KinematicsExtractor<T> {
    filters: FilterBank<T>,
    filter_gain: T,
    min_spin: T,
    max_angular_velocity: T,
    policy: DegeneratePolicy,
    /// Time steps consumed so far
    steps: usize,
}

impl<T: RealField + Copy> KinematicsExtractor<T> {
    pub fn new(effectors: usize, config: &AllocationConfig<T>) -> Self {
        Self {
            filters: FilterBank::new(effectors),
            filter_gain: config.filter_gain,
            min_spin: config.min_spin,
            max_angular_velocity: config.max_angular_velocity,
            policy: config.degenerate_policy,
            steps: 0,
        }
    }

    pub fn effectors(&self) -> usize {
        self.filters.len()
    }

    pub fn filters(&self) -> &FilterBank<T> {
        &self.filters
    }

    /// Time steps consumed since construction or the last reset.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Forget all filter state.
    pub fn reset(&mut self) {
        self.filters.reset();
        self.steps = 0;
    }

    /// Process a `3E x T` solution batch column by column in time order.
    ///
    /// With [`DegeneratePolicy::Reject`] a degenerate sample fails the whole batch and
    /// the filter state is left as it was before the call.
    pub fn extract(&mut self, solution: &DMatrix<T>) -> Result<Kinematics<T>> {
        Error::check_rows(self.rows(), solution.nrows())?;

        let steps = solution.ncols();
        let snapshot = (self.filters.clone(), self.steps);
        let mut effectors = vec![EffectorSeries::with_capacity(steps); self.effectors()];

        for t in 0..steps {
            let samples = match self.advance(t, |row| solution[(row, t)]) {
                Ok(samples) => samples,
                Err(error) => {
                    (self.filters, self.steps) = snapshot;
                    return Err(error);
                }
            };

            for (series, sample) in effectors.iter_mut().zip(&samples) {
                series.push(t, sample);
            }
        }

        log::debug!("extracted {} steps for {} effectors", steps, self.effectors());
        Ok(Kinematics { effectors })
    }

    /// Process a single solution column.
    ///
    /// The column is a batch of one, so a rejected sample is reported at step 0.
    pub fn step(&mut self, column: &DVector<T>) -> Result<Vec<EffectorSample<T>>> {
        Error::check_rows(self.rows(), column.nrows())?;
        self.advance(0, |row| column[row])
    }

    fn rows(&self) -> usize {
        self.effectors() * EFFECTOR_COMPONENTS
    }

    /// Advance every filter by one sample; `step` is the column index within the batch.
    fn advance(
        &mut self,
        step: usize,
        component: impl Fn(usize) -> T,
    ) -> Result<Vec<EffectorSample<T>>> {
        let gain = self.filter_gain;
        let max_angular_velocity = self.max_angular_velocity;
        let raw: Vec<Raw<T>> = (0..self.effectors())
            .map(|k| self.raw(k, &component))
            .collect();

        if self.policy == DegeneratePolicy::Reject {
            if let Some(effector) = raw.iter().position(|raw| raw.degenerate) {
                return Err(Error::DegenerateSolution { effector, step });
            }
        }

        let samples = self
            .filters
            .iter_mut()
            .zip(raw)
            .enumerate()
            .map(|(k, (filter, raw))| {
                let (alpha, beta) = if raw.degenerate {
                    log::warn!(
                        "effector {} spin component vanished at step {}, holding tilt",
                        k,
                        step
                    );
                    filter.hold()
                } else {
                    let (alpha, beta) = filter.apply(raw.alpha, raw.beta, gain);
                    (Some(alpha), Some(beta))
                };

                EffectorSample {
                    angular_velocity: raw.angular_velocity,
                    throttle: throttle(raw.angular_velocity, max_angular_velocity),
                    alpha,
                    beta,
                    degenerate: raw.degenerate,
                }
            })
            .collect();

        log::trace!("processed step {} ({} overall)", step, self.steps);
        self.steps += 1;
        Ok(samples)
    }

    fn raw(&self, k: usize, component: &impl Fn(usize) -> T) -> Raw<T> {
        let offset = k * EFFECTOR_COMPONENTS;
        let a = component(offset);
        let b = component(offset + 1);
        let s = component(offset + 2);

        let angular_velocity = s.abs().sqrt();
        let alpha = a / s;
        let beta = b / s;

        let degenerate = s.abs() <= self.min_spin || !alpha.is_finite() || !beta.is_finite();
        if degenerate {
            return Raw {
                angular_velocity,
                alpha: T::zero(),
                beta: T::zero(),
                degenerate,
            };
        }

        Raw {
            angular_velocity,
            alpha: normalize_angle(alpha),
            beta: normalize_angle(beta),
            degenerate,
        }
    }
}

fn throttle<T: RealField + Copy>(angular_velocity: T, max_angular_velocity: T) -> T {
    // avoid divide by zero
    if max_angular_velocity <= T::zero() {
        return T::zero();
    }
    constrain(angular_velocity / max_angular_velocity, T::zero(), T::one())
}
