use num_traits::Num;

/// One-pole low pass filter state for a single tilt angle.
///
/// The first sample passes through unchanged, later samples move the output
/// toward the input by `gain` of the remaining difference.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum AngleFilter<T> {
    #[default]
    Unset,
    Running(T),
}

impl<T: Num + Copy> AngleFilter<T> {
    /// Apply one sample, returning the new state and the smoothed output.
    ///
    /// ```
    /// use overactuated::filter::AngleFilter;
    ///
    /// let (filter, first) = AngleFilter::Unset.step(40.0, 0.1);
    /// assert_eq!(first, 40.0);
    ///
    /// let (_, second) = filter.step(50.0, 0.1);
    /// assert_eq!(second, 41.0);
    /// ```
    pub fn step(self, sample: T, gain: T) -> (Self, T) {
        let output = match self {
            AngleFilter::Unset => sample,
            AngleFilter::Running(previous) => previous + gain * (sample - previous),
        };
        (AngleFilter::Running(output), output)
    }

    /// The current output, if a sample has been applied.
    pub fn output(&self) -> Option<T> {
        match self {
            AngleFilter::Unset => None,
            AngleFilter::Running(value) => Some(*value),
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, AngleFilter::Running(_))
    }
}

/// Pitch-like and roll-like tilt filters of one effector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TiltFilter<T> {
    pub alpha: AngleFilter<T>,
    pub beta: AngleFilter<T>,
}

impl<T> Default for TiltFilter<T> {
    fn default() -> Self {
        Self {
            alpha: AngleFilter::Unset,
            beta: AngleFilter::Unset,
        }
    }
}

impl<T: Num + Copy> TiltFilter<T> {
    /// Filter a pair of raw angles, returning the smoothed pair.
    pub fn apply(&mut self, alpha: T, beta: T, gain: T) -> (T, T) {
        let (alpha_filter, alpha) = self.alpha.step(alpha, gain);
        let (beta_filter, beta) = self.beta.step(beta, gain);
        self.alpha = alpha_filter;
        self.beta = beta_filter;
        (alpha, beta)
    }

    /// The last smoothed pair, leaving the state untouched.
    pub fn hold(&self) -> (Option<T>, Option<T>) {
        (self.alpha.output(), self.beta.output())
    }
}

/// Independent tilt filters, one per effector.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterBank<T> {
    filters: Vec<TiltFilter<T>>,
}

impl<T: Num + Copy> FilterBank<T> {
    pub fn new(effectors: usize) -> Self {
        Self {
            filters: vec![TiltFilter::default(); effectors],
        }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn get(&self, effector: usize) -> Option<&TiltFilter<T>> {
        self.filters.get(effector)
    }

    pub fn get_mut(&mut self, effector: usize) -> Option<&mut TiltFilter<T>> {
        self.filters.get_mut(effector)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TiltFilter<T>> {
        self.filters.iter_mut()
    }

    /// Return every filter to its unset state.
    pub fn reset(&mut self) {
        for filter in &mut self.filters {
            *filter = TiltFilter::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AngleFilter, FilterBank};
    use approx::assert_relative_eq;

    #[test]
    fn first_sample_passes_through() {
        let (filter, output) = AngleFilter::Unset.step(123.456_f64, 0.1);
        assert_eq!(output, 123.456);
        assert_eq!(filter, AngleFilter::Running(123.456));
    }

    #[test]
    fn converges_geometrically() {
        let target = 90.0_f64;
        let (mut filter, first) = AngleFilter::Unset.step(10.0, 0.1);
        let initial_error = (first - target).abs();

        let mut last_error = initial_error;
        for t in 1..50 {
            let (next, output) = filter.step(target, 0.1);
            filter = next;

            let error = (output - target).abs();
            assert!(error < last_error);
            assert_relative_eq!(error, 0.9_f64.powi(t) * initial_error, max_relative = 1e-9);
            last_error = error;
        }
    }

    #[test]
    fn constant_input_is_fixed_point() {
        let (mut filter, _) = AngleFilter::Unset.step(33.0_f64, 0.1);
        for _ in 0..10 {
            let (next, output) = filter.step(33.0, 0.1);
            assert_eq!(output, 33.0);
            filter = next;
        }
    }

    #[test]
    fn bank_filters_are_independent() {
        let mut bank = FilterBank::<f64>::new(3);
        assert_eq!(bank.len(), 3);

        bank.get_mut(1).unwrap().apply(10.0, 20.0, 0.1);
        assert_eq!(bank.get(0).unwrap().hold(), (None, None));
        assert_eq!(bank.get(1).unwrap().hold(), (Some(10.0), Some(20.0)));
        assert_eq!(bank.get(2).unwrap().hold(), (None, None));

        let (alpha, beta) = bank.get_mut(1).unwrap().apply(20.0, 20.0, 0.1);
        assert_eq!(alpha, 11.0);
        assert_eq!(beta, 20.0);

        bank.reset();
        assert!(!bank.get(1).unwrap().alpha.is_set());
        assert!(bank.get(3).is_none());
    }
}
