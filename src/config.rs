//! Step parameters for the integrators.

use ndarray::NdFloat;

use crate::{cast, to_f64, Error};

pub(crate) fn check_step_count(num_steps: usize) -> Result<(), Error> {
    if num_steps < 2 {
        return Err(Error::InvalidStepCount(num_steps));
    }
    Ok(())
}

/// A fixed step may have either sign, or be zero, but must be finite.
pub(crate) fn check_fixed_step<A: NdFloat>(h: A) -> Result<(), Error> {
    if !h.is_finite() {
        return Err(Error::InvalidStepSize(to_f64(h)));
    }
    Ok(())
}

/// Parameters of a fixed-step run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedStepConfig<A> {
    /// Number of points in the trajectory, including the initial one.
    pub num_steps: usize,
    /// Step size. May be negative to integrate backwards.
    pub h: A,
}

impl<A: NdFloat> FixedStepConfig<A> {
    pub fn new(num_steps: usize, h: A) -> Self {
        FixedStepConfig { num_steps, h }
    }

    pub fn with_num_steps(mut self, num_steps: usize) -> Self {
        self.num_steps = num_steps;
        self
    }

    pub fn with_step(mut self, h: A) -> Self {
        self.h = h;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        check_step_count(self.num_steps)?;
        check_fixed_step(self.h)
    }
}

impl<A: NdFloat> Default for FixedStepConfig<A> {
    fn default() -> Self {
        FixedStepConfig {
            num_steps: 100,
            h: cast(0.01),
        }
    }
}

/// Parameters of an adaptive Runge–Kutta–Fehlberg run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FehlbergConfig<A> {
    /// Number of points in the trajectory, including the initial one.
    pub num_steps: usize,
    /// Initial step size, strictly positive.
    pub h: A,
    /// Safety factor applied to every step-size update.
    pub alpha: A,
    /// Absolute error tolerance per unit step; a step of size `h` may carry
    /// an estimated error of up to `tol * h`.
    pub tol: A,
    /// Rejections allowed for a single step before giving up.
    pub max_retries: usize,
}

impl<A: NdFloat> FehlbergConfig<A> {
    pub fn new(num_steps: usize, h: A) -> Self {
        FehlbergConfig {
            num_steps,
            h,
            ..Default::default()
        }
    }

    pub fn with_num_steps(mut self, num_steps: usize) -> Self {
        self.num_steps = num_steps;
        self
    }

    pub fn with_step(mut self, h: A) -> Self {
        self.h = h;
        self
    }

    pub fn with_alpha(mut self, alpha: A) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_tol(mut self, tol: A) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        check_step_count(self.num_steps)?;
        self.validate_parameters()
    }

    /// Checks everything except `num_steps`: the step size, safety factor
    /// and tolerance.
    pub fn validate_parameters(&self) -> Result<(), Error> {
        if !(self.h.is_finite() && self.h > A::zero()) {
            return Err(Error::InvalidStepSize(to_f64(self.h)));
        }
        if !(self.alpha.is_finite() && self.alpha > A::zero()) {
            return Err(Error::InvalidSafetyFactor(to_f64(self.alpha)));
        }
        if !(self.tol.is_finite() && self.tol > A::zero()) {
            return Err(Error::InvalidTolerance(to_f64(self.tol)));
        }
        Ok(())
    }
}

impl<A: NdFloat> Default for FehlbergConfig<A> {
    fn default() -> Self {
        FehlbergConfig {
            num_steps: 100,
            h: cast(0.01),
            alpha: cast(0.9),
            tol: cast(1e-3),
            max_retries: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let fixed = FixedStepConfig::<f64>::default();
        assert_eq!(fixed.num_steps, 100);
        assert_eq!(fixed.h, 0.01);

        let adaptive = FehlbergConfig::<f64>::default();
        assert_eq!(adaptive.num_steps, 100);
        assert_eq!(adaptive.h, 0.01);
        assert_eq!(adaptive.alpha, 0.9);
        assert_eq!(adaptive.tol, 1e-3);
        assert!(adaptive.validate().is_ok());

        let single = FehlbergConfig::<f32>::default();
        assert_eq!(single.alpha, 0.9f32);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert_eq!(
            FixedStepConfig::new(1, 0.1).validate(),
            Err(Error::InvalidStepCount(1))
        );
        assert!(FixedStepConfig::new(10, -0.1).validate().is_ok());
        assert!(FixedStepConfig::new(10, ::std::f64::NAN).validate().is_err());

        let config = FehlbergConfig::new(10, 0.1);
        assert_eq!(
            config.with_step(-0.1).validate(),
            Err(Error::InvalidStepSize(-0.1))
        );
        assert_eq!(
            config.with_alpha(0.).validate(),
            Err(Error::InvalidSafetyFactor(0.))
        );
        assert_eq!(
            config.with_tol(-1e-3).validate(),
            Err(Error::InvalidTolerance(-1e-3))
        );
        assert_eq!(
            config.with_num_steps(0).validate(),
            Err(Error::InvalidStepCount(0))
        );
    }
}
