//! Adaptive Runge–Kutta–Fehlberg 4(5) solver.

use log::{trace, warn};
use ndarray::prelude::*;
use ndarray::NdFloat;

use crate::rk::{EmbeddedRkMethod, RkMethod, Rkf45, Stages};
use crate::{cast, to_f64, Error, FehlbergConfig, OdeIntegrate, Stats};

/// Outcome of the error test for one trial step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepDecision<A> {
    /// Keep the step. `growth` multiplies the step size for the next step;
    /// `None` when no component constrained the step at all.
    Accept { growth: Option<A> },
    /// Reject the step and retry with the step size multiplied by the factor.
    Shrink(A),
}

impl<A: NdFloat> StepDecision<A> {
    /// Decides on a trial step from its per-component error estimate.
    ///
    /// Each component with a nonzero error contributes
    /// `q = alpha * (budget / error)^(1/4)`; components with zero error do
    /// not constrain the step. The smallest `q` drives both the rejection
    /// (`q < 1`) and the growth factor.
    pub fn from_error(error: ArrayView1<A>, budget: A, alpha: A) -> StepDecision<A> {
        let quarter = cast::<A>(0.25);
        let q_min = error
            .iter()
            .filter(|&&err| err != A::zero())
            .map(|&err| alpha * (budget / err).powf(quarter))
            .fold(None, |min: Option<A>, q| match min {
                Some(m) if m <= q => Some(m),
                _ => Some(q),
            });
        match q_min {
            Some(q) if q < A::one() => StepDecision::Shrink(q),
            growth => StepDecision::Accept { growth },
        }
    }
}

/// Fails unless a step of `h` from `t` lands on a later time.
fn check_advances<A: NdFloat>(t: A, h: A) -> Result<(), Error> {
    if t + h > t {
        Ok(())
    } else {
        Err(Error::StepSizeUnderflow {
            t: to_f64(t),
            h: to_f64(h),
        })
    }
}

/// Runge–Kutta–Fehlberg ODE IVP solver.
///
/// Each step is retried with a smaller step size until the difference
/// between the 4th and 5th order predictions is within `tol * h` for every
/// component; the 5th order prediction is kept.
pub struct Fehlberg<F, A>
where
    F: Fn(A, ArrayView1<A>) -> Array1<A>,
    A: NdFloat,
{
    fun: F,
    /// Current time.
    t: A,
    /// Current state.
    y: Array1<A>,
    /// Trial step size for the next `.step()`.
    h: A,
    alpha: A,
    tol: A,
    max_retries: usize,
    b: Array1<A>,
    b_low: Array1<A>,
    stages: Stages<A>,
    /// `|y4 - y5|` of the last accepted step.
    error: Array1<A>,
    stats: Stats,
}

impl<F, A> Fehlberg<F, A>
where
    F: Fn(A, ArrayView1<A>) -> Array1<A>,
    A: NdFloat,
{
    /// Creates a new `Fehlberg` solver.
    ///
    /// # Parameters
    ///
    /// * `fun`: Right-hand side of the system; `fun(t, y)` returns the
    ///   derivative of `y` at time `t`. It may be called several times per
    ///   step with states that are later discarded.
    ///
    /// * `t0`: Initial value of the independent variable.
    ///
    /// * `y0`: Initial values of the dependent variable.
    ///
    /// * `config`: Initial step size, safety factor, tolerance and retry
    ///   limit. `config.num_steps` is ignored here; it is only used by the
    ///   trajectory functions.
    pub fn new(
        fun: F,
        t0: A,
        y0: Array1<A>,
        config: &FehlbergConfig<A>,
    ) -> Result<Fehlberg<F, A>, Error> {
        if y0.is_empty() {
            return Err(Error::EmptyState);
        }
        config.validate_parameters()?;
        check_advances(t0, config.h)?;

        let len = y0.len();
        Ok(Fehlberg {
            fun,
            t: t0,
            y: y0,
            h: config.h,
            alpha: config.alpha,
            tol: config.tol,
            max_retries: config.max_retries,
            b: Rkf45::b().mapv(cast),
            b_low: Rkf45::b_low().mapv(cast),
            stages: Stages::new::<Rkf45>(len),
            error: Array1::zeros(len),
            stats: Stats::default(),
        })
    }

    /// Error estimate `|y4 - y5|` of the last accepted step, zero before the
    /// first step.
    pub fn error_estimate(&self) -> ArrayView1<'_, A> {
        self.error.view()
    }
}

impl<F, A> OdeIntegrate<A> for Fehlberg<F, A>
where
    F: Fn(A, ArrayView1<A>) -> Array1<A>,
    A: NdFloat,
{
    fn len(&self) -> usize {
        self.y.len()
    }

    fn step(&mut self) -> Result<A, Error> {
        let mut h = self.h;
        let mut retries = 0;
        loop {
            if let Err(err) = check_advances(self.t, h) {
                warn!("RKF45 step size {} underflowed at t = {}", h, self.t);
                return Err(err);
            }
            self.stages
                .compute(&self.fun, self.t, self.y.view(), h, &mut self.stats)?;
            let y_new = self.stages.combine(self.y.view(), self.b.view(), h);
            let y_low = self.stages.combine(self.y.view(), self.b_low.view(), h);
            let error = (y_low - &y_new).mapv(|e| e.abs());
            if error.iter().any(|e| !e.is_finite()) {
                return Err(Error::NonFiniteErrorEstimate { t: to_f64(self.t) });
            }

            match StepDecision::from_error(error.view(), self.tol * h, self.alpha) {
                StepDecision::Shrink(q) => {
                    self.stats.rejected_steps += 1;
                    if retries == self.max_retries {
                        warn!(
                            "RKF45 step at t = {} rejected {} times, last trial h = {}",
                            self.t,
                            retries + 1,
                            h
                        );
                        return Err(Error::StepRetryLimitExceeded {
                            t: to_f64(self.t),
                            retries,
                        });
                    }
                    retries += 1;
                    trace!("RKF45 rejected h = {} at t = {}, shrinking by {}", h, self.t, q);
                    h *= q;
                }
                StepDecision::Accept { growth } => {
                    self.t += h;
                    self.y = y_new;
                    self.error = error;
                    self.h = match growth {
                        Some(q) => h * q,
                        None => h,
                    };
                    self.stats.accepted_steps += 1;
                    return Ok(h);
                }
            }
        }
    }

    fn time(&self) -> A {
        self.t
    }

    fn state(&self) -> ArrayView1<'_, A> {
        self.y.view()
    }

    fn step_size(&self) -> A {
        self.h
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}
