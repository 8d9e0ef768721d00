pub mod config;
pub mod error;
pub mod fehlberg;
pub mod rk;
pub mod trajectory;

pub use config::{FehlbergConfig, FixedStepConfig};
pub use error::Error;
pub use fehlberg::{Fehlberg, StepDecision};
pub use rk::{EmbeddedRkMethod, Euler, Heun, Rk4, RkMethod, Rkf45, RungeKutta};
pub use trajectory::{
    euler, euler_system, heun, heun_system, rk4, rk4_system, rkf45, rkf45_system, Stats,
    Trajectory,
};

use log::debug;
use ndarray::prelude::*;
use ndarray::NdFloat;
use num_traits::NumCast;

pub trait OdeIntegrate<A: NdFloat> {
    /// Returns the number of elements in the state.
    fn len(&self) -> usize;
    /// Perform one committed step, returning the step size that was taken.
    fn step(&mut self) -> Result<A, Error>;
    /// Current time.
    fn time(&self) -> A;
    /// Current state.
    fn state(&self) -> ArrayView1<'_, A>;
    /// Step size the next call to `.step()` will try first.
    fn step_size(&self) -> A;
    /// Counters accumulated since the integrator was created.
    fn stats(&self) -> &Stats;
    /// Take `num_steps - 1` steps and record every point, including the
    /// current one as entry 0.
    fn run(&mut self, num_steps: usize) -> Result<Trajectory<A, Ix2>, Error> {
        config::check_step_count(num_steps)?;
        let mut t = Array1::zeros(num_steps);
        let mut y = Array2::zeros((num_steps, self.len()));
        let mut h = Array1::zeros(num_steps);
        t[0] = self.time();
        y.row_mut(0).assign(&self.state());
        for n in 1..num_steps {
            h[n - 1] = self.step()?;
            t[n] = self.time();
            y.row_mut(n).assign(&self.state());
        }
        h[num_steps - 1] = self.step_size();

        let stats = self.stats().clone();
        debug!(
            "integrated {} steps to t = {}: {} evaluations, {} rejected trials",
            num_steps - 1,
            t[num_steps - 1],
            stats.fn_evals,
            stats.rejected_steps,
        );
        Ok(Trajectory { t, y, h, stats })
    }
}

/// Converts an `f64` constant to the working precision.
pub(crate) fn cast<A: NdFloat>(x: f64) -> A {
    <A as NumCast>::from(x).unwrap_or_else(A::nan)
}

/// Converts a working-precision value to `f64` for error reporting.
pub(crate) fn to_f64<A: NdFloat>(x: A) -> f64 {
    x.to_f64().unwrap_or(::std::f64::NAN)
}
