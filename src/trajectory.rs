//! Recorded solutions and the one-call entry points for each method.
//!
//! The `*_system` functions integrate a system `y' = f(t, y)` with `y` an
//! `Array1`; the plain functions integrate a single equation. Scalar problems
//! run through the same code as a one-component system, so both give
//! identical numbers.

use ndarray::prelude::*;
use ndarray::{Dimension, NdFloat};

use crate::rk::{Euler, Heun, Rk4, RkMethod, RungeKutta};
use crate::{Error, Fehlberg, FehlbergConfig, FixedStepConfig, OdeIntegrate};

/// Integration statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    /// Number of calls to the derivative function.
    pub fn_evals: u64,
    /// Number of committed steps.
    pub accepted_steps: u64,
    /// Number of trial steps that were thrown away.
    pub rejected_steps: u64,
}

/// Points produced by one integration run.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory<A, D: Dimension> {
    /// Time samples.
    pub t: Array1<A>,
    /// State samples; row `k` belongs to `t[k]`.
    pub y: Array<A, D>,
    /// Step sizes: `h[k]` took the solution from `t[k]` to `t[k + 1]`, and
    /// the last entry is the step that would be tried next.
    pub h: Array1<A>,
    pub stats: Stats,
}

impl<A, D: Dimension> Trajectory<A, D> {
    /// Number of recorded points.
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}

impl<A: NdFloat> Trajectory<A, Ix2> {
    /// Drops the component axis of a one-component trajectory.
    fn into_scalar(self) -> Trajectory<A, Ix1> {
        Trajectory {
            y: self.y.index_axis_move(Axis(1), 0),
            t: self.t,
            h: self.h,
            stats: self.stats,
        }
    }
}

fn fixed_step<M, A, F>(
    fun: F,
    y0: Array1<A>,
    t0: A,
    config: &FixedStepConfig<A>,
) -> Result<Trajectory<A, Ix2>, Error>
where
    M: RkMethod,
    A: NdFloat,
    F: Fn(A, ArrayView1<A>) -> Array1<A>,
{
    RungeKutta::<F, A, M>::new(fun, t0, y0, config.h)?.run(config.num_steps)
}

/// Integrates a system with the explicit Euler method.
pub fn euler_system<A, F>(
    fun: F,
    y0: Array1<A>,
    t0: A,
    config: &FixedStepConfig<A>,
) -> Result<Trajectory<A, Ix2>, Error>
where
    A: NdFloat,
    F: Fn(A, ArrayView1<A>) -> Array1<A>,
{
    fixed_step::<Euler, _, _>(fun, y0, t0, config)
}

/// Integrates a single equation with the explicit Euler method.
pub fn euler<A, G>(
    fun: G,
    y0: A,
    t0: A,
    config: &FixedStepConfig<A>,
) -> Result<Trajectory<A, Ix1>, Error>
where
    A: NdFloat,
    G: Fn(A, A) -> A,
{
    euler_system(move |t, y| arr1(&[fun(t, y[0])]), arr1(&[y0]), t0, config)
        .map(Trajectory::into_scalar)
}

/// Integrates a system with Heun's method.
pub fn heun_system<A, F>(
    fun: F,
    y0: Array1<A>,
    t0: A,
    config: &FixedStepConfig<A>,
) -> Result<Trajectory<A, Ix2>, Error>
where
    A: NdFloat,
    F: Fn(A, ArrayView1<A>) -> Array1<A>,
{
    fixed_step::<Heun, _, _>(fun, y0, t0, config)
}

/// Integrates a single equation with Heun's method.
pub fn heun<A, G>(
    fun: G,
    y0: A,
    t0: A,
    config: &FixedStepConfig<A>,
) -> Result<Trajectory<A, Ix1>, Error>
where
    A: NdFloat,
    G: Fn(A, A) -> A,
{
    heun_system(move |t, y| arr1(&[fun(t, y[0])]), arr1(&[y0]), t0, config)
        .map(Trajectory::into_scalar)
}

/// Integrates a system with the classical 4th order Runge–Kutta method.
pub fn rk4_system<A, F>(
    fun: F,
    y0: Array1<A>,
    t0: A,
    config: &FixedStepConfig<A>,
) -> Result<Trajectory<A, Ix2>, Error>
where
    A: NdFloat,
    F: Fn(A, ArrayView1<A>) -> Array1<A>,
{
    fixed_step::<Rk4, _, _>(fun, y0, t0, config)
}

/// Integrates a single equation with the classical 4th order Runge–Kutta
/// method.
pub fn rk4<A, G>(
    fun: G,
    y0: A,
    t0: A,
    config: &FixedStepConfig<A>,
) -> Result<Trajectory<A, Ix1>, Error>
where
    A: NdFloat,
    G: Fn(A, A) -> A,
{
    rk4_system(move |t, y| arr1(&[fun(t, y[0])]), arr1(&[y0]), t0, config)
        .map(Trajectory::into_scalar)
}

/// Integrates a system with the adaptive Runge–Kutta–Fehlberg 4(5) method.
///
/// `h` of the result holds the accepted step sizes, which generally differ
/// from `config.h`.
pub fn rkf45_system<A, F>(
    fun: F,
    y0: Array1<A>,
    t0: A,
    config: &FehlbergConfig<A>,
) -> Result<Trajectory<A, Ix2>, Error>
where
    A: NdFloat,
    F: Fn(A, ArrayView1<A>) -> Array1<A>,
{
    Fehlberg::new(fun, t0, y0, config)?.run(config.num_steps)
}

/// Integrates a single equation with the adaptive Runge–Kutta–Fehlberg 4(5)
/// method.
pub fn rkf45<A, G>(
    fun: G,
    y0: A,
    t0: A,
    config: &FehlbergConfig<A>,
) -> Result<Trajectory<A, Ix1>, Error>
where
    A: NdFloat,
    G: Fn(A, A) -> A,
{
    rkf45_system(move |t, y| arr1(&[fun(t, y[0])]), arr1(&[y0]), t0, config)
        .map(Trajectory::into_scalar)
}
