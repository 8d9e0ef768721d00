//! Runge–Kutta solvers.

use lazy_static::lazy_static;
use log::trace;
use ndarray::prelude::*;
use ndarray::{s, NdFloat};
use std::marker::PhantomData;

use crate::config::check_fixed_step;
use crate::{cast, Error, OdeIntegrate, Stats};

/// Calls `fun` and checks that the derivative has the same length as the
/// state.
pub(crate) fn evaluate<A, F>(
    fun: &F,
    t: A,
    y: ArrayView1<A>,
    stats: &mut Stats,
) -> Result<Array1<A>, Error>
where
    A: NdFloat,
    F: Fn(A, ArrayView1<A>) -> Array1<A>,
{
    let dy = fun(t, y);
    stats.fn_evals += 1;
    if dy.len() != y.len() {
        return Err(Error::InvalidDimension {
            expected: y.len(),
            found: dy.len(),
        });
    }
    Ok(dy)
}

/// Tableau of an explicit method converted to the working precision, plus
/// storage for its stage derivatives.
pub(crate) struct Stages<A> {
    c: Array1<A>,
    a: Vec<Array1<A>>,
    /// Stage derivatives, shape `(NUM_STAGES, n)`.
    k: Array2<A>,
}

impl<A: NdFloat> Stages<A> {
    pub(crate) fn new<M: RkMethod>(len: usize) -> Stages<A> {
        Stages {
            c: M::c().mapv(cast),
            a: M::a().iter().map(|row| row.mapv(cast)).collect(),
            k: Array2::zeros((M::NUM_STAGES, len)),
        }
    }

    /// Evaluates every stage of a step of size `h` from `(t, y)`.
    pub(crate) fn compute<F>(
        &mut self,
        fun: &F,
        t: A,
        y: ArrayView1<A>,
        h: A,
        stats: &mut Stats,
    ) -> Result<(), Error>
    where
        F: Fn(A, ArrayView1<A>) -> Array1<A>,
    {
        let k1 = evaluate(fun, t, y, stats)?;
        self.k.row_mut(0).assign(&k1);
        for (i, (a, &c)) in self.a.iter().zip(self.c.iter()).enumerate() {
            let dy = weighted_sum(self.k.slice(s![..i + 1, ..]), a.view()) * h;
            let ki = evaluate(fun, t + c * h, (dy + &y).view(), stats)?;
            self.k.row_mut(i + 1).assign(&ki);
        }
        Ok(())
    }

    /// Returns `y + h * sum(weights[i] * k[i])` for the last computed stages.
    pub(crate) fn combine(&self, y: ArrayView1<A>, weights: ArrayView1<A>, h: A) -> Array1<A> {
        weighted_sum(self.k.view(), weights) * h + &y
    }
}

/// Sums the rows of `k` weighted by `weights`, one row at a time.
///
/// Each component is accumulated in stage order, so the result for a
/// component does not depend on how many components the state has.
fn weighted_sum<A: NdFloat>(k: ArrayView2<A>, weights: ArrayView1<A>) -> Array1<A> {
    debug_assert_eq!(k.nrows(), weights.len());
    let mut sum = Array1::zeros(k.ncols());
    for (row, &w) in k.outer_iter().zip(weights) {
        sum.scaled_add(w, &row);
    }
    sum
}

/// Fixed-step explicit Runge–Kutta solver.
pub struct RungeKutta<F, A, M>
where
    F: Fn(A, ArrayView1<A>) -> Array1<A>,
    A: NdFloat,
    M: RkMethod,
{
    fun: F,
    method: PhantomData<M>,
    /// Current time.
    t: A,
    /// Current state.
    y: Array1<A>,
    /// Step size; negative to integrate backwards.
    h: A,
    b: Array1<A>,
    stages: Stages<A>,
    stats: Stats,
}

impl<F, A, M> RungeKutta<F, A, M>
where
    F: Fn(A, ArrayView1<A>) -> Array1<A>,
    A: NdFloat,
    M: RkMethod,
{
    /// Creates a new fixed-step solver.
    ///
    /// # Parameters
    ///
    /// * `fun`: Right-hand side of the system; `fun(t, y)` returns the
    ///   derivative of `y` at time `t`.
    ///
    /// * `t0`: Initial value of the independent variable.
    ///
    /// * `y0`: Initial values of the dependent variable.
    ///
    /// * `h`: Step size. Its sign determines the direction of the
    ///   integration.
    pub fn new(fun: F, t0: A, y0: Array1<A>, h: A) -> Result<RungeKutta<F, A, M>, Error> {
        if y0.is_empty() {
            return Err(Error::EmptyState);
        }
        check_fixed_step(h)?;
        let len = y0.len();
        Ok(RungeKutta {
            fun,
            method: PhantomData,
            t: t0,
            y: y0,
            h,
            b: M::b().mapv(cast),
            stages: Stages::new::<M>(len),
            stats: Stats::default(),
        })
    }
}

impl<F, A, M> OdeIntegrate<A> for RungeKutta<F, A, M>
where
    F: Fn(A, ArrayView1<A>) -> Array1<A>,
    A: NdFloat,
    M: RkMethod,
{
    fn len(&self) -> usize {
        self.y.len()
    }

    fn step(&mut self) -> Result<A, Error> {
        self.stages
            .compute(&self.fun, self.t, self.y.view(), self.h, &mut self.stats)?;
        self.y = self.stages.combine(self.y.view(), self.b.view(), self.h);
        self.t += self.h;
        self.stats.accepted_steps += 1;
        trace!("{} step to t = {}", M::NAME, self.t);
        Ok(self.h)
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

pub trait RkMethod {
    /// Short name used in log messages.
    const NAME: &'static str;

    /// Order of the method.
    const ORDER: usize;

    /// Number of stages in the method.
    const NUM_STAGES: usize;

    /// Coefficients for incrementing time for consecutive RK stages, length
    /// `NUM_STAGES - 1`.
    ///
    /// The value for the first stage is always zero, so it is not included.
    fn c() -> ArrayView1<'static, f64>;

    /// Coefficients for combining previous RK stages to compute the next
    /// stage, length `NUM_STAGES - 1`.
    ///
    /// For explicit methods the coefficients above the main diagonal are
    /// zeros, so `a` is stored as a list of arrays of increasing lengths. The
    /// first stage is always just `f`, thus no coefficients for it are
    /// required.
    fn a() -> &'static [ArrayView1<'static, f64>];

    /// Coefficients for combining RK stages for computing the final
    /// prediction, length `NUM_STAGES`.
    fn b() -> ArrayView1<'static, f64>;
}

/// Method with a second, lower-order set of weights sharing the same stages.
pub trait EmbeddedRkMethod: RkMethod {
    /// Order of the embedded lower-order formula.
    const LOW_ORDER: usize;

    /// Coefficients of the lower-order prediction, length `NUM_STAGES`.
    fn b_low() -> ArrayView1<'static, f64>;
}

const NO_COEFFS: [f64; 0] = [];

/// Explicit (forward) Euler method, order 1.
pub struct Euler;

const EULER_B: [f64; 1] = [1.];

impl RkMethod for Euler {
    const NAME: &'static str = "Euler";

    const ORDER: usize = 1;

    const NUM_STAGES: usize = 1;

    fn c() -> ArrayView1<'static, f64> {
        aview1(&NO_COEFFS)
    }

    fn a() -> &'static [ArrayView1<'static, f64>] {
        &[]
    }

    fn b() -> ArrayView1<'static, f64> {
        aview1(&EULER_B)
    }
}

/// Heun's method (improved Euler), order 2.
///
/// An Euler predictor followed by a trapezoidal corrector.
pub struct Heun;

const HEUN_C: [f64; 1] = [1.];
const HEUN_A1: [f64; 1] = [1.];
const HEUN_B: [f64; 2] = [1. / 2., 1. / 2.];

impl RkMethod for Heun {
    const NAME: &'static str = "Heun";

    const ORDER: usize = 2;

    const NUM_STAGES: usize = 2;

    fn c() -> ArrayView1<'static, f64> {
        aview1(&HEUN_C)
    }

    fn a() -> &'static [ArrayView1<'static, f64>] {
        lazy_static! {
            static ref A: [ArrayView1<'static, f64>; 2 - 1] = [aview1(&HEUN_A1)];
        }
        &*A
    }

    fn b() -> ArrayView1<'static, f64> {
        aview1(&HEUN_B)
    }
}

/// Classical Runge–Kutta method, order 4.
pub struct Rk4;

const RK4_C: [f64; 3] = [1. / 2., 1. / 2., 1.];
const RK4_A1: [f64; 1] = [1. / 2.];
const RK4_A2: [f64; 2] = [0., 1. / 2.];
const RK4_A3: [f64; 3] = [0., 0., 1.];
const RK4_B: [f64; 4] = [1. / 6., 1. / 3., 1. / 3., 1. / 6.];

impl RkMethod for Rk4 {
    const NAME: &'static str = "RK4";

    const ORDER: usize = 4;

    const NUM_STAGES: usize = 4;

    fn c() -> ArrayView1<'static, f64> {
        aview1(&RK4_C)
    }

    fn a() -> &'static [ArrayView1<'static, f64>] {
        lazy_static! {
            static ref A: [ArrayView1<'static, f64>; 4 - 1] =
                [aview1(&RK4_A1), aview1(&RK4_A2), aview1(&RK4_A3)];
        }
        &*A
    }

    fn b() -> ArrayView1<'static, f64> {
        aview1(&RK4_B)
    }
}

/// Explicit Runge–Kutta method of order 4(5).
///
/// The Fehlberg pair of formulas is used (ref 1). Steps are taken with the
/// 5th order formula and the difference to the embedded 4th order formula is
/// used as the error estimate.
///
/// # References
///
/// 1. E. Fehlberg, "Low-order classical Runge-Kutta formulas with stepsize
///    control and their application to some heat transfer problems", NASA
///    Technical Report R-315, 1969.
pub struct Rkf45;

const RKF45_C: [f64; 5] = [1. / 4., 3. / 8., 12. / 13., 1., 1. / 2.];
const RKF45_A1: [f64; 1] = [1. / 4.];
const RKF45_A2: [f64; 2] = [3. / 32., 9. / 32.];
const RKF45_A3: [f64; 3] = [1932. / 2197., -7200. / 2197., 7296. / 2197.];
const RKF45_A4: [f64; 4] = [439. / 216., -8., 3680. / 513., -845. / 4104.];
const RKF45_A5: [f64; 5] = [-8. / 27., 2., -3544. / 2565., 1859. / 4104., -11. / 40.];
const RKF45_B: [f64; 6] = [
    16. / 135.,
    0.,
    6656. / 12825.,
    28561. / 56430.,
    -9. / 50.,
    2. / 55.,
];
const RKF45_B_LOW: [f64; 6] = [25. / 216., 0., 1408. / 2565., 2197. / 4104., -1. / 5., 0.];

impl RkMethod for Rkf45 {
    const NAME: &'static str = "RKF45";

    const ORDER: usize = 5;

    const NUM_STAGES: usize = 6;

    fn c() -> ArrayView1<'static, f64> {
        aview1(&RKF45_C)
    }

    fn a() -> &'static [ArrayView1<'static, f64>] {
        lazy_static! {
            static ref A: [ArrayView1<'static, f64>; 6 - 1] = [
                aview1(&RKF45_A1),
                aview1(&RKF45_A2),
                aview1(&RKF45_A3),
                aview1(&RKF45_A4),
                aview1(&RKF45_A5),
            ];
        }
        &*A
    }

    fn b() -> ArrayView1<'static, f64> {
        aview1(&RKF45_B)
    }
}

impl EmbeddedRkMethod for Rkf45 {
    const LOW_ORDER: usize = 4;

    fn b_low() -> ArrayView1<'static, f64> {
        aview1(&RKF45_B_LOW)
    }
}
