use approx::{assert_abs_diff_eq, assert_relative_eq};
use ndarray::prelude::*;
use ndarray::array;

use ndarray_odeint::rk::{Euler, Heun, Rk4, RkMethod, RungeKutta};
use ndarray_odeint::{
    euler, euler_system, heun, heun_system, rk4, rk4_system, Error, FixedStepConfig,
    OdeIntegrate,
};

fn decay(_t: f64, y: f64) -> f64 {
    -y
}

fn oscillator(_t: f64, r: ArrayView1<f64>) -> Array1<f64> {
    array![r[1], -r[0]]
}

/// Global error at `t = 1` for `y' = -y`, `y(0) = 1` with step `h`.
fn decay_error<F>(integrate: F, h: f64) -> f64
where
    F: Fn(&FixedStepConfig<f64>) -> Array1<f64>,
{
    let num_steps = (1. / h).round() as usize + 1;
    let y = integrate(&FixedStepConfig::new(num_steps, h));
    (y[num_steps - 1] - (-1f64).exp()).abs()
}

#[test]
fn decay_scenario() {
    let config = FixedStepConfig::new(11, 0.1);

    let sol = euler(decay, 1., 0., &config).unwrap();
    assert_eq!(sol.len(), 11);
    assert_abs_diff_eq!(sol.y[10], 0.9f64.powi(10), epsilon = 1e-12);
    assert_abs_diff_eq!(sol.t[10], 1., epsilon = 1e-12);

    let sol = rk4(decay, 1., 0., &config).unwrap();
    assert_abs_diff_eq!(sol.y[10], (-1f64).exp(), epsilon = 1e-4);
}

#[test]
fn trajectory_shape() {
    let config = FixedStepConfig::new(7, 0.25);
    let y0 = array![1., -2., 0.5];
    let fun = |t: f64, y: ArrayView1<f64>| y.mapv(|v| v * t);
    for sol in vec![
        euler_system(fun, y0.clone(), 2., &config).unwrap(),
        heun_system(fun, y0.clone(), 2., &config).unwrap(),
        rk4_system(fun, y0.clone(), 2., &config).unwrap(),
    ] {
        assert_eq!(sol.t.len(), 7);
        assert_eq!(sol.y.dim(), (7, 3));
        assert_eq!(sol.h, Array1::from_elem(7, 0.25));
        assert_eq!(sol.t[0], 2.);
        assert_eq!(sol.y.row(0), y0);
        for k in 0..6 {
            assert_eq!(sol.t[k + 1], sol.t[k] + 0.25);
        }
    }
}

#[test]
fn exponential_growth() {
    // y' = k y has the solution e^(k t).
    let k = 0.7;
    let config = FixedStepConfig::new(21, 0.05);
    let sol = rk4(move |_t: f64, y: f64| k * y, 1., 0., &config).unwrap();
    for (&t, &y) in sol.t.iter().zip(&sol.y) {
        assert_relative_eq!(y, (k * t).exp(), max_relative = 1e-7);
    }
}

/// Halving the step must shrink the global error by about `2^ORDER`.
fn check_convergence_order<M, F>(integrate: F)
where
    M: RkMethod,
    F: Fn(&FixedStepConfig<f64>) -> Array1<f64>,
{
    let expected = 2f64.powi(M::ORDER as i32);
    let errors: Vec<f64> = [0.1, 0.05, 0.025]
        .iter()
        .map(|&h| decay_error(&integrate, h))
        .collect();
    for pair in errors.windows(2) {
        let ratio = pair[0] / pair[1];
        assert!(
            (ratio / expected - 1.).abs() < 0.1,
            "{}: error ratio {}, expected about {}",
            M::NAME,
            ratio,
            expected
        );
    }
}

#[test]
fn euler_first_order_convergence() {
    check_convergence_order::<Euler, _>(|config| euler(decay, 1., 0., config).unwrap().y);
}

#[test]
fn heun_second_order_convergence() {
    check_convergence_order::<Heun, _>(|config| heun(decay, 1., 0., config).unwrap().y);
}

#[test]
fn rk4_fourth_order_convergence() {
    check_convergence_order::<Rk4, _>(|config| rk4(decay, 1., 0., config).unwrap().y);
}

#[test]
fn oscillator_period() {
    let n = 1000;
    let h = 2. * ::std::f64::consts::PI / n as f64;
    let sol = rk4_system(oscillator, array![1., 0.], 0., &FixedStepConfig::new(n + 1, h)).unwrap();
    let end = sol.y.row(n);
    assert_abs_diff_eq!(end[0], 1., epsilon = 1e-8);
    assert_abs_diff_eq!(end[1], 0., epsilon = 1e-8);
    assert_abs_diff_eq!(sol.t[n], 2. * ::std::f64::consts::PI, epsilon = 1e-10);
}

#[test]
fn backward_integration() {
    // Integrating y' = y from t = 0 to t = -1 gives e^-1.
    let config = FixedStepConfig::new(11, -0.1);
    let sol = rk4(|_t: f64, y: f64| y, 1., 0., &config).unwrap();
    assert_abs_diff_eq!(sol.t[10], -1., epsilon = 1e-12);
    assert_abs_diff_eq!(sol.y[10], (-1f64).exp(), epsilon = 1e-5);
    assert!(sol.t.windows(2).into_iter().all(|w| w[1] < w[0]));
}

#[test]
fn scalar_matches_one_component_system() {
    let config = FixedStepConfig::new(30, 0.1);
    let fun = |t: f64, y: f64| t.sin() - 0.5 * y * y;
    let scalar = heun(fun, 0.3, 1., &config).unwrap();
    let system = heun_system(
        |t: f64, y: ArrayView1<f64>| array![fun(t, y[0])],
        array![0.3],
        1.,
        &config,
    )
    .unwrap();
    assert_eq!(scalar.t, system.t);
    assert_eq!(scalar.y, system.y.column(0));
}

#[test]
fn single_precision() {
    let config = FixedStepConfig::new(11, 0.1f32);
    let sol = rk4(|_t: f32, y: f32| -y, 1f32, 0f32, &config).unwrap();
    assert_abs_diff_eq!(sol.y[10], (-1f32).exp(), epsilon = 1e-5);
}

#[test]
fn stepping_by_hand() {
    let mut solver = RungeKutta::<_, f64, Rk4>::new(oscillator, 0., array![1., 0.], 0.1).unwrap();
    assert_eq!(solver.len(), 2);
    assert_eq!(solver.step().unwrap(), 0.1);
    assert_eq!(solver.time(), 0.1);
    assert_eq!(solver.stats().fn_evals, 4);
    assert_abs_diff_eq!(solver.state()[0], 0.1f64.cos(), epsilon = 1e-6);
    assert_abs_diff_eq!(solver.state()[1], -(0.1f64.sin()), epsilon = 1e-6);
}

#[test]
fn invalid_inputs() {
    assert_eq!(
        euler(decay, 1., 0., &FixedStepConfig::new(1, 0.1)),
        Err(Error::InvalidStepCount(1))
    );
    assert_eq!(
        rk4_system(oscillator, Array1::zeros(0), 0., &FixedStepConfig::default()),
        Err(Error::EmptyState)
    );
    assert_eq!(
        heun_system(
            |_t, _y: ArrayView1<f64>| array![1.],
            array![1., 2.],
            0.,
            &FixedStepConfig::default()
        ),
        Err(Error::InvalidDimension {
            expected: 2,
            found: 1
        })
    );
}
