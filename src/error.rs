use thiserror::Error;

/// Errors returned by the integrators and their configuration.
///
/// Floating-point values are reported as `f64` regardless of the precision
/// the integrator runs in.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A trajectory needs the initial point plus at least one step.
    #[error("number of steps must be at least 2 (got {0})")]
    InvalidStepCount(usize),
    #[error("initial state has no components")]
    EmptyState,
    /// The derivative function returned a vector of the wrong length.
    #[error("derivative has {found} components, expected {expected}")]
    InvalidDimension { expected: usize, found: usize },
    #[error("invalid step size {0}")]
    InvalidStepSize(f64),
    #[error("safety factor alpha must be positive and finite (got {0})")]
    InvalidSafetyFactor(f64),
    #[error("error tolerance must be positive and finite (got {0})")]
    InvalidTolerance(f64),
    /// The adaptive step at time `t` was rejected more than the allowed
    /// number of times.
    #[error("step at t = {t} still rejected after {retries} retries")]
    StepRetryLimitExceeded { t: f64, retries: usize },
    /// The trial step no longer moves the time forward, e.g. because it
    /// shrank below the spacing of floating-point numbers around `t`.
    #[error("step size {h} is too small to advance from t = {t}")]
    StepSizeUnderflow { t: f64, h: f64 },
    #[error("error estimate is not finite at t = {t}")]
    NonFiniteErrorEstimate { t: f64 },
}
