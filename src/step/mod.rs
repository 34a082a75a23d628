//! Step abstraction for compensating pipelines.
//!
//! A [`Step`] performs one unit of work in [`run`](Step::run) and undoes it in
//! [`cleanup`](Step::cleanup). The [`StepRunner`] drives steps forward until
//! one halts, then cleans up every step that ran in reverse order.

mod runner;

use std::future::Future;
use std::pin::Pin;

pub use runner::{RunReport, StepRunner};

/// Future returned by [`Step`] methods.
pub type StepFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of [`Step::run`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StepAction {
    /// Proceed to the next step.
    Continue,
    /// Stop forward progress. The step must have recorded its error in the
    /// shared state first.
    Halt,
}

/// Unit of work with a compensating action, generic over the shared state.
pub trait Step<S>: Send {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &'static str;

    /// Performs the step's work.
    fn run<'a>(&'a mut self, state: &'a mut S) -> StepFuture<'a, StepAction>;

    /// Releases whatever [`run`](Self::run) created.
    ///
    /// Must be idempotent, must not fail, and must do nothing when `run`
    /// created nothing. Failures are reported through the shared state.
    fn cleanup<'a>(&'a mut self, state: &'a mut S) -> StepFuture<'a, ()>;
}
