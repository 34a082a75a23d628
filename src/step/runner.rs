//! Sequential step execution with reverse-order cleanup.

use tracing::{debug, info};

use super::{Step, StepAction};

/// Summary of a pipeline execution.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RunReport {
    /// Steps whose `run` was invoked, in execution order.
    pub ran: Vec<&'static str>,
    /// Step that halted the pipeline, if any.
    pub halted_at: Option<&'static str>,
}

impl RunReport {
    /// Returns `true` when every step ran and none halted.
    #[must_use]
    pub const fn completed(&self) -> bool {
        self.halted_at.is_none()
    }
}

/// Runs an ordered list of steps against shared state.
///
/// Steps run one after another until one returns [`StepAction::Halt`]; the
/// halting step counts as having run. Afterwards `cleanup` is invoked on every
/// step that ran, last first, whether or not the pipeline halted.
pub struct StepRunner<S> {
    steps: Vec<Box<dyn Step<S>>>,
}

impl<S> std::fmt::Debug for StepRunner<S> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.steps.iter().map(|step| step.name()).collect();
        formatter
            .debug_struct("StepRunner")
            .field("steps", &names)
            .finish()
    }
}

impl<S: Send> StepRunner<S> {
    /// Creates a runner for `steps`, executed in the given order.
    #[must_use]
    pub fn new(steps: Vec<Box<dyn Step<S>>>) -> Self {
        Self { steps }
    }

    /// Executes the pipeline against `state`.
    pub async fn run(&mut self, state: &mut S) -> RunReport {
        let mut report = RunReport::default();

        for step in &mut self.steps {
            let name = step.name();
            debug!(step = name, "running step");
            report.ran.push(name);
            if step.run(state).await == StepAction::Halt {
                info!(step = name, "step halted the pipeline");
                report.halted_at = Some(name);
                break;
            }
        }

        let ran = report.ran.len();
        for step in self.steps.iter_mut().take(ran).rev() {
            debug!(step = step.name(), "cleaning up step");
            step.cleanup(state).await;
        }

        report
    }
}
