//! A [`TerminationCondition`] is polled by the solver at the boundaries of
//! its search loop. It indicates when the solver should stop even though no
//! definitive conclusion has been reached; the solver then unwinds and
//! reports an unknown result. Cancellation is cooperative: in-flight
//! propagation and conflict analysis always complete before a check.

pub(crate) mod combinator;
pub(crate) mod conflict_budget;
pub(crate) mod indefinite;
pub(crate) mod interrupt_flag;
pub(crate) mod iteration_budget;
pub(crate) mod propagation_budget;
pub(crate) mod time_budget;

pub use combinator::Combinator;
pub use conflict_budget::ConflictBudget;
pub use indefinite::Indefinite;
pub use interrupt_flag::InterruptFlag;
pub use iteration_budget::IterationBudget;
pub use propagation_budget::PropagationBudget;
pub use time_budget::TimeBudget;

/// The central trait that defines a termination condition. The solver reports
/// search events through the optional hooks so that budget-style conditions
/// can count them.
pub trait TerminationCondition {
    /// Returns `true` when the solver should stop, `false` otherwise.
    fn should_stop(&mut self) -> bool;
    /// Called once per iteration of the outer search loop.
    fn iteration_has_completed(&mut self) {}
    /// Called once per conflict.
    fn conflict_has_occurred(&mut self) {}
    /// Called once per propagated literal.
    fn literal_has_been_propagated(&mut self) {}
}

impl<T: TerminationCondition> TerminationCondition for Option<T> {
    fn should_stop(&mut self) -> bool {
        match self {
            Some(t) => t.should_stop(),
            None => false,
        }
    }

    fn iteration_has_completed(&mut self) {
        if let Some(t) = self {
            t.iteration_has_completed()
        }
    }

    fn conflict_has_occurred(&mut self) {
        if let Some(t) = self {
            t.conflict_has_occurred()
        }
    }

    fn literal_has_been_propagated(&mut self) {
        if let Some(t) = self {
            t.literal_has_been_propagated()
        }
    }
}
