use super::TerminationCondition;

/// A [`TerminationCondition`] which triggers when either of two given
/// [`TerminationCondition`]s triggers.
#[derive(Clone, Copy, Debug)]
pub struct Combinator<T1, T2> {
    t1: T1,
    t2: T2,
}

impl<T1, T2> Combinator<T1, T2> {
    /// Combine two [`TerminationCondition`]s into one.
    pub fn new(t1: T1, t2: T2) -> Self {
        Combinator { t1, t2 }
    }
}

impl<T1: TerminationCondition, T2: TerminationCondition> TerminationCondition
    for Combinator<T1, T2>
{
    fn should_stop(&mut self) -> bool {
        self.t1.should_stop() || self.t2.should_stop()
    }

    fn iteration_has_completed(&mut self) {
        self.t1.iteration_has_completed();
        self.t2.iteration_has_completed();
    }

    fn conflict_has_occurred(&mut self) {
        self.t1.conflict_has_occurred();
        self.t2.conflict_has_occurred();
    }

    fn literal_has_been_propagated(&mut self) {
        self.t1.literal_has_been_propagated();
        self.t2.literal_has_been_propagated();
    }
}
