use super::TerminationCondition;

/// A [`TerminationCondition`] which triggers after a number of conflicts.
#[derive(Debug, Copy, Clone)]
pub struct ConflictBudget {
    budget: u64,
    num_conflicts: u64,
}

impl ConflictBudget {
    pub fn new(budget: u64) -> Self {
        Self {
            budget,
            num_conflicts: 0,
        }
    }
}

impl TerminationCondition for ConflictBudget {
    fn should_stop(&mut self) -> bool {
        self.num_conflicts >= self.budget
    }

    fn conflict_has_occurred(&mut self) {
        self.num_conflicts += 1;
    }
}
