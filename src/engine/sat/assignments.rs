use crate::basic_types::ClauseReference;
use crate::basic_types::KeyedVec;
use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;
use crate::basic_types::PropositionalVariableGeneratorIterator;
use crate::basic_types::Trail;
use crate::pitaya_assert_moderate;
use crate::pitaya_assert_simple;

/// Truth values, per-variable assignment metadata and the assignment trail.
///
/// A propagated variable stores the clause that forced it; a decision (and a
/// root-level unit) stores the null reference.
#[derive(Clone, Debug)]
pub(crate) struct Assignments {
    assignment_info: KeyedVec<PropositionalVariable, AssignmentInfo>,
    trail: Trail<Literal>,
    /// A literal that is true at the root by construction, tied to the
    /// reserved variable with index zero.
    pub(crate) true_literal: Literal,
}

impl Default for Assignments {
    fn default() -> Self {
        Assignments {
            assignment_info: Default::default(),
            trail: Default::default(),
            true_literal: Literal::new(PropositionalVariable::new(0), true),
        }
    }
}

impl Assignments {
    pub(crate) fn increase_decision_level(&mut self) {
        self.trail.increase_decision_level()
    }

    pub(crate) fn get_decision_level(&self) -> usize {
        self.trail.get_decision_level()
    }

    pub(crate) fn num_trail_entries(&self) -> usize {
        self.trail.len()
    }

    pub(crate) fn get_trail_entry(&self, index: usize) -> Literal {
        self.trail[index]
    }

    pub(crate) fn start_of_decision_level(&self, decision_level: usize) -> usize {
        self.trail.start_of_decision_level(decision_level)
    }

    pub(crate) fn grow(&mut self) {
        self.assignment_info.push(AssignmentInfo::Unassigned);
    }

    pub(crate) fn num_propositional_variables(&self) -> u32 {
        self.assignment_info.len() as u32
    }

    /// All user-visible variables; index zero is the reserved root-true
    /// variable and is skipped.
    pub(crate) fn get_propositional_variables(&self) -> PropositionalVariableGeneratorIterator {
        PropositionalVariableGeneratorIterator::new(1, self.num_propositional_variables())
    }

    pub(crate) fn is_variable_assigned_true(&self, variable: PropositionalVariable) -> bool {
        match self.assignment_info[variable] {
            AssignmentInfo::Assigned { truth_value, .. } => truth_value,
            AssignmentInfo::Unassigned => false,
        }
    }

    pub(crate) fn is_variable_assigned_false(&self, variable: PropositionalVariable) -> bool {
        match self.assignment_info[variable] {
            AssignmentInfo::Assigned { truth_value, .. } => !truth_value,
            AssignmentInfo::Unassigned => false,
        }
    }

    pub(crate) fn is_literal_assigned_true(&self, literal: Literal) -> bool {
        if literal.is_positive() {
            self.is_variable_assigned_true(literal.get_propositional_variable())
        } else {
            self.is_variable_assigned_false(literal.get_propositional_variable())
        }
    }

    pub(crate) fn is_literal_assigned_false(&self, literal: Literal) -> bool {
        self.is_literal_assigned(literal) && !self.is_literal_assigned_true(literal)
    }

    pub(crate) fn is_literal_assigned(&self, literal: Literal) -> bool {
        self.is_variable_assigned(literal.get_propositional_variable())
    }

    pub(crate) fn is_literal_unassigned(&self, literal: Literal) -> bool {
        self.is_variable_unassigned(literal.get_propositional_variable())
    }

    pub(crate) fn is_variable_unassigned(&self, variable: PropositionalVariable) -> bool {
        self.assignment_info[variable] == AssignmentInfo::Unassigned
    }

    pub(crate) fn is_variable_assigned(&self, variable: PropositionalVariable) -> bool {
        self.assignment_info[variable] != AssignmentInfo::Unassigned
    }

    pub(crate) fn is_literal_root_assignment(&self, literal: Literal) -> bool {
        if self.is_literal_unassigned(literal) {
            false
        } else {
            self.get_variable_assignment_level(literal.get_propositional_variable()) == 0
        }
    }

    pub(crate) fn is_variable_decision(&self, variable: PropositionalVariable) -> bool {
        match self.assignment_info[variable] {
            AssignmentInfo::Unassigned => false,
            AssignmentInfo::Assigned { reason, .. } => reason.is_null(),
        }
    }

    pub(crate) fn is_variable_propagated(&self, variable: PropositionalVariable) -> bool {
        match self.assignment_info[variable] {
            AssignmentInfo::Unassigned => false,
            AssignmentInfo::Assigned { reason, .. } => !reason.is_null(),
        }
    }

    pub(crate) fn is_literal_decision(&self, literal: Literal) -> bool {
        self.is_variable_decision(literal.get_propositional_variable())
    }

    pub(crate) fn is_literal_propagated(&self, literal: Literal) -> bool {
        self.is_variable_propagated(literal.get_propositional_variable())
    }

    pub(crate) fn get_variable_assignment_level(&self, variable: PropositionalVariable) -> usize {
        match self.assignment_info[variable] {
            AssignmentInfo::Unassigned => {
                panic!("Unassigned variables do not have assignment levels");
            }
            AssignmentInfo::Assigned { decision_level, .. } => decision_level,
        }
    }

    pub(crate) fn get_literal_assignment_level(&self, literal: Literal) -> usize {
        self.get_variable_assignment_level(literal.get_propositional_variable())
    }

    pub(crate) fn get_variable_reason(&self, variable: PropositionalVariable) -> ClauseReference {
        match self.assignment_info[variable] {
            AssignmentInfo::Unassigned => {
                panic!("Unassigned variables do not have reasons");
            }
            AssignmentInfo::Assigned { reason, .. } => reason,
        }
    }

    pub(crate) fn get_literal_reason(&self, literal: Literal) -> ClauseReference {
        self.get_variable_reason(literal.get_propositional_variable())
    }

    /// Overwrites the reason of an assigned variable. Used when garbage
    /// collection relocates the reason clause.
    pub(crate) fn update_reason(
        &mut self,
        variable: PropositionalVariable,
        new_reason: ClauseReference,
    ) {
        match &mut self.assignment_info[variable] {
            AssignmentInfo::Unassigned => {
                panic!("Unassigned variables do not have reasons");
            }
            AssignmentInfo::Assigned { reason, .. } => *reason = new_reason,
        }
    }

    fn make_assignment(&mut self, true_literal: Literal, reason: ClauseReference) {
        pitaya_assert_simple!(
            !self.is_literal_assigned(true_literal),
            "Cannot assign an already-assigned literal"
        );

        self.assignment_info[true_literal.get_propositional_variable()] =
            AssignmentInfo::Assigned {
                truth_value: true_literal.is_positive(),
                decision_level: self.get_decision_level(),
                reason,
            };

        self.trail.push(true_literal);
    }

    pub(crate) fn undo_assignment(&mut self, variable: PropositionalVariable) {
        pitaya_assert_moderate!(self.is_variable_assigned(variable));

        self.assignment_info[variable] = AssignmentInfo::Unassigned;
    }

    /// Assigns a literal with no reason clause; this covers both decisions
    /// and root-level units (which are distinguished by the decision level).
    pub(crate) fn enqueue_decision_literal(&mut self, decision_literal: Literal) {
        self.make_assignment(decision_literal, ClauseReference::null());
    }

    pub(crate) fn enqueue_propagated_literal(
        &mut self,
        propagated_literal: Literal,
        reason: ClauseReference,
    ) {
        pitaya_assert_simple!(!reason.is_null());
        self.make_assignment(propagated_literal, reason);
    }

    /// Unassigns everything above the given level and returns the undone
    /// literals in reverse assignment order.
    pub(crate) fn synchronise(
        &mut self,
        new_decision_level: usize,
    ) -> impl Iterator<Item = Literal> + '_ {
        pitaya_assert_simple!(new_decision_level < self.get_decision_level());
        self.trail.synchronise(new_decision_level).inspect(|entry| {
            let variable = entry.get_propositional_variable();

            self.assignment_info[variable] = AssignmentInfo::Unassigned;
        })
    }

    /// Drops every trail entry and checkpoint while keeping the assignment
    /// metadata. Used by trail compaction at the root, where the caller
    /// re-enqueues the entries that must survive.
    pub(crate) fn flush_trail(&mut self) {
        pitaya_assert_simple!(self.is_at_the_root_level());
        self.trail.flush();
    }

    pub(crate) fn is_at_the_root_level(&self) -> bool {
        self.get_decision_level() == 0
    }
}

#[derive(PartialEq, Clone, Copy, Default, Debug)]
enum AssignmentInfo {
    Assigned {
        truth_value: bool,
        decision_level: usize,
        reason: ClauseReference,
    },
    #[default]
    Unassigned,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignments_with_variables(num_variables: u32) -> Assignments {
        let mut assignments = Assignments::default();
        for _ in 0..=num_variables {
            assignments.grow();
        }
        assignments.enqueue_decision_literal(assignments.true_literal);
        assignments
    }

    #[test]
    fn decisions_are_distinguished_from_propagations() {
        let mut assignments = assignments_with_variables(2);
        let decided = Literal::new(PropositionalVariable::new(1), true);
        let propagated = Literal::new(PropositionalVariable::new(2), false);

        assignments.increase_decision_level();
        assignments.enqueue_decision_literal(decided);
        assignments.enqueue_propagated_literal(
            propagated,
            ClauseReference::create_allocated_clause_reference(1),
        );

        assert!(assignments.is_variable_decision(decided.get_propositional_variable()));
        assert!(assignments.is_variable_propagated(propagated.get_propositional_variable()));
        assert!(assignments.is_literal_assigned_true(decided));
        assert!(assignments.is_literal_assigned_true(propagated));
        assert!(assignments.is_literal_assigned_false(!propagated));
    }

    #[test]
    fn synchronise_unassigns_everything_above_the_target_level() {
        let mut assignments = assignments_with_variables(3);
        let first = Literal::new(PropositionalVariable::new(1), true);
        let second = Literal::new(PropositionalVariable::new(2), false);

        assignments.increase_decision_level();
        assignments.enqueue_decision_literal(first);
        assignments.increase_decision_level();
        assignments.enqueue_decision_literal(second);

        let undone: Vec<Literal> = assignments.synchronise(1).collect();
        assert_eq!(undone, vec![second]);
        assert!(assignments.is_literal_unassigned(second));
        assert!(assignments.is_literal_assigned_true(first));
        assert_eq!(assignments.get_decision_level(), 1);
    }

    #[test]
    fn root_assignments_are_recognised() {
        let mut assignments = assignments_with_variables(1);
        let unit = Literal::new(PropositionalVariable::new(1), true);
        assignments.enqueue_decision_literal(unit);

        assert!(assignments.is_literal_root_assignment(unit));
        assert_eq!(assignments.get_literal_assignment_level(unit), 0);
    }
}
