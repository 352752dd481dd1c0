use super::Assignments;
use super::ClauseAllocator;
use crate::basic_types::HashMap;
use crate::basic_types::HashSet;
use crate::basic_types::Literal;
use crate::engine::options::MinimisationMode;
use crate::engine::solver::ConflictAnalysisResult;
use crate::pitaya_assert_moderate;
use crate::pitaya_assert_simple;

/// Conflict-clause minimisation: removes literals from the learned clause
/// that are dominated in the implication graph, i.e. implied by a subset of
/// the other learned literals. The asserting literal is never removed.
///
/// The implementation is based on the algorithms from the papers:
/// - "Improved conflict-clause minimization leads to improved propositional
///   proof traces.", Allen Van Gelder. SAT'09
/// - "Minimizing learned clauses", Niklas Sörensson and Armin Biere. SAT'09
///
/// The deep mode walks reason clauses transitively with an explicit stack, so
/// the native call stack stays bounded regardless of implication-graph depth.
/// The basic mode only inspects the direct reason of each literal.
#[derive(Default, Debug)]
pub(crate) struct LearnedClauseMinimiser {
    allowed_decision_levels: HashSet<usize>,
    label_assignments: HashMap<Literal, Label>,
    num_minimisation_calls: usize,
    num_literals_removed_total: usize,
    num_literals_seen_total: usize,
}

impl LearnedClauseMinimiser {
    /// Assumes the learned literals are stored with the asserting literal at
    /// position zero. After minimisation the literal at position one is again
    /// at the highest decision level among the remaining literals.
    pub(crate) fn remove_dominated_literals(
        &mut self,
        analysis_result: &mut ConflictAnalysisResult,
        mode: MinimisationMode,
        assignments: &Assignments,
        clause_allocator: &ClauseAllocator,
    ) {
        if mode == MinimisationMode::None {
            return;
        }

        self.num_minimisation_calls += 1;
        self.num_literals_seen_total += analysis_result.learned_literals.len();
        let num_literals_before_minimisation = analysis_result.learned_literals.len();

        self.initialise(analysis_result, assignments);

        // The asserting literal at position zero always stays.
        let mut end_position: usize = 1;
        for i in 1..analysis_result.learned_literals.len() {
            let learned_literal = analysis_result.learned_literals[i];

            let redundant = match mode {
                MinimisationMode::None => unreachable!(),
                MinimisationMode::Basic => {
                    self.is_redundant_basic(!learned_literal, assignments, clause_allocator)
                }
                MinimisationMode::Deep => {
                    self.compute_label(!learned_literal, assignments, clause_allocator);
                    self.get_literal_label(!learned_literal) == Label::Removable
                }
            };

            if !redundant {
                analysis_result.learned_literals[end_position] = learned_literal;
                end_position += 1;
                // The literal at position one must stay at the highest level;
                // this invariant determines the backjump level.
                let literal_at_index_1 = analysis_result.learned_literals[1];
                if assignments.get_literal_assignment_level(literal_at_index_1)
                    < assignments.get_literal_assignment_level(learned_literal)
                {
                    analysis_result.learned_literals.swap(1, end_position - 1);
                }
            }
        }
        analysis_result.learned_literals.truncate(end_position);

        // Minimisation may have removed the literal that determined the
        // backjump level.
        analysis_result.backjump_level = if analysis_result.learned_literals.len() > 1 {
            assignments.get_literal_assignment_level(analysis_result.learned_literals[1])
        } else {
            0
        };

        self.clean_up();

        self.num_literals_removed_total +=
            num_literals_before_minimisation - analysis_result.learned_literals.len();
    }

    /// A literal is redundant in basic mode when it was propagated and every
    /// antecedent of its reason is either a root assignment or part of the
    /// learned clause.
    fn is_redundant_basic(
        &self,
        input_literal: Literal,
        assignments: &Assignments,
        clause_allocator: &ClauseAllocator,
    ) -> bool {
        pitaya_assert_moderate!(assignments.is_literal_assigned_true(input_literal));

        if assignments.is_literal_decision(input_literal) {
            return false;
        }

        let reason_reference = assignments.get_literal_reason(input_literal);
        let reason = clause_allocator.get_clause(reason_reference);
        (1..reason.len()).all(|i| {
            let antecedent_literal = !reason[i];
            assignments.is_literal_root_assignment(antecedent_literal)
                || self.is_literal_assigned_seen(antecedent_literal)
        })
    }

    /// Labels `root_literal` (a trail-true literal) as Removable, Keep or
    /// Poison by exploring its implication ancestry with an explicit stack.
    fn compute_label(
        &mut self,
        root_literal: Literal,
        assignments: &Assignments,
        clause_allocator: &ClauseAllocator,
    ) {
        pitaya_assert_moderate!(assignments.is_literal_assigned_true(root_literal));

        if self.is_literal_label_already_computed(root_literal) {
            return;
        }

        if assignments.is_literal_decision(root_literal) {
            // Root literals from the learned clause were labelled during
            // initialisation, so a decision here can never be removed.
            self.assign_literal_label(root_literal, Label::Poison);
            return;
        }

        let mut stack = vec![StackFrame::new(root_literal)];
        'outer: while let Some(frame) = stack.last_mut() {
            let reason_reference = assignments.get_literal_reason(frame.literal);
            let reason = clause_allocator.get_clause(reason_reference);

            while frame.next_antecedent_index < reason.len() {
                let antecedent_literal = !reason[frame.next_antecedent_index];
                frame.next_antecedent_index += 1;

                if assignments.is_literal_root_assignment(antecedent_literal) {
                    continue;
                }

                if self.is_literal_label_already_computed(antecedent_literal) {
                    if self.get_literal_label(antecedent_literal) == Label::Poison {
                        self.abort_with_poisoned_stack(&mut stack);
                    }
                    continue 'outer;
                }

                // A decision, or a literal outside the decision levels of the
                // learned clause, can never be dominated.
                if assignments.is_literal_decision(antecedent_literal)
                    || !self.is_decision_level_allowed(
                        assignments.get_literal_assignment_level(antecedent_literal),
                    )
                {
                    self.assign_literal_label(antecedent_literal, Label::Poison);
                    self.abort_with_poisoned_stack(&mut stack);
                    continue 'outer;
                }

                // The antecedent is Seen or unlabelled, propagated, and on an
                // allowed level: explore its own reason.
                stack.push(StackFrame::new(antecedent_literal));
                continue 'outer;
            }

            // Every antecedent is Removable, Keep or Seen-and-removable, so
            // this literal is dominated.
            self.assign_literal_label(frame.literal, Label::Removable);
            let _ = stack.pop();
        }
    }

    /// A Poison antecedent was found: every literal still on the stack is
    /// labelled Keep when it is part of the learned clause and Poison
    /// otherwise.
    fn abort_with_poisoned_stack(&mut self, stack: &mut Vec<StackFrame>) {
        for frame in stack.drain(..) {
            if self.is_literal_assigned_seen(frame.literal) {
                self.assign_literal_label(frame.literal, Label::Keep);
            } else {
                self.assign_literal_label(frame.literal, Label::Poison);
            }
        }
    }

    fn is_decision_level_allowed(&self, decision_level: usize) -> bool {
        self.allowed_decision_levels.contains(&decision_level)
    }

    fn mark_decision_level_as_allowed(&mut self, decision_level: usize) {
        let _ = self.allowed_decision_levels.insert(decision_level);
    }

    fn is_literal_assigned_seen(&self, literal: Literal) -> bool {
        self.label_assignments.get(&literal) == Some(&Label::Seen)
    }

    fn get_literal_label(&self, literal: Literal) -> Label {
        *self
            .label_assignments
            .get(&literal)
            .expect("Cannot ask for a label of an unlabelled literal")
    }

    fn assign_literal_label(&mut self, literal: Literal, label: Label) {
        pitaya_assert_moderate!(
            !self.label_assignments.contains_key(&literal)
                || self.is_literal_assigned_seen(literal),
            "Cannot assign the label of an already labelled literal"
        );
        let _ = self.label_assignments.insert(literal, label);
    }

    fn is_literal_label_already_computed(&self, literal: Literal) -> bool {
        matches!(
            self.label_assignments.get(&literal),
            Some(label) if *label != Label::Seen
        )
    }

    fn initialise(&mut self, analysis_result: &ConflictAnalysisResult, assignments: &Assignments) {
        pitaya_assert_simple!(self.label_assignments.is_empty());

        // The asserting literal is always kept.
        let _ = self
            .label_assignments
            .insert(analysis_result.learned_literals[0], Label::Keep);

        for i in 1..analysis_result.learned_literals.len() {
            let literal = !analysis_result.learned_literals[i];
            if assignments.is_literal_decision(literal) {
                self.assign_literal_label(literal, Label::Keep);
            } else {
                self.assign_literal_label(literal, Label::Seen);
            }

            self.mark_decision_level_as_allowed(assignments.get_literal_assignment_level(literal));
        }
    }

    fn clean_up(&mut self) {
        self.allowed_decision_levels.clear();
        self.label_assignments.clear();
    }
}

impl LearnedClauseMinimiser {
    pub(crate) fn num_literals_removed_total(&self) -> usize {
        self.num_literals_removed_total
    }

    pub(crate) fn num_minimisation_calls(&self) -> usize {
        self.num_minimisation_calls
    }

    pub(crate) fn fraction_of_removed_literals(&self) -> f64 {
        if self.num_literals_seen_total > 0 {
            self.num_literals_removed_total as f64 / self.num_literals_seen_total as f64
        } else {
            0.0
        }
    }
}

#[derive(Debug)]
struct StackFrame {
    literal: Literal,
    /// Position of the next reason literal to examine; starts at one since
    /// position zero holds the propagated literal itself.
    next_antecedent_index: u32,
}

impl StackFrame {
    fn new(literal: Literal) -> StackFrame {
        StackFrame {
            literal,
            next_antecedent_index: 1,
        }
    }
}

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
enum Label {
    /// Part of the original learned clause, final status undetermined.
    Seen,
    /// Proven not removable through a non-dominated ancestor.
    Poison,
    /// Dominated by the rest of the learned clause.
    Removable,
    /// Part of the learned clause and proven necessary.
    Keep,
}
