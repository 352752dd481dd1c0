use std::io::Write;

use itertools::Itertools;
use log::debug;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::basic_types::ClauseReference;
use crate::basic_types::HashMap;
use crate::basic_types::KeyedVec;
use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;
use crate::basic_types::Random;
use crate::basic_types::Solution;
use crate::basic_types::SolveResult;
use crate::basic_types::SolverError;
use crate::engine::options::ActivityBumpPolicy;
use crate::engine::options::PhaseSavingMode;
use crate::engine::options::SatOptions;
use crate::engine::sat::Assignments;
use crate::engine::sat::ClauseAllocator;
use crate::engine::sat::LearnedClauseManager;
use crate::engine::sat::LearnedClauseMinimiser;
use crate::engine::sat::RestartStrategy;
use crate::engine::sat::ValueSelector;
use crate::engine::sat::VariableSelector;
use crate::engine::termination::TerminationCondition;
use crate::pitaya_assert_advanced;
use crate::pitaya_assert_simple;
use crate::propagators::ClausalPropagator;

/// A conflict-driven clause-learning satisfiability solver.
///
/// Clauses are added at the root level through [`SatisfactionSolver::add_clause`];
/// [`SatisfactionSolver::solve`] runs the search under an optional list of
/// assumption literals and a termination condition. The solver is incremental:
/// after a solve call completes it is back at the root level and more clauses
/// and variables can be added, unless a root-level contradiction has made the
/// formula permanently unsatisfiable.
#[derive(Debug)]
pub struct SatisfactionSolver {
    state: SolverState,
    assignments: Assignments,
    clause_allocator: ClauseAllocator,
    clausal_propagator: ClausalPropagator,
    learned_clause_manager: LearnedClauseManager,
    learned_clause_minimiser: LearnedClauseMinimiser,
    restart_strategy: RestartStrategy,
    variable_selector: VariableSelector,
    value_selector: ValueSelector,
    random: SmallRng,
    assumptions: Vec<Literal>,
    /// Per-variable marker used by conflict analysis and core extraction.
    seen: KeyedVec<PropositionalVariable, bool>,
    analysis_result: ConflictAnalysisResult,
    counters: SolverStatistics,
    options: SatOptions,
    /// Variables released by the user but not yet recycled by
    /// simplification.
    released_variables: Vec<PropositionalVariable>,
    /// Recycled variables handed out again by
    /// [`SatisfactionSolver::new_variable`].
    free_variables: Vec<PropositionalVariable>,
    /// Number of trail entries when simplification last ran; simplification
    /// is skipped unless new root assignments arrived since.
    num_root_assignments_at_last_simplification: usize,
    num_decisions_since_last_random_decision: u64,
}

impl Default for SatisfactionSolver {
    fn default() -> Self {
        SatisfactionSolver::new(SatOptions::default())
    }
}

impl SatisfactionSolver {
    pub fn new(options: SatOptions) -> SatisfactionSolver {
        let mut solver = SatisfactionSolver {
            state: SolverState::default(),
            assignments: Assignments::default(),
            clause_allocator: ClauseAllocator::default(),
            clausal_propagator: ClausalPropagator::default(),
            learned_clause_manager: LearnedClauseManager::new(&options),
            learned_clause_minimiser: LearnedClauseMinimiser::default(),
            restart_strategy: RestartStrategy::new(&options),
            variable_selector: VariableSelector::new(&options),
            value_selector: ValueSelector::new(options.random_polarity),
            random: SmallRng::seed_from_u64(options.random_seed),
            assumptions: Vec::default(),
            seen: KeyedVec::default(),
            analysis_result: ConflictAnalysisResult::default(),
            counters: SolverStatistics::default(),
            options,
            released_variables: Vec::default(),
            free_variables: Vec::default(),
            num_root_assignments_at_last_simplification: 0,
            num_decisions_since_last_random_decision: 0,
        };

        // The variable with index zero is reserved: its positive literal is
        // true at the root by construction, which gives propagation and
        // preprocessing a literal that is always available.
        solver.grow();
        solver
            .variable_selector
            .set_decision_eligibility(PropositionalVariable::new(0), false);
        solver
            .assignments
            .enqueue_decision_literal(solver.assignments.true_literal);

        solver
    }

    /// Creates a fresh variable, or recycles one that was released and
    /// cleaned up by a later solve call.
    pub fn new_variable(&mut self) -> PropositionalVariable {
        if let Some(variable) = self.free_variables.pop() {
            self.variable_selector.set_decision_eligibility(variable, true);
            self.value_selector.reset(variable);
            return variable;
        }

        let variable = PropositionalVariable::new(self.assignments.num_propositional_variables());
        self.grow();
        variable
    }

    /// Logically destroys a variable: the literal is asserted as a root
    /// unit, and once a later simplification pass has compacted the trail the
    /// variable index becomes available for reuse through
    /// [`SatisfactionSolver::new_variable`]. Only legal while the variable is
    /// unassigned.
    pub fn release_variable(&mut self, literal: Literal) -> Result<(), SolverError> {
        pitaya_assert_simple!(
            self.assignments.is_literal_unassigned(literal),
            "Only unassigned variables can be released"
        );
        let variable = literal.get_propositional_variable();
        self.variable_selector.set_decision_eligibility(variable, false);
        self.released_variables.push(variable);
        self.add_clause(&[literal])
    }

    /// Marks whether the variable may be picked as a decision. Ineligible
    /// variables can still be assigned by propagation.
    pub fn set_decision_eligibility(
        &mut self,
        variable: PropositionalVariable,
        is_eligible: bool,
    ) {
        self.variable_selector.set_decision_eligibility(variable, is_eligible);
    }

    /// Forces the polarity used whenever this variable is picked as a
    /// decision.
    pub fn set_polarity(&mut self, variable: PropositionalVariable, polarity: bool) {
        self.value_selector.update_and_freeze(variable, polarity);
    }

    /// Adds a clause at the root level. An empty clause (possibly after
    /// root-level simplification of its literals) marks the solver
    /// permanently unsatisfiable, as does a unit clause that contradicts the
    /// current root assignments.
    pub fn add_clause(&mut self, literals: &[Literal]) -> Result<(), SolverError> {
        pitaya_assert_simple!(
            self.assignments.is_at_the_root_level(),
            "Clauses can only be added at the root level"
        );

        if self.state.is_infeasible() {
            return Err(SolverError::StructuralContradiction);
        }
        if self.clause_allocator.is_full() {
            return Err(SolverError::AllocatorExhaustion);
        }

        let result = self.clausal_propagator.add_permanent_clause(
            literals.to_vec(),
            &mut self.assignments,
            &mut self.clause_allocator,
        );

        match result {
            Ok(()) => {
                self.state = SolverState::Ready;
                Ok(())
            }
            Err(error) => {
                self.state = SolverState::Infeasible;
                Err(error)
            }
        }
    }

    /// Runs the search until a verdict is reached or the termination
    /// condition triggers. The assumption literals are enqueued, in order,
    /// before any free decision is made; if they cannot all hold the result
    /// carries the subset of assumptions responsible.
    pub fn solve(
        &mut self,
        termination: &mut impl TerminationCondition,
        assumptions: &[Literal],
    ) -> SolveResult {
        if self.state.is_infeasible() || self.clausal_propagator.is_in_infeasible_state() {
            return SolveResult::Unsatisfiable;
        }

        self.initialise(assumptions);
        let result = self.solve_internal(termination);
        self.counters.log_statistics();
        debug!(
            "Clause minimisation removed {} literals over {} calls ({:.2} of the literals seen)",
            self.learned_clause_minimiser.num_literals_removed_total(),
            self.learned_clause_minimiser.num_minimisation_calls(),
            self.learned_clause_minimiser.fraction_of_removed_literals()
        );
        result
    }

    pub fn statistics(&self) -> &SolverStatistics {
        &self.counters
    }

    /// Writes the current (possibly simplified) permanent clause set in
    /// DIMACS CNF format, with the variables that occur renumbered densely
    /// from one and the given assumptions emitted as unit clauses. A solver
    /// that is already unsatisfiable emits the canonical two-clause
    /// contradiction.
    pub fn to_dimacs(
        &self,
        assumptions: &[Literal],
        writer: &mut impl Write,
    ) -> std::io::Result<()> {
        if self.state.is_infeasible() || self.clausal_propagator.is_in_infeasible_state() {
            return write!(writer, "p cnf 1 2\n1 0\n-1 0\n");
        }

        let mut variable_numbering: HashMap<PropositionalVariable, usize> = HashMap::default();
        let mut renumber = |literal: Literal| -> String {
            let fresh_number = variable_numbering.len() + 1;
            let number = *variable_numbering
                .entry(literal.get_propositional_variable())
                .or_insert(fresh_number);
            if literal.is_positive() {
                format!("{number}")
            } else {
                format!("-{number}")
            }
        };

        let mut clause_lines: Vec<String> = Vec::new();
        for &assumption in assumptions {
            let assumption_line = renumber(assumption);
            clause_lines.push(format!("{assumption_line} 0"));
        }
        for &clause_reference in &self.clausal_propagator.permanent_clauses {
            let clause = &self.clause_allocator[clause_reference];
            if clause
                .get_literal_slice()
                .iter()
                .any(|&literal| self.assignments.is_literal_assigned_true(literal))
            {
                continue;
            }
            let line = clause
                .get_literal_slice()
                .iter()
                .filter(|&&literal| !self.assignments.is_literal_assigned_false(literal))
                .map(|&literal| renumber(literal))
                .join(" ");
            clause_lines.push(format!("{line} 0"));
        }

        writeln!(
            writer,
            "p cnf {} {}",
            variable_numbering.len(),
            clause_lines.len()
        )?;
        for line in clause_lines {
            writeln!(writer, "{line}")?;
        }
        Ok(())
    }

    fn grow(&mut self) {
        self.assignments.grow();
        self.clausal_propagator.grow();
        self.variable_selector.grow();
        self.value_selector.grow();
        self.seen.push(false);
    }

    fn initialise(&mut self, assumptions: &[Literal]) {
        pitaya_assert_simple!(self.assignments.is_at_the_root_level());

        self.state = SolverState::Solving;
        self.assumptions = assumptions.to_vec();
        self.learned_clause_manager.initialise_database_limit(
            self.clausal_propagator.permanent_clauses.len(),
            &self.options,
        );
    }

    fn solve_internal(&mut self, termination: &mut impl TerminationCondition) -> SolveResult {
        loop {
            if termination.should_stop() {
                self.restore_state_at_root();
                self.state = SolverState::Timeout;
                return SolveResult::Unknown;
            }

            match self.propagate_enqueued(termination) {
                Ok(()) => {
                    if self.assignments.is_at_the_root_level() {
                        self.simplify();
                    }

                    if self
                        .learned_clause_manager
                        .should_shrink_database(self.assignments.num_trail_entries())
                    {
                        debug!(
                            "Shrinking the learned clause database, currently {} clauses",
                            self.learned_clause_manager.num_learned_clauses()
                        );
                        self.learned_clause_manager.shrink_learned_clause_database(
                            &self.assignments,
                            &mut self.clausal_propagator,
                            &mut self.clause_allocator,
                        );
                        self.run_garbage_collection_if_needed();
                    }

                    if self.restart_strategy.should_restart() {
                        self.restart_during_search();
                    }

                    self.assignments.increase_decision_level();
                    if let Err(result) = self.enqueue_next_decision() {
                        return result;
                    }
                }
                Err(conflicting_clause_reference) => {
                    self.counters.num_conflicts += 1;
                    termination.conflict_has_occurred();

                    if self.assignments.is_at_the_root_level() {
                        self.state = SolverState::Infeasible;
                        return SolveResult::Unsatisfiable;
                    }

                    self.resolve_conflict(conflicting_clause_reference);

                    self.learned_clause_manager.decay_clause_activities();
                    self.variable_selector.decay_activities();
                    self.learned_clause_manager.on_conflict();
                    self.restart_strategy.notify_conflict();
                }
            }

            self.counters.num_iterations += 1;
            termination.iteration_has_completed();
        }
    }

    fn propagate_enqueued(
        &mut self,
        termination: &mut impl TerminationCondition,
    ) -> Result<(), ClauseReference> {
        let num_trail_entries_before = self.assignments.num_trail_entries();
        let result = self
            .clausal_propagator
            .propagate(&mut self.assignments, &mut self.clause_allocator);

        let num_propagations = self.assignments.num_trail_entries() - num_trail_entries_before;
        self.counters.num_propagations += num_propagations as u64;
        for _ in 0..num_propagations {
            termination.literal_has_been_propagated();
        }

        result
    }

    /// Enqueues the next assumption, or asks the decision heuristic for a
    /// branching literal. Returns an error carrying the final result when the
    /// search is over: either every variable is assigned (satisfiable) or an
    /// assumption is violated.
    fn enqueue_next_decision(&mut self) -> Result<(), SolveResult> {
        let assumption_index = self.assignments.get_decision_level() - 1;
        if assumption_index < self.assumptions.len() {
            let assumption_literal = self.assumptions[assumption_index];
            return self.enqueue_assumption_literal(assumption_literal);
        }

        match self.next_branching_variable() {
            Some(variable) => {
                self.counters.num_decisions += 1;
                let polarity = self.value_selector.select_value(variable, &mut self.random);
                self.assignments
                    .enqueue_decision_literal(Literal::new(variable, polarity));
                Ok(())
            }
            None => {
                // Every eligible variable is assigned and propagation is
                // complete, so the assignment is a model.
                let solution = self.extract_solution();
                self.restore_state_at_root();
                self.state = SolverState::ContainsSolution;
                Err(SolveResult::Satisfiable(solution))
            }
        }
    }

    fn enqueue_assumption_literal(
        &mut self,
        assumption_literal: Literal,
    ) -> Result<(), SolveResult> {
        // Case 1: the assumption is unassigned; assign it.
        if self.assignments.is_literal_unassigned(assumption_literal) {
            self.assignments.enqueue_decision_literal(assumption_literal);
            Ok(())
        }
        // Case 2: the assumption was already propagated to true by earlier
        // assumptions or at the root. The decision level stays empty so that
        // the convention "assumption i sits at decision level i + 1" holds.
        else if self.assignments.is_literal_assigned_true(assumption_literal) {
            Ok(())
        }
        // Case 3: the assumption is false under the earlier assumptions; the
        // instance is unsatisfiable under the given assumptions.
        else {
            let core = self.compute_assumption_core(assumption_literal);
            self.restore_state_at_root();
            self.state = SolverState::InfeasibleUnderAssumptions;
            Err(SolveResult::UnsatisfiableUnderAssumptions(core))
        }
    }

    fn next_branching_variable(&mut self) -> Option<PropositionalVariable> {
        if self.options.random_decision_frequency > 0.0 {
            let make_random_decision = if self.options.periodic_random_decisions {
                let period = (1.0 / self.options.random_decision_frequency) as u64;
                self.num_decisions_since_last_random_decision + 1 >= period
            } else {
                self.random
                    .generate_bool(self.options.random_decision_frequency)
            };

            if make_random_decision {
                self.num_decisions_since_last_random_decision = 0;
                if let Some(variable) = self
                    .variable_selector
                    .random_decision_variable(&self.assignments, &mut self.random)
                {
                    return Some(variable);
                }
            } else {
                self.num_decisions_since_last_random_decision += 1;
            }
        }

        self.variable_selector.next_decision_variable(
            &self.assignments,
            &self.clause_allocator,
            &self.clausal_propagator.permanent_clauses,
            self.learned_clause_manager.learned_clauses(),
            &mut self.random,
        )
    }

    fn extract_solution(&self) -> Solution {
        let mut truth_values = KeyedVec::default();
        for index in 0..self.assignments.num_propositional_variables() {
            let variable = PropositionalVariable::new(index);
            truth_values.push(self.assignments.is_variable_assigned_true(variable));
        }
        Solution::new(truth_values)
    }

    /// Computes the learned clause from the conflict, backtracks, and
    /// attaches the clause so that its asserting literal is propagated.
    fn resolve_conflict(&mut self, conflicting_clause_reference: ClauseReference) {
        self.compute_1uip(conflicting_clause_reference);
        self.process_learned_clause();
        self.state = SolverState::Solving;
    }

    /// First-unique-implication-point conflict analysis. The learned clause
    /// is stored in the analysis result with the asserting literal at
    /// position zero and a literal of the backjump level at position one.
    fn compute_1uip(&mut self, conflicting_clause_reference: ClauseReference) {
        self.analysis_result.learned_literals.clear();
        // Placeholder for the asserting literal, which by convention ends up
        // at position zero.
        self.analysis_result
            .learned_literals
            .push(self.assignments.true_literal);
        self.analysis_result.backjump_level = 0;

        if self.options.activity_bump_policy == ActivityBumpPolicy::ConflictClause {
            for index in 0..self.clause_allocator[conflicting_clause_reference].len() {
                let literal = self.clause_allocator[conflicting_clause_reference][index];
                if !self.assignments.is_literal_root_assignment(literal) {
                    self.variable_selector
                        .bump_activity(literal.get_propositional_variable());
                }
            }
        }

        let mut num_current_level_literals_to_inspect: usize = 0;
        let mut next_trail_index = self.assignments.num_trail_entries() - 1;
        let mut next_literal: Option<Literal> = None;

        loop {
            // In the first iteration the conflicting clause is resolved;
            // afterwards it is the reason of the next seen trail literal.
            let clause_reference = match next_literal {
                Some(propagated_literal) => {
                    self.assignments.get_literal_reason(propagated_literal)
                }
                None => conflicting_clause_reference,
            };

            if self.clause_allocator[clause_reference].is_learned() {
                self.learned_clause_manager
                    .update_clause_usage(clause_reference, &mut self.clause_allocator);
            }

            // Skip position zero when the clause is a propagation reason,
            // since that position holds the propagated literal itself.
            let start_index = next_literal.is_some() as usize;
            for literal_index in start_index..self.clause_allocator[clause_reference].len() as usize
            {
                let reason_literal = self.clause_allocator[clause_reference][literal_index as u32];
                let variable = reason_literal.get_propositional_variable();

                if self.assignments.is_literal_root_assignment(reason_literal)
                    || self.seen[variable]
                {
                    continue;
                }
                self.seen[variable] = true;

                if self.options.activity_bump_policy == ActivityBumpPolicy::Default {
                    self.variable_selector.bump_activity(variable);
                }

                let literal_level = self.assignments.get_literal_assignment_level(reason_literal);
                if literal_level == self.assignments.get_decision_level() {
                    num_current_level_literals_to_inspect += 1;
                } else {
                    // Literals from earlier levels go into the learned
                    // clause; the one with the highest level must sit at
                    // position one to be the second watched literal.
                    self.analysis_result.learned_literals.push(reason_literal);
                    if literal_level > self.analysis_result.backjump_level {
                        self.analysis_result.backjump_level = literal_level;

                        let last_index = self.analysis_result.learned_literals.len() - 1;
                        self.analysis_result.learned_literals[last_index] =
                            self.analysis_result.learned_literals[1];
                        self.analysis_result.learned_literals[1] = reason_literal;
                    }
                }
            }

            // Find the next trail literal that is part of the conflict.
            while !self.seen[self
                .assignments
                .get_trail_entry(next_trail_index)
                .get_propositional_variable()]
            {
                next_trail_index -= 1;
                pitaya_assert_advanced!(
                    self.assignments.get_literal_assignment_level(
                        self.assignments.get_trail_entry(next_trail_index)
                    ) == self.assignments.get_decision_level(),
                    "Conflict analysis may not leave the current decision level"
                );
            }

            let trail_literal = self.assignments.get_trail_entry(next_trail_index);
            // A trail literal is encountered at most once, so its flag can be
            // cleared immediately.
            self.seen[trail_literal.get_propositional_variable()] = false;
            num_current_level_literals_to_inspect -= 1;
            next_trail_index -= 1;

            if num_current_level_literals_to_inspect == 0 {
                // The first unique implication point: the negation of the
                // remaining current-level literal is asserted by the clause.
                self.analysis_result.learned_literals[0] = !trail_literal;
                break;
            }
            next_literal = Some(trail_literal);
        }

        for index in 1..self.analysis_result.learned_literals.len() {
            let variable = self.analysis_result.learned_literals[index]
                .get_propositional_variable();
            self.seen[variable] = false;
        }

        self.learned_clause_minimiser.remove_dominated_literals(
            &mut self.analysis_result,
            self.options.minimisation_mode,
            &self.assignments,
            &self.clause_allocator,
        );

        if self.options.activity_bump_policy == ActivityBumpPolicy::LearnedClause {
            for index in 0..self.analysis_result.learned_literals.len() {
                let variable = self.analysis_result.learned_literals[index]
                    .get_propositional_variable();
                self.variable_selector.bump_activity(variable);
            }
        }
    }

    fn process_learned_clause(&mut self) {
        self.counters.num_learned_literals +=
            self.analysis_result.learned_literals.len() as u64;

        // A learned unit becomes a root assignment instead of a stored
        // clause.
        if self.analysis_result.learned_literals.len() == 1 {
            self.backtrack(0);
            self.assignments
                .enqueue_decision_literal(self.analysis_result.learned_literals[0]);
            self.counters.num_unit_clauses_learned += 1;
        } else {
            self.backtrack(self.analysis_result.backjump_level);

            let clause_reference = self.learned_clause_manager.add_learned_clause(
                self.analysis_result.learned_literals.clone(),
                &mut self.clausal_propagator,
                &mut self.assignments,
                &mut self.clause_allocator,
            );
            self.learned_clause_manager
                .bump_clause_activity(clause_reference, &mut self.clause_allocator);
            self.counters.num_learned_clauses += 1;
        }
    }

    /// A restart differs from plain backtracking to the root in that the
    /// restart strategy moves to its next interval. Restarts never interfere
    /// with assumption levels.
    fn restart_during_search(&mut self) {
        if self.assignments.get_decision_level() <= self.assumptions.len() {
            return;
        }

        debug!(
            "Restarting after {} conflicts",
            self.counters.num_conflicts
        );
        self.backtrack(0);
        self.restart_strategy.notify_restart();
        self.counters.num_restarts = self.restart_strategy.num_restarts();
    }

    fn backtrack(&mut self, backtrack_level: usize) {
        pitaya_assert_simple!(backtrack_level < self.assignments.get_decision_level());

        let phase_saving_mode = self.options.phase_saving_mode;
        let last_decision_level_start = self
            .assignments
            .start_of_decision_level(self.assignments.get_decision_level());
        let mut trail_index = self.assignments.num_trail_entries();

        let SatisfactionSolver {
            assignments,
            variable_selector,
            value_selector,
            ..
        } = self;

        assignments.synchronise(backtrack_level).for_each(|literal| {
            trail_index -= 1;
            let variable = literal.get_propositional_variable();
            variable_selector.restore(variable);

            let save_phase = match phase_saving_mode {
                PhaseSavingMode::None => false,
                PhaseSavingMode::Limited => trail_index >= last_decision_level_start,
                PhaseSavingMode::Full => true,
            };
            if save_phase {
                value_selector.update_if_not_frozen(variable, literal.is_positive());
            }
        });

        self.clausal_propagator
            .synchronise(self.assignments.num_trail_entries());
    }

    fn restore_state_at_root(&mut self) {
        if self.assignments.get_decision_level() > 0 {
            self.backtrack(0);
        }
    }

    /// Root-level database simplification: deletes clauses satisfied at the
    /// root, trims root-falsified literals from the remaining clauses,
    /// compacts the trail, and recycles released variables. A no-op unless
    /// new root assignments arrived since the previous call.
    fn simplify(&mut self) {
        pitaya_assert_simple!(self.assignments.is_at_the_root_level());
        pitaya_assert_simple!(
            self.clausal_propagator
                .is_propagation_complete(self.assignments.num_trail_entries())
        );

        if self.assignments.num_trail_entries()
            == self.num_root_assignments_at_last_simplification
        {
            return;
        }

        let mut learned_clauses =
            std::mem::take(self.learned_clause_manager.learned_clauses_mut());
        self.remove_root_satisfied_clauses(&mut learned_clauses);
        *self.learned_clause_manager.learned_clauses_mut() = learned_clauses;

        let mut permanent_clauses = std::mem::take(&mut self.clausal_propagator.permanent_clauses);
        self.remove_root_satisfied_clauses(&mut permanent_clauses);
        self.clausal_propagator.permanent_clauses = permanent_clauses;

        self.compact_trail_and_recycle_released_variables();
        self.run_garbage_collection_if_needed();

        self.num_root_assignments_at_last_simplification =
            self.assignments.num_trail_entries();
    }

    fn remove_root_satisfied_clauses(&mut self, clause_references: &mut Vec<ClauseReference>) {
        clause_references.retain(|&clause_reference| {
            let is_satisfied = self.clause_allocator[clause_reference]
                .get_literal_slice()
                .iter()
                .any(|&literal| self.assignments.is_literal_assigned_true(literal));

            if is_satisfied {
                self.clausal_propagator.remove_clause_from_consideration(
                    self.clause_allocator[clause_reference].get_literal_slice(),
                    clause_reference,
                );
                self.clause_allocator.delete_clause(clause_reference);
                return false;
            }

            // Drop root-falsified literals beyond the watched positions.
            let mut literal_index = 2;
            while literal_index < self.clause_allocator[clause_reference].len() {
                let literal = self.clause_allocator[clause_reference][literal_index];
                if self.assignments.is_literal_assigned_false(literal) {
                    self.clause_allocator
                        .remove_literal_from_clause(clause_reference, literal_index);
                } else {
                    literal_index += 1;
                }
            }
            true
        });
    }

    /// Rebuilds the root trail. Entries of released variables are dropped
    /// entirely and their indices moved to the free list; every other entry
    /// is re-enqueued as a plain root assignment. The reason clauses of root
    /// assignments are never inspected again, so losing them is harmless.
    fn compact_trail_and_recycle_released_variables(&mut self) {
        let root_entries: Vec<Literal> = (0..self.assignments.num_trail_entries())
            .map(|index| self.assignments.get_trail_entry(index))
            .collect();

        self.assignments.flush_trail();

        for literal in root_entries {
            let variable = literal.get_propositional_variable();
            self.assignments.undo_assignment(variable);

            if self.released_variables.contains(&variable) {
                // Every clause mentioning the variable was satisfied at the
                // root and has been deleted, so the index can be recycled.
                self.free_variables.push(variable);
            } else {
                self.assignments.enqueue_decision_literal(literal);
            }
        }
        self.released_variables.clear();

        self.clausal_propagator
            .synchronise(self.assignments.num_trail_entries());
    }

    fn run_garbage_collection_if_needed(&mut self) {
        if self.clause_allocator.wasted_fraction()
            <= self.options.garbage_tolerated_waste_fraction
        {
            return;
        }

        debug!(
            "Collecting clause garbage, wasted fraction {:.2}",
            self.clause_allocator.wasted_fraction()
        );

        let mapping = self.clause_allocator.garbage_collect();
        self.clausal_propagator.remap_clause_references(&mapping);
        self.learned_clause_manager.remap_clause_references(&mapping);

        // Rewrite the reason references stored for propagated trail entries.
        for trail_index in 0..self.assignments.num_trail_entries() {
            let variable = self
                .assignments
                .get_trail_entry(trail_index)
                .get_propositional_variable();
            if self.assignments.is_variable_propagated(variable) {
                let new_reference =
                    mapping[self.assignments.get_variable_reason(variable).get_code() as usize];
                pitaya_assert_simple!(
                    !new_reference.is_null(),
                    "A reason clause may not be deleted before garbage collection"
                );
                self.assignments.update_reason(variable, new_reference);
            }
        }
    }

    /// Computes the subset of assumptions responsible for falsifying the
    /// given assumption, by resolving backwards over the assumption levels of
    /// the trail until only assumption decisions remain.
    fn compute_assumption_core(&mut self, violated_assumption: Literal) -> Vec<Literal> {
        pitaya_assert_simple!(self.assignments.is_literal_assigned_false(violated_assumption));

        let mut core = vec![violated_assumption];
        if self.assignments.get_decision_level() == 0
            || self
                .assignments
                .is_literal_root_assignment(violated_assumption)
        {
            return core;
        }

        self.seen[violated_assumption.get_propositional_variable()] = true;

        let first_non_root_entry = self.assignments.start_of_decision_level(1);
        for trail_index in (first_non_root_entry..self.assignments.num_trail_entries()).rev() {
            let trail_literal = self.assignments.get_trail_entry(trail_index);
            let variable = trail_literal.get_propositional_variable();
            if !self.seen[variable] {
                continue;
            }

            if self.assignments.is_variable_decision(variable) {
                // Decisions made before any free search are assumptions.
                core.push(trail_literal);
            } else {
                let reason_reference = self.assignments.get_variable_reason(variable);
                for literal_index in 1..self.clause_allocator[reason_reference].len() {
                    let antecedent = self.clause_allocator[reason_reference][literal_index];
                    if !self.assignments.is_literal_root_assignment(antecedent) {
                        self.seen[antecedent.get_propositional_variable()] = true;
                    }
                }
            }
            self.seen[variable] = false;
        }
        self.seen[violated_assumption.get_propositional_variable()] = false;

        core
    }
}

/// The learned clause produced by conflict analysis, with the asserting
/// literal at position zero and, when the clause is not a unit, a literal of
/// the backjump level at position one.
#[derive(Clone, Default, Debug)]
pub(crate) struct ConflictAnalysisResult {
    pub(crate) learned_literals: Vec<Literal>,
    pub(crate) backjump_level: usize,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
enum SolverState {
    #[default]
    Ready,
    Solving,
    ContainsSolution,
    /// Unsatisfiable regardless of assumptions; terminal.
    Infeasible,
    InfeasibleUnderAssumptions,
    Timeout,
}

impl SolverState {
    fn is_infeasible(self) -> bool {
        self == SolverState::Infeasible
    }
}

/// Read-only search counters, reset only when the solver is created.
#[derive(Default, Debug, Clone, Copy)]
pub struct SolverStatistics {
    pub num_decisions: u64,
    pub num_conflicts: u64,
    pub num_propagations: u64,
    pub num_restarts: u64,
    pub num_learned_clauses: u64,
    pub num_unit_clauses_learned: u64,
    pub num_learned_literals: u64,
    pub num_iterations: u64,
}

impl SolverStatistics {
    fn log_statistics(&self) {
        debug!("Decisions: {}", self.num_decisions);
        debug!("Conflicts: {}", self.num_conflicts);
        debug!("Propagations: {}", self.num_propagations);
        debug!("Restarts: {}", self.num_restarts);
        debug!(
            "Learned clauses: {} ({} units, {} literals in total)",
            self.num_learned_clauses, self.num_unit_clauses_learned, self.num_learned_literals
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::SequenceGeneratorType;
    use crate::engine::options::DecisionHeuristic;
    use crate::engine::options::MinimisationMode;
    use crate::engine::termination::Indefinite;
    use crate::engine::termination::IterationBudget;
    use crate::engine::termination::TimeBudget;

    fn solver_with_variables(num_variables: usize) -> (SatisfactionSolver, Vec<Literal>) {
        solver_with_options(num_variables, SatOptions::default())
    }

    fn solver_with_options(
        num_variables: usize,
        options: SatOptions,
    ) -> (SatisfactionSolver, Vec<Literal>) {
        // Run the tests with RUST_LOG=debug to see the search log.
        let _ = env_logger::builder().is_test(true).try_init();

        let mut solver = SatisfactionSolver::new(options);
        let literals = (0..num_variables)
            .map(|_| Literal::new(solver.new_variable(), true))
            .collect();
        (solver, literals)
    }

    /// (x1 | x2) & (!x1 | x2) & (x1 | !x2) & (!x1 | !x2)
    fn add_exhaustive_binary_clauses(solver: &mut SatisfactionSolver, x: &[Literal]) {
        let _ = solver.add_clause(&[x[0], x[1]]);
        let _ = solver.add_clause(&[!x[0], x[1]]);
        let _ = solver.add_clause(&[x[0], !x[1]]);
        let _ = solver.add_clause(&[!x[0], !x[1]]);
    }

    #[test]
    fn single_unit_clause_is_satisfiable() {
        let (mut solver, x) = solver_with_variables(1);
        assert!(solver.add_clause(&[x[0]]).is_ok());

        let result = solver.solve(&mut Indefinite, &[]);
        match result {
            SolveResult::Satisfiable(solution) => {
                assert!(solution.get_literal_value(x[0]));
                assert!(solution.get_literals().any(|literal| literal == x[0]));
            }
            _ => panic!("expected a satisfiable result"),
        }
    }

    #[test]
    fn contradictory_units_are_unsatisfiable_without_search() {
        let (mut solver, x) = solver_with_variables(1);
        assert!(solver.add_clause(&[x[0]]).is_ok());
        assert_eq!(
            solver.add_clause(&[!x[0]]),
            Err(SolverError::StructuralContradiction)
        );

        let result = solver.solve(&mut Indefinite, &[]);
        assert!(result.is_unsatisfiable());
        assert_eq!(solver.statistics().num_decisions, 0);
    }

    #[test]
    fn exhaustive_binary_clauses_are_unsatisfiable_through_learning() {
        let (mut solver, x) = solver_with_variables(2);
        add_exhaustive_binary_clauses(&mut solver, &x);

        let result = solver.solve(&mut Indefinite, &[]);
        assert!(result.is_unsatisfiable());
        assert!(solver.statistics().num_conflicts >= 1);
        assert!(solver.statistics().num_unit_clauses_learned >= 1);
    }

    #[test]
    fn three_variable_chain_learns_at_least_one_clause() {
        let (mut solver, x) = solver_with_variables(3);
        assert!(solver.add_clause(&[x[0], x[1]]).is_ok());
        assert!(solver.add_clause(&[!x[0], x[1]]).is_ok());
        assert!(solver.add_clause(&[!x[1], x[2]]).is_ok());
        assert!(solver.add_clause(&[!x[1], !x[2]]).is_ok());

        let result = solver.solve(&mut Indefinite, &[]);
        assert!(result.is_unsatisfiable());
        assert!(
            solver.statistics().num_learned_clauses
                + solver.statistics().num_unit_clauses_learned
                >= 1
        );
    }

    #[test]
    fn models_satisfy_every_clause() {
        let (mut solver, x) = solver_with_variables(4);
        let clauses: Vec<Vec<Literal>> = vec![
            vec![x[0], x[1], x[2]],
            vec![!x[0], x[2], x[3]],
            vec![!x[1], !x[2]],
            vec![x[1], !x[3]],
            vec![!x[2], x[3], x[0]],
        ];
        for clause in &clauses {
            assert!(solver.add_clause(clause).is_ok());
        }

        let result = solver.solve(&mut Indefinite, &[]);
        match result {
            SolveResult::Satisfiable(solution) => {
                for clause in &clauses {
                    assert!(
                        clause
                            .iter()
                            .any(|&literal| solution.get_literal_value(literal)),
                        "every clause must have a satisfied literal"
                    );
                }
            }
            _ => panic!("expected a satisfiable result"),
        }
    }

    #[test]
    fn incremental_clause_addition_flips_the_verdict_permanently() {
        let (mut solver, x) = solver_with_variables(2);
        assert!(solver.add_clause(&[x[0], x[1]]).is_ok());
        assert!(solver.solve(&mut Indefinite, &[]).is_satisfiable());

        add_exhaustive_binary_clauses(&mut solver, &x);
        assert!(solver.solve(&mut Indefinite, &[]).is_unsatisfiable());
        // The infeasibility is permanent; no search is repeated.
        assert!(solver.solve(&mut Indefinite, &[]).is_unsatisfiable());
    }

    #[test]
    fn released_variables_are_recycled() {
        let (mut solver, x) = solver_with_variables(2);
        assert!(solver.add_clause(&[x[0], x[1]]).is_ok());
        assert!(solver.solve(&mut Indefinite, &[]).is_satisfiable());

        let released = x[1].get_propositional_variable();
        assert!(solver.release_variable(!x[1]).is_ok());
        assert!(solver.solve(&mut Indefinite, &[]).is_satisfiable());

        // The released index is handed out again.
        let recycled = solver.new_variable();
        assert_eq!(recycled, released);

        let recycled_literal = Literal::new(recycled, true);
        assert!(solver.add_clause(&[recycled_literal]).is_ok());
        match solver.solve(&mut Indefinite, &[]) {
            SolveResult::Satisfiable(solution) => {
                assert!(solution.get_literal_value(recycled_literal));
                assert!(solution.get_literal_value(x[0]));
            }
            _ => panic!("expected a satisfiable result"),
        }
    }

    #[test]
    fn violated_assumptions_produce_a_core() {
        let (mut solver, x) = solver_with_variables(2);
        assert!(solver.add_clause(&[!x[0], !x[1]]).is_ok());

        let assumptions = [x[0], x[1]];
        match solver.solve(&mut Indefinite, &assumptions) {
            SolveResult::UnsatisfiableUnderAssumptions(core) => {
                assert!(!core.is_empty());
                assert!(core.iter().all(|literal| assumptions.contains(literal)));
            }
            _ => panic!("expected unsatisfiability under the assumptions"),
        }

        // Without assumptions the instance is satisfiable.
        assert!(solver.solve(&mut Indefinite, &[]).is_satisfiable());
    }

    #[test]
    fn directly_conflicting_assumptions_produce_a_core() {
        let (mut solver, x) = solver_with_variables(2);
        assert!(solver.add_clause(&[x[0], x[1]]).is_ok());

        match solver.solve(&mut Indefinite, &[x[0], !x[0]]) {
            SolveResult::UnsatisfiableUnderAssumptions(core) => {
                assert!(core.contains(&!x[0]) || core.contains(&x[0]));
            }
            _ => panic!("expected unsatisfiability under the assumptions"),
        }
    }

    #[test]
    fn iteration_budget_returns_unknown_and_counts_iterations() {
        let (mut solver, x) = solver_with_variables(2);
        add_exhaustive_binary_clauses(&mut solver, &x);

        let mut termination = IterationBudget::new(1);
        let result = solver.solve(&mut termination, &[]);
        assert!(result.is_unknown());
        assert_eq!(termination.num_iterations(), 1);
    }

    #[test]
    fn exhausted_time_budget_returns_unknown_immediately() {
        let (mut solver, x) = solver_with_variables(2);
        add_exhaustive_binary_clauses(&mut solver, &x);

        let mut termination = TimeBudget::starting_now(std::time::Duration::from_secs(0));
        assert!(solver.solve(&mut termination, &[]).is_unknown());
    }

    #[test]
    fn verdict_is_invariant_under_restart_strategy() {
        for sequence_generator_type in [
            SequenceGeneratorType::Constant,
            SequenceGeneratorType::Geometric,
            SequenceGeneratorType::Luby,
        ] {
            let options = SatOptions {
                restart_sequence_generator_type: sequence_generator_type,
                restart_base_interval: 1,
                ..Default::default()
            };
            let (mut solver, x) = solver_with_options(3, options);
            assert!(solver.add_clause(&[x[0], x[1]]).is_ok());
            assert!(solver.add_clause(&[!x[0], x[1]]).is_ok());
            assert!(solver.add_clause(&[!x[1], x[2]]).is_ok());
            assert!(solver.add_clause(&[!x[1], !x[2]]).is_ok());

            assert!(solver.solve(&mut Indefinite, &[]).is_unsatisfiable());
        }
    }

    #[test]
    fn verdict_is_invariant_under_decision_heuristic() {
        for decision_heuristic in [
            DecisionHeuristic::Activity,
            DecisionHeuristic::Random,
            DecisionHeuristic::StaticOccurrence,
            DecisionHeuristic::DynamicOccurrence,
            DecisionHeuristic::JeroslowWang,
            DecisionHeuristic::Mom,
            DecisionHeuristic::Chb,
        ] {
            let options = SatOptions {
                decision_heuristic,
                ..Default::default()
            };
            let (mut solver, x) = solver_with_options(2, options);
            add_exhaustive_binary_clauses(&mut solver, &x);
            assert!(
                solver.solve(&mut Indefinite, &[]).is_unsatisfiable(),
                "wrong verdict under {decision_heuristic:?}"
            );

            let (mut solver, x) = solver_with_options(3, options);
            assert!(solver.add_clause(&[x[0], x[1], x[2]]).is_ok());
            assert!(solver.add_clause(&[!x[0], x[1]]).is_ok());
            assert!(
                solver.solve(&mut Indefinite, &[]).is_satisfiable(),
                "wrong verdict under {decision_heuristic:?}"
            );
        }
    }

    #[test]
    fn verdict_is_invariant_under_minimisation_mode() {
        for minimisation_mode in [
            MinimisationMode::None,
            MinimisationMode::Basic,
            MinimisationMode::Deep,
        ] {
            let options = SatOptions {
                minimisation_mode,
                ..Default::default()
            };
            let (mut solver, x) = solver_with_options(4, options);
            assert!(solver.add_clause(&[x[0], x[1]]).is_ok());
            assert!(solver.add_clause(&[!x[1], x[2]]).is_ok());
            assert!(solver.add_clause(&[!x[0], x[2]]).is_ok());
            assert!(solver.add_clause(&[!x[2], x[3]]).is_ok());
            assert!(solver.add_clause(&[!x[2], !x[3]]).is_ok());

            assert!(
                solver.solve(&mut Indefinite, &[]).is_unsatisfiable(),
                "wrong verdict under {minimisation_mode:?}"
            );
        }
    }

    #[test]
    fn verdict_is_invariant_under_bump_policy() {
        for activity_bump_policy in [
            ActivityBumpPolicy::Default,
            ActivityBumpPolicy::ConflictClause,
            ActivityBumpPolicy::LearnedClause,
        ] {
            let options = SatOptions {
                activity_bump_policy,
                ..Default::default()
            };
            let (mut solver, x) = solver_with_options(2, options);
            add_exhaustive_binary_clauses(&mut solver, &x);
            assert!(
                solver.solve(&mut Indefinite, &[]).is_unsatisfiable(),
                "wrong verdict under {activity_bump_policy:?}"
            );
        }
    }

    #[test]
    fn dimacs_export_renumbers_variables_densely() {
        let (mut solver, _) = solver_with_variables(5);
        let x4 = Literal::new(PropositionalVariable::new(4), true);
        let x5 = Literal::new(PropositionalVariable::new(5), true);
        assert!(solver.add_clause(&[x4, !x5]).is_ok());

        let mut output = Vec::new();
        solver.to_dimacs(&[], &mut output).expect("writing to a vec cannot fail");
        let text = String::from_utf8(output).expect("DIMACS output is ASCII");
        assert_eq!(text, "p cnf 2 1\n1 -2 0\n");
    }

    #[test]
    fn dimacs_export_of_infeasible_solver_is_the_canonical_contradiction() {
        let (mut solver, x) = solver_with_variables(1);
        assert!(solver.add_clause(&[x[0]]).is_ok());
        let _ = solver.add_clause(&[!x[0]]);

        let mut output = Vec::new();
        solver.to_dimacs(&[], &mut output).expect("writing to a vec cannot fail");
        let text = String::from_utf8(output).expect("DIMACS output is ASCII");
        assert_eq!(text, "p cnf 1 2\n1 0\n-1 0\n");
    }

    #[test]
    fn dimacs_export_includes_assumptions_as_units() {
        let (mut solver, x) = solver_with_variables(2);
        assert!(solver.add_clause(&[x[0], x[1]]).is_ok());

        let mut output = Vec::new();
        solver
            .to_dimacs(&[!x[1]], &mut output)
            .expect("writing to a vec cannot fail");
        let text = String::from_utf8(output).expect("DIMACS output is ASCII");
        assert_eq!(text, "p cnf 2 2\n-1 0\n2 1 0\n");
    }

    #[test]
    fn simplification_is_idempotent_on_the_exported_clause_set() {
        let (mut solver, x) = solver_with_variables(3);
        assert!(solver.add_clause(&[x[0]]).is_ok());
        assert!(solver.add_clause(&[x[0], x[1]]).is_ok());
        assert!(solver.add_clause(&[!x[1], x[2], !x[0]]).is_ok());

        assert!(solver.solve(&mut Indefinite, &[]).is_satisfiable());
        let mut first = Vec::new();
        solver.to_dimacs(&[], &mut first).expect("writing to a vec cannot fail");

        assert!(solver.solve(&mut Indefinite, &[]).is_satisfiable());
        let mut second = Vec::new();
        solver.to_dimacs(&[], &mut second).expect("writing to a vec cannot fail");

        assert_eq!(first, second);
    }

    #[test]
    fn forced_polarity_is_respected_in_the_model() {
        let (mut solver, x) = solver_with_variables(2);
        assert!(solver.add_clause(&[x[0], x[1]]).is_ok());
        solver.set_polarity(x[0].get_propositional_variable(), true);
        solver.set_polarity(x[1].get_propositional_variable(), false);

        match solver.solve(&mut Indefinite, &[]) {
            SolveResult::Satisfiable(solution) => {
                assert!(solution.get_literal_value(x[0]));
                assert!(!solution.get_literal_value(x[1]));
            }
            _ => panic!("expected a satisfiable result"),
        }
    }
}
