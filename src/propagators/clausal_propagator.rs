use crate::basic_types::ClauseReference;
use crate::basic_types::HashMap;
use crate::basic_types::Literal;
use crate::basic_types::SolverError;
use crate::engine::sat::Assignments;
use crate::engine::sat::ClauseAllocator;
use crate::pitaya_assert_moderate;
use crate::pitaya_assert_simple;

/// Watched-literal unit propagation over the clause arena.
///
/// Every clause of length at least two is watched through the literals at its
/// positions zero and one; a watcher additionally caches a literal of the
/// clause so that satisfied clauses are often dismissed without touching the
/// arena.
#[derive(Default, Debug)]
pub(crate) struct ClausalPropagator {
    pub(crate) watch_lists: Vec<Vec<ClauseWatcher>>,
    pub(crate) next_position_on_trail_to_propagate: usize,
    /// References of the non-learned clauses currently attached.
    pub(crate) permanent_clauses: Vec<ClauseReference>,
    is_in_infeasible_state: bool,
}

impl ClausalPropagator {
    pub(crate) fn grow(&mut self) {
        // One watch list per polarity.
        self.watch_lists.push(vec![]);
        self.watch_lists.push(vec![]);
    }

    pub(crate) fn is_in_infeasible_state(&self) -> bool {
        self.is_in_infeasible_state
    }

    /// Removes root-satisfied literals and duplicates, and recognises
    /// tautologies and root-satisfied clauses. The returned clause is empty
    /// if every literal is falsified at the root; it is a unit clause with a
    /// root-true literal if the clause needs no further attention.
    pub(crate) fn preprocess_clause(
        mut literals: Vec<Literal>,
        assignments: &Assignments,
    ) -> Vec<Literal> {
        pitaya_assert_simple!(assignments.is_at_the_root_level());

        literals.sort_by_key(|literal| literal.to_u32());

        let mut previous: Option<Literal> = None;
        let mut write_index = 0;
        for read_index in 0..literals.len() {
            let literal = literals[read_index];

            if assignments.is_literal_assigned_true(literal) {
                // Satisfied at the root; report through a root-true unit.
                return vec![assignments.true_literal];
            }
            if assignments.is_literal_assigned_false(literal) {
                continue;
            }
            if let Some(previous_literal) = previous {
                if previous_literal == literal {
                    continue;
                }
                // Since literals are sorted, a tautology pairs neighbours.
                if previous_literal == !literal {
                    return vec![assignments.true_literal];
                }
            }

            previous = Some(literal);
            literals[write_index] = literal;
            write_index += 1;
        }
        literals.truncate(write_index);
        literals
    }

    /// Adds a clause supplied by the user. Only legal at the root level. An
    /// empty clause after preprocessing puts the solver in a permanently
    /// infeasible state, as does a unit clause whose literal is root-false or
    /// whose propagation runs into a conflict.
    pub(crate) fn add_permanent_clause(
        &mut self,
        literals: Vec<Literal>,
        assignments: &mut Assignments,
        clause_allocator: &mut ClauseAllocator,
    ) -> Result<(), SolverError> {
        pitaya_assert_simple!(assignments.is_at_the_root_level());
        pitaya_assert_simple!(!self.is_in_infeasible_state);

        if literals.is_empty() {
            log::warn!("Adding empty clause, unusual!");
        }

        let literals = ClausalPropagator::preprocess_clause(literals, assignments);

        // Infeasible at the root? The clause is not added to the database.
        if literals.is_empty() {
            self.is_in_infeasible_state = true;
            return Err(SolverError::StructuralContradiction);
        }

        // Unit clauses become root assignments rather than stored clauses.
        if literals.len() == 1 {
            if assignments.is_literal_assigned_false(literals[0]) {
                self.is_in_infeasible_state = true;
                return Err(SolverError::StructuralContradiction);
            } else if assignments.is_literal_unassigned(literals[0]) {
                assignments.enqueue_decision_literal(literals[0]);
                if self.propagate(assignments, clause_allocator).is_err() {
                    self.is_in_infeasible_state = true;
                    return Err(SolverError::StructuralContradiction);
                }
            }
        } else {
            let _ = self.add_clause_unchecked(literals, false, clause_allocator);
        }

        Ok(())
    }

    /// Attaches a learned clause whose asserting literal is at position zero
    /// and enqueues that literal with the new clause as its reason.
    pub(crate) fn add_asserting_learned_clause(
        &mut self,
        literals: Vec<Literal>,
        assignments: &mut Assignments,
        clause_allocator: &mut ClauseAllocator,
    ) -> ClauseReference {
        let asserting_literal = literals[0];
        let clause_reference = self.add_clause_unchecked(literals, true, clause_allocator);
        assignments.enqueue_propagated_literal(asserting_literal, clause_reference);
        clause_reference
    }

    pub(crate) fn add_clause_unchecked(
        &mut self,
        literals: Vec<Literal>,
        is_learned: bool,
        clause_allocator: &mut ClauseAllocator,
    ) -> ClauseReference {
        pitaya_assert_moderate!(literals.len() >= 2);
        pitaya_assert_simple!(!self.is_in_infeasible_state);

        let clause_reference = clause_allocator.create_clause(literals, is_learned);
        let clause = clause_allocator.get_clause(clause_reference);

        if !is_learned {
            self.permanent_clauses.push(clause_reference);
        }
        self.start_watching_clause_unchecked(clause.get_literal_slice(), clause_reference);

        clause_reference
    }

    /// Drains the propagation queue. On success every watcher invariant
    /// holds; on a conflict the reference of the falsified clause is
    /// returned, with the remaining watchers copied back so that the watch
    /// lists stay consistent.
    pub(crate) fn propagate(
        &mut self,
        assignments: &mut Assignments,
        clause_allocator: &mut ClauseAllocator,
    ) -> Result<(), ClauseReference> {
        // This function is deliberately one long loop; it is the solver's
        // hottest path.
        while self.next_position_on_trail_to_propagate < assignments.num_trail_entries() {
            let true_literal =
                assignments.get_trail_entry(self.next_position_on_trail_to_propagate);
            pitaya_assert_simple!(assignments.is_literal_assigned_true(true_literal));

            if self.watch_lists[!true_literal].is_empty() {
                self.next_position_on_trail_to_propagate += 1;
                continue;
            }

            // The watch list of !true_literal is compacted in place: watchers
            // that stay are copied to end_index, watchers that move to a new
            // literal are skipped.
            let mut end_index: usize = 0;
            let mut current_index: usize = 0;
            while current_index < self.watch_lists[!true_literal].len() {
                // If the cached literal is true the clause is satisfied and
                // the arena does not need to be touched.
                let cached_literal = self.watch_lists[!true_literal][current_index].cached_literal;
                if assignments.is_literal_assigned_true(cached_literal) {
                    self.watch_lists[!true_literal][end_index] =
                        self.watch_lists[!true_literal][current_index];
                    current_index += 1;
                    end_index += 1;
                    continue;
                }

                let watched_clause_reference =
                    self.watch_lists[!true_literal][current_index].clause_reference;
                let watched_clause = clause_allocator.get_mutable_clause(watched_clause_reference);

                // Place the falsified watched literal at position 1.
                if watched_clause[0] == !true_literal {
                    watched_clause[0] = watched_clause[1];
                    watched_clause[1] = !true_literal;
                }

                // The other watched literal may already satisfy the clause.
                if assignments.is_literal_assigned_true(watched_clause[0]) {
                    self.watch_lists[!true_literal][current_index].cached_literal =
                        watched_clause[0];
                    self.watch_lists[!true_literal][end_index] =
                        self.watch_lists[!true_literal][current_index];
                    current_index += 1;
                    end_index += 1;
                    continue;
                }

                // Look for a non-falsified literal to take over the watch,
                // starting from index 2 to skip the watched literals.
                let mut found_new_watch = false;
                for i in 2..watched_clause.len() {
                    if !assignments.is_literal_assigned_false(watched_clause[i]) {
                        watched_clause[1] = watched_clause[i];
                        watched_clause[i] = !true_literal;

                        self.watch_lists[watched_clause[1]].push(ClauseWatcher {
                            cached_literal: watched_clause[0],
                            clause_reference: watched_clause_reference,
                        });

                        found_new_watch = true;
                        break;
                    }
                }

                if found_new_watch {
                    // The watcher migrated; nothing is copied to end_index.
                    current_index += 1;
                    continue;
                }

                // Keep the current watch for this literal.
                self.watch_lists[!true_literal][end_index] =
                    self.watch_lists[!true_literal][current_index];
                end_index += 1;
                current_index += 1;

                // All non-watched literals and watched_clause[1] are false:
                // either watched_clause[0] propagates, or the clause is
                // falsified.
                if assignments.is_literal_unassigned(watched_clause[0]) {
                    assignments
                        .enqueue_propagated_literal(watched_clause[0], watched_clause_reference);
                } else {
                    pitaya_assert_moderate!(
                        assignments.is_literal_assigned_false(watched_clause[0])
                    );
                    // Copy back the remaining watchers before reporting.
                    while current_index < self.watch_lists[!true_literal].len() {
                        self.watch_lists[!true_literal][end_index] =
                            self.watch_lists[!true_literal][current_index];
                        current_index += 1;
                        end_index += 1;
                    }
                    self.watch_lists[!true_literal].truncate(end_index);
                    return Err(watched_clause_reference);
                }
            }
            self.watch_lists[!true_literal].truncate(end_index);
            self.next_position_on_trail_to_propagate += 1;
        }
        Ok(())
    }

    pub(crate) fn synchronise(&mut self, trail_size: usize) {
        pitaya_assert_simple!(self.next_position_on_trail_to_propagate >= trail_size);
        self.next_position_on_trail_to_propagate = trail_size;
    }

    pub(crate) fn is_propagation_complete(&self, trail_size: usize) -> bool {
        self.next_position_on_trail_to_propagate == trail_size
    }

    /// Detaches the clause from the watch lists of its two watched literals.
    pub(crate) fn remove_clause_from_consideration(
        &mut self,
        clause: &[Literal],
        clause_reference: ClauseReference,
    ) {
        let remove_clause_from_watchers =
            |watchers: &mut Vec<ClauseWatcher>, clause_reference: ClauseReference| {
                let index = watchers
                    .iter()
                    .position(|watcher| watcher.clause_reference == clause_reference)
                    .expect("The clause must be watched to be detached");
                let _ = watchers.swap_remove(index);
            };

        let watched_literal1 = clause[0];
        let watched_literal2 = clause[1];

        remove_clause_from_watchers(&mut self.watch_lists[watched_literal1], clause_reference);
        remove_clause_from_watchers(&mut self.watch_lists[watched_literal2], clause_reference);
    }

    /// Rewrites every stored clause reference after garbage collection.
    /// `mapping` is indexed by the old clause id.
    pub(crate) fn remap_clause_references(&mut self, mapping: &[ClauseReference]) {
        for watch_list in self.watch_lists.iter_mut() {
            for watcher in watch_list.iter_mut() {
                let new_reference = mapping[watcher.clause_reference.get_code() as usize];
                pitaya_assert_simple!(
                    !new_reference.is_null(),
                    "A deleted clause may not remain watched during garbage collection"
                );
                watcher.clause_reference = new_reference;
            }
        }
        for clause_reference in self.permanent_clauses.iter_mut() {
            let new_reference = mapping[clause_reference.get_code() as usize];
            pitaya_assert_simple!(!new_reference.is_null());
            *clause_reference = new_reference;
        }
    }

    pub(crate) fn debug_check_state(
        &self,
        assignments: &Assignments,
        clause_allocator: &ClauseAllocator,
    ) -> bool {
        assert!(
            self.watch_lists.len() as u32 == 2 * assignments.num_propositional_variables(),
            "Watch list length is not as expected given the number of propositional variables."
        );

        // Each attached clause must appear in the watch lists exactly twice.
        let mut clause_ids: HashMap<ClauseReference, usize> = HashMap::default();
        self.watch_lists.iter().flatten().for_each(|watcher| {
            *clause_ids.entry(watcher.clause_reference).or_insert(0) += 1;
        });
        assert!(
            clause_ids.values().all(|count| *count == 2),
            "There is a clause in the watch list that does not appear exactly twice."
        );

        for literal_code in 0..self.watch_lists.len() {
            let literal = Literal::u32_to_literal(literal_code as u32);
            assert!(self.watch_lists[literal].iter().all(|watcher| {
                    let clause = clause_allocator.get_clause(watcher.clause_reference);
                    clause[0] == literal || clause[1] == literal
            }), "The watches are not correct, i.e., there is a clause in the watch list of a literal that is not a watcher of the clause");
        }

        assert!(
            self.watch_lists.iter().flatten().all(|watcher| {
                let clause = clause_allocator.get_clause(watcher.clause_reference);
                clause
                    .get_literal_slice()
                    .iter()
                    .any(|lit| *lit == watcher.cached_literal)
            }),
            "There is a watcher with a cached literal that is not present in the clause."
        );

        // Every clause-propagated literal must have its clause in the watch
        // lists, sit at position 0 of that clause, with every other literal
        // false, at the maximum level among them.
        for literal_code in 0..self.watch_lists.len() {
            let literal = Literal::u32_to_literal(literal_code as u32);
            if assignments.is_literal_root_assignment(literal) {
                continue;
            }

            if assignments.is_literal_propagated(literal)
                && assignments.is_literal_assigned_true(literal)
            {
                let clause_reference = assignments.get_literal_reason(literal);
                assert!(
                    clause_ids.contains_key(&clause_reference),
                    "The clause responsible for propagation is not in the watch list."
                );

                let clause = clause_allocator.get_clause(clause_reference);
                assert!(clause[0] == literal, "Literal has been propagated by clause, but the literal is not at position 0 as expected.");
                assert!(
                    clause.get_literal_slice()[1..]
                        .iter()
                        .all(|other| assignments.is_literal_assigned_false(*other)),
                    "A clause is recorded as the reason for propagation, but the other literals are not all false."
                );
                let lit_max_decision_level = *clause.get_literal_slice()[1..]
                    .iter()
                    .max_by_key(|other| assignments.get_literal_assignment_level(**other))
                    .unwrap();
                let max_decision_level =
                    assignments.get_literal_assignment_level(lit_max_decision_level);
                assert!(
                    max_decision_level == assignments.get_literal_assignment_level(literal),
                    "Literal propagation level does not match the other literals."
                );
            }
        }

        // The propagator may not have missed a falsified clause or a
        // propagation.
        clause_ids.keys().for_each(|clause_reference| {
            let clause = clause_allocator.get_clause(*clause_reference);
            assert!(
                !clause
                    .get_literal_slice()
                    .iter()
                    .all(|lit| assignments.is_literal_assigned_false(*lit)),
                "Debugging revealed that the clausal propagator missed a falsifying clause."
            );

            let num_falsified_literals = clause
                .get_literal_slice()
                .iter()
                .filter(|lit| assignments.is_literal_assigned_false(**lit))
                .count();

            if num_falsified_literals + 1 == clause.len() as usize {
                let true_literal = clause
                    .get_literal_slice()
                    .iter()
                    .find(|lit| !assignments.is_literal_assigned_false(**lit));
                assert!(
                    assignments.is_literal_assigned_true(*true_literal.unwrap()),
                    "Debugging revealed that the clausal propagator missed a propagation."
                );
            }
        });

        true
    }

    fn start_watching_clause_unchecked(
        &mut self,
        clause: &[Literal],
        clause_reference: ClauseReference,
    ) {
        pitaya_assert_simple!(clause.len() >= 2);

        self.watch_lists[clause[0]].push(ClauseWatcher {
            cached_literal: clause[1],
            clause_reference,
        });

        self.watch_lists[clause[1]].push(ClauseWatcher {
            cached_literal: clause[0],
            clause_reference,
        });
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct ClauseWatcher {
    cached_literal: Literal,
    clause_reference: ClauseReference,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::PropositionalVariable;

    fn setup(num_variables: u32) -> (ClausalPropagator, Assignments, ClauseAllocator) {
        let mut propagator = ClausalPropagator::default();
        let mut assignments = Assignments::default();
        for _ in 0..=num_variables {
            propagator.grow();
            assignments.grow();
        }
        assignments.enqueue_decision_literal(assignments.true_literal);
        (propagator, assignments, ClauseAllocator::default())
    }

    fn lit(index: u32, positive: bool) -> Literal {
        Literal::new(PropositionalVariable::new(index), positive)
    }

    #[test]
    fn preprocessing_removes_duplicates_and_recognises_tautologies() {
        let (_, assignments, _) = setup(3);

        let preprocessed = ClausalPropagator::preprocess_clause(
            vec![lit(1, true), lit(1, true), lit(2, false)],
            &assignments,
        );
        assert_eq!(preprocessed.len(), 2);

        let tautology = ClausalPropagator::preprocess_clause(
            vec![lit(1, true), lit(1, false), lit(2, false)],
            &assignments,
        );
        assert_eq!(tautology, vec![assignments.true_literal]);
    }

    #[test]
    fn unit_clause_becomes_a_root_assignment() {
        let (mut propagator, mut assignments, mut allocator) = setup(2);

        let result =
            propagator.add_permanent_clause(vec![lit(1, true)], &mut assignments, &mut allocator);
        assert!(result.is_ok());
        assert!(assignments.is_literal_assigned_true(lit(1, true)));
        assert!(assignments.is_literal_root_assignment(lit(1, true)));
    }

    #[test]
    fn contradictory_units_are_a_structural_contradiction() {
        let (mut propagator, mut assignments, mut allocator) = setup(1);

        assert!(propagator
            .add_permanent_clause(vec![lit(1, true)], &mut assignments, &mut allocator)
            .is_ok());
        let result =
            propagator.add_permanent_clause(vec![lit(1, false)], &mut assignments, &mut allocator);
        assert_eq!(result, Err(SolverError::StructuralContradiction));
        assert!(propagator.is_in_infeasible_state());
    }

    #[test]
    fn propagation_enqueues_the_forced_literal_with_a_reason() {
        let (mut propagator, mut assignments, mut allocator) = setup(3);

        assert!(propagator
            .add_permanent_clause(
                vec![lit(1, true), lit(2, true), lit(3, true)],
                &mut assignments,
                &mut allocator,
            )
            .is_ok());

        assignments.increase_decision_level();
        assignments.enqueue_decision_literal(lit(1, false));
        assignments.increase_decision_level();
        assignments.enqueue_decision_literal(lit(2, false));

        assert!(propagator.propagate(&mut assignments, &mut allocator).is_ok());
        assert!(assignments.is_literal_assigned_true(lit(3, true)));
        assert!(assignments
            .is_variable_propagated(PropositionalVariable::new(3)));
        assert!(propagator.debug_check_state(&assignments, &allocator));
    }

    #[test]
    fn falsified_clause_is_reported_as_conflict() {
        let (mut propagator, mut assignments, mut allocator) = setup(3);

        assert!(propagator
            .add_permanent_clause(
                vec![lit(1, true), lit(2, true), lit(3, true)],
                &mut assignments,
                &mut allocator,
            )
            .is_ok());

        assignments.increase_decision_level();
        assignments.enqueue_decision_literal(lit(1, false));
        assignments.enqueue_decision_literal(lit(2, false));
        assignments.enqueue_decision_literal(lit(3, false));

        let outcome = propagator.propagate(&mut assignments, &mut allocator);
        assert!(outcome.is_err());
    }
}
