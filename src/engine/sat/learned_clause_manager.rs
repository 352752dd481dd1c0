use super::Assignments;
use super::ClauseAllocator;
use crate::basic_types::ClauseReference;
use crate::basic_types::Literal;
use crate::engine::options::SatOptions;
use crate::pitaya_assert_simple;
use crate::propagators::ClausalPropagator;

/// Owns the learned clause database: clause activities, the deletion policy,
/// and the growth schedule for the database size limit.
#[derive(Debug)]
pub(crate) struct LearnedClauseManager {
    learned_clauses: Vec<ClauseReference>,
    max_clause_activity: f32,
    clause_activity_decay_factor: f32,
    clause_bump_increment: f32,
    /// Retention floor for the database limit.
    min_learned_clauses: u64,
    learntsize_inc: f64,
    learntsize_adjust_inc: f64,
    /// Current limit on the number of learned clauses, relative to the
    /// number of assigned variables.
    max_num_learned_clauses: f64,
    /// Conflicts remaining until the limit grows.
    learntsize_adjust_count: i64,
    learntsize_adjust_conflicts: f64,
}

impl LearnedClauseManager {
    pub(crate) fn new(options: &SatOptions) -> Self {
        LearnedClauseManager {
            learned_clauses: Vec::default(),
            max_clause_activity: options.max_clause_activity,
            clause_activity_decay_factor: options.clause_activity_decay_factor,
            clause_bump_increment: 1.0,
            min_learned_clauses: options.min_learned_clauses,
            learntsize_inc: options.learntsize_inc,
            learntsize_adjust_inc: options.learntsize_adjust_inc,
            max_num_learned_clauses: 0.0,
            learntsize_adjust_count: options.learntsize_adjust_start as i64,
            learntsize_adjust_conflicts: options.learntsize_adjust_start,
        }
    }

    /// Sets the initial database limit from the size of the problem. Called
    /// when search starts.
    pub(crate) fn initialise_database_limit(&mut self, num_clauses: usize, options: &SatOptions) {
        self.max_num_learned_clauses = num_clauses as f64 * options.learntsize_factor;
        if self.max_num_learned_clauses < self.min_learned_clauses as f64 {
            self.max_num_learned_clauses = self.min_learned_clauses as f64;
        }
        self.learntsize_adjust_conflicts = options.learntsize_adjust_start;
        self.learntsize_adjust_count = self.learntsize_adjust_conflicts as i64;
    }

    pub(crate) fn num_learned_clauses(&self) -> usize {
        self.learned_clauses.len()
    }

    pub(crate) fn learned_clauses(&self) -> &[ClauseReference] {
        &self.learned_clauses
    }

    pub(crate) fn learned_clauses_mut(&mut self) -> &mut Vec<ClauseReference> {
        &mut self.learned_clauses
    }

    /// Attaches the learned clause produced by conflict analysis, with the
    /// asserting literal at position zero, and enqueues that literal.
    pub(crate) fn add_learned_clause(
        &mut self,
        learned_clause_literals: Vec<Literal>,
        clausal_propagator: &mut ClausalPropagator,
        assignments: &mut Assignments,
        clause_allocator: &mut ClauseAllocator,
    ) -> ClauseReference {
        pitaya_assert_simple!(learned_clause_literals.len() >= 2);
        let clause_reference = clausal_propagator.add_asserting_learned_clause(
            learned_clause_literals,
            assignments,
            clause_allocator,
        );
        self.learned_clauses.push(clause_reference);
        clause_reference
    }

    /// Called once per conflict; grows the database limit on schedule.
    pub(crate) fn on_conflict(&mut self) {
        self.learntsize_adjust_count -= 1;
        if self.learntsize_adjust_count == 0 {
            self.learntsize_adjust_conflicts *= self.learntsize_adjust_inc;
            self.learntsize_adjust_count = self.learntsize_adjust_conflicts as i64;
            self.max_num_learned_clauses *= self.learntsize_inc;
        }
    }

    /// The database is shrunk when the number of learned clauses, discounting
    /// one per assigned variable, reaches the limit.
    pub(crate) fn should_shrink_database(&self, num_assigned_variables: usize) -> bool {
        self.learned_clauses.len() as f64 - num_assigned_variables as f64
            >= self.max_num_learned_clauses
    }

    /// Removes roughly half of the learned clauses. Binary clauses, clauses
    /// currently acting as a propagation reason, and clauses protected since
    /// the last reduction are kept; additionally any non-binary clause whose
    /// activity falls below a dynamic threshold is removed.
    pub(crate) fn shrink_learned_clause_database(
        &mut self,
        assignments: &Assignments,
        clausal_propagator: &mut ClausalPropagator,
        clause_allocator: &mut ClauseAllocator,
    ) {
        let extra_limit = self.clause_bump_increment / self.learned_clauses.len() as f32;

        // Sort so that the clauses to delete first are in front: non-binary
        // before binary, then lower activity first.
        self.learned_clauses
            .sort_unstable_by(|clause_reference1, clause_reference2| {
                let clause1 = clause_allocator.get_clause(*clause_reference1);
                let clause2 = clause_allocator.get_clause(*clause_reference2);

                let rank1 = (clause1.len() == 2, clause1.get_activity());
                let rank2 = (clause2.len() == 2, clause2.get_activity());
                rank1.partial_cmp(&rank2).unwrap()
            });

        let half = self.learned_clauses.len() / 2;
        for (position, &clause_reference) in self.learned_clauses.iter().enumerate() {
            let clause = clause_allocator.get_clause(clause_reference);

            if clause.len() == 2 {
                continue;
            }
            if position >= half && clause.get_activity() >= extra_limit {
                continue;
            }
            if LearnedClauseManager::is_clause_propagating(
                clause_reference,
                assignments,
                clause_allocator,
            ) {
                continue;
            }
            if clause.is_protected_against_deletion() {
                clause_allocator
                    .get_mutable_clause(clause_reference)
                    .clear_protection_against_deletion();
                continue;
            }

            clausal_propagator.remove_clause_from_consideration(
                clause_allocator.get_clause(clause_reference).get_literal_slice(),
                clause_reference,
            );
            clause_allocator.delete_clause(clause_reference);
        }

        self.learned_clauses
            .retain(|&clause_reference| !clause_allocator[clause_reference].is_deleted());
    }

    /// A clause is propagating when its first literal is true with the
    /// clause recorded as the reason. Such clauses cannot be deleted without
    /// corrupting conflict analysis.
    pub(crate) fn is_clause_propagating(
        clause_reference: ClauseReference,
        assignments: &Assignments,
        clause_allocator: &ClauseAllocator,
    ) -> bool {
        let first_literal = clause_allocator[clause_reference][0];
        assignments.is_literal_assigned_true(first_literal)
            && assignments.is_variable_propagated(first_literal.get_propositional_variable())
            && assignments.get_literal_reason(first_literal) == clause_reference
    }

    /// Called when a learned clause takes part in conflict analysis. The
    /// clause is protected from the next database reduction on top of the
    /// usual activity bump.
    pub(crate) fn update_clause_usage(
        &mut self,
        clause_reference: ClauseReference,
        clause_allocator: &mut ClauseAllocator,
    ) {
        self.bump_clause_activity(clause_reference, clause_allocator);
        clause_allocator
            .get_mutable_clause(clause_reference)
            .mark_protection_against_deletion();
    }

    pub(crate) fn bump_clause_activity(
        &mut self,
        clause_reference: ClauseReference,
        clause_allocator: &mut ClauseAllocator,
    ) {
        // Rescale everything if bumping would overflow the activity cap.
        if clause_allocator.get_clause(clause_reference).get_activity()
            + self.clause_bump_increment
            > self.max_clause_activity
        {
            self.rescale_clause_activities(clause_allocator);
        }
        clause_allocator
            .get_mutable_clause(clause_reference)
            .increase_activity(self.clause_bump_increment);
    }

    pub(crate) fn rescale_clause_activities(&mut self, clause_allocator: &mut ClauseAllocator) {
        self.learned_clauses.iter().for_each(|clause_reference| {
            let clause = clause_allocator.get_mutable_clause(*clause_reference);
            clause.divide_activity(self.max_clause_activity);
        });
        self.clause_bump_increment /= self.max_clause_activity;
    }

    pub(crate) fn decay_clause_activities(&mut self) {
        self.clause_bump_increment /= self.clause_activity_decay_factor;
    }

    /// Rewrites the stored references after garbage collection.
    pub(crate) fn remap_clause_references(&mut self, mapping: &[ClauseReference]) {
        for clause_reference in self.learned_clauses.iter_mut() {
            let new_reference = mapping[clause_reference.get_code() as usize];
            pitaya_assert_simple!(!new_reference.is_null());
            *clause_reference = new_reference;
        }
    }
}
