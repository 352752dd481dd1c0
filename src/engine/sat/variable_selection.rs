use super::Assignments;
use super::ClauseAllocator;
use crate::basic_types::ClauseReference;
use crate::basic_types::KeyValueHeap;
use crate::basic_types::KeyedVec;
use crate::basic_types::PropositionalVariable;
use crate::basic_types::Random;
use crate::basic_types::StorageKey;
use crate::engine::options::DecisionHeuristic;
use crate::engine::options::SatOptions;

/// Selects the next decision variable. The strategy is fixed at construction;
/// every strategy skips assigned variables and variables marked ineligible
/// for branching.
#[derive(Debug)]
pub(crate) struct VariableSelector {
    strategy: Strategy,
    is_decision_eligible: KeyedVec<PropositionalVariable, bool>,
}

#[derive(Debug)]
enum Strategy {
    /// Max-heap over additively bumped, multiplicatively decayed activities.
    Activity(ActivityStrategy),
    /// Uniformly random among the candidates.
    Random,
    /// Occurrence counts over the original clauses, computed at the first
    /// decision and never again.
    StaticOccurrence { scores: Option<Vec<f64>> },
    /// Occurrence counts over the currently unsatisfied clauses.
    DynamicOccurrence,
    /// Occurrences weighted by `2^-len` of each unsatisfied clause.
    JeroslowWang,
    /// Occurrences restricted to the unsatisfied clauses of minimum length,
    /// combining the polarities multiplicatively and additively.
    Mom,
    /// Conflict-history scores blended by an exponential moving average.
    Chb(ChbStrategy),
}

impl VariableSelector {
    pub(crate) fn new(options: &SatOptions) -> Self {
        let strategy = match options.decision_heuristic {
            DecisionHeuristic::Activity => Strategy::Activity(ActivityStrategy {
                heap: KeyValueHeap::default(),
                increment: 1.0,
                max_threshold: options.max_variable_activity,
                decay_factor: options.variable_activity_decay_factor,
            }),
            DecisionHeuristic::Random => Strategy::Random,
            DecisionHeuristic::StaticOccurrence => Strategy::StaticOccurrence { scores: None },
            DecisionHeuristic::DynamicOccurrence => Strategy::DynamicOccurrence,
            DecisionHeuristic::JeroslowWang => Strategy::JeroslowWang,
            DecisionHeuristic::Mom => Strategy::Mom,
            DecisionHeuristic::Chb => Strategy::Chb(ChbStrategy {
                scores: KeyedVec::default(),
                last_conflict: KeyedVec::default(),
                num_conflicts: 0,
                alpha: options.chb_alpha_initial,
                alpha_decay: options.chb_alpha_decay,
                alpha_floor: options.chb_alpha_floor,
                multiplier_in_conflict: options.chb_multiplier_in_conflict,
                multiplier_default: options.chb_multiplier_default,
            }),
        };

        VariableSelector {
            strategy,
            is_decision_eligible: KeyedVec::default(),
        }
    }

    /// Registers the next fresh variable with every piece of heuristic state.
    pub(crate) fn grow(&mut self) {
        let variable = PropositionalVariable::new(self.is_decision_eligible.len() as u32);
        self.is_decision_eligible.push(true);

        match &mut self.strategy {
            Strategy::Activity(activity) => activity.heap.grow(variable, 0.0),
            Strategy::Chb(chb) => {
                chb.scores.push(0.0);
                chb.last_conflict.push(0);
            }
            Strategy::Random
            | Strategy::StaticOccurrence { .. }
            | Strategy::DynamicOccurrence
            | Strategy::JeroslowWang
            | Strategy::Mom => {}
        }
    }

    /// An ineligible variable is never returned as a decision. Variables kept
    /// out of branching this way can still be assigned by propagation.
    pub(crate) fn set_decision_eligibility(
        &mut self,
        variable: PropositionalVariable,
        is_eligible: bool,
    ) {
        self.is_decision_eligible[variable] = is_eligible;
        if let Strategy::Activity(activity) = &mut self.strategy {
            if is_eligible {
                activity.heap.restore_key(variable);
            } else {
                activity.heap.delete_key(variable);
            }
        }
    }

    /// Rewards a variable encountered during conflict analysis.
    pub(crate) fn bump_activity(&mut self, variable: PropositionalVariable) {
        match &mut self.strategy {
            Strategy::Activity(activity) => activity.bump(variable),
            Strategy::Chb(chb) => chb.reward(variable, true),
            Strategy::Random
            | Strategy::StaticOccurrence { .. }
            | Strategy::DynamicOccurrence
            | Strategy::JeroslowWang
            | Strategy::Mom => {}
        }
    }

    /// Called once per conflict, after the bumps of that conflict.
    pub(crate) fn decay_activities(&mut self) {
        match &mut self.strategy {
            Strategy::Activity(activity) => {
                // Decaying is implemented by growing the increment, so that
                // future bumps count for more; this avoids touching every
                // stored activity.
                activity.increment *= 1.0 / activity.decay_factor;
            }
            Strategy::Chb(chb) => {
                chb.num_conflicts += 1;
                if chb.alpha > chb.alpha_floor {
                    chb.alpha = (chb.alpha - chb.alpha_decay).max(chb.alpha_floor);
                }
            }
            Strategy::Random
            | Strategy::StaticOccurrence { .. }
            | Strategy::DynamicOccurrence
            | Strategy::JeroslowWang
            | Strategy::Mom => {}
        }
    }

    /// Called for every variable unassigned by backtracking.
    pub(crate) fn restore(&mut self, variable: PropositionalVariable) {
        if !self.is_decision_eligible[variable] {
            return;
        }
        match &mut self.strategy {
            Strategy::Activity(activity) => activity.heap.restore_key(variable),
            Strategy::Chb(chb) => chb.reward(variable, false),
            Strategy::Random
            | Strategy::StaticOccurrence { .. }
            | Strategy::DynamicOccurrence
            | Strategy::JeroslowWang
            | Strategy::Mom => {}
        }
    }

    /// Returns the next decision variable, or None when every eligible
    /// variable is assigned, which means the assignment is complete.
    pub(crate) fn next_decision_variable(
        &mut self,
        assignments: &Assignments,
        clause_allocator: &ClauseAllocator,
        permanent_clauses: &[ClauseReference],
        learned_clauses: &[ClauseReference],
        random: &mut dyn Random,
    ) -> Option<PropositionalVariable> {
        match &mut self.strategy {
            Strategy::Activity(activity) => loop {
                let candidate = *activity.heap.peek_max()?.0;
                // The heap is lazy about assigned entries: they are dropped
                // here, when they surface as the maximum.
                if assignments.is_variable_assigned(candidate) {
                    let _ = activity.heap.pop_max();
                } else {
                    return Some(candidate);
                }
            },
            Strategy::Random => {
                let candidates = candidate_variables(assignments, &self.is_decision_eligible);
                if candidates.is_empty() {
                    return None;
                }
                Some(candidates[random.generate_usize_in_range(0..candidates.len())])
            }
            Strategy::StaticOccurrence { scores } => {
                let scores = scores.get_or_insert_with(|| {
                    occurrence_scores(assignments, clause_allocator, permanent_clauses)
                });
                best_scoring_variable(assignments, &self.is_decision_eligible, scores)
            }
            Strategy::DynamicOccurrence => {
                let scores = unsatisfied_occurrence_scores(
                    assignments,
                    clause_allocator,
                    permanent_clauses.iter().chain(learned_clauses),
                    |_| 1.0,
                );
                best_scoring_variable(assignments, &self.is_decision_eligible, &scores)
            }
            Strategy::JeroslowWang => {
                let scores = unsatisfied_occurrence_scores(
                    assignments,
                    clause_allocator,
                    permanent_clauses.iter().chain(learned_clauses),
                    |clause_length| (2.0_f64).powi(-(clause_length as i32)),
                );
                best_scoring_variable(assignments, &self.is_decision_eligible, &scores)
            }
            Strategy::Mom => {
                let scores = maximum_occurrence_minimum_size_scores(
                    assignments,
                    clause_allocator,
                    permanent_clauses.iter().chain(learned_clauses),
                );
                best_scoring_variable(assignments, &self.is_decision_eligible, &scores)
            }
            Strategy::Chb(chb) => {
                let mut best: Option<(PropositionalVariable, f64)> = None;
                for variable in assignments.get_propositional_variables() {
                    if assignments.is_variable_assigned(variable)
                        || !self.is_decision_eligible[variable]
                    {
                        continue;
                    }
                    let score = chb.scores[variable];
                    if best.map_or(true, |(_, best_score)| score > best_score) {
                        best = Some((variable, score));
                    }
                }
                best.map(|(variable, _)| variable)
            }
        }
    }

    /// A uniformly random unassigned variable, used for the random decisions
    /// interleaved with any strategy.
    pub(crate) fn random_decision_variable(
        &self,
        assignments: &Assignments,
        random: &mut dyn Random,
    ) -> Option<PropositionalVariable> {
        let candidates = candidate_variables(assignments, &self.is_decision_eligible);
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[random.generate_usize_in_range(0..candidates.len())])
    }
}

#[derive(Debug)]
struct ActivityStrategy {
    heap: KeyValueHeap<PropositionalVariable, f64>,
    increment: f64,
    max_threshold: f64,
    decay_factor: f64,
}

impl ActivityStrategy {
    fn bump(&mut self, variable: PropositionalVariable) {
        // Rescale everything if the bump would push past the threshold.
        if self.heap.get_value(variable) + self.increment >= self.max_threshold {
            self.heap.divide_values(self.max_threshold);
            self.increment /= self.max_threshold;
        }
        self.heap.increment(variable, self.increment);
    }
}

/// Conflict-history state: a variable rewarded shortly after its last
/// conflict involvement scores higher. Variables on the conflict side of the
/// analysis receive the larger multiplier and refresh their timestamp.
#[derive(Debug)]
struct ChbStrategy {
    scores: KeyedVec<PropositionalVariable, f64>,
    last_conflict: KeyedVec<PropositionalVariable, u64>,
    num_conflicts: u64,
    alpha: f64,
    alpha_decay: f64,
    alpha_floor: f64,
    multiplier_in_conflict: f64,
    multiplier_default: f64,
}

impl ChbStrategy {
    fn reward(&mut self, variable: PropositionalVariable, in_conflict: bool) {
        let multiplier = if in_conflict {
            self.multiplier_in_conflict
        } else {
            self.multiplier_default
        };
        let reward = multiplier
            / (self.num_conflicts - self.last_conflict[variable] + 1) as f64;
        self.scores[variable] = (1.0 - self.alpha) * self.scores[variable] + self.alpha * reward;
        if in_conflict {
            self.last_conflict[variable] = self.num_conflicts;
        }
    }
}

fn candidate_variables(
    assignments: &Assignments,
    is_decision_eligible: &KeyedVec<PropositionalVariable, bool>,
) -> Vec<PropositionalVariable> {
    assignments
        .get_propositional_variables()
        .filter(|&variable| {
            assignments.is_variable_unassigned(variable) && is_decision_eligible[variable]
        })
        .collect()
}

fn best_scoring_variable(
    assignments: &Assignments,
    is_decision_eligible: &KeyedVec<PropositionalVariable, bool>,
    scores: &[f64],
) -> Option<PropositionalVariable> {
    let mut best: Option<(PropositionalVariable, f64)> = None;
    for variable in assignments.get_propositional_variables() {
        if assignments.is_variable_assigned(variable) || !is_decision_eligible[variable] {
            continue;
        }
        // Variables created after the scores were computed count as zero.
        let score = scores.get(variable.index()).copied().unwrap_or(0.0);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((variable, score));
        }
    }
    best.map(|(variable, _)| variable)
}

/// Plain occurrence counts, including occurrences in satisfied clauses.
fn occurrence_scores(
    assignments: &Assignments,
    clause_allocator: &ClauseAllocator,
    clauses: &[ClauseReference],
) -> Vec<f64> {
    let mut scores = vec![0.0; assignments.num_propositional_variables() as usize];
    for &clause_reference in clauses {
        for &literal in clause_allocator[clause_reference].get_literal_slice() {
            scores[literal.get_propositional_variable().index()] += 1.0;
        }
    }
    scores
}

/// Occurrence counts over the clauses with no true literal, with a per-clause
/// weight depending on the clause length.
fn unsatisfied_occurrence_scores<'a>(
    assignments: &Assignments,
    clause_allocator: &ClauseAllocator,
    clauses: impl Iterator<Item = &'a ClauseReference>,
    clause_weight: impl Fn(u32) -> f64,
) -> Vec<f64> {
    let mut scores = vec![0.0; assignments.num_propositional_variables() as usize];
    for &clause_reference in clauses {
        let clause = &clause_allocator[clause_reference];
        if clause
            .get_literal_slice()
            .iter()
            .any(|&literal| assignments.is_literal_assigned_true(literal))
        {
            continue;
        }
        let weight = clause_weight(clause.len());
        for &literal in clause.get_literal_slice() {
            scores[literal.get_propositional_variable().index()] += weight;
        }
    }
    scores
}

/// Occurrences over the unsatisfied clauses of minimum length only, where
/// both polarities occurring frequently is worth more than either alone.
fn maximum_occurrence_minimum_size_scores<'a>(
    assignments: &Assignments,
    clause_allocator: &ClauseAllocator,
    clauses: impl Iterator<Item = &'a ClauseReference> + Clone,
) -> Vec<f64> {
    let num_variables = assignments.num_propositional_variables() as usize;
    let mut positive_counts = vec![0.0_f64; num_variables];
    let mut negative_counts = vec![0.0_f64; num_variables];

    let is_unsatisfied = |clause_reference: ClauseReference| {
        !clause_allocator[clause_reference]
            .get_literal_slice()
            .iter()
            .any(|&literal| assignments.is_literal_assigned_true(literal))
    };

    let minimum_size = clauses
        .clone()
        .filter(|&&clause_reference| is_unsatisfied(clause_reference))
        .map(|&clause_reference| clause_allocator[clause_reference].len())
        .min();
    let Some(minimum_size) = minimum_size else {
        return vec![0.0; num_variables];
    };

    for &clause_reference in clauses {
        let clause = &clause_allocator[clause_reference];
        if clause.len() != minimum_size || !is_unsatisfied(clause_reference) {
            continue;
        }
        for &literal in clause.get_literal_slice() {
            let index = literal.get_propositional_variable().index();
            if literal.is_positive() {
                positive_counts[index] += 1.0;
            } else {
                negative_counts[index] += 1.0;
            }
        }
    }

    (0..num_variables)
        .map(|index| {
            let positive = positive_counts[index];
            let negative = negative_counts[index];
            positive * negative * 1024.0 + positive + negative
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::random::tests::TestRandom;
    use crate::basic_types::Literal;

    fn assignments_with_variables(num_variables: u32) -> Assignments {
        let mut assignments = Assignments::default();
        for _ in 0..=num_variables {
            assignments.grow();
        }
        assignments.enqueue_decision_literal(assignments.true_literal);
        assignments
    }

    fn selector_for(heuristic: DecisionHeuristic, num_variables: u32) -> VariableSelector {
        let options = SatOptions {
            decision_heuristic: heuristic,
            ..Default::default()
        };
        let mut selector = VariableSelector::new(&options);
        for _ in 0..=num_variables {
            selector.grow();
        }
        selector.set_decision_eligibility(PropositionalVariable::new(0), false);
        selector
    }

    #[test]
    fn activity_selector_prefers_bumped_variables() {
        let assignments = assignments_with_variables(3);
        let mut selector = selector_for(DecisionHeuristic::Activity, 3);
        let mut random = TestRandom::default();

        let bumped = PropositionalVariable::new(2);
        selector.bump_activity(bumped);

        let selected = selector.next_decision_variable(
            &assignments,
            &ClauseAllocator::default(),
            &[],
            &[],
            &mut random,
        );
        assert_eq!(selected, Some(bumped));
    }

    #[test]
    fn activity_selector_skips_assigned_variables() {
        let mut assignments = assignments_with_variables(2);
        let mut selector = selector_for(DecisionHeuristic::Activity, 2);
        let mut random = TestRandom::default();

        let bumped = PropositionalVariable::new(1);
        selector.bump_activity(bumped);
        assignments.increase_decision_level();
        assignments.enqueue_decision_literal(Literal::new(bumped, true));

        let selected = selector.next_decision_variable(
            &assignments,
            &ClauseAllocator::default(),
            &[],
            &[],
            &mut random,
        );
        assert_eq!(selected, Some(PropositionalVariable::new(2)));
    }

    #[test]
    fn exhausted_candidates_mean_no_decision() {
        let mut assignments = assignments_with_variables(1);
        let mut selector = selector_for(DecisionHeuristic::Activity, 1);
        let mut random = TestRandom::default();

        assignments.increase_decision_level();
        assignments
            .enqueue_decision_literal(Literal::new(PropositionalVariable::new(1), true));

        let selected = selector.next_decision_variable(
            &assignments,
            &ClauseAllocator::default(),
            &[],
            &[],
            &mut random,
        );
        assert_eq!(selected, None);
    }

    #[test]
    fn jeroslow_wang_prefers_short_clause_variables() {
        let assignments = assignments_with_variables(3);
        let mut selector = selector_for(DecisionHeuristic::JeroslowWang, 3);
        let mut random = TestRandom::default();
        let mut allocator = ClauseAllocator::default();

        let in_short_clause = PropositionalVariable::new(1);
        let in_long_clause = PropositionalVariable::new(2);
        let other = PropositionalVariable::new(3);
        let short = allocator.create_clause(
            vec![
                Literal::new(in_short_clause, true),
                Literal::new(other, true),
            ],
            false,
        );
        let long = allocator.create_clause(
            vec![
                Literal::new(in_long_clause, true),
                Literal::new(other, false),
                Literal::new(in_short_clause, false),
            ],
            false,
        );

        let selected = selector.next_decision_variable(
            &assignments,
            &allocator,
            &[short, long],
            &[],
            &mut random,
        );
        // Variable 1 occurs in both clauses, weighted 2^-2 + 2^-3.
        assert_eq!(selected, Some(in_short_clause));
    }

    #[test]
    fn ineligible_variables_are_never_selected() {
        let assignments = assignments_with_variables(2);
        let mut selector = selector_for(DecisionHeuristic::Activity, 2);
        let mut random = TestRandom::default();

        let excluded = PropositionalVariable::new(1);
        selector.bump_activity(excluded);
        selector.set_decision_eligibility(excluded, false);

        let selected = selector.next_decision_variable(
            &assignments,
            &ClauseAllocator::default(),
            &[],
            &[],
            &mut random,
        );
        assert_eq!(selected, Some(PropositionalVariable::new(2)));
    }
}
