use crate::basic_types::sequence_generators::SequenceGeneratorType;

/// All solver configuration, constructed once and owned by the solver
/// instance. The defaults follow widely used CDCL parameter settings.
#[derive(Debug, Clone, Copy)]
pub struct SatOptions {
    /// The decay factor for variable activities; the activity bump increment
    /// is divided by this value after each conflict.
    pub variable_activity_decay_factor: f64,
    /// Threshold above which all variable activities are rescaled.
    pub max_variable_activity: f64,
    /// The decay factor for learned clause activities.
    pub clause_activity_decay_factor: f32,
    /// Threshold above which all clause activities are rescaled.
    pub max_clause_activity: f32,
    /// Which heuristic orders the decision variables.
    pub decision_heuristic: DecisionHeuristic,
    /// When a bump is applied during conflict analysis, and to which
    /// variables and clauses.
    pub activity_bump_policy: ActivityBumpPolicy,
    /// Fraction of decisions made at random. Zero disables random decisions.
    pub random_decision_frequency: f64,
    /// When true, every `floor(1 / random_decision_frequency)`-th decision is
    /// random, rather than each decision being random with that probability.
    pub periodic_random_decisions: bool,
    /// When true, the polarity of a decision is a coin flip instead of the
    /// saved phase.
    pub random_polarity: bool,
    pub random_seed: u64,
    pub minimisation_mode: MinimisationMode,
    pub phase_saving_mode: PhaseSavingMode,
    /// The sequence of restart intervals, scaled by the base interval.
    pub restart_sequence_generator_type: SequenceGeneratorType,
    /// Number of conflicts per unit of the restart sequence.
    pub restart_base_interval: u64,
    /// Multiplier of the geometric restart sequence; unused for the other
    /// sequence types.
    pub restart_geometric_coef: f64,
    /// Garbage collection runs when this fraction of the clause arena is
    /// occupied by deleted clauses and trimmed literals.
    pub garbage_tolerated_waste_fraction: f64,
    /// The learned clause database limit never drops below this.
    pub min_learned_clauses: u64,
    /// Initial database limit as a fraction of the number of problem clauses.
    pub learntsize_factor: f64,
    /// Growth factor applied to the database limit on schedule.
    pub learntsize_inc: f64,
    /// Number of conflicts before the database limit grows for the first
    /// time.
    pub learntsize_adjust_start: f64,
    /// Growth factor for the adjustment interval itself.
    pub learntsize_adjust_inc: f64,
    /// Initial step size of the conflict-history moving average.
    pub chb_alpha_initial: f64,
    /// Subtracted from the step size after every conflict.
    pub chb_alpha_decay: f64,
    /// The step size never decays below this floor.
    pub chb_alpha_floor: f64,
    /// Reward multiplier for variables involved in the latest conflict.
    pub chb_multiplier_in_conflict: f64,
    /// Reward multiplier for all other bumped variables.
    pub chb_multiplier_default: f64,
}

impl Default for SatOptions {
    fn default() -> Self {
        SatOptions {
            variable_activity_decay_factor: 0.95,
            max_variable_activity: 1e100,
            clause_activity_decay_factor: 0.999,
            max_clause_activity: 1e20,
            decision_heuristic: DecisionHeuristic::Activity,
            activity_bump_policy: ActivityBumpPolicy::Default,
            random_decision_frequency: 0.0,
            periodic_random_decisions: false,
            random_polarity: false,
            random_seed: 91_648_253,
            minimisation_mode: MinimisationMode::Deep,
            phase_saving_mode: PhaseSavingMode::Full,
            restart_sequence_generator_type: SequenceGeneratorType::Luby,
            restart_base_interval: 100,
            restart_geometric_coef: 2.0,
            garbage_tolerated_waste_fraction: 0.2,
            min_learned_clauses: 0,
            learntsize_factor: 1.0 / 3.0,
            learntsize_inc: 1.1,
            learntsize_adjust_start: 100.0,
            learntsize_adjust_inc: 1.5,
            chb_alpha_initial: 0.4,
            chb_alpha_decay: 1e-6,
            chb_alpha_floor: 0.06,
            chb_multiplier_in_conflict: 1.0,
            chb_multiplier_default: 0.9,
        }
    }
}

/// The policy ordering candidate decision variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecisionHeuristic {
    /// Activity-based ordering with additive bumps and multiplicative decay.
    #[default]
    Activity,
    /// Uniformly random among the unassigned variables.
    Random,
    /// Occurrence counts over the original clause set, computed once.
    StaticOccurrence,
    /// Occurrence counts over the currently unsatisfied clauses, recomputed
    /// at every decision.
    DynamicOccurrence,
    /// Occurrence counts weighted by `2^-len` of each unsatisfied clause.
    JeroslowWang,
    /// Occurrence counts restricted to unsatisfied clauses of minimum size.
    Mom,
    /// Conflict-history-based ordering: rewards are larger for variables
    /// involved in recent conflicts, blended by an exponential moving
    /// average.
    Chb,
}

/// When variable and clause activities are bumped during conflict analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivityBumpPolicy {
    /// Bump each variable the first time conflict analysis encounters it.
    #[default]
    Default,
    /// Bump every variable of the conflicting clause.
    ConflictClause,
    /// Bump every variable of the final learned clause.
    LearnedClause,
}

/// How aggressively learned clauses are minimised after conflict analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MinimisationMode {
    /// No minimisation.
    None,
    /// Remove literals whose direct reason is covered by the learned clause.
    Basic,
    /// Remove literals dominated through any depth of the implication graph.
    #[default]
    Deep,
}

/// Which unassigned variables keep their previous polarity as the default
/// for the next decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseSavingMode {
    /// Never save phases.
    None,
    /// Save phases only for variables beyond the latest decision.
    Limited,
    /// Save the phase of every unassigned variable.
    #[default]
    Full,
}
