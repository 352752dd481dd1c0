use crate::basic_types::KeyedVec;
use crate::basic_types::PropositionalVariable;
use crate::basic_types::Random;

/// Chooses the polarity of a decision variable: a user-forced polarity wins,
/// then a coin flip when random polarities are enabled, then the saved phase.
#[derive(Debug)]
pub(crate) struct ValueSelector {
    truth_values: KeyedVec<PropositionalVariable, CandidateTruthAssignment>,
    random_polarity: bool,
}

#[derive(Debug)]
struct CandidateTruthAssignment {
    value: bool,
    /// A frozen value was forced by the user and is not overwritten by phase
    /// saving.
    frozen: bool,
}

impl ValueSelector {
    pub(crate) fn new(random_polarity: bool) -> Self {
        ValueSelector {
            truth_values: KeyedVec::default(),
            random_polarity,
        }
    }

    pub(crate) fn grow(&mut self) {
        self.truth_values.push(CandidateTruthAssignment {
            value: false,
            frozen: false,
        });
    }

    pub(crate) fn select_value(
        &self,
        variable: PropositionalVariable,
        random: &mut dyn Random,
    ) -> bool {
        if self.truth_values[variable].frozen {
            return self.truth_values[variable].value;
        }
        if self.random_polarity {
            return random.generate_bool(0.5);
        }
        self.truth_values[variable].value
    }

    /// Phase saving: records the polarity a variable had before it was
    /// unassigned. User-forced polarities are not overwritten.
    pub(crate) fn update_if_not_frozen(
        &mut self,
        variable: PropositionalVariable,
        new_truth_value: bool,
    ) {
        if !self.truth_values[variable].frozen {
            self.truth_values[variable].value = new_truth_value;
        }
    }

    /// Returns a recycled variable to the default state.
    pub(crate) fn reset(&mut self, variable: PropositionalVariable) {
        self.truth_values[variable] = CandidateTruthAssignment {
            value: false,
            frozen: false,
        };
    }

    /// Forces the polarity of every future decision on this variable.
    pub(crate) fn update_and_freeze(
        &mut self,
        variable: PropositionalVariable,
        new_truth_value: bool,
    ) {
        self.truth_values[variable].value = new_truth_value;
        self.truth_values[variable].frozen = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::random::tests::TestRandom;

    #[test]
    fn saved_phase_is_returned_by_default() {
        let mut selector = ValueSelector::new(false);
        selector.grow();
        let variable = PropositionalVariable::new(0);
        let mut random = TestRandom::default();

        assert!(!selector.select_value(variable, &mut random));
        selector.update_if_not_frozen(variable, true);
        assert!(selector.select_value(variable, &mut random));
    }

    #[test]
    fn frozen_values_ignore_phase_saving_and_randomness() {
        let mut selector = ValueSelector::new(true);
        selector.grow();
        let variable = PropositionalVariable::new(0);
        let mut random = TestRandom::default();

        selector.update_and_freeze(variable, true);
        selector.update_if_not_frozen(variable, false);
        // No scripted bools are consumed: the frozen value short-circuits.
        assert!(selector.select_value(variable, &mut random));
    }

    #[test]
    fn random_polarity_flips_a_coin() {
        let mut selector = ValueSelector::new(true);
        selector.grow();
        let variable = PropositionalVariable::new(0);
        let mut random = TestRandom {
            bools: vec![true, false],
            ..Default::default()
        };

        assert!(selector.select_value(variable, &mut random));
        assert!(!selector.select_value(variable, &mut random));
    }
}
