use crate::basic_types::sequence_generators::ConstantSequence;
use crate::basic_types::sequence_generators::GeometricSequence;
use crate::basic_types::sequence_generators::LubySequence;
use crate::basic_types::sequence_generators::SequenceGenerator;
use crate::basic_types::sequence_generators::SequenceGeneratorType;
use crate::engine::options::SatOptions;

/// Conflict-driven restart policy. A restart is signalled once the number of
/// conflicts since the previous restart reaches the current interval; the
/// intervals follow the configured sequence (constant, geometric, or the Luby
/// sequence, see [\[1\]](https://www.sciencedirect.com/science/article/pii/0020019093900299))
/// scaled by the base interval.
///
/// # Bibliography
/// \[1\] M. Luby, A. Sinclair, and D. Zuckerman, ‘Optimal speedup of Las Vegas
/// algorithms’, Information Processing Letters, vol. 47, no. 4, pp. 173–180,
/// 1993.
#[derive(Debug)]
pub(crate) struct RestartStrategy {
    sequence_generator: Box<dyn SequenceGenerator>,
    num_conflicts_until_restart: u64,
    num_conflicts_since_restart: u64,
    num_restarts: u64,
}

impl RestartStrategy {
    pub(crate) fn new(options: &SatOptions) -> Self {
        let mut sequence_generator: Box<dyn SequenceGenerator> =
            match options.restart_sequence_generator_type {
                SequenceGeneratorType::Constant => {
                    Box::new(ConstantSequence::new(options.restart_base_interval as i64))
                }
                SequenceGeneratorType::Geometric => Box::new(GeometricSequence::new(
                    options.restart_base_interval as i64,
                    options.restart_geometric_coef,
                )),
                SequenceGeneratorType::Luby => {
                    Box::new(LubySequence::new(options.restart_base_interval as i64))
                }
            };

        let num_conflicts_until_restart = sequence_generator
            .next()
            .try_into()
            .expect("Restart sequences must generate positive values");

        RestartStrategy {
            sequence_generator,
            num_conflicts_until_restart,
            num_conflicts_since_restart: 0,
            num_restarts: 0,
        }
    }

    pub(crate) fn should_restart(&self) -> bool {
        self.num_conflicts_since_restart >= self.num_conflicts_until_restart
    }

    pub(crate) fn notify_conflict(&mut self) {
        self.num_conflicts_since_restart += 1;
    }

    pub(crate) fn notify_restart(&mut self) {
        self.num_restarts += 1;
        self.num_conflicts_since_restart = 0;
        self.num_conflicts_until_restart = self
            .sequence_generator
            .next()
            .try_into()
            .expect("Restart sequences must generate positive values");
    }

    pub(crate) fn num_restarts(&self) -> u64 {
        self.num_restarts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luby_intervals_follow_the_reluctant_doubling_sequence() {
        let options = SatOptions {
            restart_sequence_generator_type: SequenceGeneratorType::Luby,
            restart_base_interval: 10,
            ..Default::default()
        };
        let mut strategy = RestartStrategy::new(&options);

        // The Luby sequence starts 1, 1, 2, so the first two intervals are 10
        // conflicts and the third is 20.
        for expected_interval in [10, 10, 20] {
            for _ in 0..expected_interval - 1 {
                strategy.notify_conflict();
                assert!(!strategy.should_restart());
            }
            strategy.notify_conflict();
            assert!(strategy.should_restart());
            strategy.notify_restart();
        }
        assert_eq!(strategy.num_restarts(), 3);
    }

    #[test]
    fn constant_intervals_do_not_grow() {
        let options = SatOptions {
            restart_sequence_generator_type: SequenceGeneratorType::Constant,
            restart_base_interval: 2,
            ..Default::default()
        };
        let mut strategy = RestartStrategy::new(&options);

        for _ in 0..5 {
            strategy.notify_conflict();
            assert!(!strategy.should_restart());
            strategy.notify_conflict();
            assert!(strategy.should_restart());
            strategy.notify_restart();
        }
    }
}
