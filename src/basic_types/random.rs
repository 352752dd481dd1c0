use std::cmp::Ordering;
use std::fmt::Debug;
use std::ops::Range;

use rand::Rng;
use rand::SeedableRng;

use crate::pitaya_assert_moderate;

/// Source of randomness for the solver. The solver owns a single seeded
/// generator so that runs are reproducible; tests substitute the
/// deterministic [`TestRandom`][tests::TestRandom].
pub trait Random: Debug {
    /// Generates a bool with probability `probability` of being true.
    /// `probability` must lie in `[0, 1]`.
    fn generate_bool(&mut self, probability: f64) -> bool;

    /// Samples uniformly from `[range.start, range.end)`.
    fn generate_usize_in_range(&mut self, range: Range<usize>) -> usize;
}

// Blanket implementation so that any seedable rand generator can be used
// where the solver expects a Random.
impl<T> Random for T
where
    T: SeedableRng + Rng + Debug,
{
    fn generate_bool(&mut self, probability: f64) -> bool {
        pitaya_assert_moderate!(
            !matches!(probability.partial_cmp(&0.0), Some(Ordering::Less))
                && !matches!(probability.partial_cmp(&1.0), Some(Ordering::Greater)),
            "It should hold that 0.0 <= {probability} <= 1.0"
        );
        self.gen_bool(probability)
    }

    fn generate_usize_in_range(&mut self, range: Range<usize>) -> usize {
        self.gen_range(range)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cmp::Ordering;
    use std::ops::Range;

    use super::Random;
    use crate::pitaya_assert_simple;

    /// A scripted "random" generator which takes a list of `usize`s and
    /// `bool`s and returns them in order. Generating more values than were
    /// provided panics.
    #[derive(Debug, Default)]
    pub(crate) struct TestRandom {
        pub(crate) usizes: Vec<usize>,
        pub(crate) bools: Vec<bool>,
    }

    impl Random for TestRandom {
        fn generate_bool(&mut self, probability: f64) -> bool {
            let selected = self.bools.remove(0);
            pitaya_assert_simple!(
                if matches!(probability.partial_cmp(&1.0), Some(Ordering::Equal)) {
                    selected
                } else if matches!(probability.partial_cmp(&0.0), Some(Ordering::Equal)) {
                    !selected
                } else {
                    true
                },
                "The scripted value {selected} is impossible for probability {probability}"
            );
            selected
        }

        fn generate_usize_in_range(&mut self, range: Range<usize>) -> usize {
            let selected = self.usizes.remove(0);
            pitaya_assert_simple!(
                range.contains(&selected),
                "The scripted value {selected} is outside the requested range {range:?}"
            );
            selected
        }
    }
}
