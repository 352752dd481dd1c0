use std::fmt::Debug;

/// An infinite sequence of interval lengths, consumed one element at a time
/// by the restart strategy.
pub(crate) trait SequenceGenerator: Debug {
    fn next(&mut self) -> i64;
}
