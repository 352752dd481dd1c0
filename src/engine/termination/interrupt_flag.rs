use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::TerminationCondition;

/// A [`TerminationCondition`] backed by a shared flag. Another thread (or a
/// signal handler set up by the embedding application) raises the flag; the
/// solver notices it at the next loop boundary.
#[derive(Clone, Debug, Default)]
pub struct InterruptFlag {
    flag: Arc<AtomicBool>,
}

impl InterruptFlag {
    pub fn new() -> InterruptFlag {
        InterruptFlag::default()
    }

    /// The shared handle; raising it interrupts the solver cooperatively.
    pub fn handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

impl TerminationCondition for InterruptFlag {
    fn should_stop(&mut self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raising_the_flag_stops_the_holder() {
        let mut flag = InterruptFlag::new();
        assert!(!flag.should_stop());

        flag.interrupt();
        assert!(flag.should_stop());
    }

    #[test]
    fn the_handle_is_shared_with_clones() {
        let mut flag = InterruptFlag::new();
        let handle = flag.handle();

        handle.store(true, Ordering::Relaxed);
        assert!(flag.should_stop());
    }
}
