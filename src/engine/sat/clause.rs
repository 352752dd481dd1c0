use crate::basic_types::Literal;
use crate::pitaya_assert_advanced;
use crate::pitaya_assert_moderate;
use crate::pitaya_assert_simple;

/// A clause stored in the arena. The literals at positions zero and one are
/// the watched literals of the two-watched-literal scheme.
#[allow(
    clippy::len_without_is_empty,
    reason = "a clause always has at least two literals"
)]
#[derive(Debug)]
pub(crate) struct Clause {
    literals: Vec<Literal>,
    is_learned: bool,
    is_deleted: bool,
    is_protected_against_deletion: bool,
    activity: f32,
}

impl Clause {
    pub(crate) fn new(literals: Vec<Literal>, is_learned: bool) -> Clause {
        pitaya_assert_simple!(literals.len() >= 2);

        Clause {
            literals,
            is_learned,
            is_deleted: false,
            is_protected_against_deletion: false,
            activity: 0.0,
        }
    }

    pub(crate) fn len(&self) -> u32 {
        self.literals.len() as u32
    }

    pub(crate) fn is_learned(&self) -> bool {
        self.is_learned
    }

    pub(crate) fn is_protected_against_deletion(&self) -> bool {
        self.is_protected_against_deletion
    }

    pub(crate) fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub(crate) fn get_literal_slice(&self) -> &[Literal] {
        &self.literals
    }

    pub(crate) fn get_activity(&self) -> f32 {
        pitaya_assert_advanced!(!self.activity.is_nan() && !self.activity.is_infinite());
        self.activity
    }

    // Note that this does _not_ free the clause storage; reclamation happens
    // during garbage collection.
    pub(crate) fn mark_deleted(&mut self) {
        pitaya_assert_moderate!(!self.is_deleted);
        self.is_deleted = true;
    }

    pub(crate) fn mark_protection_against_deletion(&mut self) {
        self.is_protected_against_deletion = true;
    }

    pub(crate) fn clear_protection_against_deletion(&mut self) {
        pitaya_assert_moderate!(self.is_protected_against_deletion);
        self.is_protected_against_deletion = false;
    }

    pub(crate) fn increase_activity(&mut self, increment: f32) {
        self.activity += increment;
    }

    pub(crate) fn divide_activity(&mut self, division_factor: f32) {
        self.activity /= division_factor;
    }

    /// Removes the literal at the given position. Only positions beyond the
    /// watched literals may be removed, so the watcher invariant is kept.
    pub(crate) fn swap_remove_literal(&mut self, index: u32) -> Literal {
        pitaya_assert_simple!(index >= 2 && index < self.len());
        self.literals.swap_remove(index as usize)
    }
}

impl std::ops::Index<u32> for Clause {
    type Output = Literal;
    fn index(&self, index: u32) -> &Literal {
        self.literals.index(index as usize)
    }
}

impl std::ops::IndexMut<u32> for Clause {
    fn index_mut(&mut self, index: u32) -> &mut Literal {
        self.literals.index_mut(index as usize)
    }
}

impl std::fmt::Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let clause_string = &self
            .literals
            .iter()
            .fold(String::new(), |acc, lit| acc + &lit.to_string() + ",");

        write!(
            f,
            "({})[learned:{}, deleted:{}]",
            clause_string, self.is_learned, self.is_deleted
        )
    }
}
