use super::clause::Clause;
use crate::basic_types::ClauseReference;
use crate::basic_types::Literal;
use crate::pitaya_assert_moderate;
use crate::pitaya_assert_simple;

/// Arena owning every clause. All outside holders of a clause store a
/// [`ClauseReference`]; after [`ClauseAllocator::garbage_collect`] runs, every
/// such holder must translate its references through the returned mapping
/// before touching the arena again.
///
/// Clause ids start at one; id zero is the null reference.
#[derive(Default, Debug)]
pub(crate) struct ClauseAllocator {
    allocated_clauses: Vec<Clause>,
    /// Literals held by live clauses.
    live_literals: usize,
    /// Literals trapped in deleted (but not yet collected) clauses, plus
    /// literals trimmed from live clauses.
    wasted_literals: usize,
}

impl ClauseAllocator {
    pub(crate) fn create_clause(
        &mut self,
        literals: Vec<Literal>,
        is_learned: bool,
    ) -> ClauseReference {
        pitaya_assert_simple!(literals.len() >= 2);
        self.live_literals += literals.len();

        // Deleted clauses keep their slot until garbage collection, so fresh
        // ids are always handed out sequentially.
        let clause_reference = ClauseReference::create_allocated_clause_reference(
            self.allocated_clauses.len() as u32 + 1,
        );
        self.allocated_clauses.push(Clause::new(literals, is_learned));
        clause_reference
    }

    pub(crate) fn get_clause(&self, clause_reference: ClauseReference) -> &Clause {
        // -1 since clause ids start at one
        &self.allocated_clauses[clause_reference.get_code() as usize - 1]
    }

    pub(crate) fn get_mutable_clause(&mut self, clause_reference: ClauseReference) -> &mut Clause {
        &mut self.allocated_clauses[clause_reference.get_code() as usize - 1]
    }

    /// Marks the clause as reclaimable. The storage is only reused after the
    /// next garbage collection.
    pub(crate) fn delete_clause(&mut self, clause_reference: ClauseReference) {
        pitaya_assert_moderate!(
            clause_reference.get_code() - 1 < self.allocated_clauses.len() as u32
        );
        pitaya_assert_moderate!(
            !self.get_clause(clause_reference).is_deleted(),
            "Cannot delete an already deleted clause."
        );

        let num_literals = self.get_clause(clause_reference).len() as usize;
        self.live_literals -= num_literals;
        self.wasted_literals += num_literals;

        self.get_mutable_clause(clause_reference).mark_deleted();
    }

    /// Removes the literal at the given position of the clause, keeping the
    /// waste accounting in sync.
    pub(crate) fn remove_literal_from_clause(
        &mut self,
        clause_reference: ClauseReference,
        index: u32,
    ) {
        let _ = self.get_mutable_clause(clause_reference).swap_remove_literal(index);
        self.live_literals -= 1;
        self.wasted_literals += 1;
    }

    /// Whether the 30-bit id space is used up. Adding a clause to a full
    /// arena is an unrecoverable out-of-memory condition.
    pub(crate) fn is_full(&self) -> bool {
        self.allocated_clauses.len() as u32 >= (1 << 30) - 1
    }

    /// The fraction of stored literal data trapped in deleted clauses.
    pub(crate) fn wasted_fraction(&self) -> f64 {
        if self.live_literals + self.wasted_literals == 0 {
            return 0.0;
        }
        self.wasted_literals as f64 / (self.live_literals + self.wasted_literals) as f64
    }

    /// Compacts the arena: every live clause is moved into a fresh arena and
    /// the mapping from old to new references is returned, indexed by the old
    /// clause id. Dead ids map to the null reference. The caller must rewrite
    /// every stored reference (watch lists, reasons, clause lists) before any
    /// further arena access.
    pub(crate) fn garbage_collect(&mut self) -> Vec<ClauseReference> {
        let mut mapping = vec![ClauseReference::null(); self.allocated_clauses.len() + 1];
        let mut surviving_clauses = Vec::new();

        for (old_index, clause) in self.allocated_clauses.drain(..).enumerate() {
            if clause.is_deleted() {
                continue;
            }
            let new_reference = ClauseReference::create_allocated_clause_reference(
                surviving_clauses.len() as u32 + 1,
            );
            mapping[old_index + 1] = new_reference;
            surviving_clauses.push(clause);
        }

        self.allocated_clauses = surviving_clauses;
        self.wasted_literals = 0;

        mapping
    }
}

impl std::ops::Index<ClauseReference> for ClauseAllocator {
    type Output = Clause;
    fn index(&self, clause_reference: ClauseReference) -> &Clause {
        self.get_clause(clause_reference)
    }
}

impl std::ops::IndexMut<ClauseReference> for ClauseAllocator {
    fn index_mut(&mut self, clause_reference: ClauseReference) -> &mut Clause {
        self.get_mutable_clause(clause_reference)
    }
}

impl std::fmt::Display for ClauseAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let clauses_string = &self
            .allocated_clauses
            .iter()
            .fold(String::new(), |acc, clause| format!("{acc}{clause}\n"));

        let num_clauses = self.allocated_clauses.len();
        write!(f, "Num clauses: {num_clauses}\n{clauses_string}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::PropositionalVariable;

    fn literals(codes: &[u32]) -> Vec<Literal> {
        codes.iter().map(|&code| Literal::u32_to_literal(code)).collect()
    }

    #[test]
    fn created_clauses_are_retrievable() {
        let mut allocator = ClauseAllocator::default();
        let reference = allocator.create_clause(literals(&[2, 5]), false);

        assert_eq!(allocator[reference].len(), 2);
        assert!(!allocator[reference].is_learned());
    }

    #[test]
    fn waste_grows_with_deletions_and_resets_on_collection() {
        let mut allocator = ClauseAllocator::default();
        let first = allocator.create_clause(literals(&[2, 5, 7]), false);
        let _second = allocator.create_clause(literals(&[3, 9, 11]), true);

        assert_eq!(allocator.wasted_fraction(), 0.0);
        allocator.delete_clause(first);
        assert_eq!(allocator.wasted_fraction(), 0.5);

        let _ = allocator.garbage_collect();
        assert_eq!(allocator.wasted_fraction(), 0.0);
    }

    #[test]
    fn deleted_ids_are_not_reused_before_collection() {
        let mut allocator = ClauseAllocator::default();
        let first = allocator.create_clause(literals(&[2, 5]), false);
        allocator.delete_clause(first);

        let second = allocator.create_clause(literals(&[3, 9]), false);
        assert_ne!(first.get_code(), second.get_code());
        assert!(allocator[first].is_deleted());
        assert!(!allocator[second].is_deleted());
    }

    #[test]
    fn garbage_collection_maps_live_clauses_to_fresh_references() {
        let mut allocator = ClauseAllocator::default();
        let first = allocator.create_clause(literals(&[2, 5]), false);
        let second = allocator.create_clause(literals(&[3, 9]), false);
        let third = allocator.create_clause(literals(&[7, 11]), true);

        allocator.delete_clause(second);
        let mapping = allocator.garbage_collect();

        assert!(mapping[second.get_code() as usize].is_null());
        let new_first = mapping[first.get_code() as usize];
        let new_third = mapping[third.get_code() as usize];
        assert!(!new_first.is_null());
        assert!(!new_third.is_null());

        assert_eq!(
            allocator[new_first].get_literal_slice(),
            literals(&[2, 5]).as_slice()
        );
        assert_eq!(
            allocator[new_third].get_literal_slice(),
            literals(&[7, 11]).as_slice()
        );
        assert!(allocator[new_third].is_learned());
    }

    #[test]
    fn variable_index_literals_survive_round_trip() {
        let mut allocator = ClauseAllocator::default();
        let a = Literal::new(PropositionalVariable::new(1), true);
        let b = Literal::new(PropositionalVariable::new(2), false);
        let reference = allocator.create_clause(vec![a, b], false);

        assert_eq!(allocator[reference][0], a);
        assert_eq!(allocator[reference][1], b);
    }
}
