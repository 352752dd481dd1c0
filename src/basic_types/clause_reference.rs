use std::fmt::Debug;
use std::fmt::Formatter;

use bitfield::BitRange;

use crate::basic_types::StorageKey;
use crate::pitaya_assert_moderate;

/// Opaque logical index into the clause arena. Holders never see a native
/// pointer; after garbage collection the allocator rewrites every stored
/// reference, so a reference is only meaningful for the arena that issued it.
///
/// The id occupies the lower 30 bits. Id zero is reserved as the null
/// reference, used where a propagated literal has no reason clause.
#[derive(PartialEq, Eq, Clone, Copy, Hash)]
pub(crate) struct ClauseReference {
    code: u32,
}

impl Debug for ClauseReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "ClauseReference::Null")
        } else {
            write!(f, "ClauseReference({})", self.get_code())
        }
    }
}

impl ClauseReference {
    pub(crate) fn create_allocated_clause_reference(id: u32) -> Self {
        pitaya_assert_moderate!(id != 0 && ClauseReference::is_valid_allocated_clause_id(id));
        ClauseReference { code: id }
    }

    pub(crate) fn null() -> ClauseReference {
        ClauseReference { code: 0 }
    }

    pub(crate) fn is_null(&self) -> bool {
        self.code == 0
    }

    pub(crate) fn get_code(&self) -> u32 {
        self.code
    }

    fn is_valid_allocated_clause_id(clause_id: u32) -> bool {
        // The two most significant bits are reserved.
        <u32 as BitRange<u32>>::bit_range(&clause_id, 31, 30) == 0
    }
}

impl StorageKey for ClauseReference {
    fn index(&self) -> usize {
        self.code as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocated_clause_reference_round_trips_its_id() {
        let clause_id: u32 = 10;
        let clause_reference = ClauseReference::create_allocated_clause_reference(clause_id);
        assert!(!clause_reference.is_null());
        assert_eq!(clause_reference.get_code(), clause_id);
    }

    #[test]
    fn null_reference_is_reported_as_null() {
        assert!(ClauseReference::null().is_null());
    }
}
