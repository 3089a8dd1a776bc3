use crate::{cell::CellId, error::MapError};
use mapcheck_schema::types::SchemaSide;

///
/// FragmentRef
///
/// Opaque handle to one fragment query: the boolean role of one side of a
/// cell over its underlying predicate. The core never inspects fragment
/// internals; it only hands refs to the oracle.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FragmentRef {
    pub cell: CellId,
    pub side: SchemaSide,
}

impl FragmentRef {
    #[must_use]
    pub const fn new(cell: CellId, side: SchemaSide) -> Self {
        Self { cell, side }
    }

    #[must_use]
    pub const fn conceptual(cell: CellId) -> Self {
        Self::new(cell, SchemaSide::Conceptual)
    }

    #[must_use]
    pub const fn storage(cell: CellId) -> Self {
        Self::new(cell, SchemaSide::Storage)
    }
}

///
/// FragmentOracle
///
/// Decision procedure over fragment queries, supplied by the caller. An
/// `Err` from any method signals an integration bug (for example, fragments
/// of inconsistent kinds) and aborts the validation pass.
///

pub trait FragmentOracle {
    fn is_contained_in(&self, a: FragmentRef, b: FragmentRef) -> Result<bool, MapError>;

    fn is_disjoint_from(&self, a: FragmentRef, b: FragmentRef) -> Result<bool, MapError>;

    fn is_equivalent_to(&self, a: FragmentRef, b: FragmentRef) -> Result<bool, MapError>;
}
