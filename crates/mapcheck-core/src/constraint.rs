use crate::{
    cell::CellId,
    error::MapError,
    relation::ViewCellRelation,
};
use derive_more::{Deref, IntoIterator};
use mapcheck_schema::prelude::*;
use std::collections::BTreeSet;
use std::fmt;

///
/// SchemaConstraints
///
/// Growable, insertion-ordered list of key constraints of one kind for one
/// schema side. No dedup: callers may add the same constraint twice.
///

#[derive(Clone, Debug, Deref, IntoIterator)]
pub struct SchemaConstraints<T>(Vec<T>);

impl<T> SchemaConstraints<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn add(&mut self, constraint: T) {
        self.0.push(constraint);
    }
}

impl<T> Default for SchemaConstraints<T> {
    fn default() -> Self {
        Self::new()
    }
}

///
/// BasicKeyConstraint
///
/// A non-empty set of member paths that must be unique on one basic cell
/// relation. Order-irrelevant, duplicates collapsed.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BasicKeyConstraint {
    cell: CellId,
    side: SchemaSide,
    slots: BTreeSet<MemberPath>,
}

impl BasicKeyConstraint {
    pub fn new(
        cell: CellId,
        side: SchemaSide,
        slots: BTreeSet<MemberPath>,
    ) -> Result<Self, MapError> {
        if slots.is_empty() {
            return Err(MapError::constraint_invariant(format!(
                "key constraint on cell {cell} built with zero slots"
            )));
        }

        Ok(Self { cell, side, slots })
    }

    #[must_use]
    pub const fn cell(&self) -> CellId {
        self.cell
    }

    #[must_use]
    pub const fn side(&self) -> SchemaSide {
        self.side
    }

    #[must_use]
    pub const fn slots(&self) -> &BTreeSet<MemberPath> {
        &self.slots
    }

    /// Trivial key widening: a key over fewer slots implies any key over a
    /// superset of those slots.
    #[must_use]
    pub fn implies(&self, other: &Self) -> bool {
        self.cell == other.cell
            && self.side == other.side
            && self.slots.is_subset(&other.slots)
    }

    /// Propagate this constraint to the view level: every key slot must have
    /// a matching view cell slot. Any slot not projected into the final
    /// mapping fragment loses the key, and propagation returns `None`.
    #[must_use]
    pub fn propagate(&self, view: &ViewCellRelation) -> Option<ViewKeyConstraint> {
        let mut positions = BTreeSet::new();
        for path in &self.slots {
            let slot = view.slot_for_path(self.side, path)?;
            positions.insert(slot.position);
        }

        Some(ViewKeyConstraint {
            cell: self.cell,
            side: self.side,
            slots: positions,
        })
    }
}

impl fmt::Display for BasicKeyConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key[{} {}:", self.cell, self.side)?;
        for path in &self.slots {
            write!(f, " {path}")?;
        }
        write!(f, "]")
    }
}

///
/// ViewKeyConstraint
///
/// A key constraint propagated onto a view cell relation; slots are view
/// slot positions, so a single constraint speaks about both schema sides.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ViewKeyConstraint {
    cell: CellId,
    side: SchemaSide,
    slots: BTreeSet<usize>,
}

impl ViewKeyConstraint {
    #[must_use]
    pub const fn cell(&self) -> CellId {
        self.cell
    }

    /// The side whose basic constraint this was propagated from.
    #[must_use]
    pub const fn side(&self) -> SchemaSide {
        self.side
    }

    #[must_use]
    pub const fn slots(&self) -> &BTreeSet<usize> {
        &self.slots
    }

    /// True when this constraint guarantees `other`: either the slot set is
    /// a subset of `other`'s (key widening), or every slot has a counterpart
    /// in `other` with an identical storage path and a conceptual path that
    /// is identical or equivalent via a declared referential constraint.
    ///
    /// The referential-equivalence case is not transitive; callers must not
    /// chain it.
    #[must_use]
    pub fn implies(
        &self,
        other: &Self,
        view: &ViewCellRelation,
        c_schema: &Schema,
    ) -> bool {
        if self.cell != other.cell {
            return false;
        }
        if self.slots.is_subset(&other.slots) {
            return true;
        }

        self.slots.iter().all(|position| {
            let Some(slot) = view.slot_at(*position) else {
                return false;
            };

            other.slots.iter().any(|other_position| {
                let Some(other_slot) = view.slot_at(*other_position) else {
                    return false;
                };

                slot.s_path == other_slot.s_path
                    && (slot.c_path == other_slot.c_path
                        || slot
                            .c_path
                            .equivalent_via_ref_constraint(&other_slot.c_path, c_schema))
            })
        })
    }

    /// Render the constraint's member paths on one side, for diagnostics.
    #[must_use]
    pub fn describe(&self, view: &ViewCellRelation, side: SchemaSide) -> String {
        let fields: Vec<String> = self
            .slots
            .iter()
            .filter_map(|position| view.slot_at(*position))
            .map(|slot| match side {
                SchemaSide::Conceptual => slot.c_path.to_string(),
                SchemaSide::Storage => slot.s_path.to_string(),
            })
            .collect();

        format!("({})", fields.join(", "))
    }
}
