use crate::{
    cell::{Cell, CellId},
    constraint::{BasicKeyConstraint, SchemaConstraints},
    error::MapError,
    keys::{ExtentKey, key_for_association_end, keys_for_entity_type},
};
use mapcheck_schema::prelude::*;
use std::collections::BTreeSet;

///
/// BasicCellRelation
///
/// All scalar slots visible on one side of a cell before projection:
/// the projected slots plus every member referenced by a condition.
/// Created once per cell side at analysis start, read-only thereafter.
///

#[derive(Clone, Debug)]
pub struct BasicCellRelation {
    cell: CellId,
    side: SchemaSide,
    extent: String,
    slots: Vec<MemberPath>,
}

impl BasicCellRelation {
    pub fn new(cell: &Cell, side: SchemaSide) -> Result<Self, MapError> {
        let query = cell.query(side);
        let mut slots: Vec<MemberPath> = query.slots.iter().map(|s| s.path.clone()).collect();
        for condition in &query.conditions {
            if !slots.contains(condition.path()) {
                slots.push(condition.path().clone());
            }
        }

        if slots.is_empty() {
            return Err(MapError::relation_invariant(format!(
                "cell {} has no visible slots on the {side} side",
                cell.id
            )));
        }

        Ok(Self {
            cell: cell.id,
            side,
            extent: query.extent.clone(),
            slots,
        })
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
    pub fn slots(&self) -> &[MemberPath] {
        &self.slots
    }

    #[must_use]
    pub fn contains(&self, path: &MemberPath) -> bool {
        self.slots.contains(path)
    }

    /// Derive this relation's key constraints from schema metadata and add
    /// them to `constraints`. Dispatches on extent kind: entity sets get the
    /// primary key prefixed at the extent root; association sets get one
    /// constraint per key-forming end, falling back to one constraint over
    /// all ends' key members when no end forms a key. A candidate is added
    /// only when every key member is among the relation's slots: an
    /// un-projected key is not a constraint here.
    pub fn populate_key_constraints(
        &self,
        schema: &Schema,
        constraints: &mut SchemaConstraints<BasicKeyConstraint>,
    ) -> Result<(), MapError> {
        let prefix = MemberPath::root(&self.extent);

        match schema.extent(&self.extent)? {
            Extent::EntitySet { entity_type, .. } => {
                let entity_type = schema.entity_type(entity_type)?;
                for key in keys_for_entity_type(&prefix, entity_type)? {
                    self.add_if_covered(&key, constraints)?;
                }
            }
            Extent::AssociationSet { association, .. } => {
                let association = schema.association(association)?;
                let mut all_fields = Vec::new();
                let mut any_key_end = false;

                for end in &association.ends {
                    let key = key_for_association_end(&prefix, end, schema)?;
                    all_fields.extend(key.fields().iter().cloned());

                    if end.cardinality.forms_key() {
                        any_key_end = true;
                        self.add_if_covered(&key, constraints)?;
                    }
                }

                if !any_key_end {
                    self.add_if_covered(&ExtentKey::new(all_fields)?, constraints)?;
                }
            }
        }

        Ok(())
    }

    // Add a key as a constraint only when all of its fields are visible here.
    fn add_if_covered(
        &self,
        key: &ExtentKey,
        constraints: &mut SchemaConstraints<BasicKeyConstraint>,
    ) -> Result<(), MapError> {
        if key.fields().iter().all(|field| self.contains(field)) {
            let slots: BTreeSet<_> = key.fields().iter().cloned().collect();
            constraints.add(BasicKeyConstraint::new(self.cell, self.side, slots)?);
        }

        Ok(())
    }
}

///
/// ViewCellSlot
///
/// Pairs a conceptual projected slot with the storage slot at the same
/// projection position. Both sides originate from the same cell.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ViewCellSlot {
    pub position: usize,
    pub c_path: MemberPath,
    pub s_path: MemberPath,
}

///
/// ViewCellRelation
///
/// The slots actually projected and exposed across both sides of a cell.
///

#[derive(Clone, Debug)]
pub struct ViewCellRelation {
    cell: CellId,
    slots: Vec<ViewCellSlot>,
}

impl ViewCellRelation {
    pub fn new(cell: &Cell) -> Result<Self, MapError> {
        if cell.c_query.slots.len() != cell.s_query.slots.len() {
            return Err(MapError::relation_invariant(format!(
                "cell {} projection arity mismatch across sides",
                cell.id
            )));
        }

        let slots = cell
            .c_query
            .slots
            .iter()
            .zip(&cell.s_query.slots)
            .enumerate()
            .map(|(position, (c, s))| ViewCellSlot {
                position,
                c_path: c.path.clone(),
                s_path: s.path.clone(),
            })
            .collect();

        Ok(Self {
            cell: cell.id,
            slots,
        })
    }

    #[must_use]
    pub const fn cell(&self) -> CellId {
        self.cell
    }

    #[must_use]
    pub fn slots(&self) -> &[ViewCellSlot] {
        &self.slots
    }

    #[must_use]
    pub fn slot_at(&self, position: usize) -> Option<&ViewCellSlot> {
        self.slots.get(position)
    }

    /// The view slot whose given-side path matches, if the member was
    /// projected into the final mapping fragment.
    #[must_use]
    pub fn slot_for_path(&self, side: SchemaSide, path: &MemberPath) -> Option<&ViewCellSlot> {
        self.slots.iter().find(|slot| match side {
            SchemaSide::Conceptual => slot.c_path == *path,
            SchemaSide::Storage => slot.s_path == *path,
        })
    }
}

///
/// CellRelationPair
///
/// The fixed-shape relation graph of one cell: both basic relations and the
/// view relation, owned by value and created once per pass.
///

#[derive(Clone, Debug)]
pub struct CellRelationPair {
    pub c_basic: BasicCellRelation,
    pub s_basic: BasicCellRelation,
    pub view: ViewCellRelation,
}

impl CellRelationPair {
    pub fn new(cell: &Cell) -> Result<Self, MapError> {
        Ok(Self {
            c_basic: BasicCellRelation::new(cell, SchemaSide::Conceptual)?,
            s_basic: BasicCellRelation::new(cell, SchemaSide::Storage)?,
            view: ViewCellRelation::new(cell)?,
        })
    }

    #[must_use]
    pub const fn basic(&self, side: SchemaSide) -> &BasicCellRelation {
        match side {
            SchemaSide::Conceptual => &self.c_basic,
            SchemaSide::Storage => &self.s_basic,
        }
    }
}
