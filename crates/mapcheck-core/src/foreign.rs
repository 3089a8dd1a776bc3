use crate::{
    cell::{Cell, CellId},
    error::MapError,
    keys::key_for_association_end,
    log::{ErrorCode, ErrorLog},
    oracle::{FragmentOracle, FragmentRef},
};
use mapcheck_schema::prelude::*;
use std::collections::BTreeSet;

///
/// ForeignConstraintChecker
///
/// Verifies that every storage foreign key is faithfully represented in the
/// conceptual schema: directly via an independent association, implicitly
/// because the key is a superset of the child table's primary key, or
/// through a mapped relationship with aligned multiplicities. Findings are
/// appended to the error log; the checker never fails on a mapping defect.
///

pub struct ForeignConstraintChecker<'a, O: FragmentOracle> {
    c_schema: &'a Schema,
    s_schema: &'a Schema,
    cells: &'a [Cell],
    oracle: &'a O,
}

impl<'a, O: FragmentOracle> ForeignConstraintChecker<'a, O> {
    #[must_use]
    pub const fn new(
        c_schema: &'a Schema,
        s_schema: &'a Schema,
        cells: &'a [Cell],
        oracle: &'a O,
    ) -> Self {
        Self {
            c_schema,
            s_schema,
            cells,
            oracle,
        }
    }

    /// Evaluate every declared foreign key once.
    pub fn check_all(&self, log: &mut ErrorLog) -> Result<(), MapError> {
        for fk in self.s_schema.foreign_constraints() {
            self.check_constraint(fk, log)?;
        }

        Ok(())
    }

    fn check_constraint(&self, fk: &ForeignConstraint, log: &mut ErrorLog) -> Result<(), MapError> {
        let parent_cells = self.cells_for_table(fk.parent_table());
        let child_cells = self.cells_for_table(fk.child_table());

        // Step 1: relevance. An untouched foreign key is out of scope.
        if parent_cells.is_empty() && child_cells.is_empty() {
            return Ok(());
        }

        // Step 2: coverage. One mapped side without the other breaks the key.
        if parent_cells.is_empty() || child_cells.is_empty() {
            let missing = if parent_cells.is_empty() {
                fk.parent_table()
            } else {
                fk.child_table()
            };
            let involved = cell_ids(parent_cells.iter().chain(&child_cells));

            log.add_error(
                ErrorCode::ForeignKeyMissingTableMapping,
                format!(
                    "foreign key {} requires a mapping for table '{missing}'",
                    describe(fk)
                ),
                involved,
                String::new(),
            );
            return Ok(());
        }

        // Step 3: an independent association already guarantees the key.
        if self.matches_independent_association(fk, &parent_cells, &child_cells) {
            self.check_column_order(fk, &parent_cells, &child_cells, log);
            return Ok(());
        }

        // Step 4: a key-superset foreign key reduces to entity identity.
        if self.is_fk_superset_of_child_pk(fk)? {
            if self.check_pk_superset_containment(fk, &parent_cells, &child_cells, log)? {
                self.check_column_order(fk, &parent_cells, &child_cells, log);
            }
            return Ok(());
        }

        // Step 5: the key must be represented by a mapped relationship.
        self.check_relationship_mapping(fk, &parent_cells, &child_cells, log)
    }

    fn cells_for_table(&self, table: &str) -> Vec<&'a Cell> {
        self.cells
            .iter()
            .filter(|cell| cell.s_query.extent == table)
            .collect()
    }

    // Conceptual paths reached by ordered columns of `table` in one cell,
    // by projection-position correspondence. None when the cell does not map
    // the table or misses a column.
    fn conceptual_paths(
        cell: &Cell,
        table: &str,
        columns: &[MemberPath],
    ) -> Option<Vec<MemberPath>> {
        if cell.s_query.extent != table {
            return None;
        }

        columns
            .iter()
            .map(|column| {
                cell.s_query
                    .index_of_path(column)
                    .and_then(|position| cell.c_query.slot_at(position))
                    .map(|slot| slot.path.clone())
            })
            .collect()
    }

    // Step 3 predicate: both column lists map, in some cell each, onto the
    // dependent/principal properties of one declared referential constraint,
    // by index correspondence rather than mere set equality.
    fn matches_independent_association(
        &self,
        fk: &ForeignConstraint,
        parent_cells: &[&Cell],
        child_cells: &[&Cell],
    ) -> bool {
        for rc in self.c_schema.ref_constraints() {
            let Ok(association) = self.c_schema.association(&rc.association) else {
                continue;
            };
            let (Some(principal), Some(dependent)) = (
                association.end(&rc.principal_end),
                association.end(&rc.dependent_end),
            ) else {
                continue;
            };

            let child_ok = child_cells.iter().any(|cell| {
                self.columns_match_properties(
                    cell,
                    fk.child_table(),
                    fk.child_columns(),
                    &dependent.entity_set,
                    &rc.dependent_properties,
                )
            });
            let parent_ok = parent_cells.iter().any(|cell| {
                self.columns_match_properties(
                    cell,
                    fk.parent_table(),
                    fk.parent_columns(),
                    &principal.entity_set,
                    &rc.principal_properties,
                )
            });

            if child_ok && parent_ok {
                return true;
            }
        }

        false
    }

    // Ordered columns resolve, position by position, onto the given
    // properties of the given entity set.
    fn columns_match_properties(
        &self,
        cell: &Cell,
        table: &str,
        columns: &[MemberPath],
        entity_set: &str,
        properties: &[String],
    ) -> bool {
        if columns.len() != properties.len() {
            return false;
        }
        let Some(paths) = Self::conceptual_paths(cell, table, columns) else {
            return false;
        };

        paths.iter().zip(properties).all(|(path, property)| {
            path.resolve_scalar(self.c_schema).is_some_and(|position| {
                position.entity_set == entity_set && position.property == *property
            })
        })
    }

    /// Order-insensitive: true when the foreign key's child columns cover the
    /// child table's own primary key.
    fn is_fk_superset_of_child_pk(&self, fk: &ForeignConstraint) -> Result<bool, MapError> {
        let child_type = self.s_schema.entity_type_of_extent(fk.child_table())?;
        let fk_columns: BTreeSet<&MemberPath> = fk.child_columns().iter().collect();

        let pk_columns: Vec<MemberPath> = child_type
            .key_properties()
            .iter()
            .map(|member| MemberPath::new(fk.child_table(), [member.as_str()]))
            .collect();

        Ok(pk_columns.iter().all(|column| fk_columns.contains(column)))
    }

    // Step 4: the key reduces to entity identity; every child fragment's
    // conceptual query must be contained in some parent fragment's.
    fn check_pk_superset_containment(
        &self,
        fk: &ForeignConstraint,
        parent_cells: &[&Cell],
        child_cells: &[&Cell],
        log: &mut ErrorLog,
    ) -> Result<bool, MapError> {
        for child in child_cells {
            let mut contained = false;
            for parent in parent_cells {
                if child.id == parent.id
                    || self.oracle.is_contained_in(
                        FragmentRef::conceptual(child.id),
                        FragmentRef::conceptual(parent.id),
                    )?
                {
                    contained = true;
                    break;
                }
            }

            if !contained {
                log.add_error(
                    ErrorCode::ForeignKeyNotGuaranteedInCSpace,
                    format!(
                        "foreign key {} is not guaranteed on the conceptual side: \
                         the child fragment is not contained in any parent fragment",
                        describe(fk)
                    ),
                    cell_ids(child_cells.iter().chain(parent_cells)),
                    String::new(),
                );
                return Ok(false);
            }
        }

        Ok(true)
    }

    // Step 5: find a cell mapping the child columns onto one association end
    // and the parent columns onto the entity key at that end.
    fn check_relationship_mapping(
        &self,
        fk: &ForeignConstraint,
        parent_cells: &[&Cell],
        child_cells: &[&Cell],
        log: &mut ErrorLog,
    ) -> Result<(), MapError> {
        let mut end_match: Option<(&Cell, &AssociationEnd)> = None;

        for cell in child_cells {
            let Ok(extent) = self.c_schema.extent(&cell.c_query.extent) else {
                continue;
            };
            let Extent::AssociationSet { name, association } = extent else {
                continue;
            };
            let association = self.c_schema.association(association)?;
            let prefix = MemberPath::root(name);
            let Some(child_paths) =
                Self::conceptual_paths(cell, fk.child_table(), fk.child_columns())
            else {
                continue;
            };

            for end in &association.ends {
                let end_key = key_for_association_end(&prefix, end, self.c_schema)?;
                if !same_path_set(&child_paths, end_key.fields()) {
                    continue;
                }
                end_match = Some((*cell, end));
                break;
            }

            if end_match.is_some() {
                break;
            }
        }

        let Some((assoc_cell, parent_end)) = end_match else {
            log.add_error(
                ErrorCode::ForeignKeyMissingRelationshipMapping,
                format!(
                    "foreign key {} has no relationship mapping: no cell maps its \
                     child columns onto an association end",
                    describe(fk)
                ),
                cell_ids(child_cells.iter().chain(parent_cells)),
                String::new(),
            );
            return Ok(());
        };

        // The parent columns must map to the entity key of the entity set at
        // the matched end, in some parent-table cell.
        let entity_key = self.entity_key_paths(&parent_end.entity_set)?;
        let parent_mapped = parent_cells.iter().any(|cell| {
            Self::conceptual_paths(cell, fk.parent_table(), fk.parent_columns())
                .is_some_and(|paths| same_path_set(&paths, &entity_key))
        });

        if parent_mapped {
            if !self.check_end_multiplicity(fk, assoc_cell, parent_end, log)? {
                return Ok(());
            }
            self.check_column_order(fk, parent_cells, child_cells, log);
            return Ok(());
        }

        // Only the association end is mapped: the end's role constraint must
        // entail some parent fragment.
        for parent in parent_cells {
            if self.oracle.is_contained_in(
                FragmentRef::conceptual(assoc_cell.id),
                FragmentRef::conceptual(parent.id),
            )? {
                if !self.check_end_multiplicity(fk, assoc_cell, parent_end, log)? {
                    return Ok(());
                }
                self.check_column_order(fk, parent_cells, child_cells, log);
                return Ok(());
            }
        }

        log.add_error(
            ErrorCode::ForeignKeyParentTableNotMappedToEnd,
            format!(
                "foreign key {} maps its child columns to association end '{}' but \
                 table '{}' is not mapped to that end",
                describe(fk),
                parent_end.name,
                fk.parent_table()
            ),
            cell_ids(parent_cells.iter().chain(std::iter::once(&assoc_cell))),
            String::new(),
        );

        Ok(())
    }

    // Multiplicity alignment for a mapped relationship. Upper bound: the
    // parent end must functionally determine the relationship. Lower bound:
    // a non-nullable foreign key forces exactly one.
    fn check_end_multiplicity(
        &self,
        fk: &ForeignConstraint,
        assoc_cell: &Cell,
        parent_end: &AssociationEnd,
        log: &mut ErrorLog,
    ) -> Result<bool, MapError> {
        if !parent_end.cardinality.forms_key() {
            log.add_error(
                ErrorCode::ForeignKeyUpperBoundMustBeOne,
                format!(
                    "foreign key {}: multiplicity of end '{}' must be at most one, found {}",
                    describe(fk),
                    parent_end.name,
                    parent_end.cardinality
                ),
                vec![assoc_cell.id],
                String::new(),
            );
            return Ok(false);
        }

        if self.fk_has_non_nullable_column(fk)? && !parent_end.cardinality.is_exactly_one() {
            log.add_error(
                ErrorCode::ForeignKeyLowerBoundMustBeOne,
                format!(
                    "foreign key {} has non-nullable columns: multiplicity of end '{}' \
                     must be exactly one, found {}",
                    describe(fk),
                    parent_end.name,
                    parent_end.cardinality
                ),
                vec![assoc_cell.id],
                String::new(),
            );
            return Ok(false);
        }

        Ok(true)
    }

    fn fk_has_non_nullable_column(&self, fk: &ForeignConstraint) -> Result<bool, MapError> {
        let child_type = self.s_schema.entity_type_of_extent(fk.child_table())?;

        Ok(fk.child_columns().iter().any(|column| {
            column
                .leaf()
                .and_then(|name| child_type.property(name))
                .is_some_and(|property| !property.nullable)
        }))
    }

    // Step 6: across every mapped (child-cell, parent-cell) pair, the
    // conceptual paths reached by the ordered child columns must agree,
    // positionally or via referential-constraint equivalence, with those
    // reached by the ordered parent columns.
    fn check_column_order(
        &self,
        fk: &ForeignConstraint,
        parent_cells: &[&Cell],
        child_cells: &[&Cell],
        log: &mut ErrorLog,
    ) {
        for child in child_cells {
            let Some(child_paths) =
                Self::conceptual_paths(child, fk.child_table(), fk.child_columns())
            else {
                continue;
            };

            for parent in parent_cells {
                let Some(parent_paths) =
                    Self::conceptual_paths(parent, fk.parent_table(), fk.parent_columns())
                else {
                    continue;
                };

                let misaligned = child_paths
                    .iter()
                    .zip(&parent_paths)
                    .any(|(c, p)| !self.paths_agree(c, p));

                if misaligned {
                    log.add_error(
                        ErrorCode::ForeignKeyColumnOrderIncorrect,
                        format!(
                            "foreign key {}: conceptual members reached by the child \
                             columns do not align with the parent columns",
                            describe(fk)
                        ),
                        vec![child.id, parent.id],
                        format!(
                            "child -> {child_paths:?}, parent -> {parent_paths:?}"
                        ),
                    );
                    return;
                }
            }
        }
    }

    fn paths_agree(&self, a: &MemberPath, b: &MemberPath) -> bool {
        if a == b || a.equivalent_via_ref_constraint(b, self.c_schema) {
            return true;
        }

        match (a.resolve_scalar(self.c_schema), b.resolve_scalar(self.c_schema)) {
            (Some(pa), Some(pb)) => pa == pb,
            _ => false,
        }
    }

    fn entity_key_paths(&self, entity_set: &str) -> Result<Vec<MemberPath>, MapError> {
        let entity_type = self.c_schema.entity_type_of_extent(entity_set)?;
        let prefix = MemberPath::root(entity_set);

        Ok(entity_type
            .key_properties()
            .iter()
            .map(|member| prefix.extend(member))
            .collect())
    }
}

// Set comparison between two path collections.
fn same_path_set(a: &[MemberPath], b: &[MemberPath]) -> bool {
    let a: BTreeSet<&MemberPath> = a.iter().collect();
    let b: BTreeSet<&MemberPath> = b.iter().collect();

    a == b
}

fn cell_ids<'a, I>(cells: I) -> Vec<CellId>
where
    I: IntoIterator<Item = &'a &'a Cell>,
{
    let mut ids: Vec<CellId> = cells.into_iter().map(|cell| cell.id).collect();
    ids.sort_unstable();
    ids.dedup();

    ids
}

fn describe(fk: &ForeignConstraint) -> String {
    let child: Vec<&str> = fk.child_columns().iter().filter_map(MemberPath::leaf).collect();
    let parent: Vec<&str> = fk.parent_columns().iter().filter_map(MemberPath::leaf).collect();

    format!(
        "{}({}) -> {}({})",
        fk.child_table(),
        child.join(", "),
        fk.parent_table(),
        parent.join(", ")
    )
}
