mod condition;
mod partition;

pub use partition::FragmentRelationship;

#[cfg(test)]
mod tests;

use crate::{
    cell::{Cell, CellId, Condition},
    error::MapError,
    log::{ErrorCode, ErrorLog},
    oracle::{FragmentOracle, FragmentRef},
};
use mapcheck_schema::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

///
/// ErrorPatternMatcher
///
/// Turns "the generated mapping is inconsistent" into actionable
/// diagnostics by comparing every pair of fragments of an extent: unmapped
/// types, duplicated discriminator conditions, tables split across
/// conceptual sets, and partition mismatches between the two schema sides.
/// Partition findings are capped to avoid error flooding.
///

pub struct ErrorPatternMatcher<'a, O: FragmentOracle> {
    c_schema: &'a Schema,
    cells: &'a [Cell],
    oracle: &'a O,
}

impl<'a, O: FragmentOracle> ErrorPatternMatcher<'a, O> {
    #[must_use]
    pub const fn new(c_schema: &'a Schema, cells: &'a [Cell], oracle: &'a O) -> Self {
        Self {
            c_schema,
            cells,
            oracle,
        }
    }

    /// Run all detectors, appending findings to `log`.
    pub fn run(&self, log: &mut ErrorLog) -> Result<(), MapError> {
        self.check_splits(log)?;

        let mut partition_found = 0usize;
        for (extent, group) in self.groups_by_conceptual_extent() {
            let before = log.len();

            condition::check(self, &group, log)?;
            partition::check(self, &group, log, &mut partition_found)?;

            // Lowest-priority detector: only worth reporting when nothing
            // else explains this extent.
            if log.len() == before {
                self.check_missing_mapping(extent, &group, log)?;
            }
        }

        Ok(())
    }

    // Fragments of one conceptual extent, in cell order.
    fn groups_by_conceptual_extent(&self) -> BTreeMap<&str, Vec<&Cell>> {
        let mut groups: BTreeMap<&str, Vec<&Cell>> = BTreeMap::new();
        for cell in self.cells {
            groups
                .entry(cell.c_query.extent.as_str())
                .or_default()
                .push(cell);
        }

        groups
    }

    fn groups_by_table(&self) -> BTreeMap<&str, Vec<&Cell>> {
        let mut groups: BTreeMap<&str, Vec<&Cell>> = BTreeMap::new();
        for cell in self.cells {
            groups
                .entry(cell.s_query.extent.as_str())
                .or_default()
                .push(cell);
        }

        groups
    }

    // A single storage table mapped to two different, non-equivalent
    // conceptual sets. One finding per table.
    fn check_splits(&self, log: &mut ErrorLog) -> Result<(), MapError> {
        for (table, cells) in self.groups_by_table() {
            let mut seen: BTreeMap<&str, &Cell> = BTreeMap::new();
            let mut flagged = false;

            for cell in &cells {
                for (other_extent, other) in &seen {
                    if *other_extent == cell.c_query.extent.as_str() {
                        continue;
                    }
                    if self.oracle.is_equivalent_to(
                        FragmentRef::conceptual(other.id),
                        FragmentRef::conceptual(cell.id),
                    )? {
                        continue;
                    }

                    log.add_error(
                        ErrorCode::ErrorPatternSplittingError,
                        format!(
                            "table '{table}' is split across conceptual sets \
                             '{other_extent}' and '{}'",
                            cell.c_query.extent
                        ),
                        group_ids(&cells),
                        String::new(),
                    );
                    flagged = true;
                    break;
                }

                if flagged {
                    break;
                }
                seen.entry(cell.c_query.extent.as_str()).or_insert(*cell);
            }
        }

        Ok(())
    }

    // Concrete subtypes of the extent's element type minus every type
    // referenced by a condition constant. A fragment without any type
    // condition maps the whole extent, so nothing can be missing.
    fn check_missing_mapping(
        &self,
        extent: &str,
        group: &[&Cell],
        log: &mut ErrorLog,
    ) -> Result<(), MapError> {
        let Extent::EntitySet { entity_type, .. } = self.c_schema.extent(extent)? else {
            return Ok(());
        };

        let mut referenced = BTreeSet::new();
        for cell in group {
            let mut has_type_condition = false;
            for condition in cell.c_query.conditions.iter().chain(&cell.s_query.conditions) {
                if let Condition::MemberIsType { type_name, .. } = condition {
                    has_type_condition = true;
                    referenced.insert(type_name.as_str());
                }
            }

            if !has_type_condition {
                return Ok(());
            }
        }

        let missing: Vec<&str> = self
            .c_schema
            .concrete_subtypes(entity_type)
            .iter()
            .map(|ty| ty.name.as_str())
            .filter(|name| !referenced.contains(name))
            .collect();

        if !missing.is_empty() {
            log.add_error(
                ErrorCode::ErrorPatternMissingMappingError,
                format!(
                    "no fragment of extent '{extent}' maps the types: {}",
                    missing.join(", ")
                ),
                group_ids(group),
                String::new(),
            );
        }

        Ok(())
    }
}

fn group_ids(group: &[&Cell]) -> Vec<CellId> {
    group.iter().map(|cell| cell.id).collect()
}
