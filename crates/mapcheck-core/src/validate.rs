use crate::{
    cell::Cell,
    constraint::{SchemaConstraints, ViewKeyConstraint},
    error::MapError,
    foreign::ForeignConstraintChecker,
    log::{ErrorCode, ErrorLog},
    oracle::FragmentOracle,
    pattern::ErrorPatternMatcher,
    relation::CellRelationPair,
};
use mapcheck_schema::prelude::*;

///
/// MappingValidator
///
/// Top-level pass over one mapping: build the relation graph of every cell,
/// derive and propagate key constraints, check that keys survive projection
/// in both directions, verify the storage foreign keys, then run the error
/// pattern matcher. Mapping defects land in the returned log; an `Err` means
/// the pass itself could not run (inconsistent metadata, oracle failure).
///

pub struct MappingValidator<'a, O: FragmentOracle> {
    c_schema: &'a Schema,
    s_schema: &'a Schema,
    cells: &'a [Cell],
    oracle: &'a O,
}

impl<'a, O: FragmentOracle> MappingValidator<'a, O> {
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

    pub fn validate(&self) -> Result<ErrorLog, MapError> {
        let mut log = ErrorLog::new();

        // Phase 1: fixed-shape relation graph per cell.
        let pairs = self
            .cells
            .iter()
            .map(CellRelationPair::new)
            .collect::<Result<Vec<_>, _>>()?;

        // Phases 2 and 3: key derivation, propagation, and preservation.
        for pair in &pairs {
            self.check_key_preservation(pair, &mut log)?;
        }

        // Phase 4: storage foreign keys.
        ForeignConstraintChecker::new(self.c_schema, self.s_schema, self.cells, self.oracle)
            .check_all(&mut log)?;

        // Phase 5: structural error patterns.
        ErrorPatternMatcher::new(self.c_schema, self.cells, self.oracle).run(&mut log)?;

        Ok(log)
    }

    // A storage key not reproduced conceptually allows distinct entities to
    // collapse onto one row: an error. The mirror direction only degrades
    // updates, so it is reported as a warning.
    fn check_key_preservation(
        &self,
        pair: &CellRelationPair,
        log: &mut ErrorLog,
    ) -> Result<(), MapError> {
        let c_keys = self.propagated_keys(pair, SchemaSide::Conceptual)?;
        let s_keys = self.propagated_keys(pair, SchemaSide::Storage)?;
        let cell = pair.view.cell();

        for s_key in &s_keys {
            if c_keys
                .iter()
                .any(|c_key| c_key.implies(s_key, &pair.view, self.c_schema))
            {
                continue;
            }

            log.add_error(
                ErrorCode::KeyConstraintViolation,
                format!(
                    "key {} of the storage side of fragment {cell} is not \
                     guaranteed by any conceptual key",
                    s_key.describe(&pair.view, SchemaSide::Storage)
                ),
                vec![cell],
                s_key.describe(&pair.view, SchemaSide::Conceptual),
            );
        }

        for c_key in &c_keys {
            if s_keys
                .iter()
                .any(|s_key| s_key.implies(c_key, &pair.view, self.c_schema))
            {
                continue;
            }

            log.add_warning(
                ErrorCode::KeyConstraintUpdateViolation,
                format!(
                    "key {} of the conceptual side of fragment {cell} is not \
                     backed by any storage key; updates through this fragment \
                     may overwrite unrelated rows",
                    c_key.describe(&pair.view, SchemaSide::Conceptual)
                ),
                vec![cell],
                c_key.describe(&pair.view, SchemaSide::Storage),
            );
        }

        Ok(())
    }

    // Metadata-derived keys of one side, kept only where projection preserves
    // every key member.
    fn propagated_keys(
        &self,
        pair: &CellRelationPair,
        side: SchemaSide,
    ) -> Result<Vec<ViewKeyConstraint>, MapError> {
        let schema = match side {
            SchemaSide::Conceptual => self.c_schema,
            SchemaSide::Storage => self.s_schema,
        };

        let mut basics = SchemaConstraints::new();
        pair.basic(side)
            .populate_key_constraints(schema, &mut basics)?;

        Ok(basics
            .iter()
            .filter_map(|basic| basic.propagate(&pair.view))
            .collect())
    }
}
