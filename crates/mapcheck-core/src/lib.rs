//! Consistency validator for bidirectional schema mappings: key-constraint
//! derivation and propagation, foreign-key verification against the
//! conceptual schema, and structural error-pattern diagnosis.

pub mod cell;
pub mod constraint;
pub mod error;
pub mod foreign;
pub mod keys;
pub mod log;
pub mod oracle;
pub mod pattern;
pub mod relation;
pub mod validate;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Maximum number of partition findings reported in one pass.
///
/// One wrong fragment tends to mismatch against every sibling; past a
/// handful of reports the extra pairs carry no new information.
pub const PARTITION_ERROR_CAP: usize = 5;

///
/// Prelude
///
/// Prelude contains the validator entry points and the vocabulary needed to
/// call them. Internal relation and constraint machinery stays one module
/// level down.
///

pub mod prelude {
    pub use crate::{
        cell::{Cell, CellId, CellQuery, Condition, ConditionValue},
        error::MapError,
        log::{ErrorCode, ErrorLog, MappingDiagnostic},
        oracle::{FragmentOracle, FragmentRef},
        validate::MappingValidator,
    };
    pub use mapcheck_schema::prelude::*;
}
