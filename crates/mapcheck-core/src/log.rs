use crate::cell::CellId;
use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};

///
/// ErrorCode
///
/// Stable diagnostic taxonomy produced by the validator. Codes are consumed
/// by callers deciding whether a mapping is usable; messages are for humans.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum ErrorCode {
    ErrorPatternConditionError,
    ErrorPatternInvalidPartitionError,
    ErrorPatternMissingMappingError,
    ErrorPatternSplittingError,
    ForeignKeyColumnOrderIncorrect,
    ForeignKeyLowerBoundMustBeOne,
    ForeignKeyMissingRelationshipMapping,
    ForeignKeyMissingTableMapping,
    ForeignKeyNotGuaranteedInCSpace,
    ForeignKeyParentTableNotMappedToEnd,
    ForeignKeyUpperBoundMustBeOne,
    KeyConstraintUpdateViolation,
    KeyConstraintViolation,
}

///
/// MappingDiagnostic
///
/// One structured finding: a code, a human-readable message, the cells
/// involved, and free-form debug detail for tooling.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MappingDiagnostic {
    pub is_error: bool,
    pub code: ErrorCode,
    pub message: String,
    pub cells: Vec<CellId>,
    pub debug_info: String,
}

///
/// ErrorLog
///
/// Ordered append sink for mapping diagnostics. The validator only appends;
/// the caller decides whether accumulated records are fatal.
///

#[derive(Clone, Debug, Default, Deref, Deserialize, Serialize)]
pub struct ErrorLog(Vec<MappingDiagnostic>);

impl ErrorLog {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn add(&mut self, diagnostic: MappingDiagnostic) {
        self.0.push(diagnostic);
    }

    /// Append an error-severity record.
    pub fn add_error(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
        cells: Vec<CellId>,
        debug_info: impl Into<String>,
    ) {
        self.add(MappingDiagnostic {
            is_error: true,
            code,
            message: message.into(),
            cells,
            debug_info: debug_info.into(),
        });
    }

    /// Append a warning-severity record.
    pub fn add_warning(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
        cells: Vec<CellId>,
        debug_info: impl Into<String>,
    ) {
        self.add(MappingDiagnostic {
            is_error: false,
            code,
            message: message.into(),
            cells,
            debug_info: debug_info.into(),
        });
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.0.iter().filter(|d| d.is_error).count()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.is_error)
    }

    /// Count of records carrying a specific code.
    #[must_use]
    pub fn count_of(&self, code: ErrorCode) -> usize {
        self.0.iter().filter(|d| d.code == code).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_preserves_append_order_and_severity() {
        let mut log = ErrorLog::new();
        log.add_warning(
            ErrorCode::KeyConstraintUpdateViolation,
            "conceptual key not backed by storage key",
            vec![CellId(0)],
            "",
        );
        log.add_error(
            ErrorCode::KeyConstraintViolation,
            "storage key not reproduced",
            vec![CellId(1)],
            "",
        );

        assert_eq!(log.len(), 2);
        assert_eq!(log.error_count(), 1);
        assert!(log.has_errors());
        assert_eq!(log[0].code, ErrorCode::KeyConstraintUpdateViolation);
        assert!(!log[0].is_error);
    }

    #[test]
    fn diagnostics_serialize_for_tooling() {
        let mut log = ErrorLog::new();
        log.add_error(
            ErrorCode::ErrorPatternSplittingError,
            "table split across conceptual sets",
            vec![CellId(2), CellId(3)],
            "TOrders -> Orders, ArchivedOrders",
        );

        let json = serde_json::to_string(&log).unwrap();
        assert!(json.contains("ErrorPatternSplittingError"));
        assert!(json.contains("TOrders"));
    }
}
