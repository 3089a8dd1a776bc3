use std::fmt;
use thiserror::Error as ThisError;

///
/// MapError
///
/// Structural failure inside a validation pass with a stable internal
/// classification. These are integration bugs (malformed input data, an
/// oracle called on inconsistent fragments), never user mapping defects:
/// mapping defects go to the error log instead.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct MapError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl MapError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a keys-origin invariant violation.
    pub(crate) fn keys_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Keys, message)
    }

    /// Construct a relation-origin invariant violation.
    pub(crate) fn relation_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Relation,
            message,
        )
    }

    /// Construct a constraint-origin invariant violation.
    pub(crate) fn constraint_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Constraint,
            message,
        )
    }

    /// Construct a cell-origin invariant violation.
    pub(crate) fn cell_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Cell, message)
    }

    /// Construct an oracle-origin invariant violation.
    pub fn oracle_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Oracle, message)
    }

    /// Construct a metadata-origin internal error.
    pub(crate) fn metadata_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Metadata, message)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

impl From<mapcheck_schema::schema::SchemaError> for MapError {
    fn from(err: mapcheck_schema::schema::SchemaError) -> Self {
        Self::metadata_internal(err.to_string())
    }
}

///
/// ErrorClass
/// Internal error taxonomy for pass-abort classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Internal,
    InvariantViolation,
    Unsupported,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Internal => "internal",
            Self::InvariantViolation => "invariant_violation",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for pass-abort classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Cell,
    Constraint,
    Foreign,
    Keys,
    Metadata,
    Oracle,
    Pattern,
    Relation,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Cell => "cell",
            Self::Constraint => "constraint",
            Self::Foreign => "foreign",
            Self::Keys => "keys",
            Self::Metadata => "metadata",
            Self::Oracle => "oracle",
            Self::Pattern => "pattern",
            Self::Relation => "relation",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_class_is_structured() {
        let err = MapError::keys_invariant("entity type 'X' has no key members");

        assert_eq!(
            err.display_with_class(),
            "keys:invariant_violation: entity type 'X' has no key members"
        );
    }
}
