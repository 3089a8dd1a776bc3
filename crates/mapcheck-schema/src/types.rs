use derive_more::{Display, FromStr};
use serde::{Deserialize, Serialize};

///
/// Cardinality
///
/// Multiplicity of an association end.
///

#[derive(
    Clone, Copy, Default, Debug, Deserialize, Display, Eq, FromStr, Ord, PartialEq, PartialOrd,
    Serialize,
)]
pub enum Cardinality {
    #[default]
    One,
    Opt,
    Many,
}

impl Cardinality {
    /// True when an end with this multiplicity functionally determines the
    /// relationship instance (upper bound of one).
    #[must_use]
    pub const fn forms_key(self) -> bool {
        matches!(self, Self::One | Self::Opt)
    }

    #[must_use]
    pub const fn is_exactly_one(self) -> bool {
        matches!(self, Self::One)
    }
}

///
/// SchemaSide
///
/// The two schemas a mapping cell bridges.
///

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, FromStr, Hash, Ord, PartialEq, PartialOrd,
    Serialize,
)]
pub enum SchemaSide {
    Conceptual,
    Storage,
}

impl SchemaSide {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Conceptual => Self::Storage,
            Self::Storage => Self::Conceptual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardinality_forms_key_matches_upper_bound() {
        assert!(Cardinality::One.forms_key());
        assert!(Cardinality::Opt.forms_key());
        assert!(!Cardinality::Many.forms_key());
    }

    #[test]
    fn side_opposite_is_involutive() {
        for side in [SchemaSide::Conceptual, SchemaSide::Storage] {
            assert_eq!(side.opposite().opposite(), side);
        }
    }
}
