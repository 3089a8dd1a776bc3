use crate::error::MapError;
use derive_more::Display;
use mapcheck_schema::prelude::*;

///
/// CellId
///
/// Identity of one mapping fragment, stable for the duration of a pass.
///

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[display("C{_0}")]
pub struct CellId(pub u32);

///
/// ConditionValue
///

#[derive(Clone, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub enum ConditionValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl ConditionValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

///
/// Condition
///
/// One conjunct of a cell query's where-clause.
///

#[derive(Clone, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Condition {
    /// The element at `path` is of the named concrete type.
    MemberIsType { path: MemberPath, type_name: String },

    /// The scalar at `path` equals a constant.
    MemberEquals {
        path: MemberPath,
        value: ConditionValue,
    },

    MemberIsNull { path: MemberPath },
    MemberIsNotNull { path: MemberPath },
}

impl Condition {
    pub fn is_type(path: MemberPath, type_name: impl Into<String>) -> Self {
        Self::MemberIsType {
            path,
            type_name: type_name.into(),
        }
    }

    pub const fn equals(path: MemberPath, value: ConditionValue) -> Self {
        Self::MemberEquals { path, value }
    }

    #[must_use]
    pub const fn path(&self) -> &MemberPath {
        match self {
            Self::MemberIsType { path, .. }
            | Self::MemberEquals { path, .. }
            | Self::MemberIsNull { path }
            | Self::MemberIsNotNull { path } => path,
        }
    }

    /// True for conditions that discriminate rows by a constant value.
    #[must_use]
    pub const fn is_discriminator(&self) -> bool {
        matches!(self, Self::MemberIsType { .. } | Self::MemberEquals { .. })
    }
}

///
/// ProjectedSlot
///
/// Binds one projection position to a member path. The position is the
/// slot's index within its query's slot list.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ProjectedSlot {
    pub path: MemberPath,
}

impl ProjectedSlot {
    pub const fn new(path: MemberPath) -> Self {
        Self { path }
    }
}

///
/// CellQuery
///
/// One side of a cell: an extent, the ordered projected slots, and a
/// conjunctive where-clause.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CellQuery {
    pub extent: String,
    pub slots: Vec<ProjectedSlot>,
    pub conditions: Vec<Condition>,
}

impl CellQuery {
    pub fn new<S, C>(extent: impl Into<String>, slots: S, conditions: C) -> Self
    where
        S: IntoIterator<Item = MemberPath>,
        C: IntoIterator<Item = Condition>,
    {
        Self {
            extent: extent.into(),
            slots: slots.into_iter().map(ProjectedSlot::new).collect(),
            conditions: conditions.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn slot_at(&self, position: usize) -> Option<&ProjectedSlot> {
        self.slots.get(position)
    }

    /// Projection position of `path`, if projected.
    #[must_use]
    pub fn index_of_path(&self, path: &MemberPath) -> Option<usize> {
        self.slots.iter().position(|slot| slot.path == *path)
    }

    #[must_use]
    pub fn projects(&self, path: &MemberPath) -> bool {
        self.index_of_path(path).is_some()
    }

    /// Discriminator conditions (type and constant-equality conjuncts).
    pub fn discriminators(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.iter().filter(|c| c.is_discriminator())
    }

    #[must_use]
    pub fn has_not_null_on(&self, path: &MemberPath) -> bool {
        self.conditions
            .iter()
            .any(|c| matches!(c, Condition::MemberIsNotNull { path: p } if p == path))
    }
}

///
/// Cell
///
/// A conceptual/storage query pair describing one mapping fragment.
/// Immutable once constructed; the validator only reads it.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Cell {
    pub id: CellId,
    pub c_query: CellQuery,
    pub s_query: CellQuery,
}

impl Cell {
    pub fn new(id: CellId, c_query: CellQuery, s_query: CellQuery) -> Result<Self, MapError> {
        if c_query.slots.is_empty() {
            return Err(MapError::cell_invariant(format!(
                "cell {id} projects no slots"
            )));
        }
        if c_query.slots.len() != s_query.slots.len() {
            return Err(MapError::cell_invariant(format!(
                "cell {id} projects {} conceptual slots but {} storage slots",
                c_query.slots.len(),
                s_query.slots.len()
            )));
        }

        Ok(Self {
            id,
            c_query,
            s_query,
        })
    }

    #[must_use]
    pub const fn query(&self, side: SchemaSide) -> &CellQuery {
        match side {
            SchemaSide::Conceptual => &self.c_query,
            SchemaSide::Storage => &self.s_query,
        }
    }
}
