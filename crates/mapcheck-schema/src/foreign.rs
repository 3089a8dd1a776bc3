use crate::{path::MemberPath, schema::SchemaError};
use serde::{Deserialize, Serialize};

///
/// ForeignConstraint
///
/// A storage-side foreign key: ordered parent columns referenced by ordered
/// child columns. Columns are member paths rooted at the respective table
/// extent; the two lists have equal, non-zero length.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ForeignConstraint {
    parent_table: String,
    child_table: String,
    parent_columns: Vec<MemberPath>,
    child_columns: Vec<MemberPath>,
}

impl ForeignConstraint {
    pub fn new<P, C>(
        parent_table: impl Into<String>,
        parent_columns: P,
        child_table: impl Into<String>,
        child_columns: C,
    ) -> Result<Self, SchemaError>
    where
        P: IntoIterator<Item = &'static str>,
        C: IntoIterator<Item = &'static str>,
    {
        let parent_table = parent_table.into();
        let child_table = child_table.into();
        let parent_columns: Vec<_> = parent_columns
            .into_iter()
            .map(|column| MemberPath::new(parent_table.clone(), [column]))
            .collect();
        let child_columns: Vec<_> = child_columns
            .into_iter()
            .map(|column| MemberPath::new(child_table.clone(), [column]))
            .collect();

        if parent_columns.is_empty() || parent_columns.len() != child_columns.len() {
            return Err(SchemaError::ForeignColumnCountMismatch {
                parent_table,
                child_table,
                parent: parent_columns.len(),
                child: child_columns.len(),
            });
        }

        Ok(Self {
            parent_table,
            child_table,
            parent_columns,
            child_columns,
        })
    }

    #[must_use]
    pub fn parent_table(&self) -> &str {
        &self.parent_table
    }

    #[must_use]
    pub fn child_table(&self) -> &str {
        &self.child_table
    }

    #[must_use]
    pub fn parent_columns(&self) -> &[MemberPath] {
        &self.parent_columns
    }

    #[must_use]
    pub fn child_columns(&self) -> &[MemberPath] {
        &self.child_columns
    }
}
