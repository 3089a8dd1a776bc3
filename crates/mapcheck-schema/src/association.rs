use crate::{path::ScalarPosition, schema::Schema, types::Cardinality};
use serde::{Deserialize, Serialize};

///
/// AssociationEnd
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AssociationEnd {
    pub name: String,
    pub entity_set: String,
    pub cardinality: Cardinality,
}

impl AssociationEnd {
    pub fn new(
        name: impl Into<String>,
        entity_set: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            name: name.into(),
            entity_set: entity_set.into(),
            cardinality,
        }
    }
}

///
/// AssociationType
///
/// An element type of a relationship set: a named collection of ends, each
/// referencing an entity set with a multiplicity.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AssociationType {
    pub name: String,
    pub ends: Vec<AssociationEnd>,
}

impl AssociationType {
    pub fn new<E>(name: impl Into<String>, ends: E) -> Self
    where
        E: IntoIterator<Item = AssociationEnd>,
    {
        Self {
            name: name.into(),
            ends: ends.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn end(&self, name: &str) -> Option<&AssociationEnd> {
        self.ends.iter().find(|end| end.name == name)
    }
}

///
/// ReferentialConstraint
///
/// A declared equality linking the principal end's key properties to the
/// dependent end's properties, in positional correspondence.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ReferentialConstraint {
    pub association: String,
    pub principal_end: String,
    pub dependent_end: String,
    pub principal_properties: Vec<String>,
    pub dependent_properties: Vec<String>,
}

impl ReferentialConstraint {
    pub fn new<P, D>(
        association: impl Into<String>,
        principal_end: impl Into<String>,
        dependent_end: impl Into<String>,
        principal_properties: P,
        dependent_properties: D,
    ) -> Self
    where
        P: IntoIterator<Item = &'static str>,
        D: IntoIterator<Item = &'static str>,
    {
        Self {
            association: association.into(),
            principal_end: principal_end.into(),
            dependent_end: dependent_end.into(),
            principal_properties: principal_properties.into_iter().map(Into::into).collect(),
            dependent_properties: dependent_properties.into_iter().map(Into::into).collect(),
        }
    }

    /// True when this constraint declares `a` and `b` equal: one resolves to
    /// the principal side and the other to the dependent side at the same
    /// property index.
    #[must_use]
    pub fn links(&self, a: &ScalarPosition, b: &ScalarPosition, schema: &Schema) -> bool {
        let Ok(association) = schema.association(&self.association) else {
            return false;
        };
        let (Some(principal), Some(dependent)) = (
            association.end(&self.principal_end),
            association.end(&self.dependent_end),
        ) else {
            return false;
        };

        let pairs = self
            .principal_properties
            .iter()
            .zip(&self.dependent_properties);

        for (principal_prop, dependent_prop) in pairs {
            let forward = a.entity_set == principal.entity_set
                && a.property == *principal_prop
                && b.entity_set == dependent.entity_set
                && b.property == *dependent_prop;
            let backward = b.entity_set == principal.entity_set
                && b.property == *principal_prop
                && a.entity_set == dependent.entity_set
                && a.property == *dependent_prop;

            if forward || backward {
                return true;
            }
        }

        false
    }
}
