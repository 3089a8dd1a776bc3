use serde::{Deserialize, Serialize};

///
/// Extent
///
/// A named schema set: an entity set or an association set. Closed union;
/// callers dispatch on the concrete kind.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum Extent {
    EntitySet { name: String, entity_type: String },
    AssociationSet { name: String, association: String },
}

impl Extent {
    pub fn entity_set(name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self::EntitySet {
            name: name.into(),
            entity_type: entity_type.into(),
        }
    }

    pub fn association_set(name: impl Into<String>, association: impl Into<String>) -> Self {
        Self::AssociationSet {
            name: name.into(),
            association: association.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::EntitySet { name, .. } | Self::AssociationSet { name, .. } => name,
        }
    }

    #[must_use]
    pub const fn is_entity_set(&self) -> bool {
        matches!(self, Self::EntitySet { .. })
    }
}
