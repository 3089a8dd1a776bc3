use crate::{
    association::{AssociationType, ReferentialConstraint},
    entity::EntityType,
    extent::Extent,
    foreign::ForeignConstraint,
    types::SchemaSide,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// SchemaError
///
/// Construction-time metadata failures. These indicate a malformed schema
/// description, not a mapping defect.
///

#[derive(Debug, ThisError)]
pub enum SchemaError {
    #[error("duplicate extent: {0}")]
    DuplicateExtent(String),

    #[error("unknown extent: {0}")]
    UnknownExtent(String),

    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("unknown association: {0}")]
    UnknownAssociation(String),

    #[error("unknown association end: {association}.{end}")]
    UnknownAssociationEnd { association: String, end: String },

    #[error("concrete entity type '{0}' declares no key members")]
    EmptyKey(String),

    #[error(
        "foreign key {parent_table} -> {child_table} column counts differ: {parent} parent, {child} child"
    )]
    ForeignColumnCountMismatch {
        parent_table: String,
        child_table: String,
        parent: usize,
        child: usize,
    },
}

///
/// Schema
///
/// Read-only description of one schema side: its extents, element types,
/// associations and declared constraints. Built once via [`SchemaBuilder`]
/// and only queried afterwards.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Schema {
    side: SchemaSide,
    extents: BTreeMap<String, Extent>,
    entity_types: BTreeMap<String, EntityType>,
    associations: BTreeMap<String, AssociationType>,
    ref_constraints: Vec<ReferentialConstraint>,
    foreign_constraints: Vec<ForeignConstraint>,
}

impl Schema {
    #[must_use]
    pub fn builder(side: SchemaSide) -> SchemaBuilder {
        SchemaBuilder {
            schema: Self {
                side,
                extents: BTreeMap::new(),
                entity_types: BTreeMap::new(),
                associations: BTreeMap::new(),
                ref_constraints: Vec::new(),
                foreign_constraints: Vec::new(),
            },
        }
    }

    #[must_use]
    pub const fn side(&self) -> SchemaSide {
        self.side
    }

    pub fn extent(&self, name: &str) -> Result<&Extent, SchemaError> {
        self.extents
            .get(name)
            .ok_or_else(|| SchemaError::UnknownExtent(name.to_string()))
    }

    pub fn entity_type(&self, name: &str) -> Result<&EntityType, SchemaError> {
        self.entity_types
            .get(name)
            .ok_or_else(|| SchemaError::UnknownEntityType(name.to_string()))
    }

    pub fn association(&self, name: &str) -> Result<&AssociationType, SchemaError> {
        self.associations
            .get(name)
            .ok_or_else(|| SchemaError::UnknownAssociation(name.to_string()))
    }

    /// Resolve the element type of an entity-set extent.
    pub fn entity_type_of_extent(&self, extent: &str) -> Result<&EntityType, SchemaError> {
        match self.extent(extent)? {
            Extent::EntitySet { entity_type, .. } => self.entity_type(entity_type),
            Extent::AssociationSet { name, .. } => Err(SchemaError::UnknownEntityType(name.clone())),
        }
    }

    #[must_use]
    pub fn ref_constraints(&self) -> &[ReferentialConstraint] {
        &self.ref_constraints
    }

    #[must_use]
    pub fn foreign_constraints(&self) -> &[ForeignConstraint] {
        &self.foreign_constraints
    }

    /// All concrete types equal to or transitively derived from `type_name`.
    #[must_use]
    pub fn concrete_subtypes(&self, type_name: &str) -> Vec<&EntityType> {
        self.entity_types
            .values()
            .filter(|ty| !ty.is_abstract && self.derives_from(&ty.name, type_name))
            .collect()
    }

    // Walk the subtype chain upwards looking for `ancestor`.
    fn derives_from(&self, type_name: &str, ancestor: &str) -> bool {
        let mut current = Some(type_name);
        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            current = self
                .entity_types
                .get(name)
                .and_then(|ty| ty.subtype_of.as_deref());
        }

        false
    }
}

///
/// SchemaBuilder
///
/// Accumulates schema nodes, then validates cross-references in `build`.
///

pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    #[must_use]
    pub fn entity_type(mut self, ty: EntityType) -> Self {
        self.schema.entity_types.insert(ty.name.clone(), ty);
        self
    }

    #[must_use]
    pub fn association(mut self, association: AssociationType) -> Self {
        self.schema
            .associations
            .insert(association.name.clone(), association);
        self
    }

    #[must_use]
    pub fn entity_set(mut self, name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        let extent = Extent::entity_set(name, entity_type);
        self.schema.extents.insert(extent.name().to_string(), extent);
        self
    }

    #[must_use]
    pub fn association_set(
        mut self,
        name: impl Into<String>,
        association: impl Into<String>,
    ) -> Self {
        let extent = Extent::association_set(name, association);
        self.schema.extents.insert(extent.name().to_string(), extent);
        self
    }

    #[must_use]
    pub fn ref_constraint(mut self, constraint: ReferentialConstraint) -> Self {
        self.schema.ref_constraints.push(constraint);
        self
    }

    #[must_use]
    pub fn foreign_constraint(mut self, constraint: ForeignConstraint) -> Self {
        self.schema.foreign_constraints.push(constraint);
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let schema = self.schema;

        // Extents must reference declared types.
        for extent in schema.extents.values() {
            match extent {
                Extent::EntitySet { entity_type, .. } => {
                    schema.entity_type(entity_type)?;
                }
                Extent::AssociationSet { association, .. } => {
                    let association = schema.association(association)?;
                    for end in &association.ends {
                        schema.extent(&end.entity_set)?;
                    }
                }
            }
        }

        // Concrete types must carry a key.
        for ty in schema.entity_types.values() {
            if !ty.is_abstract && ty.key.is_empty() {
                return Err(SchemaError::EmptyKey(ty.name.clone()));
            }
        }

        // Referential constraints must name declared ends.
        for rc in &schema.ref_constraints {
            let association = schema.association(&rc.association)?;
            for end in [&rc.principal_end, &rc.dependent_end] {
                if association.end(end).is_none() {
                    return Err(SchemaError::UnknownAssociationEnd {
                        association: rc.association.clone(),
                        end: end.clone(),
                    });
                }
            }
        }

        // Foreign keys must reference declared table extents.
        for fk in &schema.foreign_constraints {
            schema.extent(fk.parent_table())?;
            schema.extent(fk.child_table())?;
        }

        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        association::{AssociationEnd, ReferentialConstraint},
        entity::Property,
        path::MemberPath,
        types::Cardinality,
    };

    fn person_schema() -> Schema {
        Schema::builder(SchemaSide::Conceptual)
            .entity_type(EntityType::new(
                "Person",
                ["pid"],
                [Property::new("pid", false), Property::new("name", true)],
            ))
            .entity_type(
                EntityType::new("Customer", ["pid"], [Property::new("pid", false)])
                    .subtype_of("Person"),
            )
            .entity_type(
                EntityType::new("Address", ["aid"],
                    [Property::new("aid", false), Property::new("pid", true)]),
            )
            .entity_set("Persons", "Person")
            .entity_set("Addresses", "Address")
            .association(AssociationType::new(
                "PersonAddress",
                [
                    AssociationEnd::new("Person", "Persons", Cardinality::One),
                    AssociationEnd::new("Address", "Addresses", Cardinality::Many),
                ],
            ))
            .association_set("PersonAddresses", "PersonAddress")
            .ref_constraint(ReferentialConstraint::new(
                "PersonAddress",
                "Person",
                "Address",
                ["pid"],
                ["pid"],
            ))
            .build()
            .unwrap()
    }

    #[test]
    fn concrete_subtypes_include_self_and_descendants() {
        let schema = person_schema();
        let names: Vec<_> = schema
            .concrete_subtypes("Person")
            .iter()
            .map(|ty| ty.name.as_str())
            .collect();

        assert_eq!(names, ["Customer", "Person"]);
    }

    #[test]
    fn unknown_extent_reference_fails_build() {
        let result = Schema::builder(SchemaSide::Conceptual)
            .entity_set("Persons", "Person")
            .build();

        assert!(matches!(result, Err(SchemaError::UnknownEntityType(_))));
    }

    #[test]
    fn ref_constraint_links_principal_and_dependent_positions() {
        let schema = person_schema();
        let principal = MemberPath::new("Persons", ["pid"]);
        let dependent = MemberPath::new("Addresses", ["pid"]);

        assert!(principal.equivalent_via_ref_constraint(&dependent, &schema));
        assert!(dependent.equivalent_via_ref_constraint(&principal, &schema));

        // Identity is not "via constraint".
        assert!(!principal.equivalent_via_ref_constraint(&principal, &schema));

        // Unrelated properties are not linked.
        let name = MemberPath::new("Persons", ["name"]);
        assert!(!name.equivalent_via_ref_constraint(&dependent, &schema));
    }

    #[test]
    fn association_rooted_paths_resolve_through_their_end() {
        let schema = person_schema();
        let end_key = MemberPath::new("PersonAddresses", ["Person", "pid"]);
        let entity_key = MemberPath::new("Persons", ["pid"]);

        let resolved = end_key.resolve_scalar(&schema).unwrap();
        assert_eq!(resolved.entity_set, "Persons");
        assert_eq!(resolved.property, "pid");

        assert_eq!(
            entity_key.resolve_scalar(&schema).unwrap(),
            resolved,
            "end-rooted and set-rooted paths resolve to the same position"
        );
    }
}
