//! Shared fixtures for validator tests: a small person/address mapping and a
//! stub fragment oracle driven by explicit pair sets.

use crate::{
    error::MapError,
    oracle::{FragmentOracle, FragmentRef},
};
use std::collections::BTreeSet;

///
/// FixtureOracle
///
/// Answers oracle queries from explicit pair sets. Disjointness and
/// equivalence are stored symmetrically; containment is directional.
/// Every fragment is equivalent to and contained in itself.
///

#[derive(Debug, Default)]
pub struct FixtureOracle {
    contained: BTreeSet<(FragmentRef, FragmentRef)>,
    disjoint: BTreeSet<(FragmentRef, FragmentRef)>,
    equivalent: BTreeSet<(FragmentRef, FragmentRef)>,
}

impl FixtureOracle {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contained(mut self, a: FragmentRef, b: FragmentRef) -> Self {
        self.contained.insert((a, b));
        self
    }

    #[must_use]
    pub fn disjoint(mut self, a: FragmentRef, b: FragmentRef) -> Self {
        self.disjoint.insert((a, b));
        self.disjoint.insert((b, a));
        self
    }

    #[must_use]
    pub fn equivalent(mut self, a: FragmentRef, b: FragmentRef) -> Self {
        self.equivalent.insert((a, b));
        self.equivalent.insert((b, a));
        self
    }
}

impl FragmentOracle for FixtureOracle {
    fn is_contained_in(&self, a: FragmentRef, b: FragmentRef) -> Result<bool, MapError> {
        Ok(a == b || self.contained.contains(&(a, b)) || self.equivalent.contains(&(a, b)))
    }

    fn is_disjoint_from(&self, a: FragmentRef, b: FragmentRef) -> Result<bool, MapError> {
        Ok(self.disjoint.contains(&(a, b)))
    }

    fn is_equivalent_to(&self, a: FragmentRef, b: FragmentRef) -> Result<bool, MapError> {
        Ok(a == b || self.equivalent.contains(&(a, b)))
    }
}

pub mod fixtures {
    use crate::cell::{Cell, CellId, CellQuery, Condition, ConditionValue};
    use mapcheck_schema::prelude::*;

    /// Conceptual schema: Person (with concrete subtype Customer), Address,
    /// Order (composite key), Employee, and the PersonAddress association
    /// with its referential constraint Persons.pid <-> Addresses.pid.
    pub fn conceptual_schema() -> Schema {
        conceptual_schema_with(Cardinality::One)
    }

    pub fn conceptual_schema_with(person_end: Cardinality) -> Schema {
        conceptual_builder(person_end, true).build().unwrap()
    }

    /// Same shape, but with no declared referential constraint.
    pub fn conceptual_schema_no_ref() -> Schema {
        conceptual_builder(Cardinality::One, false).build().unwrap()
    }

    fn conceptual_builder(person_end: Cardinality, with_ref: bool) -> SchemaBuilder {
        let builder = Schema::builder(SchemaSide::Conceptual)
            .entity_type(EntityType::new(
                "Person",
                ["pid"],
                [Property::new("pid", false), Property::new("name", true)],
            ))
            .entity_type(
                EntityType::new("Customer", ["pid"], [Property::new("pid", false)])
                    .subtype_of("Person"),
            )
            .entity_type(EntityType::new(
                "Address",
                ["aid"],
                [Property::new("aid", false), Property::new("pid", true)],
            ))
            .entity_type(EntityType::new(
                "Order",
                ["region", "oid"],
                [Property::new("region", false), Property::new("oid", false)],
            ))
            .entity_type(EntityType::new(
                "Employee",
                ["eid"],
                [Property::new("eid", false)],
            ))
            .entity_set("Persons", "Person")
            .entity_set("Addresses", "Address")
            .entity_set("Orders", "Order")
            .entity_set("Employees", "Employee")
            .association(AssociationType::new(
                "PersonAddress",
                [
                    AssociationEnd::new("Person", "Persons", person_end),
                    AssociationEnd::new("Address", "Addresses", Cardinality::Many),
                ],
            ))
            .association_set("PersonAddresses", "PersonAddress");

        if with_ref {
            builder.ref_constraint(ReferentialConstraint::new(
                "PersonAddress",
                "Person",
                "Address",
                ["pid"],
                ["pid"],
            ))
        } else {
            builder
        }
    }

    /// Storage schema: TPerson, TAddress, TCustomer tables plus the given
    /// foreign keys. `address_pid_nullable` controls the TAddress.pid column.
    pub fn storage_schema_with(
        address_pid_nullable: bool,
        foreign_keys: Vec<ForeignConstraint>,
    ) -> Schema {
        let mut builder = Schema::builder(SchemaSide::Storage)
            .entity_type(EntityType::new(
                "TPerson",
                ["pid"],
                [Property::new("pid", false), Property::new("name", true)],
            ))
            .entity_type(EntityType::new(
                "TAddress",
                ["aid"],
                [
                    Property::new("aid", false),
                    Property::new("pid", address_pid_nullable),
                ],
            ))
            .entity_type(EntityType::new(
                "TCustomer",
                ["pid"],
                [Property::new("pid", false)],
            ))
            .entity_set("TPerson", "TPerson")
            .entity_set("TAddress", "TAddress")
            .entity_set("TCustomer", "TCustomer");

        for fk in foreign_keys {
            builder = builder.foreign_constraint(fk);
        }

        builder.build().unwrap()
    }

    pub fn storage_schema() -> Schema {
        storage_schema_with(true, Vec::new())
    }

    pub fn cell(id: u32, c_query: CellQuery, s_query: CellQuery) -> Cell {
        Cell::new(CellId(id), c_query, s_query).unwrap()
    }

    pub fn text_condition(extent: &str, member: &str, value: &str) -> Condition {
        Condition::equals(
            MemberPath::new(extent, [member]),
            ConditionValue::text(value),
        )
    }

    /// Persons(pid, name) <-> TPerson(pid, name), with extra storage-side
    /// conditions.
    pub fn person_cell(id: u32, s_conditions: &[Condition]) -> Cell {
        cell(
            id,
            CellQuery::new(
                "Persons",
                [
                    MemberPath::new("Persons", ["pid"]),
                    MemberPath::new("Persons", ["name"]),
                ],
                [],
            ),
            CellQuery::new(
                "TPerson",
                [
                    MemberPath::new("TPerson", ["pid"]),
                    MemberPath::new("TPerson", ["name"]),
                ],
                s_conditions.to_vec(),
            ),
        )
    }

    /// Persons(pid) <-> TPerson(pid): the narrow fragment used by the
    /// partition scenarios.
    pub fn person_pid_cell(id: u32, s_conditions: &[Condition]) -> Cell {
        cell(
            id,
            CellQuery::new("Persons", [MemberPath::new("Persons", ["pid"])], []),
            CellQuery::new(
                "TPerson",
                [MemberPath::new("TPerson", ["pid"])],
                s_conditions.to_vec(),
            ),
        )
    }

    /// Addresses(aid, pid) <-> TAddress(aid, pid).
    pub fn address_cell(id: u32) -> Cell {
        cell(
            id,
            CellQuery::new(
                "Addresses",
                [
                    MemberPath::new("Addresses", ["aid"]),
                    MemberPath::new("Addresses", ["pid"]),
                ],
                [],
            ),
            CellQuery::new(
                "TAddress",
                [
                    MemberPath::new("TAddress", ["aid"]),
                    MemberPath::new("TAddress", ["pid"]),
                ],
                [],
            ),
        )
    }

    /// PersonAddresses(Person.pid, Address.aid) <-> TAddress(pid, aid): the
    /// relationship mapped into the foreign-key table.
    pub fn association_cell(id: u32) -> Cell {
        cell(
            id,
            CellQuery::new(
                "PersonAddresses",
                [
                    MemberPath::new("PersonAddresses", ["Person", "pid"]),
                    MemberPath::new("PersonAddresses", ["Address", "aid"]),
                ],
                [],
            ),
            CellQuery::new(
                "TAddress",
                [
                    MemberPath::new("TAddress", ["pid"]),
                    MemberPath::new("TAddress", ["aid"]),
                ],
                [],
            ),
        )
    }
}
