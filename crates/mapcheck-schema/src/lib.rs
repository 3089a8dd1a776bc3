pub mod association;
pub mod entity;
pub mod extent;
pub mod foreign;
pub mod path;
pub mod schema;
pub mod types;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        association::{AssociationEnd, AssociationType, ReferentialConstraint},
        entity::{EntityType, Property},
        extent::Extent,
        foreign::ForeignConstraint,
        path::{MemberPath, ScalarPosition},
        schema::{Schema, SchemaBuilder, SchemaError},
        types::{Cardinality, SchemaSide},
    };
    pub use serde::{Deserialize, Serialize};
}
