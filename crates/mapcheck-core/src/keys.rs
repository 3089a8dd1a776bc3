use crate::error::MapError;
use derive_more::{Deref, IntoIterator};
use mapcheck_schema::prelude::*;
use std::fmt;

///
/// ExtentKey
///
/// An ordered collection of member paths forming one key of an extent.
/// Entity sets have exactly one key (their declared key members);
/// association sets have a key per key-forming end, or one composite key
/// over all ends when no end forms a key.
///

#[derive(Clone, Debug, Deref, Eq, IntoIterator, PartialEq)]
pub struct ExtentKey(Vec<MemberPath>);

impl ExtentKey {
    pub fn new<I>(fields: I) -> Result<Self, MapError>
    where
        I: IntoIterator<Item = MemberPath>,
    {
        let fields: Vec<_> = fields.into_iter().collect();
        if fields.is_empty() {
            return Err(MapError::keys_invariant("extent key built with no fields"));
        }

        Ok(Self(fields))
    }

    #[must_use]
    pub fn fields(&self) -> &[MemberPath] {
        &self.0
    }
}

impl fmt::Display for ExtentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}")?;
        }
        write!(f, ")")
    }
}

/// Keys of an entity type: exactly one, the declared key members prefixed by
/// `prefix` in declared order. Empty key metadata is an invariant violation.
pub fn keys_for_entity_type(
    prefix: &MemberPath,
    entity_type: &EntityType,
) -> Result<Vec<ExtentKey>, MapError> {
    if entity_type.key_properties().is_empty() {
        return Err(MapError::keys_invariant(format!(
            "entity type '{}' declares no key members",
            entity_type.name
        )));
    }

    let fields = entity_type
        .key_properties()
        .iter()
        .map(|member| prefix.extend(member));

    Ok(vec![ExtentKey::new(fields)?])
}

/// Key contributed by one association end: the end's entity key members
/// prefixed by `prefix` + the end name.
pub fn key_for_association_end(
    prefix: &MemberPath,
    end: &AssociationEnd,
    schema: &Schema,
) -> Result<ExtentKey, MapError> {
    let entity_type = schema.entity_type_of_extent(&end.entity_set)?;
    let end_prefix = prefix.extend(&end.name);

    if entity_type.key_properties().is_empty() {
        return Err(MapError::keys_invariant(format!(
            "entity type '{}' at end '{}' declares no key members",
            entity_type.name, end.name
        )));
    }

    ExtentKey::new(
        entity_type
            .key_properties()
            .iter()
            .map(|member| end_prefix.extend(member)),
    )
}

/// Composite key of an association type: for every end, that end's entity
/// key members prefixed by `prefix` + the end, concatenated in end order.
pub fn key_for_association_type(
    prefix: &MemberPath,
    association: &AssociationType,
    schema: &Schema,
) -> Result<ExtentKey, MapError> {
    let mut fields = Vec::new();
    for end in &association.ends {
        fields.extend(key_for_association_end(prefix, end, schema)?.into_iter());
    }

    ExtentKey::new(fields)
}
