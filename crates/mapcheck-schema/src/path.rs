use crate::{extent::Extent, schema::Schema};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// MemberPath
///
/// A rooted chain of schema members identifying one scalar or structural
/// position in a schema: an extent plus zero or more member names.
/// Immutable; compared by structural equality.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct MemberPath {
    extent: String,
    members: Vec<String>,
}

impl MemberPath {
    /// A path identifying the extent root itself.
    pub fn root(extent: impl Into<String>) -> Self {
        Self {
            extent: extent.into(),
            members: Vec::new(),
        }
    }

    pub fn new<I, S>(extent: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extent: extent.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Extend this path by one member, returning the child path.
    #[must_use]
    pub fn extend(&self, member: impl Into<String>) -> Self {
        let mut members = self.members.clone();
        members.push(member.into());

        Self {
            extent: self.extent.clone(),
            members,
        }
    }

    #[must_use]
    pub fn extent(&self) -> &str {
        &self.extent
    }

    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// The last member of the chain, if any.
    #[must_use]
    pub fn leaf(&self) -> Option<&str> {
        self.members.last().map(String::as_str)
    }

    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.extent == prefix.extent
            && self.members.len() >= prefix.members.len()
            && self.members[..prefix.members.len()] == prefix.members[..]
    }

    /// Resolve this path to the entity set and scalar property it denotes.
    ///
    /// Entity-set rooted paths resolve at depth one; association-set rooted
    /// paths resolve at depth two through the named end. Deeper or structural
    /// paths have no scalar position.
    #[must_use]
    pub fn resolve_scalar(&self, schema: &Schema) -> Option<ScalarPosition> {
        match schema.extent(&self.extent).ok()? {
            Extent::EntitySet { name, .. } => match self.members.as_slice() {
                [property] => Some(ScalarPosition {
                    entity_set: name.clone(),
                    property: property.clone(),
                }),
                _ => None,
            },
            Extent::AssociationSet { association, .. } => match self.members.as_slice() {
                [end_name, property] => {
                    let association = schema.association(association).ok()?;
                    let end = association.end(end_name)?;

                    Some(ScalarPosition {
                        entity_set: end.entity_set.clone(),
                        property: property.clone(),
                    })
                }
                _ => None,
            },
        }
    }

    /// True when a declared referential constraint connects this path's
    /// position to `other`'s (same property index on the principal and
    /// dependent sides). A derived relationship, never identity: equal paths
    /// are not "equivalent via constraint".
    #[must_use]
    pub fn equivalent_via_ref_constraint(&self, other: &Self, schema: &Schema) -> bool {
        if self == other {
            return false;
        }
        let Some(a) = self.resolve_scalar(schema) else {
            return false;
        };
        let Some(b) = other.resolve_scalar(schema) else {
            return false;
        };

        schema
            .ref_constraints()
            .iter()
            .any(|rc| rc.links(&a, &b, schema))
    }
}

impl fmt::Display for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extent)?;
        for member in &self.members {
            write!(f, ".{member}")?;
        }

        Ok(())
    }
}

///
/// ScalarPosition
///
/// An (entity set, property) pair a scalar member path resolves to,
/// used for referential-constraint equivalence reasoning.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScalarPosition {
    pub entity_set: String,
    pub property: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_dotted_chain() {
        let path = MemberPath::new("Persons", ["address", "city"]);
        assert_eq!(path.to_string(), "Persons.address.city");
        assert_eq!(MemberPath::root("Persons").to_string(), "Persons");
    }

    #[test]
    fn extend_preserves_prefix() {
        let root = MemberPath::root("Persons");
        let child = root.extend("pid");

        assert!(child.starts_with(&root));
        assert_eq!(child.leaf(), Some("pid"));
        assert!(!root.starts_with(&child));
    }
}
