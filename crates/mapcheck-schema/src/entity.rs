use serde::{Deserialize, Serialize};

///
/// Property
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Property {
    pub name: String,
    pub nullable: bool,
}

impl Property {
    pub fn new(name: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            nullable,
        }
    }
}

///
/// EntityType
///
/// An element type of an entity set. On the storage side this describes a
/// table: properties are columns and the key is the primary key.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EntityType {
    pub name: String,
    pub is_abstract: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype_of: Option<String>,

    pub key: Vec<String>,
    pub properties: Vec<Property>,
}

impl EntityType {
    pub fn new<K, P>(name: impl Into<String>, key: K, properties: P) -> Self
    where
        K: IntoIterator<Item = &'static str>,
        P: IntoIterator<Item = Property>,
    {
        Self {
            name: name.into(),
            is_abstract: false,
            subtype_of: None,
            key: key.into_iter().map(Into::into).collect(),
            properties: properties.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn subtype_of(mut self, parent: impl Into<String>) -> Self {
        self.subtype_of = Some(parent.into());
        self
    }

    #[must_use]
    pub const fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Declared key members in declared order.
    #[must_use]
    pub fn key_properties(&self) -> &[String] {
        &self.key
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}
