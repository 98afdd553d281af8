//! Region entity metadata.
//!
//! [`EntityMetadata`] describes what the query compiler needs to know about a
//! domain type: the region it is stored in, its identity property, and the
//! declared properties with their [`PropertyKind`].
//!
//! Metadata is normally produced by `#[derive(Region)]`, which implements
//! [`RegionEntity`] and memoizes the value in a `static`. It can also be built
//! by hand:
//!
//! ```ignore
//! use regionql::{EntityMetadata, PropertyKind};
//!
//! let people = EntityMetadata::new("People")
//!     .with_identity("id", PropertyKind::Integer)
//!     .with_property("firstname", PropertyKind::String)
//!     .with_property("lastname", PropertyKind::String)
//!     .with_property("age", PropertyKind::Integer);
//! ```

use crate::error::{OqlError, OqlResult};
use crate::ident::PropertyPath;
use heck::{ToLowerCamelCase, ToSnakeCase};
use std::fmt;

/// Coarse value type of an entity property, used to type-check operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// Text values.
    String,
    /// Whole numbers.
    Integer,
    /// Floating point and decimal numbers.
    Float,
    /// `true` / `false`.
    Boolean,
    /// Dates, times and instants.
    Temporal,
    /// Lists, sets and maps.
    Collection,
    /// Anything else. Opaque values are never type-checked.
    Object,
}

impl PropertyKind {
    /// Whether values of this kind have a natural ordering.
    pub fn is_comparable(self) -> bool {
        matches!(
            self,
            Self::String | Self::Integer | Self::Float | Self::Temporal | Self::Object
        )
    }

    /// Whether this kind is opaque (accepted by every operator).
    pub fn is_opaque(self) -> bool {
        matches!(self, Self::Object)
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::Temporal => "Temporal",
            Self::Collection => "Collection",
            Self::Object => "Object",
        };
        f.write_str(name)
    }
}

/// A declared entity property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMeta {
    /// Property name as it appears in OQL (`lastname`, `address.city`).
    pub name: String,
    /// Value kind.
    pub kind: PropertyKind,
    /// Whether this property is the entity identity.
    pub is_identity: bool,
}

/// Metadata for a domain type stored in a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMetadata {
    region: String,
    properties: Vec<PropertyMeta>,
}

impl EntityMetadata {
    /// Create metadata for the given region. A leading `/` is dropped.
    pub fn new(region: impl Into<String>) -> Self {
        let region = region.into();
        let region = match region.strip_prefix('/') {
            Some(stripped) => stripped.to_string(),
            None => region,
        };
        Self {
            region,
            properties: Vec::new(),
        }
    }

    /// Declare a property. Redeclaring a name replaces its kind.
    pub fn with_property(mut self, name: impl Into<String>, kind: PropertyKind) -> Self {
        self.add_property(name, kind, false);
        self
    }

    /// Declare the identity property.
    pub fn with_identity(mut self, name: impl Into<String>, kind: PropertyKind) -> Self {
        self.add_property(name, kind, true);
        self
    }

    fn add_property(&mut self, name: impl Into<String>, kind: PropertyKind, is_identity: bool) {
        let name = name.into();
        if is_identity {
            for p in &mut self.properties {
                p.is_identity = false;
            }
        }
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(existing) => {
                existing.kind = kind;
                existing.is_identity |= is_identity;
            }
            None => self.properties.push(PropertyMeta {
                name,
                kind,
                is_identity,
            }),
        }
    }

    /// The region name, without a leading `/`.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// All declared properties in declaration order.
    pub fn properties(&self) -> &[PropertyMeta] {
        &self.properties
    }

    /// The identity property, if one was declared.
    pub fn identity(&self) -> Option<&PropertyMeta> {
        self.properties.iter().find(|p| p.is_identity)
    }

    /// Look up a property by its exact declared name.
    pub fn property(&self, name: &str) -> Option<&PropertyMeta> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Check if the entity declares a property with the given name.
    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    /// Resolve a property as written in a method name (`Lastname`, `FirstName`,
    /// `Address_City`) to a declared property path and its kind.
    ///
    /// `_` separates nested segments. The root segment is matched against the
    /// declared properties as lower camel case, then snake case, then
    /// case-insensitively. A nested path resolves to its declared kind when the
    /// full dotted path is declared, and to [`PropertyKind::Object`] otherwise.
    pub fn resolve_property(&self, raw: &str) -> OqlResult<(PropertyPath, PropertyKind)> {
        let no_such = || OqlError::NoSuchProperty {
            property: raw.to_string(),
            region: self.region.clone(),
        };

        let mut segments = raw.split('_').filter(|s| !s.is_empty());
        let root_raw = segments.next().ok_or_else(no_such)?;
        let root = self.match_name(root_raw).ok_or_else(no_such)?;

        let mut dotted = root.name.clone();
        let mut nested = false;
        for seg in segments {
            dotted.push('.');
            dotted.push_str(&seg.to_lower_camel_case());
            nested = true;
        }

        let path = PropertyPath::parse(&dotted).map_err(|_| no_such())?;
        let kind = if nested {
            self.property(&dotted)
                .map(|p| p.kind)
                .unwrap_or(PropertyKind::Object)
        } else {
            root.kind
        };
        Ok((path, kind))
    }

    fn match_name(&self, raw: &str) -> Option<&PropertyMeta> {
        let camel = raw.to_lower_camel_case();
        if let Some(p) = self.property(&camel) {
            return Some(p);
        }
        let snake = raw.to_snake_case();
        if let Some(p) = self.property(&snake) {
            return Some(p);
        }
        self.properties
            .iter()
            .filter(|p| !p.name.contains('.'))
            .find(|p| p.name.eq_ignore_ascii_case(raw))
    }
}

/// A domain type stored in a region.
///
/// This trait is implemented by `#[derive(Region)]`. Implementations return a
/// `&'static` value that is built once.
pub trait RegionEntity {
    /// Metadata describing the region and properties of this type.
    fn entity_metadata() -> &'static EntityMetadata;
}
