//! Base `SELECT` text and `WHERE` clause assembly.

use super::predicate::Predicate;
use super::query_string::QueryString;
use crate::entity::EntityMetadata;
use crate::error::{OqlError, OqlResult};
use crate::ident::{PropertyPath, RegionPath};

/// Alias bound to region entries in generated queries (`FROM /People x`).
pub const DEFAULT_ALIAS: &str = "x";

#[derive(Debug, Clone)]
enum Base {
    Text(String),
    Entity { region: RegionPath, distinct: bool },
}

/// Builds an OQL query from a base `SELECT` and an optional predicate.
///
/// # Example
/// ```ignore
/// use regionql::{EntityMetadata, QueryBuilder};
///
/// let people = EntityMetadata::new("People");
/// let qb = QueryBuilder::for_entity(&people, false)?;
/// assert_eq!(qb.create(None).as_str(), "SELECT * FROM /People x");
/// # Ok::<(), regionql::OqlError>(())
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    base: Base,
    alias: String,
}

impl QueryBuilder {
    /// The base query for an entity: `SELECT [DISTINCT] * FROM /<region> x`.
    pub fn base_query(entity: &EntityMetadata, distinct: bool) -> OqlResult<String> {
        let region = RegionPath::parse(entity.region())?;
        Ok(select_from(&region, distinct, DEFAULT_ALIAS))
    }

    /// Start from caller-supplied query text. Blank text is rejected.
    pub fn new(query: impl Into<String>) -> OqlResult<Self> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(OqlError::validation("Query is required"));
        }
        Ok(Self {
            base: Base::Text(query),
            alias: DEFAULT_ALIAS.to_string(),
        })
    }

    /// Start from the base query of an entity.
    pub fn for_entity(entity: &EntityMetadata, distinct: bool) -> OqlResult<Self> {
        Ok(Self {
            base: Base::Entity {
                region: RegionPath::parse(entity.region())?,
                distinct,
            },
            alias: DEFAULT_ALIAS.to_string(),
        })
    }

    /// Use a different alias for region entries and predicate properties.
    pub fn with_alias(mut self, alias: &str) -> OqlResult<Self> {
        let path = PropertyPath::parse(alias)?;
        if path.is_nested() {
            return Err(OqlError::validation(format!(
                "Query alias must be a single identifier, got '{alias}'"
            )));
        }
        self.alias = alias.to_string();
        Ok(self)
    }

    /// The alias used when rendering predicates.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The base text without a `WHERE` clause.
    pub fn base(&self) -> String {
        match &self.base {
            Base::Text(text) => text.clone(),
            Base::Entity { region, distinct } => select_from(region, *distinct, &self.alias),
        }
    }

    /// The query with `WHERE <predicate>` appended when a predicate is given.
    pub fn create(&self, predicate: Option<&Predicate>) -> QueryString {
        let base = self.base();
        match predicate {
            Some(predicate) => {
                QueryString::from_text(format!("{base} WHERE {}", predicate.render(&self.alias)))
            }
            None => QueryString::from_text(base),
        }
    }
}

fn select_from(region: &RegionPath, distinct: bool, alias: &str) -> String {
    let distinct = if distinct { "DISTINCT" } else { "" };
    let text = format!("SELECT {distinct} * FROM {} {alias}", region.to_oql());
    collapse_whitespace(&text)
}

/// Collapse runs of whitespace into single spaces.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
