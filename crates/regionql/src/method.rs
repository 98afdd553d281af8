//! Query method registration.
//!
//! [`QueryMethodMetadata`] holds the per-method overrides (explicit query,
//! hints, import, limit, distinct, trace). It is built once, with the
//! consuming builder or from configuration through serde, and shared
//! read-only afterwards.
//!
//! [`QueryMethod`] is a registered method: its name is parsed and compiled once
//! at registration so configuration errors surface immediately.
//!
//! # Example
//! ```ignore
//! use regionql::{EntityMetadata, PropertyKind, QueryMethod, QueryMethodMetadata, Sort};
//! use std::sync::Arc;
//!
//! let people = Arc::new(
//!     EntityMetadata::new("People").with_property("lastname", PropertyKind::String),
//! );
//! let meta = QueryMethodMetadata::new().with_hints(["LastnameIdx"]).with_limit(10);
//! let method = QueryMethod::new("findByLastname", 1, people, meta)?;
//!
//! let query = method.create_query(&Sort::unsorted())?;
//! assert_eq!(
//!     query.query.as_str(),
//!     "<HINT 'LastnameIdx'> SELECT * FROM /People x WHERE x.lastname = $1 LIMIT 10"
//! );
//! # Ok::<(), regionql::OqlError>(())
//! ```

use crate::compiler::{CompiledQuery, QueryCompiler};
use crate::entity::{EntityMetadata, RegionEntity};
use crate::error::{OqlError, OqlResult};
use crate::oql::QueryString;
use crate::paging::Sort;
use crate::part_tree::PartTree;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Per-method query overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryMethodMetadata {
    /// Explicit query text, used instead of deriving one from the method name.
    pub query: Option<String>,
    /// Index hints (`<HINT 'a', 'b'>`).
    pub hints: Vec<String>,
    /// `IMPORT` statement.
    pub import: Option<String>,
    /// Result limit. `None` is unbounded.
    pub limit: Option<usize>,
    /// Force `SELECT DISTINCT`.
    pub distinct: bool,
    /// Enable `<TRACE>` for the query.
    pub trace: bool,
}

impl QueryMethodMetadata {
    /// Create metadata with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse metadata from a JSON document.
    pub fn from_json(json: &str) -> OqlResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Use explicit query text.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Set index hints.
    pub fn with_hints<I, S>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hints = hints.into_iter().map(Into::into).collect();
        self
    }

    /// Set the `IMPORT` statement.
    pub fn with_import(mut self, import: impl Into<String>) -> Self {
        self.import = Some(import.into());
        self
    }

    /// Limit the number of results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Force distinct results.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Enable query tracing.
    pub fn trace(mut self) -> Self {
        self.trace = true;
        self
    }

    pub fn has_explicit_query(&self) -> bool {
        self.query.as_deref().is_some_and(|q| !q.trim().is_empty())
    }

    pub fn explicit_query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    pub fn has_hints(&self) -> bool {
        self.hints.iter().any(|h| !h.trim().is_empty())
    }

    pub fn import(&self) -> Option<&str> {
        self.import.as_deref()
    }

    pub fn has_import(&self) -> bool {
        self.import.as_deref().is_some_and(|i| !i.trim().is_empty())
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn has_limit(&self) -> bool {
        self.limit.is_some()
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn is_trace(&self) -> bool {
        self.trace
    }
}

#[derive(Debug, Clone)]
enum Source {
    Explicit(QueryString),
    Derived(PartTree),
}

/// A query method registered against an entity.
#[derive(Debug, Clone)]
pub struct QueryMethod {
    name: String,
    parameter_count: usize,
    entity: Arc<EntityMetadata>,
    metadata: Arc<QueryMethodMetadata>,
    source: Source,
}

impl QueryMethod {
    /// Register a query method.
    ///
    /// A metadata limit must be positive. With an explicit query the text must
    /// not be blank and the name is not parsed. Otherwise the name is parsed and compiled once, so unknown
    /// properties, incompatible operators, empty criteria and criteria that
    /// need more arguments than `parameter_count` are reported here.
    pub fn new(
        name: impl Into<String>,
        parameter_count: usize,
        entity: Arc<EntityMetadata>,
        metadata: QueryMethodMetadata,
    ) -> OqlResult<Self> {
        let name = name.into();

        if metadata.limit() == Some(0) {
            return Err(OqlError::validation("limit must be positive").in_method(&name));
        }

        let source = match metadata.explicit_query() {
            Some(text) => {
                Source::Explicit(QueryString::new(text).map_err(|e| e.in_method(&name))?)
            }
            None => {
                let tree = PartTree::parse(&name).map_err(|e| e.in_method(&name))?;
                QueryCompiler::new(&entity, &tree)
                    .method_name(&name)
                    .max_placeholders(parameter_count)
                    .compile(&Sort::unsorted())?;
                Source::Derived(tree)
            }
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "regionql.oql",
            method = %name,
            region = entity.region(),
            explicit = matches!(source, Source::Explicit(_)),
            "registered query method"
        );

        Ok(Self {
            name,
            parameter_count,
            entity,
            metadata: Arc::new(metadata),
            source,
        })
    }

    /// Register a query method for a type implementing [`RegionEntity`].
    pub fn for_entity<E: RegionEntity>(
        name: impl Into<String>,
        parameter_count: usize,
        metadata: QueryMethodMetadata,
    ) -> OqlResult<Self> {
        Self::new(
            name,
            parameter_count,
            Arc::new(E::entity_metadata().clone()),
            metadata,
        )
    }

    /// The method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of declared method parameters.
    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    /// The queried entity.
    pub fn entity(&self) -> &EntityMetadata {
        &self.entity
    }

    /// The method's overrides.
    pub fn metadata(&self) -> &QueryMethodMetadata {
        &self.metadata
    }

    /// Shared handle to the method's overrides.
    pub fn metadata_arc(&self) -> Arc<QueryMethodMetadata> {
        Arc::clone(&self.metadata)
    }

    /// The parsed method name, unless an explicit query is used.
    pub fn part_tree(&self) -> Option<&PartTree> {
        match &self.source {
            Source::Derived(tree) => Some(tree),
            Source::Explicit(_) => None,
        }
    }

    /// Whether the query text comes from an explicit override.
    pub fn has_explicit_query(&self) -> bool {
        matches!(self.source, Source::Explicit(_))
    }

    /// The effective result limit: the override wins over `First`/`Top`.
    pub fn limit(&self) -> Option<usize> {
        self.metadata
            .limit()
            .or_else(|| self.part_tree().and_then(PartTree::max_results))
    }

    /// Build the query text for one invocation, with `sort` as the dynamic sort
    /// and all extensions applied.
    ///
    /// Explicit queries carry no bindings; their arguments bind unchanged.
    pub fn create_query(&self, sort: &Sort) -> OqlResult<CompiledQuery> {
        let compiled = match &self.source {
            Source::Explicit(text) => CompiledQuery {
                query: text.order_by(sort),
                bindings: Vec::new(),
            },
            Source::Derived(tree) => QueryCompiler::new(&self.entity, tree)
                .method_name(&self.name)
                .max_placeholders(self.parameter_count)
                .compile(sort)?,
        };
        Ok(CompiledQuery {
            query: self.apply_extensions(&compiled.query),
            bindings: compiled.bindings,
        })
    }

    /// Apply `DISTINCT`, `IMPORT`, `<HINT>`, `LIMIT` and `<TRACE>` in that order.
    pub fn apply_extensions(&self, query: &QueryString) -> QueryString {
        let meta = &self.metadata;
        let mut query = query.clone();
        if meta.is_distinct() {
            query = query.with_distinct();
        }
        if let Some(import) = meta.import().filter(|_| meta.has_import()) {
            query = query.with_import(import);
        }
        if meta.has_hints() {
            query = query.with_hints(meta.hints());
        }
        if let Some(limit) = self.limit() {
            query = query.with_limit(limit);
        }
        if meta.is_trace() {
            query = query.with_trace();
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::PropertyKind;

    fn people() -> Arc<EntityMetadata> {
        Arc::new(
            EntityMetadata::new("People")
                .with_property("firstname", PropertyKind::String)
                .with_property("lastname", PropertyKind::String)
                .with_property("age", PropertyKind::Integer),
        )
    }

    #[test]
    fn metadata_defaults_are_unbounded() {
        let meta = QueryMethodMetadata::new();
        assert!(!meta.has_explicit_query());
        assert!(!meta.has_hints());
        assert!(!meta.has_import());
        assert!(!meta.has_limit());
        assert_eq!(meta.limit(), None);
        assert!(!meta.is_distinct());
        assert!(!meta.is_trace());
    }

    #[test]
    fn metadata_from_json() {
        let meta = QueryMethodMetadata::from_json(
            r#"{"hints": ["IdIdx"], "limit": 25, "trace": true}"#,
        )
        .unwrap();
        assert_eq!(meta.hints(), ["IdIdx".to_string()]);
        assert_eq!(meta.limit(), Some(25));
        assert!(meta.is_trace());
        assert!(meta.query.is_none());

        let err = QueryMethodMetadata::from_json("{").unwrap_err();
        assert!(matches!(err, OqlError::Serialization(_)));
    }

    #[test]
    fn registration_reports_configuration_errors() {
        let err = QueryMethod::new("findByNickname", 1, people(), QueryMethodMetadata::new())
            .unwrap_err();
        assert_eq!(err.method(), Some("findByNickname"));
        assert!(err.is_configuration());

        let err = QueryMethod::new("findAll", 0, people(), QueryMethodMetadata::new()).unwrap_err();
        assert!(matches!(err.root(), OqlError::EmptyCriteria));

        let err = QueryMethod::new(
            "findByFirstnameAndLastname",
            1,
            people(),
            QueryMethodMetadata::new(),
        )
        .unwrap_err();
        assert!(matches!(err.root(), OqlError::PlaceholderOverflow { max: 1 }));

        let err = QueryMethod::new("removeByAge", 1, people(), QueryMethodMetadata::new())
            .unwrap_err();
        assert!(matches!(err.root(), OqlError::InvalidMethodName { .. }));
    }

    #[test]
    fn explicit_query_skips_name_parsing() {
        let meta = QueryMethodMetadata::new().with_query("SELECT * FROM /People p WHERE p.age > $1");
        let method = QueryMethod::new("whatever", 1, people(), meta).unwrap();
        assert!(method.has_explicit_query());
        assert!(method.part_tree().is_none());

        let q = method.create_query(&Sort::unsorted()).unwrap();
        assert_eq!(q.query.as_str(), "SELECT * FROM /People p WHERE p.age > $1");
        assert!(q.bindings.is_empty());
    }

    #[test]
    fn blank_explicit_query_rejected() {
        let meta = QueryMethodMetadata::new().with_query("  ");
        let err = QueryMethod::new("findAll", 0, people(), meta).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.method(), Some("findAll"));
    }

    #[test]
    fn zero_limit_rejected() {
        let err = QueryMethod::new(
            "findByAge",
            1,
            people(),
            QueryMethodMetadata::new().with_limit(0),
        )
        .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.method(), Some("findByAge"));

        let meta = QueryMethodMetadata::from_json(r#"{"query": "SELECT * FROM /People p", "limit": 0}"#)
            .unwrap();
        assert!(QueryMethod::new("everyone", 0, people(), meta).unwrap_err().is_validation());

        assert!(
            QueryMethod::new("findByAge", 1, people(), QueryMethodMetadata::new().with_limit(1))
                .is_ok()
        );
    }

    #[test]
    fn distinct_applies_after_leading_import() {
        let meta = QueryMethodMetadata::new()
            .with_query("IMPORT org.example.Person; SELECT * FROM /People p")
            .distinct();
        let method = QueryMethod::new("everyone", 0, people(), meta).unwrap();
        let q = method.create_query(&Sort::unsorted()).unwrap();
        assert_eq!(
            q.query.as_str(),
            "IMPORT org.example.Person; SELECT DISTINCT * FROM /People p"
        );
    }

    #[test]
    fn bound_limit_is_not_doubled() {
        let meta = QueryMethodMetadata::new()
            .with_query("SELECT * FROM /People p LIMIT $1")
            .with_limit(5);
        let method = QueryMethod::new("firstFew", 1, people(), meta).unwrap();
        let q = method.create_query(&Sort::unsorted()).unwrap();
        assert_eq!(q.query.as_str(), "SELECT * FROM /People p LIMIT $1");
    }

    #[test]
    fn modifiers_apply_to_explicit_query() {
        let meta = QueryMethodMetadata::new()
            .with_query("SELECT * FROM /People p")
            .with_import("org.example.Person")
            .with_hints(["IdIdx"])
            .with_limit(3)
            .distinct()
            .trace();
        let method = QueryMethod::new("custom", 0, people(), meta).unwrap();
        let q = method
            .create_query(&Sort::new().asc("lastname").unwrap())
            .unwrap();
        assert_eq!(
            q.query.as_str(),
            "<TRACE> <HINT 'IdIdx'> IMPORT org.example.Person; \
             SELECT DISTINCT * FROM /People p ORDER BY lastname LIMIT 3"
        );
    }

    #[test]
    fn explicit_order_by_is_kept() {
        let meta = QueryMethodMetadata::new().with_query("SELECT * FROM /People p ORDER BY age");
        let method = QueryMethod::new("custom", 0, people(), meta).unwrap();
        let q = method
            .create_query(&Sort::new().asc("lastname").unwrap())
            .unwrap();
        assert_eq!(q.query.as_str(), "SELECT * FROM /People p ORDER BY age");
    }

    #[test]
    fn metadata_limit_wins_over_top() {
        let method = QueryMethod::new(
            "findTop5ByLastname",
            1,
            people(),
            QueryMethodMetadata::new().with_limit(2),
        )
        .unwrap();
        assert_eq!(method.limit(), Some(2));
        let q = method.create_query(&Sort::unsorted()).unwrap();
        assert_eq!(
            q.query.as_str(),
            "SELECT * FROM /People x WHERE x.lastname = $1 LIMIT 2"
        );

        let method =
            QueryMethod::new("findTop5ByLastname", 1, people(), QueryMethodMetadata::new()).unwrap();
        assert_eq!(method.limit(), Some(5));
    }

    #[test]
    fn distinct_override_on_derived_query() {
        let method = QueryMethod::new(
            "findDistinctByLastname",
            1,
            people(),
            QueryMethodMetadata::new().distinct(),
        )
        .unwrap();
        let q = method.create_query(&Sort::unsorted()).unwrap();
        assert_eq!(q.query.as_str().matches("DISTINCT").count(), 1);
    }

    #[test]
    fn create_query_is_idempotent() {
        let method = QueryMethod::new(
            "findByFirstnameOrLastname",
            2,
            people(),
            QueryMethodMetadata::new().with_hints(["NameIdx"]),
        )
        .unwrap();
        let a = method.create_query(&Sort::unsorted()).unwrap();
        let b = method.create_query(&Sort::unsorted()).unwrap();
        assert_eq!(a, b);
    }
}
