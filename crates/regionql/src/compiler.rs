//! Derived query compilation.
//!
//! [`QueryCompiler`] reduces a parsed [`PartTree`] to OQL:
//!
//! 1. a fresh [`PlaceholderSequence`] starts at `$1`,
//! 2. the first criterion of a group becomes a leaf,
//! 3. the following criteria of the group are joined with `AND`,
//! 4. each later group is reduced the same way and joined with `OR`,
//! 5. the builder renders the text and `ORDER BY` is appended for the static
//!    (method name) sort followed by the dynamic (call-time) sort.

use crate::criteria::Criterion;
use crate::entity::EntityMetadata;
use crate::error::{OqlError, OqlResult};
use crate::oql::{Binding, PlaceholderSequence, Predicate, QueryBuilder, QueryString};
use crate::paging::{Order, Sort};
use crate::part_tree::{OrPart, PartTree};
use serde_json::Value;

/// Compiled query text and how method arguments bind to its placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    /// The generated query.
    pub query: QueryString,
    /// Placeholders in ascending order.
    pub bindings: Vec<Binding>,
}

impl CompiledQuery {
    /// Number of placeholders in the query.
    pub fn placeholder_count(&self) -> usize {
        self.bindings.len()
    }

    /// Map method arguments to bound values, applying `LIKE` transforms.
    ///
    /// Arguments without a placeholder are passed through unchanged, and
    /// missing arguments are not filled in.
    pub fn bind_arguments(&self, args: &[Value]) -> Vec<Value> {
        args.iter()
            .enumerate()
            .map(|(i, arg)| {
                match self.bindings.iter().find(|b| b.index == i + 1) {
                    Some(binding) => binding.transform.apply(arg),
                    None => arg.clone(),
                }
            })
            .collect()
    }
}

/// Compiles a [`PartTree`] for an entity.
///
/// # Example
/// ```ignore
/// use regionql::{EntityMetadata, PartTree, PropertyKind, QueryCompiler, Sort};
///
/// let people = EntityMetadata::new("People")
///     .with_property("lastname", PropertyKind::String)
///     .with_property("age", PropertyKind::Integer);
/// let tree = PartTree::parse("findByLastnameAndAgeGreaterThan")?;
///
/// let compiled = QueryCompiler::new(&people, &tree).compile(&Sort::unsorted())?;
/// assert_eq!(
///     compiled.query.as_str(),
///     "SELECT * FROM /People x WHERE x.lastname = $1 AND x.age > $2"
/// );
/// # Ok::<(), regionql::OqlError>(())
/// ```
#[derive(Debug, Clone)]
pub struct QueryCompiler<'a> {
    entity: &'a EntityMetadata,
    tree: &'a PartTree,
    method_name: Option<String>,
    max_placeholders: Option<usize>,
}

impl<'a> QueryCompiler<'a> {
    /// Create a compiler for `tree` against `entity`.
    pub fn new(entity: &'a EntityMetadata, tree: &'a PartTree) -> Self {
        Self {
            entity,
            tree,
            method_name: None,
            max_placeholders: None,
        }
    }

    /// Tag errors with the name of the query method being compiled.
    pub fn method_name(mut self, name: impl Into<String>) -> Self {
        self.method_name = Some(name.into());
        self
    }

    /// Bound the placeholder sequence, normally by the method's parameter count.
    ///
    /// Defaults to the number of arguments the criteria consume.
    pub fn max_placeholders(mut self, max: usize) -> Self {
        self.max_placeholders = Some(max);
        self
    }

    /// Compile the tree, appending `ORDER BY` for the static sort followed by
    /// `sort`.
    pub fn compile(&self, sort: &Sort) -> OqlResult<CompiledQuery> {
        self.compile_inner(sort).map_err(|err| match &self.method_name {
            Some(name) => err.in_method(name.clone()),
            None => err,
        })
    }

    fn compile_inner(&self, sort: &Sort) -> OqlResult<CompiledQuery> {
        if self.tree.is_empty() {
            return Err(OqlError::EmptyCriteria);
        }

        let mut placeholders = PlaceholderSequence::new(
            self.max_placeholders
                .unwrap_or_else(|| self.tree.parameter_count()),
        );

        let mut predicate: Option<Predicate> = None;
        for group in self.tree.groups() {
            let reduced = self.reduce_group(group, &mut placeholders)?;
            predicate = Some(match predicate {
                Some(existing) => existing.or(reduced),
                None => reduced,
            });
        }

        let query = self.complete(predicate.as_ref(), sort)?;
        let bindings = predicate.as_ref().map(Predicate::bindings).unwrap_or_default();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "regionql.oql",
            method = self.method_name.as_deref().unwrap_or("-"),
            placeholders = bindings.len(),
            oql = %query,
            "compiled derived query"
        );

        Ok(CompiledQuery { query, bindings })
    }

    fn reduce_group(
        &self,
        group: &OrPart,
        placeholders: &mut PlaceholderSequence,
    ) -> OqlResult<Predicate> {
        let mut predicate: Option<Predicate> = None;
        for part in group.parts() {
            let criterion =
                Criterion::resolve(self.entity, &part.property, part.operator, part.ignore_case)?;
            let leaf = Predicate::from(criterion, placeholders)?;
            predicate = Some(match predicate {
                Some(existing) => existing.and(leaf),
                None => leaf,
            });
        }
        predicate.ok_or(OqlError::EmptyCriteria)
    }

    /// Render the final text for `predicate` with static and dynamic sort.
    pub fn complete(&self, predicate: Option<&Predicate>, sort: &Sort) -> OqlResult<QueryString> {
        let builder = QueryBuilder::for_entity(self.entity, self.tree.is_distinct())?;
        let query = builder.create(predicate);
        let combined = self.static_sort()?.and(sort);
        Ok(query.order_by(&combined))
    }

    /// The `OrderBy` clause of the method name, resolved against the entity.
    pub fn static_sort(&self) -> OqlResult<Sort> {
        let orders = self
            .tree
            .order()
            .iter()
            .map(|o| {
                let (path, _) = self.entity.resolve_property(&o.property)?;
                Ok(Order::new(path, o.direction))
            })
            .collect::<OqlResult<Vec<_>>>()?;
        Ok(Sort::by(orders))
    }
}
