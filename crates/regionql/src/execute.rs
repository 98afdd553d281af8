//! Query execution.
//!
//! This crate never runs a query itself. A [`QueryExecutor`] hands the final
//! OQL and its bound arguments to an engine, an [`ExecutorChain`] tries several
//! strategies in order, and [`RepositoryQuery`] drives one query method from
//! arguments to results: compile, post-process, run hooks, execute.
//!
//! # Example
//!
//! ```ignore
//! use regionql::{EngineExecutor, ExecutorChain, Invocation, PageRequest, RepositoryQuery};
//!
//! let executors = ExecutorChain::new().then(EngineExecutor::new(|oql: &str, args: &[Value]| {
//!     engine.select::<Person>(oql, args)
//! }));
//! let query = RepositoryQuery::new(method, executors);
//!
//! let page = query.execute_paged(
//!     &[json!("Smith"), json!(30)],
//!     &Invocation::new().with_page(PageRequest::of(0, 20)?),
//! )?;
//! ```

use crate::error::{OqlError, OqlResult};
use crate::method::QueryMethod;
use crate::monitor::{CompositeHook, HookAction, QueryContext, QueryHook, QueryResult};
use crate::oql::{PagedQueryString, QueryString};
use crate::paging::{PageRequest, PagedResults, Sort};
use crate::post_process::{PostProcessorChain, QueryPostProcessor};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

// ==================== Strategies ====================

/// Outcome of one execution strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution<T> {
    /// The strategy ran the query.
    Completed(Vec<T>),
    /// The strategy does not handle this query; the next one should try.
    Unsupported,
}

impl<T> Execution<T> {
    /// Whether the strategy ran the query.
    pub fn is_completed(&self) -> bool {
        matches!(self, Execution::Completed(_))
    }

    /// The rows, if the strategy ran the query.
    pub fn into_rows(self) -> Option<Vec<T>> {
        match self {
            Execution::Completed(rows) => Some(rows),
            Execution::Unsupported => None,
        }
    }
}

/// A strategy for running a prepared query.
///
/// Return `Ok(Execution::Unsupported)` to let the next strategy of an
/// [`ExecutorChain`] try. Errors are never retried by the chain.
pub trait QueryExecutor<T>: Send + Sync {
    /// Run `query` for `method` with the bound `args`.
    fn execute(
        &self,
        method: &QueryMethod,
        query: &PagedQueryString,
        args: &[Value],
    ) -> OqlResult<Execution<T>>;
}

impl<T, F> QueryExecutor<T> for F
where
    F: Fn(&QueryMethod, &PagedQueryString, &[Value]) -> OqlResult<Execution<T>> + Send + Sync,
{
    fn execute(
        &self,
        method: &QueryMethod,
        query: &PagedQueryString,
        args: &[Value],
    ) -> OqlResult<Execution<T>> {
        self(method, query, args)
    }
}

/// Adapts a plain engine function `(oql, args) -> rows`.
///
/// The engine always handles the query; its errors become [`OqlError::Engine`].
pub struct EngineExecutor<F> {
    engine: F,
}

impl<F> EngineExecutor<F> {
    /// Wrap an engine function.
    pub fn new(engine: F) -> Self {
        Self { engine }
    }
}

impl<F> fmt::Debug for EngineExecutor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineExecutor").finish_non_exhaustive()
    }
}

impl<T, F, E> QueryExecutor<T> for EngineExecutor<F>
where
    F: Fn(&str, &[Value]) -> Result<Vec<T>, E> + Send + Sync,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn execute(
        &self,
        _method: &QueryMethod,
        query: &PagedQueryString,
        args: &[Value],
    ) -> OqlResult<Execution<T>> {
        (self.engine)(query.as_str(), args)
            .map(Execution::Completed)
            .map_err(|e| OqlError::Engine(e.into()))
    }
}

/// Ordered execution strategies.
///
/// Strategies are tried in registration order. `Unsupported` falls through to
/// the next strategy, the first completed result or error is returned as is.
pub struct ExecutorChain<T> {
    executors: Vec<Arc<dyn QueryExecutor<T>>>,
}

impl<T> ExecutorChain<T> {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self {
            executors: Vec::new(),
        }
    }

    /// Append a strategy.
    pub fn then<E: QueryExecutor<T> + 'static>(mut self, executor: E) -> Self {
        self.executors.push(Arc::new(executor));
        self
    }

    /// Append an Arc-wrapped strategy.
    pub fn then_arc(mut self, executor: Arc<dyn QueryExecutor<T>>) -> Self {
        self.executors.push(executor);
        self
    }

    /// Number of strategies.
    pub fn len(&self) -> usize {
        self.executors.len()
    }

    /// Whether no strategies are registered.
    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }

    /// Run the chain, failing with [`OqlError::UnsupportedExecution`] when no
    /// strategy handles the query.
    pub fn run(
        &self,
        method: &QueryMethod,
        query: &PagedQueryString,
        args: &[Value],
    ) -> OqlResult<Vec<T>> {
        match self.execute(method, query, args)? {
            Execution::Completed(rows) => Ok(rows),
            Execution::Unsupported => Err(OqlError::UnsupportedExecution(query.to_string())),
        }
    }
}

impl<T> Default for ExecutorChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ExecutorChain<T> {
    fn clone(&self) -> Self {
        Self {
            executors: self.executors.clone(),
        }
    }
}

impl<T> fmt::Debug for ExecutorChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorChain")
            .field("executors", &self.executors.len())
            .finish()
    }
}

impl<T> QueryExecutor<T> for ExecutorChain<T> {
    fn execute(
        &self,
        method: &QueryMethod,
        query: &PagedQueryString,
        args: &[Value],
    ) -> OqlResult<Execution<T>> {
        for (_position, executor) in self.executors.iter().enumerate() {
            match executor.execute(method, query, args)? {
                Execution::Unsupported => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(
                        target: "regionql.oql",
                        method = method.name(),
                        position = _position,
                        "executor declined query"
                    );
                }
                completed => return Ok(completed),
            }
        }
        Ok(Execution::Unsupported)
    }
}

// ==================== Invocation ====================

/// Call-time inputs of a query method besides its arguments.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    sort: Sort,
    page: Option<PageRequest>,
}

impl Invocation {
    /// An unsorted, unpaged invocation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dynamic sort.
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// Request one page of the results.
    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    /// The dynamic sort passed by the caller.
    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// The page request, if any.
    pub fn page(&self) -> Option<&PageRequest> {
        self.page.as_ref()
    }

    /// The caller's sort followed by the page request's sort.
    pub fn dynamic_sort(&self) -> Sort {
        match &self.page {
            Some(page) => self.sort.clone().and(page.sort()),
            None => self.sort.clone(),
        }
    }
}

/// Final query text and bound arguments, ready for an executor.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuery {
    /// The query, carrying the method's metadata.
    pub query: PagedQueryString,
    /// Arguments in placeholder order, with `LIKE` transforms applied.
    pub arguments: Vec<Value>,
}

// ==================== RepositoryQuery ====================

/// Runs one query method against an [`ExecutorChain`].
pub struct RepositoryQuery<T> {
    method: Arc<QueryMethod>,
    executors: ExecutorChain<T>,
    post_processors: PostProcessorChain,
    hooks: CompositeHook,
}

impl<T> RepositoryQuery<T> {
    /// Create a repository query for `method`.
    pub fn new(method: impl Into<Arc<QueryMethod>>, executors: ExecutorChain<T>) -> Self {
        Self {
            method: method.into(),
            executors,
            post_processors: PostProcessorChain::new(),
            hooks: CompositeHook::new(),
        }
    }

    /// The query method.
    pub fn method(&self) -> &QueryMethod {
        &self.method
    }

    /// Register a post processor, placed by its [`QueryPostProcessor::order`].
    pub fn register<P: QueryPostProcessor + 'static>(mut self, processor: P) -> Self {
        self.post_processors = self.post_processors.register(Arc::new(processor));
        self
    }

    /// Replace the post processor chain.
    pub fn with_post_processors(mut self, chain: PostProcessorChain) -> Self {
        self.post_processors = chain;
        self
    }

    /// Add a hook. Hooks run in the order they were added.
    pub fn with_hook<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.hooks = self.hooks.add(hook);
        self
    }

    /// Build the final query and arguments for one invocation.
    pub fn prepare(&self, args: &[Value], invocation: &Invocation) -> OqlResult<PreparedQuery> {
        let compiled = self.method.create_query(&invocation.dynamic_sort())?;
        let arguments = compiled.bind_arguments(args);

        let query = if self.post_processors.is_empty() {
            compiled.query
        } else {
            let text = self.post_processors.post_process(
                &self.method,
                compiled.query.as_str(),
                &arguments,
            );
            QueryString::new(text).map_err(|e| e.in_method(self.method.name()))?
        };

        #[cfg(feature = "tracing")]
        if self.method.metadata().is_trace() {
            tracing::info!(
                target: "regionql.oql",
                method = self.method.name(),
                oql = query.as_str(),
                "prepared traced query"
            );
        } else {
            tracing::debug!(
                target: "regionql.oql",
                method = self.method.name(),
                oql = query.as_str(),
                param_count = arguments.len(),
                "prepared query"
            );
        }

        Ok(PreparedQuery {
            query: PagedQueryString::of(query).with_method(self.method.metadata_arc()),
            arguments,
        })
    }

    /// Prepare and execute the query.
    ///
    /// Hooks see the final text first and may rewrite or abort it.
    pub fn execute(&self, args: &[Value], invocation: &Invocation) -> OqlResult<Vec<T>> {
        let PreparedQuery { query, arguments } = self.prepare(args, invocation)?;

        let mut ctx = QueryContext::new(self.method.name(), query.as_str(), arguments.len())
            .with_region(self.method.entity().region())
            .with_trace(self.method.metadata().is_trace());

        let query = match self.hooks.before_query(&ctx) {
            HookAction::Continue => query,
            HookAction::ModifyOql(oql) => {
                let rewritten = QueryString::new(oql.as_str())?;
                ctx.oql = oql;
                PagedQueryString::of(rewritten).with_method(self.method.metadata_arc())
            }
            HookAction::Abort(reason) => return Err(OqlError::Aborted(reason)),
        };

        let start = Instant::now();
        let result = self.executors.run(&self.method, &query, &arguments);
        let outcome = match &result {
            Ok(rows) => QueryResult::Rows(rows.len()),
            Err(e) => QueryResult::error(e.to_string()),
        };
        self.hooks.after_query(&ctx, start.elapsed(), &outcome);

        result
    }

    /// Execute the query and page the results client-side.
    ///
    /// The invocation must carry a page request.
    pub fn execute_paged(
        &self,
        args: &[Value],
        invocation: &Invocation,
    ) -> OqlResult<PagedResults<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let page = invocation.page().cloned().ok_or_else(|| {
            OqlError::validation(format!(
                "{} requires a page request for paged execution",
                self.method.name()
            ))
        })?;
        let rows = self.execute(args, invocation)?;
        Ok(PagedResults::new(Arc::new(rows), page))
    }
}

impl<T> fmt::Debug for RepositoryQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryQuery")
            .field("method", &self.method.name())
            .field("executors", &self.executors.len())
            .field("post_processors", &self.post_processors.len())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
