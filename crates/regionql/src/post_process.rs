//! Query text post-processing.
//!
//! A [`QueryPostProcessor`] rewrites the final query text of a query method
//! before it is executed. Processors are composed into a
//! [`PostProcessorChain`]; an empty chain behaves like
//! [`IdentityPostProcessor`].
//!
//! # Example
//! ```ignore
//! use regionql::{PostProcessorChain, QueryMethod};
//! use serde_json::Value;
//!
//! let chain = PostProcessorChain::new()
//!     .process_before(|_: &QueryMethod, q: &str, _: &[Value]| q.replace("/People", "/Staff"));
//! ```

use crate::method::QueryMethod;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Default order for processors that do not declare one (runs last).
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// Rewrites query text for a query method.
pub trait QueryPostProcessor: Send + Sync {
    /// Sort key used by [`PostProcessorChain::register`]; lower runs first.
    fn order(&self) -> i32 {
        LOWEST_PRECEDENCE
    }

    /// Return the (possibly rewritten) query.
    fn post_process(&self, method: &QueryMethod, query: &str, args: &[Value]) -> String;
}

impl<F> QueryPostProcessor for F
where
    F: Fn(&QueryMethod, &str, &[Value]) -> String + Send + Sync,
{
    fn post_process(&self, method: &QueryMethod, query: &str, args: &[Value]) -> String {
        self(method, query, args)
    }
}

/// Returns the query unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPostProcessor;

impl QueryPostProcessor for IdentityPostProcessor {
    fn post_process(&self, _method: &QueryMethod, query: &str, _args: &[Value]) -> String {
        query.to_string()
    }
}

/// An ordered sequence of post processors.
///
/// Each processor receives the output of the one before it.
#[derive(Clone, Default)]
pub struct PostProcessorChain {
    processors: Vec<Arc<dyn QueryPostProcessor>>,
}

impl PostProcessorChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `processor` after every processor already in the chain.
    pub fn process_before<P: QueryPostProcessor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Arc::new(processor));
        self
    }

    /// Run `processor` before every processor already in the chain.
    pub fn process_after<P: QueryPostProcessor + 'static>(mut self, processor: P) -> Self {
        self.processors.insert(0, Arc::new(processor));
        self
    }

    /// Insert `processor` by its [`order`](QueryPostProcessor::order).
    /// Processors with equal order keep registration order.
    pub fn register(mut self, processor: Arc<dyn QueryPostProcessor>) -> Self {
        let order = processor.order();
        let at = self.processors.partition_point(|p| p.order() <= order);
        self.processors.insert(at, processor);
        self
    }

    /// Number of processors in the chain.
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl QueryPostProcessor for PostProcessorChain {
    fn order(&self) -> i32 {
        self.processors
            .first()
            .map_or(LOWEST_PRECEDENCE, |p| p.order())
    }

    fn post_process(&self, method: &QueryMethod, query: &str, args: &[Value]) -> String {
        self.processors
            .iter()
            .fold(query.to_string(), |current, p| {
                p.post_process(method, &current, args)
            })
    }
}

impl fmt::Debug for PostProcessorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostProcessorChain")
            .field("processors", &self.processors.len())
            .finish()
    }
}
