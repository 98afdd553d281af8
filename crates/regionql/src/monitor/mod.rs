//! Query hooks and logging.
//!
//! This module provides traits and utilities for:
//! - Hooking into the execution lifecycle (before/after the engine runs a query)
//! - Rewriting or aborting a query right before execution
//! - Logging the OQL actually executed via `tracing`
//!
//! # Example
//!
//! ```rust,ignore
//! use regionql::monitor::{HookAction, QueryContext, QueryHook};
//!
//! // Refuse to run unbounded queries
//! struct RequireLimit;
//!
//! impl QueryHook for RequireLimit {
//!     fn before_query(&self, ctx: &QueryContext) -> HookAction {
//!         if ctx.oql.contains("LIMIT") {
//!             HookAction::Continue
//!         } else {
//!             HookAction::Abort(format!("{} has no LIMIT", ctx.method))
//!         }
//!     }
//! }
//!
//! let query = RepositoryQuery::new(method, executors).with_hook(RequireLimit);
//! ```

mod composite;
mod types;

#[cfg(feature = "tracing")]
mod tracing_hook;


pub use composite::{CompositeHook, NoopHook};
pub use types::{HookAction, QueryContext, QueryHook, QueryResult};

#[cfg(feature = "tracing")]
pub use tracing_hook::TracingOqlHook;

pub(crate) fn truncate_bytes(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
