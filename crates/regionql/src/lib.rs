//! # regionql
//!
//! Derived queries and client-side paging for OQL data grids.
//!
//! ## Features
//!
//! - **Derived queries**: `findByLastnameAndAgeGreaterThan` compiles to
//!   `SELECT * FROM /People x WHERE x.lastname = $1 AND x.age > $2`
//! - **Explicit queries**: hand-written OQL with the same extensions
//! - **Query extensions**: `DISTINCT`, `IMPORT`, `<HINT>`, `LIMIT`, `<TRACE>` from method metadata
//! - **Client-side paging**: page an already executed result without re-running it
//! - **Pluggable execution**: ordered executor strategies, post processors and hooks
//!
//! ## Compiling a derived query
//!
//! ```ignore
//! use regionql::{EntityMetadata, PropertyKind, QueryMethod, QueryMethodMetadata, Sort};
//! use std::sync::Arc;
//!
//! let people = Arc::new(
//!     EntityMetadata::new("People")
//!         .with_property("lastname", PropertyKind::String)
//!         .with_property("age", PropertyKind::Integer),
//! );
//!
//! let method = QueryMethod::new(
//!     "findByLastnameAndAgeGreaterThan",
//!     2,
//!     people,
//!     QueryMethodMetadata::new().with_limit(10),
//! )?;
//!
//! let compiled = method.create_query(&Sort::unsorted())?;
//! assert_eq!(
//!     compiled.query.as_str(),
//!     "SELECT * FROM /People x WHERE x.lastname = $1 AND x.age > $2 LIMIT 10"
//! );
//! ```
//!
//! ## Executing and paging
//!
//! ```ignore
//! use regionql::{EngineExecutor, ExecutorChain, Invocation, PageRequest, RepositoryQuery};
//!
//! let query = RepositoryQuery::new(method, ExecutorChain::new().then(EngineExecutor::new(engine)));
//! let page = query.execute_paged(
//!     &[json!("Smith"), json!(30)],
//!     &Invocation::new().with_page(PageRequest::of(0, 20)?),
//! )?;
//! for person in &page {
//!     println!("{person:?}");
//! }
//! ```

pub mod compiler;
pub mod criteria;
pub mod entity;
pub mod error;
pub mod execute;
pub mod ident;
pub mod method;
pub mod monitor;
pub mod oql;
pub mod paging;
pub mod part_tree;
pub mod post_process;
pub mod prelude;

pub use compiler::{CompiledQuery, QueryCompiler};
pub use criteria::{Criterion, IgnoreCaseMode, Operator};
pub use entity::{EntityMetadata, PropertyKind, PropertyMeta, RegionEntity};
pub use error::{OqlError, OqlResult};
pub use execute::{
    EngineExecutor, Execution, ExecutorChain, Invocation, PreparedQuery, QueryExecutor,
    RepositoryQuery,
};
pub use ident::{IntoPropertyPath, PropertyPath, RegionPath};
pub use method::{QueryMethod, QueryMethodMetadata};
pub use monitor::{CompositeHook, HookAction, NoopHook, QueryContext, QueryHook, QueryResult};
pub use oql::{
    ArgumentTransform, Binding, PagedQueryString, PlaceholderSequence, Predicate, QueryBuilder,
    QueryString,
};
pub use paging::{Direction, Order, Page, PageRequest, PagedResults, SelectResults, Sort};
pub use part_tree::{OrPart, OrderPart, Part, PartTree};
pub use post_process::{IdentityPostProcessor, PostProcessorChain, QueryPostProcessor};

#[cfg(feature = "tracing")]
pub use monitor::TracingOqlHook;

#[cfg(feature = "derive")]
pub use regionql_derive::Region;
