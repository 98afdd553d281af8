//! Convenient imports for typical `regionql` usage.
//!
//! ```ignore
//! use regionql::prelude::*;
//! ```

pub use crate::{
    EngineExecutor, EntityMetadata, Execution, ExecutorChain, Invocation, OqlError, OqlResult,
    PageRequest, PagedResults, PropertyKind, QueryExecutor, QueryMethod, QueryMethodMetadata,
    RegionEntity, RepositoryQuery, Sort,
};

#[cfg(feature = "derive")]
pub use crate::Region;
