//! OQL text generation.
//!
//! This module turns typed criteria into OQL text:
//!
//! - **Placeholders**: `$n` indices are handed out by a bounded
//!   [`PlaceholderSequence`] as leaves are built, never by string replacement
//! - **Predicates**: [`Predicate`] trees of `AND`/`OR` with minimal parentheses
//! - **Builder**: [`QueryBuilder`] produces `SELECT [DISTINCT] * FROM /<region> x [WHERE ...]`
//! - **Query strings**: [`QueryString`] carries the extensions (`IMPORT`, `<HINT>`,
//!   `LIMIT`, `<TRACE>`, `DISTINCT`, `ORDER BY`)
//!
//! # Usage
//!
//! ```ignore
//! use regionql::oql::{PlaceholderSequence, Predicate, QueryBuilder};
//! use regionql::{Criterion, EntityMetadata, Operator, PropertyKind};
//!
//! let people = EntityMetadata::new("People")
//!     .with_property("lastname", PropertyKind::String)
//!     .with_property("age", PropertyKind::Integer);
//!
//! let mut seq = PlaceholderSequence::new(2);
//! let predicate = Predicate::from(
//!     Criterion::new("lastname", PropertyKind::String, Operator::Equals, false)?,
//!     &mut seq,
//! )?
//! .and(Predicate::from(
//!     Criterion::new("age", PropertyKind::Integer, Operator::GreaterThan, false)?,
//!     &mut seq,
//! )?);
//!
//! let query = QueryBuilder::for_entity(&people, false)?.create(Some(&predicate));
//! assert_eq!(
//!     query.as_str(),
//!     "SELECT * FROM /People x WHERE x.lastname = $1 AND x.age > $2"
//! );
//! # Ok::<(), regionql::OqlError>(())
//! ```

mod builder;
mod placeholder;
mod predicate;
mod query_string;


pub use builder::{DEFAULT_ALIAS, QueryBuilder};
pub use placeholder::PlaceholderSequence;
pub use predicate::{ArgumentTransform, Binding, Predicate};
pub use query_string::{PagedQueryString, QueryString};
