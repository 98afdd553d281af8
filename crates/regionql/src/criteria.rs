//! Typed query criteria.
//!
//! A [`Criterion`] is one test against one entity property: a property path,
//! an [`Operator`], and an ignore-case flag. Criteria are type-checked against
//! the property's [`PropertyKind`] when they are created, so an operator that
//! cannot apply to a property fails at registration instead of at execution.

use crate::entity::{EntityMetadata, PropertyKind};
use crate::error::{OqlError, OqlResult};
use crate::ident::{IntoPropertyPath, PropertyPath};
use std::fmt;

/// Comparison operator of a criterion.
///
/// # Example
/// ```ignore
/// use regionql::Operator;
///
/// assert_eq!(Operator::Equals.arity(), 1);
/// assert_eq!(Operator::Between.arity(), 2);
/// assert_eq!(Operator::IsNull.arity(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `x.p = $n`
    Equals,
    /// `x.p != $n`
    NotEquals,
    /// `x.p > $n`
    GreaterThan,
    /// `x.p >= $n`
    GreaterThanEqual,
    /// `x.p < $n`
    LessThan,
    /// `x.p <= $n`
    LessThanEqual,
    /// `x.p < $n` (temporal phrasing)
    Before,
    /// `x.p > $n` (temporal phrasing)
    After,
    /// `x.p LIKE $n`
    Like,
    /// `NOT (x.p LIKE $n)`
    NotLike,
    /// `x.p LIKE $n` with the argument bound as `value%`
    StartingWith,
    /// `x.p LIKE $n` with the argument bound as `%value`
    EndingWith,
    /// `x.p LIKE $n` with the argument bound as `%value%`
    Containing,
    /// `NOT (x.p LIKE $n)` with the argument bound as `%value%`
    NotContaining,
    /// `x.p IN SET $n`
    In,
    /// `x.p NOT IN SET $n`
    NotIn,
    /// `x.p >= $n AND x.p <= $m`
    Between,
    /// `x.p = NULL`
    IsNull,
    /// `x.p != NULL`
    IsNotNull,
    /// `x.p = true`
    True,
    /// `x.p = false`
    False,
}

impl Operator {
    /// Number of method arguments (and placeholders) this operator consumes.
    pub fn arity(self) -> usize {
        match self {
            Self::IsNull | Self::IsNotNull | Self::True | Self::False => 0,
            Self::Between => 2,
            _ => 1,
        }
    }

    /// Operators that require an ordered value.
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::GreaterThan
                | Self::GreaterThanEqual
                | Self::LessThan
                | Self::LessThanEqual
                | Self::Before
                | Self::After
                | Self::Between
        )
    }

    /// Operators rendered with `LIKE`.
    pub fn is_like(self) -> bool {
        matches!(
            self,
            Self::Like
                | Self::NotLike
                | Self::StartingWith
                | Self::EndingWith
                | Self::Containing
                | Self::NotContaining
        )
    }

    /// Operators that test a boolean property against a constant.
    pub fn is_boolean(self) -> bool {
        matches!(self, Self::True | Self::False)
    }

    /// Operators that support a case-insensitive comparison.
    pub fn supports_ignore_case(self) -> bool {
        matches!(self, Self::Equals | Self::NotEquals)
    }

    /// Whether `kind` can be tested with this operator.
    pub fn accepts(self, kind: PropertyKind) -> bool {
        if kind.is_opaque() {
            return true;
        }
        if self.is_ordering() {
            kind.is_comparable()
        } else if self.is_like() {
            kind == PropertyKind::String
        } else if self.is_boolean() {
            kind == PropertyKind::Boolean
        } else {
            true
        }
    }

    /// Keyword name as used in derived method names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "Equals",
            Self::NotEquals => "Not",
            Self::GreaterThan => "GreaterThan",
            Self::GreaterThanEqual => "GreaterThanEqual",
            Self::LessThan => "LessThan",
            Self::LessThanEqual => "LessThanEqual",
            Self::Before => "Before",
            Self::After => "After",
            Self::Like => "Like",
            Self::NotLike => "NotLike",
            Self::StartingWith => "StartingWith",
            Self::EndingWith => "EndingWith",
            Self::Containing => "Containing",
            Self::NotContaining => "NotContaining",
            Self::In => "In",
            Self::NotIn => "NotIn",
            Self::Between => "Between",
            Self::IsNull => "IsNull",
            Self::IsNotNull => "IsNotNull",
            Self::True => "True",
            Self::False => "False",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a part of a method name asks for case-insensitive matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IgnoreCaseMode {
    /// Compare exactly.
    #[default]
    Never,
    /// Ignore case where the property and operator support it (`AllIgnoreCase`).
    WhenPossible,
    /// Ignore case, failing when the property or operator cannot support it.
    Always,
}

/// One property test: `property operator value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    property: PropertyPath,
    kind: PropertyKind,
    operator: Operator,
    ignore_case: bool,
}

impl Criterion {
    /// Create a criterion, checking that `operator` applies to `kind`.
    pub fn new(
        property: impl IntoPropertyPath,
        kind: PropertyKind,
        operator: Operator,
        ignore_case: bool,
    ) -> OqlResult<Self> {
        let property = property.into_property_path()?;
        let incompatible = || OqlError::IncompatibleOperator {
            property: property.to_string(),
            kind: kind.to_string(),
            operator: if ignore_case {
                format!("{operator} (ignore case)")
            } else {
                operator.to_string()
            },
        };

        if !operator.accepts(kind) {
            return Err(incompatible());
        }
        if ignore_case
            && !(operator.supports_ignore_case()
                && matches!(kind, PropertyKind::String | PropertyKind::Object))
        {
            return Err(incompatible());
        }

        Ok(Self {
            property,
            kind,
            operator,
            ignore_case,
        })
    }

    /// Resolve a property as written in a method name against `entity` and
    /// build a criterion for it.
    pub fn resolve(
        entity: &EntityMetadata,
        raw_property: &str,
        operator: Operator,
        ignore_case: IgnoreCaseMode,
    ) -> OqlResult<Self> {
        let (property, kind) = entity.resolve_property(raw_property)?;
        let ignore_case = match ignore_case {
            IgnoreCaseMode::Never => false,
            IgnoreCaseMode::Always => true,
            IgnoreCaseMode::WhenPossible => {
                operator.supports_ignore_case() && kind == PropertyKind::String
            }
        };
        Self::new(property, kind, operator, ignore_case)
    }

    /// The property this criterion tests.
    pub fn property(&self) -> &PropertyPath {
        &self.property
    }

    /// Kind of the tested property.
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// The comparison operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Whether the comparison ignores case.
    pub fn is_ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Number of placeholders consumed by this criterion.
    pub fn arity(&self) -> usize {
        self.operator.arity()
    }
}
