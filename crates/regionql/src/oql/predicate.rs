//! Predicate trees for OQL `WHERE` clauses.
//!
//! A [`Predicate`] is built leaf by leaf from [`Criterion`] values. Each leaf
//! takes its placeholder indices from a [`PlaceholderSequence`] when it is
//! created, so rendering is a pure function of the tree and the query alias and
//! the numbering never depends on how the tree is grouped.

use super::placeholder::PlaceholderSequence;
use crate::criteria::{Criterion, Operator};
use crate::error::OqlResult;
use serde_json::Value;

/// Rewrite applied to a method argument before it is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgumentTransform {
    /// Bind the argument as given.
    #[default]
    None,
    /// `value%`
    StartingWith,
    /// `%value`
    EndingWith,
    /// `%value%`
    Containing,
}

impl ArgumentTransform {
    /// The transform an operator applies to its argument.
    pub fn for_operator(op: Operator) -> Self {
        match op {
            Operator::StartingWith => Self::StartingWith,
            Operator::EndingWith => Self::EndingWith,
            Operator::Containing | Operator::NotContaining => Self::Containing,
            _ => Self::None,
        }
    }

    /// Apply the transform. Only string values are rewritten.
    pub fn apply(self, value: &Value) -> Value {
        let Value::String(s) = value else {
            return value.clone();
        };
        match self {
            Self::None => value.clone(),
            Self::StartingWith => Value::String(format!("{s}%")),
            Self::EndingWith => Value::String(format!("%{s}")),
            Self::Containing => Value::String(format!("%{s}%")),
        }
    }
}

/// A placeholder and how the argument bound to it is transformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    /// 1-based placeholder index (`$index`).
    pub index: usize,
    /// Transform applied to the argument at position `index - 1`.
    pub transform: ArgumentTransform,
}

/// A boolean combination of criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// One criterion with its placeholder indices.
    Leaf {
        criterion: Criterion,
        placeholders: Vec<usize>,
    },
    /// Both sides must hold.
    And(Box<Predicate>, Box<Predicate>),
    /// Either side must hold.
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    /// Build a leaf, taking as many placeholders as the operator binds.
    pub fn from(criterion: Criterion, placeholders: &mut PlaceholderSequence) -> OqlResult<Self> {
        let placeholders = placeholders.take(criterion.arity())?;
        Ok(Predicate::Leaf {
            criterion,
            placeholders,
        })
    }

    /// `self AND other`
    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    /// `self OR other`
    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    /// Render the predicate with properties qualified by `alias`.
    pub fn render(&self, alias: &str) -> String {
        let mut out = String::new();
        self.write(alias, &mut out);
        out
    }

    fn write(&self, alias: &str, out: &mut String) {
        match self {
            Predicate::Leaf {
                criterion,
                placeholders,
            } => write_leaf(criterion, placeholders, alias, out),
            Predicate::And(left, right) => {
                left.write_operand_of_and(alias, out);
                out.push_str(" AND ");
                right.write_operand_of_and(alias, out);
            }
            Predicate::Or(left, right) => {
                left.write(alias, out);
                out.push_str(" OR ");
                right.write(alias, out);
            }
        }
    }

    // OR binds looser than AND in OQL.
    fn write_operand_of_and(&self, alias: &str, out: &mut String) {
        if matches!(self, Predicate::Or(..)) {
            out.push('(');
            self.write(alias, out);
            out.push(')');
        } else {
            self.write(alias, out);
        }
    }

    /// Leaves in left-to-right order.
    pub fn leaves(&self) -> Vec<(&Criterion, &[usize])> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<(&'a Criterion, &'a [usize])>) {
        match self {
            Predicate::Leaf {
                criterion,
                placeholders,
            } => out.push((criterion, placeholders)),
            Predicate::And(left, right) | Predicate::Or(left, right) => {
                left.collect_leaves(out);
                right.collect_leaves(out);
            }
        }
    }

    /// Number of placeholders across all leaves.
    pub fn placeholder_count(&self) -> usize {
        self.leaves().iter().map(|(_, p)| p.len()).sum()
    }

    /// Every placeholder in the tree with its argument transform, in
    /// left-to-right order.
    pub fn bindings(&self) -> Vec<Binding> {
        self.leaves()
            .into_iter()
            .flat_map(|(criterion, placeholders)| {
                let transform = ArgumentTransform::for_operator(criterion.operator());
                placeholders
                    .iter()
                    .map(move |&index| Binding { index, transform })
            })
            .collect()
    }
}

fn write_leaf(criterion: &Criterion, placeholders: &[usize], alias: &str, out: &mut String) {
    let property = criterion.property().render(alias);
    let p = |i: usize| placeholders.get(i).map_or_else(String::new, |n| format!("${n}"));

    let text = match criterion.operator() {
        Operator::Equals if criterion.is_ignore_case() => {
            format!("{property}.equalsIgnoreCase({})", p(0))
        }
        Operator::NotEquals if criterion.is_ignore_case() => {
            format!("NOT {property}.equalsIgnoreCase({})", p(0))
        }
        Operator::Equals => format!("{property} = {}", p(0)),
        Operator::NotEquals => format!("{property} != {}", p(0)),
        Operator::GreaterThan | Operator::After => format!("{property} > {}", p(0)),
        Operator::GreaterThanEqual => format!("{property} >= {}", p(0)),
        Operator::LessThan | Operator::Before => format!("{property} < {}", p(0)),
        Operator::LessThanEqual => format!("{property} <= {}", p(0)),
        Operator::Like | Operator::StartingWith | Operator::EndingWith | Operator::Containing => {
            format!("{property} LIKE {}", p(0))
        }
        Operator::NotLike | Operator::NotContaining => format!("NOT ({property} LIKE {})", p(0)),
        Operator::In => format!("{property} IN SET {}", p(0)),
        Operator::NotIn => format!("{property} NOT IN SET {}", p(0)),
        Operator::Between => format!("{property} >= {} AND {property} <= {}", p(0), p(1)),
        Operator::IsNull => format!("{property} = NULL"),
        Operator::IsNotNull => format!("{property} != NULL"),
        Operator::True => format!("{property} = true"),
        Operator::False => format!("{property} = false"),
    };
    out.push_str(&text);
}
