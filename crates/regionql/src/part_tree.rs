//! Derived method name parsing.
//!
//! A derived query method name such as
//! `findDistinctTop5ByLastnameAndAgeGreaterThanOrFirstnameIgnoreCaseOrderByAgeDesc`
//! is split into:
//!
//! - a subject (`Distinct`, `First`/`Top` limits),
//! - groups of criteria joined by `Or`, each group a list joined by `And`,
//! - a static `OrderBy` clause.
//!
//! Properties are kept as written in the name; resolving them against an
//! entity happens during compilation.

use crate::criteria::{IgnoreCaseMode, Operator};
use crate::error::{OqlError, OqlResult};
use crate::paging::Direction;
use regex::Regex;
use std::sync::OnceLock;

const QUERY_PREFIXES: &[&str] = &["find", "read", "get", "query", "search", "stream"];

/// Operator keywords in match order. The first keyword that is a suffix of a
/// part wins, so negated and longer forms come before the forms they end with.
const OPERATOR_KEYWORDS: &[(&str, Operator)] = &[
    ("IsNotNull", Operator::IsNotNull),
    ("NotNull", Operator::IsNotNull),
    ("IsNull", Operator::IsNull),
    ("Null", Operator::IsNull),
    ("IsBetween", Operator::Between),
    ("Between", Operator::Between),
    ("IsLessThanEqual", Operator::LessThanEqual),
    ("LessThanEqual", Operator::LessThanEqual),
    ("IsLessThan", Operator::LessThan),
    ("LessThan", Operator::LessThan),
    ("IsGreaterThanEqual", Operator::GreaterThanEqual),
    ("GreaterThanEqual", Operator::GreaterThanEqual),
    ("IsGreaterThan", Operator::GreaterThan),
    ("GreaterThan", Operator::GreaterThan),
    ("IsBefore", Operator::Before),
    ("Before", Operator::Before),
    ("IsAfter", Operator::After),
    ("After", Operator::After),
    ("IsNotLike", Operator::NotLike),
    ("NotLike", Operator::NotLike),
    ("IsLike", Operator::Like),
    ("Like", Operator::Like),
    ("IsStartingWith", Operator::StartingWith),
    ("StartingWith", Operator::StartingWith),
    ("StartsWith", Operator::StartingWith),
    ("IsEndingWith", Operator::EndingWith),
    ("EndingWith", Operator::EndingWith),
    ("EndsWith", Operator::EndingWith),
    ("IsNotContaining", Operator::NotContaining),
    ("NotContaining", Operator::NotContaining),
    ("NotContains", Operator::NotContaining),
    ("IsContaining", Operator::Containing),
    ("Containing", Operator::Containing),
    ("Contains", Operator::Containing),
    ("IsNotIn", Operator::NotIn),
    ("NotIn", Operator::NotIn),
    ("IsIn", Operator::In),
    ("In", Operator::In),
    ("IsTrue", Operator::True),
    ("True", Operator::True),
    ("IsFalse", Operator::False),
    ("False", Operator::False),
    ("IsNot", Operator::NotEquals),
    ("Not", Operator::NotEquals),
    ("Is", Operator::Equals),
    ("Equals", Operator::Equals),
];

fn prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(find|read|get|query|search|stream)(\p{Lu}.*?)??By")
            .expect("invalid built-in method prefix regex")
    })
}

fn limit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(First|Top)(\d*)").expect("invalid built-in limit regex")
    })
}

/// One criterion as written in a method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Property as written (`Lastname`, `Address_City`).
    pub property: String,
    /// Operator keyword found after the property.
    pub operator: Operator,
    /// Case sensitivity requested for this part.
    pub ignore_case: IgnoreCaseMode,
}

/// Criteria joined by `And`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrPart {
    parts: Vec<Part>,
}

impl OrPart {
    /// The `And`-joined criteria in name order.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }
}

/// A static sort key from an `OrderBy` clause, property as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPart {
    pub property: String,
    pub direction: Direction,
}

/// The parsed structure of a derived method name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartTree {
    distinct: bool,
    max_results: Option<usize>,
    groups: Vec<OrPart>,
    order: Vec<OrderPart>,
}

impl PartTree {
    /// Parse a derived method name.
    pub fn parse(name: &str) -> OqlResult<Self> {
        let invalid = |message: &str| OqlError::invalid_method_name(name, message);

        let Some(caps) = prefix_re().captures(name) else {
            return Self::parse_without_criteria(name);
        };
        let subject = caps.get(2).map_or("", |m| m.as_str());
        let predicate = &name[caps.get(0).map_or(0, |m| m.end())..];

        let mut tree = Self::default();
        tree.parse_subject(name, subject)?;

        let (criteria, order) = match split_keyword(predicate, "OrderBy").as_slice() {
            [criteria] => (*criteria, None),
            [criteria, order] => (*criteria, Some(*order)),
            _ => return Err(invalid("more than one OrderBy clause")),
        };

        let (criteria, all_ignore_case) = strip_all_ignore_case(criteria);
        if !criteria.is_empty() {
            for group in split_keyword(criteria, "Or") {
                let mut or_part = OrPart::default();
                for raw in split_keyword(group, "And") {
                    or_part.parts.push(parse_part(name, raw, all_ignore_case)?);
                }
                tree.groups.push(or_part);
            }
        } else if all_ignore_case {
            return Err(invalid("AllIgnoreCase without criteria"));
        }

        if let Some(order) = order {
            tree.order = parse_order(name, order)?;
        }
        Ok(tree)
    }

    /// Names with a query prefix but no `By` (`findAll`, `findTop10`).
    fn parse_without_criteria(name: &str) -> OqlResult<Self> {
        let prefix = QUERY_PREFIXES
            .iter()
            .find(|p| name.starts_with(*p))
            .ok_or_else(|| {
                OqlError::invalid_method_name(
                    name,
                    format!("expected one of the prefixes {}", QUERY_PREFIXES.join(", ")),
                )
            })?;
        let subject = &name[prefix.len()..];
        if subject.chars().next().is_some_and(|c| !c.is_uppercase()) {
            return Err(OqlError::invalid_method_name(
                name,
                "prefix must be followed by an uppercase word",
            ));
        }
        let mut tree = Self::default();
        tree.parse_subject(name, subject)?;
        Ok(tree)
    }

    fn parse_subject(&mut self, name: &str, subject: &str) -> OqlResult<()> {
        self.distinct = subject.contains("Distinct");
        if let Some(caps) = limit_re().captures(subject) {
            let digits = caps.get(2).map_or("", |m| m.as_str());
            let limit = if digits.is_empty() {
                1
            } else {
                digits.parse::<usize>().map_err(|_| {
                    OqlError::invalid_method_name(name, format!("invalid limit '{digits}'"))
                })?
            };
            if limit == 0 {
                return Err(OqlError::invalid_method_name(name, "limit must be positive"));
            }
            self.max_results = Some(limit);
        }
        Ok(())
    }

    /// Whether the subject requests `Distinct` results.
    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Limit requested with `First`/`Top`, if any.
    pub fn max_results(&self) -> Option<usize> {
        self.max_results
    }

    /// The `Or`-joined groups in name order.
    pub fn groups(&self) -> &[OrPart] {
        &self.groups
    }

    /// The static `OrderBy` keys.
    pub fn order(&self) -> &[OrderPart] {
        &self.order
    }

    /// Whether the name carries no criteria.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// All parts in name order.
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.groups.iter().flat_map(|g| g.parts.iter())
    }

    /// Number of method arguments consumed by all criteria.
    pub fn parameter_count(&self) -> usize {
        self.parts().map(|p| p.operator.arity()).sum()
    }
}

/// Split `text` at every `keyword` that follows an alphanumeric character and
/// is followed by an uppercase letter.
fn split_keyword<'a>(text: &'a str, keyword: &str) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut search = 0;
    while let Some(found) = text[search..].find(keyword) {
        let at = search + found;
        let end = at + keyword.len();
        let preceded = text[..at]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric());
        let followed = text[end..].chars().next().is_some_and(|c| c.is_uppercase());
        if preceded && followed {
            out.push(&text[start..at]);
            start = end;
            search = end;
        } else {
            search = at + 1;
        }
    }
    out.push(&text[start..]);
    out
}

fn strip_all_ignore_case(text: &str) -> (&str, bool) {
    for suffix in ["AllIgnoringCase", "AllIgnoreCase"] {
        if let Some(stripped) = text.strip_suffix(suffix) {
            return (stripped, true);
        }
    }
    (text, false)
}

fn parse_part(name: &str, raw: &str, all_ignore_case: bool) -> OqlResult<Part> {
    let mut text = raw;
    let mut ignore_case = if all_ignore_case {
        IgnoreCaseMode::WhenPossible
    } else {
        IgnoreCaseMode::Never
    };
    for suffix in ["IgnoringCase", "IgnoreCase"] {
        if let Some(stripped) = text.strip_suffix(suffix) {
            text = stripped;
            ignore_case = IgnoreCaseMode::Always;
            break;
        }
    }

    let (property, operator) = OPERATOR_KEYWORDS
        .iter()
        .find_map(|(kw, op)| text.strip_suffix(kw).map(|p| (p, *op)))
        .unwrap_or((text, Operator::Equals));

    if property.is_empty() {
        return Err(OqlError::invalid_method_name(
            name,
            format!("missing property in criterion '{raw}'"),
        ));
    }
    if !property.starts_with(|c: char| c.is_uppercase()) {
        return Err(OqlError::invalid_method_name(
            name,
            format!("property '{property}' must start with an uppercase letter"),
        ));
    }

    Ok(Part {
        property: property.to_string(),
        operator,
        ignore_case,
    })
}

/// Parse `FirstnameDescLastnameAge` style clauses. A direction keyword ends a
/// key only when it is followed by an uppercase letter or the end of input.
fn parse_order(name: &str, text: &str) -> OqlResult<Vec<OrderPart>> {
    let mut out = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let next = ["Desc", "Asc"]
            .iter()
            .filter_map(|kw| {
                let mut from = 1;
                while let Some(found) = rest.get(from..).and_then(|s| s.find(kw)) {
                    let at = from + found;
                    let end = at + kw.len();
                    if rest[end..]
                        .chars()
                        .next()
                        .is_none_or(|c| c.is_uppercase())
                    {
                        return Some((at, end, *kw));
                    }
                    from = at + 1;
                }
                None
            })
            .min_by_key(|(at, _, _)| *at);

        let (property, direction, consumed) = match next {
            Some((at, end, kw)) => {
                let dir = if kw == "Desc" {
                    Direction::Desc
                } else {
                    Direction::Asc
                };
                (&rest[..at], dir, end)
            }
            None => (rest, Direction::Asc, rest.len()),
        };

        if property.is_empty() || !property.starts_with(|c: char| c.is_uppercase()) {
            return Err(OqlError::invalid_method_name(
                name,
                format!("invalid OrderBy clause '{text}'"),
            ));
        }
        out.push(OrderPart {
            property: property.to_string(),
            direction,
        });
        rest = &rest[consumed..];
    }
    if out.is_empty() {
        return Err(OqlError::invalid_method_name(name, "empty OrderBy clause"));
    }
    Ok(out)
}
