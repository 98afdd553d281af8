//! Safe OQL identifier handling.
//!
//! This module provides [`PropertyPath`], a validated (possibly nested) property
//! reference such as `lastname` or `address.city`, and [`RegionPath`], the name
//! of a region addressed in a `FROM` clause.
//!
//! - Property segments are validated against: `[A-Za-z_][A-Za-z0-9_$]*`
//! - Region segments allow `[A-Za-z0-9_.-]` and are separated by `/`
//!
//! # Example
//! ```ignore
//! use regionql::{PropertyPath, RegionPath};
//!
//! let p = PropertyPath::parse("address.city")?;
//! assert_eq!(p.render("x"), "x.address.city");
//!
//! let r = RegionPath::parse("/People")?;
//! assert_eq!(r.as_str(), "People");
//! # Ok::<(), regionql::OqlError>(())
//! ```

use crate::error::{OqlError, OqlResult};
use std::fmt;

/// A dotted property path on a region entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: Vec<String>,
}

impl PropertyPath {
    /// Parse a property path, validating every `.`-separated segment.
    pub fn parse(s: &str) -> OqlResult<Self> {
        if s.is_empty() {
            return Err(OqlError::validation("Property path cannot be empty"));
        }

        let mut segments = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !segments.is_empty() {
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(OqlError::validation(format!(
                                "Trailing '.' in property path '{s}'"
                            )));
                        }
                    }
                    Some(c) => {
                        return Err(OqlError::validation(format!(
                            "Expected '.' between property segments, got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let valid = if name.is_empty() {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c.is_ascii_alphanumeric()
                };
                if !valid {
                    return Err(OqlError::validation(format!(
                        "Invalid character '{c}' in property path '{s}'"
                    )));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(OqlError::validation(format!(
                    "Empty segment in property path '{s}'"
                )));
            }
            segments.push(name);
        }

        Ok(Self { segments })
    }

    /// The first segment (the property declared on the entity itself).
    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    /// All segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this path reaches into a nested object.
    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// Render the path qualified by a query alias, e.g. `x.address.city`.
    pub fn render(&self, alias: &str) -> String {
        let mut out = String::with_capacity(alias.len() + 1 + self.dotted_len());
        if !alias.is_empty() {
            out.push_str(alias);
            out.push('.');
        }
        self.write_dotted(&mut out);
        out
    }

    fn dotted_len(&self) -> usize {
        self.segments.iter().map(String::len).sum::<usize>() + self.segments.len() - 1
    }

    fn write_dotted(&self, out: &mut String) {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(seg);
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(self.dotted_len());
        self.write_dotted(&mut out);
        f.write_str(&out)
    }
}

/// The name of a region, without the leading `/` used in OQL `FROM` clauses.
///
/// Sub-regions are written with `/` separators (`Customers/Orders`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegionPath(String);

impl RegionPath {
    /// Parse a region name. A single leading `/` is accepted and dropped.
    pub fn parse(s: &str) -> OqlResult<Self> {
        let name = s.strip_prefix('/').unwrap_or(s);
        if name.trim().is_empty() {
            return Err(OqlError::validation("Region name cannot be empty"));
        }
        for seg in name.split('/') {
            if seg.is_empty() {
                return Err(OqlError::validation(format!(
                    "Empty segment in region name '{s}'"
                )));
            }
            if let Some(c) = seg
                .chars()
                .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
            {
                return Err(OqlError::validation(format!(
                    "Invalid character '{c}' in region name '{s}'"
                )));
            }
        }
        Ok(Self(name.to_string()))
    }

    /// The region name without a leading `/`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The region as addressed in a `FROM` clause (`/People`).
    pub fn to_oql(&self) -> String {
        format!("/{}", self.0)
    }
}

impl fmt::Display for RegionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Convert an input into a [`PropertyPath`].
///
/// This is mainly for ergonomics in builder APIs.
pub trait IntoPropertyPath {
    fn into_property_path(self) -> OqlResult<PropertyPath>;
}

impl IntoPropertyPath for PropertyPath {
    fn into_property_path(self) -> OqlResult<PropertyPath> {
        Ok(self)
    }
}

impl IntoPropertyPath for &PropertyPath {
    fn into_property_path(self) -> OqlResult<PropertyPath> {
        Ok(self.clone())
    }
}

impl IntoPropertyPath for &str {
    fn into_property_path(self) -> OqlResult<PropertyPath> {
        PropertyPath::parse(self)
    }
}

impl IntoPropertyPath for String {
    fn into_property_path(self) -> OqlResult<PropertyPath> {
        PropertyPath::parse(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_simple() {
        let p = PropertyPath::parse("lastname").unwrap();
        assert_eq!(p.render("x"), "x.lastname");
        assert!(!p.is_nested());
    }

    #[test]
    fn property_nested() {
        let p = PropertyPath::parse("address.city").unwrap();
        assert_eq!(p.render("x"), "x.address.city");
        assert_eq!(p.root(), "address");
        assert_eq!(p.to_string(), "address.city");
    }

    #[test]
    fn property_without_alias() {
        let p = PropertyPath::parse("age").unwrap();
        assert_eq!(p.render(""), "age");
    }

    #[test]
    fn property_with_dollar() {
        assert!(PropertyPath::parse("my_var$1").is_ok());
    }

    #[test]
    fn property_rejects_empty() {
        assert!(PropertyPath::parse("").is_err());
    }

    #[test]
    fn property_rejects_start_digit() {
        assert!(PropertyPath::parse("1name").is_err());
    }

    #[test]
    fn property_rejects_space() {
        assert!(PropertyPath::parse("last name").is_err());
    }

    #[test]
    fn property_rejects_double_dot() {
        assert!(PropertyPath::parse("address..city").is_err());
    }

    #[test]
    fn property_rejects_trailing_dot() {
        assert!(PropertyPath::parse("address.").is_err());
    }

    #[test]
    fn region_strips_leading_slash() {
        let r = RegionPath::parse("/People").unwrap();
        assert_eq!(r.as_str(), "People");
        assert_eq!(r.to_oql(), "/People");
    }

    #[test]
    fn region_allows_dash_and_subregions() {
        assert_eq!(RegionPath::parse("test-cq").unwrap().to_oql(), "/test-cq");
        assert_eq!(
            RegionPath::parse("Customers/Orders").unwrap().to_oql(),
            "/Customers/Orders"
        );
    }

    #[test]
    fn region_rejects_blank_and_spaces() {
        assert!(RegionPath::parse("").is_err());
        assert!(RegionPath::parse("/").is_err());
        assert!(RegionPath::parse("  ").is_err());
        assert!(RegionPath::parse("My Region").is_err());
        assert!(RegionPath::parse("a//b").is_err());
    }
}
