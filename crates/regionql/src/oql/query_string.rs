//! Query text values and OQL extensions.
//!
//! [`QueryString`] is an immutable OQL text. Extension methods return a new
//! value and leave the text unchanged when it already carries the extension:
//!
//! | method | result |
//! |---|---|
//! | [`with_import`](QueryString::with_import) | `IMPORT <stmt>; <query>` |
//! | [`with_hints`](QueryString::with_hints) | `<HINT 'a', 'b'> <query>` |
//! | [`with_limit`](QueryString::with_limit) | `<query> LIMIT <n>` |
//! | [`with_trace`](QueryString::with_trace) | `<TRACE> <query>` |
//! | [`with_distinct`](QueryString::with_distinct) | `SELECT DISTINCT ...` |
//! | [`order_by`](QueryString::order_by) | `<query> ORDER BY p1 DESC, p2` |

use crate::error::{OqlError, OqlResult};
use crate::method::QueryMethodMetadata;
use crate::paging::Sort;
use regex::Regex;
use std::fmt;
use std::sync::{Arc, OnceLock};

fn import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bIMPORT\s+\S[^;]*;").expect("invalid built-in import regex"))
}

/// A quoted hint name; `'` inside the name is doubled.
const HINT_NAME: &str = r"'(?:[^']|'')*'";

fn hint_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)<HINT\s+{HINT_NAME}(?:\s*,\s*{HINT_NAME})*\s*>"))
            .expect("invalid built-in hint regex")
    })
}

fn limit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bLIMIT\s+\$?\d+").expect("invalid built-in limit regex"))
}

fn trailing_limit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\s+LIMIT\s+\$?\d+\s*$").expect("invalid built-in trailing limit regex")
    })
}

fn trace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<TRACE>").expect("invalid built-in trace regex"))
}

fn select_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Leading IMPORT, <HINT> and <TRACE> clauses may precede the SELECT.
        let prefix = format!(
            r"(?:\s*(?:IMPORT\s+[^;]*;|<HINT\s+{HINT_NAME}(?:\s*,\s*{HINT_NAME})*\s*>|<TRACE>))*"
        );
        Regex::new(&format!(r"(?i)^({prefix}\s*SELECT\b)(\s+DISTINCT\b)?"))
            .expect("invalid built-in select regex")
    })
}

fn order_by_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bORDER\s+BY\b").expect("invalid built-in order by regex"))
}

/// An immutable OQL query text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryString {
    text: String,
}

impl QueryString {
    /// Wrap query text. Blank text is rejected.
    pub fn new(text: impl Into<String>) -> OqlResult<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(OqlError::validation("Query is required"));
        }
        Ok(Self { text })
    }

    pub(crate) fn from_text(text: String) -> Self {
        Self { text }
    }

    /// The query text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consume into the query text.
    pub fn into_string(self) -> String {
        self.text
    }

    /// Whether the text contains an `IMPORT` statement.
    pub fn has_import(&self) -> bool {
        import_re().is_match(&self.text)
    }

    /// Whether the text contains a `<HINT ...>` clause.
    pub fn has_hints(&self) -> bool {
        hint_re().is_match(&self.text)
    }

    /// Whether the text contains a `LIMIT` clause.
    pub fn has_limit(&self) -> bool {
        limit_re().is_match(&self.text)
    }

    /// Whether the text contains `<TRACE>`.
    pub fn has_trace(&self) -> bool {
        trace_re().is_match(&self.text)
    }

    /// Whether the text contains an `ORDER BY` clause.
    pub fn has_order_by(&self) -> bool {
        order_by_re().is_match(&self.text)
    }

    /// `IMPORT <statement>; <query>`
    pub fn with_import(&self, statement: &str) -> Self {
        let statement = statement.trim().trim_end_matches(';').trim_end();
        if statement.is_empty() || self.has_import() {
            return self.clone();
        }
        Self::from_text(format!("IMPORT {statement}; {}", self.text))
    }

    /// `<HINT 'a', 'b'> <query>`
    ///
    /// A `'` inside a hint name is written as `''`.
    pub fn with_hints<S: AsRef<str>>(&self, hints: &[S]) -> Self {
        let hints: Vec<String> = hints
            .iter()
            .map(|h| h.as_ref().trim())
            .filter(|h| !h.is_empty())
            .map(|h| format!("'{}'", h.replace('\'', "''")))
            .collect();
        if hints.is_empty() || self.has_hints() {
            return self.clone();
        }
        Self::from_text(format!("<HINT {}> {}", hints.join(", "), self.text))
    }

    /// `<query> LIMIT <n>`
    pub fn with_limit(&self, limit: usize) -> Self {
        if self.has_limit() {
            return self.clone();
        }
        Self::from_text(format!("{} LIMIT {limit}", self.text))
    }

    /// `<TRACE> <query>`
    pub fn with_trace(&self) -> Self {
        if self.has_trace() {
            return self.clone();
        }
        Self::from_text(format!("<TRACE> {}", self.text))
    }

    /// Insert `DISTINCT` after the first `SELECT`, skipping leading `IMPORT`,
    /// `<HINT>` and `<TRACE>` clauses.
    pub fn with_distinct(&self) -> Self {
        let Some(caps) = select_re().captures(&self.text) else {
            return self.clone();
        };
        if caps.get(2).is_some() {
            return self.clone();
        }
        let Some(select) = caps.get(1) else {
            return self.clone();
        };
        let (head, tail) = self.text.split_at(select.end());
        Self::from_text(format!("{head} DISTINCT{tail}"))
    }

    /// Append `ORDER BY` for `sort`.
    ///
    /// Unsorted input or text that already orders its results is returned
    /// unchanged. A trailing `LIMIT` stays last.
    pub fn order_by(&self, sort: &Sort) -> Self {
        if sort.is_empty() || self.has_order_by() {
            return self.clone();
        }
        let clause = sort.to_oql();
        match trailing_limit_re().find(&self.text) {
            Some(limit) => {
                let (head, tail) = self.text.split_at(limit.start());
                Self::from_text(format!("{head} {clause}{tail}"))
            }
            None => Self::from_text(format!("{} {clause}", self.text)),
        }
    }
}

impl fmt::Display for QueryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for QueryString {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// A [`QueryString`] bound to the metadata of the query method that produced
/// it. Wrapping never changes the text.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedQueryString {
    query: QueryString,
    method: Option<Arc<QueryMethodMetadata>>,
}

impl PagedQueryString {
    /// Wrap a query without method metadata.
    pub fn of(query: QueryString) -> Self {
        Self {
            query,
            method: None,
        }
    }

    /// Bind the metadata of the query method this text belongs to.
    pub fn with_method(mut self, method: Arc<QueryMethodMetadata>) -> Self {
        self.method = Some(method);
        self
    }

    /// The wrapped query.
    pub fn query(&self) -> &QueryString {
        &self.query
    }

    /// The query text.
    pub fn as_str(&self) -> &str {
        self.query.as_str()
    }

    /// Metadata of the originating query method, if bound.
    pub fn method(&self) -> Option<&QueryMethodMetadata> {
        self.method.as_deref()
    }

    /// Consume into the wrapped query.
    pub fn into_query(self) -> QueryString {
        self.query
    }
}

impl From<QueryString> for PagedQueryString {
    fn from(query: QueryString) -> Self {
        Self::of(query)
    }
}

impl fmt::Display for PagedQueryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.query, f)
    }
}
