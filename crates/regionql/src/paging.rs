//! Sorting and client-side pagination.
//!
//! The query engine returns unordered, unpaged results. [`PagedResults`] slices
//! such a result collection into the page described by a [`PageRequest`],
//! materializing the source at most once per view.
//!
//! # Example
//! ```ignore
//! use regionql::{PageRequest, PagedResults};
//! use std::sync::Arc;
//!
//! let results = Arc::new(vec![1, 2, 3, 4, 5]);
//! let first = PagedResults::new(results, PageRequest::of(0, 2)?);
//! assert_eq!(first.as_list(), vec![1, 2]);
//!
//! let last = first.with(PageRequest::of(2, 2)?);
//! assert_eq!(last.as_list(), vec![5]);
//! # Ok::<(), regionql::OqlError>(())
//! ```

use crate::error::{OqlError, OqlResult};
use crate::ident::{IntoPropertyPath, PropertyPath};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::ops::Range;
use std::sync::{Arc, OnceLock};

// ==================== Sort ====================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Whether this is a descending sort.
    pub fn is_descending(self) -> bool {
        matches!(self, Direction::Desc)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        })
    }
}

/// A single sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    property: PropertyPath,
    direction: Direction,
}

impl Order {
    /// Create a sort key.
    pub fn new(property: PropertyPath, direction: Direction) -> Self {
        Self {
            property,
            direction,
        }
    }

    /// The sorted property.
    pub fn property(&self) -> &PropertyPath {
        &self.property
    }

    /// The sort direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    fn write_oql(&self, out: &mut String) {
        out.push_str(&self.property.to_string());
        if self.direction.is_descending() {
            out.push_str(" DESC");
        }
    }
}

/// An ordered list of sort keys.
///
/// # Example
/// ```ignore
/// use regionql::Sort;
///
/// let sort = Sort::new().desc("lastname")?.asc("firstname")?;
/// assert_eq!(sort.to_oql(), "ORDER BY lastname DESC, firstname");
/// # Ok::<(), regionql::OqlError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    /// Create an empty (unsorted) sort.
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias for [`Sort::new`].
    pub fn unsorted() -> Self {
        Self::default()
    }

    /// Create a sort from existing keys.
    pub fn by(orders: impl IntoIterator<Item = Order>) -> Self {
        Self {
            orders: orders.into_iter().collect(),
        }
    }

    /// Add an ascending key (validated property path).
    pub fn asc(mut self, property: impl IntoPropertyPath) -> OqlResult<Self> {
        self.orders
            .push(Order::new(property.into_property_path()?, Direction::Asc));
        Ok(self)
    }

    /// Add a descending key (validated property path).
    pub fn desc(mut self, property: impl IntoPropertyPath) -> OqlResult<Self> {
        self.orders
            .push(Order::new(property.into_property_path()?, Direction::Desc));
        Ok(self)
    }

    /// Append the keys of `other` after the keys of `self`.
    pub fn and(mut self, other: &Sort) -> Self {
        self.orders.extend(other.orders.iter().cloned());
        self
    }

    /// Whether no keys are set.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Iterate over the keys in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Order> {
        self.orders.iter()
    }

    /// Render as an OQL `ORDER BY` clause, or an empty string when unsorted.
    ///
    /// Ascending is the OQL default and is not written out.
    pub fn to_oql(&self) -> String {
        if self.orders.is_empty() {
            return String::new();
        }
        let mut out = String::from("ORDER BY ");
        for (i, order) in self.orders.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            order.write_oql(&mut out);
        }
        out
    }
}

impl<'a> IntoIterator for &'a Sort {
    type Item = &'a Order;
    type IntoIter = std::slice::Iter<'a, Order>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.iter()
    }
}

// ==================== PageRequest ====================

/// A request for one page of results: zero-based page number, page size, and
/// an optional sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    size: usize,
    sort: Sort,
}

impl PageRequest {
    /// Create a page request.
    ///
    /// Page numbers start at 0. Returns error if `page < 0` or `size <= 0`.
    pub fn of(page: i64, size: i64) -> OqlResult<Self> {
        if page < 0 {
            return Err(OqlError::validation(format!(
                "page number must be >= 0, got {page}"
            )));
        }
        if size <= 0 {
            return Err(OqlError::validation(format!(
                "page size must be > 0, got {size}"
            )));
        }
        let page = usize::try_from(page)
            .map_err(|_| OqlError::validation(format!("page number out of range: {page}")))?;
        let size = usize::try_from(size)
            .map_err(|_| OqlError::validation(format!("page size out of range: {size}")))?;
        Ok(Self {
            page,
            size,
            sort: Sort::default(),
        })
    }

    /// Attach a sort to this request.
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// Zero-based page number.
    pub fn page_number(&self) -> usize {
        self.page
    }

    /// Number of elements per page.
    pub fn page_size(&self) -> usize {
        self.size
    }

    /// The attached sort.
    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// Index of the first element of this page.
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }

    /// Index range of this page within a collection of `total` elements.
    ///
    /// Pages past the end yield an empty range.
    pub fn bounds(&self, total: usize) -> Range<usize> {
        let start = self.offset().min(total);
        let end = start.saturating_add(self.size).min(total);
        start..end
    }

    /// The following page.
    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            size: self.size,
            sort: self.sort.clone(),
        }
    }

    /// The preceding page, or this page if it is the first.
    pub fn previous_or_first(&self) -> Self {
        Self {
            page: self.page.saturating_sub(1),
            size: self.size,
            sort: self.sort.clone(),
        }
    }

    /// Whether a preceding page exists.
    pub fn has_previous(&self) -> bool {
        self.page > 0
    }
}

// ==================== Results ====================

/// Raw, unordered results returned by a query engine.
pub trait SelectResults<T>: Send + Sync {
    /// Materialize all results.
    fn as_list(&self) -> Vec<T>;
}

impl<T: Clone + Send + Sync> SelectResults<T> for Vec<T> {
    fn as_list(&self) -> Vec<T> {
        self.clone()
    }
}

#[derive(Debug)]
struct Slice<T> {
    items: Vec<T>,
    total: usize,
}

/// One page of a [`SelectResults`] source.
///
/// The source is materialized on the first call to [`as_list`](Self::as_list),
/// [`as_slice`](Self::as_slice), [`as_set`](Self::as_set),
/// [`iter`](Self::iter), [`size`](Self::size) or [`to_page`](Self::to_page),
/// and the page slice is cached. Later calls reuse the cached slice.
pub struct PagedResults<T> {
    source: Arc<dyn SelectResults<T>>,
    page: PageRequest,
    paged: OnceLock<Slice<T>>,
}

impl<T> PagedResults<T> {
    /// Create a paged view over `source`.
    pub fn new(source: Arc<dyn SelectResults<T>>, page: PageRequest) -> Self {
        Self {
            source,
            page,
            paged: OnceLock::new(),
        }
    }

    /// A new view of another page over the same source, with its own cache.
    pub fn with(&self, page: PageRequest) -> Self {
        Self::new(Arc::clone(&self.source), page)
    }

    /// The page this view describes.
    pub fn page_request(&self) -> &PageRequest {
        &self.page
    }

    fn slice(&self) -> &Slice<T> {
        self.paged.get_or_init(|| {
            let mut all = self.source.as_list();
            let total = all.len();
            let range = self.page.bounds(total);
            all.truncate(range.end);
            let items = all.split_off(range.start);
            Slice { items, total }
        })
    }

    /// The elements of this page.
    pub fn as_slice(&self) -> &[T] {
        &self.slice().items
    }

    /// Iterate over the elements of this page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.slice().items.iter()
    }

    /// Number of elements on this page.
    pub fn size(&self) -> usize {
        self.slice().items.len()
    }

    /// Whether this page is empty.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Number of elements in the whole source.
    pub fn total_elements(&self) -> usize {
        self.slice().total
    }
}

impl<T: Clone> PagedResults<T> {
    /// The elements of this page as an owned list.
    pub fn as_list(&self) -> Vec<T> {
        self.slice().items.clone()
    }

    /// Summarize this page together with its position in the whole result.
    pub fn to_page(&self) -> Page<T> {
        let slice = self.slice();
        let size = self.page.page_size();
        let total_pages = slice.total.div_ceil(size);
        let number = self.page.page_number();
        Page {
            content: slice.items.clone(),
            number,
            size,
            total_elements: slice.total,
            total_pages,
            has_next: number + 1 < total_pages,
            has_previous: number > 0,
        }
    }
}

impl<T: Clone + Eq + Hash> PagedResults<T> {
    /// The distinct elements of this page.
    pub fn as_set(&self) -> HashSet<T> {
        self.slice().items.iter().cloned().collect()
    }
}

impl<'a, T> IntoIterator for &'a PagedResults<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> fmt::Debug for PagedResults<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedResults")
            .field("page", &self.page)
            .field("materialized", &self.paged.get().is_some())
            .finish()
    }
}

/// A materialized page with navigation information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Elements on this page.
    pub content: Vec<T>,
    /// Zero-based page number.
    pub number: usize,
    /// Requested page size.
    pub size: usize,
    /// Number of elements across all pages.
    pub total_elements: usize,
    /// Number of pages.
    pub total_pages: usize,
    /// Whether a following page has content.
    pub has_next: bool,
    /// Whether a preceding page exists.
    pub has_previous: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        items: Vec<u32>,
        calls: AtomicUsize,
    }

    impl SelectResults<u32> for Counting {
        fn as_list(&self) -> Vec<u32> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.items.clone()
        }
    }

    fn five() -> Arc<dyn SelectResults<u32>> {
        Arc::new(vec![1u32, 2, 3, 4, 5])
    }

    #[test]
    fn page_request_rejects_invalid() {
        assert!(PageRequest::of(-1, 10).unwrap_err().is_validation());
        assert!(PageRequest::of(0, 0).unwrap_err().is_validation());
        assert!(PageRequest::of(0, -5).is_err());
        assert!(PageRequest::of(0, 1).is_ok());
    }

    #[test]
    fn page_request_navigation() {
        let p = PageRequest::of(1, 20).unwrap();
        assert_eq!(p.offset(), 20);
        assert_eq!(p.next().page_number(), 2);
        assert_eq!(p.previous_or_first().page_number(), 0);
        assert_eq!(p.previous_or_first().previous_or_first().page_number(), 0);
        assert!(p.has_previous());
    }

    #[test]
    fn bounds_clamp_to_total() {
        let p = PageRequest::of(2, 2).unwrap();
        assert_eq!(p.bounds(5), 4..5);
        assert_eq!(p.bounds(3), 3..3);
        assert_eq!(PageRequest::of(0, 10).unwrap().bounds(3), 0..3);
    }

    #[test]
    fn pages_over_five_elements() {
        let first = PagedResults::new(five(), PageRequest::of(0, 2).unwrap());
        assert_eq!(first.as_list(), vec![1, 2]);
        assert_eq!(first.with(PageRequest::of(1, 2).unwrap()).as_list(), vec![3, 4]);
        assert_eq!(first.with(PageRequest::of(2, 2).unwrap()).as_list(), vec![5]);
        assert!(first.with(PageRequest::of(3, 2).unwrap()).is_empty());
    }

    #[test]
    fn out_of_range_page_is_empty() {
        let results = PagedResults::new(five(), PageRequest::of(100, 10).unwrap());
        assert_eq!(results.size(), 0);
        assert_eq!(results.total_elements(), 5);
    }

    #[test]
    fn source_materialized_once_per_view() {
        let source = Arc::new(Counting {
            items: vec![1, 2, 3],
            calls: AtomicUsize::new(0),
        });
        let results = PagedResults::new(
            source.clone() as Arc<dyn SelectResults<u32>>,
            PageRequest::of(0, 2).unwrap(),
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        assert_eq!(results.size(), 2);
        assert_eq!(results.as_list(), vec![1, 2]);
        assert_eq!(results.iter().count(), 2);
        assert_eq!(results.as_set().len(), 2);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        let next = results.with(PageRequest::of(1, 2).unwrap());
        assert_eq!(next.as_list(), vec![3]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(results.as_list(), vec![1, 2]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn to_page_reports_navigation() {
        let results = PagedResults::new(five(), PageRequest::of(1, 2).unwrap());
        let page = results.to_page();
        assert_eq!(page.content, vec![3, 4]);
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);
        assert!(page.has_previous);

        let last = results.with(PageRequest::of(2, 2).unwrap()).to_page();
        assert!(!last.has_next);
    }

    #[test]
    fn sort_renders_order_by() {
        let sort = Sort::new().desc("lastname").unwrap().asc("firstname").unwrap();
        assert_eq!(sort.to_oql(), "ORDER BY lastname DESC, firstname");
        assert_eq!(Sort::unsorted().to_oql(), "");
    }

    #[test]
    fn sort_and_appends() {
        let a = Sort::new().asc("a").unwrap();
        let b = Sort::new().desc("b").unwrap();
        assert_eq!(a.and(&b).to_oql(), "ORDER BY a, b DESC");
    }

    #[test]
    fn sort_rejects_invalid_property() {
        assert!(Sort::new().asc("bad name").is_err());
    }
}
