//! Page slicing over already-ordered records and the response envelopes
//! built from it.
//!
//! # Design
//! - Out-of-range page numbers (below 1 or past the end) resolve to the last
//!   page, and an empty list still has one (empty) page.
//! - Cursor pages expect records sorted by descending id; a cursor restarts
//!   paging at page 1 below that id.

use serde::Serialize;

/// Page size used when callers do not pick one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Splits a slice into fixed-size pages.
#[derive(Debug, Clone, Copy)]
pub struct Paginator<'a, T> {
    items: &'a [T],
    page_size: usize,
}

/// One resolved page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<'a, T> {
    /// 1-based page number actually served.
    pub number: usize,
    /// Records on this page.
    pub items: &'a [T],
    /// Whether a later page exists.
    pub has_next: bool,
    /// Whether an earlier page exists.
    pub has_previous: bool,
}

impl<'a, T> Paginator<'a, T> {
    /// Paginate `items`; a zero page size is treated as one.
    #[must_use]
    pub fn new(items: &'a [T], page_size: usize) -> Self {
        Self {
            items,
            page_size: page_size.max(1),
        }
    }

    /// Total number of records.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.items.len()
    }

    /// Number of pages, never less than one.
    #[must_use]
    pub const fn num_pages(&self) -> usize {
        if self.items.is_empty() {
            1
        } else {
            self.items.len().div_ceil(self.page_size)
        }
    }

    /// Page `number`, clamped to the last page when out of range.
    #[must_use]
    pub fn get_page(&self, number: i64) -> Page<'a, T> {
        let last = self.num_pages();
        let number = usize::try_from(number)
            .ok()
            .filter(|number| (1..=last).contains(number))
            .unwrap_or(last);
        let start = (number - 1) * self.page_size;
        let end = (start + self.page_size).min(self.items.len());
        let items = self.items.get(start..end).unwrap_or_default();
        Page {
            number,
            items,
            has_next: number < last,
            has_previous: number > 1,
        }
    }
}

/// Infinite-scroll page: records plus the id to continue from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CursorPage<T, I> {
    /// Whether more records follow.
    pub has_next: bool,
    /// Records on this page.
    pub data: Vec<T>,
    /// Id of the last record on this page.
    pub last_id: Option<I>,
}

/// Back-office page: records plus the total count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminPage<T> {
    /// Records on this page.
    pub data: Vec<T>,
    /// Total number of records across all pages.
    pub total: usize,
}

/// Build a [`CursorPage`] from records sorted by descending id.
///
/// With `start_id` set, only records whose id is below it are considered and
/// `page_number` is reset to 1.
#[must_use]
pub fn cursor_page<T, I, F>(
    items: &[T],
    id_of: F,
    start_id: Option<I>,
    page_number: i64,
    page_size: usize,
) -> CursorPage<T, I>
where
    T: Clone,
    I: PartialOrd,
    F: Fn(&T) -> I,
{
    let (scoped, page_number) = match start_id {
        Some(cursor) => {
            let offset = items
                .iter()
                .position(|item| id_of(item) < cursor)
                .unwrap_or(items.len());
            (&items[offset..], 1)
        }
        None => (items, page_number),
    };
    let page = Paginator::new(scoped, page_size).get_page(page_number);
    CursorPage {
        has_next: page.has_next,
        data: page.items.to_vec(),
        last_id: page.items.last().map(&id_of),
    }
}

/// Build an [`AdminPage`] for `page_number`.
#[must_use]
pub fn admin_page<T: Clone>(items: &[T], page_number: i64, page_size: usize) -> AdminPage<T> {
    let paginator = Paginator::new(items, page_size);
    AdminPage {
        data: paginator.get_page(page_number).items.to_vec(),
        total: paginator.count(),
    }
}
