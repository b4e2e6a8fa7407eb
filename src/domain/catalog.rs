//! Pure catalog rules: overdue computation, genre summaries and pagination.

use chrono::NaiveDate;
use serde::Serialize;

use super::DomainError;

/// Page size shared by every paginated listing.
pub const PAGE_SIZE: u64 = 10;

/// Number of genres shown by [`display_genre`].
pub const DISPLAY_GENRE_LIMIT: usize = 3;

/// True iff a due date is set and falls strictly before `today`.
pub fn is_overdue(due_back: Option<NaiveDate>, today: NaiveDate) -> bool {
    matches!(due_back, Some(due) if due < today)
}

/// Comma-joined names of the first three genres, in the order given.
pub fn display_genre<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .take(DISPLAY_GENRE_LIMIT)
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One page of a listing, numbered from 1.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, number: u64, count: u64) -> Self {
        let num_pages = num_pages(count);
        Self {
            items,
            number,
            num_pages,
            count,
            has_next: number < num_pages,
            has_previous: number > 1,
        }
    }
}

/// An empty listing still has a single (empty) first page.
pub fn num_pages(count: u64) -> u64 {
    count.div_ceil(PAGE_SIZE).max(1)
}

/// Rejects page numbers outside `1..=num_pages` as not found.
pub fn check_page(number: u64, count: u64) -> Result<(), DomainError> {
    if number == 0 || number > num_pages(count) {
        return Err(DomainError::NotFound);
    }
    Ok(())
}

/// Aggregate figures shown on the catalog home page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogCounts {
    pub num_books: u64,
    pub num_instances: u64,
    pub num_instances_available: u64,
    pub num_authors: u64,
    pub num_genres: u64,
    pub num_books_the: u64,
}
