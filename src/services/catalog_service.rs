//! Catalog Service - home page figures and loan renewal, without the HTTP layer

use chrono::{Duration, NaiveDate};

use crate::domain::validation::{RENEWAL_DEFAULT_WEEKS, validate_renewal};
use crate::domain::{BookInstanceView, CatalogCounts, DomainError};
use crate::infrastructure::AppState;
use crate::models::LoanStatus;

/// Substring counted by `num_books_the`.
const TITLE_PROBE: &str = "the";

/// Computes the home page figures. Nothing is cached; every call hits the store.
pub async fn catalog_counts(state: &AppState) -> Result<CatalogCounts, DomainError> {
    Ok(CatalogCounts {
        num_books: state.book_repo.count().await?,
        num_instances: state.instance_repo.count().await?,
        num_instances_available: state
            .instance_repo
            .count_by_status(LoanStatus::Available)
            .await?,
        num_authors: state.author_repo.count().await?,
        num_genres: state.genre_repo.count().await?,
        num_books_the: state.book_repo.count_title_contains(TITLE_PROBE).await?,
    })
}

/// Date suggested on the renewal form.
pub fn proposed_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::weeks(RENEWAL_DEFAULT_WEEKS)
}

/// Moves a copy's due date after checking the renewal window.
pub async fn renew_loan(
    state: &AppState,
    instance_id: &str,
    renewal_date: NaiveDate,
    today: NaiveDate,
) -> Result<BookInstanceView, DomainError> {
    if state.instance_repo.find_by_id(instance_id).await?.is_none() {
        return Err(DomainError::NotFound);
    }
    validate_renewal(renewal_date, today)?;
    state.instance_repo.renew(instance_id, renewal_date).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposes_three_weeks_out() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            proposed_renewal_date(today),
            NaiveDate::from_ymd_opt(2024, 1, 22).unwrap()
        );
    }
}
