use chrono::{Duration, Local, NaiveDate};

use crate::auth::hash_password;
use crate::domain::{
    AuthorInput, BookInput, BookInstanceInput, DomainError, NamedInput,
};
use crate::infrastructure::AppState;

const LIBRARIAN_CAPABILITIES: [&str; 4] = [
    "add_author",
    "change_author",
    "delete_author",
    "can_mark_returned",
];

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Fills an empty catalog with a small demo library. Does nothing when books already exist.
pub async fn seed_demo_data(state: &AppState) -> Result<(), DomainError> {
    if state.book_repo.count().await? > 0 {
        tracing::info!("Catalog already populated, skipping demo data");
        return Ok(());
    }

    // 1. Users
    let admin_password = hash_password("admin").map_err(DomainError::Internal)?;
    let librarian_password = hash_password("librarian").map_err(DomainError::Internal)?;
    let reader_password = hash_password("reader").map_err(DomainError::Internal)?;

    if state.user_repo.find_by_username("admin").await?.is_none() {
        state.user_repo.create("admin", admin_password, true).await?;
    }
    let librarian = match state.user_repo.find_by_username("librarian").await? {
        Some(user) => user,
        None => {
            state
                .user_repo
                .create("librarian", librarian_password, false)
                .await?
        }
    };
    for codename in LIBRARIAN_CAPABILITIES {
        state.user_repo.grant(librarian.id, codename).await?;
    }
    let reader = match state.user_repo.find_by_username("reader").await? {
        Some(user) => user,
        None => state.user_repo.create("reader", reader_password, false).await?,
    };

    // 2. Genres and languages
    let mut genres = Vec::new();
    for name in ["Fantasy", "Science Fiction", "Classic"] {
        let genre = state
            .genre_repo
            .create(NamedInput {
                name: name.to_string(),
            })
            .await?;
        genres.push(genre.id);
    }

    let english = state
        .language_repo
        .create(NamedInput {
            name: "English".to_string(),
        })
        .await?;

    // 3. Authors
    let tolkien = state
        .author_repo
        .create(AuthorInput {
            first_name: "John Ronald Reuel".to_string(),
            last_name: "Tolkien".to_string(),
            date_of_birth: date(1892, 1, 3),
            date_of_death: date(1973, 9, 2),
        })
        .await?;
    let herbert = state
        .author_repo
        .create(AuthorInput {
            first_name: "Frank".to_string(),
            last_name: "Herbert".to_string(),
            date_of_birth: date(1920, 10, 8),
            date_of_death: date(1986, 2, 11),
        })
        .await?;

    // 4. Books
    let hobbit = state
        .book_repo
        .create(BookInput {
            title: "The Hobbit".to_string(),
            summary: "Bilbo Baggins is swept into a quest for a dragon's hoard.".to_string(),
            isbn: "9780547928227".to_string(),
            author_id: Some(tolkien.id),
            language_id: Some(english.id),
            genre_ids: vec![genres[0], genres[2]],
        })
        .await?;
    let dune = state
        .book_repo
        .create(BookInput {
            title: "Dune".to_string(),
            summary: "Paul Atreides comes of age on the desert planet Arrakis.".to_string(),
            isbn: "9780441172719".to_string(),
            author_id: Some(herbert.id),
            language_id: Some(english.id),
            genre_ids: vec![genres[1]],
        })
        .await?;

    // 5. Copies: one on the shelf, one on loan to the reader
    let today = Local::now().date_naive();
    state
        .instance_repo
        .create(BookInstanceInput {
            book_id: Some(hobbit.id),
            imprint: "Houghton Mifflin, 2012".to_string(),
            due_back: None,
            borrower_id: None,
            status: Some("a".to_string()),
        })
        .await?;
    state
        .instance_repo
        .create(BookInstanceInput {
            book_id: Some(dune.id),
            imprint: "Ace, 1990".to_string(),
            due_back: Some(today + Duration::weeks(2)),
            borrower_id: Some(reader.id),
            status: Some("o".to_string()),
        })
        .await?;

    tracing::info!("Seeded demo catalog: 2 books, 2 authors, 3 genres");
    Ok(())
}
