//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::DomainError;
use super::catalog::Page;
use crate::models::{LoanStatus, author, book, genre, language, user};

/// Input for genres and languages, which only carry a name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NamedInput {
    pub name: String,
}

/// Input for creating or replacing an author
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthorInput {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

/// Input for creating or replacing a book; `genre_ids` replaces the whole genre set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookInput {
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author_id: Option<i32>,
    pub language_id: Option<i32>,
    pub genre_ids: Vec<i32>,
}

/// Input for creating or replacing a book instance
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookInstanceInput {
    pub book_id: Option<i32>,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    /// Status code (`"o"`) or name (`"on_loan"`); defaults to maintenance.
    pub status: Option<String>,
}

/// Author reference embedded in book payloads
#[derive(Debug, Clone, Serialize)]
pub struct AuthorRef {
    pub id: i32,
    pub name: String,
    pub url: String,
}

impl From<author::Model> for AuthorRef {
    fn from(model: author::Model) -> Self {
        Self {
            id: model.id,
            name: model.to_string(),
            url: model.absolute_url(),
        }
    }
}

/// Book row in listings
#[derive(Debug, Clone, Serialize)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author: Option<AuthorRef>,
    pub url: String,
}

/// A copy as shown to readers and staff
#[derive(Debug, Clone, Serialize)]
pub struct BookInstanceView {
    pub id: String,
    /// `"<uuid> (<book title>)"`
    pub display: String,
    pub book_id: Option<i32>,
    pub book_title: Option<String>,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub status_label: String,
    pub borrower: Option<String>,
    pub is_overdue: bool,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookDetail {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author: Option<AuthorRef>,
    pub language: Option<language::Model>,
    pub genres: Vec<genre::Model>,
    pub display_genre: String,
    pub instances: Vec<BookInstanceView>,
    pub url: String,
}

/// Author row in listings
#[derive(Debug, Clone, Serialize)]
pub struct AuthorSummary {
    pub id: i32,
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    pub url: String,
}

impl From<author::Model> for AuthorSummary {
    fn from(model: author::Model) -> Self {
        Self {
            id: model.id,
            name: model.to_string(),
            date_of_birth: model.date_of_birth,
            date_of_death: model.date_of_death,
            url: model.absolute_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorDetail {
    #[serde(flatten)]
    pub author: author::Model,
    pub name: String,
    pub books: Vec<BookSummary>,
    pub url: String,
}

/// Detail payload shared by genres and languages
#[derive(Debug, Clone, Serialize)]
pub struct NamedDetail {
    pub id: i32,
    pub name: String,
    pub books: Vec<BookSummary>,
    pub url: String,
}

/// Repository trait for Genre entity
#[async_trait]
pub trait GenreRepository: Send + Sync {
    /// All genres ordered by name
    async fn find_all(&self) -> Result<Vec<genre::Model>, DomainError>;

    /// A genre with the books filed under it
    async fn find_by_id(&self, id: i32) -> Result<Option<NamedDetail>, DomainError>;

    async fn create(&self, input: NamedInput) -> Result<genre::Model, DomainError>;

    async fn update(&self, id: i32, input: NamedInput) -> Result<genre::Model, DomainError>;

    /// Removes the genre and its book associations
    async fn delete(&self, id: i32) -> Result<(), DomainError>;

    async fn count(&self) -> Result<u64, DomainError>;
}

/// Repository trait for Language entity
#[async_trait]
pub trait LanguageRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<language::Model>, DomainError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<NamedDetail>, DomainError>;

    async fn create(&self, input: NamedInput) -> Result<language::Model, DomainError>;

    async fn update(&self, id: i32, input: NamedInput) -> Result<language::Model, DomainError>;

    /// Deletes the language; books written in it keep existing with no language
    async fn delete(&self, id: i32) -> Result<(), DomainError>;
}

/// Repository trait for Author entity
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// One page of authors ordered by (last_name, first_name)
    async fn find_page(&self, page: u64) -> Result<Page<AuthorSummary>, DomainError>;

    /// Find an author by ID, with their books
    async fn find_by_id(&self, id: i32) -> Result<Option<AuthorDetail>, DomainError>;

    /// Create a new author
    async fn create(&self, input: AuthorInput) -> Result<author::Model, DomainError>;

    async fn update(&self, id: i32, input: AuthorInput) -> Result<author::Model, DomainError>;

    /// Delete an author by ID; their books lose the author reference
    async fn delete(&self, id: i32) -> Result<(), DomainError>;

    async fn count(&self) -> Result<u64, DomainError>;
}

/// Repository trait for Book entity
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// One page of books ordered by ID
    async fn find_page(&self, page: u64) -> Result<Page<BookSummary>, DomainError>;

    /// Find a single book by ID with author, language, genres and copies
    async fn find_by_id(&self, id: i32) -> Result<Option<BookDetail>, DomainError>;

    /// Create a new book
    async fn create(&self, input: BookInput) -> Result<book::Model, DomainError>;

    /// Update an existing book, replacing its genre set
    async fn update(&self, id: i32, input: BookInput) -> Result<book::Model, DomainError>;

    /// Delete a book by ID; blocked while copies reference it
    async fn delete(&self, id: i32) -> Result<(), DomainError>;

    async fn count(&self) -> Result<u64, DomainError>;

    /// Books whose title contains `needle`, ignoring case
    async fn count_title_contains(&self, needle: &str) -> Result<u64, DomainError>;
}

/// Repository trait for BookInstance entity
#[async_trait]
pub trait BookInstanceRepository: Send + Sync {
    /// Every copy in default order: due_back ascending, unset first
    async fn find_all(&self) -> Result<Vec<BookInstanceView>, DomainError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<BookInstanceView>, DomainError>;

    /// Copies on loan, optionally restricted to one borrower, ordered by due_back
    async fn find_on_loan(
        &self,
        borrower_id: Option<i32>,
        page: u64,
    ) -> Result<Page<BookInstanceView>, DomainError>;

    /// Create a copy with a fresh UUID
    async fn create(&self, input: BookInstanceInput) -> Result<BookInstanceView, DomainError>;

    async fn update(
        &self,
        id: &str,
        input: BookInstanceInput,
    ) -> Result<BookInstanceView, DomainError>;

    /// Move the due date of an existing copy
    async fn renew(&self, id: &str, due_back: NaiveDate) -> Result<BookInstanceView, DomainError>;

    async fn delete(&self, id: &str) -> Result<(), DomainError>;

    async fn count(&self) -> Result<u64, DomainError>;

    async fn count_by_status(&self, status: LoanStatus) -> Result<u64, DomainError>;
}

/// Repository trait for users and their capabilities
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<user::Model>, DomainError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<user::Model>, DomainError>;

    /// Capability codenames granted directly to the user
    async fn permissions(&self, user_id: i32) -> Result<Vec<String>, DomainError>;

    async fn create(
        &self,
        username: &str,
        password_hash: String,
        is_superuser: bool,
    ) -> Result<user::Model, DomainError>;

    async fn grant(&self, user_id: i32, codename: &str) -> Result<(), DomainError>;
}
