//! SeaORM implementation of BookRepository

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;

use crate::domain::catalog::{self, Page};
use crate::domain::validation::validate_book;
use crate::domain::{
    AuthorRef, BookDetail, BookInput, BookRepository, BookSummary, DomainError, PAGE_SIZE,
};
use crate::infrastructure::repositories::book_instance_repository::instance_views;
use crate::models::book::{ActiveModel, Column, Entity as BookEntity, Model};
use crate::models::{author, book_genre, book_instance, genre, language};

/// SeaORM-based implementation of BookRepository
pub struct SeaOrmBookRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn check_references<C: ConnectionTrait>(
        db: &C,
        id: Option<i32>,
        input: &BookInput,
    ) -> Result<(), DomainError> {
        let mut duplicate = BookEntity::find().filter(Column::Isbn.eq(input.isbn.as_str()));
        if let Some(id) = id {
            duplicate = duplicate.filter(Column::Id.ne(id));
        }
        if duplicate.count(db).await? > 0 {
            return Err(DomainError::field(
                "isbn",
                "Book with this ISBN already exists.",
            ));
        }

        if let Some(author_id) = input.author_id
            && author::Entity::find_by_id(author_id).one(db).await?.is_none()
        {
            return Err(DomainError::field("author_id", "Select a valid author."));
        }

        if let Some(language_id) = input.language_id
            && language::Entity::find_by_id(language_id)
                .one(db)
                .await?
                .is_none()
        {
            return Err(DomainError::field("language_id", "Select a valid language."));
        }

        let known = genre::Entity::find()
            .filter(genre::Column::Id.is_in(input.genre_ids.clone()))
            .count(db)
            .await?;
        let mut requested = input.genre_ids.clone();
        requested.sort_unstable();
        requested.dedup();
        if known != requested.len() as u64 {
            return Err(DomainError::field("genre_ids", "Select valid genres."));
        }

        Ok(())
    }

    /// Replaces the genre set, keeping the order the caller listed them in.
    async fn replace_genres<C: ConnectionTrait>(
        db: &C,
        book_id: i32,
        genre_ids: &[i32],
    ) -> Result<(), DomainError> {
        book_genre::Entity::delete_many()
            .filter(book_genre::Column::BookId.eq(book_id))
            .exec(db)
            .await?;

        let mut seen = Vec::with_capacity(genre_ids.len());
        for &genre_id in genre_ids {
            if seen.contains(&genre_id) {
                continue;
            }
            seen.push(genre_id);
            book_genre::ActiveModel {
                book_id: Set(book_id),
                genre_id: Set(genre_id),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
        Ok(())
    }
}

/// Genres of a book in association order.
pub(crate) async fn genres_of<C: ConnectionTrait>(
    db: &C,
    book_id: i32,
) -> Result<Vec<genre::Model>, DomainError> {
    let rows = book_genre::Entity::find()
        .filter(book_genre::Column::BookId.eq(book_id))
        .order_by_asc(book_genre::Column::Id)
        .find_also_related(genre::Entity)
        .all(db)
        .await?;

    Ok(rows.into_iter().filter_map(|(_, genre)| genre).collect())
}

/// Builds listing rows, fetching the authors in a single query.
pub(crate) async fn summarize_books<C: ConnectionTrait>(
    db: &C,
    books: Vec<Model>,
) -> Result<Vec<BookSummary>, DomainError> {
    let author_ids: Vec<i32> = books.iter().filter_map(|b| b.author_id).collect();

    let mut authors: HashMap<i32, author::Model> = HashMap::new();
    if !author_ids.is_empty() {
        for a in author::Entity::find()
            .filter(author::Column::Id.is_in(author_ids))
            .all(db)
            .await?
        {
            authors.insert(a.id, a);
        }
    }

    Ok(books
        .into_iter()
        .map(|book| BookSummary {
            url: book.absolute_url(),
            author: book
                .author_id
                .and_then(|id| authors.get(&id).cloned())
                .map(AuthorRef::from),
            id: book.id,
            title: book.title,
        })
        .collect())
}

#[async_trait]
impl BookRepository for SeaOrmBookRepository {
    async fn find_page(&self, page: u64) -> Result<Page<BookSummary>, DomainError> {
        let paginator = BookEntity::find()
            .order_by_asc(Column::Id)
            .paginate(&self.db, PAGE_SIZE);

        let total = paginator.num_items().await?;
        catalog::check_page(page, total)?;

        let books = paginator.fetch_page(page - 1).await?;
        let items = summarize_books(&self.db, books).await?;

        Ok(Page::new(items, page, total))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<BookDetail>, DomainError> {
        let Some(model) = BookEntity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let author = model.find_related(author::Entity).one(&self.db).await?;
        let language = model.find_related(language::Entity).one(&self.db).await?;
        let genres = genres_of(&self.db, model.id).await?;
        let names: Vec<&str> = genres.iter().map(|g| g.name.as_str()).collect();
        let display_genre = catalog::display_genre(&names);

        let copies = model
            .find_related(book_instance::Entity)
            .order_by_asc(book_instance::Column::DueBack)
            .order_by_asc(book_instance::Column::Id)
            .all(&self.db)
            .await?;
        let instances = instance_views(&self.db, copies).await?;

        Ok(Some(BookDetail {
            url: model.absolute_url(),
            id: model.id,
            title: model.title,
            summary: model.summary,
            isbn: model.isbn,
            author: author.map(AuthorRef::from),
            language,
            genres,
            display_genre,
            instances,
        }))
    }

    async fn create(&self, input: BookInput) -> Result<Model, DomainError> {
        validate_book(&input)?;

        let txn = self.db.begin().await?;
        Self::check_references(&txn, None, &input).await?;

        let book = ActiveModel {
            title: Set(input.title.trim().to_string()),
            summary: Set(input.summary),
            isbn: Set(input.isbn),
            author_id: Set(input.author_id),
            language_id: Set(input.language_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        Self::replace_genres(&txn, book.id, &input.genre_ids).await?;
        txn.commit().await?;

        tracing::info!("Created book {} ({})", book.id, book.title);
        Ok(book)
    }

    async fn update(&self, id: i32, input: BookInput) -> Result<Model, DomainError> {
        validate_book(&input)?;

        let txn = self.db.begin().await?;
        let existing = BookEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(DomainError::NotFound)?;
        Self::check_references(&txn, Some(id), &input).await?;

        let mut active: ActiveModel = existing.into();
        active.title = Set(input.title.trim().to_string());
        active.summary = Set(input.summary);
        active.isbn = Set(input.isbn);
        active.author_id = Set(input.author_id);
        active.language_id = Set(input.language_id);
        let book = active.update(&txn).await?;

        Self::replace_genres(&txn, book.id, &input.genre_ids).await?;
        txn.commit().await?;

        Ok(book)
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;

        let book = BookEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(DomainError::NotFound)?;

        let copies = book_instance::Entity::find()
            .filter(book_instance::Column::BookId.eq(id))
            .count(&txn)
            .await?;
        if copies > 0 {
            tracing::warn!("Refusing to delete book {} with {} copies", id, copies);
            return Err(DomainError::Protected(format!(
                "Cannot delete book \"{}\": {} book instance(s) still reference it",
                book.title, copies
            )));
        }

        book_genre::Entity::delete_many()
            .filter(book_genre::Column::BookId.eq(id))
            .exec(&txn)
            .await?;
        BookEntity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        Ok(())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(BookEntity::find().count(&self.db).await?)
    }

    async fn count_title_contains(&self, needle: &str) -> Result<u64, DomainError> {
        let pattern = format!("%{}%", needle.to_lowercase());
        let count = BookEntity::find()
            .filter(Expr::expr(Func::lower(Expr::col(Column::Title))).like(pattern))
            .count(&self.db)
            .await?;
        Ok(count)
    }
}
