//! SeaORM implementation of GenreRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::domain::validation::validate_named;
use crate::domain::{DomainError, GenreRepository, NamedDetail, NamedInput};
use crate::infrastructure::repositories::book_repository::summarize_books;
use crate::models::genre::{ActiveModel, Column, Entity as GenreEntity, Model};
use crate::models::{book, book_genre};

/// SeaORM-based implementation of GenreRepository
pub struct SeaOrmGenreRepository {
    db: DatabaseConnection,
}

impl SeaOrmGenreRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn ensure_unique(&self, name: &str, exclude: Option<i32>) -> Result<(), DomainError> {
        let mut query = GenreEntity::find().filter(Column::Name.eq(name));
        if let Some(id) = exclude {
            query = query.filter(Column::Id.ne(id));
        }
        if query.count(&self.db).await? > 0 {
            return Err(DomainError::field(
                "name",
                "Genre with this Name already exists.",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl GenreRepository for SeaOrmGenreRepository {
    async fn find_all(&self) -> Result<Vec<Model>, DomainError> {
        Ok(GenreEntity::find()
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await?)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<NamedDetail>, DomainError> {
        let Some(genre) = GenreEntity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let books = genre
            .find_related(book::Entity)
            .order_by_asc(book::Column::Title)
            .all(&self.db)
            .await?;

        Ok(Some(NamedDetail {
            url: genre.absolute_url(),
            id: genre.id,
            name: genre.name,
            books: summarize_books(&self.db, books).await?,
        }))
    }

    async fn create(&self, input: NamedInput) -> Result<Model, DomainError> {
        validate_named(&input)?;
        let name = input.name.trim().to_string();
        self.ensure_unique(&name, None).await?;

        let genre = ActiveModel {
            name: Set(name),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::info!("Created genre {} ({})", genre.id, genre.name);
        Ok(genre)
    }

    async fn update(&self, id: i32, input: NamedInput) -> Result<Model, DomainError> {
        validate_named(&input)?;
        let name = input.name.trim().to_string();

        let existing = GenreEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;
        self.ensure_unique(&name, Some(id)).await?;

        let mut active: ActiveModel = existing.into();
        active.name = Set(name);
        Ok(active.update(&self.db).await?)
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;

        book_genre::Entity::delete_many()
            .filter(book_genre::Column::GenreId.eq(id))
            .exec(&txn)
            .await?;

        let result = GenreEntity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }
        txn.commit().await?;

        Ok(())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(GenreEntity::find().count(&self.db).await?)
    }
}
