//! SeaORM implementation of AuthorRepository

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::domain::catalog::{self, Page};
use crate::domain::validation::validate_author;
use crate::domain::{
    AuthorDetail, AuthorInput, AuthorRepository, AuthorSummary, DomainError, PAGE_SIZE,
};
use crate::infrastructure::repositories::book_repository::summarize_books;
use crate::models::author::{ActiveModel, Column, Entity as AuthorEntity, Model};
use crate::models::book;

/// SeaORM-based implementation of AuthorRepository
pub struct SeaOrmAuthorRepository {
    db: DatabaseConnection,
}

impl SeaOrmAuthorRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthorRepository for SeaOrmAuthorRepository {
    async fn find_page(&self, page: u64) -> Result<Page<AuthorSummary>, DomainError> {
        let paginator = AuthorEntity::find()
            .order_by_asc(Column::LastName)
            .order_by_asc(Column::FirstName)
            .order_by_asc(Column::Id)
            .paginate(&self.db, PAGE_SIZE);

        let total = paginator.num_items().await?;
        catalog::check_page(page, total)?;

        let authors = paginator.fetch_page(page - 1).await?;
        Ok(Page::new(
            authors.into_iter().map(AuthorSummary::from).collect(),
            page,
            total,
        ))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<AuthorDetail>, DomainError> {
        let Some(author) = AuthorEntity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let books = author
            .find_related(book::Entity)
            .order_by_asc(book::Column::Title)
            .all(&self.db)
            .await?;

        Ok(Some(AuthorDetail {
            name: author.to_string(),
            url: author.absolute_url(),
            books: summarize_books(&self.db, books).await?,
            author,
        }))
    }

    async fn create(&self, input: AuthorInput) -> Result<Model, DomainError> {
        validate_author(&input)?;

        let author = ActiveModel {
            first_name: Set(input.first_name.trim().to_string()),
            last_name: Set(input.last_name.trim().to_string()),
            date_of_birth: Set(input.date_of_birth),
            date_of_death: Set(input.date_of_death),
            ..Default::default()
        };

        let result = author.insert(&self.db).await?;
        tracing::info!("Created author {} ({})", result.id, result);
        Ok(result)
    }

    async fn update(&self, id: i32, input: AuthorInput) -> Result<Model, DomainError> {
        validate_author(&input)?;

        let existing = AuthorEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        active.first_name = Set(input.first_name.trim().to_string());
        active.last_name = Set(input.last_name.trim().to_string());
        active.date_of_birth = Set(input.date_of_birth);
        active.date_of_death = Set(input.date_of_death);

        Ok(active.update(&self.db).await?)
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;

        // Books outlive their author.
        let orphaned = book::Entity::update_many()
            .col_expr(book::Column::AuthorId, Expr::value(Option::<i32>::None))
            .filter(book::Column::AuthorId.eq(id))
            .exec(&txn)
            .await?;

        let result = AuthorEntity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }
        txn.commit().await?;

        tracing::info!(
            "Deleted author {}; cleared author on {} book(s)",
            id,
            orphaned.rows_affected
        );
        Ok(())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(AuthorEntity::find().count(&self.db).await?)
    }
}
