//! SeaORM implementation of LanguageRepository

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::domain::validation::validate_named;
use crate::domain::{DomainError, LanguageRepository, NamedDetail, NamedInput};
use crate::infrastructure::repositories::book_repository::summarize_books;
use crate::models::book;
use crate::models::language::{ActiveModel, Column, Entity as LanguageEntity, Model};

/// SeaORM-based implementation of LanguageRepository
pub struct SeaOrmLanguageRepository {
    db: DatabaseConnection,
}

impl SeaOrmLanguageRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn ensure_unique(&self, name: &str, exclude: Option<i32>) -> Result<(), DomainError> {
        let mut query = LanguageEntity::find().filter(Column::Name.eq(name));
        if let Some(id) = exclude {
            query = query.filter(Column::Id.ne(id));
        }
        if query.count(&self.db).await? > 0 {
            return Err(DomainError::field(
                "name",
                "Language with this Name already exists.",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl LanguageRepository for SeaOrmLanguageRepository {
    async fn find_all(&self) -> Result<Vec<Model>, DomainError> {
        Ok(LanguageEntity::find()
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await?)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<NamedDetail>, DomainError> {
        let Some(language) = LanguageEntity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let books = language
            .find_related(book::Entity)
            .order_by_asc(book::Column::Title)
            .all(&self.db)
            .await?;

        Ok(Some(NamedDetail {
            url: language.absolute_url(),
            id: language.id,
            name: language.name,
            books: summarize_books(&self.db, books).await?,
        }))
    }

    async fn create(&self, input: NamedInput) -> Result<Model, DomainError> {
        validate_named(&input)?;
        let name = input.name.trim().to_string();
        self.ensure_unique(&name, None).await?;

        let language = ActiveModel {
            name: Set(name),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::info!("Created language {} ({})", language.id, language.name);
        Ok(language)
    }

    async fn update(&self, id: i32, input: NamedInput) -> Result<Model, DomainError> {
        validate_named(&input)?;
        let name = input.name.trim().to_string();

        let existing = LanguageEntity::find_by_id(id)
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

        book::Entity::update_many()
            .col_expr(book::Column::LanguageId, Expr::value(Option::<i32>::None))
            .filter(book::Column::LanguageId.eq(id))
            .exec(&txn)
            .await?;

        let result = LanguageEntity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }
        txn.commit().await?;

        Ok(())
    }
}
