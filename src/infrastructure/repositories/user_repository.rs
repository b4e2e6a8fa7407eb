//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::domain::{DomainError, UserRepository};
use crate::models::user::{ActiveModel, Column, Entity as UserEntity, Model};
use crate::models::user_permission;

/// SeaORM-based implementation of UserRepository
pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<Model>, DomainError> {
        Ok(UserEntity::find()
            .filter(Column::Username.eq(username))
            .one(&self.db)
            .await?)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Model>, DomainError> {
        Ok(UserEntity::find_by_id(id).one(&self.db).await?)
    }

    async fn permissions(&self, user_id: i32) -> Result<Vec<String>, DomainError> {
        let grants = user_permission::Entity::find()
            .filter(user_permission::Column::UserId.eq(user_id))
            .order_by_asc(user_permission::Column::Codename)
            .all(&self.db)
            .await?;
        Ok(grants.into_iter().map(|g| g.codename).collect())
    }

    async fn create(
        &self,
        username: &str,
        password_hash: String,
        is_superuser: bool,
    ) -> Result<Model, DomainError> {
        if username.trim().is_empty() {
            return Err(DomainError::field("username", "This field is required."));
        }
        let taken = UserEntity::find()
            .filter(Column::Username.eq(username))
            .count(&self.db)
            .await?;
        if taken > 0 {
            return Err(DomainError::field(
                "username",
                "A user with that username already exists.",
            ));
        }

        let user = ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            is_superuser: Set(is_superuser),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(user)
    }

    async fn grant(&self, user_id: i32, codename: &str) -> Result<(), DomainError> {
        let grant = user_permission::ActiveModel {
            user_id: Set(user_id),
            codename: Set(codename.to_string()),
        };

        // Granting twice is a no-op.
        user_permission::Entity::insert(grant)
            .on_conflict(
                OnConflict::columns([
                    user_permission::Column::UserId,
                    user_permission::Column::Codename,
                ])
                .do_nothing()
                .to_owned(),
            )
            .do_nothing()
            .exec(&self.db)
            .await?;

        Ok(())
    }
}
