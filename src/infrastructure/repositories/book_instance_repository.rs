//! SeaORM implementation of BookInstanceRepository

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;

use crate::domain::catalog::{self, Page};
use crate::domain::validation::validate_book_instance;
use crate::domain::{
    BookInstanceInput, BookInstanceRepository, BookInstanceView, DomainError, PAGE_SIZE,
};
use crate::models::book_instance::{ActiveModel, Column, Entity as InstanceEntity, Model};
use crate::models::{LoanStatus, book, user};

/// SeaORM-based implementation of BookInstanceRepository
pub struct SeaOrmBookInstanceRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookInstanceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn check_references(&self, input: &BookInstanceInput) -> Result<(), DomainError> {
        if let Some(book_id) = input.book_id
            && book::Entity::find_by_id(book_id).one(&self.db).await?.is_none()
        {
            return Err(DomainError::field("book_id", "Select a valid book."));
        }
        if let Some(borrower_id) = input.borrower_id
            && user::Entity::find_by_id(borrower_id)
                .one(&self.db)
                .await?
                .is_none()
        {
            return Err(DomainError::field("borrower_id", "Select a valid borrower."));
        }
        Ok(())
    }

    async fn view(&self, model: Model) -> Result<BookInstanceView, DomainError> {
        let mut views = instance_views(&self.db, vec![model]).await?;
        views.pop().ok_or(DomainError::NotFound)
    }
}

/// Builds display rows with book titles and borrower names, overdue evaluated against today.
pub(crate) async fn instance_views<C: ConnectionTrait>(
    db: &C,
    instances: Vec<Model>,
) -> Result<Vec<BookInstanceView>, DomainError> {
    let book_ids: Vec<i32> = instances.iter().filter_map(|i| i.book_id).collect();
    let borrower_ids: Vec<i32> = instances.iter().filter_map(|i| i.borrower_id).collect();

    let mut titles: HashMap<i32, String> = HashMap::new();
    if !book_ids.is_empty() {
        for b in book::Entity::find()
            .filter(book::Column::Id.is_in(book_ids))
            .all(db)
            .await?
        {
            titles.insert(b.id, b.title);
        }
    }

    let mut borrowers: HashMap<i32, String> = HashMap::new();
    if !borrower_ids.is_empty() {
        for u in user::Entity::find()
            .filter(user::Column::Id.is_in(borrower_ids))
            .all(db)
            .await?
        {
            borrowers.insert(u.id, u.username);
        }
    }

    let today = Local::now().date_naive();
    Ok(instances
        .into_iter()
        .map(|instance| {
            let book_title = instance.book_id.and_then(|id| titles.get(&id).cloned());
            BookInstanceView {
                display: instance.display_name(book_title.as_deref()),
                url: instance.absolute_url(),
                is_overdue: instance.is_overdue_on(today),
                book_title,
                borrower: instance
                    .borrower_id
                    .and_then(|id| borrowers.get(&id).cloned()),
                status_label: instance.status.label().to_string(),
                id: instance.id,
                book_id: instance.book_id,
                imprint: instance.imprint,
                due_back: instance.due_back,
                status: instance.status,
            }
        })
        .collect())
}

#[async_trait]
impl BookInstanceRepository for SeaOrmBookInstanceRepository {
    async fn find_all(&self) -> Result<Vec<BookInstanceView>, DomainError> {
        // SQLite sorts NULL before any date in ascending order.
        let instances = InstanceEntity::find()
            .order_by_asc(Column::DueBack)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;
        instance_views(&self.db, instances).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<BookInstanceView>, DomainError> {
        match InstanceEntity::find_by_id(id.to_string()).one(&self.db).await? {
            Some(model) => Ok(Some(self.view(model).await?)),
            None => Ok(None),
        }
    }

    async fn find_on_loan(
        &self,
        borrower_id: Option<i32>,
        page: u64,
    ) -> Result<Page<BookInstanceView>, DomainError> {
        let mut query = InstanceEntity::find().filter(Column::Status.eq(LoanStatus::OnLoan));
        if let Some(borrower_id) = borrower_id {
            query = query.filter(Column::BorrowerId.eq(borrower_id));
        }

        let paginator = query
            .order_by_asc(Column::DueBack)
            .order_by_asc(Column::Id)
            .paginate(&self.db, PAGE_SIZE);

        let total = paginator.num_items().await?;
        catalog::check_page(page, total)?;

        let instances = paginator.fetch_page(page - 1).await?;
        let items = instance_views(&self.db, instances).await?;
        Ok(Page::new(items, page, total))
    }

    async fn create(&self, input: BookInstanceInput) -> Result<BookInstanceView, DomainError> {
        let status = validate_book_instance(&input)?;
        self.check_references(&input).await?;

        let model = ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            book_id: Set(input.book_id),
            imprint: Set(input.imprint.trim().to_string()),
            due_back: Set(input.due_back),
            borrower_id: Set(input.borrower_id),
            status: Set(status),
        }
        .insert(&self.db)
        .await?;

        tracing::info!("Created book instance {} ({})", model.id, status.label());
        self.view(model).await
    }

    async fn update(
        &self,
        id: &str,
        input: BookInstanceInput,
    ) -> Result<BookInstanceView, DomainError> {
        let status = validate_book_instance(&input)?;
        let existing = InstanceEntity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;
        self.check_references(&input).await?;

        if existing.status != status {
            tracing::info!(
                "Book instance {} status {} -> {}",
                id,
                existing.status.label(),
                status.label()
            );
        }

        let mut active: ActiveModel = existing.into();
        active.book_id = Set(input.book_id);
        active.imprint = Set(input.imprint.trim().to_string());
        active.due_back = Set(input.due_back);
        active.borrower_id = Set(input.borrower_id);
        active.status = Set(status);
        let model = active.update(&self.db).await?;

        self.view(model).await
    }

    async fn renew(&self, id: &str, due_back: NaiveDate) -> Result<BookInstanceView, DomainError> {
        let existing = InstanceEntity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        active.due_back = Set(Some(due_back));
        let model = active.update(&self.db).await?;

        tracing::info!("Renewed book instance {} until {}", model.id, due_back);
        self.view(model).await
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let result = InstanceEntity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }

        Ok(())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(InstanceEntity::find().count(&self.db).await?)
    }

    async fn count_by_status(&self, status: LoanStatus) -> Result<u64, DomainError> {
        let count = InstanceEntity::find()
            .filter(Column::Status.eq(status))
            .count(&self.db)
            .await?;
        Ok(count)
    }
}
