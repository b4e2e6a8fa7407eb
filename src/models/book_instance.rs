use chrono::Local;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::catalog;

/// Availability of a physical copy.
///
/// Persisted as single-character codes.
/// No transition table is enforced: staff may move a copy from any status to
/// any other.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(1))")]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    #[sea_orm(string_value = "m")]
    Maintenance,
    #[sea_orm(string_value = "o")]
    OnLoan,
    #[sea_orm(string_value = "a")]
    Available,
    #[sea_orm(string_value = "r")]
    Reserved,
}

impl LoanStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        }
    }

    /// Accepts either the stored code (`"o"`) or the snake_case name (`"on_loan"`).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "m" | "maintenance" => Some(LoanStatus::Maintenance),
            "o" | "on_loan" => Some(LoanStatus::OnLoan),
            "a" | "available" => Some(LoanStatus::Available),
            "r" | "reserved" => Some(LoanStatus::Reserved),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "book_instances")]
pub struct Model {
    /// UUID v4, unique across the whole library.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub book_id: Option<i32>,
    pub imprint: String,
    pub due_back: Option<Date>,
    pub borrower_id: Option<i32>,
    pub status: LoanStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::book::Entity",
        from = "Column::BookId",
        to = "super::book::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Book,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::BorrowerId",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Borrower,
}

impl Related<super::book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Book.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Borrower.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_overdue_on(&self, today: Date) -> bool {
        catalog::is_overdue(self.due_back, today)
    }

    /// Evaluated against the local calendar day on every call.
    pub fn is_overdue(&self) -> bool {
        self.is_overdue_on(Local::now().date_naive())
    }

    pub fn absolute_url(&self) -> String {
        format!("/catalog/bookinstance/{}", self.id)
    }

    /// `"<uuid> (<book title>)"`; copies detached from their book say so.
    pub fn display_name(&self, book_title: Option<&str>) -> String {
        format!("{} ({})", self.id, book_title.unwrap_or("no book"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn instance(due_back: Option<Date>) -> Model {
        Model {
            id: "0b8e5e49-3c1c-4d4a-9d0e-7b1b2c3d4e5f".to_string(),
            book_id: None,
            imprint: "Imprint".to_string(),
            due_back,
            borrower_id: None,
            status: LoanStatus::OnLoan,
        }
    }

    #[test]
    fn overdue_uses_the_current_day() {
        let today = Local::now().date_naive();
        assert!(instance(Some(today - Duration::days(1))).is_overdue());
        assert!(!instance(Some(today + Duration::days(1))).is_overdue());
        assert!(!instance(None).is_overdue());
    }

    #[test]
    fn status_accepts_codes_and_names() {
        assert_eq!(LoanStatus::parse("o"), Some(LoanStatus::OnLoan));
        assert_eq!(LoanStatus::parse("reserved"), Some(LoanStatus::Reserved));
        assert_eq!(LoanStatus::parse("lost"), None);
        assert_eq!(LoanStatus::default().label(), "Maintenance");
    }

    #[test]
    fn display_name_names_the_book() {
        let copy = instance(None);
        assert_eq!(
            copy.display_name(Some("Dune")),
            "0b8e5e49-3c1c-4d4a-9d0e-7b1b2c3d4e5f (Dune)"
        );
        assert_eq!(
            copy.display_name(None),
            "0b8e5e49-3c1c-4d4a-9d0e-7b1b2c3d4e5f (no book)"
        );
    }

    #[test]
    fn url_uses_the_uuid() {
        assert_eq!(
            instance(None).absolute_url(),
            "/catalog/bookinstance/0b8e5e49-3c1c-4d4a-9d0e-7b1b2c3d4e5f"
        );
    }
}
