pub mod author;
pub mod book;
pub mod book_genre;
pub mod book_instance;
pub mod genre;
pub mod language;
pub mod user;
pub mod user_permission;

pub use book_instance::LoanStatus;
