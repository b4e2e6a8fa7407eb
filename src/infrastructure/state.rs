//! Application state containing repositories and shared resources

use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{
    AuthorRepository, BookInstanceRepository, BookRepository, GenreRepository, LanguageRepository,
    UserRepository,
};
use crate::infrastructure::config::Config;
use crate::infrastructure::session::SessionStore;
use crate::infrastructure::{
    SeaOrmAuthorRepository, SeaOrmBookInstanceRepository, SeaOrmBookRepository,
    SeaOrmGenreRepository, SeaOrmLanguageRepository, SeaOrmUserRepository,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    pub config: Arc<Config>,
    pub sessions: SessionStore,
    pub genre_repo: Arc<dyn GenreRepository>,
    pub language_repo: Arc<dyn LanguageRepository>,
    pub author_repo: Arc<dyn AuthorRepository>,
    pub book_repo: Arc<dyn BookRepository>,
    pub instance_repo: Arc<dyn BookInstanceRepository>,
    pub user_repo: Arc<dyn UserRepository>,
}

impl AppState {
    /// Create a new AppState with all repositories initialized
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let sessions = SessionStore::with_limits(
            Duration::from_secs(config.session_idle_secs),
            config.max_sessions,
        );
        Self {
            genre_repo: Arc::new(SeaOrmGenreRepository::new(db.clone())),
            language_repo: Arc::new(SeaOrmLanguageRepository::new(db.clone())),
            author_repo: Arc::new(SeaOrmAuthorRepository::new(db.clone())),
            book_repo: Arc::new(SeaOrmBookRepository::new(db.clone())),
            instance_repo: Arc::new(SeaOrmBookInstanceRepository::new(db.clone())),
            user_repo: Arc::new(SeaOrmUserRepository::new(db.clone())),
            config: Arc::new(config),
            sessions,
            db,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
