use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbErr, Statement, TransactionTrait, Value,
};

/// Migrations applied in order. Each runs once and is recorded in `schema_migrations`.
const MIGRATIONS: &[(&str, &[&str])] = &[
    (
        "0001_initial",
        &[
            r#"
            CREATE TABLE IF NOT EXISTS genres (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS authors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                date_of_birth TEXT,
                date_of_death TEXT
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                summary TEXT NOT NULL,
                isbn TEXT NOT NULL UNIQUE,
                author_id INTEGER,
                FOREIGN KEY (author_id) REFERENCES authors(id) ON DELETE SET NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS book_genres (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                book_id INTEGER NOT NULL,
                genre_id INTEGER NOT NULL,
                UNIQUE (book_id, genre_id),
                FOREIGN KEY (book_id) REFERENCES books(id) ON DELETE CASCADE,
                FOREIGN KEY (genre_id) REFERENCES genres(id) ON DELETE CASCADE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                is_superuser INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS user_permissions (
                user_id INTEGER NOT NULL,
                codename TEXT NOT NULL,
                PRIMARY KEY (user_id, codename),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS book_instances (
                id TEXT PRIMARY KEY,
                book_id INTEGER,
                imprint TEXT NOT NULL,
                due_back TEXT,
                borrower_id INTEGER,
                status TEXT NOT NULL DEFAULT 'm' CHECK (status IN ('m', 'o', 'a', 'r')),
                FOREIGN KEY (book_id) REFERENCES books(id) ON DELETE RESTRICT,
                FOREIGN KEY (borrower_id) REFERENCES users(id) ON DELETE SET NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_book_instances_due_back ON book_instances(due_back)",
            "CREATE INDEX IF NOT EXISTS idx_book_instances_borrower_status ON book_instances(borrower_id, status)",
            "CREATE INDEX IF NOT EXISTS idx_book_genres_book_id ON book_genres(book_id)",
        ],
    ),
    // Additive: existing books keep their rows and get a NULL language.
    (
        "0002_language_book_language",
        &[
            r#"
            CREATE TABLE IF NOT EXISTS languages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            )
            "#,
            "ALTER TABLE books ADD COLUMN language_id INTEGER REFERENCES languages(id) ON DELETE SET NULL",
        ],
    ),
];

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA foreign_keys = ON".to_owned(),
    ))
    .await?;

    run_migrations(&db).await?;

    Ok(db)
}

/// Applies pending migrations. Safe to call repeatedly.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL
        )
        "#
        .to_owned(),
    ))
    .await?;

    for (name, statements) in MIGRATIONS {
        if is_applied(db, name).await? {
            continue;
        }

        let txn = db.begin().await?;
        for sql in statements.iter() {
            txn.execute(Statement::from_string(
                txn.get_database_backend(),
                sql.to_string(),
            ))
            .await?;
        }
        txn.execute(Statement::from_sql_and_values(
            txn.get_database_backend(),
            "INSERT INTO schema_migrations (name, applied_at) VALUES (?, ?)",
            [
                Value::from(name.to_string()),
                Value::from(chrono::Utc::now().to_rfc3339()),
            ],
        ))
        .await?;
        txn.commit().await?;

        tracing::info!("Applied migration {}", name);
    }

    Ok(())
}

/// Names of the migrations recorded as applied, oldest first.
pub async fn applied_migrations(db: &DatabaseConnection) -> Result<Vec<String>, DbErr> {
    let rows = db
        .query_all(Statement::from_string(
            db.get_database_backend(),
            "SELECT name FROM schema_migrations ORDER BY name".to_owned(),
        ))
        .await?;

    rows.iter()
        .map(|row| row.try_get::<String>("", "name"))
        .collect()
}

async fn is_applied(db: &DatabaseConnection, name: &str) -> Result<bool, DbErr> {
    let row = db
        .query_one(Statement::from_sql_and_values(
            db.get_database_backend(),
            "SELECT name FROM schema_migrations WHERE name = ?",
            [Value::from(name.to_string())],
        ))
        .await?;
    Ok(row.is_some())
}
