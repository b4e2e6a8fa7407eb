use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use chrono::{Duration, Local};
use locallibrary::api;
use locallibrary::config::Config;
use locallibrary::db;
use locallibrary::domain::{AuthorInput, BookInput, BookInstanceInput, DomainError, NamedInput};
use locallibrary::infrastructure::AppState;
use tower::util::ServiceExt; // for `oneshot`

async fn setup_test_state() -> AppState {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    AppState::new(db, Config::default())
}

async fn get(app: &Router, uri: &str) -> Response {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.clone().oneshot(req).await.unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn book(title: &str, isbn: &str) -> BookInput {
    BookInput {
        title: title.to_string(),
        summary: format!("Summary of {}", title),
        isbn: isbn.to_string(),
        author_id: None,
        language_id: None,
        genre_ids: vec![],
    }
}

fn copy(book_id: i32, status: &str) -> BookInstanceInput {
    BookInstanceInput {
        book_id: Some(book_id),
        imprint: "Test imprint".to_string(),
        due_back: None,
        borrower_id: None,
        status: Some(status.to_string()),
    }
}

fn named(name: &str) -> NamedInput {
    NamedInput {
        name: name.to_string(),
    }
}

#[tokio::test]
async fn test_index_counts() {
    let state = setup_test_state().await;
    let first = state.book_repo.create(book("The Hobbit", "9780547928227")).await.unwrap();
    state.book_repo.create(book("Dune", "9780441172719")).await.unwrap();
    state.book_repo.create(book("Mother Night", "9780385334143")).await.unwrap();
    state.genre_repo.create(named("Fantasy")).await.unwrap();
    state
        .author_repo
        .create(AuthorInput {
            first_name: "John".to_string(),
            last_name: "Steinbeck".to_string(),
            date_of_birth: None,
            date_of_death: None,
        })
        .await
        .unwrap();
    state.instance_repo.create(copy(first.id, "a")).await.unwrap();
    state.instance_repo.create(copy(first.id, "m")).await.unwrap();

    let app = api::api_router(state);
    let response = get(&app, "/catalog/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["num_books"], 3);
    assert_eq!(json["num_instances"], 2);
    assert_eq!(json["num_instances_available"], 1);
    assert_eq!(json["num_authors"], 1);
    assert_eq!(json["num_genres"], 1);
    // "The Hobbit" and "Mother Night", not "Dune"
    assert_eq!(json["num_books_the"], 2);
}

#[tokio::test]
async fn test_visit_counter_follows_session_cookie() {
    let app = api::api_router(setup_test_state().await);

    let response = get(&app, "/catalog/").await;
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    assert_eq!(json_body(response).await["num_visits"], 0);

    for expected in 1..=2 {
        let req = Request::builder()
            .uri("/catalog/")
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(json_body(response).await["num_visits"], expected);
    }
}

#[tokio::test]
async fn test_visit_counter_disabled() {
    let db = db::init_db("sqlite::memory:").await.unwrap();
    let config = Config {
        track_visits: false,
        ..Config::default()
    };
    let app = api::api_router(AppState::new(db, config));

    let response = get(&app, "/catalog/").await;
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(json_body(response).await.get("num_visits").is_none());
}

#[tokio::test]
async fn test_book_list_pagination() {
    let state = setup_test_state().await;
    for i in 0..13 {
        state
            .book_repo
            .create(book(&format!("Book {}", i), &format!("97800000000{:02}", i)))
            .await
            .unwrap();
    }
    let app = api::api_router(state);

    let json = json_body(get(&app, "/catalog/books/").await).await;
    assert_eq!(json["items"].as_array().unwrap().len(), 10);
    assert_eq!(json["num_pages"], 2);
    assert_eq!(json["has_next"], true);
    assert_eq!(json["items"][0]["title"], "Book 0");

    let json = json_body(get(&app, "/catalog/books/?page=2").await).await;
    assert_eq!(json["items"].as_array().unwrap().len(), 3);
    assert_eq!(json["has_next"], false);
    assert_eq!(json["has_previous"], true);

    assert_eq!(get(&app, "/catalog/books/?page=3").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/catalog/books/?page=0").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_listing_has_one_page() {
    let app = api::api_router(setup_test_state().await);

    let response = get(&app, "/catalog/authors/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["num_pages"], 1);
    assert_eq!(json["count"], 0);
}

#[tokio::test]
async fn test_authors_ordered_by_last_then_first_name() {
    let state = setup_test_state().await;
    for (first, last) in [("Zed", "Adams"), ("Amy", "Brown"), ("Al", "Adams")] {
        state
            .author_repo
            .create(AuthorInput {
                first_name: first.to_string(),
                last_name: last.to_string(),
                date_of_birth: None,
                date_of_death: None,
            })
            .await
            .unwrap();
    }
    let app = api::api_router(state);

    let json = json_body(get(&app, "/catalog/authors/").await).await;
    let names: Vec<&str> = json["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Adams, Al", "Adams, Zed", "Brown, Amy"]);
}

#[tokio::test]
async fn test_book_detail_and_display_genre() {
    let state = setup_test_state().await;
    let mut genre_ids = Vec::new();
    for name in ["Zombie", "Adventure", "Mystery", "Horror"] {
        genre_ids.push(state.genre_repo.create(named(name)).await.unwrap().id);
    }
    let english = state.language_repo.create(named("English")).await.unwrap();

    let mut input = book("The Hobbit", "9780547928227");
    input.language_id = Some(english.id);
    input.genre_ids = genre_ids;
    let created = state.book_repo.create(input).await.unwrap();
    let app = api::api_router(state);

    let response = get(&app, &format!("/catalog/book/{}", created.id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    // First three genres in association order, not alphabetical
    assert_eq!(json["display_genre"], "Zombie, Adventure, Mystery");
    assert_eq!(json["genres"].as_array().unwrap().len(), 4);
    assert_eq!(json["language"]["name"], "English");
    assert_eq!(json["url"], format!("/catalog/book/{}", created.id));

    assert_eq!(get(&app, "/catalog/book/999").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_genre_and_language_detail() {
    let state = setup_test_state().await;
    let genre = state.genre_repo.create(named("Poetry")).await.unwrap();
    let language = state.language_repo.create(named("French")).await.unwrap();
    let app = api::api_router(state);

    let json = json_body(get(&app, &format!("/catalog/genre/{}", genre.id)).await).await;
    assert_eq!(json["name"], "Poetry");
    let json = json_body(get(&app, &format!("/catalog/language/{}", language.id)).await).await;
    assert_eq!(json["name"], "French");

    assert_eq!(get(&app, "/catalog/genre/999").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/catalog/language/999").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_copies_ordered_by_due_back_with_unset_first() {
    let state = setup_test_state().await;
    let created = state.book_repo.create(book("Dune", "9780441172719")).await.unwrap();
    let today = Local::now().date_naive();

    for offset in [Some(10), None, Some(-3)] {
        let mut input = copy(created.id, "o");
        input.due_back = offset.map(|days| today + Duration::days(days));
        state.instance_repo.create(input).await.unwrap();
    }

    let instances = state.instance_repo.find_all().await.unwrap();
    let due: Vec<_> = instances.iter().map(|i| i.due_back).collect();
    assert_eq!(
        due,
        vec![
            None,
            Some(today - Duration::days(3)),
            Some(today + Duration::days(10))
        ]
    );
    let overdue: Vec<bool> = instances.iter().map(|i| i.is_overdue).collect();
    assert_eq!(overdue, vec![false, true, false]);
}

#[tokio::test]
async fn test_book_instance_detail() {
    let state = setup_test_state().await;
    let created = state.book_repo.create(book("Dune", "9780441172719")).await.unwrap();
    let instance = state
        .instance_repo
        .create(BookInstanceInput {
            status: None,
            ..copy(created.id, "")
        })
        .await
        .unwrap();
    let app = api::api_router(state);

    let json = json_body(get(&app, &format!("/catalog/bookinstance/{}", instance.id)).await).await;
    assert_eq!(json["book_title"], "Dune");
    assert_eq!(json["display"], format!("{} (Dune)", instance.id));
    assert_eq!(json["status"], "maintenance");
    assert_eq!(json["status_label"], "Maintenance");
    assert_eq!(json["is_overdue"], false);

    assert_eq!(
        get(&app, "/catalog/bookinstance/00000000-0000-0000-0000-000000000000")
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_uniqueness_is_enforced() {
    let state = setup_test_state().await;

    state.genre_repo.create(named("Fantasy")).await.unwrap();
    assert!(matches!(
        state.genre_repo.create(named("Fantasy")).await,
        Err(DomainError::Validation(_))
    ));
    // Exact match only
    assert!(state.genre_repo.create(named("fantasy")).await.is_ok());

    state.language_repo.create(named("English")).await.unwrap();
    assert!(matches!(
        state.language_repo.create(named("English")).await,
        Err(DomainError::Validation(_))
    ));

    state.book_repo.create(book("Dune", "9780441172719")).await.unwrap();
    let Err(DomainError::Validation(errors)) =
        state.book_repo.create(book("Dune Messiah", "9780441172719")).await
    else {
        panic!("duplicate ISBN accepted");
    };
    assert!(errors.get("isbn").is_some());
}

#[tokio::test]
async fn test_book_with_copies_cannot_be_deleted() {
    let state = setup_test_state().await;
    let created = state.book_repo.create(book("Dune", "9780441172719")).await.unwrap();
    let instance = state.instance_repo.create(copy(created.id, "a")).await.unwrap();

    assert!(matches!(
        state.book_repo.delete(created.id).await,
        Err(DomainError::Protected(_))
    ));
    assert!(state.book_repo.find_by_id(created.id).await.unwrap().is_some());

    state.instance_repo.delete(&instance.id).await.unwrap();
    state.book_repo.delete(created.id).await.unwrap();
    assert!(state.book_repo.find_by_id(created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_language_delete_clears_book_language() {
    let state = setup_test_state().await;
    let english = state.language_repo.create(named("English")).await.unwrap();
    let mut input = book("Dune", "9780441172719");
    input.language_id = Some(english.id);
    let created = state.book_repo.create(input).await.unwrap();

    state.language_repo.delete(english.id).await.unwrap();

    let detail = state.book_repo.find_by_id(created.id).await.unwrap().unwrap();
    assert!(detail.language.is_none());
}

#[tokio::test]
async fn test_health_check() {
    let app = api::api_router(setup_test_state().await);

    let response = get(&app, "/api/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["service"], "locallibrary");
}

#[tokio::test]
async fn test_unparseable_identifiers_are_not_found() {
    let state = setup_test_state().await;
    state.book_repo.create(book("Dune", "9780441172719")).await.unwrap();
    let app = api::api_router(state);

    for uri in [
        "/catalog/book/abc",
        "/catalog/author/abc",
        "/catalog/genre/99999999999",
        "/catalog/language/1.5",
        "/catalog/books/?page=abc",
        "/catalog/authors/?page=-1",
    ] {
        let response = get(&app, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(json_body(response).await["error"], "Not found");
    }

    // An empty page parameter still means the first page
    assert_eq!(get(&app, "/catalog/books/?page=").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cookieless_visits_stay_bounded() {
    let db = db::init_db("sqlite::memory:").await.unwrap();
    let config = Config {
        max_sessions: 5,
        ..Config::default()
    };
    let state = AppState::new(db, config);
    let app = api::api_router(state.clone());

    for _ in 0..50 {
        assert_eq!(get(&app, "/catalog/").await.status(), StatusCode::OK);
    }
    assert_eq!(state.sessions.len(), 5);
}
