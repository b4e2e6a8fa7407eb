use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use locallibrary::api;
use locallibrary::auth::{create_jwt, hash_password};
use locallibrary::config::Config;
use locallibrary::db;
use locallibrary::domain::{AuthorInput, BookInput};
use locallibrary::infrastructure::AppState;
use tower::util::ServiceExt; // for `oneshot`

const FORM: &str = "application/x-www-form-urlencoded";

async fn setup_test_state() -> AppState {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    AppState::new(db, Config::default())
}

/// Creates a user holding `capabilities` and returns a bearer token for them.
async fn token_for(state: &AppState, username: &str, capabilities: &[&str]) -> String {
    let user = state
        .user_repo
        .create(username, hash_password("password").unwrap(), false)
        .await
        .unwrap();
    for codename in capabilities {
        state.user_repo.grant(user.id, codename).await.unwrap();
    }
    create_jwt(&state.config, user.id, username).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_anonymous_create_redirects_to_login() {
    let app = api::api_router(setup_test_state().await);

    let req = Request::builder()
        .uri("/catalog/author/create/")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, req).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/accounts/login/?next=/catalog/author/create/"
    );
}

#[tokio::test]
async fn test_create_without_capability_is_forbidden() {
    let state = setup_test_state().await;
    let token = token_for(&state, "reader", &[]).await;
    let app = api::api_router(state);

    let req = Request::builder()
        .uri("/catalog/author/create/")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Posting is refused the same way and nothing is stored
    let req = Request::builder()
        .uri("/catalog/author/create/")
        .method("POST")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, FORM)
        .body(Body::from("first_name=Ada&last_name=Lovelace"))
        .unwrap();
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_form_has_initial_date_of_death() {
    let state = setup_test_state().await;
    let token = token_for(&state, "librarian", &["add_author"]).await;
    let app = api::api_router(state);

    let req = Request::builder()
        .uri("/catalog/author/create/")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["form"]["initial"]["date_of_death"], "11/11/2023");
    assert_eq!(json["form"]["fields"][0], "first_name");
}

#[tokio::test]
async fn test_initial_date_of_death_can_be_disabled() {
    let db = db::init_db("sqlite::memory:").await.unwrap();
    let config = Config {
        author_form_date_of_death: None,
        ..Config::default()
    };
    let state = AppState::new(db, config);
    let token = token_for(&state, "librarian", &["add_author"]).await;
    let app = api::api_router(state);

    let req = Request::builder()
        .uri("/catalog/author/create/")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let json = json_body(send(&app, req).await).await;
    assert!(json["form"]["initial"]["date_of_death"].is_null());
}

#[tokio::test]
async fn test_create_redirects_to_new_author() {
    let state = setup_test_state().await;
    let token = token_for(&state, "librarian", &["add_author"]).await;
    let app = api::api_router(state.clone());

    let req = Request::builder()
        .uri("/catalog/author/create/")
        .method("POST")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, FORM)
        .body(Body::from(
            "first_name=test_first_name&last_name=test_last_name&date_of_birth=11%2F11%2F1953&date_of_death=",
        ))
        .unwrap();
    let response = send(&app, req).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
    assert!(location.starts_with("/catalog/author/"));

    let req = Request::builder().uri(&location).body(Body::empty()).unwrap();
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["name"], "test_last_name, test_first_name");
    assert_eq!(json["first_name"], "test_first_name");
    assert_eq!(json["date_of_birth"], "1953-11-11");
    assert!(json["date_of_death"].is_null());
    assert_eq!(state.author_repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_create_rejects_invalid_input() {
    let state = setup_test_state().await;
    let token = token_for(&state, "librarian", &["add_author"]).await;
    let app = api::api_router(state.clone());

    let req = Request::builder()
        .uri("/catalog/author/create/")
        .method("POST")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, FORM)
        .body(Body::from("first_name=&last_name=Name&date_of_birth=someday"))
        .unwrap();
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["errors"]["date_of_birth"][0], "Enter a valid date.");
    assert_eq!(state.author_repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_and_delete_author() {
    let state = setup_test_state().await;
    let token = token_for(&state, "librarian", &["change_author", "delete_author"]).await;

    let author = state
        .author_repo
        .create(AuthorInput {
            first_name: "Frank".to_string(),
            last_name: "Herbert".to_string(),
            date_of_birth: None,
            date_of_death: None,
        })
        .await
        .unwrap();
    let book = state
        .book_repo
        .create(BookInput {
            title: "Dune".to_string(),
            summary: "Desert planet.".to_string(),
            isbn: "9780441172719".to_string(),
            author_id: Some(author.id),
            language_id: None,
            genre_ids: vec![],
        })
        .await
        .unwrap();
    let app = api::api_router(state.clone());

    let req = Request::builder()
        .uri(format!("/catalog/author/{}/update/", author.id))
        .method("POST")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, FORM)
        .body(Body::from("first_name=Franklin&last_name=Herbert"))
        .unwrap();
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        format!("/catalog/author/{}", author.id).as_str()
    );

    let req = Request::builder()
        .uri(format!("/catalog/author/{}/delete/", author.id))
        .method("POST")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/catalog/authors/");

    // The book survives without an author
    let detail = state.book_repo.find_by_id(book.id).await.unwrap().unwrap();
    assert!(detail.author.is_none());
    assert!(state.author_repo.find_by_id(author.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_superuser_may_create_without_explicit_grant() {
    let state = setup_test_state().await;
    let admin = state
        .user_repo
        .create("admin", hash_password("admin").unwrap(), true)
        .await
        .unwrap();
    let token = create_jwt(&state.config, admin.id, "admin").unwrap();
    let app = api::api_router(state);

    let req = Request::builder()
        .uri("/catalog/author/create/")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, req).await.status(), StatusCode::OK);
}
