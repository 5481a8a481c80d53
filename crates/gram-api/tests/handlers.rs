use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, State};
use axum::http::{Request, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Extension, Json, Router};
use tempfile::TempDir;
use tower::ServiceExt;

use gram_api::auth::{self, AppState, AppStateInner};
use gram_api::error::ApiError;
use gram_api::middleware::require_auth;
use gram_api::{interactions, photos, uploads};
use gram_db::Database;
use gram_types::api::{
    Claims, CommentRequest, CreatePhotoRequest, ErrorResponse, LikeResponse, LoginRequest,
    RegisterRequest,
};

fn test_state(dir: &TempDir) -> AppState {
    let db = Database::open(&dir.path().join("gram.db")).expect("open database");
    Arc::new(AppStateInner {
        db,
        jwt_secret: "test-secret".into(),
        upload_dir: dir.path().join("uploads"),
    })
}

fn claims_for(username: &str) -> Claims {
    Claims {
        sub: 1,
        username: username.into(),
        exp: (chrono::Utc::now() + chrono::Duration::days(1)).timestamp() as usize,
    }
}

async fn register(state: &AppState, username: &str, password: &str) -> Result<i64, ApiError> {
    let (status, body) = auth::register(
        State(state.clone()),
        Json(RegisterRequest {
            username: username.into(),
            password: password.into(),
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok(body.0.user_id)
}

async fn create_photo(state: &AppState, owner: &str, filename: &str) -> i64 {
    let (status, body) = photos::create_photo(
        State(state.clone()),
        Extension(claims_for(owner)),
        Json(CreatePhotoRequest {
            filename: filename.into(),
            description: Some("a caption".into()),
        }),
    )
    .await
    .expect("create photo");
    assert_eq!(status, StatusCode::CREATED);
    body.0.id
}

#[tokio::test]
async fn register_then_login_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let user_id = register(&state, "alice", "hunter2!").await.unwrap();

    let resp = auth::login(
        State(state.clone()),
        Json(LoginRequest {
            username: "alice".into(),
            password: "hunter2!".into(),
        }),
    )
    .await
    .expect("login");
    assert_eq!(resp.0.user_id, user_id);
    assert_eq!(resp.0.username, "alice");
    assert!(!resp.0.token.is_empty());
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    register(&state, "alice", "hunter2!").await.unwrap();

    let err = auth::login(
        State(state.clone()),
        Json(LoginRequest {
            username: "alice".into(),
            password: "wrong".into(),
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));

    let err = auth::login(
        State(state),
        Json(LoginRequest {
            username: "nobody".into(),
            password: "hunter2!".into(),
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn duplicate_registration_maps_to_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    register(&state, "alice", "first-pass").await.unwrap();
    let err = register(&state, "alice", "second-pass").await.unwrap_err();
    assert!(matches!(err, ApiError::DuplicateUser));
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

    // First credentials still win.
    auth::login(
        State(state),
        Json(LoginRequest {
            username: "alice".into(),
            password: "first-pass".into(),
        }),
    )
    .await
    .expect("original password still valid");
}

#[tokio::test]
async fn blank_registration_fields_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let err = register(&state, "   ", "pass").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = register(&state, "alice", "").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[tokio::test]
async fn passwords_are_stored_hashed() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    register(&state, "alice", "hunter2!").await.unwrap();

    let user = state.db.find_user("alice").unwrap().unwrap();
    assert_ne!(user.password_hash, "hunter2!");
    assert!(user.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn like_is_idempotent_and_counts_distinct_users() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    let photo_id = create_photo(&state, "bob", "f.jpg").await;

    for _ in 0..2 {
        let resp = interactions::like(
            State(state.clone()),
            Path(photo_id),
            Extension(claims_for("alice")),
        )
        .await
        .expect("like");
        assert_eq!(resp.0.like_count, 1);
    }

    let resp = interactions::like(
        State(state.clone()),
        Path(photo_id),
        Extension(claims_for("carol")),
    )
    .await
    .expect("second liker");
    assert_eq!(resp.0.like_count, 2);

    let likers = interactions::get_likers(State(state), Path(photo_id))
        .await
        .expect("likers");
    assert_eq!(likers.0.usernames, vec!["alice", "carol"]);
}

#[tokio::test]
async fn interactions_against_missing_photo_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let err = interactions::like(State(state.clone()), Path(42), Extension(claims_for("alice")))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::PhotoNotFound(42)));
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

    let err = interactions::share(State(state.clone()), Path(42), Extension(claims_for("alice")))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::PhotoNotFound(42)));

    let err = interactions::comment(
        State(state),
        Path(42),
        Extension(claims_for("alice")),
        Json(CommentRequest {
            body: "hello".into(),
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::PhotoNotFound(42)));
}

#[tokio::test]
async fn share_reports_fresh_count() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    let photo_id = create_photo(&state, "bob", "f.jpg").await;

    let resp = interactions::share(
        State(state.clone()),
        Path(photo_id),
        Extension(claims_for("dan")),
    )
    .await
    .expect("share");
    assert_eq!(resp.0.share_count, 1);

    let resp = interactions::get_share_count(State(state), Path(photo_id))
        .await
        .expect("share count");
    assert_eq!(resp.0.share_count, 1);
}

#[tokio::test]
async fn blank_comment_body_is_rejected_and_nothing_is_stored() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    let photo_id = create_photo(&state, "bob", "f.jpg").await;

    let err = interactions::comment(
        State(state.clone()),
        Path(photo_id),
        Extension(claims_for("alice")),
        Json(CommentRequest { body: "  ".into() }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let comments = interactions::get_comments(State(state), Path(photo_id))
        .await
        .expect("comments");
    assert!(comments.0.is_empty());
}

#[tokio::test]
async fn comments_come_back_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    let photo_id = create_photo(&state, "bob", "f.jpg").await;

    for body in ["first", "second", "third"] {
        interactions::comment(
            State(state.clone()),
            Path(photo_id),
            Extension(claims_for("alice")),
            Json(CommentRequest { body: body.into() }),
        )
        .await
        .expect("comment");
    }

    let comments = interactions::get_comments(State(state), Path(photo_id))
        .await
        .expect("comments");
    let bodies: Vec<_> = comments.0.iter().map(|c| c.body.as_str()).collect();
    assert_eq!(bodies, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn feed_is_newest_first_and_profiles_are_scoped() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let first = create_photo(&state, "bob", "f1.jpg").await;
    let second = create_photo(&state, "carol", "f2.jpg").await;

    let feed = photos::list_feed(State(state.clone())).await.expect("feed");
    assert_eq!(feed.0.len(), 2);
    assert_eq!(feed.0[0].id, second);
    assert_eq!(feed.0[1].id, first);

    let profile = photos::list_profile(State(state.clone()), Path("bob".into()))
        .await
        .expect("profile");
    assert_eq!(profile.0.len(), 1);
    assert_eq!(profile.0[0].owner, "bob");

    let empty = photos::list_profile(State(state), Path("nobody".into()))
        .await
        .expect("empty profile");
    assert!(empty.0.is_empty());
}

#[tokio::test]
async fn upload_writes_bytes_and_returns_a_usable_handle() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let (status, body) = uploads::upload(
        State(state.clone()),
        Query(uploads::UploadQuery {
            name: Some("sunset.jpg".into()),
        }),
        Bytes::from_static(b"not really a jpeg"),
    )
    .await
    .expect("upload");
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.0.filename.ends_with("-sunset.jpg"));
    assert_eq!(body.0.size, 17);

    let stored = std::fs::read(state.upload_dir.join(&body.0.filename)).unwrap();
    assert_eq!(stored, b"not really a jpeg");

    // The handle is accepted verbatim by photo creation.
    let photo_id = create_photo(&state, "bob", &body.0.filename).await;
    let profile = photos::list_profile(State(state), Path("bob".into()))
        .await
        .unwrap();
    assert_eq!(profile.0[0].id, photo_id);
    assert_eq!(profile.0[0].filename, body.0.filename);
}

#[tokio::test]
async fn empty_upload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let err = uploads::upload(
        State(state),
        Query(uploads::UploadQuery { name: None }),
        Bytes::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[tokio::test]
async fn blank_token_username_cannot_create_photos() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let err = photos::create_photo(
        State(state.clone()),
        Extension(claims_for("   ")),
        Json(CreatePhotoRequest {
            filename: "f.jpg".into(),
            description: None,
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let feed = photos::list_feed(State(state)).await.unwrap();
    assert!(feed.0.is_empty());
}

/// A like route behind the real auth middleware, for driving requests
/// end to end through token validation.
fn protected_app(state: &AppState) -> Router {
    Router::new()
        .route("/api/photos/{photo_id}/like", post(interactions::like))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ))
        .with_state(state.clone())
}

fn like_request(photo_id: i64, auth: Option<&str>) -> Request<Body> {
    let builder = Request::builder()
        .method("POST")
        .uri(format!("/api/photos/{photo_id}/like"));
    let builder = match auth {
        Some(value) => builder.header(header::AUTHORIZATION, value),
        None => builder,
    };
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn auth_middleware_rejects_missing_or_malformed_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    let app = protected_app(&state);

    let response = app.clone().oneshot(like_request(1, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(like_request(1, Some("Basic abc")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(like_request(1, Some("Bearer not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_middleware_rejects_tokens_signed_with_another_secret() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    let app = protected_app(&state);

    let forged = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims_for("alice"),
        &jsonwebtoken::EncodingKey::from_secret(b"some-other-secret"),
    )
    .unwrap();

    let response = app
        .oneshot(like_request(1, Some(&format!("Bearer {forged}"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_middleware_admits_valid_tokens_and_injects_claims() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let (_, body) = auth::register(
        State(state.clone()),
        Json(RegisterRequest {
            username: "alice".into(),
            password: "hunter2!".into(),
        }),
    )
    .await
    .expect("register");
    let token = body.0.token;

    let photo_id = create_photo(&state, "bob", "f.jpg").await;

    let response = protected_app(&state)
        .oneshot(like_request(photo_id, Some(&format!("Bearer {token}"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    let like: LikeResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(like.like_count, 1);

    // The username attributed to the like came from the token's claims.
    let likers = interactions::get_likers(State(state), Path(photo_id))
        .await
        .unwrap();
    assert_eq!(likers.0.usernames, vec!["alice"]);
}

#[tokio::test]
async fn error_responses_carry_a_json_body() {
    let response = ApiError::PhotoNotFound(7).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.error, "photo 7 not found");
}
