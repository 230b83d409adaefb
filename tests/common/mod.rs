//! Shared setup for router-level tests
//!
//! The app runs against an in-memory SQLite store wrapped in a counter, so
//! tests can assert that rejected requests never reached the store.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use royella::{AppState, router};
use royella_session::TokenService;
use royella_store::{
    Collection, DeleteResult, Document, DocumentStore, Filter, InsertOneResult, Sort,
    SqliteStore, StoreError, UpdateResult,
};
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test_secret_key_minimum_32_characters_long";

/// Delegates to SQLite and counts every call made through the trait
pub struct CountingStore {
    inner: SqliteStore,
    calls: AtomicUsize,
}

impl CountingStore {
    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<Sort>,
    ) -> Result<Vec<Document>, StoreError> {
        self.hit();
        self.inner.find(collection, filter, sort).await
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        self.hit();
        self.inner.find_one(collection, filter).await
    }

    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertOneResult, StoreError> {
        self.hit();
        self.inner.insert_one(collection, document).await
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        set: Document,
    ) -> Result<UpdateResult, StoreError> {
        self.hit();
        self.inner.update_one(collection, filter, set).await
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<DeleteResult, StoreError> {
        self.hit();
        self.inner.delete_one(collection, filter).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.hit();
        self.inner.ping().await
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<CountingStore>,
    pub tokens: TokenService,
}

pub async fn create_test_app() -> TestApp {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let inner = SqliteStore::from_pool(pool);
    inner.migrate().await.unwrap();

    let store = Arc::new(CountingStore {
        inner,
        calls: AtomicUsize::new(0),
    });
    let tokens = TokenService::new(TEST_SECRET).unwrap();

    let router = router(AppState::new(store.clone(), tokens.clone()));

    TestApp {
        router,
        store,
        tokens,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Store calls made by handlers so far (seeding is not counted)
    pub fn store_calls(&self) -> usize {
        self.store.calls.load(Ordering::SeqCst)
    }

    /// Insert a document directly, bypassing the HTTP layer and the counter
    pub async fn seed(&self, collection: Collection, value: Value) -> String {
        let Value::Object(document) = value else {
            panic!("seed documents must be objects");
        };
        self.store
            .inner
            .insert_one(collection, document)
            .await
            .unwrap()
            .inserted_id
    }

    /// Log in through `POST /session` and return a `Cookie` header value
    pub async fn login(&self, email: &str) -> String {
        let response = self
            .send(json_request(
                "POST",
                "/session",
                None,
                serde_json::json!({ "email": email }),
            ))
            .await;
        assert_eq!(response.status(), 200);

        session_cookie_pair(&response).expect("login must set the session cookie")
    }
}

/// `token=<value>` from the response's Set-Cookie header
pub fn session_cookie_pair(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("token="))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub fn set_cookie_header(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap()
        .to_string()
}

pub fn request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}
