//! Shared helpers for shelf-bm integration tests
//!
//! Remote image hosts and the provider API are replaced by local axum
//! servers bound to an ephemeral port.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use shelf_bm::metadata::{MetadataProvider, ProviderError, ProviderRecord};

/// A running fake remote host
pub struct FakeRemote {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
}

impl FakeRemote {
    /// Serve `router` on 127.0.0.1 with a request counter
    pub async fn spawn(router: Router) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        let app = router.layer(middleware::from_fn(move |req: Request, next: Next| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                next.run(req).await
            }
        }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake remote");
        let addr = listener.local_addr().expect("fake remote address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake remote server");
        });

        Self {
            base_url: format!("http://{}", addr),
            hits,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Body of `len` bytes; GET routes also answer HEAD with this Content-Length
pub fn image_bytes(len: usize) -> Vec<u8> {
    vec![0xFF; len]
}

/// Provider returning a fixed outcome and counting lookups
pub struct ScriptedProvider {
    outcome: Result<ProviderRecord, String>,
    calls: AtomicUsize,
    last_isbn: std::sync::Mutex<Option<String>>,
}

impl ScriptedProvider {
    pub fn returning(record: ProviderRecord) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(record),
            calls: AtomicUsize::new(0),
            last_isbn: std::sync::Mutex::new(None),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            last_isbn: std::sync::Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_isbn(&self) -> Option<String> {
        self.last_isbn.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "Scripted"
    }

    async fn lookup(&self, isbn: &str) -> Result<ProviderRecord, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_isbn.lock().unwrap() = Some(isbn.to_string());
        self.outcome.clone().map_err(ProviderError::Api)
    }
}

/// A record that looks right in every way except possibly its identifier
pub fn book_record(source_isbn: &str) -> ProviderRecord {
    ProviderRecord {
        found: true,
        source_isbn: Some(source_isbn.to_string()),
        title: Some("Kuyucakli Yusuf".to_string()),
        author: Some("Sabahattin Ali".to_string()),
        publisher: Some("Yapi Kredi Yayinlari".to_string()),
        page_count: Some(224),
        published_date: Some("2014".to_string()),
        description: Some("A novel set in a small Anatolian town.".to_string()),
        categories: vec!["Roman".to_string(), "Klasik".to_string()],
    }
}

/// Send a request through the router and decode the JSON body (if any)
pub async fn make_request(
    app: &Router,
    method: Method,
    path: &str,
    body: Option<&str>,
    headers: &[(&str, &str)],
) -> (StatusCode, axum::http::HeaderMap, Option<Value>) {
    let mut request = axum::http::Request::builder().method(method).uri(path);

    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let json_body = if bytes.is_empty() {
        None
    } else {
        serde_json::from_slice(&bytes).ok()
    };

    (status, headers, json_body)
}
