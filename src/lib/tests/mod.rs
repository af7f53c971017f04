
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode, header};
use tower::ServiceExt;

use crate::adapters::{AppState, router};
use crate::core::{Notification, NotificationReceiver};
use crate::storage::SqliteTodoStore;

pub(crate) struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

/// Drives the router in-process and carries the session cookie between
/// requests the way a browser would.
pub(crate) struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<SqliteTodoStore>,
    cookie: Option<String>,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = Arc::new(SqliteTodoStore::in_memory().await.unwrap());
        let state = AppState::new(store.clone());
        Self { router: router(state.clone()), state, store, cookie: None }
    }

    pub async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse { status, location, body: String::from_utf8(bytes.to_vec()).unwrap() }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.get_with_referer(uri, None).await
    }

    pub async fn get_with_referer(&mut self, uri: &str, referer: Option<&str>) -> TestResponse {
        let mut builder = Request::get(uri);
        if let Some(referer) = referer {
            builder = builder.header(header::REFERER, referer);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(
        &mut self,
        uri: &str,
        fields: &[(&str, &str)],
        referer: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(referer) = referer {
            builder = builder.header(header::REFERER, referer);
        }
        let body = serde_urlencoded::to_string(fields).unwrap();
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Follows a single redirect, like `redirects(1)` in a browser test.
    pub async fn follow(&mut self, response: TestResponse) -> TestResponse {
        match response.location {
            Some(location) if response.status.is_redirection() => self.get(&location).await,
            _ => response,
        }
    }
}

pub(crate) fn drain(rx: &mut NotificationReceiver) -> Vec<Notification> {
    let mut received = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        received.push(notification);
    }
    received
}
