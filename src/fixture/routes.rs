use std::collections::HashMap;
use std::convert::Infallible;
use std::path::Path;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Query};
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub const HELLO_BODY: &str = "Hello world";

/// Segments written by `/chunked`, flushed one at a time.
pub const CHUNKED_SEGMENTS: [&str; 2] = ["hello ", "world"];

/// Pause between chunked segments so they leave as separate writes.
const SEGMENT_GAP: Duration = Duration::from_millis(20);

const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

pub fn build_router(static_root: &Path) -> Router {
    Router::new()
        .route("/hello", get(hello))
        .route("/redirect/*path", get(redirect))
        .route("/post", post(post_form))
        .route("/chunked", get(chunked))
        .nest_service("/static", ServeDir::new(static_root))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
}

async fn hello() -> &'static str {
    HELLO_BODY
}

#[derive(Debug, Deserialize)]
struct RedirectQuery {
    status: Option<String>,
}

async fn redirect(
    axum::extract::Path(path): axum::extract::Path<String>,
    Query(query): Query<RedirectQuery>,
) -> Response {
    let status = match query.status.as_deref() {
        None => StatusCode::FOUND,
        Some(raw) => match raw.parse::<u16>() {
            Ok(code) if REDIRECT_STATUSES.contains(&code) => {
                match StatusCode::from_u16(code) {
                    Ok(status) => status,
                    Err(_) => return bad_request("invalid redirect status"),
                }
            }
            _ => return bad_request("invalid redirect status"),
        },
    };

    let target = format!("/{}", path.trim_start_matches('/'));
    log::debug!("[Fixture] Redirecting to {} with {}", target, status);
    (status, [(LOCATION, target)]).into_response()
}

async fn post_form(form: Result<Form<HashMap<String, String>>, FormRejection>) -> Response {
    match form {
        Ok(Form(fields)) if fields.get("foo").map(String::as_str) == Some("bar") => {
            Redirect::to("/hello").into_response()
        }
        Ok(Form(fields)) => {
            log::warn!("[Fixture] Unexpected form fields on /post: {:?}", fields);
            bad_request("expected foo=bar")
        }
        Err(rejection) => {
            log::warn!("[Fixture] Rejected /post body: {}", rejection);
            bad_request("expected a urlencoded form")
        }
    }
}

async fn chunked() -> Response {
    let (tx, rx) = mpsc::channel::<Result<Bytes, Infallible>>(CHUNKED_SEGMENTS.len());

    tokio::spawn(async move {
        for (idx, segment) in CHUNKED_SEGMENTS.iter().enumerate() {
            if idx > 0 {
                tokio::time::sleep(SEGMENT_GAP).await;
            }
            if tx.send(Ok(Bytes::from_static(segment.as_bytes()))).await.is_err() {
                log::debug!("[Fixture] /chunked client went away");
                return;
            }
        }
        // Dropping the sender finishes the body.
    });

    (
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(ReceiverStream::new(rx)),
    )
        .into_response()
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

fn bad_request(reason: &'static str) -> Response {
    (StatusCode::BAD_REQUEST, reason).into_response()
}
