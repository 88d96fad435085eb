//! HTTP/1.1 exchange performed on the run's private event loop.
//!
//! A fresh connection is opened per request so request framing (explicit
//! Content-Length versus chunked) is exactly what the caller asked for.

use std::convert::Infallible;

use bytes::{Bytes, BytesMut};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::Frame;
use hyper::client;
use hyper::header::{CONTENT_LENGTH, HOST, USER_AGENT};
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use url::Url;

use super::checks::Validator;
use super::state::ResponseSummary;
use crate::config::AuditorConfig;
use crate::error::RunError;

/// Where a run's requests go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Target {
    pub host: String,
    pub port: u16,
    /// Value for the Host header.
    pub authority: String,
    pub path_and_query: String,
}

impl Target {
    pub fn parse(raw: &str) -> Result<Self, RunError> {
        let invalid = |reason: &str| RunError::InvalidUrl {
            url: raw.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(raw).map_err(|err| invalid(&err.to_string()))?;
        if url.scheme() != "http" {
            return Err(invalid("only http URLs can be audited"));
        }
        let host = url
            .host_str()
            .ok_or_else(|| invalid("URL has no host"))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| invalid("URL has no port"))?;
        let authority = match url.port() {
            Some(explicit) => format!("{host}:{explicit}"),
            None => host.clone(),
        };
        let path_and_query = url[url::Position::BeforePath..url::Position::AfterQuery].to_string();

        Ok(Self {
            host: host.trim_start_matches('[').trim_end_matches(']').to_string(),
            port,
            authority,
            path_and_query,
        })
    }
}

/// One request/response pair as seen on the wire.
#[derive(Debug, Clone)]
pub(crate) struct Exchange {
    pub response: ResponseSummary,
    pub request_chunked: bool,
    pub request_body_len: usize,
}

type RequestBody = BoxBody<Bytes, Infallible>;

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(key, _)| key.eq_ignore_ascii_case(name))
}

/// First header name that comes back after a different name was sent.
///
/// Header lines leave in map order: names in first-seen order, and each
/// name's values together. `A, B, A` can't be written in that order.
fn interleaved_duplicate(headers: &[(String, String)]) -> Option<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for (name, _) in headers {
        let repeats_earlier = seen
            .iter()
            .rev()
            .skip(1)
            .any(|earlier| earlier.eq_ignore_ascii_case(name));
        if repeats_earlier {
            return Some(name);
        }
        if !seen.last().is_some_and(|last| last.eq_ignore_ascii_case(name)) {
            seen.push(name);
        }
    }
    None
}

/// Build the request with the caller's headers in order.
///
/// Returns the request plus whether the body goes out chunked. Headers whose
/// order can't be kept on the wire are rejected rather than regrouped.
fn build_request(
    target: &Target,
    method: &Method,
    headers: &[(String, String)],
    body: Option<&Bytes>,
    config: &AuditorConfig,
) -> Result<(Request<RequestBody>, bool), RunError> {
    if let Some(name) = interleaved_duplicate(headers) {
        return Err(RunError::InvalidRequest {
            reason: format!(
                "header '{name}' repeats after a different header; wire order can't be kept"
            ),
        });
    }

    let mut builder = Request::builder()
        .method(method.clone())
        .uri(target.path_and_query.as_str());

    if !has_header(headers, HOST.as_str()) {
        builder = builder.header(HOST, target.authority.as_str());
    }
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if !has_header(headers, USER_AGENT.as_str()) {
        builder = builder.header(USER_AGENT, config.user_agent.as_str());
    }

    let declared_length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(CONTENT_LENGTH.as_str()))
        .map(|(_, value)| value.trim());

    let (body, chunked): (RequestBody, bool) = match (body, declared_length) {
        (None, _) => (Empty::<Bytes>::new().boxed(), false),
        (Some(bytes), Some(declared)) => {
            let length: usize = declared.parse().map_err(|_| RunError::InvalidRequest {
                reason: format!("Content-Length '{declared}' is not a number"),
            })?;
            if length != bytes.len() {
                return Err(RunError::InvalidRequest {
                    reason: format!(
                        "Content-Length {} doesn't match the {}-byte body",
                        length,
                        bytes.len()
                    ),
                });
            }
            (Full::new(bytes.clone()).boxed(), false)
        }
        // Unknown length on the stream makes hyper use chunked framing.
        (Some(bytes), None) => {
            let frames = vec![Ok::<_, Infallible>(Frame::data(bytes.clone()))];
            (StreamBody::new(futures::stream::iter(frames)).boxed(), true)
        }
    };

    let request = builder.body(body).map_err(|err| RunError::InvalidRequest {
        reason: err.to_string(),
    })?;
    Ok((request, chunked))
}

/// Open a connection, send one request and read the whole response.
pub(crate) async fn send(
    target: &Target,
    method: &Method,
    headers: &[(String, String)],
    body: Option<&Bytes>,
    config: &AuditorConfig,
) -> Result<Exchange, RunError> {
    let (request, request_chunked) = build_request(target, method, headers, body, config)?;

    let stream = TcpStream::connect((target.host.as_str(), target.port))
        .await
        .map_err(|err| RunError::Connect {
            addr: target.authority.clone(),
            details: err.to_string(),
        })?;

    let (mut sender, connection) = client::conn::http1::Builder::new()
        .title_case_headers(true)
        .handshake(TokioIo::new(stream))
        .await?;

    tokio::spawn(async move {
        if let Err(err) = connection.await {
            log::debug!("[AuditorRun] Connection closed with error: {}", err);
        }
    });

    let response = sender.send_request(request).await?;
    let status = response.status().as_u16();
    let response_headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    let mut incoming = response.into_body();
    let mut collected = BytesMut::new();
    let mut segments = 0usize;
    while let Some(frame) = incoming.frame().await {
        let frame = frame?;
        if let Ok(data) = frame.into_data() {
            if data.is_empty() {
                continue;
            }
            if collected.len() + data.len() > config.max_body_bytes {
                return Err(RunError::BodyTooLarge {
                    limit: config.max_body_bytes,
                });
            }
            segments += 1;
            collected.extend_from_slice(&data);
        }
    }

    Ok(Exchange {
        response: ResponseSummary {
            status,
            headers: response_headers,
            body: collected.freeze(),
            segments,
        },
        request_chunked,
        request_body_len: body.map_or(0, Bytes::len),
    })
}

/// Headers for the conditional follow-up: the caller's headers minus body
/// framing and existing preconditions, plus the validator.
pub(crate) fn conditional_headers(
    original: &[(String, String)],
    validator: &Validator,
) -> Vec<(String, String)> {
    const DROPPED: [&str; 5] = [
        "content-length",
        "content-type",
        "transfer-encoding",
        "if-none-match",
        "if-modified-since",
    ];

    let mut headers: Vec<(String, String)> = original
        .iter()
        .filter(|(name, _)| !DROPPED.iter().any(|d| name.eq_ignore_ascii_case(d)))
        .cloned()
        .collect();
    headers.push(validator.request_header());
    headers
}
