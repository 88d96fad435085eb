//! Response analysis.
//!
//! Pure functions over what was received; the network side lives in
//! `client`. Messages are returned in discovery order.

use chrono::{DateTime, FixedOffset};
use hyper::Method;

use super::client::Exchange;
use super::state::ResponseSummary;
use crate::error::{ErrorCode, RunError};
use crate::message::kinds::{self, CATEGORY_CACHING, CATEGORY_CONNECTION, CATEGORY_GENERAL};
use crate::message::{DiagnosticMessage, Level};

/// Statuses a cache may assign a heuristic lifetime to.
const HEURISTIC_STATUSES: [u16; 12] = [200, 203, 204, 206, 300, 301, 308, 404, 405, 410, 414, 501];

/// Statuses that must carry Location.
const LOCATION_REQUIRED: [u16; 5] = [301, 302, 303, 307, 308];

/// Headers a 304 must repeat when the full response had them.
const HDRS_304: [&str; 6] = [
    "cache-control",
    "content-location",
    "date",
    "etag",
    "expires",
    "vary",
];

/// Validator used for the conditional follow-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Validator {
    ETag(String),
    LastModified(String),
}

impl Validator {
    pub fn request_header(&self) -> (String, String) {
        match self {
            Validator::ETag(tag) => ("If-None-Match".to_string(), tag.clone()),
            Validator::LastModified(date) => ("If-Modified-Since".to_string(), date.clone()),
        }
    }

    fn value(&self) -> &str {
        match self {
            Validator::ETag(value) | Validator::LastModified(value) => value,
        }
    }
}

fn http_date(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(value.trim()).ok()
}

fn cache_directive(response: &ResponseSummary, directive: &str) -> Option<i64> {
    response
        .headers
        .iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case("cache-control"))
        .flat_map(|(_, value)| value.split(','))
        .filter_map(|part| part.trim().split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case(directive))
        .and_then(|(_, value)| value.trim().trim_matches('"').parse().ok())
}

/// Explicit freshness lifetime in seconds, if the response declares one.
fn explicit_lifetime(response: &ResponseSummary) -> Option<i64> {
    if let Some(seconds) = cache_directive(response, "s-maxage") {
        return Some(seconds);
    }
    if let Some(seconds) = cache_directive(response, "max-age") {
        return Some(seconds);
    }
    let expires = response.header("expires")?;
    // Invalid Expires means already expired.
    let Some(expires) = http_date(expires) else {
        return Some(0);
    };
    let date = response.header("date").and_then(http_date)?;
    Some((expires - date).num_seconds())
}

/// Run every check that needs only the first exchange.
pub(crate) fn check_response(method: &Method, exchange: &Exchange) -> Vec<DiagnosticMessage> {
    let response = &exchange.response;
    let mut messages = Vec::new();

    if exchange.request_chunked {
        messages.push(
            DiagnosticMessage::new(Level::Info, CATEGORY_CONNECTION, kinds::REQUEST_CHUNKED)
                .with_var("bytes", exchange.request_body_len),
        );
    }

    check_date(response, &mut messages);
    check_framing(method, response, &mut messages);
    check_content_type(response, &mut messages);
    check_redirect(response, &mut messages);
    if *method == Method::GET || *method == Method::HEAD {
        check_freshness(response, &mut messages);
    }

    messages
}

fn check_date(response: &ResponseSummary, messages: &mut Vec<DiagnosticMessage>) {
    let Some(date) = response.header("date") else {
        messages.push(DiagnosticMessage::new(
            Level::Bad,
            CATEGORY_GENERAL,
            kinds::DATE_MISSING,
        ));
        return;
    };

    let last_modified = response.header("last-modified");
    if let (Some(date_at), Some(lm_at)) = (http_date(date), last_modified.and_then(http_date)) {
        if lm_at > date_at {
            messages.push(
                DiagnosticMessage::new(Level::Bad, CATEGORY_CACHING, kinds::LM_FUTURE)
                    .with_var("last_modified", last_modified.unwrap_or_default())
                    .with_var("date", date),
            );
        }
    }
}

fn check_framing(method: &Method, response: &ResponseSummary, messages: &mut Vec<DiagnosticMessage>) {
    let chunked = response
        .header("transfer-encoding")
        .is_some_and(|value| value.to_ascii_lowercase().contains("chunked"));

    if chunked {
        messages.push(
            DiagnosticMessage::new(
                Level::Info,
                CATEGORY_CONNECTION,
                kinds::TRANSFER_CODING_CHUNKED,
            )
            .with_var("segments", response.segments)
            .with_var("bytes", response.body.len()),
        );
        return;
    }

    if *method == Method::HEAD || response.status == 204 || response.status == 304 {
        return;
    }
    let declared = response
        .header("content-length")
        .and_then(|value| value.trim().parse::<usize>().ok());
    if declared == Some(response.body.len()) {
        messages.push(
            DiagnosticMessage::new(Level::Good, CATEGORY_CONNECTION, kinds::CL_CORRECT)
                .with_var("length", response.body.len()),
        );
    }
}

fn check_content_type(response: &ResponseSummary, messages: &mut Vec<DiagnosticMessage>) {
    if !response.body.is_empty() && response.header("content-type").is_none() {
        messages.push(
            DiagnosticMessage::new(Level::Warning, CATEGORY_GENERAL, kinds::CT_MISSING)
                .with_var("bytes", response.body.len()),
        );
    }
}

fn check_redirect(response: &ResponseSummary, messages: &mut Vec<DiagnosticMessage>) {
    if !(300..400).contains(&response.status) || response.status == 304 {
        return;
    }
    match response.header("location") {
        Some(location) => messages.push(
            DiagnosticMessage::new(Level::Uri, CATEGORY_GENERAL, kinds::REDIRECT_LOCATION)
                .with_var("location", location)
                .with_var("status", response.status),
        ),
        None if LOCATION_REQUIRED.contains(&response.status) => messages.push(
            DiagnosticMessage::new(Level::Bad, CATEGORY_GENERAL, kinds::REDIRECT_NO_LOCATION)
                .with_var("status", response.status),
        ),
        None => {}
    }
}

fn check_freshness(response: &ResponseSummary, messages: &mut Vec<DiagnosticMessage>) {
    let message = match explicit_lifetime(response) {
        Some(lifetime) if lifetime > 0 => {
            DiagnosticMessage::new(Level::Good, CATEGORY_CACHING, kinds::FRESHNESS_FRESH)
                .with_var("lifetime", lifetime)
        }
        Some(_) => DiagnosticMessage::new(Level::Info, CATEGORY_CACHING, kinds::FRESHNESS_STALE),
        None if HEURISTIC_STATUSES.contains(&response.status)
            && response.header("last-modified").is_some() =>
        {
            DiagnosticMessage::new(Level::Warning, CATEGORY_CACHING, kinds::FRESHNESS_HEURISTIC)
        }
        None => DiagnosticMessage::new(Level::Info, CATEGORY_CACHING, kinds::FRESHNESS_NONE),
    };
    messages.push(message);
}

/// Pick the validator for a conditional follow-up, preferring ETag.
pub(crate) fn validator_for(method: &Method, response: &ResponseSummary) -> Option<Validator> {
    if *method != Method::GET || response.status != 200 {
        return None;
    }
    response
        .header("etag")
        .map(|tag| Validator::ETag(tag.to_string()))
        .or_else(|| {
            response
                .header("last-modified")
                .map(|date| Validator::LastModified(date.to_string()))
        })
}

/// Judge the outcome of the conditional follow-up against the full response.
pub(crate) fn check_revalidation(
    validator: &Validator,
    full: &ResponseSummary,
    outcome: Result<&ResponseSummary, &RunError>,
) -> Vec<DiagnosticMessage> {
    let category = kinds::CATEGORY_VALIDATION;
    let (supported, ignored) = match validator {
        Validator::ETag(_) => (kinds::INM_304, kinds::INM_FULL),
        Validator::LastModified(_) => (kinds::IMS_304, kinds::IMS_FULL),
    };

    let conditional = match outcome {
        Ok(conditional) => conditional,
        Err(err) => {
            return vec![
                DiagnosticMessage::new(Level::Info, category, kinds::VALIDATION_FAILED)
                    .with_var("validator", validator.value())
                    .with_var("outcome", err.message()),
            ];
        }
    };

    let mut messages = Vec::new();
    match conditional.status {
        304 => {
            messages.push(
                DiagnosticMessage::new(Level::Good, category, supported)
                    .with_var("validator", validator.value()),
            );
            for header in HDRS_304 {
                if full.header(header).is_some() && conditional.header(header).is_none() {
                    messages.push(
                        DiagnosticMessage::new(Level::Warning, category, kinds::MISSING_HDRS_304)
                            .with_var("header", header),
                    );
                }
            }
        }
        status if status == full.status => messages.push(
            DiagnosticMessage::new(Level::Info, category, ignored)
                .with_var("validator", validator.value()),
        ),
        status => messages.push(
            DiagnosticMessage::new(Level::Info, category, kinds::VALIDATION_FAILED)
                .with_var("validator", validator.value())
                .with_var("outcome", format!("status {status}")),
        ),
    }
    messages
}
